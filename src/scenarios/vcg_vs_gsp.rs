/// Revenue comparison between GSP and VCG on the same bids.
///
/// Balanced bidders play 48 rounds of GSP with a reserve price of 10. Every recorded round is then
/// priced again under VCG with the bids unchanged.
///
/// Expected behavior:
/// - Both mechanisms allocate the slots identically
/// - VCG collects at most as much as GSP in every round, since each VCG price is a click-weighted
///   average of the bids below the occupant while GSP charges the highest of them
///
/// For reference the scenario also runs the same population under VCG directly and logs the revenue.

use crate::agents::{Agents, UtilityFormula};
use crate::logger::{Logger, LogEvent};
use crate::logln;
use crate::mechanism::{MechanismType, TieBreak};
use crate::scenarios::Validation;
use crate::simulation::{reprice, Simulation, SimulationConfig};

// Register this scenario in the catalog
inventory::submit!(crate::scenarios::ScenarioEntry {
    short_name: "vcg_vs_gsp",
    run,
});

const EPSILON: f64 = 1e-9;

fn prepare_simulation(mechanism: MechanismType, seed: u64) -> Result<Simulation, Box<dyn std::error::Error>> {
    let mut agents = Agents::new();
    agents.add_balanced_population(6, 25.0, 175.0, Some(50_000.0), UtilityFormula::Corrected, seed)?;

    let config = SimulationConfig {
        num_rounds: 48,
        num_slots: 4,
        reserve: 10.0,
        mechanism,
        tie_break: TieBreak::Seeded { seed },
        ..SimulationConfig::default()
    };
    Ok(Simulation::new(config, agents)?)
}

pub fn run(scenario_name: &str, seed: u64, logger: &mut Logger) -> Result<(), Box<dyn std::error::Error>> {
    let simulation_gsp = prepare_simulation(MechanismType::GSP, seed)?;
    simulation_gsp.printout(logger);
    let result_gsp = simulation_gsp.run(logger)?;
    result_gsp.stat.printout(logger);

    let vcg = MechanismType::VCG.build(simulation_gsp.config.tie_break);
    let repriced = reprice(&result_gsp.history, vcg.as_ref())?;

    let simulation_vcg = prepare_simulation(MechanismType::VCG, seed)?;
    let result_vcg = simulation_vcg.run(logger)?;
    result_vcg.stat.printout(logger);

    logln!(logger, LogEvent::Scenario, "");

    let mut validation = Validation::new();

    let rounds = result_gsp.history.rounds();
    let same_allocation = rounds.iter().zip(&repriced).all(|(round, outcome)| round.outcome.allocation == outcome.allocation);
    validation.check(same_allocation, "GSP and VCG allocate identical bids to identical slots".to_string(), logger);

    let gsp_revenue: f64 = rounds.iter().map(|round| round.outcome.revenue(&round.clicks)).sum();
    let vcg_revenue: f64 = rounds.iter().zip(&repriced).map(|(round, outcome)| outcome.revenue(&round.clicks)).sum();
    let rounds_above = rounds
        .iter()
        .zip(&repriced)
        .filter(|(round, outcome)| outcome.revenue(&round.clicks) > round.outcome.revenue(&round.clicks) + EPSILON)
        .count();
    validation.check(
        rounds_above == 0,
        format!(
            "VCG revenue does not exceed GSP revenue on the same bids: {:.2} <= {:.2} ({} rounds above)",
            vcg_revenue, gsp_revenue, rounds_above
        ),
        logger,
    );

    logln!(
        logger,
        LogEvent::Scenario,
        "Revenue when bidders play each mechanism: GSP {:.2}, VCG {:.2}",
        result_gsp.stat.overall_stat.revenue,
        result_vcg.stat.overall_stat.revenue
    );

    validation.finish(scenario_name)
}
