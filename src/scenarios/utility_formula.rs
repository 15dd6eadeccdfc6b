/// Balanced bidding with both slot scoring formulas.
///
/// It has two variants:
///
/// - Variant A: utility is position weight times (value - price)
/// - Variant B: utility is additionally divided by the price, a return-on-spend score
///
/// A positive reserve keeps every price estimate above zero so variant B is always defined.
///
/// Expected behavior:
/// - Both variants play every round without error
/// - Neither variant ever bids above value

use crate::agents::{Agents, UtilityFormula};
use crate::logger::{Logger, LogEvent};
use crate::logln;
use crate::mechanism::MechanismType;
use crate::scenarios::Validation;
use crate::simulation::{Simulation, SimulationConfig, SimulationRun};

// Register this scenario in the catalog
inventory::submit!(crate::scenarios::ScenarioEntry {
    short_name: "utility_formula",
    run,
});

const EPSILON: f64 = 1e-9;

fn prepare_simulation(utility_formula: UtilityFormula, seed: u64) -> Result<Simulation, Box<dyn std::error::Error>> {
    let mut agents = Agents::new();
    agents.add_balanced_population(5, 25.0, 175.0, None, utility_formula, seed)?;

    let config = SimulationConfig {
        num_rounds: 48,
        num_slots: 4,
        reserve: 5.0,
        mechanism: MechanismType::GSP,
        ..SimulationConfig::default()
    };
    Ok(Simulation::new(config, agents)?)
}

fn count_overbids(simulation: &Simulation, result: &SimulationRun) -> usize {
    result
        .history
        .rounds()
        .iter()
        .map(|round| {
            simulation
                .agents
                .agents
                .iter()
                .filter(|agent| round.bid_of(agent.id()).map_or(false, |bid| bid > agent.value() + EPSILON))
                .count()
        })
        .sum()
}

pub fn run(scenario_name: &str, seed: u64, logger: &mut Logger) -> Result<(), Box<dyn std::error::Error>> {
    let simulation_a = prepare_simulation(UtilityFormula::Corrected, seed)?;
    let result_a = simulation_a.run(logger)?;
    result_a.stat.printout(logger);

    let simulation_b = prepare_simulation(UtilityFormula::Literal, seed)?;
    let result_b = simulation_b.run(logger)?;
    result_b.stat.printout(logger);

    logln!(logger, LogEvent::Scenario, "");

    let mut validation = Validation::new();

    let overbids_a = count_overbids(&simulation_a, &result_a);
    let overbids_b = count_overbids(&simulation_b, &result_b);
    validation.check(
        overbids_a == 0 && overbids_b == 0,
        format!("Neither utility formula bids above value ({} and {} overbids)", overbids_a, overbids_b),
        logger,
    );

    validation.check(
        result_a.history.len() == 48 && result_b.history.len() == 48,
        "Both variants played all 48 rounds".to_string(),
        logger,
    );

    logln!(
        logger,
        LogEvent::Scenario,
        "Revenue: variant A {:.2}, variant B {:.2}",
        result_a.stat.overall_stat.revenue,
        result_b.stat.overall_stat.revenue
    );

    validation.finish(scenario_name)
}
