/// Balanced bidders competing in a generalized second price auction.
///
/// Five agents with values drawn uniformly from [25, 175) bid for four slots over 48 rounds.
///
/// Expected behavior:
/// - Balanced bidding never bids above the agent's value
/// - GSP never charges an occupant more per click than it bid

use crate::agents::{Agents, UtilityFormula};
use crate::logger::{Logger, LogEvent};
use crate::logln;
use crate::mechanism::MechanismType;
use crate::scenarios::Validation;
use crate::simulation::{Simulation, SimulationConfig};

// Register this scenario in the catalog
inventory::submit!(crate::scenarios::ScenarioEntry {
    short_name: "balanced_gsp",
    run,
});

/// Tolerance for floating point comparisons of prices
const EPSILON: f64 = 1e-9;

/// Prepare the simulation with five balanced bidders
fn prepare_simulation(seed: u64) -> Result<Simulation, Box<dyn std::error::Error>> {
    let mut agents = Agents::new();
    agents.add_balanced_population(5, 25.0, 175.0, None, UtilityFormula::Corrected, seed)?;

    let config = SimulationConfig {
        num_rounds: 48,
        num_slots: 4,
        reserve: 0.0,
        mechanism: MechanismType::GSP,
        ..SimulationConfig::default()
    };
    Ok(Simulation::new(config, agents)?)
}

pub fn run(scenario_name: &str, seed: u64, logger: &mut Logger) -> Result<(), Box<dyn std::error::Error>> {
    let simulation = prepare_simulation(seed)?;
    simulation.printout(logger);
    let result = simulation.run(logger)?;
    result.stat.printout(logger);

    logln!(logger, LogEvent::Scenario, "");

    let mut validation = Validation::new();

    // Check: no agent ever bid more than its value
    let overbids = result
        .history
        .rounds()
        .iter()
        .flat_map(|round| round.bids.iter())
        .filter(|bid| bid.amount > simulation.agents.agents[bid.agent_id.index()].value() + EPSILON)
        .count();
    validation.check(overbids == 0, format!("No balanced bidder bids above its value ({} overbids)", overbids), logger);

    // Check: every occupant pays at most its own bid per click
    let mut overcharged = 0;
    for round in result.history.rounds() {
        for bid in &round.bids {
            if let Some(slot) = round.outcome.slot_of(bid.agent_id) {
                if round.outcome.per_click_payments[slot] > bid.amount + EPSILON {
                    overcharged += 1;
                }
            }
        }
    }
    validation.check(overcharged == 0, format!("GSP never charges more than the bid per click ({} overcharges)", overcharged), logger);

    validation.finish(scenario_name)
}
