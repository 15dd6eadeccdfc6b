pub use crate::agent::AgentTrait;
pub use crate::balanced_bidder::{BalancedBidder, UtilityFormula};

use rand_distr::{Distribution, Uniform};
use crate::error::{AuctionError, AuctionResult};
use crate::types::AgentId;
use crate::utils::{seeded_rng, VALUE_STREAM};

/// Container for agents with methods to add agents
/// Uses trait objects so different strategies can share a simulation
pub struct Agents {
    pub agents: Vec<Box<dyn AgentTrait>>,
}

impl Agents {
    pub fn new() -> Self {
        Self { agents: Vec::new() }
    }

    /// Add a balanced bidder. The agent id is set to match the Vec index.
    ///
    /// # Arguments
    /// * `value` - Private value per click
    /// * `budget` - Optional spending limit for the run
    /// * `utility_formula` - How the bidder scores candidate slots
    pub fn add_balanced(&mut self, value: f64, budget: Option<f64>, utility_formula: UtilityFormula) -> AgentId {
        let agent_id = AgentId(self.agents.len());
        self.agents.push(Box::new(BalancedBidder::new(agent_id, value, budget).with_utility_formula(utility_formula)));
        agent_id
    }

    /// Add `count` balanced bidders whose values are drawn uniformly from `[value_min, value_max)`
    /// Values are reproducible for a given seed
    pub fn add_balanced_population(&mut self, count: usize, value_min: f64, value_max: f64, budget: Option<f64>, utility_formula: UtilityFormula, seed: u64) -> AuctionResult<Vec<AgentId>> {
        if !(value_min >= 0.0 && value_min < value_max) {
            return Err(AuctionError::PreconditionViolation(format!(
                "agent values need 0 <= min < max, got [{}, {})",
                value_min, value_max
            )));
        }
        let value_dist = Uniform::new(value_min, value_max);
        let mut rng = seeded_rng(seed, VALUE_STREAM, 0);
        Ok((0..count)
            .map(|_| {
                let value = value_dist.sample(&mut rng);
                self.add_balanced(value, budget, utility_formula)
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for Agents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_balanced_sets_ids() {
        let mut agents = Agents::new();
        let a = agents.add_balanced(10.0, None, UtilityFormula::Corrected);
        let b = agents.add_balanced(20.0, Some(100.0), UtilityFormula::Literal);
        assert_eq!((a, b), (AgentId(0), AgentId(1)));
        assert_eq!(agents.agents[1].value(), 20.0);
        assert_eq!(agents.agents[1].budget(), Some(100.0));
        assert_eq!(agents.len(), 2);
    }

    #[test]
    fn test_population_is_reproducible_and_in_range() {
        let mut first = Agents::new();
        let mut second = Agents::new();
        first.add_balanced_population(8, 25.0, 175.0, None, UtilityFormula::Corrected, 42).unwrap();
        second.add_balanced_population(8, 25.0, 175.0, None, UtilityFormula::Corrected, 42).unwrap();
        for (a, b) in first.agents.iter().zip(&second.agents) {
            assert_eq!(a.value(), b.value());
            assert!(a.value() >= 25.0 && a.value() < 175.0);
        }
    }

    #[test]
    fn test_population_rejects_bad_range() {
        let mut agents = Agents::new();
        assert!(agents.add_balanced_population(3, 10.0, 5.0, None, UtilityFormula::Corrected, 1).is_err());
        assert!(agents.is_empty());
    }
}
