use crate::error::AuctionResult;
use crate::history::History;
use crate::types::AgentId;

/// Trait for agents bidding in the repeated position auction
///
/// Agents are created once before the simulation starts. They keep no per-round state:
/// every bid is recomputed from the recorded history.
pub trait AgentTrait {
    fn id(&self) -> AgentId;

    /// Private value of a single click
    fn value(&self) -> f64;

    /// Spending limit for the whole run, if any. Strategies are free to ignore it.
    fn budget(&self) -> Option<f64>;

    /// Bid for round 0, when there is no history yet
    fn initial_bid(&self, reserve: f64) -> f64;

    /// Bid for round `t` using rounds `0..t` of `history`
    fn bid(&self, t: usize, history: &History, reserve: f64) -> AuctionResult<f64>;

    /// Get a string representation of the bidding strategy
    fn get_bidding_type(&self) -> String;
}
