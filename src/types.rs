use std::fmt;

/// Identifier of a bidding agent. Stable for the whole run.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct AgentId(pub usize);

impl AgentId {
    /// Cast to `usize` for direct use as a `Vec` index.
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent({})", self.0)
    }
}

/// A single per-click bid submitted by an agent in one round
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bid {
    pub agent_id: AgentId,
    pub amount: f64,
}

impl Bid {
    pub fn new(agent_id: AgentId, amount: f64) -> Self {
        Self { agent_id, amount }
    }
}

/// Result of resolving one auction
///
/// `allocation[i]` occupies slot `i` and owes `per_click_payments[i]` for every click it receives.
/// Both vectors always have the same length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuctionOutcome {
    pub allocation: Vec<AgentId>,
    pub per_click_payments: Vec<f64>,
}

impl AuctionOutcome {
    /// Outcome of an auction where nobody met the reserve
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.allocation.is_empty()
    }

    /// Slot occupied by the given agent, if any
    pub fn slot_of(&self, agent_id: AgentId) -> Option<usize> {
        self.allocation.iter().position(|&a| a == agent_id)
    }

    /// Total amount charged to the occupant of `slot` given the clicks it received
    pub fn total_payment(&self, slot: usize, clicks: &[f64]) -> f64 {
        self.per_click_payments[slot] * clicks[slot]
    }

    /// Sum of all payments collected by the seller
    pub fn revenue(&self, clicks: &[f64]) -> f64 {
        (0..self.allocation.len()).map(|slot| self.total_payment(slot, clicks)).sum()
    }
}
