use crate::error::{AuctionError, AuctionResult};
use crate::types::{AgentId, AuctionOutcome, Bid};

/// Immutable record of one auction round
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    /// Clicks each slot received this round, best slot first
    pub clicks: Vec<f64>,
    pub bids: Vec<Bid>,
    pub reserve: f64,
    pub outcome: AuctionOutcome,
}

impl Round {
    pub fn new(clicks: Vec<f64>, bids: Vec<Bid>, reserve: f64, outcome: AuctionOutcome) -> Self {
        Self { clicks, bids, reserve, outcome }
    }

    /// Bids of every agent except `agent_id`
    pub fn other_bids(&self, agent_id: AgentId) -> Vec<Bid> {
        self.bids.iter().copied().filter(|b| b.agent_id != agent_id).collect()
    }

    pub fn bid_of(&self, agent_id: AgentId) -> Option<f64> {
        self.bids.iter().find(|b| b.agent_id == agent_id).map(|b| b.amount)
    }
}

/// Ordered sequence of rounds, round 0 first
/// Rounds are only ever appended so everything already recorded can be read without locking
#[derive(Debug, Clone, Default)]
pub struct History {
    rounds: Vec<Round>,
}

impl History {
    pub fn new() -> Self {
        Self { rounds: Vec::new() }
    }

    pub fn push(&mut self, round: Round) {
        self.rounds.push(round);
    }

    /// Round `t`; fails when the round has not been recorded
    pub fn round(&self, t: usize) -> AuctionResult<&Round> {
        self.rounds.get(t).ok_or_else(|| {
            AuctionError::PreconditionViolation(format!("round {} requested but only {} rounds are recorded", t, self.rounds.len()))
        })
    }

    /// Index of the most recent recorded round
    pub fn last_round(&self) -> AuctionResult<usize> {
        self.rounds
            .len()
            .checked_sub(1)
            .ok_or_else(|| AuctionError::PreconditionViolation("history is empty".to_string()))
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }
}
