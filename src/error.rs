//! Error type shared by the mechanisms, the bidders and the simulation driver.
//!
//! Auction outcomes are either exact or an explicit error; nothing here is retried.

use thiserror::Error;

use crate::types::AgentId;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuctionError {
    /// Caller asked for something the inputs cannot provide (missing history, slot out of range, ...)
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// A computation hit a zero denominator (flat click vectors, zero position weight, ...)
    #[error("arithmetic degeneracy: {0}")]
    ArithmeticDegeneracy(String),

    #[error("invalid bid {amount} from {agent_id}")]
    InvalidBid { agent_id: AgentId, amount: f64 },
}

/// Shorthand result type for auction computations.
pub type AuctionResult<T> = Result<T, AuctionError>;
