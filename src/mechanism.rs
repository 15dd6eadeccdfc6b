//! This file holds what GSP and VCG have in common: bid validation, ranking with a deterministic
//! tie-break, the allocation rule and the bid range that lands a bidder in a given slot.
//!
//! The two mechanisms only differ in how they price the slots, see gsp.rs and vcg.rs.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use rand::Rng;
use crate::error::{AuctionError, AuctionResult};
use crate::types::{AgentId, AuctionOutcome, Bid};
use crate::utils::{seeded_rng, TIE_BREAK_STREAM};

/// Secondary ordering key used when two bids have exactly the same amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Lower agent id wins the tie
    #[default]
    LowestId,
    /// Every agent gets a fixed pseudo-random priority derived from the run seed
    /// Reproducible within a run, but no id is favored across runs
    Seeded { seed: u64 },
}

impl TieBreak {
    fn priority(&self, agent_id: AgentId) -> u64 {
        match self {
            TieBreak::LowestId => agent_id.0 as u64,
            TieBreak::Seeded { seed } => seeded_rng(*seed, TIE_BREAK_STREAM, agent_id.0 as u64).gen(),
        }
    }

    /// Total order on bids: higher amount first, then lower priority, then lower id
    pub fn compare(&self, a: &Bid, b: &Bid) -> Ordering {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| self.priority(a.agent_id).cmp(&self.priority(b.agent_id)))
            .then_with(|| a.agent_id.cmp(&b.agent_id))
    }
}

/// Sort bids from highest to lowest using the tie-break for equal amounts
pub fn rank_bids(bids: &[Bid], tie_break: TieBreak) -> Vec<Bid> {
    let mut ranked = bids.to_vec();
    ranked.sort_by(|a, b| tie_break.compare(a, b));
    ranked
}

/// Reject negative or non-finite amounts and agents that bid twice
pub fn validate_bids(bids: &[Bid]) -> AuctionResult<()> {
    let mut seen = HashSet::with_capacity(bids.len());
    for bid in bids {
        if !bid.amount.is_finite() || bid.amount < 0.0 {
            return Err(AuctionError::InvalidBid { agent_id: bid.agent_id, amount: bid.amount });
        }
        if !seen.insert(bid.agent_id) {
            return Err(AuctionError::PreconditionViolation(format!("{} submitted more than one bid", bid.agent_id)));
        }
    }
    Ok(())
}

pub fn validate_reserve(reserve: f64) -> AuctionResult<()> {
    if !reserve.is_finite() || reserve < 0.0 {
        return Err(AuctionError::PreconditionViolation(format!("reserve price must be a non-negative number, got {}", reserve)));
    }
    Ok(())
}

/// Click counts must be non-negative and non-increasing from the top slot down
pub fn validate_clicks(slot_clicks: &[f64]) -> AuctionResult<()> {
    if slot_clicks.iter().any(|c| !c.is_finite() || *c < 0.0) {
        return Err(AuctionError::PreconditionViolation(format!("click counts must be non-negative: {:?}", slot_clicks)));
    }
    if slot_clicks.windows(2).any(|w| w[0] < w[1]) {
        return Err(AuctionError::PreconditionViolation(format!("click counts must be non-increasing: {:?}", slot_clicks)));
    }
    Ok(())
}

/// Validate inputs and return every bid that meets the reserve, best first
///
/// The first `min(len, slot_clicks.len())` entries are the allocation, the rest compete for nothing
/// but still set prices.
pub fn ranked_valid_bids(slot_clicks: &[f64], reserve: f64, bids: &[Bid], tie_break: TieBreak) -> AuctionResult<Vec<Bid>> {
    validate_clicks(slot_clicks)?;
    validate_reserve(reserve)?;
    validate_bids(bids)?;

    let valid_bids: Vec<Bid> = bids.iter().copied().filter(|b| b.amount >= reserve).collect();
    Ok(rank_bids(&valid_bids, tie_break))
}

/// Number of occupied slots for a ranked list of valid bids
pub fn occupied_slots(slot_clicks: &[f64], ranked: &[Bid]) -> usize {
    ranked.len().min(slot_clicks.len())
}

/// Range of bids that would place a bidder in `slot`, given the bids of everybody else
///
/// Returns `(min_bid, max_bid)`. Bidding `min_bid` ties the bidder currently ranked at `slot`,
/// bidding `max_bid` ties the occupant of the next better slot. `max_bid` is None for slot 0
/// since there is nothing to tie above it. Competitors below the reserve are ignored and
/// missing competitors are replaced by the reserve price.
pub fn bid_range_for_slot(slot: usize, slot_clicks: &[f64], reserve: f64, other_bids: &[Bid]) -> AuctionResult<(f64, Option<f64>)> {
    if slot >= slot_clicks.len() {
        return Err(AuctionError::PreconditionViolation(format!("slot {} requested but only {} slots are available", slot, slot_clicks.len())));
    }
    validate_reserve(reserve)?;
    validate_bids(other_bids)?;

    let competing: Vec<Bid> = other_bids.iter().copied().filter(|b| b.amount >= reserve).collect();
    let ranked = rank_bids(&competing, TieBreak::LowestId);
    let amount_at = |rank: usize| ranked.get(rank).map_or(reserve, |b| b.amount);

    let min_bid = amount_at(slot);
    let max_bid = if slot == 0 { None } else { Some(amount_at(slot - 1)) };
    Ok((min_bid, max_bid))
}

/// Trait for ad auction mechanisms that allocate slots and charge per click
pub trait MechanismTrait {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Allocate the slots and compute the per-click payment of every occupant
    fn compute(&self, slot_clicks: &[f64], reserve: f64, bids: &[Bid]) -> AuctionResult<AuctionOutcome>;

    /// Bid range for a slot, see `bid_range_for_slot`. GSP and VCG allocate identically so they share it.
    /// Balanced bidders read their slot ranges through this method.
    fn bid_range_for_slot(&self, slot: usize, slot_clicks: &[f64], reserve: f64, other_bids: &[Bid]) -> AuctionResult<(f64, Option<f64>)> {
        bid_range_for_slot(slot, slot_clicks, reserve, other_bids)
    }
}

/// Mechanism selection used by the simulation configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MechanismType {
    GSP,
    VCG,
}

impl MechanismType {
    pub fn build(&self, tie_break: TieBreak) -> Box<dyn MechanismTrait> {
        match self {
            MechanismType::GSP => Box::new(crate::gsp::Gsp::new(tie_break)),
            MechanismType::VCG => Box::new(crate::vcg::Vcg::new(tie_break)),
        }
    }
}

impl fmt::Display for MechanismType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MechanismType::GSP => write!(f, "GSP"),
            MechanismType::VCG => write!(f, "VCG"),
        }
    }
}
