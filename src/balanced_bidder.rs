//! Balanced bidding agent
//!
//! Each round the agent assumes that every competitor repeats its bid from the previous round.
//! It works out the bid range that lands it in every slot, picks the slot with the best expected
//! utility and then shades its bid so that it is indifferent between the target slot at its
//! current price and the next better slot at its own bid.

use std::fmt;
use crate::agent::AgentTrait;
use crate::error::{AuctionError, AuctionResult};
use crate::history::{History, Round};
use crate::gsp::Gsp;
use crate::mechanism::{MechanismTrait, TieBreak};
use crate::position::pos_effect;
use crate::types::AgentId;
use crate::utils::{argmax_index, midpoint};

/// How the expected utility of a slot is scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UtilityFormula {
    /// pos * (value - price)
    #[default]
    Corrected,
    /// pos * (value - price) / price, a return-on-spend score
    Literal,
}

/// Bid range that wins a slot when the competition repeats its last bids
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotInfo {
    pub slot: usize,
    pub min_bid: f64,
    /// For slot 0 this is 2 * min_bid since there is no one above to tie
    pub max_bid: f64,
}

#[derive(Debug, Clone)]
pub struct BalancedBidder {
    pub id: AgentId,
    pub value: f64,
    pub budget: Option<f64>,
    pub utility_formula: UtilityFormula,
}

impl BalancedBidder {
    pub fn new(id: AgentId, value: f64, budget: Option<f64>) -> Self {
        Self { id, value, budget, utility_formula: UtilityFormula::default() }
    }

    pub fn with_utility_formula(mut self, utility_formula: UtilityFormula) -> Self {
        self.utility_formula = utility_formula;
        self
    }

    /// The round the competition is assumed to repeat
    fn previous_round<'a>(&self, t: usize, history: &'a History) -> AuctionResult<&'a Round> {
        let previous = t.checked_sub(1).ok_or_else(|| {
            AuctionError::PreconditionViolation("round 0 has no history to react to, use initial_bid".to_string())
        })?;
        let round = history.round(previous)?;
        if round.bids.is_empty() {
            return Err(AuctionError::PreconditionViolation(format!("round {} has no bids", previous)));
        }
        Ok(round)
    }

    /// Position weights taken from the most recent round's clicks
    fn position_weights(&self, history: &History) -> AuctionResult<Vec<f64>> {
        let last = history.round(history.last_round()?)?;
        pos_effect(&last.clicks)
    }

    /// Bid range for every slot under GSP, assuming all other agents repeat round t-1
    pub fn slot_info(&self, t: usize, history: &History, reserve: f64) -> AuctionResult<Vec<SlotInfo>> {
        let previous = self.previous_round(t, history)?;
        let other_bids = previous.other_bids(self.id);
        let gsp = Gsp::new(TieBreak::default());

        (0..previous.clicks.len())
            .map(|slot| {
                let (min_bid, max_bid) = gsp.bid_range_for_slot(slot, &previous.clicks, reserve, &other_bids)?;
                Ok(SlotInfo { slot, min_bid, max_bid: max_bid.unwrap_or(2.0 * min_bid) })
            })
            .collect()
    }

    /// Expected utility of winning each slot, priced at the middle of its bid range
    pub fn expected_utils(&self, t: usize, history: &History, reserve: f64) -> AuctionResult<Vec<f64>> {
        let slots = self.slot_info(t, history, reserve)?;
        self.utils_for(&slots, history)
    }

    fn utils_for(&self, slots: &[SlotInfo], history: &History) -> AuctionResult<Vec<f64>> {
        let pos = self.position_weights(history)?;
        if pos.len() != slots.len() {
            return Err(AuctionError::PreconditionViolation(format!(
                "latest round has {} slots but the reacted-to round had {}",
                pos.len(),
                slots.len()
            )));
        }

        slots
            .iter()
            .zip(&pos)
            .map(|(info, &weight)| {
                let price = midpoint(info.min_bid, info.max_bid);
                match self.utility_formula {
                    UtilityFormula::Corrected => Ok(weight * (self.value - price)),
                    UtilityFormula::Literal => {
                        if price == 0.0 {
                            return Err(AuctionError::ArithmeticDegeneracy(format!("slot {} has a zero price estimate", info.slot)));
                        }
                        Ok(weight * (self.value - price) / price)
                    }
                }
            })
            .collect()
    }

    /// Slot with the highest expected utility, lowest slot index on ties
    pub fn target_slot(&self, t: usize, history: &History, reserve: f64) -> AuctionResult<SlotInfo> {
        let slots = self.slot_info(t, history, reserve)?;
        let utils = self.utils_for(&slots, history)?;
        let best = argmax_index(&utils)
            .ok_or_else(|| AuctionError::PreconditionViolation(format!("round {} offered no slots", t - 1)))?;
        Ok(slots[best])
    }
}

impl AgentTrait for BalancedBidder {
    fn id(&self) -> AgentId {
        self.id
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn budget(&self) -> Option<f64> {
        self.budget
    }

    fn initial_bid(&self, _reserve: f64) -> f64 {
        self.value / 2.0
    }

    fn bid(&self, t: usize, history: &History, reserve: f64) -> AuctionResult<f64> {
        let target = self.target_slot(t, history, reserve)?;

        // Too expensive to compete for, or the top slot: bid the true value
        if target.min_bid > self.value || target.slot == 0 {
            return Ok(self.value);
        }

        let pos = self.position_weights(history)?;
        let better = pos[target.slot - 1];
        if better == 0.0 {
            return Err(AuctionError::ArithmeticDegeneracy(format!(
                "slot {} has zero position weight, cannot shade a bid for slot {}",
                target.slot - 1,
                target.slot
            )));
        }
        Ok(self.value - (pos[target.slot] / better) * (self.value - target.min_bid))
    }

    fn get_bidding_type(&self) -> String {
        match self.utility_formula {
            UtilityFormula::Corrected => "Balanced bidding".to_string(),
            UtilityFormula::Literal => "Balanced bidding (return on spend utility)".to_string(),
        }
    }
}

impl fmt::Display for BalancedBidder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BalancedBidder(id={}, value={})", self.id.0, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuctionOutcome, Bid};

    /// One round with clicks [10, 4, 0] where agent 0 bid 5 and the others bid 6 and 3
    fn one_round_history() -> History {
        let mut history = History::new();
        history.push(Round::new(
            vec![10.0, 4.0, 0.0],
            vec![Bid::new(AgentId(0), 5.0), Bid::new(AgentId(1), 6.0), Bid::new(AgentId(2), 3.0)],
            1.0,
            AuctionOutcome::empty(),
        ));
        history
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{} vs {}", actual, expected);
    }

    #[test]
    fn test_initial_bid_is_half_value() {
        let bidder = BalancedBidder::new(AgentId(0), 10.0, None);
        assert_eq!(bidder.initial_bid(1.0), 5.0);
    }

    #[test]
    fn test_slot_info() {
        let bidder = BalancedBidder::new(AgentId(0), 10.0, None);
        let info = bidder.slot_info(1, &one_round_history(), 1.0).unwrap();
        assert_eq!(
            info,
            vec![
                SlotInfo { slot: 0, min_bid: 6.0, max_bid: 12.0 },
                SlotInfo { slot: 1, min_bid: 3.0, max_bid: 6.0 },
                SlotInfo { slot: 2, min_bid: 1.0, max_bid: 3.0 },
            ]
        );
    }

    #[test]
    fn test_expected_utils_corrected() {
        let bidder = BalancedBidder::new(AgentId(0), 10.0, None);
        let utils = bidder.expected_utils(1, &one_round_history(), 1.0).unwrap();
        assert_close(utils[0], 1.0);
        assert_close(utils[1], 2.2);
        assert_close(utils[2], 0.0);
    }

    #[test]
    fn test_expected_utils_literal() {
        let bidder = BalancedBidder::new(AgentId(0), 10.0, None).with_utility_formula(UtilityFormula::Literal);
        let utils = bidder.expected_utils(1, &one_round_history(), 1.0).unwrap();
        assert_close(utils[0], 1.0 / 9.0);
        assert_close(utils[1], 0.4 * 5.5 / 4.5);
    }

    #[test]
    fn test_bid_shades_toward_target_slot() {
        // target is slot 1 with min bid 3: 10 - (0.4 / 1.0) * (10 - 3)
        let bidder = BalancedBidder::new(AgentId(0), 10.0, None);
        let history = one_round_history();
        assert_eq!(bidder.target_slot(1, &history, 1.0).unwrap().slot, 1);
        assert_close(bidder.bid(1, &history, 1.0).unwrap(), 7.2);
    }

    #[test]
    fn test_formulas_can_pick_different_slots() {
        let history = one_round_history();
        let corrected = BalancedBidder::new(AgentId(0), 20.0, None);
        assert_eq!(corrected.target_slot(1, &history, 1.0).unwrap().slot, 0);
        assert_eq!(corrected.bid(1, &history, 1.0).unwrap(), 20.0);

        let literal = corrected.clone().with_utility_formula(UtilityFormula::Literal);
        assert_eq!(literal.target_slot(1, &history, 1.0).unwrap().slot, 1);
        assert_close(literal.bid(1, &history, 1.0).unwrap(), 20.0 - 0.4 * 17.0);
    }

    #[test]
    fn test_bid_value_when_priced_out() {
        // with reserve 5 only the bid of 6 competes; every slot costs at least 5 > value
        let bidder = BalancedBidder::new(AgentId(0), 4.0, None);
        let history = one_round_history();
        let target = bidder.target_slot(1, &history, 5.0).unwrap();
        assert!(target.min_bid > bidder.value);
        assert_eq!(bidder.bid(1, &history, 5.0).unwrap(), 4.0);
    }

    #[test]
    fn test_bid_never_exceeds_value() {
        let history = one_round_history();
        for value in [0.5, 2.0, 3.5, 7.0, 10.0, 25.0] {
            let bidder = BalancedBidder::new(AgentId(0), value, None);
            let bid = bidder.bid(1, &history, 1.0).unwrap();
            assert!(bid <= value, "value {} bid {}", value, bid);
        }
    }

    #[test]
    fn test_bid_requires_history() {
        let bidder = BalancedBidder::new(AgentId(0), 10.0, None);
        let history = one_round_history();
        assert!(matches!(bidder.bid(0, &history, 1.0), Err(AuctionError::PreconditionViolation(_))));
        assert!(matches!(bidder.bid(2, &history, 1.0), Err(AuctionError::PreconditionViolation(_))));

        let mut empty_bids = History::new();
        empty_bids.push(Round::new(vec![10.0, 4.0], vec![], 1.0, AuctionOutcome::empty()));
        assert!(matches!(bidder.bid(1, &empty_bids, 1.0), Err(AuctionError::PreconditionViolation(_))));
    }

    #[test]
    fn test_literal_zero_price_is_degenerate() {
        // one competitor and reserve 0: the bottom slot's range is [0, 0]
        let mut history = History::new();
        history.push(Round::new(
            vec![10.0, 4.0, 0.0],
            vec![Bid::new(AgentId(0), 5.0), Bid::new(AgentId(1), 6.0)],
            0.0,
            AuctionOutcome::empty(),
        ));
        let literal = BalancedBidder::new(AgentId(0), 10.0, None).with_utility_formula(UtilityFormula::Literal);
        assert!(matches!(literal.bid(1, &history, 0.0), Err(AuctionError::ArithmeticDegeneracy(_))));

        // same history scored by value minus price: slot 1 with min bid 0, 10 - 0.4 * 10
        let corrected = literal.clone().with_utility_formula(UtilityFormula::Corrected);
        assert_close(corrected.bid(1, &history, 0.0).unwrap(), 6.0);
    }

    #[test]
    fn test_flat_clicks_are_degenerate() {
        let mut history = History::new();
        history.push(Round::new(vec![5.0, 5.0], vec![Bid::new(AgentId(1), 2.0)], 0.0, AuctionOutcome::empty()));
        let bidder = BalancedBidder::new(AgentId(0), 10.0, None);
        assert!(matches!(bidder.bid(1, &history, 0.0), Err(AuctionError::ArithmeticDegeneracy(_))));
    }

    #[test]
    fn test_display() {
        let bidder = BalancedBidder::new(AgentId(3), 40.0, Some(500.0));
        assert_eq!(bidder.to_string(), "BalancedBidder(id=3, value=40)");
        assert_eq!(bidder.budget(), Some(500.0));
    }
}
