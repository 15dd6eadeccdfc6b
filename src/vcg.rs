//! Vickrey-Clarke-Groves pricing for position auctions.
//!
//! The allocation is the same as GSP. Each occupant pays the externality it imposes on the bidders
//! below it, which for position auctions reduces to a recursion running from the bottom slot up:
//!
//! - bottom occupied slot n-1: clicks[n-1] * max(reserve, highest bid left out of the allocation)
//! - slot k < n-1: (clicks[k] - clicks[k+1]) * bid of occupant k+1 + total payment of slot k+1
//!
//! The recursion is evaluated as a single backward pass over the slots.

use crate::error::AuctionResult;
use crate::mechanism::{occupied_slots, rank_bids, ranked_valid_bids, MechanismTrait, TieBreak};
use crate::types::{AuctionOutcome, Bid};

pub struct Vcg {
    pub tie_break: TieBreak,
}

impl Vcg {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    /// Total (not per click) payment of every occupied slot
    /// `allocated` must be the ranked allocation and `excluded_price` the price of the first bidder left out
    fn total_payments(slot_clicks: &[f64], allocated: &[Bid], excluded_price: f64) -> Vec<f64> {
        let n = allocated.len();
        let mut totals = vec![0.0; n];
        if n == 0 {
            return totals;
        }
        totals[n - 1] = slot_clicks[n - 1] * excluded_price;
        for k in (0..n - 1).rev() {
            totals[k] = (slot_clicks[k] - slot_clicks[k + 1]) * allocated[k + 1].amount + totals[k + 1];
        }
        totals
    }
}

impl MechanismTrait for Vcg {
    fn name(&self) -> &str {
        "VCG"
    }

    fn compute(&self, slot_clicks: &[f64], reserve: f64, bids: &[Bid]) -> AuctionResult<AuctionOutcome> {
        let ranked = ranked_valid_bids(slot_clicks, reserve, bids, self.tie_break)?;
        let n = occupied_slots(slot_clicks, &ranked);
        if n == 0 {
            return Ok(AuctionOutcome::empty());
        }
        let allocated = &ranked[..n];

        // Highest bid outside the allocation, below-reserve bids included. Nobody left out means reserve only.
        let excluded_price = rank_bids(bids, self.tie_break)
            .get(n)
            .map_or(reserve, |b| b.amount.max(reserve));

        let totals = Self::total_payments(slot_clicks, allocated, excluded_price);

        // A slot without clicks owes nothing in total; report the marginal competing bid as its price
        let per_click_payments = totals
            .iter()
            .enumerate()
            .map(|(k, &total)| {
                if slot_clicks[k] > 0.0 {
                    total / slot_clicks[k]
                } else {
                    allocated.get(k + 1).map_or(excluded_price, |b| b.amount)
                }
            })
            .collect();

        Ok(AuctionOutcome {
            allocation: allocated.iter().map(|b| b.agent_id).collect(),
            per_click_payments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuctionError;
    use crate::gsp::Gsp;
    use crate::types::AgentId;

    fn bids(pairs: &[(usize, f64)]) -> Vec<Bid> {
        pairs.iter().map(|&(id, amount)| Bid::new(AgentId(id), amount)).collect()
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{:?} vs {:?}", actual, expected);
        }
    }

    #[test]
    fn test_vcg_hand_computed_example() {
        // totals: slot 2 = 0 * 1, slot 1 = (4 - 0) * 3 + 0 = 12, slot 0 = (10 - 4) * 6 + 12 = 48
        let vcg = Vcg::new(TieBreak::LowestId);
        let outcome = vcg.compute(&[10.0, 4.0, 0.0], 1.0, &bids(&[(0, 10.0), (1, 6.0), (2, 3.0), (3, 1.0)])).unwrap();
        assert_eq!(outcome.allocation, vec![AgentId(0), AgentId(1), AgentId(2)]);
        assert_close(&outcome.per_click_payments, &[4.8, 3.0, 1.0]);
    }

    #[test]
    fn test_vcg_positive_clicks_everywhere() {
        // totals: slot 2 = 2 * 2, slot 1 = (5 - 2) * 3 + 4 = 13, slot 0 = (10 - 5) * 7 + 13 = 48
        let vcg = Vcg::new(TieBreak::LowestId);
        let outcome = vcg.compute(&[10.0, 5.0, 2.0], 0.5, &bids(&[(0, 9.0), (1, 7.0), (2, 3.0), (3, 2.0), (4, 1.0)])).unwrap();
        assert_close(&outcome.per_click_payments, &[4.8, 2.6, 2.0]);
    }

    #[test]
    fn test_vcg_no_excluded_bidder_uses_reserve() {
        let vcg = Vcg::new(TieBreak::LowestId);
        let outcome = vcg.compute(&[10.0, 5.0], 2.0, &bids(&[(0, 8.0), (1, 4.0)])).unwrap();
        assert_eq!(outcome.allocation, vec![AgentId(0), AgentId(1)]);
        assert_close(&outcome.per_click_payments, &[3.0, 2.0]);
    }

    #[test]
    fn test_vcg_excluded_bid_below_reserve_is_capped() {
        let vcg = Vcg::new(TieBreak::LowestId);
        let outcome = vcg.compute(&[10.0, 5.0, 1.0], 2.0, &bids(&[(0, 8.0), (1, 4.0), (2, 1.5)])).unwrap();
        assert_eq!(outcome.allocation.len(), 2);
        assert_close(&outcome.per_click_payments, &[3.0, 2.0]);
    }

    #[test]
    fn test_vcg_all_below_reserve() {
        let vcg = Vcg::new(TieBreak::LowestId);
        let outcome = vcg.compute(&[10.0, 4.0], 5.0, &bids(&[(0, 1.0), (1, 4.0)])).unwrap();
        assert_eq!(outcome, AuctionOutcome::empty());
        let outcome = vcg.compute(&[10.0, 4.0], 5.0, &[]).unwrap();
        assert!(outcome.is_empty());
    }

    #[test]
    fn test_vcg_lengths_match() {
        let vcg = Vcg::new(TieBreak::LowestId);
        let outcome = vcg.compute(&[10.0, 6.0, 3.0, 1.0], 1.0, &bids(&[(0, 3.0), (1, 5.0)])).unwrap();
        assert_eq!(outcome.allocation, vec![AgentId(1), AgentId(0)]);
        assert_eq!(outcome.per_click_payments.len(), 2);
    }

    #[test]
    fn test_vcg_total_payment_non_increasing() {
        let vcg = Vcg::new(TieBreak::LowestId);
        let clicks = [50.0, 38.0, 28.0, 21.0];
        let outcome = vcg.compute(&clicks, 0.5, &bids(&[(0, 12.0), (1, 11.0), (2, 7.5), (3, 7.5), (4, 2.0)])).unwrap();
        let totals: Vec<f64> = (0..outcome.allocation.len()).map(|k| outcome.total_payment(k, &clicks)).collect();
        assert!(totals.windows(2).all(|w| w[0] >= w[1]), "{:?}", totals);
    }

    #[test]
    fn test_vcg_never_charges_more_than_gsp() {
        let clicks = [40.0, 30.0, 12.0];
        let input = bids(&[(0, 9.0), (1, 8.0), (2, 4.0), (3, 3.0)]);
        let vcg = Vcg::new(TieBreak::LowestId).compute(&clicks, 1.0, &input).unwrap();
        let gsp = Gsp::new(TieBreak::LowestId).compute(&clicks, 1.0, &input).unwrap();
        assert_eq!(vcg.allocation, gsp.allocation);
        for (v, g) in vcg.per_click_payments.iter().zip(&gsp.per_click_payments) {
            assert!(v <= g);
        }
    }

    #[test]
    fn test_vcg_deterministic_ties() {
        let input = bids(&[(3, 5.0), (1, 5.0), (2, 5.0), (0, 2.0)]);
        for tie_break in [TieBreak::LowestId, TieBreak::Seeded { seed: 99 }] {
            let vcg = Vcg::new(tie_break);
            let first = vcg.compute(&[10.0, 4.0], 1.0, &input).unwrap();
            let second = vcg.compute(&[10.0, 4.0], 1.0, &input).unwrap();
            assert_eq!(first, second);
        }
        let outcome = Vcg::new(TieBreak::LowestId).compute(&[10.0, 4.0], 1.0, &input).unwrap();
        assert_eq!(outcome.allocation, vec![AgentId(1), AgentId(2)]);
    }

    #[test]
    fn test_vcg_rejects_negative_bid() {
        let vcg = Vcg::new(TieBreak::LowestId);
        let err = vcg.compute(&[10.0, 4.0], 1.0, &bids(&[(0, 3.0), (1, -1.0)])).unwrap_err();
        assert_eq!(err, AuctionError::InvalidBid { agent_id: AgentId(1), amount: -1.0 });
    }
}
