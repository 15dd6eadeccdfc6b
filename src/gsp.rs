use crate::error::AuctionResult;
use crate::mechanism::{occupied_slots, ranked_valid_bids, MechanismTrait, TieBreak};
use crate::types::{AuctionOutcome, Bid};

/// Generalized second price: the occupant of each slot pays, per click, the bid ranked just below it
/// (or the reserve price when nobody is ranked below)
pub struct Gsp {
    pub tie_break: TieBreak,
}

impl Gsp {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }
}

impl MechanismTrait for Gsp {
    fn name(&self) -> &str {
        "GSP"
    }

    fn compute(&self, slot_clicks: &[f64], reserve: f64, bids: &[Bid]) -> AuctionResult<AuctionOutcome> {
        let ranked = ranked_valid_bids(slot_clicks, reserve, bids, self.tie_break)?;
        let n = occupied_slots(slot_clicks, &ranked);

        let allocation = ranked[..n].iter().map(|b| b.agent_id).collect();
        let per_click_payments = (0..n)
            .map(|k| ranked.get(k + 1).map_or(reserve, |b| b.amount))
            .collect();

        Ok(AuctionOutcome { allocation, per_click_payments })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgentId;

    fn bids(pairs: &[(usize, f64)]) -> Vec<Bid> {
        pairs.iter().map(|&(id, amount)| Bid::new(AgentId(id), amount)).collect()
    }

    #[test]
    fn test_gsp_next_bid_pricing() {
        let gsp = Gsp::new(TieBreak::LowestId);
        let outcome = gsp.compute(&[10.0, 4.0, 0.0], 1.0, &bids(&[(0, 10.0), (1, 6.0), (2, 3.0), (3, 1.0)])).unwrap();
        assert_eq!(outcome.allocation, vec![AgentId(0), AgentId(1), AgentId(2)]);
        assert_eq!(outcome.per_click_payments, vec![6.0, 3.0, 1.0]);
    }

    #[test]
    fn test_gsp_last_bidder_pays_reserve() {
        let gsp = Gsp::new(TieBreak::LowestId);
        let outcome = gsp.compute(&[10.0, 4.0, 2.0], 2.0, &bids(&[(0, 5.0), (1, 4.0), (2, 1.0)])).unwrap();
        assert_eq!(outcome.allocation, vec![AgentId(0), AgentId(1)]);
        assert_eq!(outcome.per_click_payments, vec![4.0, 2.0]);
    }

    #[test]
    fn test_gsp_no_valid_bids() {
        let gsp = Gsp::new(TieBreak::LowestId);
        let outcome = gsp.compute(&[10.0, 4.0], 5.0, &bids(&[(0, 1.0), (1, 4.9)])).unwrap();
        assert_eq!(outcome, AuctionOutcome::empty());
    }

    #[test]
    fn test_gsp_shares_bid_range() {
        let gsp = Gsp::new(TieBreak::LowestId);
        let (min_bid, max_bid) = gsp.bid_range_for_slot(1, &[10.0, 4.0, 0.0], 1.0, &bids(&[(1, 6.0), (2, 3.0)])).unwrap();
        assert_eq!((min_bid, max_bid), (3.0, Some(6.0)));
    }
}
