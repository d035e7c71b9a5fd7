use crate::catalog::BidCatalog;
use crate::ledger::BudgetLedger;
use crate::policy::AllocationPolicy;
use crate::types::{Allocation, Bid};

/// Allocates incoming queries to advertisers under one policy
/// The same skeleton serves all policies: look up the keyword's bids, keep
/// those the advertiser can still afford, score them, charge the winner.
pub struct AllocationEngine {
    policy: Box<dyn AllocationPolicy>,
}

impl AllocationEngine {
    pub fn new(policy: Box<dyn AllocationPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Allocate one query
    ///
    /// A bid is eligible when its value does not exceed the advertiser's
    /// remaining budget, so the subsequent charge can never overdraw. The
    /// winner is the maximum-score eligible bid; equal scores go to the
    /// smallest advertiser id. That comparison is part of the algorithm
    /// contract, not an accident of iteration order. The charge is the raw
    /// bid value under every policy.
    ///
    /// Returns None, with no ledger mutation, when the keyword has no bids
    /// or none are eligible.
    pub fn allocate(
        &self,
        keyword: &str,
        catalog: &BidCatalog,
        ledger: &mut BudgetLedger,
    ) -> Option<Allocation> {
        let mut winner: Option<(&Bid, f64)> = None;

        for bid in catalog.bids_for(keyword) {
            if bid.value > ledger.remaining(bid.advertiser) {
                continue;
            }
            let score = self.policy.score(bid, ledger);
            let better = match winner {
                None => true,
                Some((best, best_score)) => {
                    score > best_score || (score == best_score && bid.advertiser < best.advertiser)
                }
            };
            if better {
                winner = Some((bid, score));
            }
        }

        let (bid, _score) = winner?;
        let allocation = Allocation {
            advertiser: bid.advertiser,
            amount: bid.value,
        };
        ledger.charge(allocation.advertiser, allocation.amount);
        Some(allocation)
    }
}
