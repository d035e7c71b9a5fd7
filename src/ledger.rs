use std::collections::BTreeMap;

use crate::catalog::BidCatalog;
use crate::types::AdvertiserId;

/// Per-advertiser budget state within one pass
/// Invariant: remaining + spent == original_budget, remaining >= 0.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub original_budget: f64,
    pub remaining: f64,
    pub spent: f64,
}

/// Mutable per-advertiser budget state for a single simulation pass
/// Owned by exactly one pass at a time; reset() restores full budgets before
/// each pass so no spend leaks across passes.
pub struct BudgetLedger {
    entries: BTreeMap<AdvertiserId, LedgerEntry>,
}

impl BudgetLedger {
    /// Create a ledger with full budgets and zero spend for every advertiser
    /// in the catalog
    pub fn new(catalog: &BidCatalog) -> Self {
        let entries = catalog
            .advertisers()
            .map(|(advertiser, budget)| {
                (
                    advertiser,
                    LedgerEntry {
                        original_budget: budget,
                        remaining: budget,
                        spent: 0.0,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Restore every advertiser to a full budget and zero spend
    pub fn reset(&mut self) {
        for entry in self.entries.values_mut() {
            entry.remaining = entry.original_budget;
            entry.spent = 0.0;
        }
    }

    /// Unspent budget of an advertiser
    pub fn remaining(&self, advertiser: AdvertiserId) -> f64 {
        self.entries[&advertiser].remaining
    }

    /// Cumulative charges against an advertiser in this pass
    pub fn spent(&self, advertiser: AdvertiserId) -> f64 {
        self.entries[&advertiser].spent
    }

    /// Fraction of the original budget already spent, in [0, 1]
    /// A zero-budget advertiser counts as fully spent.
    pub fn spent_fraction(&self, advertiser: AdvertiserId) -> f64 {
        let entry = &self.entries[&advertiser];
        if entry.original_budget > 0.0 {
            entry.spent / entry.original_budget
        } else {
            1.0
        }
    }

    /// Charge an advertiser for a won query
    /// The engine must have verified eligibility first; charging past the
    /// remaining budget is a programming error, not a recoverable condition.
    pub fn charge(&mut self, advertiser: AdvertiserId, amount: f64) {
        let entry = match self.entries.get_mut(&advertiser) {
            Some(entry) => entry,
            None => panic!("charge for unknown advertiser {}", advertiser),
        };
        if amount > entry.remaining {
            panic!(
                "charge of {} exceeds remaining budget {} of advertiser {}",
                amount, entry.remaining, advertiser
            );
        }
        entry.remaining -= amount;
        entry.spent += amount;
    }

    /// Sum of all spend so far; equals the pass revenue before rounding
    pub fn total_spent(&self) -> f64 {
        self.entries.values().map(|e| e.spent).sum()
    }

    /// All entries in advertiser id order
    pub fn entries(&self) -> impl Iterator<Item = (AdvertiserId, &LedgerEntry)> {
        self.entries.iter().map(|(&id, entry)| (id, entry))
    }
}
