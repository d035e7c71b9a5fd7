use std::collections::{BTreeMap, HashMap};
use std::error::Error;

use crate::types::{AdvertiserId, Bid};

/// Immutable index of all bids and original budgets
/// Built once from the input dataset and never mutated afterwards; per-pass
/// budget state lives in the BudgetLedger, not here.
pub struct BidCatalog {
    bids_by_keyword: HashMap<String, Vec<Bid>>,
    original_budgets: BTreeMap<AdvertiserId, f64>,
}

impl BidCatalog {
    /// Build the catalog from per-advertiser budgets and bid rows
    /// Bids within a keyword are stored sorted by advertiser id so that
    /// nothing downstream depends on input row order.
    /// Fails if a bid references an advertiser with no recorded budget.
    pub fn new(
        original_budgets: BTreeMap<AdvertiserId, f64>,
        bids: Vec<Bid>,
    ) -> Result<Self, Box<dyn Error>> {
        let mut bids_by_keyword: HashMap<String, Vec<Bid>> = HashMap::new();
        for bid in bids {
            if !original_budgets.contains_key(&bid.advertiser) {
                return Err(format!(
                    "bid on keyword '{}' references advertiser {} with no recorded budget",
                    bid.keyword, bid.advertiser
                )
                .into());
            }
            bids_by_keyword
                .entry(bid.keyword.clone())
                .or_default()
                .push(bid);
        }
        for keyword_bids in bids_by_keyword.values_mut() {
            keyword_bids.sort_by_key(|b| b.advertiser);
        }
        Ok(Self {
            bids_by_keyword,
            original_budgets,
        })
    }

    /// All bids placed on the given keyword, sorted by advertiser id
    /// Empty when nobody bids on the keyword.
    pub fn bids_for(&self, keyword: &str) -> &[Bid] {
        self.bids_by_keyword
            .get(keyword)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Original total budget of an advertiser
    /// Panics for an advertiser the catalog has never seen; callers only ask
    /// about advertisers obtained from the catalog itself.
    pub fn original_budget(&self, advertiser: AdvertiserId) -> f64 {
        self.original_budgets[&advertiser]
    }

    /// All advertisers with their original budgets, in id order
    pub fn advertisers(&self) -> impl Iterator<Item = (AdvertiserId, f64)> + '_ {
        self.original_budgets.iter().map(|(&id, &budget)| (id, budget))
    }

    /// Offline optimum: the revenue if every budget were fully spent
    pub fn optimum(&self) -> f64 {
        self.original_budgets.values().sum()
    }

    pub fn num_advertisers(&self) -> usize {
        self.original_budgets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bid(advertiser: AdvertiserId, keyword: &str, value: f64) -> Bid {
        Bid {
            advertiser,
            keyword: keyword.to_string(),
            value,
        }
    }

    #[test]
    fn test_lookup_and_optimum() {
        let budgets = BTreeMap::from([(1, 10.0), (2, 20.0)]);
        let catalog = BidCatalog::new(
            budgets,
            vec![bid(2, "shoes", 3.0), bid(1, "shoes", 2.0), bid(1, "hats", 1.0)],
        )
        .unwrap();

        let shoes = catalog.bids_for("shoes");
        assert_eq!(shoes.len(), 2);
        // Sorted by advertiser id regardless of insertion order
        assert_eq!(shoes[0].advertiser, 1);
        assert_eq!(shoes[1].advertiser, 2);

        assert!(catalog.bids_for("gloves").is_empty());
        assert_eq!(catalog.optimum(), 30.0);
        assert_eq!(catalog.original_budget(2), 20.0);
        assert_eq!(catalog.num_advertisers(), 2);
    }

    #[test]
    fn test_bid_without_budget_is_rejected() {
        let budgets = BTreeMap::from([(1, 10.0)]);
        let result = BidCatalog::new(budgets, vec![bid(7, "shoes", 3.0)]);
        assert!(result.is_err());
        let message = result.err().unwrap().to_string();
        assert!(message.contains("advertiser 7"));
    }
}
