use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, LogNormal};

use crate::catalog::BidCatalog;
use crate::types::{AdvertiserId, Bid};
use crate::utils::lognormal_dist;

/// Parameters for synthetic catalog generation
pub struct GeneratorParams {
    pub num_advertisers: usize,
    pub num_keywords: usize,
    /// How many distinct keywords each advertiser bids on
    pub bids_per_advertiser: usize,
    pub bid_value_dist: LogNormal<f64>,
    pub budget_dist: LogNormal<f64>,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            num_advertisers: 20,
            num_keywords: 50,
            bids_per_advertiser: 8,
            bid_value_dist: lognormal_dist(2.0, 1.0),
            budget_dist: lognormal_dist(50.0, 15.0),
        }
    }
}

/// Name of the i-th synthetic keyword
fn keyword(index: usize) -> String {
    format!("kw{}", index)
}

/// Generate a synthetic catalog
/// Each advertiser gets a log-normal budget and bids on a random subset of
/// the keyword vocabulary, at most once per keyword.
pub fn generate_catalog(params: &GeneratorParams, rng: &mut StdRng) -> BidCatalog {
    let mut original_budgets = BTreeMap::new();
    let mut bids = Vec::new();

    for advertiser in 0..params.num_advertisers as AdvertiserId {
        original_budgets.insert(advertiser, params.budget_dist.sample(rng));

        let mut keyword_ids: Vec<usize> = (0..params.num_keywords).collect();
        keyword_ids.shuffle(rng);
        for &k in keyword_ids.iter().take(params.bids_per_advertiser) {
            bids.push(Bid {
                advertiser,
                keyword: keyword(k),
                value: params.bid_value_dist.sample(rng),
            });
        }
    }

    BidCatalog::new(original_budgets, bids)
        .expect("generated bids only reference generated advertisers")
}

/// Generate a query stream drawn uniformly from the keyword vocabulary
pub fn generate_queries(
    num_queries: usize,
    num_keywords: usize,
    rng: &mut StdRng,
) -> Vec<String> {
    (0..num_queries)
        .map(|_| keyword(rng.gen_range(0..num_keywords)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_generated_catalog_is_well_formed() {
        let params = GeneratorParams::default();
        let mut rng = StdRng::seed_from_u64(5);
        let catalog = generate_catalog(&params, &mut rng);

        assert_eq!(catalog.num_advertisers(), params.num_advertisers);
        for (_, budget) in catalog.advertisers() {
            assert!(budget > 0.0);
        }

        // At most one bid per (advertiser, keyword)
        for k in 0..params.num_keywords {
            let bids = catalog.bids_for(&format!("kw{}", k));
            let advertisers: HashSet<_> = bids.iter().map(|b| b.advertiser).collect();
            assert_eq!(advertisers.len(), bids.len());
            for bid in bids {
                assert!(bid.value > 0.0);
            }
        }
    }

    #[test]
    fn test_generation_is_seed_deterministic() {
        let params = GeneratorParams::default();
        let mut rng_one = StdRng::seed_from_u64(9);
        let mut rng_two = StdRng::seed_from_u64(9);

        let first = generate_catalog(&params, &mut rng_one);
        let second = generate_catalog(&params, &mut rng_two);
        assert_eq!(first.optimum(), second.optimum());

        let queries_one = generate_queries(30, params.num_keywords, &mut rng_one);
        let queries_two = generate_queries(30, params.num_keywords, &mut rng_two);
        assert_eq!(queries_one, queries_two);
    }

    #[test]
    fn test_queries_stay_in_vocabulary() {
        let mut rng = StdRng::seed_from_u64(3);
        for query in generate_queries(100, 10, &mut rng) {
            let index: usize = query.strip_prefix("kw").unwrap().parse().unwrap();
            assert!(index < 10);
        }
    }
}
