use std::collections::BTreeMap;

use crate::catalog::BidCatalog;
use crate::engine::AllocationEngine;
use crate::ledger::BudgetLedger;
use crate::logger::{LogEvent, Logger};
use crate::logln;
use crate::types::{AdvertiserId, Allocation};
use crate::utils::round2;

/// One simulation pass over an ordered query sequence
/// Note: results are matched to queries by index in the vectors.
pub struct SimulationRun {
    pub results: Vec<Option<Allocation>>,
    /// Sum of all charges in this pass, rounded to 2 decimals
    pub total_revenue: f64,
}

impl SimulationRun {
    /// Reset the ledger, then allocate every query in the given order
    /// The ledger is reset before, never after, the pass; a stale ledger
    /// would leak spend from the previous pass into this one.
    pub fn new(
        queries: &[String],
        catalog: &BidCatalog,
        ledger: &mut BudgetLedger,
        engine: &AllocationEngine,
    ) -> Self {
        ledger.reset();

        let mut results = Vec::with_capacity(queries.len());
        let mut total_revenue = 0.0;
        for query in queries {
            let result = engine.allocate(query, catalog, ledger);
            if let Some(allocation) = result {
                total_revenue += allocation.amount;
            }
            results.push(result);
        }

        Self {
            results,
            total_revenue: round2(total_revenue),
        }
    }

    /// Winning advertisers per query, for determinism comparisons
    pub fn winner_sequence(&self) -> Vec<Option<AdvertiserId>> {
        self.results
            .iter()
            .map(|r| r.map(|a| a.advertiser))
            .collect()
    }
}

/// Statistics for a single advertiser over one pass
pub struct AdvertiserStat {
    pub advertiser: AdvertiserId,
    pub queries_won: usize,
    pub spent: f64,
    pub original_budget: f64,
}

/// Overall statistics for one pass
pub struct OverallStat {
    pub queries_matched: usize,
    pub queries_unmatched: usize,
    pub total_revenue: f64,
}

/// Complete pass statistics
pub struct SimulationStat {
    pub advertiser_stats: Vec<AdvertiserStat>,
    pub overall_stat: OverallStat,
}

impl SimulationStat {
    /// Generate statistics from the catalog and a finished pass
    pub fn new(catalog: &BidCatalog, run: &SimulationRun) -> Self {
        let mut wins: BTreeMap<AdvertiserId, (usize, f64)> = BTreeMap::new();
        let mut queries_matched = 0;
        let mut queries_unmatched = 0;

        for result in &run.results {
            match result {
                Some(allocation) => {
                    queries_matched += 1;
                    let entry = wins.entry(allocation.advertiser).or_insert((0, 0.0));
                    entry.0 += 1;
                    entry.1 += allocation.amount;
                }
                None => queries_unmatched += 1,
            }
        }

        let advertiser_stats = catalog
            .advertisers()
            .map(|(advertiser, original_budget)| {
                let (queries_won, spent) = wins.get(&advertiser).copied().unwrap_or((0, 0.0));
                AdvertiserStat {
                    advertiser,
                    queries_won,
                    spent,
                    original_budget,
                }
            })
            .collect();

        Self {
            advertiser_stats,
            overall_stat: OverallStat {
                queries_matched,
                queries_unmatched,
                total_revenue: run.total_revenue,
            },
        }
    }

    /// Sum of per-advertiser spend; equals total_revenue up to rounding
    pub fn total_spent(&self) -> f64 {
        self.advertiser_stats.iter().map(|s| s.spent).sum()
    }

    /// Output per-advertiser statistics
    pub fn printout_advertisers(&self, logger: &mut Logger, event: LogEvent) {
        for stat in &self.advertiser_stats {
            logln!(
                logger,
                event,
                "Advertiser {} - Queries Won: {} - Spent: {:.2} / {:.2}",
                stat.advertiser,
                stat.queries_won,
                stat.spent,
                stat.original_budget
            );
        }
    }

    /// Output complete pass statistics
    pub fn printout(&self, logger: &mut Logger, event: LogEvent) {
        logln!(logger, event, "\n=== Pass Statistics ===");
        self.printout_advertisers(logger, event);
        logln!(
            logger,
            event,
            "Queries (matched/unmatched): {} / {}",
            self.overall_stat.queries_matched,
            self.overall_stat.queries_unmatched
        );
        logln!(
            logger,
            event,
            "Total Revenue: {:.2}",
            self.overall_stat.total_revenue
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyKind;
    use crate::types::Bid;

    fn bid(advertiser: u32, keyword: &str, value: f64) -> Bid {
        Bid {
            advertiser,
            keyword: keyword.to_string(),
            value,
        }
    }

    fn fixture() -> BidCatalog {
        let budgets = BTreeMap::from([(1, 10.0), (2, 10.0)]);
        BidCatalog::new(
            budgets,
            vec![
                bid(1, "shoes", 5.0),
                bid(2, "shoes", 6.0),
                bid(2, "hats", 4.0),
            ],
        )
        .unwrap()
    }

    fn queries(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_single_query_pass() {
        // Greedy on one "shoes" query: advertiser 2 wins with 6
        let catalog = fixture();
        let mut ledger = BudgetLedger::new(&catalog);
        let engine = AllocationEngine::new(PolicyKind::Greedy.create_policy());

        let run = SimulationRun::new(&queries(&["shoes"]), &catalog, &mut ledger, &engine);
        assert_eq!(run.total_revenue, 6.0);
        assert_eq!(run.winner_sequence(), vec![Some(2)]);
    }

    #[test]
    fn test_revenue_identity() {
        // Revenue of a pass equals total spend in the ledger at pass end
        let catalog = fixture();
        let mut ledger = BudgetLedger::new(&catalog);
        let engine = AllocationEngine::new(PolicyKind::Greedy.create_policy());

        let run = SimulationRun::new(
            &queries(&["shoes", "hats", "shoes", "gloves"]),
            &catalog,
            &mut ledger,
            &engine,
        );
        assert!((run.total_revenue - round2(ledger.total_spent())).abs() < 1e-9);

        let stat = SimulationStat::new(&catalog, &run);
        assert!((stat.total_spent() - ledger.total_spent()).abs() < 1e-9);
        assert_eq!(stat.overall_stat.queries_unmatched, 1);
        assert_eq!(stat.overall_stat.queries_matched, 3);
    }

    #[test]
    fn test_ledger_invariant_after_every_query() {
        let catalog = fixture();
        let mut ledger = BudgetLedger::new(&catalog);
        let engine = AllocationEngine::new(PolicyKind::Balance.create_policy());

        ledger.reset();
        for query in queries(&["shoes", "shoes", "shoes", "hats", "hats"]) {
            engine.allocate(&query, &catalog, &mut ledger);
            for (_, entry) in ledger.entries() {
                assert!((entry.remaining + entry.spent - entry.original_budget).abs() < 1e-9);
                assert!(entry.remaining >= 0.0);
            }
        }
    }

    #[test]
    fn test_repeated_passes_are_identical() {
        // Same catalog, same order, same policy: the winner sequence and
        // revenue must not change between passes with a reset in between
        let catalog = fixture();
        let mut ledger = BudgetLedger::new(&catalog);
        let engine = AllocationEngine::new(PolicyKind::Msvv.create_policy());
        let sequence = queries(&["shoes", "hats", "shoes", "shoes"]);

        let first = SimulationRun::new(&sequence, &catalog, &mut ledger, &engine);
        let second = SimulationRun::new(&sequence, &catalog, &mut ledger, &engine);
        assert_eq!(first.total_revenue, second.total_revenue);
        assert_eq!(first.winner_sequence(), second.winner_sequence());
    }

    #[test]
    fn test_pass_with_no_matching_queries() {
        let catalog = fixture();
        let mut ledger = BudgetLedger::new(&catalog);
        let engine = AllocationEngine::new(PolicyKind::Greedy.create_policy());

        let run = SimulationRun::new(&queries(&["gloves", "socks"]), &catalog, &mut ledger, &engine);
        assert_eq!(run.total_revenue, 0.0);
        assert_eq!(ledger.total_spent(), 0.0);
        assert_eq!(run.winner_sequence(), vec![None, None]);
    }
}
