use std::collections::BTreeMap;

use crate::catalog::BidCatalog;
use crate::engine::AllocationEngine;
use crate::ledger::BudgetLedger;
use crate::logger::{LogEvent, Logger};
use crate::logln;
use crate::policy::PolicyKind;
use crate::simulation::{SimulationRun, SimulationStat};
use crate::types::Bid;

// Register this scenario in the catalog
inventory::submit!(crate::scenarios::ScenarioEntry {
    short_name: "tiebreak",
    description: "Greedy takes the highest bid while balance ties on full budgets and falls back to the smallest advertiser id; the winner must not depend on dataset row order",
    run,
});

/// Two advertisers with budget 10 each, both bidding on keyword "k":
/// advertiser 1 bids 5, advertiser 2 bids 6
fn fixture(rows_reversed: bool) -> BidCatalog {
    let budgets = BTreeMap::from([(1, 10.0), (2, 10.0)]);
    let mut bids = vec![
        Bid {
            advertiser: 1,
            keyword: "k".to_string(),
            value: 5.0,
        },
        Bid {
            advertiser: 2,
            keyword: "k".to_string(),
            value: 6.0,
        },
    ];
    if rows_reversed {
        bids.reverse();
    }
    BidCatalog::new(budgets, bids).unwrap()
}

fn run_pass(kind: PolicyKind, catalog: &BidCatalog, logger: &mut Logger) -> SimulationRun {
    let engine = AllocationEngine::new(kind.create_policy());
    let mut ledger = BudgetLedger::new(catalog);
    let run = SimulationRun::new(&["k".to_string()], catalog, &mut ledger, &engine);

    let stat = SimulationStat::new(catalog, &run);
    logln!(logger, LogEvent::Scenario, "\n=== {} on one 'k' query ===", kind.name());
    stat.printout(logger, LogEvent::Scenario);
    run
}

pub fn run(scenario_name: &str, logger: &mut Logger) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = fixture(false);

    let greedy_run = run_pass(PolicyKind::Greedy, &catalog, logger);
    let balance_run = run_pass(PolicyKind::Balance, &catalog, logger);

    logln!(logger, LogEvent::Scenario, "");

    let mut errors = Vec::new();

    // Check: greedy takes advertiser 2's bid of 6
    if greedy_run.winner_sequence() == vec![Some(2)] && greedy_run.total_revenue == 6.0 {
        logln!(logger, LogEvent::Scenario, "✓ Greedy picked advertiser 2 for revenue 6.00");
    } else {
        errors.push(format!(
            "Expected greedy to pick advertiser 2 for revenue 6.00, got {:?} for {:.2}",
            greedy_run.winner_sequence(),
            greedy_run.total_revenue
        ));
    }

    // Check: balance ties on remaining budget and takes advertiser 1's bid of 5
    if balance_run.winner_sequence() == vec![Some(1)] && balance_run.total_revenue == 5.0 {
        logln!(logger, LogEvent::Scenario, "✓ Balance tie-break picked advertiser 1 for revenue 5.00");
    } else {
        errors.push(format!(
            "Expected balance to pick advertiser 1 for revenue 5.00, got {:?} for {:.2}",
            balance_run.winner_sequence(),
            balance_run.total_revenue
        ));
    }

    // Check: the same outcomes with the dataset rows in reverse order
    let reversed = fixture(true);
    let greedy_reversed = run_pass(PolicyKind::Greedy, &reversed, logger);
    let balance_reversed = run_pass(PolicyKind::Balance, &reversed, logger);
    if greedy_reversed.winner_sequence() == greedy_run.winner_sequence()
        && balance_reversed.winner_sequence() == balance_run.winner_sequence()
    {
        logln!(logger, LogEvent::Scenario, "✓ Winners are independent of dataset row order");
    } else {
        errors.push(format!(
            "Expected identical winners on reversed rows, got greedy {:?} and balance {:?}",
            greedy_reversed.winner_sequence(),
            balance_reversed.winner_sequence()
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "Scenario '{}' validation failed:\n{}",
            scenario_name,
            errors.join("\n")
        )
        .into())
    }
}
