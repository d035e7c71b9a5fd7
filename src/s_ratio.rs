use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::engine::AllocationEngine;
use crate::evaluator::{CompetitiveRatioEvaluator, TRIALS};
use crate::generator::{generate_catalog, generate_queries, GeneratorParams};
use crate::ledger::BudgetLedger;
use crate::logger::{LogEvent, Logger};
use crate::logln;
use crate::policy::PolicyKind;
use crate::simulation::SimulationRun;

// Register this scenario in the catalog
inventory::submit!(crate::scenarios::ScenarioEntry {
    short_name: "ratio",
    description: "Competitive ratios of all three policies on a synthetic workload stay within [0, 1], evaluations reproduce under the same seed, and pass revenue equals total ledger spend",
    run,
});

const CATALOG_SEED: u64 = 1234;
const EVAL_SEED: u64 = 5678;

pub fn run(scenario_name: &str, logger: &mut Logger) -> Result<(), Box<dyn std::error::Error>> {
    let params = GeneratorParams::default();
    let mut catalog_rng = StdRng::seed_from_u64(CATALOG_SEED);
    let catalog = generate_catalog(&params, &mut catalog_rng);
    let queries = generate_queries(500, params.num_keywords, &mut catalog_rng);

    logln!(
        logger,
        LogEvent::Scenario,
        "\nSynthetic workload: {} advertisers, optimum {:.2}, {} queries",
        catalog.num_advertisers(),
        catalog.optimum(),
        queries.len()
    );

    let mut errors = Vec::new();

    for kind in PolicyKind::all() {
        let mut rng = StdRng::seed_from_u64(EVAL_SEED);
        let evaluation =
            CompetitiveRatioEvaluator::evaluate(kind, &queries, &catalog, TRIALS, &mut rng);

        logln!(
            logger,
            LogEvent::Scenario,
            "{}: base order revenue {:.2}, shuffled {:.2}, ratio {:.2}",
            kind.name(),
            evaluation.base_order_revenue,
            evaluation.shuffled_revenue,
            evaluation.competitive_ratio
        );

        // Check: ratio bounded by the offline optimum
        if evaluation.competitive_ratio >= 0.0 && evaluation.competitive_ratio <= 1.0 {
            logln!(logger, LogEvent::Scenario, "✓ {} ratio is within [0, 1]", kind.name());
        } else {
            errors.push(format!(
                "Expected {} ratio within [0, 1], got {:.2}",
                kind.name(),
                evaluation.competitive_ratio
            ));
        }

        // Check: re-running with the same seed reproduces the evaluation
        let mut rng_again = StdRng::seed_from_u64(EVAL_SEED);
        let repeat =
            CompetitiveRatioEvaluator::evaluate(kind, &queries, &catalog, TRIALS, &mut rng_again);
        if repeat.average_revenue == evaluation.average_revenue
            && repeat.shuffled_revenue == evaluation.shuffled_revenue
        {
            logln!(logger, LogEvent::Scenario, "✓ {} evaluation reproduces under the same seed", kind.name());
        } else {
            errors.push(format!(
                "Expected {} evaluation to reproduce under seed {}, got averages {:.4} vs {:.4}",
                kind.name(),
                EVAL_SEED,
                evaluation.average_revenue,
                repeat.average_revenue
            ));
        }

        // Check: revenue identity on a single pass
        let engine = AllocationEngine::new(kind.create_policy());
        let mut ledger = BudgetLedger::new(&catalog);
        let pass = SimulationRun::new(&queries, &catalog, &mut ledger, &engine);
        if (pass.total_revenue - crate::utils::round2(ledger.total_spent())).abs() < 1e-9 {
            logln!(logger, LogEvent::Scenario, "✓ {} pass revenue equals total ledger spend", kind.name());
        } else {
            errors.push(format!(
                "Expected {} pass revenue {:.4} to equal total spend {:.4}",
                kind.name(),
                pass.total_revenue,
                ledger.total_spent()
            ));
        }
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
