mod catalog;
mod charts;
mod engine;
mod evaluator;
mod generator;
mod ledger;
mod loader;
mod logger;
mod policy;
mod scenarios;
mod simulation;
mod types;
mod utils;

// Include scenario files so their constructors run
mod s_damping;
mod s_ratio;
mod s_tiebreak;

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;

use engine::AllocationEngine;
use evaluator::{CompetitiveRatioEvaluator, TRIALS};
use ledger::BudgetLedger;
use logger::{sanitize_filename, ConsoleReceiver, FileReceiver, LogEvent, Logger};
use policy::PolicyKind;
use scenarios::get_scenario_catalog;
use simulation::{SimulationRun, SimulationStat};

const DEFAULT_DATASET: &str = "bidder_dataset.csv";
const DEFAULT_QUERIES: &str = "queries.txt";
const DEFAULT_SEED: u64 = 0;

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  admatch <greedy|balance|msvv> [dataset.csv] [queries.txt] [--seed N] [--verbose pass]");
    eprintln!("  admatch scenarios [name|all] [iterations]");
    eprintln!("  admatch charts");
    eprintln!();
    eprintln!("Please select one amongst greedy, msvv and balance");
}

fn main() {
    let raw_args: Vec<String> = std::env::args().collect();

    // Parse and filter out --seed and --verbose arguments
    let mut seed = DEFAULT_SEED;
    let mut verbose_pass = false;
    let mut args = Vec::new();
    let mut skip_next = false;
    for (i, arg) in raw_args.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--seed" {
            match raw_args.get(i + 1).map(|s| s.parse::<u64>()) {
                Some(Ok(n)) => {
                    seed = n;
                    skip_next = true;
                }
                _ => {
                    eprintln!("Error: --seed expects a number.");
                    std::process::exit(1);
                }
            }
            continue;
        }
        if arg == "--verbose" {
            if raw_args.get(i + 1).map(String::as_str) == Some("pass") {
                verbose_pass = true;
                skip_next = true;
            }
            continue;
        }
        args.push(arg.clone());
    }

    if args.len() < 2 {
        print_usage();
        return;
    }

    // Check if "charts" argument is provided
    if args[1] == "charts" {
        match charts::generate_revenue_histograms() {
            Ok(()) => {
                println!("All histogram generation completed successfully.");
            }
            Err(e) => {
                eprintln!("Error generating histograms: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // Check if "scenarios" argument is provided
    if args[1] == "scenarios" {
        run_scenarios(&args[2..]);
        return;
    }

    // Otherwise the first argument selects the allocation policy
    let kind = match PolicyKind::from_name(&args[1]) {
        Some(kind) => kind,
        None => {
            print_usage();
            return;
        }
    };

    let dataset_path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET));
    let queries_path = args
        .get(3)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_QUERIES));

    run_evaluation(kind, &dataset_path, &queries_path, seed, verbose_pass);
}

/// Load the workload, evaluate the chosen policy, and report revenues and
/// the competitive ratio
fn run_evaluation(
    kind: PolicyKind,
    dataset_path: &Path,
    queries_path: &Path,
    seed: u64,
    verbose_pass: bool,
) {
    let catalog = match loader::load_catalog(dataset_path) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Error loading dataset: {}", e);
            std::process::exit(1);
        }
    };
    let queries = match loader::load_queries(queries_path) {
        Ok(queries) => queries,
        Err(e) => {
            eprintln!("Error loading queries: {}", e);
            std::process::exit(1);
        }
    };

    let mut logger = Logger::new();
    let mut console_events = vec![LogEvent::Evaluation];
    if verbose_pass {
        console_events.push(LogEvent::Pass);
    }
    logger.add_receiver(ConsoleReceiver::new(console_events));

    if verbose_pass {
        // Detail one pass over the file order before the evaluation
        let engine = AllocationEngine::new(kind.create_policy());
        let mut ledger = BudgetLedger::new(&catalog);
        let run = SimulationRun::new(&queries, &catalog, &mut ledger, &engine);
        logln!(
            &mut logger,
            LogEvent::Pass,
            "One {} pass in file order:",
            engine.policy_name()
        );
        SimulationStat::new(&catalog, &run).printout(&mut logger, LogEvent::Pass);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let evaluation =
        CompetitiveRatioEvaluator::evaluate(kind, &queries, &catalog, TRIALS, &mut rng);

    logln!(
        &mut logger,
        LogEvent::Evaluation,
        "Revenue for {} algorithm (file order) is {:.2}",
        kind.name(),
        evaluation.base_order_revenue
    );
    logln!(
        &mut logger,
        LogEvent::Evaluation,
        "Revenue for {} algorithm (shuffled) is {:.2}",
        kind.name(),
        evaluation.shuffled_revenue
    );
    logln!(
        &mut logger,
        LogEvent::Evaluation,
        "Competitive ratio for {} algorithm is {:.2}",
        kind.name(),
        evaluation.competitive_ratio
    );
}

/// Run one named scenario or the whole catalog, each possibly repeated
fn run_scenarios(args: &[String]) {
    let scenario_arg = args.first().map(String::as_str).unwrap_or("all");

    let iterations = match args.get(1) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(n) => n,
            Err(_) => {
                eprintln!(
                    "Error: Invalid iterations parameter '{}'. Expected a number.",
                    raw
                );
                std::process::exit(1);
            }
        },
        None => 1,
    };

    let all_scenarios = get_scenario_catalog();

    // Filter scenarios: if "all", use all scenarios; otherwise filter to the named scenario
    let selected: Vec<_> = if scenario_arg == "all" {
        all_scenarios.clone()
    } else {
        match all_scenarios.iter().find(|s| s.short_name == scenario_arg) {
            Some(scenario) => vec![scenario.clone()],
            None => {
                eprintln!("Error: Scenario '{}' not found.", scenario_arg);
                eprintln!("Available scenarios:");
                for s in &all_scenarios {
                    eprintln!("  - {}", s.short_name);
                }
                std::process::exit(1);
            }
        }
    };

    // Console gets validation output; a specific scenario also shows its details
    let mut logger = Logger::new();
    if scenario_arg == "all" {
        logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Validation]));
    } else {
        logger.add_receiver(ConsoleReceiver::new(vec![
            LogEvent::Validation,
            LogEvent::Scenario,
        ]));
    }

    let summary_receiver_id = logger.add_receiver(FileReceiver::new(
        &PathBuf::from("log/summary.log"),
        vec![LogEvent::Validation],
    ));

    if iterations > 1 {
        logln!(
            &mut logger,
            LogEvent::Validation,
            "Running '{}' {} times...\n",
            scenario_arg,
            iterations
        );
    } else {
        logln!(&mut logger, LogEvent::Validation, "Running '{}'...\n", scenario_arg);
    }

    for scenario in &selected {
        log!(&mut logger, LogEvent::Validation, "{}: ", scenario.short_name);

        let scenario_receiver_id = logger.add_receiver(FileReceiver::new(
            &PathBuf::from(format!(
                "log/{}/scenario.log",
                sanitize_filename(scenario.short_name)
            )),
            vec![LogEvent::Scenario],
        ));

        for i in 0..iterations {
            if iterations > 1 {
                log!(&mut logger, LogEvent::Validation, "[{}/{}] ", i + 1, iterations);
            }

            match (scenario.run)(scenario.short_name, &mut logger) {
                Ok(()) => {
                    if iterations > 1 {
                        logln!(&mut logger, LogEvent::Validation, "✓");
                    } else {
                        logln!(&mut logger, LogEvent::Validation, "✓ PASSED");
                    }
                }
                Err(e) => {
                    if iterations > 1 {
                        logln!(&mut logger, LogEvent::Validation, "✗");
                    } else {
                        logln!(&mut logger, LogEvent::Validation, "✗ FAILED: {}", e);
                    }
                }
            }

            let _ = logger.flush();
        }

        logger.remove_receiver(scenario_receiver_id);
    }

    logger.remove_receiver(summary_receiver_id);
}
