use plotters::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::engine::AllocationEngine;
use crate::evaluator::TRIALS;
use crate::generator::{generate_catalog, generate_queries, GeneratorParams};
use crate::ledger::BudgetLedger;
use crate::policy::PolicyKind;
use crate::simulation::SimulationRun;

/// Render per-policy histograms of trial revenues on a synthetic workload
///
/// Generates one seeded synthetic catalog and query stream, runs the usual
/// number of shuffled trials per policy, buckets the pass revenues into a
/// histogram, and writes one PNG per policy.
pub fn generate_revenue_histograms() -> Result<(), Box<dyn std::error::Error>> {
    let params = GeneratorParams::default();
    let mut rng = StdRng::seed_from_u64(42);
    let catalog = generate_catalog(&params, &mut rng);
    let queries = generate_queries(500, params.num_keywords, &mut rng);

    for kind in PolicyKind::all() {
        let engine = AllocationEngine::new(kind.create_policy());
        let mut ledger = BudgetLedger::new(&catalog);

        // Collect one pass revenue per shuffled trial
        let mut revenues = Vec::with_capacity(TRIALS);
        let mut shuffled = queries.clone();
        for _ in 0..TRIALS {
            shuffled.shuffle(&mut rng);
            revenues
                .push(SimulationRun::new(&shuffled, &catalog, &mut ledger, &engine).total_revenue);
        }

        let filename = format!("revenue_{}.png", kind.name());
        render_histogram(&filename, kind.name(), &revenues)?;
        println!("Histogram saved to {}", filename);
    }

    Ok(())
}

/// Bucket the revenues and render them as a bar chart
fn render_histogram(
    filename: &str,
    policy_name: &str,
    revenues: &[f64],
) -> Result<(), Box<dyn std::error::Error>> {
    let min_revenue = revenues.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max_revenue = revenues.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

    // All trials identical: widen the range so the axes stay valid
    let (min_revenue, max_revenue) = if max_revenue > min_revenue {
        (min_revenue, max_revenue)
    } else {
        (min_revenue - 1.0, max_revenue + 1.0)
    };

    let num_buckets = 40;
    let bucket_width = (max_revenue - min_revenue) / num_buckets as f64;
    let mut histogram = vec![0u32; num_buckets];

    for &revenue in revenues {
        let bucket_index = ((revenue - min_revenue) / bucket_width) as usize;
        let bucket_index = bucket_index.min(num_buckets - 1); // Clamp to valid range
        histogram[bucket_index] += 1;
    }

    let max_count = *histogram.iter().max().unwrap_or(&1);

    let root = BitMapBackend::new(filename, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let caption = format!("Trial Revenue Histogram ({})", policy_name);
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 40).into_font())
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(min_revenue..max_revenue, 0u32..max_count)?;

    chart
        .configure_mesh()
        .x_desc("Pass Revenue")
        .y_desc("Trials")
        .draw()?;

    for (i, &count) in histogram.iter().enumerate() {
        if count > 0 {
            let bucket_start = min_revenue + (i as f64 * bucket_width);
            let bucket_end = min_revenue + ((i + 1) as f64 * bucket_width);

            chart.draw_series(std::iter::once(Rectangle::new(
                [(bucket_start, 0), (bucket_end, count)],
                BLUE.filled(),
            )))?;
        }
    }

    root.present()?;

    Ok(())
}
