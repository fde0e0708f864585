//! Example: Simulate a multi-interval experiment and analyze it
//!
//! Usage:
//!   cargo run --release --example simulate_lifetimes -- [t_on] [c_bleach] [n_boot]

use bondtime::report::format::format_value_with_uncertainty;
use bondtime::simulation::simulate_dataset;
use bondtime::{analyze_lifetimes, AnalysisConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let t_on: f64 = args.first().map(|s| s.parse()).transpose()?.unwrap_or(2.0);
    let c_bleach: f64 = args.get(1).map(|s| s.parse()).transpose()?.unwrap_or(100.0);
    let n_boot: usize = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(0);

    let intervals = [0.01, 0.02, 0.04, 0.08, 0.16];
    let mut rng = StdRng::seed_from_u64(2024);
    let set = simulate_dataset(&intervals, 1000, t_on, c_bleach, 100_000, &mut rng);

    let config = AnalysisConfig {
        n_boot,
        random_seed: Some(1),
        ..Default::default()
    };
    let analysis = analyze_lifetimes(&set, &config)?;

    println!("interval [s]  apparent lifetime [s]  tracks");
    for row in analysis.apparent_lifetimes.rows() {
        let err = row.lifetime_app_err.unwrap_or(f64::NAN);
        println!(
            "{:>12}  {:>21}  {:>6}",
            row.interval,
            format_value_with_uncertainty(row.lifetime_app, err, 2, true),
            row.track_count
        );
    }

    let fit = &analysis.lifetime;
    println!(
        "\nBound lifetime: {} s (true {})",
        format_value_with_uncertainty(fit.lifetime, fit.lifetime_err.unwrap_or(f64::NAN), 2, true),
        t_on
    );
    println!(
        "Bleaching constant: {} (true {})",
        format_value_with_uncertainty(fit.bleach, fit.bleach_err.unwrap_or(f64::NAN), 2, true),
        c_bleach
    );
    for w in &analysis.metadata.warnings {
        println!("Warning: {}", w);
    }
    println!("Processing time: {:.1} ms", analysis.metadata.processing_time_ms);

    Ok(())
}
