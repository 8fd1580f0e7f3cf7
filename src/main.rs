//! colorforge: group the colors of a palette file into a few representatives
//!
//! This is the main entrypoint that orchestrates token loading, grouping,
//! quality reporting and writing the JSON report.

use std::io;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use colorforge::engine::rng_for;
use colorforge::{assess, group_parsed, load_color_tokens, parse_unique, write_report, Args};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if args.verbose {
        println!("colorforge - Color grouping");
        println!("===========================\n");
    }

    run_pipeline(&args)
}

/// Run the full grouping pipeline
fn run_pipeline(args: &Args) -> Result<()> {
    let start_time = Instant::now();
    let config = args.to_config()?;

    // Step 1: Load and parse colors
    if args.verbose {
        println!("Step 1: Loading colors");
        println!("  Input file: {}", args.input.display());
    }

    let load_start = Instant::now();
    let tokens = load_color_tokens(&args.input)?;
    let colors = parse_unique(&tokens)
        .with_context(|| format!("Failed to parse colors from {}", args.input.display()))?;
    let load_time = load_start.elapsed();

    println!(
        "✓ Colors loaded: {} tokens, {} unique",
        tokens.len(),
        colors.len()
    );
    if args.verbose {
        println!("  Loading time: {:.2}s", load_time.as_secs_f64());
    }

    // Step 2: Group
    if args.verbose {
        println!("\nStep 2: Grouping colors");
        println!("  Algorithm: {}", config.algorithm);
        println!("  Metric: {}", config.effective_metric());
        if let Some(k) = config.group_count {
            println!("  Number of groups: {}", k);
        }
        if config.algorithm.is_centroid_based() {
            println!("  Max iterations: {}", config.effective_max_iterations());
        }
        if let Some(proximity) = config.proximity {
            println!("  Proximity: {}", proximity);
        }
        println!("  Representative: {}", config.representative);
    }

    let group_start = Instant::now();
    let mut rng = rng_for(&config);
    let report = group_parsed(&colors, &config, &mut rng).context("Grouping failed")?;
    let group_time = group_start.elapsed();

    println!("✓ Grouped into {} groups", report.len());
    if let Some(convergence) = report.convergence() {
        if convergence.did_converge {
            println!("  Converged after {} iterations", convergence.iterations);
        } else {
            println!(
                "  Stopped at the iteration cap ({}) without converging",
                convergence.iterations
            );
        }
    }
    if args.verbose {
        println!("  Grouping time: {:.2}s", group_time.as_secs_f64());
    }

    // Step 3: Print group statistics
    println!("\n=== Group Statistics ===");
    let total = report.member_count();
    for (i, group) in report.groups().iter().enumerate() {
        let percentage = (group.members.len() as f64 / total as f64) * 100.0;
        println!(
            "Group {}: {} <- {} colors ({:.1}%)",
            i,
            group.representative.hex(),
            group.members.len(),
            percentage
        );
    }

    if report.len() > 1 {
        let quality = assess(&report, config.effective_metric(), 100);
        println!("\nSilhouette score (sample): {:.3}", quality.silhouette);
        println!("Within-group sum of squares: {:.2}", quality.inertia);
    }

    // Step 4: Write the report
    write_report(&report, &args.output)?;

    let total_time = start_time.elapsed();
    println!("\n=== Grouping Complete ===");
    println!("Total processing time: {:.2}s", total_time.as_secs_f64());
    println!("Report saved to: {}", args.output.display());

    Ok(())
}
