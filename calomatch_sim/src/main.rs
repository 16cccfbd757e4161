//! calomatch Simulator CLI
//!
//! Run an association strategy over generated events and score it against truth.

use calomatch_core::{Strategy, StrategyKind};
use calomatch_sim::scenarios::ScenarioId;
use calomatch_sim::{ScenarioResult, ScenarioRunner, SimError, SimExport};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// calomatch track-cluster association simulator
#[derive(Parser, Debug)]
#[command(name = "calomatch-sim")]
#[command(about = "Run track-cluster association strategies on simulated events", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (isolated, split_showers, crowded, truth_loss, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Strategy to run (truth, force_split)
    #[arg(short = 'a', long, default_value = "truth")]
    strategy: String,

    /// TOML settings file for the strategy
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Number of consecutive seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export the resolved event to a JSON file
    #[arg(long)]
    export: Option<String>,
}

fn exit_with(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn load_strategy(args: &Args) -> Result<Strategy, SimError> {
    let kind: StrategyKind = args.strategy.parse()?;
    let settings = match &args.settings {
        Some(path) => std::fs::read_to_string(path)?,
        None => String::new(),
    };
    Ok(Strategy::from_settings(kind, &settings)?)
}

fn log_result(result: &ScenarioResult) {
    if result.passed {
        info!(
            "✓ {} (seed={}) PASSED | efficiency={:.3} purity={:.3}",
            result.scenario.name(),
            result.seed,
            result.metrics.efficiency,
            result.metrics.purity
        );
    } else {
        error!(
            "✗ {} (seed={}) FAILED: {}",
            result.scenario.name(),
            result.seed,
            result.failure_reason.as_deref().unwrap_or("unknown")
        );
    }
}

fn main() {
    let args = Args::parse();

    // Initialize logging; RUST_LOG overrides the verbosity flag
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if !args.json {
        info!("calomatch Simulator v0.1.0");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            eprintln!("Available scenarios: isolated, split_showers, crowded, truth_loss, all");
            std::process::exit(1);
        })]
    };

    let strategy = load_strategy(&args).unwrap_or_else(|e| exit_with(e));

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    } else {
        args.seed
    };

    // Handle --export mode
    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 {
            exit_with("--export only supports a single scenario, not 'all'");
        }

        let runner = ScenarioRunner::new(base_seed, strategy);
        let (result, sim) = runner
            .run_detailed(scenarios[0])
            .unwrap_or_else(|e| exit_with(e));
        log_result(&result);

        let written = SimExport::from_event(&result, &sim)
            .and_then(|export| export.write_to_file(export_path));
        match written {
            Ok(()) => info!("Exported {} to {}", scenarios[0].name(), export_path),
            Err(e) => {
                error!("Failed to write export: {}", e);
                std::process::exit(1);
            }
        }

        if !result.passed {
            std::process::exit(1);
        }
        return;
    }

    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        let runner = ScenarioRunner::new(seed, strategy.clone());

        for scenario in &scenarios {
            let result = runner.run(*scenario);

            if !args.json {
                log_result(&result);
            }

            if !result.passed {
                failed_count += 1;
            }

            all_results.push(result);
        }
    }

    let total = all_results.len();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "strategy": strategy.kind().name(),
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "summary": r.summary,
                    "metrics": r.metrics,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => exit_with(e),
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);
            for result in all_results.iter().filter(|r| !r.passed) {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    if failed_count > 0 {
        std::process::exit(1);
    }
}
