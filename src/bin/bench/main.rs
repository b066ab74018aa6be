// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Party Loot Engine - Monte Carlo Bench
//
// Usage:
//   cargo run --release --bin bench                        # All scenarios (30 runs each)
//   cargo run --release --bin bench -- --runs 5            # Quick mode
//   cargo run --release --bin bench -- PERSONAL            # Filter by name, label or category
//   cargo run --release --bin bench -- --seed 42           # Custom base seed
//   cargo run --release --bin bench -- --config cfg.json   # Session config overrides
//   cargo run --release --bin bench -- --json out.json     # Write the full report

mod report;
mod scenarios;
mod monte_carlo;

use party_loot::SessionConfig;
use report::*;
use scenarios::*;
use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    runs: usize,
    seed: u64,
    filter: Option<String>,
    json: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs {
        runs: 30,
        seed: 0,
        filter: None,
        json: None,
        config: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--runs" => {
                i += 1;
                if i < args.len() {
                    cli.runs = args[i].parse().unwrap_or(30);
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    cli.seed = args[i].parse().unwrap_or(0);
                }
            }
            "--json" => {
                i += 1;
                cli.json = args.get(i).map(PathBuf::from);
            }
            "--config" => {
                i += 1;
                cli.config = args.get(i).map(PathBuf::from);
            }
            arg if !arg.starts_with('-') => {
                cli.filter = Some(arg.to_string());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    cli
}

fn load_config(path: Option<&PathBuf>) -> Result<SessionConfig, String> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let raw = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    SessionConfig::from_json(&raw).map_err(|e| format!("{}: {e}", path.display()))
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,party_loot=error"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();

    let cli = parse_args();
    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load session config: {e}");
            std::process::exit(2);
        }
    };

    let all_scenarios = scenarios();
    let to_run: Vec<&Scenario> = match &cli.filter {
        Some(f) => {
            let f_lower = f.to_lowercase();
            all_scenarios.iter()
                .filter(|s| s.name.to_lowercase().contains(&f_lower)
                          || s.label.to_lowercase().contains(&f_lower)
                          || s.category.to_lowercase().contains(&f_lower))
                .collect()
        }
        None => all_scenarios.iter().collect(),
    };

    if to_run.is_empty() {
        eprintln!("No scenarios match filter: {:?}", cli.filter);
        std::process::exit(1);
    }

    println!("\n  Party Loot Bench");
    println!("  PRNG: ChaCha8Rng | Runs/scenario: {} | Base seed: {}", cli.runs, cli.seed);
    println!("  Running {} scenario(s)...\n", to_run.len());
    println!("  {:<40} {:>5} {:>12} {:>8} {:>7} {:>6} {:>7}",
        "Scenario", "Pass%", "Grants/op", "Zero%", "Spread", "Viol", "Time");
    println!("  {}", "-".repeat(92));

    let suite_start = Instant::now();
    let mut mc_reports = Vec::new();

    for scenario in &to_run {
        let report = monte_carlo::run_monte_carlo(scenario, &config, cli.runs, cli.seed);

        let grants = &report.grants_per_operation;
        let grants_ci = (grants.ci_upper - grants.ci_lower) / 2.0;
        let status = if report.passes() { "PASS" } else { "FAIL" };

        println!("  {:<40} {:>4}% {:>7.3}±{:<4.3} {:>7.1}% {:>7.0} {:>6.0} {:>5.0}ms  {}",
            report.label,
            (report.pass_rate * 100.0) as u32,
            grants.mean, grants_ci,
            report.zero_grant_rate.mean * 100.0,
            report.spread.max,
            report.violations.max,
            report.elapsed_ms.mean,
            status,
        );

        mc_reports.push(report);
    }

    let suite_elapsed = suite_start.elapsed();

    // ─── Summary ────────────────────────────────────────────────────────

    let total = mc_reports.len();
    let passed = mc_reports.iter().filter(|r| r.passes()).count();
    let failed = total - passed;

    println!("  {}", "-".repeat(92));
    println!("  Total: {}  Passed: {}  Failed: {}  Suite time: {:.1}s\n",
        total, passed, failed, suite_elapsed.as_secs_f64());

    // ─── Write JSON Report ──────────────────────────────────────────────

    if let Some(path) = &cli.json {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0)
            .to_string();
        let report = BenchReport {
            timestamp,
            version: env!("CARGO_PKG_VERSION"),
            prng: "ChaCha8Rng",
            n_runs_per_scenario: cli.runs,
            base_seed: cli.seed,
            summary: Summary {
                total,
                passed,
                failed,
                pass_rate: passed as f64 / total as f64,
            },
            scenarios: mc_reports,
        };
        let written = serde_json::to_string_pretty(&report)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => println!("  Results saved to: {}\n", path.display()),
            Err(e) => {
                eprintln!("Failed to write {}: {e}", path.display());
                std::process::exit(2);
            }
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
}
