// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Party Loot Engine - Bench Report Types

use serde::Serialize;

// ─── Statistics (per-metric Monte Carlo aggregation) ────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, ci_lower: 0.0, ci_upper: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std_dev = variance.sqrt();
        let stderr = std_dev / (n as f64).sqrt();
        let z = 1.96; // 95% CI
        Self {
            mean,
            std_dev,
            ci_lower: mean - z * stderr,
            ci_upper: mean + z * stderr,
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct BenchResult {
    pub scenario: String,
    pub seed: u64,
    pub pass: bool,
    /// Drops distributed, or trades attempted for trade workloads.
    pub operations: u32,
    pub grants: u32,
    pub grants_per_operation: f64,
    pub zero_grant_rate: f64,
    /// Max minus min items held across the party.
    pub spread: u64,
    pub expired_rolls: u32,
    pub completed_trades: u32,
    pub aborted_trades: u32,
    pub violations: u32,
    pub ticks: u64,
    pub elapsed_ms: u128,
}

// ─── Monte Carlo Report (per-scenario aggregation) ──────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    pub scenario_name: String,
    pub label: String,
    pub category: String,
    pub n_runs: usize,
    pub pass_rate: f64,
    pub grants_per_operation: Stats,
    pub zero_grant_rate: Stats,
    pub spread: Stats,
    pub violations: Stats,
    pub elapsed_ms: Stats,
    pub individual_runs: Vec<BenchResult>,
}

impl MonteCarloReport {
    pub fn passes(&self) -> bool {
        self.pass_rate >= PASS_THRESHOLD
    }
}

/// Share of runs that must pass for a scenario to pass.
pub const PASS_THRESHOLD: f64 = 0.933;

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub n_runs_per_scenario: usize,
    pub base_seed: u64,
    pub summary: Summary,
    pub scenarios: Vec<MonteCarloReport>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_of_constant_samples_have_no_spread() {
        let stats = Stats::from_samples(&[2.0, 2.0, 2.0]);
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.min, stats.max);
    }

    #[test]
    fn empty_samples_are_zeroed() {
        assert_eq!(Stats::from_samples(&[]).n, 0);
    }
}
