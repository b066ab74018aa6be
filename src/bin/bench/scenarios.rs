// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Party Loot Engine - Bench Scenarios

use party_loot::PolicyKind;

// ─── Scenario Configuration ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    /// Single-unit drops under RoundRobin; holdings must stay within one.
    RoundRobin,
    /// Drops under PersonalLoot; yield checked against the binomial model.
    PersonalLoot,
    /// Contested drops with random votes, some left to expire.
    NeedGreed,
    /// Random two-party trades, some of them overdrawn.
    Trading,
}

impl Workload {
    pub fn policy(&self) -> PolicyKind {
        match self {
            Self::RoundRobin => PolicyKind::RoundRobin,
            Self::PersonalLoot => PolicyKind::PersonalLoot,
            Self::NeedGreed => PolicyKind::NeedGreed,
            Self::Trading => PolicyKind::FreeForAll,
        }
    }
}

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub party_size: usize,
    /// Drops for loot workloads, trade attempts for `Trading`.
    pub operations: u32,
    pub workload: Workload,
    pub criteria: PassCriteria,
}

pub struct PassCriteria {
    pub max_spread: Option<u64>,
    /// Allowed absolute error of mean grants per drop against its expectation.
    pub yield_tolerance: Option<f64>,
    /// Allowed absolute error of the zero-grant rate against its expectation.
    pub zero_rate_tolerance: Option<f64>,
    /// Chance that one eligible member never votes.
    pub abstain_probability: f64,
}

impl Default for PassCriteria {
    fn default() -> Self {
        Self {
            max_spread: None,
            yield_tolerance: None,
            zero_rate_tolerance: None,
            abstain_probability: 0.0,
        }
    }
}

/// Probability that no member wins a personal drop: (1 - 1/P)^P.
pub fn expected_zero_rate(party_size: usize) -> f64 {
    if party_size == 0 {
        return 1.0;
    }
    let p = party_size as f64;
    (1.0 - 1.0 / p).powf(p)
}

// ─── Scenario List ──────────────────────────────────────────────────────────

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "RR_FAIRNESS_3",
            label: "RoundRobin fairness (3 members)",
            category: "distribution",
            party_size: 3,
            operations: 100,
            workload: Workload::RoundRobin,
            criteria: PassCriteria { max_spread: Some(1), ..Default::default() },
        },
        Scenario {
            name: "RR_FAIRNESS_7",
            label: "RoundRobin fairness (7 members)",
            category: "distribution",
            party_size: 7,
            operations: 250,
            workload: Workload::RoundRobin,
            criteria: PassCriteria { max_spread: Some(1), ..Default::default() },
        },
        Scenario {
            name: "PERSONAL_YIELD_4",
            label: "PersonalLoot yield (4 members)",
            category: "distribution",
            party_size: 4,
            operations: 400,
            workload: Workload::PersonalLoot,
            criteria: PassCriteria {
                yield_tolerance: Some(0.25),
                zero_rate_tolerance: Some(0.12),
                ..Default::default()
            },
        },
        Scenario {
            name: "PERSONAL_YIELD_10",
            label: "PersonalLoot yield (10 members)",
            category: "distribution",
            party_size: 10,
            operations: 400,
            workload: Workload::PersonalLoot,
            criteria: PassCriteria {
                yield_tolerance: Some(0.25),
                zero_rate_tolerance: Some(0.12),
                ..Default::default()
            },
        },
        Scenario {
            name: "NEED_PRIORITY_5",
            label: "Need-before-Greed priority (5 members)",
            category: "rolls",
            party_size: 5,
            operations: 200,
            workload: Workload::NeedGreed,
            criteria: PassCriteria { abstain_probability: 0.2, ..Default::default() },
        },
        Scenario {
            name: "TRADE_CONSERVATION_4",
            label: "Trade conservation (4 members)",
            category: "trades",
            party_size: 4,
            operations: 200,
            workload: Workload::Trading,
            criteria: PassCriteria::default(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_matches_closed_form() {
        assert!((expected_zero_rate(4) - 0.31640625).abs() < 1e-9);
        assert_eq!(expected_zero_rate(1), 0.0);
    }

    #[test]
    fn scenario_names_are_unique() {
        let all = scenarios();
        let mut names: Vec<_> = all.iter().map(|s| s.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), all.len());
    }
}
