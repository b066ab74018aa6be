// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Party Loot Engine - Monte Carlo Runner
//
// Each scenario runs N times with seeds base..base+N. The session RNG and the
// workload RNG are both ChaCha8Rng, derived from the same run seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use party_loot::*;

use crate::report::*;
use crate::scenarios::{expected_zero_rate, Scenario, Workload};

use std::time::Instant;

// Keeps the workload stream independent of the session's roll stream.
const WORKLOAD_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Default)]
struct Tally {
    grants: u32,
    zero_grant_ops: u32,
    spread: u64,
    expired_rolls: u32,
    completed_trades: u32,
    aborted_trades: u32,
    violations: u32,
}

/// Run a single scenario iteration with a specific seed.
pub fn run_single(scenario: &Scenario, base: &SessionConfig, seed: u64) -> BenchResult {
    let start = Instant::now();
    let config = SessionConfig { initial_policy: scenario.workload.policy(), ..base.clone() }.with_seed(seed);
    let members: Vec<ParticipantId> = (0..scenario.party_size)
        .map(|i| ParticipantId(format!("member-{i}")))
        .collect();
    let mut session = SessionCoordinator::new(config, MemoryHost::with_party(members.clone()));
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ WORKLOAD_SALT);

    let tally = match scenario.workload {
        Workload::RoundRobin => round_robin(scenario, &mut session, &members),
        Workload::PersonalLoot => personal_loot(scenario, &mut session),
        Workload::NeedGreed => need_greed(scenario, &mut session, &mut rng),
        Workload::Trading => trading(scenario, &mut session, &members, &mut rng),
    };

    let ops = scenario.operations.max(1) as f64;
    let grants_per_operation = tally.grants as f64 / ops;
    let zero_grant_rate = tally.zero_grant_ops as f64 / ops;

    let criteria = &scenario.criteria;
    let mut pass = tally.violations == 0;
    if let Some(max) = criteria.max_spread {
        pass &= tally.spread <= max;
    }
    if let Some(tol) = criteria.yield_tolerance {
        pass &= (grants_per_operation - 1.0).abs() <= tol;
    }
    if let Some(tol) = criteria.zero_rate_tolerance {
        pass &= (zero_grant_rate - expected_zero_rate(scenario.party_size)).abs() <= tol;
    }

    BenchResult {
        scenario: scenario.name.to_string(),
        seed,
        pass,
        operations: scenario.operations,
        grants: tally.grants,
        grants_per_operation,
        zero_grant_rate,
        spread: tally.spread,
        expired_rolls: tally.expired_rolls,
        completed_trades: tally.completed_trades,
        aborted_trades: tally.aborted_trades,
        violations: tally.violations,
        ticks: session.current_tick(),
        elapsed_ms: start.elapsed().as_millis(),
    }
}

// ─── Workloads ──────────────────────────────────────────────────────────────

fn round_robin(scenario: &Scenario, session: &mut SessionCoordinator<MemoryHost>, members: &[ParticipantId]) -> Tally {
    let mut tally = Tally::default();
    let ore = ItemId::from("ore");
    for _ in 0..scenario.operations {
        match session.distribute(LootDrop::new(ore.clone(), 1, Position::default())) {
            Ok(Distribution::Assigned { .. }) => tally.grants += 1,
            _ => tally.violations += 1,
        }
    }
    let held: Vec<usize> = members.iter().map(|m| session.host().owned_grants(m, &ore)).collect();
    let max = held.iter().copied().max().unwrap_or(0);
    let min = held.iter().copied().min().unwrap_or(0);
    tally.spread = (max - min) as u64;
    if session.history().len() != (scenario.operations as usize).min(session.config().history_capacity) {
        tally.violations += 1;
    }
    tally
}

fn personal_loot(scenario: &Scenario, session: &mut SessionCoordinator<MemoryHost>) -> Tally {
    let mut tally = Tally::default();
    for _ in 0..scenario.operations {
        match session.distribute(LootDrop::new("trinket", 1, Position::default())) {
            Ok(Distribution::Personal { grants }) => {
                if grants.is_empty() {
                    tally.zero_grant_ops += 1;
                }
                tally.grants += grants.len() as u32;
            }
            _ => tally.violations += 1,
        }
    }
    tally
}

fn need_greed(scenario: &Scenario, session: &mut SessionCoordinator<MemoryHost>, rng: &mut ChaCha8Rng) -> Tally {
    let mut tally = Tally::default();
    let timeout = session.config().roll_timeout_ticks;

    for _ in 0..scenario.operations {
        let Ok(Distribution::Contested { session_id, eligible }) =
            session.distribute(LootDrop::new("blade", 1, Position::default()))
        else {
            tally.violations += 1;
            continue;
        };

        let abstainer = if rng.gen_bool(scenario.criteria.abstain_probability) {
            eligible.last().cloned()
        } else {
            None
        };

        let mut votes = Vec::with_capacity(eligible.len());
        let mut settlement = None;
        for member in &eligible {
            if abstainer.as_ref() == Some(member) {
                continue;
            }
            let kind = match rng.gen_range(0..3) {
                0 => VoteKind::Need,
                1 => VoteKind::Greed,
                _ => VoteKind::Pass,
            };
            match session.submit_vote(session_id, member, kind) {
                Ok(result) => {
                    votes.push(result.vote);
                    if result.settlement.is_some() {
                        settlement = result.settlement;
                    }
                }
                Err(_) => tally.violations += 1,
            }
        }

        if settlement.is_none() {
            tally.expired_rolls += 1;
            for _ in 0..=timeout {
                if let Some(resolved) = session.tick().resolved_rolls.into_iter().next() {
                    settlement = Some(resolved);
                    break;
                }
            }
        }

        let awarded = match &settlement {
            Some(RollSettlement::Awarded { recipient, .. }) => Some(recipient),
            Some(RollSettlement::Dropped { .. }) => None,
            None => {
                tally.violations += 1;
                continue;
            }
        };
        if awarded != expected_winner(&votes) {
            tally.violations += 1;
        }
        if awarded.is_some() {
            tally.grants += 1;
        } else {
            tally.zero_grant_ops += 1;
        }
        // A second resolution of the same session must be a no-op.
        if session.force_resolve(session_id).is_some() {
            tally.violations += 1;
        }
    }
    tally
}

/// Highest Need roll, else highest Greed roll; earliest vote breaks ties.
fn expected_winner(votes: &[Vote]) -> Option<&ParticipantId> {
    [VoteKind::Need, VoteKind::Greed].into_iter().find_map(|kind| {
        votes
            .iter()
            .filter(|v| v.kind == kind)
            .max_by(|a, b| a.roll.cmp(&b.roll).then(b.sequence.cmp(&a.sequence)))
            .map(|v| &v.participant)
    })
}

fn trading(
    scenario: &Scenario,
    session: &mut SessionCoordinator<MemoryHost>,
    members: &[ParticipantId],
    rng: &mut ChaCha8Rng,
) -> Tally {
    let mut tally = Tally::default();
    let gem = ItemId::from("gem");
    if members.len() < 2 {
        return tally;
    }
    for member in members {
        session.host_mut().credit_gold(member, 100);
        session.host_mut().credit(member, &gem, 10);
    }
    let gold_supply = session.host().total_gold();
    let gem_supply = session.host().total_items(&gem);

    for _ in 0..scenario.operations {
        let a = rng.gen_range(0..members.len());
        let mut b = rng.gen_range(0..members.len() - 1);
        if b >= a {
            b += 1;
        }
        let (initiator, target) = (&members[a], &members[b]);
        let gold = rng.gen_range(1..=150u64);
        let gems = rng.gen_range(1..=12u32);

        let Ok(trade_id) = open_trade(session, initiator, target, gold, &gem, gems) else {
            tally.violations += 1;
            continue;
        };

        if rng.gen_bool(0.1) {
            if session.cancel_trade(trade_id, target).is_err() {
                tally.violations += 1;
            }
        } else {
            let before = (session.host().wallet(initiator), session.host().wallet(target));
            match session.confirm_trade(trade_id, initiator) {
                Ok(ConfirmOutcome::Waiting) => {}
                _ => tally.violations += 1,
            }
            match session.confirm_trade(trade_id, target) {
                Ok(ConfirmOutcome::Completed(_)) => tally.completed_trades += 1,
                Ok(ConfirmOutcome::Aborted(TradeCancelReason::InsufficientAssets(_))) => {
                    tally.aborted_trades += 1;
                    let after = (session.host().wallet(initiator), session.host().wallet(target));
                    if before != after {
                        tally.violations += 1;
                    }
                }
                _ => tally.violations += 1,
            }
        }

        if session.open_trade_of(initiator).is_some() || session.open_trade_of(target).is_some() {
            tally.violations += 1;
        }
        if session.host().total_gold() != gold_supply || session.host().total_items(&gem) != gem_supply {
            tally.violations += 1;
        }
    }
    tally.grants = tally.completed_trades;
    tally
}

fn open_trade(
    session: &mut SessionCoordinator<MemoryHost>,
    initiator: &ParticipantId,
    target: &ParticipantId,
    gold: u64,
    gem: &ItemId,
    gems: u32,
) -> Result<TradeId, LootError> {
    let trade_id = session.initiate_trade(initiator, target)?;
    session.accept_trade(trade_id, target)?;
    session.stage_gold(trade_id, initiator, gold)?;
    session.stage_item(trade_id, target, gem.clone(), gems)?;
    Ok(trade_id)
}

// ─── Aggregation ────────────────────────────────────────────────────────────

/// Run Monte Carlo: N runs of a scenario, aggregate stats.
pub fn run_monte_carlo(scenario: &Scenario, config: &SessionConfig, n_runs: usize, base_seed: u64) -> MonteCarloReport {
    let results: Vec<BenchResult> = (0..n_runs)
        .map(|i| run_single(scenario, config, base_seed + i as u64))
        .collect();
    aggregate(scenario, results)
}

fn aggregate(scenario: &Scenario, results: Vec<BenchResult>) -> MonteCarloReport {
    let n = results.len();
    let passed = results.iter().filter(|r| r.pass).count();
    let pass_rate = if n == 0 { 0.0 } else { passed as f64 / n as f64 };

    let stat = |f: fn(&BenchResult) -> f64| Stats::from_samples(&results.iter().map(f).collect::<Vec<_>>());

    MonteCarloReport {
        scenario_name: scenario.name.to_string(),
        label: scenario.label.to_string(),
        category: scenario.category.to_string(),
        n_runs: n,
        pass_rate,
        grants_per_operation: stat(|r| r.grants_per_operation),
        zero_grant_rate: stat(|r| r.zero_grant_rate),
        spread: stat(|r| r.spread as f64),
        violations: stat(|r| r.violations as f64),
        elapsed_ms: stat(|r| r.elapsed_ms as f64),
        individual_runs: results,
    }
}
