//! Repeated trials per policy and the aggregate report.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::ExperimentConfig;
use crate::draws::DrawSource;
use crate::outcome::TrialOutcome;
use crate::policy::Policy;
use crate::simulator::{Simulation, TrialRun};
use crate::stats::{self, WinnerTable};
use crate::utils::logging::prelude::*;
use crate::workload::Workload;

/// Seed spacing between policies
const POLICY_SEED_STRIDE: i64 = 100_000;

/// Seed of trial `trial` under `policy`, distinct across policies and trials
pub fn trial_seed(base: i64, policy: Policy, trial: usize) -> i64 {
    base.wrapping_add(POLICY_SEED_STRIDE.wrapping_mul(policy.index()))
        .wrapping_add(trial as i64)
}

/// Run a single trial from scratch with its own draw source
pub fn run_trial(policy: Policy, cfg: &ExperimentConfig, seed: i64) -> (TrialRun, TrialOutcome) {
    let _g = debug_span!("trial", %policy, seed).entered();

    let mut draws = DrawSource::new(seed);
    // fitness draws come before any scheduling draw
    let workload = Workload::generate(cfg.items, &cfg.fitness, &mut draws);
    let run = Simulation::new(&workload, policy, cfg.workers, cfg.budget(), &mut draws).run();
    let outcome = TrialOutcome::extract(&run, cfg.epsilon);
    debug!(?outcome.winner, outcome.evaluated, outcome.acceptable_count, "trial outcome");

    (run, outcome)
}

/// Report entry of one policy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicySummary {
    pub avg_acceptable_count: f64,
    pub avg_coverage_skew: f64,
    pub avg_evaluated: f64,
    pub trials: usize,
    pub winner_entropy_bits: f64,
    /// Gini over all `H` items of the pool, items that never won count as
    /// zero. A single item winning every trial gives `1 - 1/H`; a few
    /// equal winners in a large pool still score close to 1.
    pub winner_gini: f64,
    pub winner_support: usize,
}

/// Accumulates outcomes of one policy's trial batch
#[derive(Debug, Clone)]
pub struct PolicyAggregate {
    winners: WinnerTable,
    acceptable: Vec<f64>,
    evaluated: Vec<f64>,
    skew: Vec<f64>,
}

impl PolicyAggregate {
    pub fn new(pool: usize) -> Self {
        Self {
            winners: WinnerTable::new(pool),
            acceptable: Vec::new(),
            evaluated: Vec::new(),
            skew: Vec::new(),
        }
    }

    pub fn add(&mut self, outcome: &TrialOutcome) {
        if let Some(winner) = outcome.winner {
            self.winners.record(winner);
        }
        self.acceptable.push(outcome.acceptable_count as f64);
        self.evaluated.push(outcome.evaluated as f64);
        self.skew.push(outcome.coverage_skew);
    }

    pub fn winners(&self) -> &WinnerTable {
        &self.winners
    }

    pub fn summary(&self) -> PolicySummary {
        PolicySummary {
            avg_acceptable_count: stats::mean(&self.acceptable),
            avg_coverage_skew: stats::mean(&self.skew),
            avg_evaluated: stats::mean(&self.evaluated),
            trials: self.evaluated.len(),
            winner_entropy_bits: self.winners.entropy_bits(),
            winner_gini: self.winners.gini(),
            winner_support: self.winners.support(),
        }
    }
}

/// Run the configured number of trials under one policy
pub fn run_policy(policy: Policy, cfg: &ExperimentConfig) -> PolicyAggregate {
    let _g = info_span!("policy", %policy).entered();

    let mut aggregate = PolicyAggregate::new(cfg.items);
    for trial in 0..cfg.trials {
        let (_, outcome) = run_trial(policy, cfg, trial_seed(cfg.seed, policy, trial));
        aggregate.add(&outcome);
    }
    aggregate
}

/// The full comparison, as emitted by `run`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub config: ExperimentConfig,
    pub results: BTreeMap<Policy, PolicySummary>,
}

/// Compare every policy under the same configuration
pub fn run(cfg: &ExperimentConfig) -> Report {
    let _g = info_span!("experiment").entered();

    let results = Policy::ALL
        .iter()
        .map(|&policy| {
            let summary = run_policy(policy, cfg).summary();
            info!(
                %policy,
                support = summary.winner_support,
                entropy = summary.winner_entropy_bits,
                gini = summary.winner_gini,
                avg_evaluated = summary.avg_evaluated,
                "policy done"
            );
            (policy, summary)
        })
        .collect();

    Report {
        config: cfg.clone(),
        results,
    }
}
