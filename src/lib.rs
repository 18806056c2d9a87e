//! Discrete-event comparison of task scheduling policies.
//!
//! A pool of items with fixed fitness is consumed by simulated workers
//! under a time budget, using a shared FIFO queue, local queues, or local
//! queues with work-stealing. Repeated trials per policy show which policy
//! most often reaches a near-optimal item first and how evenly the load
//! spreads across workers.

pub mod config;
pub mod draws;
pub mod experiment;
pub mod outcome;
pub mod output;
pub mod policy;
pub mod queues;
pub mod simulator;
pub mod stats;
pub mod types;
pub mod utils;
pub mod workload;

use std::path::Path;

use serde::Serialize;

use crate::config::AppConfigExt;
use crate::experiment::Report;
use crate::outcome::TrialOutcome;
use crate::policy::Policy;
use crate::simulator::TrialRun;
use crate::utils::prelude::*;

/// Run every policy with the globally configured experiment
pub fn run_experiment() -> Result<Report> {
    let cfg = config().experiment()?;
    info!(
        trials = cfg.trials,
        items = cfg.items,
        workers = cfg.workers,
        budget = cfg.budget,
        "starting experiment"
    );
    Ok(experiment::run(&cfg))
}

/// A single trial, as reported by the `trial` command
#[derive(Debug, Clone, Serialize)]
pub struct TrialReport {
    pub policy: Policy,
    pub index: usize,
    pub seed: i64,
    pub outcome: TrialOutcome,
    #[serde(flatten)]
    pub run: TrialRun,
}

/// Replay trial `index` of `policy` exactly as `run_experiment` would run it
pub fn run_single_trial(policy: &str, index: usize) -> Result<TrialReport> {
    let policy = Policy::from_name(policy)?;
    let cfg = config().experiment()?;
    let seed = experiment::trial_seed(cfg.seed, policy, index);
    let (run, outcome) = experiment::run_trial(policy, &cfg, seed);
    Ok(TrialReport {
        policy,
        index,
        seed,
        outcome,
        run,
    })
}

/// Write the run of `report` as a chrome trace into the configured trace directory
pub fn write_trial_trace(report: &TrialReport) -> Result<std::path::PathBuf> {
    let output = config().output()?;
    let path = output.trace_file(format!("{}-{}.json", report.policy, report.index))?;
    let metadata = serde_json::json!({
        "policy": report.policy,
        "index": report.index,
        "seed": report.seed,
        "outcome": report.outcome,
    });
    output::write_chrome_trace(&path, &report.run, &metadata)?;
    Ok(path)
}

/// Emit `report` to `path`, the configured report file, or stdout
pub fn emit_report(report: &Report, path: Option<&Path>) -> Result<()> {
    let configured = config().output()?.report;
    output::emit_json(path.or_else(|| configured.as_deref()), report)
}
