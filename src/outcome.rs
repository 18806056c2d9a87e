use itertools::Itertools;
use serde::Serialize;

use crate::simulator::TrialRun;
use crate::stats;
use crate::types::{Evaluation, ItemId};

/// Read-only summary of one trial
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialOutcome {
    /// First completed item within tolerance of the trial's best fitness
    pub winner: Option<ItemId>,
    /// Distinct items within tolerance of the best fitness
    pub acceptable_count: usize,
    pub evaluated: usize,
    pub coverage_skew: f64,
}

impl TrialOutcome {
    pub fn empty() -> Self {
        Self {
            winner: None,
            acceptable_count: 0,
            evaluated: 0,
            coverage_skew: 0.0,
        }
    }

    /// Derive the outcome from a finished trial.
    ///
    /// The best fitness is taken over the whole trace first, the winner is
    /// then the earliest completion that is acceptable against it.
    pub fn extract(run: &TrialRun, epsilon: f64) -> Self {
        let trace = &run.trace;
        let best = match best_fitness(trace) {
            Some(best) => best,
            None => return Self::empty(),
        };
        let acceptable = |e: &&Evaluation| best - e.fitness <= epsilon;

        Self {
            winner: trace.iter().find(acceptable).map(|e| e.item),
            acceptable_count: trace
                .iter()
                .filter(acceptable)
                .map(|e| e.item)
                .unique()
                .count(),
            evaluated: trace.len(),
            coverage_skew: stats::coverage_skew(&run.per_worker),
        }
    }
}

fn best_fitness(trace: &[Evaluation]) -> Option<f64> {
    trace.iter().map(|e| e.fitness).fold(None, |best, f| match best {
        Some(b) if b >= f => Some(b),
        _ => Some(f),
    })
}
