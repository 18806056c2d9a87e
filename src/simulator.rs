use std::fmt;

use serde::Serialize;

use crate::draws::DrawSource;
use crate::policy::Policy;
use crate::queues::Queues;
use crate::types::{Evaluation, ItemId, Time, WorkerId};
use crate::utils::logging::prelude::*;
use crate::workload::Workload;

/// Why a trial stopped. Both are normal ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The clock reached the budget
    BudgetExhausted,
    /// A full round passed with no worker obtaining an item
    Starved,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::BudgetExhausted => write!(f, "budget exhausted"),
            Termination::Starved => write!(f, "starved"),
        }
    }
}

/// Result of one round over all workers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Round {
    /// At least one evaluation completed
    Progressed,
    /// Nobody obtained anything
    Idle,
    /// The budget ran out during the round
    OutOfBudget,
}

/// Everything a finished trial leaves behind
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialRun {
    /// Completed evaluations, in completion order
    pub trace: Vec<Evaluation>,
    /// Evaluations completed per worker
    pub per_worker: Vec<usize>,
    /// Clock at termination
    pub clock: Time,
    pub termination: Termination,
}

/// The time-stepped scheduling loop of one trial
pub struct Simulation<'a> {
    workload: &'a Workload,
    draws: &'a mut DrawSource,
    queues: Queues,
    budget: Time,
    clock: Time,
    per_worker: Vec<usize>,
    trace: Vec<Evaluation>,
}

impl<'a> Simulation<'a> {
    /// Place every item of `workload` into the queues of `policy`
    pub fn new(
        workload: &'a Workload,
        policy: Policy,
        workers: usize,
        budget: Time,
        draws: &'a mut DrawSource,
    ) -> Self {
        Self {
            workload,
            draws,
            queues: Queues::assign(policy, workload.len(), workers),
            budget,
            clock: Time::default(),
            per_worker: vec![0; workers],
            trace: Vec::new(),
        }
    }

    /// Let each worker, in ascending id order, try to complete one item
    fn round(&mut self) -> Round {
        let mut progressed = false;
        for worker in 0..self.per_worker.len() {
            if self.clock >= self.budget {
                return Round::OutOfBudget;
            }
            let item = match self.queues.take(worker, self.draws) {
                Some(item) => item,
                None => continue,
            };
            let dt = self.draws.eval_time();
            let finished = self.clock + dt;
            if finished > self.budget {
                // the evaluation cannot complete in time and is dropped
                trace!(worker, item, %dt, clock = %self.clock, "clamped at budget");
                self.clock = self.budget;
                return Round::OutOfBudget;
            }
            self.complete(worker, item, finished);
            progressed = true;
        }
        if progressed {
            Round::Progressed
        } else {
            Round::Idle
        }
    }

    fn complete(&mut self, worker: WorkerId, item: ItemId, finished: Time) {
        let evaluation = Evaluation {
            item,
            fitness: self.workload[item].fitness,
            worker,
            started: self.clock,
            finished,
        };
        trace!(%evaluation, "completed");
        self.clock = finished;
        self.per_worker[worker] += 1;
        self.trace.push(evaluation);
    }

    /// Run rounds until the budget is spent or every worker starves
    pub fn run(mut self) -> TrialRun {
        while self.clock < self.budget {
            match self.round() {
                Round::Progressed => continue,
                Round::Idle => return self.finish(Termination::Starved),
                Round::OutOfBudget => break,
            }
        }
        self.finish(Termination::BudgetExhausted)
    }

    fn finish(self, termination: Termination) -> TrialRun {
        debug!(
            %termination,
            clock = %self.clock,
            evaluated = self.trace.len(),
            left = self.queues.remaining(),
            "trial finished"
        );
        TrialRun {
            trace: self.trace,
            per_worker: self.per_worker,
            clock: self.clock,
            termination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::FitnessModel;

    fn run(policy: Policy, seed: i64, items: usize, workers: usize, budget: f64) -> TrialRun {
        let mut draws = DrawSource::new(seed);
        let workload = Workload::generate(items, &FitnessModel::Uniform, &mut draws);
        Simulation::new(&workload, policy, workers, Time(budget), &mut draws).run()
    }

    #[test]
    fn zero_budget_evaluates_nothing() {
        for policy in Policy::ALL.iter() {
            let r = run(*policy, 1, 10, 3, 0.0);
            assert!(r.trace.is_empty());
            assert_eq!(r.clock, Time(0.0));
            assert_eq!(r.termination, Termination::BudgetExhausted);
        }
    }

    #[test]
    fn large_budget_starves_after_all_items() {
        for policy in Policy::ALL.iter() {
            let r = run(*policy, 5, 12, 4, 1.0e6);
            assert_eq!(r.trace.len(), 12);
            assert_eq!(r.termination, Termination::Starved);
            assert!(r.clock < Time(1.0e6));
            assert_eq!(r.per_worker.iter().sum::<usize>(), 12);
        }
    }

    #[test]
    fn local_no_steal_keeps_items_with_owner() {
        let r = run(Policy::LocalNoSteal, 2, 9, 3, 1.0e6);
        for e in r.trace.iter() {
            assert_eq!(e.item % 3, e.worker);
        }
        assert_eq!(r.per_worker, vec![3, 3, 3]);
    }

    #[test]
    fn clock_is_monotonic_and_bounded() {
        for seed in 0..20 {
            let r = run(Policy::WorkSteal, seed, 50, 4, 3.0);
            let mut last = Time(0.0);
            for e in r.trace.iter() {
                assert!(e.started >= last);
                assert!(e.finished > e.started);
                assert!(e.finished <= Time(3.0));
                last = e.finished;
            }
            assert!(r.clock <= Time(3.0));
        }
    }

    #[test]
    fn trace_carries_workload_fitness() {
        let workload = Workload::from_fitness(vec![0.1, 0.9, 0.5, 0.7]);
        let mut draws = DrawSource::new(4);
        let r = Simulation::new(&workload, Policy::Fifo, 2, Time(1.0e6), &mut draws).run();

        assert_eq!(r.trace.len(), 4);
        for (expected, e) in r.trace.iter().enumerate() {
            // fifo hands out ids in order, workers alternate
            assert_eq!(e.item, expected);
            assert_eq!(e.worker, expected % 2);
            assert_eq!(Some(e.fitness), workload.get(e.item).map(|it| it.fitness));
        }
    }

    #[test]
    fn queues_follow_the_workload() {
        // only ids of the given workload are ever handed out
        let workload = Workload::from_fitness(vec![0.4, 0.8, 0.2]);
        for policy in Policy::ALL.iter() {
            let mut draws = DrawSource::new(11);
            let r = Simulation::new(&workload, *policy, 5, Time(1.0e6), &mut draws).run();
            let mut ids: Vec<_> = r.trace.iter().map(|e| e.item).collect();
            ids.sort_unstable();
            assert_eq!(ids, vec![0, 1, 2]);
            for e in r.trace.iter() {
                assert_eq!(e.fitness, workload[e.item].fitness);
            }
        }
    }

    #[test]
    fn no_workers_starves_immediately() {
        let r = run(Policy::Fifo, 0, 5, 0, 10.0);
        assert!(r.trace.is_empty());
        assert_eq!(r.termination, Termination::Starved);
        assert_eq!(r.clock, Time(0.0));
    }
}
