//! Queue topologies and the removal rule of each policy.
//!
//! Every item id is placed exactly once when the topology is built and is
//! never put back after removal.

use std::collections::VecDeque;

use crate::draws::DrawSource;
use crate::policy::Policy;
use crate::types::{ItemId, WorkerId};
use crate::utils::prelude::*;

/// Initial queue layout, one variant per policy
#[derive(Debug, Clone, PartialEq)]
pub enum Queues {
    /// Single shared FIFO
    Fifo(VecDeque<ItemId>),
    /// One deque per worker, only the owner removes from it
    LocalNoSteal(Vec<VecDeque<ItemId>>),
    /// One deque per worker, others may steal from its head
    WorkSteal(Vec<VecDeque<ItemId>>),
}

impl Queues {
    /// Build the initial topology for `items` ids over `workers` workers.
    ///
    /// Local topologies place item `i` on worker `i mod workers`, keeping
    /// ascending ids per queue. With no workers there is nowhere to place
    /// anything and the local queues are empty.
    pub fn assign(policy: Policy, items: usize, workers: usize) -> Self {
        match policy {
            Policy::Fifo => Queues::Fifo((0..items).collect()),
            Policy::LocalNoSteal => Queues::LocalNoSteal(round_robin(items, workers)),
            Policy::WorkSteal => Queues::WorkSteal(round_robin(items, workers)),
        }
    }

    /// Same as [`Queues::assign`], with the policy given by name
    pub fn assign_by_name(policy: &str, items: usize, workers: usize) -> Result<Self> {
        Ok(Self::assign(Policy::from_name(policy)?, items, workers))
    }

    pub fn policy(&self) -> Policy {
        match self {
            Queues::Fifo(_) => Policy::Fifo,
            Queues::LocalNoSteal(_) => Policy::LocalNoSteal,
            Queues::WorkSteal(_) => Policy::WorkSteal,
        }
    }

    /// Number of ids still queued
    pub fn remaining(&self) -> usize {
        match self {
            Queues::Fifo(q) => q.len(),
            Queues::LocalNoSteal(qs) | Queues::WorkSteal(qs) => qs.iter().map(VecDeque::len).sum(),
        }
    }

    /// Let `worker` obtain one item, if it can.
    ///
    /// Only a work-stealing worker with an empty own queue consumes a draw
    /// (the victim order), even when every other queue is empty too.
    pub fn take(&mut self, worker: WorkerId, draws: &mut DrawSource) -> Option<ItemId> {
        match self {
            Queues::Fifo(q) => q.pop_front(),
            Queues::LocalNoSteal(qs) => qs.get_mut(worker)?.pop_front(),
            Queues::WorkSteal(qs) => {
                // own queue is a stack
                if let Some(id) = qs.get_mut(worker)?.pop_back() {
                    return Some(id);
                }
                let mut victims: Vec<WorkerId> = (0..qs.len()).collect();
                draws.shuffle(&mut victims);
                let stolen = victims
                    .into_iter()
                    .filter(|&v| v != worker)
                    .find_map(|v| qs[v].pop_front().map(|id| (v, id)));
                if let Some((victim, id)) = stolen {
                    trace!(worker, victim, item = id, "steal");
                }
                stolen.map(|(_, id)| id)
            }
        }
    }
}

fn round_robin(items: usize, workers: usize) -> Vec<VecDeque<ItemId>> {
    let mut queues = vec![VecDeque::new(); workers];
    if workers > 0 {
        for id in 0..items {
            queues[id % workers].push_back(id);
        }
    }
    queues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locals(q: &Queues) -> &Vec<VecDeque<ItemId>> {
        match q {
            Queues::LocalNoSteal(qs) | Queues::WorkSteal(qs) => qs,
            Queues::Fifo(_) => panic!("not a local topology"),
        }
    }

    #[test]
    fn fifo_holds_all_ids_in_order() {
        let q = Queues::assign(Policy::Fifo, 5, 3);
        assert_eq!(q, Queues::Fifo((0..5).collect()));
        assert_eq!(q.remaining(), 5);
    }

    #[test]
    fn local_is_round_robin() {
        for policy in [Policy::LocalNoSteal, Policy::WorkSteal].iter() {
            let q = Queues::assign(*policy, 7, 3);
            let qs = locals(&q);
            assert_eq!(qs.len(), 3);
            assert_eq!(qs[0], VecDeque::from(vec![0, 3, 6]));
            assert_eq!(qs[1], VecDeque::from(vec![1, 4]));
            assert_eq!(qs[2], VecDeque::from(vec![2, 5]));
            assert_eq!(q.policy(), *policy);
        }
    }

    #[test]
    fn unknown_policy_name_is_rejected() {
        assert!(matches!(
            Queues::assign_by_name("lifo", 3, 1),
            Err(Error::InvalidPolicy(_))
        ));
        assert!(Queues::assign_by_name("work_steal", 3, 1).is_ok());
    }

    #[test]
    fn zero_workers_places_nothing() {
        let q = Queues::assign(Policy::WorkSteal, 4, 0);
        assert_eq!(q.remaining(), 0);
        let mut draws = DrawSource::new(0);
        let mut q = q;
        assert_eq!(q.take(0, &mut draws), None);
    }

    #[test]
    fn local_no_steal_never_steals() {
        let mut draws = DrawSource::new(0);
        let mut q = Queues::assign(Policy::LocalNoSteal, 2, 2);
        assert_eq!(q.take(0, &mut draws), Some(0));
        assert_eq!(q.take(0, &mut draws), None);
        assert_eq!(q.take(1, &mut draws), Some(1));
    }

    #[test]
    fn work_steal_pops_own_tail_then_steals_heads() {
        let mut draws = DrawSource::new(0);
        // worker 0: [0, 2, 4], worker 1: [1, 3, 5]
        let mut q = Queues::assign(Policy::WorkSteal, 6, 2);
        assert_eq!(q.take(0, &mut draws), Some(4));
        assert_eq!(q.take(0, &mut draws), Some(2));
        assert_eq!(q.take(0, &mut draws), Some(0));
        // only one victim, so the steal takes its head
        assert_eq!(q.take(0, &mut draws), Some(1));
        assert_eq!(q.take(1, &mut draws), Some(5));
        assert_eq!(q.take(1, &mut draws), Some(3));
        assert_eq!(q.take(1, &mut draws), None);
        assert_eq!(q.remaining(), 0);
    }

    #[test]
    fn every_id_is_taken_exactly_once() {
        let mut draws = DrawSource::new(9);
        let mut q = Queues::assign(Policy::WorkSteal, 20, 4);
        let mut seen = vec![false; 20];
        // worker 3 drains everything by stealing once its own queue is empty
        while let Some(id) = q.take(3, &mut draws) {
            assert!(!seen[id]);
            seen[id] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
