use std::fmt;
use std::ops::{Add, AddAssign, Deref};

use serde::{Deserialize, Serialize};

/// Identity of a candidate item, in `[0, H)`
pub type ItemId = usize;

/// Identity of a simulated worker, in `[0, W)`
pub type WorkerId = usize;

/// A time point in simulation
#[derive(Debug, Clone, Copy, Default, PartialOrd, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Time(pub f64);

/// A duration of time in simulation
#[derive(Debug, Clone, Copy, Default, PartialOrd, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Duration(pub f64);

impl Deref for Duration {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Add<Duration> for Time {
    type Output = Time;

    fn add(self, rhs: Duration) -> Self::Output {
        Time(self.0 + rhs.0)
    }
}

impl AddAssign<Duration> for Time {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0;
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A candidate in the workload pool. Fitness is fixed for the whole trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub fitness: f64,
}

/// One completed evaluation, in completion order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub item: ItemId,
    pub fitness: f64,
    pub worker: WorkerId,
    pub started: Time,
    pub finished: Time,
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Evaluation(item {}, worker {}, @{:.2}..{:.2})",
            self.item, self.worker, self.started, self.finished
        )
    }
}
