use parse_display::{Display, FromStr};
use serde::{Deserialize, Serialize};

use crate::utils::prelude::*;

/// Scheduling policy under comparison
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, FromStr, Serialize, Deserialize,
)]
#[display(style = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// One shared FIFO queue, every worker consumes from its head
    Fifo,
    /// One queue per worker, owners pop the head, no stealing
    LocalNoSteal,
    /// One queue per worker, owners pop the tail, idle workers steal heads
    WorkSteal,
}

impl Policy {
    /// Every policy, in the order the experiment runs them
    pub const ALL: [Policy; 3] = [Policy::Fifo, Policy::LocalNoSteal, Policy::WorkSteal];

    /// Position in [`Policy::ALL`], used to offset trial seeds
    pub fn index(self) -> i64 {
        match self {
            Policy::Fifo => 0,
            Policy::LocalNoSteal => 1,
            Policy::WorkSteal => 2,
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        name.parse()
            .map_err(|_| Error::InvalidPolicy(name.to_owned()))
    }
}
