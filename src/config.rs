use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::Time;
use crate::utils::app_config::AppConfig;
use crate::utils::prelude::*;
use crate::workload::FitnessModel;

/// The experiment parameters, echoed verbatim in the report.
///
/// Config keys are lowercase (`h`, `w`, `t`), the report uses `H`, `W`, `T`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExperimentConfig {
    /// Pool size
    #[serde(rename(serialize = "H", deserialize = "h"), alias = "H")]
    pub items: usize,
    /// Time budget per trial
    #[serde(rename(serialize = "T", deserialize = "t"), alias = "T")]
    pub budget: f64,
    /// Number of workers
    #[serde(rename(serialize = "W", deserialize = "w"), alias = "W")]
    pub workers: usize,
    /// Tolerance against the best fitness
    pub epsilon: f64,
    /// Base seed, any integer
    pub seed: i64,
    /// Trials per policy
    pub trials: usize,
    #[serde(default, skip_serializing_if = "FitnessModel::is_uniform")]
    pub fitness: FitnessModel,
}

impl ExperimentConfig {
    /// Reject parameters no trial can run with.
    ///
    /// Zero trials, items or workers are fine and give neutral results.
    pub fn validate(&self) -> Result<()> {
        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(Error::InvalidParameter {
                name: "T",
                reason: format!("must be finite and non-negative, got {}", self.budget),
            });
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(Error::InvalidParameter {
                name: "epsilon",
                reason: format!("must be finite and non-negative, got {}", self.epsilon),
            });
        }
        if let FitnessModel::Dominant { fitness, .. } = self.fitness {
            if !fitness.is_finite() {
                return Err(Error::InvalidParameter {
                    name: "fitness",
                    reason: format!("dominant fitness must be finite, got {}", fitness),
                });
            }
        }
        Ok(())
    }

    pub fn budget(&self) -> Time {
        Time(self.budget)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Where `run` writes the report, stdout when absent
    #[serde(default)]
    pub report: Option<PathBuf>,
    /// Where per-trial chrome traces go
    #[serde(default = "OutputConfig::default_trace_dir")]
    pub trace_dir: PathBuf,
}

impl OutputConfig {
    fn default_trace_dir() -> PathBuf {
        PathBuf::from("traces")
    }

    pub fn trace_file(&self, name: impl AsRef<Path>) -> Result<PathBuf> {
        fs::create_dir_all(&self.trace_dir)?;
        Ok(self.trace_dir.join(name))
    }
}

pub trait AppConfigExt {
    fn experiment(&self) -> Result<ExperimentConfig>;
    fn output(&self) -> Result<OutputConfig>;
}

impl AppConfigExt for AppConfig {
    fn experiment(&self) -> Result<ExperimentConfig> {
        let cfg: ExperimentConfig = self.get("experiment")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn output(&self) -> Result<OutputConfig> {
        self.get("output")
    }
}
