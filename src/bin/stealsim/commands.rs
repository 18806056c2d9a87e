use std::path::PathBuf;

use serde::Serialize;
use structopt::StructOpt;

use stealsim::config::{AppConfigExt, ExperimentConfig, OutputConfig};
use stealsim::output;
use stealsim::utils::prelude::*;

/// Should be implemented by individual subcommand
pub trait Cmd {
    fn run(self) -> Result<()>;
}

/// Show the effective configuration
#[derive(StructOpt)]
pub struct Config {}

#[derive(Serialize)]
struct Effective {
    experiment: ExperimentConfig,
    output: OutputConfig,
}

impl Cmd for Config {
    fn run(self) -> Result<()> {
        let effective = {
            let config = config();
            Effective {
                experiment: config.experiment()?,
                output: config.output()?,
            }
        };
        print!("{}", serde_yaml::to_string(&effective)?);

        Ok(())
    }
}

/// Run every policy and emit the JSON report
#[derive(StructOpt)]
pub struct Run {
    /// Write the report here instead of the configured output
    #[structopt(short, long, parse(from_os_str), value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl Cmd for Run {
    fn run(self) -> Result<()> {
        let report = stealsim::run_experiment()?;
        stealsim::emit_report(&report, self.output.as_deref())
    }
}

/// Replay one trial and print its trace and outcome
#[derive(StructOpt)]
pub struct Trial {
    /// fifo, local_no_steal or work_steal
    #[structopt(long)]
    policy: String,

    /// Trial index within the policy's batch, picks the seed
    #[structopt(long, default_value = "0")]
    index: usize,

    /// Also write a chrome://tracing file into the trace directory
    #[structopt(long)]
    chrome_trace: bool,
}

impl Cmd for Trial {
    fn run(self) -> Result<()> {
        let report = stealsim::run_single_trial(&self.policy, self.index)?;
        if self.chrome_trace {
            let path = stealsim::write_trial_trace(&report)?;
            info!(path = %path.display(), "chrome trace written");
        }
        output::emit_json(None, &report)
    }
}
