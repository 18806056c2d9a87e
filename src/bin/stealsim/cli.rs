use std::path::PathBuf;

use structopt::StructOpt;

use crate::commands::{self, Cmd};
use stealsim::utils::prelude::*;

/// Compare shared FIFO, local-queue and work-stealing scheduling under heavy-tailed workloads
#[derive(StructOpt)]
#[structopt(name = "stealsim")]
pub struct Cli {
    /// Set a custom config file
    #[structopt(short, long, parse(from_os_str), value_name = "FILE")]
    config: Option<PathBuf>,

    /// Apply a preset from the `presets` config table
    #[structopt(short, long, value_name = "NAME")]
    preset: Option<String>,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
enum Command {
    Config(commands::Config),
    Run(commands::Run),
    Trial(commands::Trial),
}

impl Cli {
    pub fn config_file(&self) -> Option<&std::path::Path> {
        self.config.as_deref()
    }

    pub fn preset(&self) -> Option<&str> {
        self.preset.as_deref()
    }

    /// Whether the command prints its result on stdout
    pub fn produces_output(&self) -> bool {
        match &self.command {
            Command::Config(_) => true,
            Command::Run(run) => run.output.is_none(),
            Command::Trial(_) => true,
        }
    }

    pub fn execute(self) -> Result<()> {
        match self.command {
            Command::Config(cmd) => cmd.run(),
            Command::Run(cmd) => cmd.run(),
            Command::Trial(cmd) => cmd.run(),
        }
    }
}
