use structopt::StructOpt;

use stealsim::utils;
use stealsim::utils::prelude::*;

mod cli;
mod commands;

fn main() -> Result<()> {
    // panic setup should be done early
    utils::panic::setup();

    let cli = cli::Cli::from_args();

    // initialize Configuration
    utils::app_config::init(cli.config_file(), cli.preset())?;

    // logging reads its outputs from the configuration
    let _guard = utils::logging::setup(&config(), cli.produces_output())?;

    trace!("Start cli execution");

    cli.execute()
}
