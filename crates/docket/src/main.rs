use anyhow::Result;
use clap::Parser;

use docket::cli::{self, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::init_tracing(cli.log_json)?;

    cli::run(cli)
}
