//! Yardage CLI

use std::io;

use anyhow::Result;
use clap::Parser;

use yardage::logging::init_subscriber;

mod cli;

/// Parse arguments, start logging and run the selected command.
pub fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    init_subscriber(&cli.logging)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    cli.run(&mut handle)
}
