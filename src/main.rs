//! Checkout CLI

use std::io;

use anyhow::Result;
use clap::Parser;

use checkout::{
    cli::{Cli, run},
    observability::init_subscriber,
};

/// Checkout CLI entry point
pub fn main() -> Result<()> {
    let cli = Cli::parse();

    init_subscriber(&cli.logging)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    run(&cli, &mut handle)?;

    Ok(())
}
