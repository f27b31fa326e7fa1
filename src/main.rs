//! Command line harness for running 3PL integrations against local fixtures.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
