mod cli;
mod dispatch;
mod http;
mod prompt;
mod render;
mod screen;

use anyhow::Result;
use clap::Parser;

pub fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    dispatch::run_with_deps(cli)
}
