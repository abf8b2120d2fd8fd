use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "repomig")]
#[command(bin_name = "repomig")]
#[command(version)]
#[command(about = "Repository storage migration console")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Run the interactive migration wizard")]
    Migrate,
    #[command(about = "Show the current migration plan status")]
    Status,
    #[command(about = "Run configuration and connectivity checks")]
    Doctor,
}
