use std::io;

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

use self::{discover::DiscoverArg, print_config::PrintConfigArg};

mod discover;
mod print_config;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log more detail (-v: per-ant rules and admissions, -vv: sampling)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Discover survival subgroups in a CSV dataset
    Discover(#[clap(flatten)] DiscoverArg),
    /// Print the default search parameters as JSON
    PrintConfig(#[clap(flatten)] PrintConfigArg),
}

impl CommandArgs {
    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::WARN;
        }
        match self.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match &args.mode {
        Mode::Discover(arg) => discover::run(arg)?,
        Mode::PrintConfig(arg) => print_config::run(arg)?,
    }
    Ok(())
}
