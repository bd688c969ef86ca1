use std::path::PathBuf;

use clap::Parser;

/// Chordex: drive realms with key chords and ex commands.
#[derive(Parser, Debug)]
#[command(name = "chordex", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// rc file to run in the coordinator at startup.
    #[arg(long)]
    pub rc: Option<PathBuf>,

    /// Number of tab realms to start.
    #[arg(long, default_value_t = 2)]
    pub tabs: u32,

    /// Log filter directive (e.g. debug, chordex_bus=trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the effective config as JSON and exit.
    #[arg(long)]
    pub print_config: bool,
}

pub fn parse() -> Args {
    Args::parse()
}
