use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "branch-locator", version, about = "Find the nearest container branch")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "config.toml",
        help = "Configuration file (created with defaults when missing)"
    )]
    pub config: PathBuf,
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Nearest branch to a given position
    Nearest {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Locate this machine and show the nearest branch
    Locate,
    /// Keep locating until interrupted
    Watch {
        #[arg(long, default_value_t = 60, help = "Seconds between lookups")]
        interval: u64,
    },
    /// List all branches, nearest first when a position is given
    List {
        #[arg(long, allow_hyphen_values = true, requires = "lon")]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<f64>,
    },
    /// Print a directions link for a branch
    Directions { id: String },
}
