use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::inspect::{InspectArgs, run_inspect};
use crate::replay::{ReplayArgs, run_replay};
use crate::templates::{TemplatesArgs, run_templates};

#[derive(Debug, Parser)]
#[command(
    name = "tierboard",
    about = "Headless tier-list board driver: templates, click replays and save inspection",
    version
)]
pub struct Cli {
    /// Log engine transitions (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the available board templates.
    Templates(TemplatesArgs),

    /// Replay an intake/click script against a fresh board.
    Replay(ReplayArgs),

    /// Validate a saved board and print per-tier contents.
    Inspect(InspectArgs),
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Templates(args) => run_templates(args),
        Commands::Replay(args) => run_replay(args),
        Commands::Inspect(args) => run_inspect(args),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("tierboard=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });
    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
