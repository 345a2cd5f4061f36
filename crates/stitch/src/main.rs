//! Stitch CLI - documentation assembler.
//!
//! Provides commands for:
//! - `build`: Assemble every documentation set into one site
//! - `validate`: Check the navigation declaration without reading checkouts
//! - `resolve`: Resolve a `repo://path#anchor` link to its published URL

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, ResolveArgs, ValidateArgs};
use output::Output;

/// Stitch - documentation assembler.
#[derive(Parser)]
#[command(name = "stitch", version, about)]
struct Cli {
    /// Enable verbose output (log every build step).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the site from every configured repository.
    Build(BuildArgs),
    /// Validate the navigation declaration and its path prefixes.
    Validate(ValidateArgs),
    /// Resolve a link against the navigation declaration.
    Resolve(ResolveArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Build(args) => args.execute(),
        Commands::Validate(args) => args.execute(),
        Commands::Resolve(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
