//! tpv CLI - typst preview preprocessor.
//!
//! Provides commands for:
//! - `scan`: Rewrite preview fences without rendering
//! - `process`: Rewrite and render previews of a single document
//! - `build`: Process every document of the docs directory

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, ProcessArgs, ScanArgs};
use output::Output;

/// tpv - typst preview preprocessor for markdown documentation.
#[derive(Parser)]
#[command(name = "tpv", version, about)]
struct Cli {
    /// Enable verbose output (show render and cache logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite preview fences and print the intermediate markdown.
    Scan(ScanArgs),
    /// Process a single document, rendering its previews.
    Process(ProcessArgs),
    /// Process every document below the docs directory.
    Build(BuildArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Scan(args) => args.execute(),
        Commands::Process(args) => args.execute(),
        Commands::Build(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
