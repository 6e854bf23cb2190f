//! Modsplit CLI - per-submodule dependency analysis from the command line.
//!
//! Reads a module listing (`go list -json -m all` output), scans every
//! module root and reports what each module really needs.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod cli;

/// Modsplit: split a monolithic Go module into submodules.
#[derive(Parser)]
#[command(name = "modsplit")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Repository root (defaults to current directory)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Module listing produced by `go list -json -m all` ("-" reads stdin)
    #[arg(short, long, global = true, value_name = "FILE")]
    modules: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Maximum number of concurrent scans (overrides the settings file)
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// Staging prefix stripped from package paths (overrides the settings file)
    #[arg(long, global = true)]
    staging_prefix: Option<String>,

    /// Record standard-library imports instead of dropping them
    #[arg(long, global = true)]
    keep_std: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the sub-packages of each external module the main module uses
    Deps,

    /// List submodules, or the submodules a module imports from
    Submodules {
        /// Module whose sibling requirements to list
        module: Option<String>,
    },

    /// Show the manifest a submodule needs once split out
    Manifest {
        /// Submodule path (e.g., "k8s.io/api")
        module: String,
    },

    /// Show the package lock for the main module
    Lock,

    /// Detect submodules that import from each other in a cycle
    Cycles,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = match cli.root {
        Some(r) => r,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!(
                    "{}: failed to get current directory: {e}",
                    "error".red().bold()
                );
                return ExitCode::FAILURE;
            }
        },
    };

    let ctx = cli::Context {
        root,
        modules: cli.modules,
        json: cli.json,
        workers: cli.workers,
        staging_prefix: cli.staging_prefix,
        keep_std: cli.keep_std,
    };

    let result = match cli.command {
        Commands::Deps => cli::deps::run(&ctx),
        Commands::Submodules { module } => cli::submodules::run(&ctx, module.as_deref()),
        Commands::Manifest { module } => cli::manifest::run(&ctx, &module),
        Commands::Lock => cli::lock::run(&ctx),
        Commands::Cycles => cli::cycles::run(&ctx),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            for cause in e.chain().skip(1) {
                eprintln!("  {}: {cause}", "caused by".dimmed());
            }
            ExitCode::FAILURE
        }
    }
}
