//! Meridian CLI - project indexing from the command line.
//!
//! Every command indexes the project (warm from the persisted content cache
//! when possible), answers its query and saves the cache again.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod cli;

/// Meridian: incremental project indexer.
#[derive(Parser)]
#[command(name = "meridian")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Ignore and do not update the persisted content cache
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index source files in the project
    Index,

    /// Find where a symbol is defined
    Symbol {
        /// Symbol name (exact match unless --fuzzy)
        name: String,

        /// Case-insensitive substring match
        #[arg(short, long)]
        fuzzy: bool,

        /// Maximum number of results
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Find where a symbol is used
    Refs {
        /// Symbol name
        name: String,
    },

    /// Show imports, dependents and impact of a file
    Deps {
        /// File path (relative to the current directory or the project root)
        file: PathBuf,
    },

    /// Detect circular dependencies
    Cycles,

    /// Show index statistics
    Stats,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

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

    let workspace = match cli.workspace {
        Some(w) => w,
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
    let no_cache = cli.no_cache;

    let result = match cli.command {
        Commands::Index => cli::index::run(&workspace, no_cache),
        Commands::Symbol { name, fuzzy, limit } => {
            cli::symbol::run(&workspace, &name, fuzzy, limit, no_cache)
        }
        Commands::Refs { name } => cli::refs::run(&workspace, &name, no_cache),
        Commands::Deps { file } => cli::deps::run(&workspace, &file, no_cache),
        Commands::Cycles => cli::cycles::run(&workspace, no_cache),
        Commands::Stats => cli::stats::run(&workspace, no_cache),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  {}: {cause}", "caused by".dimmed());
                source = std::error::Error::source(cause);
            }
            ExitCode::FAILURE
        }
    }
}
