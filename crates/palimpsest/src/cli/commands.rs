//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Palimpsest - inspect and maintain versioned narrative graphs
#[derive(Parser, Debug)]
#[command(name = "palimpsest")]
#[command(about = "Inspect and maintain versioned narrative graph dumps", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check graph invariants; exits non-zero when violations are found
    Check {
        /// Path to a graph dump (JSON)
        dump: PathBuf,
    },

    /// Collect commits no branch can reach
    Gc {
        /// Path to a graph dump (JSON)
        dump: PathBuf,

        /// Minimum age in days of collected commits (defaults to configuration)
        #[arg(long)]
        retention_days: Option<i64>,

        /// Write the collected graph back to the dump file
        #[arg(long)]
        write: bool,
    },

    /// Print the world state of a branch at a scene sequence
    WorldState {
        /// Path to a graph dump (JSON)
        dump: PathBuf,

        /// Story root id
        #[arg(long)]
        root: String,

        /// Branch label
        #[arg(long)]
        branch: String,

        /// Scene sequence index
        #[arg(long)]
        seq: i64,
    },

    /// Print the commit history of a branch, newest first
    History {
        /// Path to a graph dump (JSON)
        dump: PathBuf,

        /// Story root id
        #[arg(long)]
        root: String,

        /// Branch label
        #[arg(long)]
        branch: String,

        /// Maximum number of commits (defaults to configuration)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Write the graph stored in DATABASE_URL to a dump file
    #[cfg(feature = "database")]
    Export {
        /// Destination dump path (JSON)
        dump: PathBuf,
    },

    /// Load a dump file into the database named by DATABASE_URL
    #[cfg(feature = "database")]
    Import {
        /// Source dump path (JSON)
        dump: PathBuf,

        /// Replace existing database contents instead of failing on conflicts
        #[arg(long)]
        replace: bool,
    },
}
