//! Palimpsest CLI binary.
//!
//! This binary provides command-line access to narrative graph dumps:
//! - Check graph invariants
//! - Garbage-collect unreachable commits
//! - Query world state and branch history
//! - Move graphs between dump files and PostgreSQL (feature `database`)

use clap::Parser;
use palimpsest_core::StoreConfig;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, handle_check, handle_gc, handle_history, handle_world_state};
    #[cfg(feature = "database")]
    use cli::{handle_export, handle_import};

    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing
    #[cfg(feature = "otel")]
    palimpsest_core::init_telemetry()?;
    #[cfg(not(feature = "otel"))]
    {
        use palimpsest_core::LogFormat;

        let format = if cli.json_logs {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };
        let directive = if cli.verbose { "debug" } else { "warn" };
        palimpsest_core::init_tracing(format, directive)?;
    }

    let config = StoreConfig::load()?;

    let result = match cli.command {
        Commands::Check { dump } => handle_check(&dump, config).await,

        Commands::Gc {
            dump,
            retention_days,
            write,
        } => handle_gc(&dump, retention_days, write, config).await,

        Commands::WorldState {
            dump,
            root,
            branch,
            seq,
        } => handle_world_state(&dump, &root, &branch, seq, config).await,

        Commands::History {
            dump,
            root,
            branch,
            limit,
        } => handle_history(&dump, &root, &branch, limit, config).await,

        #[cfg(feature = "database")]
        Commands::Export { dump } => handle_export(&dump, config).await,

        #[cfg(feature = "database")]
        Commands::Import { dump, replace } => handle_import(&dump, replace, config).await,
    };

    #[cfg(feature = "otel")]
    palimpsest_core::shutdown_telemetry();

    result
}
