//! Import and export against PostgreSQL.

use super::dump_file::{open_store, write_dump};
use palimpsest_core::StoreConfig;
use palimpsest_database::PostgresGraphRepository;
use palimpsest_store::NarrativeStore;
use std::path::Path;
use tracing::info;

const POOL_SIZE: u32 = 4;

/// Write the database graph to `path`.
pub async fn handle_export(
    path: &Path,
    config: StoreConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let repository = PostgresGraphRepository::from_env(POOL_SIZE)?;
    let store = NarrativeStore::from_repository(&repository, config).await?;
    write_dump(path, &store.dump().await)?;
    Ok(())
}

/// Load `path` into the database after checking it is consistent.
pub async fn handle_import(
    path: &Path,
    replace: bool,
    config: StoreConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path, config)?;
    store.assert_consistent().await?;
    let repository = PostgresGraphRepository::from_env(POOL_SIZE)?;
    if replace {
        repository.replace_with(store.dump().await).await?;
    } else {
        store.export_to(&repository).await?;
    }
    info!(path = %path.display(), replace, "Imported dump");
    Ok(())
}
