//! Reading and writing graph dump files.

use palimpsest_core::StoreConfig;
use palimpsest_interface::GraphDump;
use palimpsest_store::NarrativeStore;
use std::path::Path;
use tracing::{debug, info};

/// Parse a dump file.
pub fn read_dump(path: &Path) -> Result<GraphDump, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let dump: GraphDump = serde_json::from_str(&text)
        .map_err(|e| format!("Invalid dump {}: {}", path.display(), e))?;
    debug!(
        path = %path.display(),
        nodes = dump.nodes.len(),
        edges = dump.edges.len(),
        "Read dump"
    );
    Ok(dump)
}

/// Write `dump` as pretty-printed JSON.
pub fn write_dump(path: &Path, dump: &GraphDump) -> Result<(), Box<dyn std::error::Error>> {
    let text = serde_json::to_string_pretty(dump)?;
    std::fs::write(path, text).map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    info!(
        path = %path.display(),
        nodes = dump.nodes.len(),
        edges = dump.edges.len(),
        "Wrote dump"
    );
    Ok(())
}

/// Load a dump file into an in-memory store.
pub fn open_store(
    path: &Path,
    config: StoreConfig,
) -> Result<NarrativeStore, Box<dyn std::error::Error>> {
    let dump = read_dump(path)?;
    Ok(NarrativeStore::from_dump(dump, config)?)
}
