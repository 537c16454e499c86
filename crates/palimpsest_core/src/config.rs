//! Store configuration.
//!
//! Configuration is layered, later sources overriding earlier ones:
//! - Bundled defaults (include_str! from palimpsest.toml)
//! - User config in the home directory (~/.config/palimpsest/palimpsest.toml)
//! - User config in the current directory (./palimpsest.toml)
//! - `PALIMPSEST_*` environment variables

use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use palimpsest_error::{ConfigError, ConfigErrorKind, PalimpsestError, PalimpsestResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};

/// Tunables of the narrative store.
///
/// # Examples
///
/// ```
/// use palimpsest_core::StoreConfig;
///
/// let config = StoreConfig::default().with_snapshot_interval(5);
/// assert!(config.should_create_snapshot(15));
/// assert!(!config.should_create_snapshot(0));
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
pub struct StoreConfig {
    /// Snapshots are materialized at every positive multiple of this sequence
    #[serde(default = "default_snapshot_interval")]
    snapshot_interval: i64,

    /// Memories retained per character agent
    #[serde(default = "default_agent_memory_limit")]
    agent_memory_limit: usize,

    /// Branch created with every new root
    #[serde(default = "default_branch")]
    #[setters(into)]
    #[builder(setter(into))]
    default_branch: String,

    /// Commits returned by history queries when no limit is given
    #[serde(default = "default_history_limit")]
    history_limit: usize,

    /// Unreachable commits younger than this many days survive GC
    #[serde(default = "default_gc_retention_days")]
    gc_retention_days: i64,
}

fn default_snapshot_interval() -> i64 {
    10
}

fn default_agent_memory_limit() -> usize {
    80
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_history_limit() -> usize {
    50
}

fn default_gc_retention_days() -> i64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: default_snapshot_interval(),
            agent_memory_limit: default_agent_memory_limit(),
            default_branch: default_branch(),
            history_limit: default_history_limit(),
            gc_retention_days: default_gc_retention_days(),
        }
    }
}

impl StoreConfig {
    /// Load configuration with precedence: env > current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped if absent.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use palimpsest_core::StoreConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = StoreConfig::load()?;
    /// println!("snapshot every {} scenes", config.snapshot_interval());
    /// # Ok(())
    /// # }
    /// ```
    #[instrument]
    pub fn load() -> PalimpsestResult<Self> {
        debug!("Loading store configuration");

        const DEFAULT_CONFIG: &str = include_str!("../../../palimpsest.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/palimpsest/palimpsest.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("palimpsest").required(false))
            .add_source(Environment::with_prefix("PALIMPSEST"));

        Self::finish(builder)
    }

    /// Load configuration from a specific TOML file. Missing keys take their defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> PalimpsestResult<Self> {
        let builder = Config::builder().add_source(File::from(path.as_ref()));
        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> PalimpsestResult<Self> {
        let config: Self = builder
            .build()
            .map_err(|e| {
                PalimpsestError::from(ConfigError::new(ConfigErrorKind::Load(format!(
                    "build failed: {}",
                    e
                ))))
            })?
            .try_deserialize()
            .map_err(|e| {
                PalimpsestError::from(ConfigError::new(ConfigErrorKind::Load(format!(
                    "parse failed: {}",
                    e
                ))))
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the store cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot_interval <= 0 {
            return Err(ConfigError::invalid_setting("snapshot_interval", "must be positive"));
        }
        if self.agent_memory_limit == 0 {
            return Err(ConfigError::invalid_setting("agent_memory_limit", "must be positive"));
        }
        if self.default_branch.trim().is_empty() {
            return Err(ConfigError::invalid_setting("default_branch", "must not be empty"));
        }
        if self.gc_retention_days < 0 {
            return Err(ConfigError::invalid_setting("gc_retention_days", "must not be negative"));
        }
        Ok(())
    }

    /// True iff `scene_seq` is positive and a multiple of the snapshot interval.
    pub fn should_create_snapshot(&self, scene_seq: i64) -> bool {
        self.snapshot_interval > 0 && scene_seq > 0 && scene_seq % self.snapshot_interval == 0
    }
}
