//! Store configuration and logging setup errors.

/// What went wrong while configuring the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ConfigErrorKind {
    /// A setting holds a value the store cannot run with
    #[display("Setting '{}' {}", key, reason)]
    InvalidSetting {
        /// Configuration key, e.g. `snapshot_interval`
        key: String,
        /// What the value must satisfy
        reason: String,
    },
    /// Layered sources could not be read or deserialized
    #[display("Could not load store configuration: {}", _0)]
    Load(String),
    /// Log filter or subscriber setup failed
    #[display("Could not set up logging: {}", _0)]
    Logging(String),
}

/// Configuration error carrying the location that raised it.
///
/// # Examples
///
/// ```
/// use palimpsest_error::{ConfigError, ConfigErrorKind};
///
/// let err = ConfigError::invalid_setting("snapshot_interval", "must be positive");
/// assert!(matches!(err.kind, ConfigErrorKind::InvalidSetting { .. }));
/// assert!(err.to_string().contains("Setting 'snapshot_interval' must be positive"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Config Error: {} at line {} in {}", kind, line, file)]
pub struct ConfigError {
    /// The failed condition
    pub kind: ConfigErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Wrap `kind` with the caller's location.
    #[track_caller]
    pub fn new(kind: ConfigErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for [`ConfigErrorKind::InvalidSetting`].
    #[track_caller]
    pub fn invalid_setting(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::InvalidSetting {
            key: key.into(),
            reason: reason.into(),
        })
    }
}
