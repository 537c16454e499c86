//! Top-level error wrapper types.

use crate::{ConfigError, GraphError, StoreError, StoreErrorKind};
#[cfg(feature = "database")]
use crate::DatabaseError;

/// Union of every error the Palimpsest crates can raise.
///
/// # Examples
///
/// ```
/// use palimpsest_error::{PalimpsestError, StoreError, StoreErrorKind};
///
/// let store_err = StoreError::new(StoreErrorKind::Validation("expected_outcome".to_string()));
/// let err: PalimpsestError = store_err.into();
/// assert!(format!("{}", err).contains("Validation failed"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum PalimpsestErrorKind {
    /// Narrative store error
    #[from(StoreError)]
    Store(StoreError),
    /// Property graph error
    #[from(GraphError)]
    Graph(GraphError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Database error
    #[cfg(feature = "database")]
    #[from(DatabaseError)]
    Database(DatabaseError),
}

/// Palimpsest error with kind discrimination.
///
/// # Examples
///
/// ```
/// use palimpsest_error::{ConfigError, PalimpsestResult};
///
/// fn might_fail() -> PalimpsestResult<()> {
///     Err(ConfigError::invalid_setting("snapshot_interval", "must be positive"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Palimpsest Error: {}", _0)]
pub struct PalimpsestError(Box<PalimpsestErrorKind>);

impl PalimpsestError {
    /// Create a new error from a kind.
    pub fn new(kind: PalimpsestErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &PalimpsestErrorKind {
        &self.0
    }

    /// Store error kind, if this error was raised by the narrative store.
    pub fn store_kind(&self) -> Option<&StoreErrorKind> {
        match self.kind() {
            PalimpsestErrorKind::Store(err) => Some(&err.kind),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to PalimpsestErrorKind
impl<T> From<T> for PalimpsestError
where
    T: Into<PalimpsestErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Palimpsest operations.
///
/// # Examples
///
/// ```
/// use palimpsest_error::{PalimpsestResult, StoreError};
///
/// fn find_commit() -> PalimpsestResult<String> {
///     Err(StoreError::not_found("commit c-404"))?
/// }
/// ```
pub type PalimpsestResult<T> = std::result::Result<T, PalimpsestError>;
