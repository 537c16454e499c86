//! Narrative store error types.

/// Conditions raised by narrative store operations.
///
/// `InvariantViolation` signals corrupted state and is never recovered
/// inside the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StoreErrorKind {
    /// Missing root, branch, commit, scene, entity or registry record
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// Missing required fields or malformed input
    #[display("Validation failed: {}", _0)]
    Validation(String),
    /// Optimistic lock mismatch on a branch head
    #[display(
        "Concurrency conflict on branch '{}': expected head version {}, found {}",
        branch,
        expected,
        actual
    )]
    ConcurrencyConflict {
        /// Branch whose head moved
        branch: String,
        /// Version supplied by the caller
        expected: u64,
        /// Version currently stored
        actual: u64,
    },
    /// Record with the same key already exists
    #[display("Already exists: {}", _0)]
    AlreadyExists(String),
    /// Anchor was already marked achieved
    #[display("Anchor already achieved: {}", _0)]
    AlreadyAchieved(String),
    /// Stored state breaks a structural or temporal invariant
    #[display("Invariant violation: {}", _0)]
    InvariantViolation(String),
    /// Parent head is not an ancestor of the child head
    #[display(
        "Branch '{}' cannot be fast-forwarded into '{}'",
        branch,
        parent
    )]
    NotFastForwardable {
        /// Branch being merged
        branch: String,
        /// Branch that would receive the merge
        parent: String,
    },
    /// Sequence number already used within its parent
    #[display("Duplicate sequence {} in {}", sequence, scope)]
    DuplicateSequence {
        /// Parent that owns the sequence space
        scope: String,
        /// Offending sequence value
        sequence: i64,
    },
    /// Lifecycle transition not permitted from the current state
    #[display("Invalid state transition from '{}' to '{}'", from, to)]
    InvalidStateTransition {
        /// Current state
        from: String,
        /// Requested state
        to: String,
    },
}

/// Narrative store error with location tracking.
///
/// # Examples
///
/// ```
/// use palimpsest_error::{StoreError, StoreErrorKind};
///
/// let err = StoreError::new(StoreErrorKind::NotFound("scene s-1".to_string()));
/// assert!(format!("{}", err).contains("Not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    /// The kind of error that occurred
    pub kind: StoreErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StoreError {
    /// Create a new store error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a [`StoreErrorKind::NotFound`] error.
    #[track_caller]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound(what.into()))
    }

    /// Shorthand for a [`StoreErrorKind::Validation`] error.
    #[track_caller]
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Validation(reason.into()))
    }

    /// Shorthand for a [`StoreErrorKind::InvariantViolation`] error.
    #[track_caller]
    pub fn invariant(reason: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::InvariantViolation(reason.into()))
    }
}
