//! Errors raised while persisting the graph to PostgreSQL.

/// Failures of the `graph_nodes`/`graph_edges` repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum DatabaseErrorKind {
    /// `DATABASE_URL` is absent from the environment
    #[display("DATABASE_URL is not set")]
    MissingUrl,
    /// The server refused or dropped the connection
    #[display("Could not connect to graph database: {}", _0)]
    Connect(String),
    /// No pooled connection could be checked out
    #[display("Graph connection pool unavailable: {}", _0)]
    Pool(String),
    /// Creating the graph tables failed
    #[display("Graph schema migration failed: {}", _0)]
    Migration(String),
    /// A statement against the graph tables failed
    #[display("Graph table query failed: {}", _0)]
    Query(String),
    /// A stored row could not be turned back into a record
    #[display("Row '{}' is malformed: {}", id, reason)]
    MalformedRow {
        /// Node or edge id of the row
        id: String,
        /// What was wrong with it
        reason: String,
    },
    /// An edge names a node that is in neither the batch nor `graph_nodes`
    #[display("Edge endpoint '{}' is not in graph_nodes", _0)]
    DanglingEndpoint(String),
    /// The blocking worker running the transaction panicked or was cancelled
    #[display("Graph database worker failed: {}", _0)]
    Worker(String),
}

/// Database error with source location tracking.
///
/// # Examples
///
/// ```
/// use palimpsest_error::{DatabaseError, DatabaseErrorKind};
///
/// let err = DatabaseError::new(DatabaseErrorKind::DanglingEndpoint("mara".to_string()));
/// assert!(err.to_string().contains("Edge endpoint 'mara' is not in graph_nodes"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Graph Database Error: {} at line {} in {}", kind, line, file)]
pub struct DatabaseError {
    /// The failed operation
    pub kind: DatabaseErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl DatabaseError {
    /// Create a new DatabaseError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DatabaseErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl From<diesel::result::Error> for DatabaseError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        DatabaseError::new(DatabaseErrorKind::Query(err.to_string()))
    }
}

impl From<diesel::ConnectionError> for DatabaseError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        DatabaseError::new(DatabaseErrorKind::Connect(err.to_string()))
    }
}
