//! Property graph substrate error types.

/// Conditions raised by the property graph and its repositories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum GraphErrorKind {
    /// Node or edge record is missing a required field
    #[display("Invalid graph record: {}", _0)]
    Validation(String),
    /// Referenced node does not exist
    #[display("Node not found: {}", _0)]
    NodeNotFound(String),
    /// Referenced edge does not exist
    #[display("Edge not found: {}", _0)]
    EdgeNotFound(String),
    /// Node id already present
    #[display("Duplicate node id: {}", _0)]
    DuplicateNode(String),
    /// Edge id already present
    #[display("Duplicate edge id: {}", _0)]
    DuplicateEdge(String),
    /// Node stored under a different label than requested
    #[display("Node '{}' has label '{}', expected '{}'", id, actual, expected)]
    LabelMismatch {
        /// Node id
        id: String,
        /// Label requested by the caller
        expected: String,
        /// Label stored in the graph
        actual: String,
    },
    /// Properties could not be converted to or from a typed record
    #[display("Property serialization error: {}", _0)]
    Serialization(String),
}

/// Property graph error with location tracking.
///
/// # Examples
///
/// ```
/// use palimpsest_error::{GraphError, GraphErrorKind};
///
/// let err = GraphError::new(GraphErrorKind::NodeNotFound("commit-1".to_string()));
/// assert!(format!("{}", err).contains("Node not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Graph Error: {} at line {} in {}", kind, line, file)]
pub struct GraphError {
    /// The kind of error that occurred
    pub kind: GraphErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl GraphError {
    /// Create a new graph error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GraphErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
