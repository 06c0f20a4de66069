//! Error types for the model crate.

use thiserror::Error;

/// Result type alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while parsing or validating model values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid resource id '{id}': {reason}")]
    InvalidResourceId { id: String, reason: String },

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Pointer(#[from] PointerError),
}

/// Errors raised by the dependency graph orderer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Dependency graph has missing references:\n  - {details}")]
    MissingReference { details: String },

    #[error("Missing localID for dependency of output resource '{key}'")]
    EmptyDependency { key: String },

    #[error("Missing localID for output resource at position {position}")]
    EmptyKey { position: usize },

    #[error("Duplicate localID in dependency graph: {0}")]
    DuplicateKey(String),

    #[error("Dependency cycle detected among: {members}")]
    Cycle { members: String },
}

impl GraphError {
    /// Whether the error describes a reference to a key outside the set.
    pub fn is_missing_reference(&self) -> bool {
        matches!(
            self,
            GraphError::MissingReference { .. } | GraphError::EmptyDependency { .. }
        )
    }
}

/// Errors raised while parsing or resolving a JSON pointer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("JSON pointer '{0}' must be empty or start with '/'")]
    InvalidSyntax(String),

    #[error("JSON pointer '{pointer}' contains an invalid escape in '{token}'")]
    InvalidEscape { pointer: String, token: String },

    #[error("JSON pointer '{pointer}': segment '{segment}' not found at depth {depth}")]
    MissingSegment {
        pointer: String,
        segment: String,
        depth: usize,
    },

    #[error("JSON pointer '{pointer}': cannot traverse into a scalar at segment '{segment}'")]
    NotTraversable { pointer: String, segment: String },

    #[error("JSON pointer '{pointer}': '{segment}' is not a valid array index")]
    InvalidIndex { pointer: String, segment: String },
}
