//! Error types for the deployment engine.

use thiserror::Error;

use stratus_model::{
    ErrorCode, ErrorDetails, GraphError, OutputResourceKind, PointerError, Provider, ResourceType,
};

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for handler, secret client and transformer calls.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Result type alias for processor entry points.
pub type DeployResult<T> = Result<T, DeployError>;

/// Errors that can occur while deploying or deleting a resource.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unsupported resource kind: {0}")]
    UnsupportedResourceKind(String),

    #[error("Output resource kind '{0}' is not supported")]
    UnsupportedOutputResourceKind(ResourceType),

    #[error("Provider {provider} is not configured. Cannot support resource type {kind}")]
    UnsupportedProvider {
        provider: Provider,
        kind: OutputResourceKind,
    },

    #[error("Could not find a secret transformer for {0}")]
    MissingSecretTransformer(ResourceType),

    #[error("Renderer failed: {0}")]
    Render(#[from] RenderError),

    #[error("Failed to fetch dependency resource {id}: {source}")]
    Dependency {
        id: String,
        #[source]
        source: Box<EngineError>,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Handler failed for output resource '{local_id}': {source}")]
    Handler {
        local_id: String,
        #[source]
        source: HandlerError,
    },

    #[error("Output resource '{local_id}' does not have an identity. This is a bug in the handler")]
    HandlerContractViolation { local_id: String },

    #[error("Failed to process JSON pointer '{pointer}' for computed value '{name}': {source}")]
    ComputedValueResolution {
        name: String,
        pointer: String,
        #[source]
        source: PointerError,
    },

    #[error("Dependency graph error: {0}")]
    Graph(#[from] GraphError),

    #[error(
        "Cannot find an output resource matching localID '{local_id}' for resource {resource_id}"
    )]
    DanglingSecretReference {
        local_id: String,
        resource_id: String,
    },

    #[error("No credentials provided to fetch secrets")]
    NoCredentials,

    #[error("Failed to fetch secret '{name}' of resource {resource_id}: {source}")]
    SecretFetch {
        name: String,
        resource_id: String,
        #[source]
        source: HandlerError,
    },

    #[error("Failed to transform secret '{name}' of resource {resource_id}: {source}")]
    SecretTransform {
        name: String,
        resource_id: String,
        #[source]
        source: HandlerError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by a [`Store`](crate::store::Store).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Errors reported by resource handlers, secret clients and transformers.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors reported by renderers.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid resource definition: {0}")]
    InvalidDefinition(String),

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A failed deploy, delete or reconcile, classified for the operation record.
#[derive(Error, Debug)]
#[error("{code}: {source}")]
pub struct DeployError {
    pub code: ErrorCode,
    /// ID of the resource the call acted on.
    pub target: String,
    #[source]
    pub source: EngineError,
}

impl DeployError {
    pub fn new(code: ErrorCode, target: impl Into<String>, source: EngineError) -> Self {
        Self {
            code,
            target: target.into(),
            source,
        }
    }

    pub fn invalid(target: impl Into<String>, source: EngineError) -> Self {
        Self::new(ErrorCode::Invalid, target, source)
    }

    pub fn internal(target: impl Into<String>, source: EngineError) -> Self {
        Self::new(ErrorCode::Internal, target, source)
    }

    /// Structured form recorded on the failed operation.
    pub fn details(&self) -> ErrorDetails {
        ErrorDetails {
            code: self.code,
            message: self.source.to_string(),
            target: Some(self.target.clone()),
        }
    }
}
