//! # stratus_model
//!
//! Data model shared by the Stratus deployment engine:
//!
//! - Resource identifiers and resource/output resource kinds
//! - Persisted resources, output resources and their platform identities
//! - Dependency graph ordering and garbage collection of stale output resources
//! - Operation records and JSON pointer extraction

pub mod error;
pub mod graph;
pub mod id;
pub mod identity;
pub mod kinds;
pub mod operation;
pub mod output_resource;
pub mod pointer;
pub mod resource;
pub mod secret;

pub use error::{GraphError, ModelError, ModelResult, PointerError};
pub use graph::{order, DependencyItem};
pub use id::ResourceId;
pub use identity::{ArmIdentity, KubernetesIdentity, ResourceIdentity, UcpIdentity};
pub use kinds::{OutputResourceKind, Provider, ResourceKind, ResourceType};
pub use operation::{ErrorCode, ErrorDetails, Operation, OperationStatus};
pub use output_resource::{
    gc_output_resources, order_output_resources, Dependency, HealthState, OutputResource,
    OutputResourceStatus, ProvisioningState,
};
pub use pointer::JsonPointer;
pub use resource::{Resource, ResourceStatus};
pub use secret::SecretValueReference;
