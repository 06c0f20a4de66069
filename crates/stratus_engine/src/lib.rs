//! # stratus_engine
//!
//! Deployment engine for Stratus application resources.
//!
//! A resource is rendered into output resources, which are deployed through
//! their handlers in dependency order. The engine records what it deployed,
//! removes output resources a newer render no longer produces, and registers
//! deployed output resources for health monitoring.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stratus_engine::{
//!     ApplicationModel, DeploymentProcessor, EngineConfig, MemoryStore,
//!     ResourceDeploymentProcessor,
//! };
//!
//! let config = EngineConfig::default();
//! let (processor, health) = ResourceDeploymentProcessor::from_config(
//!     &config,
//!     Arc::new(model),
//!     Arc::new(MemoryStore::new()),
//!     None,
//! );
//! processor.deploy(&operation_id, &resource).await?;
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod mock;
pub mod processor;
pub mod registry;
pub mod renderer;
pub mod resolver;
pub mod secrets;
pub mod store;

pub use config::{EngineConfig, GcMode, LogFormat};
pub use error::{
    DeployError, DeployResult, EngineError, EngineResult, HandlerError, HandlerResult,
    RenderError, StoreError, StoreResult,
};
pub use handlers::{
    DefaultHealthHandler, DeleteOptions, HealthHandler, PutOptions, ResourceHandler,
    SecretValueClient, SecretValueTransformer,
};
pub use logging::init_logging;
pub use processor::{DeploymentProcessor, ResourceDeploymentProcessor};
pub use registry::{ApplicationModel, OutputResourceModel};
pub use renderer::{
    ComputedValueReference, RenderOptions, Renderer, RendererDependency, RendererOutput,
};
pub use resolver::DependencyResolver;
pub use secrets::SecretFetcher;
pub use store::{MemoryStore, Store};
