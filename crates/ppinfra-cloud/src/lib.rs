//! ppinfra Cloud Declarations
//!
//! This crate provides the provider-neutral building blocks ppinfra uses to
//! declare cloud infrastructure: a deterministic resource graph, typed
//! cross-resource references, and the trait through which a graph is handed
//! to an external provisioning engine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  ppinfra CLI                     │
//! │           (render / preview / up)                │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                ppinfra-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │         Engine Abstraction                │   │
//! │  │  trait ProvisioningEngine { ... }         │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ResourceGraph │  │  Workspace   │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │    pulumi     │
//! │    engine     │
//! └───────────────┘
//! ```
//!
//! The engine owns diffing, ordering, retries and persisted state. This
//! crate only describes the desired end state.

pub mod engine;
pub mod error;
pub mod graph;
pub mod workspace;

// Re-exports
pub use engine::{AttributeSet, AuthStatus, ChangeSummary, Operation, ProvisioningEngine, SubmitResult};
pub use error::{CloudError, Result};
pub use graph::{
    OutputSegment, OutputSpec, PropertyValue, ProviderBinding, ResourceGraph, ResourceRef,
    ResourceSpec,
};
pub use workspace::{StateLock, Workspace, is_valid_stack_name};
