//! Pulumi engine for ppinfra
//!
//! This crate implements the ProvisioningEngine trait on top of the pulumi
//! CLI. The resource graph is rendered as a Pulumi YAML program, so no
//! language SDK is involved; pulumi does the diffing, ordering and state
//! bookkeeping.
//!
//! # Requirements
//!
//! - `pulumi` CLI must be installed and logged in (`pulumi login`)
//! - AWS credentials must be available to the pulumi AWS provider
//!   (environment, profile, or an ESC environment attached to the stack)
//!
//! # Example
//!
//! ```ignore
//! use ppinfra_cloud::ProvisioningEngine;
//! use ppinfra_pulumi::PulumiEngine;
//!
//! let engine = PulumiEngine::new(".", "dev");
//!
//! let auth = engine.check_auth().await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//!
//! let result = engine.submit(&graph).await?;
//! println!("{}", result.summary);
//! ```

pub mod error;
pub mod program;
pub mod provider;
pub mod pulumi;

pub use error::{PulumiError, Result};
pub use program::{PROGRAM_FILE, RenderOptions, render_program, to_yaml};
pub use provider::PulumiEngine;
pub use pulumi::{Pulumi, PulumiAuth, parse_change_summary, parse_stack_export};
