//! Provisioning engine trait definition

use crate::error::Result;
use crate::graph::{ResourceGraph, ResourceRef};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// External provisioning engine abstraction
///
/// The engine receives a complete resource graph, diffs it against the state
/// it persisted on previous runs, and performs the provider calls. Ordering,
/// retries and state locking all happen on the engine side.
#[async_trait]
pub trait ProvisioningEngine: Send + Sync {
    /// Returns the engine name (e.g., "pulumi")
    fn name(&self) -> &str;

    /// Returns the engine display name for UI
    fn display_name(&self) -> &str;

    /// Check if the engine is installed and logged in
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Ask the engine what submitting the graph would change
    async fn preview(&self, graph: &ResourceGraph) -> Result<SubmitResult>;

    /// Submit the graph and let the engine reconcile real resources with it
    async fn submit(&self, graph: &ResourceGraph) -> Result<SubmitResult>;

    /// Attribute values of the resources the engine currently manages
    async fn attributes(&self) -> Result<AttributeSet>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

/// Kind of engine run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Preview,
    Update,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Preview => write!(f, "preview"),
            Operation::Update => write!(f, "update"),
        }
    }
}

/// Result of a preview or update run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResult {
    /// What was run
    pub operation: Operation,

    /// Stack the run targeted
    pub stack: String,

    /// Resource changes reported by the engine
    pub summary: ChangeSummary,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl SubmitResult {
    pub fn new(operation: Operation, stack: impl Into<String>) -> Self {
        Self {
            operation,
            stack: stack.into(),
            summary: ChangeSummary::default(),
            duration_ms: 0,
        }
    }
}

/// Counts of resource changes, keyed the way engines usually report them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
    pub same: usize,
}

impl ChangeSummary {
    /// Build from an engine's `{"create": 3, "same": 2, ...}` map; unknown
    /// keys are ignored
    pub fn from_counts(counts: &BTreeMap<String, usize>) -> Self {
        let get = |key: &str| counts.get(key).copied().unwrap_or(0);
        Self {
            create: get("create"),
            update: get("update"),
            replace: get("replace"),
            delete: get("delete"),
            same: get("same"),
        }
    }

    pub fn has_changes(&self) -> bool {
        self.create + self.update + self.replace + self.delete > 0
    }
}

impl std::fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to replace, {} to delete, {} unchanged",
            self.create, self.update, self.replace, self.delete, self.same
        )
    }
}

/// Attribute values reported by the engine, indexed by resource then attribute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSet {
    pub resources: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        resource: impl Into<String>,
        attribute: impl Into<String>,
        value: serde_json::Value,
    ) {
        self.resources
            .entry(resource.into())
            .or_default()
            .insert(attribute.into(), value);
    }

    pub fn with(
        mut self,
        resource: impl Into<String>,
        attribute: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.insert(resource, attribute, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Scalar attribute rendered as a string; `None` for missing, null or
    /// structured values
    pub fn get(&self, reference: &ResourceRef) -> Option<String> {
        let value = self
            .resources
            .get(&reference.resource)?
            .get(&reference.attribute)?;
        match value {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}
