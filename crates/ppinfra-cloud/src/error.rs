//! Cloud declaration error types

use thiserror::Error;

/// Errors raised while declaring or submitting a resource graph
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Engine not available: {0}")]
    EngineNotFound(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Duplicate resource name: {0}")]
    DuplicateResource(String),

    #[error("Invalid resource graph: {0}")]
    InvalidGraph(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Engine error: {0}")]
    EngineError(String),

    #[error("Workspace error: {0}")]
    WorkspaceError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
