//! Pulumi adapter error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PulumiError {
    #[error("pulumi not found. Please install: https://www.pulumi.com/docs/install/")]
    PulumiNotFound,

    #[error("pulumi is not logged in: {0}")]
    AuthenticationFailed(String),

    #[error("pulumi command failed: {0}")]
    CommandFailed(String),

    #[error("Unexpected pulumi output: {0}")]
    UnexpectedOutput(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Cloud error: {0}")]
    CloudError(#[from] ppinfra_cloud::CloudError),
}

pub type Result<T> = std::result::Result<T, PulumiError>;
