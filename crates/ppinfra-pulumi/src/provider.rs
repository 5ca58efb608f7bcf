//! Pulumi engine implementation

use crate::error::PulumiError;
use crate::program::{self, PROGRAM_FILE, RenderOptions};
use crate::pulumi::Pulumi;
use async_trait::async_trait;
use ppinfra_cloud::{
    AttributeSet, AuthStatus, CloudError, Operation, ProvisioningEngine, ResourceGraph,
    SubmitResult, Workspace,
};
use std::path::{Path, PathBuf};

/// Pulumi engine
///
/// Renders the graph into `.ppinfra/<stack>/Pulumi.yaml` and drives the
/// pulumi CLI from that directory.
pub struct PulumiEngine {
    pulumi: Pulumi,
    workspace: Workspace,
    description: Option<String>,
}

impl PulumiEngine {
    pub fn new(project_root: impl AsRef<Path>, stack: impl Into<String>) -> Self {
        let stack = stack.into();
        let workspace = Workspace::new(project_root, stack.clone());
        Self {
            pulumi: Pulumi::new(workspace.dir(), stack),
            workspace,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.pulumi = self.pulumi.with_binary(binary);
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            base_dir: Some(self.workspace.project_root().to_path_buf()),
            description: self.description.clone(),
        }
    }

    /// Render the program into the workspace without running pulumi
    pub async fn write_program(&self, graph: &ResourceGraph) -> ppinfra_cloud::Result<PathBuf> {
        graph.validate()?;
        let yaml = program::to_yaml(graph, &self.render_options()).map_err(to_cloud_error)?;
        self.workspace.write_file(PROGRAM_FILE, &yaml).await
    }

    async fn run(&self, graph: &ResourceGraph, operation: Operation) -> ppinfra_cloud::Result<SubmitResult> {
        let lock = self.workspace.acquire_lock().await?;
        let start = std::time::Instant::now();

        let path = self.write_program(graph).await?;
        tracing::info!("Rendered {} resources into {}", graph.len(), path.display());

        self.pulumi.select_stack().await.map_err(to_cloud_error)?;

        let summary = match operation {
            Operation::Preview => self.pulumi.preview().await,
            Operation::Update => self.pulumi.up().await,
        }
        .map_err(to_cloud_error)?;

        lock.release().await?;

        let mut result = SubmitResult::new(operation, self.pulumi.stack());
        result.summary = summary;
        result.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!("pulumi {} finished: {}", operation, result.summary);
        Ok(result)
    }
}

fn to_cloud_error(e: PulumiError) -> CloudError {
    match e {
        PulumiError::PulumiNotFound => CloudError::EngineNotFound(e.to_string()),
        PulumiError::AuthenticationFailed(msg) => CloudError::AuthenticationFailed(msg),
        PulumiError::CloudError(inner) => inner,
        other => CloudError::EngineError(other.to_string()),
    }
}

#[async_trait]
impl ProvisioningEngine for PulumiEngine {
    fn name(&self) -> &str {
        "pulumi"
    }

    fn display_name(&self) -> &str {
        "Pulumi"
    }

    async fn check_auth(&self) -> ppinfra_cloud::Result<AuthStatus> {
        match self.pulumi.check_auth().await {
            Ok(auth) => {
                let account_info = match auth.url {
                    Some(url) => format!("{} ({})", auth.user, url),
                    None => auth.user,
                };
                Ok(AuthStatus::ok(account_info))
            }
            Err(PulumiError::PulumiNotFound) => {
                Ok(AuthStatus::failed("pulumi is not installed"))
            }
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    async fn preview(&self, graph: &ResourceGraph) -> ppinfra_cloud::Result<SubmitResult> {
        self.run(graph, Operation::Preview).await
    }

    async fn submit(&self, graph: &ResourceGraph) -> ppinfra_cloud::Result<SubmitResult> {
        self.run(graph, Operation::Update).await
    }

    async fn attributes(&self) -> ppinfra_cloud::Result<AttributeSet> {
        if self.workspace.read_file(PROGRAM_FILE).await?.is_none() {
            return Err(CloudError::WorkspaceError(format!(
                "stack {} has not been rendered yet; run `ppinfra up` first",
                self.workspace.stack()
            )));
        }
        self.pulumi.export().await.map_err(to_cloud_error)
    }
}
