//! pulumi CLI wrapper
//!
//! Wraps the pulumi CLI commands ppinfra needs: login check, stack selection,
//! preview, update and state export.

use crate::error::{PulumiError, Result};
use ppinfra_cloud::{AttributeSet, ChangeSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// pulumi CLI wrapper bound to one program directory and stack
pub struct Pulumi {
    binary: String,
    work_dir: PathBuf,
    stack: String,
}

impl Pulumi {
    pub fn new(work_dir: impl AsRef<Path>, stack: impl Into<String>) -> Self {
        Self {
            binary: "pulumi".to_string(),
            work_dir: work_dir.as_ref().to_path_buf(),
            stack: stack.into(),
        }
    }

    /// Use a different executable (e.g. a pinned install path)
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// Check if pulumi is installed and logged in
    pub async fn check_auth(&self) -> Result<PulumiAuth> {
        let which = Command::new("which").arg(&self.binary).output().await?;

        if !which.status.success() {
            return Err(PulumiError::PulumiNotFound);
        }

        let output = self
            .run_command(&["whoami", "--json"])
            .await
            .map_err(|e| match e {
                PulumiError::CommandFailed(msg) => PulumiError::AuthenticationFailed(msg),
                other => other,
            })?;

        let auth: PulumiAuth = serde_json::from_str(&output)?;
        Ok(auth)
    }

    /// Run a pulumi command in the program directory and return stdout
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);
        cmd.current_dir(&self.work_dir);
        cmd.env("PULUMI_SKIP_UPDATE_CHECK", "true");
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: {} {}", self.binary, args.join(" "));

        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let message = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(PulumiError::CommandFailed(message.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Select the stack, creating it on first use
    pub async fn select_stack(&self) -> Result<()> {
        self.run_command(&["stack", "select", "--create", &self.stack])
            .await?;
        Ok(())
    }

    /// Preview the changes an update would make
    pub async fn preview(&self) -> Result<ChangeSummary> {
        let output = self
            .run_command(&[
                "preview",
                "--json",
                "--non-interactive",
                "--stack",
                &self.stack,
            ])
            .await?;
        parse_change_summary(&output)
    }

    /// Run an update without the interactive confirmation
    pub async fn up(&self) -> Result<ChangeSummary> {
        let output = self
            .run_command(&[
                "up",
                "--yes",
                "--json",
                "--skip-preview",
                "--non-interactive",
                "--stack",
                &self.stack,
            ])
            .await?;
        parse_change_summary(&output)
    }

    /// Export the stack's checkpoint and collect resource outputs
    pub async fn export(&self) -> Result<AttributeSet> {
        let output = self
            .run_command(&["stack", "export", "--stack", &self.stack])
            .await?;
        parse_stack_export(&output)
    }
}

/// `pulumi whoami --json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulumiAuth {
    pub user: String,
    #[serde(default)]
    pub organizations: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunReport {
    #[serde(default)]
    change_summary: Option<BTreeMap<String, usize>>,
}

/// Read `changeSummary` from `pulumi preview --json` / `pulumi up --json`
pub fn parse_change_summary(output: &str) -> Result<ChangeSummary> {
    let report: RunReport = serde_json::from_str(output)?;
    match report.change_summary {
        Some(counts) => Ok(ChangeSummary::from_counts(&counts)),
        None => {
            tracing::warn!("pulumi output has no changeSummary");
            Ok(ChangeSummary::default())
        }
    }
}

#[derive(Debug, Deserialize)]
struct StackExport {
    deployment: Deployment,
}

#[derive(Debug, Deserialize)]
struct Deployment {
    #[serde(default)]
    resources: Vec<ExportedResource>,
}

#[derive(Debug, Deserialize)]
struct ExportedResource {
    urn: String,
    #[serde(rename = "type")]
    type_token: String,
    #[serde(default)]
    outputs: BTreeMap<String, serde_json::Value>,
}

/// Collect outputs of the program's own resources from `pulumi stack export`
///
/// The stack itself, providers, and resources nested inside components are
/// skipped; only direct declarations are addressable by logical name.
pub fn parse_stack_export(output: &str) -> Result<AttributeSet> {
    let export: StackExport = serde_json::from_str(output)?;
    let mut attributes = AttributeSet::new();

    for resource in export.deployment.resources {
        if resource.type_token.starts_with("pulumi:") {
            continue;
        }
        let Some((qualified_type, name)) = split_urn(&resource.urn) else {
            return Err(PulumiError::UnexpectedOutput(format!(
                "malformed URN: {}",
                resource.urn
            )));
        };
        if qualified_type.contains('$') {
            continue;
        }
        for (attribute, value) in resource.outputs {
            attributes.insert(name, attribute, value);
        }
    }

    Ok(attributes)
}

// urn:pulumi:<stack>::<project>::<qualified type>::<name>
fn split_urn(urn: &str) -> Option<(&str, &str)> {
    let mut parts = urn.splitn(4, "::");
    let _stack = parts.next()?;
    let _project = parts.next()?;
    let qualified_type = parts.next()?;
    let name = parts.next()?;
    Some((qualified_type, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppinfra_cloud::ResourceRef;

    #[test]
    fn test_parse_change_summary() {
        let output = r#"{
            "steps": [],
            "changeSummary": {"create": 7, "same": 1}
        }"#;
        let summary = parse_change_summary(output).unwrap();
        assert_eq!(summary.create, 7);
        assert_eq!(summary.same, 1);
    }

    #[test]
    fn test_parse_change_summary_missing() {
        let summary = parse_change_summary(r#"{"steps": []}"#).unwrap();
        assert_eq!(summary, ChangeSummary::default());
    }

    #[test]
    fn test_parse_change_summary_invalid_json() {
        assert!(matches!(
            parse_change_summary("Previewing update (dev)"),
            Err(PulumiError::JsonError(_))
        ));
    }

    #[test]
    fn test_parse_stack_export() {
        let output = r#"{
            "version": 3,
            "deployment": {
                "resources": [
                    {
                        "urn": "urn:pulumi:dev::ppinfra::pulumi:pulumi:Stack::ppinfra-dev",
                        "type": "pulumi:pulumi:Stack"
                    },
                    {
                        "urn": "urn:pulumi:dev::ppinfra::pulumi:providers:aws::escAwsProvider",
                        "type": "pulumi:providers:aws",
                        "outputs": {"region": "us-east-1"}
                    },
                    {
                        "urn": "urn:pulumi:dev::ppinfra::aws:s3/bucketWebsiteConfigurationV2:BucketWebsiteConfigurationV2::bucketWebsite",
                        "type": "aws:s3/bucketWebsiteConfigurationV2:BucketWebsiteConfigurationV2",
                        "outputs": {"websiteEndpoint": "bucket-1234.s3-website-us-east-1.amazonaws.com"}
                    },
                    {
                        "urn": "urn:pulumi:dev::ppinfra::synced-folder:index:S3BucketFolder$aws:s3/bucketObject:BucketObject::index.html",
                        "type": "aws:s3/bucketObject:BucketObject",
                        "outputs": {"key": "index.html"}
                    }
                ]
            }
        }"#;

        let attributes = parse_stack_export(output).unwrap();
        assert_eq!(
            attributes
                .get(&ResourceRef::new("bucketWebsite", "websiteEndpoint"))
                .as_deref(),
            Some("bucket-1234.s3-website-us-east-1.amazonaws.com")
        );
        assert!(attributes.get(&ResourceRef::new("escAwsProvider", "region")).is_none());
        assert!(attributes.get(&ResourceRef::new("index.html", "key")).is_none());
    }

    #[test]
    fn test_parse_stack_export_empty_stack() {
        let output = r#"{"version": 3, "deployment": {"manifest": {}}}"#;
        let attributes = parse_stack_export(output).unwrap();
        assert!(attributes.is_empty());
    }

    #[test]
    fn test_parse_stack_export_malformed_urn() {
        let output = r#"{"deployment": {"resources": [{"urn": "bucket", "type": "aws:s3:BucketV2"}]}}"#;
        assert!(matches!(
            parse_stack_export(output),
            Err(PulumiError::UnexpectedOutput(_))
        ));
    }
}
