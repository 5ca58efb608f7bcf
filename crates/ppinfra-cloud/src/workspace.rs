//! Local engine workspace
//!
//! Manages `.ppinfra/<stack>/`, the directory an engine program is rendered
//! into before it is handed to the engine, and the lock that keeps two
//! invocations from rendering into it at the same time.

use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

const WORKSPACE_DIR: &str = ".ppinfra";
const BACKUP_SUFFIX: &str = "backup";
const LOCK_FILE: &str = "lock.json";
const STALE_LOCK_HOURS: i64 = 1;

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Whether `name` can be used as a stack directory under `.ppinfra/`
pub fn is_valid_stack_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
}

/// Per-stack workspace rooted in the project directory
pub struct Workspace {
    /// Project root directory
    project_root: PathBuf,

    /// Stack name
    stack: String,
}

impl Workspace {
    pub fn new(project_root: impl AsRef<Path>, stack: impl Into<String>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            stack: stack.into(),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// Directory the engine program for this stack lives in
    pub fn dir(&self) -> PathBuf {
        self.project_root.join(WORKSPACE_DIR).join(&self.stack)
    }

    fn lock_path(&self) -> PathBuf {
        self.dir().join(LOCK_FILE)
    }

    fn check_stack_name(&self) -> Result<()> {
        if is_valid_stack_name(&self.stack) {
            Ok(())
        } else {
            Err(CloudError::WorkspaceError(format!(
                "invalid stack name: {:?}",
                self.stack
            )))
        }
    }

    async fn ensure_dir(&self) -> Result<()> {
        self.check_stack_name()?;
        let dir = self.dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created workspace directory: {}", dir.display());
        }
        Ok(())
    }

    /// Write a file into the workspace, keeping the previous version as
    /// `<file_name>.backup`
    pub async fn write_file(&self, file_name: &str, content: &str) -> Result<PathBuf> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(CloudError::WorkspaceError(format!(
                "invalid workspace file name: {:?}",
                file_name
            )));
        }
        self.ensure_dir().await?;

        let path = self.dir().join(file_name);
        let backup = self.dir().join(format!("{}.{}", file_name, BACKUP_SUFFIX));

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Created backup of {}", file_name);
        }

        fs::write(&path, content).await?;
        tracing::debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Read a workspace file; `None` if it was never written
    pub async fn read_file(&self, file_name: &str) -> Result<Option<String>> {
        self.check_stack_name()?;
        let path = self.dir().join(file_name);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path).await?))
    }

    /// Acquire a lock for exclusive access
    ///
    /// A lock older than one hour, or one whose content cannot be read, is
    /// taken over.
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        self.ensure_dir().await?;

        let lock_path = self.lock_path();
        let lock_info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            acquired_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&lock_info)?;

        if !self.publish_lock(&lock_path, &content).await? {
            match fs::read_to_string(&lock_path).await {
                Ok(existing) => {
                    self.check_stale(&lock_path, &existing)?;
                    // Another process may have replaced it in the meantime
                    let current = fs::read_to_string(&lock_path).await.ok();
                    if current.as_deref() == Some(existing.as_str()) {
                        remove_if_exists(&lock_path).await?;
                    }
                }
                // Released between our attempt and the read
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }

            if !self.publish_lock(&lock_path, &content).await? {
                return Err(CloudError::LockError(format!(
                    "Stack {} was locked by another process while taking over a stale lock",
                    self.stack
                )));
            }
        }

        tracing::debug!("Acquired workspace lock for stack {}", self.stack);
        Ok(StateLock {
            lock_path,
            released: false,
        })
    }

    /// Create the lock file unless it already exists; `false` if it does
    ///
    /// The content is staged in a private file and hard-linked into place, so
    /// the lock never exists without its full content.
    async fn publish_lock(&self, lock_path: &Path, content: &str) -> Result<bool> {
        let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
        let staging = self
            .dir()
            .join(format!("{}.{}-{}.tmp", LOCK_FILE, std::process::id(), seq));
        fs::write(&staging, content).await?;

        let linked = fs::hard_link(&staging, lock_path).await;
        if let Err(e) = remove_if_exists(&staging).await {
            tracing::warn!("Failed to remove {}: {}", staging.display(), e);
        }

        match linked {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn check_stale(&self, lock_path: &Path, existing: &str) -> Result<()> {
        match serde_json::from_str::<LockInfo>(existing) {
            Ok(lock_info) => {
                let age = Utc::now().signed_duration_since(lock_info.acquired_at);
                if age.num_hours() < STALE_LOCK_HOURS {
                    return Err(CloudError::LockError(format!(
                        "Stack {} is locked by {} since {}",
                        self.stack, lock_info.holder, lock_info.acquired_at
                    )));
                }
                tracing::warn!("Removing stale lock from {}", lock_info.holder);
            }
            Err(e) => {
                tracing::warn!("Replacing unreadable lock {}: {}", lock_path.display(), e);
            }
        }
        Ok(())
    }
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Lock information
#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for the workspace lock
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    /// Release the lock
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released workspace lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            // Drop can't await; fall back to blocking removal
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_keeps_backup() {
        let temp_dir = tempdir().unwrap();
        let workspace = Workspace::new(temp_dir.path(), "dev");

        workspace.write_file("Pulumi.yaml", "first").await.unwrap();
        let path = workspace.write_file("Pulumi.yaml", "second").await.unwrap();

        assert!(path.ends_with(".ppinfra/dev/Pulumi.yaml"));
        assert_eq!(
            workspace.read_file("Pulumi.yaml").await.unwrap().as_deref(),
            Some("second")
        );
        assert_eq!(
            workspace
                .read_file("Pulumi.yaml.backup")
                .await
                .unwrap()
                .as_deref(),
            Some("first")
        );
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let temp_dir = tempdir().unwrap();
        let workspace = Workspace::new(temp_dir.path(), "prod");

        assert!(workspace.read_file("Pulumi.yaml").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_nested_file_name() {
        let temp_dir = tempdir().unwrap();
        let workspace = Workspace::new(temp_dir.path(), "dev");

        let result = workspace.write_file("../escape.yaml", "x").await;
        assert!(matches!(result, Err(CloudError::WorkspaceError(_))));
    }

    #[tokio::test]
    async fn test_lock_is_exclusive() {
        let temp_dir = tempdir().unwrap();
        let workspace = Workspace::new(temp_dir.path(), "dev");

        let lock = workspace.acquire_lock().await.unwrap();
        assert!(matches!(
            workspace.acquire_lock().await,
            Err(CloudError::LockError(_))
        ));

        lock.release().await.unwrap();
        let again = workspace.acquire_lock().await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_lock_released_on_drop() {
        let temp_dir = tempdir().unwrap();
        let workspace = Workspace::new(temp_dir.path(), "dev");

        {
            let _lock = workspace.acquire_lock().await.unwrap();
        }
        assert!(!workspace.lock_path().exists());
    }

    #[tokio::test]
    async fn test_stale_lock_is_replaced() {
        let temp_dir = tempdir().unwrap();
        let workspace = Workspace::new(temp_dir.path(), "dev");
        std::fs::create_dir_all(workspace.dir()).unwrap();

        let stale = LockInfo {
            holder: "old-host".to_string(),
            acquired_at: Utc::now() - chrono::Duration::hours(2),
        };
        std::fs::write(
            workspace.lock_path(),
            serde_json::to_string(&stale).unwrap(),
        )
        .unwrap();

        assert!(workspace.acquire_lock().await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_acquire_has_single_winner() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path().to_path_buf();

        for _ in 0..100 {
            let a = tokio::spawn({
                let root = root.clone();
                async move { Workspace::new(root, "dev").acquire_lock().await }
            });
            let b = tokio::spawn({
                let root = root.clone();
                async move { Workspace::new(root, "dev").acquire_lock().await }
            });
            let (a, b) = (a.await.unwrap(), b.await.unwrap());

            assert!(
                a.is_ok() != b.is_ok(),
                "exactly one caller must hold the lock"
            );
            let loser = if a.is_ok() { &b } else { &a };
            assert!(matches!(loser, Err(CloudError::LockError(_))));
            // the winner's guard drops here and releases the lock
        }

        let leftovers: Vec<_> = std::fs::read_dir(Workspace::new(&root, "dev").dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert!(leftovers.is_empty(), "{:?}", leftovers);
    }

    #[tokio::test]
    async fn test_unreadable_lock_is_replaced() {
        let temp_dir = tempdir().unwrap();
        let workspace = Workspace::new(temp_dir.path(), "dev");
        std::fs::create_dir_all(workspace.dir()).unwrap();
        std::fs::write(workspace.lock_path(), "").unwrap();

        let lock = workspace.acquire_lock().await.unwrap();
        let content = std::fs::read_to_string(workspace.lock_path()).unwrap();
        assert!(serde_json::from_str::<LockInfo>(&content).is_ok());
        lock.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_fresh_lock_is_kept() {
        let temp_dir = tempdir().unwrap();
        let workspace = Workspace::new(temp_dir.path(), "dev");

        let _held = workspace.acquire_lock().await.unwrap();
        let before = std::fs::read_to_string(workspace.lock_path()).unwrap();

        assert!(workspace.acquire_lock().await.is_err());
        let after = std::fs::read_to_string(workspace.lock_path()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_stack_name_validation() {
        assert!(is_valid_stack_name("dev"));
        assert!(is_valid_stack_name("prod-eu.1"));
        assert!(!is_valid_stack_name(""));
        assert!(!is_valid_stack_name("../../x"));
        assert!(!is_valid_stack_name("a/b"));
        assert!(!is_valid_stack_name("a\\b"));
        assert!(!is_valid_stack_name(".."));
    }

    #[tokio::test]
    async fn test_traversing_stack_name_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let project = temp_dir.path().join("project");
        std::fs::create_dir(&project).unwrap();
        let workspace = Workspace::new(&project, "../../x");

        assert!(matches!(
            workspace.write_file("Pulumi.yaml", "x").await,
            Err(CloudError::WorkspaceError(_))
        ));
        assert!(matches!(
            workspace.acquire_lock().await,
            Err(CloudError::WorkspaceError(_))
        ));
        assert!(matches!(
            workspace.read_file("Pulumi.yaml").await,
            Err(CloudError::WorkspaceError(_))
        ));
        assert!(!temp_dir.path().join("x").exists());
    }
}
