//! Removal of local checkouts with bounded retry.
//!
//! Transient lock and permission errors (common on Windows, or with read-only
//! git objects) are retried with exponential backoff. Once the attempts run
//! out the caller gets [`CleanupError::Exhausted`].

use crate::domain::CleanupError;
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 4_000,
        }
    }
}

pub async fn remove_dir_with_retry(path: &Path, policy: &RetryPolicy) -> Result<(), CleanupError> {
    let attempts = policy.attempts.max(1);
    let max_backoff = Duration::from_millis(policy.max_backoff_ms);
    let mut backoff = Duration::from_millis(policy.initial_backoff_ms).min(max_backoff);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => {
                log::info!("Successfully deleted: {}", path.display());
                return Ok(());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                log::warn!(
                    "Error deleting directory {} (attempt {attempt}/{attempts}): {e}",
                    path.display()
                );
                if e.kind() == ErrorKind::PermissionDenied {
                    make_writable(path).await;
                }
                last_error = e.to_string();
            }
        }

        if attempt < attempts {
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(max_backoff);
        }
    }

    Err(CleanupError::Exhausted {
        path: path.to_path_buf(),
        attempts,
        last_error,
    })
}

async fn make_writable(path: &Path) {
    let root = path.to_path_buf();
    if let Err(e) = tokio::task::spawn_blocking(move || clear_readonly(&root)).await {
        log::debug!("Clearing read-only flags under {} failed: {e}", path.display());
    }
}

#[allow(clippy::permissions_set_readonly_false)]
fn clear_readonly(root: &Path) {
    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(false);
    for entry in builder.build().flatten() {
        let Ok(metadata) = entry.path().symlink_metadata() else {
            continue;
        };
        let mut permissions = metadata.permissions();
        if permissions.readonly() {
            permissions.set_readonly(false);
            if let Err(e) = std::fs::set_permissions(entry.path(), permissions) {
                log::debug!("Could not make {} writable: {e}", entry.path().display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
        }
    }

    #[tokio::test]
    async fn removes_nested_directory() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("clone");
        fs::create_dir_all(target.join("a/b")).unwrap();
        fs::write(target.join("a/b/file.txt"), "x").unwrap();

        remove_dir_with_retry(&target, &fast_policy(3)).await.unwrap();
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn missing_path_is_success() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("never-created");
        remove_dir_with_retry(&missing, &fast_policy(1)).await.unwrap();
    }

    #[tokio::test]
    async fn make_writable_clears_readonly_files() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("objects/pack.idx");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "x").unwrap();
        let mut permissions = fs::metadata(&file).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&file, permissions).unwrap();

        make_writable(dir.path()).await;

        assert!(!fs::metadata(&file).unwrap().permissions().readonly());
        remove_dir_with_retry(dir.path(), &fast_policy(1)).await.unwrap();
    }

    #[tokio::test]
    async fn gives_up_after_bounded_attempts() {
        let dir = tempdir().unwrap();
        let not_a_dir = dir.path().join("plain.txt");
        fs::write(&not_a_dir, "x").unwrap();

        let err = remove_dir_with_retry(&not_a_dir, &fast_policy(2))
            .await
            .unwrap_err();
        match err {
            CleanupError::Exhausted { path, attempts, .. } => {
                assert_eq!(path, not_a_dir);
                assert_eq!(attempts, 2);
            }
        }
    }
}
