//! Concurrent ingestion of a repository tree into a [`RepoSnapshot`].

use crate::domain::{IngestError, RepoSnapshot};
use crate::infra::encoding::{self, processing_error_placeholder};
use futures::StreamExt;
use ignore::{DirEntry, WalkBuilder};
use std::path::{Component, Path, PathBuf};

/// Version-control metadata directory excluded from every walk.
const VCS_DIR: &str = ".git";

#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Maximum number of files resolved at the same time.
    pub concurrency: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(2, 8)
}

#[derive(Debug)]
struct FileEntry {
    absolute: PathBuf,
    relative: String,
}

/// Read and decode every file under `root`.
///
/// Each enumerated file contributes exactly one entry; read failures and
/// worker panics become placeholder strings rather than errors.
pub async fn ingest(root: &Path, options: &IngestOptions) -> Result<RepoSnapshot, IngestError> {
    if !root.is_dir() {
        return Err(IngestError::InvalidRoot(root.to_path_buf()));
    }

    let walk_root = root.to_path_buf();
    let files = tokio::task::spawn_blocking(move || collect_files(&walk_root))
        .await
        .map_err(|e| IngestError::Worker(e.to_string()))??;

    log::info!("Ingesting {} files from {}", files.len(), root.display());

    let entries: Vec<(String, String)> = futures::stream::iter(files)
        .map(|file| async move {
            let FileEntry { absolute, relative } = file;
            match tokio::task::spawn_blocking(move || read_and_resolve(&absolute)).await {
                Ok(content) => (relative, content),
                Err(e) => {
                    log::warn!("Resolution task for {relative} failed: {e}");
                    (relative, processing_error_placeholder(e))
                }
            }
        })
        .buffer_unordered(options.concurrency.max(1))
        .collect()
        .await;

    Ok(entries.into_iter().collect())
}

fn read_and_resolve(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => encoding::resolve(path, &bytes),
        Err(e) => {
            log::warn!("Error processing {}: {e}", path.display());
            processing_error_placeholder(e)
        }
    }
}

fn collect_files(root: &Path) -> Result<Vec<FileEntry>, IngestError> {
    std::fs::read_dir(root).map_err(|e| IngestError::Walk(format!("{}: {e}", root.display())))?;

    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .filter_entry(|entry| entry.file_name() != VCS_DIR);

    let mut files = Vec::new();
    for result in builder.build() {
        if let Some(file) = walk_entry(root, result)? {
            files.push(file);
        }
    }

    Ok(files)
}

/// Every non-directory entry is a file to resolve, including symlinks whose
/// target is missing; reading those yields a placeholder later.
fn walk_entry(
    root: &Path,
    result: Result<DirEntry, ignore::Error>,
) -> Result<Option<FileEntry>, IngestError> {
    let entry = result.map_err(|e| IngestError::Walk(e.to_string()))?;

    let Some(file_type) = entry.file_type() else {
        return Ok(None);
    };
    if file_type.is_dir() || (file_type.is_symlink() && entry.path().is_dir()) {
        return Ok(None);
    }

    let Some(relative) = relative_key(root, entry.path()) else {
        log::warn!("Skipping path outside root: {}", entry.path().display());
        return Ok(None);
    };
    Ok(Some(FileEntry {
        absolute: entry.into_path(),
        relative,
    }))
}

/// Forward-slash path of `path` relative to `root`.
fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::encoding::{BINARY_PLACEHOLDER, INVALID_NOTEBOOK_PLACEHOLDER};
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn ingests_every_file_with_relative_keys() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::write(root.join("README.md"), "# demo\n").unwrap();
        fs::write(root.join("src/lib.rs"), "pub fn f() {}\n").unwrap();
        fs::write(root.join("src/nested/empty.txt"), "").unwrap();
        fs::write(root.join("logo.png"), [0x89, b'P', b'N', b'G', 0, 0, 0, 0xFF]).unwrap();
        fs::write(root.join("nb.ipynb"), "{oops").unwrap();

        let snapshot = ingest(root, &IngestOptions { concurrency: 2 }).await.unwrap();

        assert_eq!(snapshot.len(), 5);
        assert_eq!(snapshot.get("README.md"), Some("# demo\n"));
        assert_eq!(snapshot.get("src/lib.rs"), Some("pub fn f() {}\n"));
        assert_eq!(snapshot.get("src/nested/empty.txt"), Some(""));
        assert_eq!(snapshot.get("logo.png"), Some(BINARY_PLACEHOLDER));
        assert_eq!(snapshot.get("nb.ipynb"), Some(INVALID_NOTEBOOK_PLACEHOLDER));
        assert!(snapshot.paths().all(|p| !p.starts_with('/') && !p.contains('\\')));
    }

    #[tokio::test]
    async fn skips_git_metadata_but_keeps_dotfiles() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::write(root.join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::write(root.join(".git/objects/ab"), "blob").unwrap();
        fs::write(root.join(".gitignore"), "target/\n").unwrap();
        fs::create_dir_all(root.join("target")).unwrap();
        fs::write(root.join("target/out.txt"), "built").unwrap();

        let snapshot = ingest(root, &IngestOptions::default()).await.unwrap();

        let paths: Vec<&str> = snapshot.paths().collect();
        assert_eq!(paths, vec![".gitignore", "target/out.txt"]);
    }

    #[tokio::test]
    async fn separate_runs_are_independent() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        fs::write(a.path().join("a.txt"), "a").unwrap();
        fs::write(b.path().join("b.txt"), "b").unwrap();

        let options = IngestOptions::default();
        let (left, right) = tokio::join!(ingest(a.path(), &options), ingest(b.path(), &options));

        assert_eq!(left.unwrap().paths().collect::<Vec<_>>(), vec!["a.txt"]);
        assert_eq!(right.unwrap().paths().collect::<Vec<_>>(), vec!["b.txt"]);
    }

    #[tokio::test]
    async fn missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = ingest(&missing, &IngestOptions::default()).await.unwrap_err();
        assert!(matches!(err, IngestError::InvalidRoot(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dangling_symlink_gets_processing_error_placeholder() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a.txt"), "a").unwrap();
        std::os::unix::fs::symlink(root.join("does/not/exist"), root.join("link.txt")).unwrap();

        let snapshot = ingest(root, &IngestOptions::default()).await.unwrap();

        assert_eq!(snapshot.paths().collect::<Vec<_>>(), vec!["a.txt", "link.txt"]);
        assert!(
            snapshot
                .get("link.txt")
                .unwrap()
                .starts_with("file processing error:")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_directory_is_not_an_entry() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("real")).unwrap();
        fs::write(root.join("real/f.txt"), "f").unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("alias")).unwrap();

        let snapshot = ingest(root, &IngestOptions::default()).await.unwrap();

        assert_eq!(snapshot.paths().collect::<Vec<_>>(), vec!["real/f.txt"]);
    }

    #[test]
    fn walk_error_below_root_is_fatal() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let result = walk_entry(Path::new("/tmp/repo"), Err(ignore::Error::Io(err)));
        assert!(matches!(result, Err(IngestError::Walk(msg)) if msg.contains("denied")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_subdirectory_fails_ingest() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let root = dir.path();
        let locked = root.join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("hidden.txt"), "x").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users read through mode 000; nothing to observe then.
        let readable = fs::read_dir(&locked).is_ok();
        let result = ingest(root, &IngestOptions::default()).await;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if !readable {
            assert!(matches!(result, Err(IngestError::Walk(_))));
        }
    }

    #[test]
    fn relative_key_uses_forward_slashes() {
        let root = Path::new("/tmp/repo");
        assert_eq!(
            relative_key(root, &root.join("a").join("b.rs")).as_deref(),
            Some("a/b.rs")
        );
        assert_eq!(relative_key(root, root), None);
    }
}
