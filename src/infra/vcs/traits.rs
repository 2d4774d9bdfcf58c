use crate::domain::RetrievalError;
use crate::infra::vcs::github::RepoUrl;
use async_trait::async_trait;
use std::path::Path;

/// Materializes a repository's file tree at a local path.
///
/// Implementations must report a malformed reference, an unreachable remote
/// and a missing branch as distinguishable [`RetrievalError`] variants.
#[async_trait]
pub trait SourceRetriever: Send + Sync {
    async fn retrieve(&self, url: &RepoUrl, dest: &Path) -> Result<(), RetrievalError>;
}
