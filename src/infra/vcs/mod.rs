//! Version-control collaborators: repository URL handling and retrieval.

pub mod github;
pub mod traits;

pub use github::{GitCliRetriever, RepoUrl, is_valid_repo_url};
pub use traits::SourceRetriever;
