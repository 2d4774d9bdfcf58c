//! Domain error types for RepoChat.
//!
//! Only failures that invalidate a whole operation live here. Per-file
//! decoding problems and unparsable model output never surface as errors;
//! they degrade to placeholder text instead.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating a repository URL.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepoUrlError {
    #[error("Invalid GitHub URL format: {0}")]
    InvalidFormat(String),
}

/// Errors raised by a source retriever while materializing a repository.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Branch '{branch}' does not exist in {url}")]
    BranchNotFound { url: String, branch: String },

    #[error("Remote repository is unreachable: {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("Could not find 'git' executable")]
    GitNotFound,

    #[error("Cloning failed: {0}")]
    CloneFailed(String),

    #[error("Retrieval I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while removing a local checkout.
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("Failed to delete directory after {attempts} attempts: {path}: {last_error}")]
    Exhausted {
        path: PathBuf,
        attempts: u32,
        last_error: String,
    },
}

/// Errors that abort a whole ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Repository root is not a directory: {0}")]
    InvalidRoot(PathBuf),

    #[error("Failed to walk repository tree: {0}")]
    Walk(String),

    #[error("Ingestion worker failed: {0}")]
    Worker(String),
}

/// Errors raised while assembling a prompt.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Change analysis requires a reference snapshot")]
    MissingReference,

    #[error("Prompt rendering failed: {0}")]
    Render(#[from] anyhow::Error),
}

/// Errors surfaced by session operations.
///
/// Every variant carries a human-readable cause so front ends can show it
/// as a blocking message.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    InvalidUrl(#[from] RepoUrlError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Cleanup(#[from] CleanupError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("No repository loaded")]
    NoRepository,

    #[error("Chat transport failed: {0}")]
    Transport(String),
}
