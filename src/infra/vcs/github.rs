use crate::domain::{RepoUrlError, RetrievalError};
use crate::infra::vcs::traits::SourceRetriever;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use tokio::process::Command;

lazy_static! {
    static ref GH_REPO_URL_RE: Regex = Regex::new(
        r"^https://github\.com/([a-zA-Z0-9_.-]+)/([a-zA-Z0-9_.-]+)(?:/tree/([a-zA-Z0-9_.-]+))?/?$"
    )
    .expect("github repo url regex");
}

/// A GitHub repository reference, optionally pinned to a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoUrl {
    pub owner: String,
    pub repo: String,
    pub branch: Option<String>,
}

/// Surrounding whitespace is ignored, as in [`RepoUrl::parse`].
pub fn is_valid_repo_url(input: &str) -> bool {
    GH_REPO_URL_RE.is_match(input.trim())
}

impl RepoUrl {
    pub fn parse(input: &str) -> Result<Self, RepoUrlError> {
        let caps = GH_REPO_URL_RE
            .captures(input.trim())
            .ok_or_else(|| RepoUrlError::InvalidFormat(input.to_string()))?;
        Ok(Self {
            owner: caps[1].to_string(),
            repo: caps[2].to_string(),
            branch: caps.get(3).map(|m| m.as_str().to_string()),
        })
    }

    /// `owner/repo`, as shown to users.
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    pub fn clone_url(&self) -> String {
        format!("https://github.com/{}/{}.git", self.owner, self.repo)
    }

    /// The same repository on its default branch.
    pub fn default_branch(&self) -> Self {
        Self {
            branch: None,
            ..self.clone()
        }
    }

    /// Filesystem-safe directory name: `owner+repo[+branch]`.
    pub fn folder_name(&self) -> String {
        match &self.branch {
            Some(branch) => format!("{}+{}+{}", self.owner, self.repo, branch),
            None => format!("{}+{}", self.owner, self.repo),
        }
    }
}

impl std::fmt::Display for RepoUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "https://github.com/{}/{}", self.owner, self.repo)?;
        if let Some(branch) = &self.branch {
            write!(f, "/tree/{branch}")?;
        }
        Ok(())
    }
}

/// Retrieves repositories with a shallow `git clone`.
#[derive(Debug, Clone, Default)]
pub struct GitCliRetriever;

#[async_trait]
impl SourceRetriever for GitCliRetriever {
    async fn retrieve(&self, url: &RepoUrl, dest: &Path) -> Result<(), RetrievalError> {
        let git_path = which::which("git").map_err(|_| RetrievalError::GitNotFound)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut command = Command::new(git_path);
        command.args(["clone", "--depth", "1"]);
        if let Some(branch) = &url.branch {
            command.args(["--branch", branch.as_str()]);
        }
        command.arg(url.clone_url()).arg(dest);
        command.env("GIT_TERMINAL_PROMPT", "0");

        log::info!("Cloning {url} into {}", dest.display());
        let output = command.output().await?;
        if output.status.success() {
            log::info!("Successfully cloned to {}", dest.display());
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(classify_clone_failure(url, &stderr))
    }
}

fn classify_clone_failure(url: &RepoUrl, stderr: &str) -> RetrievalError {
    if let Some(branch) = &url.branch
        && stderr.contains("Remote branch")
        && stderr.contains("not found")
    {
        return RetrievalError::BranchNotFound {
            url: url.default_branch().to_string(),
            branch: branch.clone(),
        };
    }

    let lowered = stderr.to_lowercase();
    if lowered.contains("could not resolve host")
        || lowered.contains("repository not found")
        || lowered.contains("unable to access")
        || lowered.contains("could not read from remote")
    {
        return RetrievalError::Unreachable {
            url: url.to_string(),
            reason: stderr.to_string(),
        };
    }

    RetrievalError::CloneFailed(stderr.to_string())
}
