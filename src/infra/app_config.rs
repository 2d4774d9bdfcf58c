use crate::infra::cleanup::RetryPolicy;
use crate::infra::ingest::{IngestOptions, default_concurrency};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Where temporary clones are placed. Defaults to the app data dir.
    pub data_dir: Option<PathBuf>,
    pub prompt: PromptLimits,
    pub ingest: IngestSettings,
    pub cleanup: RetryPolicy,
}

/// Hard caps on the text embedded into prompts, in characters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PromptLimits {
    pub code_chars: usize,
    pub diff_chars: usize,
}

impl Default for PromptLimits {
    fn default() -> Self {
        Self {
            code_chars: 15_000,
            diff_chars: 10_000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub concurrency: Option<usize>,
}

impl AppConfig {
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            concurrency: self.ingest.concurrency.unwrap_or_else(default_concurrency),
        }
    }

    /// Parent directory for temporary repository clones.
    pub fn clones_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(app_data_dir)
            .join("repos")
    }
}

pub fn load_config() -> AppConfig {
    let path = config_path();
    let Ok(contents) = std::fs::read_to_string(&path) else {
        return AppConfig::default();
    };
    parse_config(&contents)
}

fn parse_config(contents: &str) -> AppConfig {
    toml::from_str(contents).unwrap_or_else(|e| {
        log::warn!("Ignoring malformed config: {e}");
        AppConfig::default()
    })
}

fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("REPOCHAT_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    app_data_dir().join("config.toml")
}

fn app_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var("REPOCHAT_DATA_HOME") {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = home::home_dir() {
            return home
                .join("Library")
                .join("Application Support")
                .join("RepoChat");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("RepoChat");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("repochat");
        }
        if let Some(home) = home::home_dir() {
            return home.join(".local").join("share").join("repochat");
        }
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".repochat")
}
