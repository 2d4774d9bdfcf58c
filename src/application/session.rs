//! Session context: the loaded repository, the conversation and the agent.
//!
//! A session is the only holder of per-user state. Loading a repository
//! replaces the snapshot and resets the history; a failed load leaves the
//! session with no repository at all.

use crate::application::format::format_response;
use crate::application::prompt::{PromptAssembler, TurnInput};
use crate::domain::{AgentKind, Conversation, ConversationTurn, RepoSnapshot, Role, SessionError};
use crate::infra::app_config::AppConfig;
use crate::infra::cleanup::remove_dir_with_retry;
use crate::infra::ingest::ingest;
use crate::infra::llm::{ChatTransport, TransportMessage, TransportRole, collect_fragments};
use crate::infra::vcs::{RepoUrl, SourceRetriever};
use crate::prompts;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct LoadedRepo {
    pub url: RepoUrl,
    /// `owner/repo`
    pub name: String,
    pub snapshot: RepoSnapshot,
    /// Flattened snapshot, embedded into prompts.
    pub code: String,
    pub loaded_at: DateTime<Utc>,
}

/// A prompt ready to send, with the history it is attached to.
#[derive(Debug, Clone)]
pub struct PreparedTurn {
    pub prompt: String,
    pub history: Vec<TransportMessage>,
}

pub struct Session {
    config: AppConfig,
    assembler: PromptAssembler,
    agent: AgentKind,
    repo: Option<LoadedRepo>,
    history: Conversation,
    embed_code_in_history: bool,
}

impl Session {
    pub fn new(config: AppConfig) -> Self {
        Self {
            assembler: PromptAssembler::new(config.prompt),
            config,
            agent: AgentKind::default(),
            repo: None,
            history: Conversation::default(),
            embed_code_in_history: false,
        }
    }

    pub fn agent(&self) -> AgentKind {
        self.agent
    }

    pub fn set_agent(&mut self, agent: AgentKind) {
        self.agent = agent;
    }

    /// Prefix the first user message of the transport history with the whole codebase.
    pub fn set_embed_code_in_history(&mut self, embed: bool) {
        self.embed_code_in_history = embed;
    }

    pub fn repository(&self) -> Option<&LoadedRepo> {
        self.repo.as_ref()
    }

    pub fn history(&self) -> &Conversation {
        &self.history
    }

    pub async fn load_repository(
        &mut self,
        url: &str,
        retriever: &dyn SourceRetriever,
    ) -> Result<&LoadedRepo, SessionError> {
        self.repo = None;
        self.history.reset();

        let url = RepoUrl::parse(url)?;
        let snapshot = checkout_and_ingest(&url, retriever, &self.config).await?;
        log::info!(
            "Loaded {} ({} files)",
            url.display_name(),
            snapshot.len()
        );

        let repo = LoadedRepo {
            name: url.display_name(),
            code: snapshot.flatten(),
            snapshot,
            url,
            loaded_at: Utc::now(),
        };
        Ok(self.repo.insert(repo))
    }

    /// Snapshot of the loaded repository's default branch, for change analysis.
    pub async fn fetch_reference(
        &self,
        retriever: &dyn SourceRetriever,
    ) -> Result<RepoSnapshot, SessionError> {
        let repo = self.repo.as_ref().ok_or(SessionError::NoRepository)?;
        log::info!("Comparing with default branch of {}", repo.name);
        checkout_and_ingest(&repo.url.default_branch(), retriever, &self.config).await
    }

    pub fn prepare_turn(
        &self,
        text: &str,
        reference: Option<&RepoSnapshot>,
    ) -> Result<PreparedTurn, SessionError> {
        let repo = self.repo.as_ref().ok_or(SessionError::NoRepository)?;
        let input = TurnInput {
            snapshot: &repo.snapshot,
            code: &repo.code,
            instruction: text,
            reference,
        };
        let prompt = self.assembler.assemble(self.agent, &input)?;
        Ok(PreparedTurn {
            prompt,
            history: self.transport_history()?,
        })
    }

    /// Prior turns as role-tagged transport messages.
    pub fn transport_history(&self) -> Result<Vec<TransportMessage>, SessionError> {
        let mut messages: Vec<TransportMessage> = self
            .history
            .turns()
            .iter()
            .map(|turn| TransportMessage {
                role: match turn.role {
                    Role::User => TransportRole::User,
                    Role::Assistant => TransportRole::Model,
                },
                text: turn.content.clone(),
            })
            .collect();

        if self.embed_code_in_history
            && let Some(repo) = &self.repo
            && let Some(first) = messages.iter_mut().find(|m| m.role == TransportRole::User)
        {
            first.text = prompts::render(
                "codebase_preamble",
                &json!({ "code": repo.code, "question": first.text }),
            )
            .map_err(|e| SessionError::Prompt(e.into()))?;
        }

        Ok(messages)
    }

    /// Send one user turn and return the formatted response.
    ///
    /// The raw response is what gets recorded in the history; formatting is
    /// for display only.
    pub async fn run_turn(
        &mut self,
        transport: &dyn ChatTransport,
        text: &str,
        reference: Option<&RepoSnapshot>,
    ) -> Result<String, SessionError> {
        let turn = self.prepare_turn(text, reference)?;
        self.history.push(ConversationTurn::user(text));

        let response = match transport.send(&turn.history, &turn.prompt).await {
            Ok(stream) => collect_fragments(stream).await,
            Err(e) => Err(e),
        };

        match response {
            Ok(raw) => {
                let formatted = format_response(&raw, self.agent);
                self.history.push(ConversationTurn::assistant(raw));
                Ok(formatted)
            }
            Err(e) => {
                log::warn!("Chat transport failed: {e:#}");
                self.history
                    .push(ConversationTurn::assistant(format!("Response error: {e}")));
                Err(SessionError::Transport(format!("{e:#}")))
            }
        }
    }
}

/// Clone into a fresh directory, ingest it, and remove the clone.
///
/// The directory is removed whether or not ingestion succeeded.
async fn checkout_and_ingest(
    url: &RepoUrl,
    retriever: &dyn SourceRetriever,
    config: &AppConfig,
) -> Result<RepoSnapshot, SessionError> {
    let dest = unique_clone_dir(config, url);

    let result = match retriever.retrieve(url, &dest).await {
        Ok(()) => ingest(&dest, &config.ingest_options())
            .await
            .map_err(SessionError::from),
        Err(e) => Err(SessionError::from(e)),
    };
    let cleanup = remove_dir_with_retry(&dest, &config.cleanup).await;

    let snapshot = result?;
    cleanup?;
    Ok(snapshot)
}

fn unique_clone_dir(config: &AppConfig, url: &RepoUrl) -> PathBuf {
    let id = uuid::Uuid::new_v4().simple().to_string();
    config
        .clones_dir()
        .join(format!("{}-{}", url.folder_name(), &id[..8]))
}
