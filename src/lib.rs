//! RepoChat core: repository ingestion, prompt assembly and response formatting.

pub mod application;
pub mod domain;
pub mod infra;
pub mod prompts;

pub use application::format::format_response;
pub use application::session::Session;
pub use domain::{AgentKind, RepoSnapshot};
