//! Domain types for RepoChat
//! Defines the core data structures shared by the ingestion, prompting and formatting layers.

pub mod agent;
pub mod conversation;
pub mod error;
pub mod snapshot;

pub use agent::*;
pub use conversation::*;
pub use error::*;
pub use snapshot::*;
