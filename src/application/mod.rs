//! Application layer (use-cases, policies).
//!
//! This module turns snapshots into prompts and model output into display
//! text, and owns the per-user session lifecycle. It depends on infra only
//! through collaborator traits and pure helpers.

pub mod change_impact;
pub mod format;
pub mod prompt;
pub mod selection;
pub mod session;
