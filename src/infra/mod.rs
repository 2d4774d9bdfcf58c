//! Infrastructure layer (adapters/implementations).
//!
//! This module contains IO-heavy integrations (filesystem, git, chat transport)
//! plus the byte-level decoding and diffing they rely on.

pub mod app_config;
pub mod cleanup;
pub mod diff;
pub mod encoding;
pub mod ingest;
pub mod llm;
pub mod vcs;
