//! Conversational transport boundary.
//!
//! RepoChat only shapes the prompt and the history it is attached to; model
//! selection and the wire protocol belong to the [`ChatTransport`]
//! implementation.

use anyhow::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Role names as most chat APIs expect them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportMessage {
    pub role: TransportRole,
    pub text: String,
}

/// Order-preserving stream of response fragments.
pub type FragmentStream = BoxStream<'static, Result<String>>;

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `prompt` as the next user message after `history`.
    async fn send(&self, history: &[TransportMessage], prompt: &str) -> Result<FragmentStream>;
}

/// Concatenate a fragment stream back into the full response.
pub async fn collect_fragments(stream: FragmentStream) -> Result<String> {
    stream
        .try_fold(String::new(), |mut acc, fragment| async move {
            acc.push_str(&fragment);
            Ok(acc)
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn fragments_concatenate_in_order() {
        let stream = futures::stream::iter(vec![Ok("Hel".to_string()), Ok("lo".to_string())]).boxed();
        assert_eq!(collect_fragments(stream).await.unwrap(), "Hello");
    }

    #[tokio::test]
    async fn fragment_error_aborts_collection() {
        let stream = futures::stream::iter(vec![
            Ok("partial".to_string()),
            Err(anyhow::anyhow!("connection reset")),
        ])
        .boxed();
        let err = collect_fragments(stream).await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }
}
