//! Deterministic providers for tests in this workspace
//!
//! Enabled for downstream crates with the `test-util` feature.

#![allow(clippy::unwrap_used)]

use crate::{
    CompletionRequest, CompletionResponse, EmbeddingProvider, LLMError, LLMProvider, Message,
    Result, StopReason, TokenUsage,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Replies with queued texts in order, then with the fallback, and records
/// every request
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    fallback: Option<String>,
}

impl ScriptedProvider {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            ..Self::default()
        }
    }

    /// Answer every request with the same text
    pub fn always(reply: impl Into<String>) -> Self {
        Self {
            fallback: Some(reply.into()),
            ..Self::default()
        }
    }

    /// Fail the first request; later ones find the script exhausted
    pub fn failing(message: impl Into<String>) -> Self {
        Self::default().then_fail(message)
    }

    /// Queue a failing reply
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.then_error(LLMError::RequestFailed(message.into()))
    }

    /// Queue a specific error
    pub fn then_error(self, error: LLMError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        let text = match (next, &self.fallback) {
            (Some(Ok(text)), _) => text,
            (Some(Err(error)), _) => return Err(error),
            (None, Some(text)) => text.clone(),
            (None, None) => return Err(LLMError::RequestFailed("script exhausted".to_string())),
        };

        Ok(CompletionResponse {
            message: Message::assistant(text),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Embeds each text as `[len]` and counts calls
#[derive(Default)]
pub struct LengthEmbedder {
    calls: AtomicUsize,
}

impl LengthEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for LengthEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
    }

    fn name(&self) -> &str {
        "length"
    }
}

/// Bag-of-letters embedding, so texts sharing words land close together
pub struct LetterEmbedder;

#[async_trait]
impl EmbeddingProvider for LetterEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0; 26];
                for c in text.to_ascii_lowercase().bytes().filter(u8::is_ascii_lowercase) {
                    v[(c - b'a') as usize] += 1.0;
                }
                v
            })
            .collect())
    }

    fn name(&self) -> &str {
        "letters"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_then_fallback() {
        let provider = ScriptedProvider {
            fallback: Some("later".to_string()),
            ..ScriptedProvider::new(["first"])
        };
        let request = || CompletionRequest::builder("m").add_message(Message::user("q")).build();

        assert_eq!(provider.complete(request()).await.unwrap().text(), "first");
        assert_eq!(provider.complete(request()).await.unwrap().text(), "later");
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_then_exhausted() {
        let provider = ScriptedProvider::failing("HTTP 400: bad request");
        let request = || CompletionRequest::builder("m").build();

        assert!(matches!(
            provider.complete(request()).await,
            Err(LLMError::RequestFailed(msg)) if msg.starts_with("HTTP 400")
        ));
        assert!(provider.complete(request()).await.is_err());
    }
}
