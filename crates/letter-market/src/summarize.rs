//! Prompt-and-complete helpers
//!
//! [`Summarizer`] renders a prompt, sends it to the completion API and
//! returns the trimmed text. Inputs longer than the chunk size are split,
//! summarised piecewise and summarised again until they fit.

use crate::config::NewsletterConfig;
use crate::error::{NewsletterError, Result};
use crate::prompts::{ANALYST_SYSTEM, Prompts, WRITER_SYSTEM};
use crate::retry::RetryPolicy;
use futures::{StreamExt, TryStreamExt, stream};
use letter_llm::{CompletionRequest, LLMProvider, Message};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Completion settings shared by every call
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub model: String,
    pub max_tokens: usize,
    pub temperature: Option<f32>,
}

impl CompletionSettings {
    pub fn from_config(config: &NewsletterConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Start a request with these settings
    pub fn request(&self, system: impl Into<String>) -> letter_llm::completion::CompletionRequestBuilder {
        let builder = CompletionRequest::builder(self.model.clone())
            .system(system)
            .max_tokens(self.max_tokens);
        match self.temperature {
            Some(t) => builder.temperature(t),
            None => builder,
        }
    }
}

/// Summaries and newsletter text from the completion API
#[derive(Clone)]
pub struct Summarizer {
    provider: Arc<dyn LLMProvider>,
    prompts: Arc<Prompts>,
    settings: CompletionSettings,
    max_chunk_chars: usize,
    max_rounds: usize,
    concurrency: usize,
    retry: RetryPolicy,
}

impl Summarizer {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        prompts: Arc<Prompts>,
        config: &NewsletterConfig,
    ) -> Self {
        Self {
            provider,
            prompts,
            settings: CompletionSettings::from_config(config),
            max_chunk_chars: config.max_chunk_chars,
            max_rounds: config.max_summary_rounds,
            concurrency: config.chunk_concurrency,
            retry: RetryPolicy::from_config(config),
        }
    }

    /// Replace the retry policy for completion calls
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The prompt registry in use
    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    /// Summarise `data`, chunking it when it exceeds the chunk size
    #[instrument(skip(self, data), fields(chars = data.chars().count()))]
    pub async fn summarize(&self, data: &str, context_label: &str) -> Result<String> {
        if data.trim().is_empty() {
            return Err(NewsletterError::Validation(format!(
                "Nothing to summarize for {context_label}"
            )));
        }

        // `max_rounds` bounds the reduction rounds; the final pass over text
        // that fits is not one of them
        let mut text = data.to_string();
        let mut round = 0;
        loop {
            let length = text.chars().count();
            if length <= self.max_chunk_chars {
                return self.summarize_once(&text, context_label).await;
            }
            if round == self.max_rounds {
                return Err(NewsletterError::Agent(format!(
                    "Summary of {context_label} still exceeds {} chars after {} rounds",
                    self.max_chunk_chars, self.max_rounds
                )));
            }
            round += 1;

            let chunks = split_chunks(&text, self.max_chunk_chars);
            info!(
                "Round {}: summarizing {} chars of {} in {} chunks",
                round,
                length,
                context_label,
                chunks.len()
            );

            // Any chunk failure aborts the whole summary
            let partials: Vec<String> = stream::iter(chunks)
                .map(|chunk| async move { self.summarize_once(&chunk, context_label).await })
                .buffered(self.concurrency)
                .try_collect()
                .await?;

            let joined = partials.join("\n\n");
            if joined.chars().count() >= length {
                return Err(NewsletterError::Agent(format!(
                    "Summary of {context_label} did not shrink in round {round}"
                )));
            }
            text = joined;
        }
    }

    /// Summarise a list of documents, one per line
    pub async fn summarize_documents(&self, documents: &[String], context_label: &str) -> Result<String> {
        self.summarize(&documents.join("\n"), context_label).await
    }

    /// Write the newsletter from the three sections
    #[instrument(skip_all)]
    pub async fn generate_newsletter(
        &self,
        company_insights: &str,
        market_trends: &str,
        risks: &str,
        as_of: Option<&str>,
    ) -> Result<String> {
        let prompt = self
            .prompts
            .newsletter(company_insights, market_trends, risks, as_of)?;
        self.complete(WRITER_SYSTEM, prompt).await
    }

    /// Single call with a system prompt and one user message
    pub async fn complete(&self, system: &str, prompt: String) -> Result<String> {
        let request = self
            .settings
            .request(system)
            .add_message(Message::user(prompt))
            .build();
        self.send(request).await
    }

    /// Single call with a system prompt and a message history
    pub async fn complete_messages(&self, system: &str, messages: Vec<Message>) -> Result<String> {
        let request = self.settings.request(system).messages(messages).build();
        self.send(request).await
    }

    async fn send(&self, request: CompletionRequest) -> Result<String> {
        debug!(
            "Completion request to {} ({} messages)",
            self.provider.name(),
            request.messages.len()
        );
        let response = self
            .retry
            .execute("completion", || {
                let request = request.clone();
                async move { Ok(self.provider.complete(request).await?) }
            })
            .await?;
        let text = response.text().to_string();
        if text.is_empty() {
            return Err(NewsletterError::Llm(letter_llm::LLMError::UnexpectedResponse(
                "Completion was empty".to_string(),
            )));
        }
        Ok(text)
    }

    async fn summarize_once(&self, data: &str, context_label: &str) -> Result<String> {
        let prompt = self.prompts.summarize(data, context_label)?;
        self.complete(ANALYST_SYSTEM, prompt).await
    }
}

/// Split text into chunks of at most `max_chars`, breaking after whitespace
///
/// A single word longer than `max_chars` is split mid-word.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for piece in text.split_inclusive(char::is_whitespace) {
        let piece_len = piece.chars().count();

        if current_len + piece_len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if piece_len > max_chars {
            let chars: Vec<char> = piece.chars().collect();
            let mut slices = chars.chunks(max_chars).peekable();
            while let Some(slice) = slices.next() {
                if slices.peek().is_some() {
                    chunks.push(slice.iter().collect());
                } else {
                    current = slice.iter().collect();
                    current_len = slice.len();
                }
            }
            continue;
        }

        current.push_str(piece);
        current_len += piece_len;
    }

    if !current.trim().is_empty() {
        chunks.push(current);
    }
    chunks.retain(|c| !c.trim().is_empty());
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use letter_llm::testing::ScriptedProvider;

    fn summarizer(provider: Arc<ScriptedProvider>, max_chunk_chars: usize) -> Summarizer {
        summarizer_with_rounds(provider, max_chunk_chars, 4)
    }

    fn summarizer_with_rounds(
        provider: Arc<ScriptedProvider>,
        max_chunk_chars: usize,
        max_summary_rounds: usize,
    ) -> Summarizer {
        let config = NewsletterConfig {
            max_chunk_chars,
            max_summary_rounds,
            ..NewsletterConfig::default()
        };
        Summarizer::new(provider, Arc::new(Prompts::new().unwrap()), &config)
            .with_retry_policy(RetryPolicy::fast())
    }

    fn long_text() -> String {
        (0..30).map(|i| format!("word{i:04} ")).collect()
    }

    #[tokio::test]
    async fn test_short_input_is_one_call() {
        let provider = Arc::new(ScriptedProvider::new(["  Apple beat estimates.  "]));
        let summary = summarizer(provider.clone(), 12_000)
            .summarize("Apple - Q2 results", "company insights")
            .await
            .unwrap();

        assert_eq!(summary, "Apple beat estimates.");
        assert_eq!(provider.calls(), 1);

        let request = &provider.requests()[0];
        assert_eq!(request.model, "gpt-4");
        assert_eq!(request.system.as_deref(), Some(ANALYST_SYSTEM));
        assert!(request.messages[0].text().contains("Apple - Q2 results"));
    }

    #[tokio::test]
    async fn test_long_input_is_chunked_then_summarized() {
        let provider = Arc::new(ScriptedProvider::always("short"));
        let summary = summarizer(provider.clone(), 100)
            .summarize(&long_text(), "market trends")
            .await
            .unwrap();

        assert_eq!(summary, "short");
        // three chunk summaries plus the final pass
        assert_eq!(provider.calls(), 4);
        assert!(provider.requests()[3].messages[0].text().contains("short\n\nshort"));
    }

    #[tokio::test]
    async fn test_single_round_that_fits_is_summarized() {
        let provider = Arc::new(ScriptedProvider::always("short"));
        let summary = summarizer_with_rounds(provider.clone(), 100, 1)
            .summarize(&long_text(), "news")
            .await
            .unwrap();

        assert_eq!(summary, "short");
        assert_eq!(provider.calls(), 4);
    }

    #[tokio::test]
    async fn test_round_limit_exhausted() {
        // three partials of 40 chars join to 124: smaller, but still too long
        let provider = Arc::new(ScriptedProvider::always("y".repeat(40)));
        let result = summarizer_with_rounds(provider.clone(), 100, 1)
            .summarize(&long_text(), "news")
            .await;

        assert!(matches!(
            result,
            Err(NewsletterError::Agent(msg)) if msg.contains("still exceeds 100 chars after 1 rounds")
        ));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let provider = Arc::new(ScriptedProvider::always("Recovered.").then_error(
            letter_llm::LLMError::ServerError {
                status: 503,
                message: "overloaded".to_string(),
            },
        ));
        let summary = summarizer(provider.clone(), 12_000)
            .summarize("Apple - Q2 results", "news")
            .await
            .unwrap();

        assert_eq!(summary, "Recovered.");
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let provider = Arc::new(ScriptedProvider::failing("HTTP 400: bad request"));
        let result = summarizer(provider.clone(), 12_000)
            .summarize("Apple - Q2 results", "news")
            .await;

        assert!(matches!(result, Err(NewsletterError::Llm(_))));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_chunk_failure_aborts() {
        let provider = Arc::new(ScriptedProvider::new(["ok"]).then_fail("boom"));
        let result = summarizer(provider, 100)
            .summarize(&long_text(), "market trends")
            .await;

        assert!(matches!(result, Err(NewsletterError::Llm(_))));
    }

    #[tokio::test]
    async fn test_round_that_does_not_shrink_is_error() {
        let provider = Arc::new(ScriptedProvider::always("x".repeat(150)));
        let result = summarizer(provider, 100)
            .summarize(&long_text(), "market trends")
            .await;

        assert!(matches!(result, Err(NewsletterError::Agent(msg)) if msg.contains("did not shrink")));
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_without_call() {
        let provider = Arc::new(ScriptedProvider::always("unused"));
        let result = summarizer(provider.clone(), 100).summarize("  ", "news").await;

        assert!(matches!(result, Err(NewsletterError::Validation(_))));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_generate_newsletter_uses_writer_prompt() {
        let provider = Arc::new(ScriptedProvider::new(["# Daily Brief"]));
        let text = summarizer(provider.clone(), 12_000)
            .generate_newsletter("Insights", "Trends", "Risks", Some("2024-05-01"))
            .await
            .unwrap();

        assert_eq!(text, "# Daily Brief");
        let request = &provider.requests()[0];
        assert_eq!(request.system.as_deref(), Some(WRITER_SYSTEM));
        assert!(request.messages[0].text().contains("**Risk Analysis:**\nRisks"));
    }

    #[test]
    fn test_split_short_text_is_one_chunk() {
        assert_eq!(split_chunks("one two three", 100), vec!["one two three"]);
    }

    #[test]
    fn test_split_respects_limit_and_word_boundaries() {
        let text = "alpha beta gamma delta epsilon";
        let chunks = split_chunks(text, 12);

        assert!(chunks.iter().all(|c| c.chars().count() <= 12));
        assert_eq!(chunks.concat(), text);
        assert_eq!(chunks[0], "alpha beta ");
    }

    #[test]
    fn test_split_long_word() {
        let chunks = split_chunks("abcdefghij xy", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij ", "xy"]);
    }

    #[test]
    fn test_split_counts_chars_not_bytes() {
        let text = "é".repeat(10);
        let chunks = split_chunks(&text, 4);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
    }

    #[test]
    fn test_split_blank_text() {
        assert!(split_chunks("   \n ", 10).is_empty());
    }
}
