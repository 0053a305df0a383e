//! Conversational Q&A over the stored news
//!
//! Each question retrieves the closest news documents, which are placed in
//! the system prompt for that turn. Earlier turns are replayed as history.

use crate::config::NewsletterConfig;
use crate::error::{NewsletterError, Result};
use crate::rag::RagHelper;
use crate::summarize::Summarizer;
use letter_llm::Message;
use std::collections::VecDeque;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// One chat conversation with bounded history
pub struct ChatSession {
    id: Uuid,
    rag: RagHelper,
    summarizer: Summarizer,
    history: VecDeque<Message>,
    max_turns: usize,
    collection: String,
    n_results: usize,
}

impl ChatSession {
    /// Start a session answering from the news collection
    pub fn new(rag: RagHelper, summarizer: Summarizer, config: &NewsletterConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            rag,
            summarizer,
            history: VecDeque::new(),
            max_turns: config.chat_history_turns,
            collection: config.collections.news.clone(),
            n_results: config.n_results,
        }
    }

    /// Answer from a different collection
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Messages kept so far, oldest first
    pub fn history(&self) -> impl Iterator<Item = &Message> {
        self.history.iter()
    }

    /// Completed question/answer pairs in the history
    pub fn turns(&self) -> usize {
        self.history.len() / 2
    }

    /// Ask a question
    ///
    /// The history only changes when the model answered.
    #[instrument(skip(self, question), fields(session = %self.id))]
    pub async fn ask(&mut self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(NewsletterError::Validation("Question is empty".to_string()));
        }

        let documents = self
            .rag
            .query_texts(&self.collection, question, self.n_results)
            .await?;
        debug!("Retrieved {} documents for chat", documents.len());

        let system = self.summarizer.prompts().chat_system(&documents)?;
        let mut messages: Vec<Message> = self.history.iter().cloned().collect();
        messages.push(Message::user(question));

        let answer = self.summarizer.complete_messages(&system, messages).await?;

        self.history.push_back(Message::user(question));
        self.history.push_back(Message::assistant(answer.as_str()));
        while self.history.len() > self.max_turns * 2 {
            self.history.pop_front();
        }

        Ok(answer)
    }

    /// Forget the conversation
    pub fn reset(&mut self) {
        info!("Resetting chat session {}", self.id);
        self.history.clear();
    }
}
