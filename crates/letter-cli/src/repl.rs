//! Interactive chat loop

use crate::app::App;
use anyhow::Result;
use letter_market::ChatSession;
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::error;

fn print_banner(session: &ChatSession) {
    println!("Market news chat (session {})", session.id());
    println!("Ask about the stored news. /reset clears the history, /exit quits.\n");
}

/// What to do with one line of input
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Exit,
    Reset,
    Question(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Empty,
        "/exit" | "/quit" => Input::Exit,
        "/reset" => Input::Reset,
        question => Input::Question(question),
    }
}

pub async fn run(app: &App) -> Result<()> {
    let mut session = ChatSession::new(app.rag()?, app.summarizer()?, &app.config);
    print_banner(&session);
    chat_loop(&mut session, BufReader::new(tokio::io::stdin())).await
}

/// Answer questions read line by line until `/exit` or end of input
async fn chat_loop<R>(session: &mut ChatSession, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut stdout = io::stdout();

    loop {
        print!("you> ");
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            // EOF
            println!("\nGoodbye!");
            break;
        };

        match classify(&line) {
            Input::Empty => continue,
            Input::Exit => {
                println!("Goodbye!");
                break;
            }
            Input::Reset => {
                session.reset();
                println!("History cleared.\n");
            }
            Input::Question(question) => match session.ask(question).await {
                Ok(answer) => println!("\n{answer}\n"),
                Err(e) => {
                    error!("Chat turn failed: {}", e);
                    eprintln!("Error: {e}\n");
                }
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use letter_llm::testing::{LengthEmbedder, ScriptedProvider};
    use letter_market::prompts::Prompts;
    use letter_market::{
        Document, NewsletterConfig, RagHelper, SearchResult, Summarizer, VectorStore,
    };
    use std::sync::Arc;

    struct EmptyStore;

    #[async_trait]
    impl VectorStore for EmptyStore {
        async fn create_collection(&self, _collection: &str) -> letter_market::Result<()> {
            Ok(())
        }

        async fn upsert(
            &self,
            _collection: &str,
            _documents: &[Document],
        ) -> letter_market::Result<()> {
            Ok(())
        }

        async fn search(
            &self,
            _collection: &str,
            _embedding: &[f32],
            _n_results: usize,
        ) -> letter_market::Result<Vec<SearchResult>> {
            Ok(Vec::new())
        }

        async fn get(
            &self,
            _collection: &str,
            _ids: &[String],
        ) -> letter_market::Result<Vec<Document>> {
            Ok(Vec::new())
        }

        async fn count(&self, _collection: &str) -> letter_market::Result<usize> {
            Ok(0)
        }
    }

    fn session(provider: Arc<ScriptedProvider>) -> ChatSession {
        let config = NewsletterConfig::default();
        let rag = RagHelper::new(Arc::new(EmptyStore), Arc::new(LengthEmbedder::default()));
        let summarizer = Summarizer::new(provider, Arc::new(Prompts::new().unwrap()), &config);
        ChatSession::new(rag, summarizer, &config)
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("  \n"), Input::Empty);
        assert_eq!(classify("/exit\n"), Input::Exit);
        assert_eq!(classify("/reset"), Input::Reset);
        assert_eq!(
            classify(" What moved NVDA?\n"),
            Input::Question("What moved NVDA?")
        );
    }

    #[tokio::test]
    async fn test_chat_loop_stops_at_exit() {
        let provider = Arc::new(ScriptedProvider::always("Nothing stored yet."));
        let mut chat = session(provider.clone());
        let input: &[u8] = b"\n/reset\nWhat moved NVDA?\n/exit\nNever asked\n";

        chat_loop(&mut chat, input).await.unwrap();

        assert_eq!(provider.calls(), 1);
        assert_eq!(chat.turns(), 1);
    }

    #[tokio::test]
    async fn test_chat_loop_ends_at_eof() {
        let provider = Arc::new(ScriptedProvider::always("Nothing stored yet."));
        let mut chat = session(provider.clone());
        let input: &[u8] = b"First?\nSecond?";

        chat_loop(&mut chat, input).await.unwrap();

        assert_eq!(provider.calls(), 2);
        assert_eq!(chat.turns(), 2);
    }
}
