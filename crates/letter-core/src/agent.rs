//! Role agent trait

use crate::{Context, Result};
use async_trait::async_trait;

/// A role in the newsletter crew
///
/// A role is a labelled prompt around a single LLM call. It reads its
/// input (plus anything earlier roles left on the [`Context`]) and returns
/// the text it produced. Roles never keep state between runs.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Process input and return output
    async fn process(&self, input: String, context: &mut Context) -> Result<String>;

    /// Get the role's name
    fn name(&self) -> &str;

    /// The context key this role writes its output under, if any
    fn output_key(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Agent for Echo {
        async fn process(&self, input: String, context: &mut Context) -> Result<String> {
            context.set_text("echo", input.clone());
            Ok(input)
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_default_output_key_is_none() {
        let agent = Echo;
        let mut ctx = Context::new();
        let out = agent.process("hi".to_string(), &mut ctx).await.unwrap();

        assert_eq!(out, "hi");
        assert_eq!(agent.output_key(), None);
        assert_eq!(ctx.text("echo"), Some("hi"));
    }
}
