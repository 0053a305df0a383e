//! Prompt templates for the newsletter crew and chat
//!
//! Templates are MiniJinja sources registered by name in a shared
//! environment. Render them through [`Prompts`].

mod templates;

use crate::error::Result;
use minijinja::Environment;
use serde::Serialize;

/// System prompt for summaries and risk assessment
pub const ANALYST_SYSTEM: &str = "You are an expert financial analyst.";
/// System prompt for the newsletter writer
pub const WRITER_SYSTEM: &str = "You are a professional newsletter creator.";

pub const SUMMARIZE: &str = "newsletter.summarize";
pub const RISKS: &str = "newsletter.risks";
pub const NEWSLETTER: &str = "newsletter.write";
pub const CHAT_SYSTEM: &str = "chat.system";

/// Registry of compiled prompt templates
pub struct Prompts {
    env: Environment<'static>,
}

impl Prompts {
    /// Compile every built-in template
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(SUMMARIZE, templates::SUMMARIZE)?;
        env.add_template(RISKS, templates::RISKS)?;
        env.add_template(NEWSLETTER, templates::NEWSLETTER)?;
        env.add_template(CHAT_SYSTEM, templates::CHAT_SYSTEM)?;
        Ok(Self { env })
    }

    /// Render a template by name
    pub fn render<S: Serialize>(&self, name: &str, vars: S) -> Result<String> {
        let template = self.env.get_template(name)?;
        Ok(template.render(vars)?.trim().to_string())
    }

    /// Prompt asking for a summary of `data`
    pub fn summarize(&self, data: &str, context_label: &str) -> Result<String> {
        self.render(
            SUMMARIZE,
            minijinja::context! { data => data, context_label => context_label },
        )
    }

    /// Prompt asking for a risk assessment
    pub fn risks(&self, company_insights: &str, market_trends: &str) -> Result<String> {
        self.render(
            RISKS,
            minijinja::context! {
                company_insights => company_insights,
                market_trends => market_trends,
            },
        )
    }

    /// Prompt asking for the final newsletter
    pub fn newsletter(
        &self,
        company_insights: &str,
        market_trends: &str,
        risks: &str,
        as_of: Option<&str>,
    ) -> Result<String> {
        self.render(
            NEWSLETTER,
            minijinja::context! {
                company_insights => company_insights,
                market_trends => market_trends,
                risks => risks,
                as_of => as_of,
            },
        )
    }

    /// System prompt for a chat turn grounded in `documents`
    pub fn chat_system(&self, documents: &[String]) -> Result<String> {
        self.render(CHAT_SYSTEM, minijinja::context! { documents => documents })
    }
}
