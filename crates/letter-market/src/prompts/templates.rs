//! Prompt template sources

pub const SUMMARIZE: &str = "\
Summarize the following {{ context_label }} with detailed takeaways, actionable insights, and relevant examples:

{{ data }}

Ensure the summary aligns strictly with the provided data and does not include assumptions.";

pub const RISKS: &str = "\
Assess risks based on the following:

**Company Insights:**
{{ company_insights }}

**Market Trends:**
{{ market_trends }}

Include macroeconomic, sector-specific, and stock-specific risks.";

pub const NEWSLETTER: &str = "\
Create a detailed daily market newsletter{% if as_of %} for {{ as_of }}{% endif %} based on the following:

**Company Insights:**
{{ company_insights }}

**Market Trends:**
{{ market_trends }}

**Risk Analysis:**
{{ risks }}

Ensure the newsletter is factual, actionable, and references metadata such as sources, authors, and publication times.";

pub const CHAT_SYSTEM: &str = "\
You are a financial markets assistant. Answer the user's questions using the news context below.
If the context does not cover the question, say so instead of guessing.

Context:
{% for doc in documents %}- {{ doc }}
{% else %}(no matching news stored)
{% endfor %}";
