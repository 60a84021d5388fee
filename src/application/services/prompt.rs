use serde::Deserialize;

use crate::domain::{ChatMode, Message, SearchResult};

const NO_CONTEXT: &str = "_No relevant context retrieved._\n\n";
const DEFAULT_SCRIBE_TEMPLATE: &str = "General Scribe Template";
const MAX_SOURCES: usize = 5;

/// Phrases whose presence appends domain synonyms to the retrieval query.
const EXPANSIONS: &[(&str, &str)] = &[
    (
        "heart attack",
        "myocardial infarction cardiac arrest coronary thrombosis acute coronary syndrome",
    ),
    ("high blood pressure", "hypertension elevated blood pressure"),
    ("diabetes", "diabetes mellitus hyperglycemia"),
    ("stroke", "cerebrovascular accident"),
];

/// Prompt text blocks, loaded from the prompts file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub preamble: String,
    pub response_format: String,
    /// `{template}` is replaced with the requested scribe template name.
    pub scribe: String,
    pub closing: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            preamble: "You are a hospital-based clinical decision support assistant. Below is the \
                       conversation so far, plus some retrieved context from a knowledge base."
                .to_string(),
            response_format: "Please provide your answer in clear, concise medical language.\n\
                              Cite your sources if relevant."
                .to_string(),
            scribe: "You are a clinical scribe AI. Transform the user's transcript into a \
                     professional clinical document.\nTemplate to use: {template}.\n\n\
                     Please format with headings, bullet points, and proper spacing.\n\
                     Ensure the final document is in professional style."
                .to_string(),
            closing: "Please provide your final answer in Markdown format.".to_string(),
        }
    }
}

impl PromptTemplates {
    pub fn build(
        &self,
        query: &str,
        context: &str,
        history: &[Message],
        mode: ChatMode,
        template_name: Option<&str>,
    ) -> String {
        let mut instructions = self.response_format.trim().to_string();
        if mode == ChatMode::Scribe {
            let scribe = self
                .scribe
                .replace("{template}", template_name.unwrap_or(DEFAULT_SCRIBE_TEMPLATE));
            instructions = format!("{}\n\n{}", scribe.trim(), instructions);
        }

        let context = if context.is_empty() { NO_CONTEXT } else { context };

        format!(
            "{}\n\n**Conversation History:**\n{}\n**User's Question:**\n{}\n\n\
             **Retrieved Document Context:**\n{}\n{}\n\n{}",
            self.preamble.trim(),
            format_history(history),
            query,
            context,
            instructions,
            self.closing.trim(),
        )
    }
}

pub fn expand_query(query: &str) -> String {
    let lower = query.to_lowercase();
    EXPANSIONS
        .iter()
        .filter(|(phrase, _)| lower.contains(phrase))
        .fold(query.to_string(), |mut acc, (_, expansion)| {
            acc.push(' ');
            acc.push_str(expansion);
            acc
        })
}

fn format_history(history: &[Message]) -> String {
    history
        .iter()
        .map(|m| format!("**{}:** {}\n\n", m.role.as_str(), m.content.trim()))
        .collect()
}

/// Concatenates retrieved chunks, stopping before `max_len` bytes would be
/// exceeded.
pub fn format_context(results: &[SearchResult], max_len: usize) -> String {
    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        let snippet = format!(
            "**Doc {}:** {}\n(Source: {})\n\n",
            i + 1,
            result.chunk.content.trim(),
            result.chunk.source()
        );
        if out.len() + snippet.len() > max_len {
            break;
        }
        out.push_str(&snippet);
    }
    out
}

pub fn extract_sources(results: &[SearchResult]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for result in results {
        let source = result.chunk.source();
        if !sources.iter().any(|s| s == source) {
            sources.push(source.to_string());
        }
        if sources.len() >= MAX_SOURCES {
            break;
        }
    }
    sources
}

/// Mean score of the three best matches.
pub fn confidence(results: &[SearchResult]) -> f32 {
    let top: Vec<f32> = results.iter().take(3).map(|r| r.score).collect();
    if top.is_empty() {
        return 0.0;
    }
    top.iter().sum::<f32>() / top.len() as f32
}
