//! Summary generation — prompt construction on top of a chat completion backend.
//!
//! The prompt asks for an exhaustive outline (key points, sub-points) of the
//! book named by the title, without added interpretation.

use serde::{Deserialize, Serialize};

use crate::constants::truncate_safe;
use crate::NoteResult;

const SYSTEM_PROMPT: &str = "You are a helpful book summarizer.";

/// One chat message as sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Backend able to answer a chat conversation with a single text reply.
pub trait ChatCompletion {
    fn complete(&self, messages: &[ChatMessage]) -> NoteResult<String>;
}

/// Produces the summary text for a book title.
pub trait SummaryGenerator {
    fn generate(&self, title: &str) -> NoteResult<String>;
}

pub fn build_summary_prompt(title: &str) -> String {
    format!(
        "You are an expert summarizer designed to extract structured, comprehensive, \
and concise summaries of complex content. Break down the '{title}' into key points, \
ensuring clarity and detail without adding extra interpretation. Follow this example for the format:
Title: Title of the Book
Summary:
    1. Key Point 1:
        - Sub-point 1
        - Sub-point 2
    2. Key Point 2:
        - Sub-point 1
        - Sub-point 2
        - Sub-point 3
    And so on...
    Do not stop until you summarize every key idea in the book."
    )
}

pub fn summary_messages(title: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(build_summary_prompt(title)),
    ]
}

/// `SummaryGenerator` backed by any chat completion client.
pub struct Summarizer<C> {
    client: C,
}

impl<C: ChatCompletion> Summarizer<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

impl<C: ChatCompletion> SummaryGenerator for Summarizer<C> {
    fn generate(&self, title: &str) -> NoteResult<String> {
        tracing::info!(title = %title, "Generating summary");
        let summary = self.client.complete(&summary_messages(title))?;
        tracing::debug!(
            title = %title,
            summary_len = summary.len(),
            preview = %truncate_safe(&summary, 120),
            "Summary generated"
        );
        Ok(summary)
    }
}
