//! OpenAI chat completions client (blocking).
//!
//! One request per call, no retry. A non-2xx status surfaces as
//! `NoteError::Api` carrying the response body for diagnosis.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::OpenAiSettings;
use crate::processing::summarizer::{ChatCompletion, ChatMessage};
use crate::{NoteError, NoteResult};

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiClient {
    agent: ureq::Agent,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str, settings: &OpenAiSettings) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(settings.timeout_secs)))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            api_key: api_key.to_string(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ChatCompletion for OpenAiClient {
    fn complete(&self, messages: &[ChatMessage]) -> NoteResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = CompletionRequest {
            model: &self.model,
            messages,
        };

        tracing::debug!(model = %self.model, messages = messages.len(), "OpenAI request");
        let mut response = self
            .agent
            .post(url.as_str())
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(&request)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.body_mut().read_to_string().unwrap_or_default();
            return Err(NoteError::Api {
                service: "openai",
                status: status.as_u16(),
                message,
            });
        }

        let body: CompletionResponse = response.body_mut().read_json()?;
        first_content(body)
    }
}

fn first_content(body: CompletionResponse) -> NoteResult<String> {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| NoteError::Provider("completion returned no content".into()))
}
