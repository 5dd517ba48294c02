//! Notion REST client (blocking) and the `NotionApi` seam used by the
//! reader, writer and their tests.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::NotionSettings;
use crate::{NoteError, NoteResult};

/// One page of a database query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryPage {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedPage {
    id: String,
}

/// The three Notion operations this crate needs.
pub trait NotionApi {
    /// `POST /databases/{id}/query` with a prepared body (filter, cursor, page size).
    fn query_database(&self, database_id: &str, body: &Value) -> NoteResult<QueryPage>;

    /// `POST /pages`. Returns the id of the created page.
    fn create_page(&self, body: &Value) -> NoteResult<String>;

    /// `PATCH /blocks/{id}/children`.
    fn append_children(&self, block_id: &str, children: &[Value]) -> NoteResult<()>;
}

pub struct NotionClient {
    agent: ureq::Agent,
    token: String,
    base_url: String,
    version: String,
}

impl NotionClient {
    pub fn new(token: &str, settings: &NotionSettings) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(settings.timeout_secs)))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            token: token.to_string(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            version: settings.version.clone(),
        }
    }

    fn send<T: DeserializeOwned>(&self, method: &str, path: &str, body: &Value) -> NoteResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        let auth = format!("Bearer {}", self.token);
        tracing::debug!(method, url = %url, "Notion request");

        let request = match method {
            "PATCH" => self.agent.patch(url.as_str()),
            _ => self.agent.post(url.as_str()),
        };
        let mut response = request
            .header("Authorization", &auth)
            .header("Notion-Version", &self.version)
            .send_json(body)?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.body_mut().read_to_string().unwrap_or_default();
            return Err(NoteError::Api {
                service: "notion",
                status: status.as_u16(),
                message: api_error_message(&raw),
            });
        }
        Ok(response.body_mut().read_json()?)
    }
}

impl NotionApi for NotionClient {
    fn query_database(&self, database_id: &str, body: &Value) -> NoteResult<QueryPage> {
        self.send("POST", &format!("databases/{}/query", database_id), body)
    }

    fn create_page(&self, body: &Value) -> NoteResult<String> {
        let created: CreatedPage = self.send("POST", "pages", body)?;
        Ok(created.id)
    }

    fn append_children(&self, block_id: &str, children: &[Value]) -> NoteResult<()> {
        let _: Value = self.send(
            "PATCH",
            &format!("blocks/{}/children", block_id),
            &json!({ "children": children }),
        )?;
        Ok(())
    }
}

/// Notion error bodies look like `{"object":"error","code":..,"message":..}`.
/// Fall back to the raw body when they don't.
fn api_error_message(raw: &str) -> String {
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|v| {
            let code = v.get("code")?.as_str()?.to_string();
            let message = v.get("message")?.as_str()?.to_string();
            Some(format!("{}: {}", code, message))
        })
        .unwrap_or_else(|| raw.to_string())
}
