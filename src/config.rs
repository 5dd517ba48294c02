//! Poller configuration.
//!
//! Two sources:
//!   - Credentials come from the environment (optionally seeded from `.env`).
//!     They have no defaults.
//!   - Settings come from an optional JSON file; every field has a default,
//!     so a missing or partial file is fine.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::{NoteError, NoteResult};

// ============================================================================
// CREDENTIALS
// ============================================================================

/// Secrets and database ids, sourced from the environment.
#[derive(Clone)]
pub struct Credentials {
    pub notion_token: String,
    pub library_db_id: String,
    pub notes_db_id: String,
    pub openai_api_key: String,
}

impl Credentials {
    /// Read all four variables. Missing or blank ones are reported together.
    pub fn from_env() -> NoteResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> NoteResult<Self> {
        let mut missing = Vec::new();
        let mut get = |key: &'static str| -> String {
            match lookup(key).map(|v| v.trim().to_string()) {
                Some(v) if !v.is_empty() => v,
                _ => {
                    missing.push(key);
                    String::new()
                }
            }
        };

        let creds = Self {
            notion_token: get(constants::ENV_NOTION_TOKEN),
            library_db_id: get(constants::ENV_LIBRARY_ID),
            notes_db_id: get(constants::ENV_NOTES_ID),
            openai_api_key: get(constants::ENV_OPENAI_KEY),
        };

        if !missing.is_empty() {
            return Err(NoteError::Config(format!(
                "missing environment variable(s): {}",
                missing.join(", ")
            )));
        }
        Ok(creds)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("notion_token", &mask(&self.notion_token))
            .field("library_db_id", &self.library_db_id)
            .field("notes_db_id", &self.notes_db_id)
            .field("openai_api_key", &mask(&self.openai_api_key))
            .finish()
    }
}

/// Keep the last four characters of a secret, hide the rest.
pub fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}

/// Load a `.env` file into the process environment.
///
/// An explicit path must exist; the implicit `./.env` is optional.
pub fn load_dotenv(explicit: Option<&Path>) -> NoteResult<()> {
    match explicit {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| {
                NoteError::Config(format!("cannot load env file {}: {}", path.display(), e))
            })?;
            tracing::debug!(path = %path.display(), "Loaded env file");
        }
        None => {
            if let Ok(path) = dotenvy::dotenv() {
                tracing::debug!(path = %path.display(), "Loaded .env");
            }
        }
    }
    Ok(())
}

// ============================================================================
// SETTINGS
// ============================================================================

/// Non-secret tunables, loaded from `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds between poll cycles.
    pub poll_interval_secs: u64,
    /// Value of the source status property that marks a book as ready.
    pub target_status: String,
    /// Max characters per paragraph block.
    pub max_block_len: usize,
    pub notion: NotionSettings,
    pub openai: OpenAiSettings,
    pub source_properties: SourceProperties,
    pub note_properties: NoteProperties,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_secs: constants::POLL_INTERVAL_SECS,
            target_status: constants::TARGET_STATUS.to_string(),
            max_block_len: constants::MAX_BLOCK_LEN,
            notion: NotionSettings::default(),
            openai: OpenAiSettings::default(),
            source_properties: SourceProperties::default(),
            note_properties: NoteProperties::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or the default location when `None`.
    /// Returns defaults if the file is missing or invalid.
    pub fn load(path: Option<&Path>) -> Self {
        let default_path = crate::paths::config_path();
        let config_path = path.unwrap_or(default_path.as_path());
        match std::fs::read_to_string(config_path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %config_path.display(),
                    error = %e,
                    "Invalid settings file, using defaults"
                );
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionSettings {
    pub base_url: String,
    pub version: String,
    pub timeout_secs: u64,
    pub page_size: u32,
}

impl Default for NotionSettings {
    fn default() -> Self {
        Self {
            base_url: constants::NOTION_BASE_URL.to_string(),
            version: constants::NOTION_VERSION.to_string(),
            timeout_secs: constants::NOTION_TIMEOUT_SECS,
            page_size: constants::NOTION_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            base_url: constants::OPENAI_BASE_URL.to_string(),
            model: constants::OPENAI_MODEL.to_string(),
            timeout_secs: constants::OPENAI_TIMEOUT_SECS,
        }
    }
}

/// Notion property type holding the reading status. The query filter and the
/// page parser both key on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    #[default]
    Status,
    Select,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Select => "select",
        }
    }
}

/// Property names on the library (source) database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceProperties {
    pub title: String,
    pub date: String,
    pub genres: String,
    pub status: String,
    pub status_kind: StatusKind,
}

impl Default for SourceProperties {
    fn default() -> Self {
        Self {
            title: "Name".into(),
            date: "Date".into(),
            genres: "Genres".into(),
            status: "Status".into(),
            status_kind: StatusKind::Status,
        }
    }
}

/// Property names on the notes (target) database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteProperties {
    pub title: String,
    pub source: String,
    pub date_completed: String,
    pub genres: String,
}

impl Default for NoteProperties {
    fn default() -> Self {
        Self {
            title: "Name".into(),
            source: "Books".into(),
            date_completed: "Date Completed".into(),
            genres: "Genre".into(),
        }
    }
}
