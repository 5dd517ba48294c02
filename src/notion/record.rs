//! Library page → `SourceRecord`.
//!
//! Notion pages are navigated as `serde_json::Value` because the property
//! names come from settings. Only the title is mandatory; a missing date,
//! genre or status property reads as absent.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;

use crate::config::SourceProperties;
use crate::{NoteError, NoteResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadingStatus {
    NotStarted,
    InProgress,
    Completed,
    Other(String),
}

impl ReadingStatus {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Not started" | "Not Started" => Self::NotStarted,
            "In progress" | "In Progress" => Self::InProgress,
            "Completed" => Self::Completed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::NotStarted => "Not started",
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
            Self::Other(s) => s,
        }
    }

    /// Compare against a configured status value.
    pub fn matches(&self, target: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(target)
    }
}

/// Page cover. Only `External` covers can be copied onto a new page; `File`
/// covers are Notion-hosted, signed and short-lived.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoverImage {
    External { external: FileUrl },
    File { file: FileUrl },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileUrl {
    pub url: String,
}

impl CoverImage {
    pub fn external_url(&self) -> Option<&str> {
        match self {
            Self::External { external } => Some(&external.url),
            Self::File { .. } => None,
        }
    }
}

/// A book page from the library database.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub id: String,
    pub title: String,
    /// Raw `date.start`, validated but not normalized.
    pub date_completed: Option<String>,
    /// Genre page ids, in relation order.
    pub genres: Vec<String>,
    pub cover: Option<CoverImage>,
    pub status: Option<ReadingStatus>,
}

impl SourceRecord {
    pub fn from_page(page: &Value, props: &SourceProperties) -> NoteResult<Self> {
        let id = page
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| NoteError::malformed("<unknown>", "page has no id"))?
            .to_string();

        let properties = page.get("properties").unwrap_or(&Value::Null);
        let property = |name: &str| properties.get(name).filter(|v| !v.is_null());

        let title = property(props.title.as_str())
            .and_then(|p| p.get("title"))
            .and_then(Value::as_array)
            .and_then(|fragments| fragments.first())
            .and_then(first_fragment_text)
            .ok_or_else(|| {
                NoteError::malformed(&id, format!("property '{}' has no title fragment", props.title))
            })?;

        let date_completed = match property(props.date.as_str())
            .and_then(|p| p.get("date"))
            .and_then(|d| d.get("start"))
            .and_then(Value::as_str)
        {
            Some(start) if is_notion_date(start) => Some(start.to_string()),
            Some(start) => {
                return Err(NoteError::malformed(&id, format!("unparseable date '{}'", start)));
            }
            None => None,
        };

        let genres = property(props.genres.as_str())
            .and_then(|p| p.get("relation"))
            .and_then(Value::as_array)
            .map(|rels| {
                rels.iter()
                    .filter_map(|r| r.get("id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let cover = match page.get("cover").filter(|v| !v.is_null()) {
            Some(raw) => serde_json::from_value::<CoverImage>(raw.clone()).ok(),
            None => None,
        };

        let status = property(props.status.as_str())
            .and_then(|p| p.get(props.status_kind.as_str()))
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
            .map(ReadingStatus::from_name);

        Ok(Self {
            id,
            title,
            date_completed,
            genres,
            cover,
            status,
        })
    }

    pub fn cover_url(&self) -> Option<&str> {
        self.cover.as_ref().and_then(CoverImage::external_url)
    }
}

/// Text of a rich-text fragment: `text.content`, falling back to `plain_text`.
fn first_fragment_text(fragment: &Value) -> Option<String> {
    fragment
        .get("text")
        .and_then(|t| t.get("content"))
        .or_else(|| fragment.get("plain_text"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Notion dates are `YYYY-MM-DD` or an ISO-8601 datetime, with or without offset.
fn is_notion_date(start: &str) -> bool {
    NaiveDate::parse_from_str(start, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(start).is_ok()
        || NaiveDateTime::parse_from_str(start, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}
