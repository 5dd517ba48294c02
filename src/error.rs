use thiserror::Error;

#[derive(Error, Debug)]
pub enum NoteError {
    /// Missing or unusable configuration (credentials, database ids, settings).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A source page lacks a field the note cannot be built without.
    #[error("Malformed record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },

    /// Non-2xx answer from an external service.
    #[error("{service} API error (HTTP {status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// The completion service answered, but without usable content.
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("HTTP error: {0}")]
    Http(#[from] ureq::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NoteError {
    pub fn malformed(id: &str, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

pub type NoteResult<T> = Result<T, NoteError>;
