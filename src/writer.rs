//! Note writer — turn one library record into a summary page in the notes
//! database.
//!
//! Pipeline: title → summary (LLM) → chunks → `NoteRecord` → create page.
//! The page body is a `heading_2` "Summary of {title}" followed by one
//! paragraph per chunk. Notion accepts at most 100 children per request, so
//! longer bodies are completed with ordered append calls.
//!
//! No idempotence guard here: every call creates a new page. Dedup is the
//! poll loop's job. Once the create call succeeds the note exists, so a failed
//! append is reported on the `WrittenNote` instead of as an error.

use serde_json::{json, Value};

use crate::config::{NoteProperties, Settings};
use crate::constants::NOTION_MAX_CHILDREN;
use crate::notion::{NotionApi, SourceRecord};
use crate::processing::chunker;
use crate::processing::summarizer::SummaryGenerator;
use crate::{NoteError, NoteResult};

/// Body content unit of a note page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading2(String),
    Paragraph(String),
}

impl Block {
    pub fn to_json(&self) -> Value {
        let (kind, text) = match self {
            Self::Heading2(t) => ("heading_2", t),
            Self::Paragraph(t) => ("paragraph", t),
        };
        json!({
            "object": "block",
            "type": kind,
            kind: { "rich_text": [rich_text(text)] }
        })
    }
}

/// A note page to be created, linked back to its source record.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteRecord {
    pub title: String,
    pub cover_url: Option<String>,
    pub source_id: String,
    /// Notion `date.start`, copied as-is (date or datetime).
    pub date_completed: Option<String>,
    pub genres: Vec<String>,
    pub blocks: Vec<Block>,
}

impl NoteRecord {
    /// Assemble the note for `record` from an already generated summary.
    pub fn from_summary(record: &SourceRecord, summary: &str, max_block_len: usize) -> Self {
        let mut blocks = vec![Block::Heading2(format!("Summary of {}", record.title))];
        blocks.extend(
            chunker::Chunks::new(summary, max_block_len).map(|c| Block::Paragraph(c.to_string())),
        );

        Self {
            title: record.title.clone(),
            cover_url: record.cover_url().map(str::to_string),
            source_id: record.id.clone(),
            date_completed: record.date_completed.clone(),
            genres: record.genres.clone(),
            blocks,
        }
    }

    pub fn properties_json(&self, props: &NoteProperties) -> Value {
        let mut properties = serde_json::Map::new();
        properties.insert(
            props.title.clone(),
            json!({ "title": [{ "text": { "content": self.title } }] }),
        );
        properties.insert(
            props.source.clone(),
            json!({ "relation": [{ "id": self.source_id }] }),
        );
        properties.insert(
            props.date_completed.clone(),
            json!({
                "date": self.date_completed.as_ref().map(|start| json!({ "start": start }))
            }),
        );
        let genres: Vec<Value> = self.genres.iter().map(|id| json!({ "id": id })).collect();
        properties.insert(props.genres.clone(), json!({ "relation": genres }));
        Value::Object(properties)
    }

    /// Request body for `POST /pages`, carrying the first batch of blocks.
    pub fn create_body(&self, parent_db_id: &str, props: &NoteProperties) -> Value {
        let first_batch: Vec<Value> = self
            .blocks
            .iter()
            .take(NOTION_MAX_CHILDREN)
            .map(Block::to_json)
            .collect();

        let mut body = json!({
            "parent": { "database_id": parent_db_id },
            "properties": self.properties_json(props),
            "children": first_batch,
        });
        if let Some(url) = &self.cover_url {
            body["cover"] = json!({ "type": "external", "external": { "url": url } });
        }
        body
    }

    /// Blocks that did not fit in the create request, in append-sized batches.
    pub fn overflow_batches(&self) -> Vec<Vec<Value>> {
        self.blocks
            .iter()
            .skip(NOTION_MAX_CHILDREN)
            .map(Block::to_json)
            .collect::<Vec<_>>()
            .chunks(NOTION_MAX_CHILDREN)
            .map(<[Value]>::to_vec)
            .collect()
    }
}

fn rich_text(content: &str) -> Value {
    json!({ "type": "text", "text": { "content": content } })
}

/// A page that was created in the notes database.
#[derive(Debug)]
pub struct WrittenNote {
    pub page_id: String,
    /// Set when an overflow append failed. Later batches were not sent, so the
    /// page body stops at the last successful batch.
    pub append_error: Option<NoteError>,
}

impl WrittenNote {
    pub fn is_complete(&self) -> bool {
        self.append_error.is_none()
    }
}

/// Generate, chunk and persist a note for `record`.
///
/// Errors only when nothing was written (summary or create call failed).
pub fn create_note(
    api: &dyn NotionApi,
    generator: &dyn SummaryGenerator,
    record: &SourceRecord,
    notes_db_id: &str,
    settings: &Settings,
) -> NoteResult<WrittenNote> {
    let summary = generator.generate(&record.title)?;
    let note = NoteRecord::from_summary(record, &summary, settings.max_block_len);

    let page_id = api.create_page(&note.create_body(notes_db_id, &settings.note_properties))?;

    let overflow = note.overflow_batches();
    let mut append_error = None;
    for (index, batch) in overflow.iter().enumerate() {
        if let Err(e) = api.append_children(&page_id, batch) {
            tracing::warn!(
                source_id = %record.id,
                page_id = %page_id,
                batch = index + 1,
                batches = overflow.len(),
                error = %e,
                "Append failed, note left incomplete"
            );
            append_error = Some(e);
            break;
        }
    }

    tracing::info!(
        source_id = %record.id,
        page_id = %page_id,
        title = %note.title,
        blocks = note.blocks.len(),
        append_batches = overflow.len(),
        has_cover = note.cover_url.is_some(),
        complete = append_error.is_none(),
        "Created note"
    );
    Ok(WrittenNote {
        page_id,
        append_error,
    })
}
