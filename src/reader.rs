//! Source reader — fetch every library page whose status equals the target.
//!
//! Follows `has_more` / `next_cursor` until the query is exhausted. Pages that
//! cannot be parsed are returned as errors in place, so one bad page does not
//! hide the rest of the library.

use serde_json::{json, Value};

use crate::config::{Settings, StatusKind};
use crate::notion::{NotionApi, SourceRecord};
use crate::NoteResult;

/// Query body for one page of results.
pub fn status_query(
    status_property: &str,
    kind: StatusKind,
    target: &str,
    page_size: u32,
    cursor: Option<&str>,
) -> Value {
    let kind = kind.as_str();
    let mut body = json!({
        "filter": {
            "property": status_property,
            kind: { "equals": target }
        },
        "page_size": page_size,
    });
    if let Some(c) = cursor {
        body["start_cursor"] = json!(c);
    }
    body
}

/// Fetch all matching records from `database_id`, in query order.
///
/// The outer error is a failed query; inner errors are per-page parse failures.
pub fn fetch_records(
    api: &dyn NotionApi,
    database_id: &str,
    settings: &Settings,
) -> NoteResult<Vec<NoteResult<SourceRecord>>> {
    let props = &settings.source_properties;
    let target = settings.target_status.as_str();
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0u32;

    loop {
        let body = status_query(
            &props.status,
            props.status_kind,
            target,
            settings.notion.page_size,
            cursor.as_deref(),
        );
        let page = api.query_database(database_id, &body)?;
        pages += 1;

        for raw in &page.results {
            match SourceRecord::from_page(raw, props) {
                Ok(record) => {
                    if let Some(status) = record.status.as_ref().filter(|s| !s.matches(target)) {
                        tracing::debug!(
                            id = %record.id,
                            status = status.as_str(),
                            "Dropping record with non-matching status"
                        );
                        continue;
                    }
                    records.push(Ok(record));
                }
                Err(e) => records.push(Err(e)),
            }
        }

        match page.next_cursor {
            Some(next) if page.has_more => cursor = Some(next),
            _ => break,
        }
    }

    tracing::info!(
        database = %database_id,
        pages = pages,
        records = records.len(),
        status = target,
        "Fetched source records"
    );
    Ok(records)
}
