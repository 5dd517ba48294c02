//! Shared test utilities — page builder, in-memory fakes for the Notion and
//! summary seams, and a one-shot local HTTP server for the real clients.
//!
//! Available only under `#[cfg(test)]`.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use serde_json::{json, Value};

use crate::notion::{NotionApi, QueryPage};
use crate::processing::summarizer::SummaryGenerator;
use crate::{NoteError, NoteResult};

// ============================================================================
// PageBuilder
// ============================================================================

/// Builds a library page as the Notion API returns it.
pub struct PageBuilder {
    page: Value,
}

impl PageBuilder {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            page: json!({
                "object": "page",
                "id": id,
                "cover": null,
                "properties": {
                    "Name": {
                        "type": "title",
                        "title": [{
                            "type": "text",
                            "text": { "content": title, "link": null },
                            "plain_text": title
                        }]
                    }
                }
            }),
        }
    }

    pub fn date(mut self, start: &str) -> Self {
        self.page["properties"]["Date"] = json!({
            "type": "date",
            "date": { "start": start, "end": null }
        });
        self
    }

    pub fn genres(mut self, ids: &[&str]) -> Self {
        let relation: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
        self.page["properties"]["Genres"] = json!({ "type": "relation", "relation": relation });
        self
    }

    pub fn status(mut self, name: &str) -> Self {
        self.page["properties"]["Status"] = json!({
            "type": "status",
            "status": { "name": name }
        });
        self
    }

    /// Status stored in a `select` property instead of a `status` one.
    pub fn select_status(mut self, name: &str) -> Self {
        self.page["properties"]["Status"] = json!({
            "type": "select",
            "select": { "id": "opt-1", "name": name, "color": "green" }
        });
        self
    }

    pub fn external_cover(mut self, url: &str) -> Self {
        self.page["cover"] = json!({ "type": "external", "external": { "url": url } });
        self
    }

    pub fn file_cover(mut self, url: &str) -> Self {
        self.page["cover"] = json!({
            "type": "file",
            "file": { "url": url, "expiry_time": "2026-01-01T00:00:00.000Z" }
        });
        self
    }

    pub fn build(self) -> Value {
        self.page
    }
}

// ============================================================================
// FakeNotion
// ============================================================================

/// In-memory `NotionApi`. Query results are served as fixed pages; the cursor
/// for page `n` is `cursor-n`. Successful writes are recorded.
#[derive(Default)]
pub struct FakeNotion {
    pages: RefCell<Vec<Vec<Value>>>,
    queries: RefCell<Vec<(String, Value)>>,
    created: RefCell<Vec<Value>>,
    appended: RefCell<Vec<(String, Vec<Value>)>>,
    fail_queries: Cell<bool>,
    fail_appends: Cell<bool>,
}

impl FakeNotion {
    pub fn with_pages(pages: Vec<Vec<Value>>) -> Self {
        let fake = Self::default();
        fake.set_pages(pages);
        fake
    }

    pub fn set_pages(&self, pages: Vec<Vec<Value>>) {
        *self.pages.borrow_mut() = pages;
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.set(fail);
    }

    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.set(fail);
    }

    pub fn queries(&self) -> Vec<(String, Value)> {
        self.queries.borrow().clone()
    }

    pub fn created(&self) -> Vec<Value> {
        self.created.borrow().clone()
    }

    pub fn appended(&self) -> Vec<(String, Vec<Value>)> {
        self.appended.borrow().clone()
    }
}

impl NotionApi for FakeNotion {
    fn query_database(&self, database_id: &str, body: &Value) -> NoteResult<QueryPage> {
        self.queries
            .borrow_mut()
            .push((database_id.to_string(), body.clone()));
        if self.fail_queries.get() {
            return Err(NoteError::Api {
                service: "notion",
                status: 503,
                message: "service_unavailable".into(),
            });
        }

        let index = body
            .get("start_cursor")
            .and_then(Value::as_str)
            .and_then(|c| c.strip_prefix("cursor-"))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        let pages = self.pages.borrow();
        let results = pages.get(index).cloned().unwrap_or_default();
        let has_more = index + 1 < pages.len();
        Ok(QueryPage {
            results,
            has_more,
            next_cursor: has_more.then(|| format!("cursor-{}", index + 1)),
        })
    }

    fn create_page(&self, body: &Value) -> NoteResult<String> {
        let mut created = self.created.borrow_mut();
        created.push(body.clone());
        Ok(format!("note-{}", created.len()))
    }

    fn append_children(&self, block_id: &str, children: &[Value]) -> NoteResult<()> {
        if self.fail_appends.get() {
            return Err(NoteError::Api {
                service: "notion",
                status: 502,
                message: "bad gateway".into(),
            });
        }
        self.appended
            .borrow_mut()
            .push((block_id.to_string(), children.to_vec()));
        Ok(())
    }
}

// ============================================================================
// ScriptedSummaries
// ============================================================================

/// `SummaryGenerator` returning a canned summary, failing for chosen titles.
#[derive(Default)]
pub struct ScriptedSummaries {
    failing: RefCell<HashSet<String>>,
    calls: RefCell<Vec<String>>,
    body: Option<String>,
}

impl ScriptedSummaries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `body` verbatim for every title instead of the default one-liner.
    pub fn with_body(body: &str) -> Self {
        Self {
            body: Some(body.to_string()),
            ..Self::default()
        }
    }

    pub fn fail_for(&self, title: &str) {
        self.failing.borrow_mut().insert(title.to_string());
    }

    pub fn heal(&self, title: &str) {
        self.failing.borrow_mut().remove(title);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl SummaryGenerator for ScriptedSummaries {
    fn generate(&self, title: &str) -> NoteResult<String> {
        self.calls.borrow_mut().push(title.to_string());
        if self.failing.borrow().contains(title) {
            return Err(NoteError::Api {
                service: "openai",
                status: 500,
                message: format!("boom for {}", title),
            });
        }
        Ok(self
            .body
            .clone()
            .unwrap_or_else(|| format!("Title: {}\nSummary:\n    1. Key Point", title)))
    }
}

// ============================================================================
// serve_once
// ============================================================================

/// Answer a single HTTP request on 127.0.0.1 with `status` and a JSON `body`.
///
/// Returns the base URL (`http://127.0.0.1:<port>`) and a handle that yields
/// the raw request (head and body) once it has been answered.
pub fn serve_once(status: u16, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
    let addr = listener.local_addr().expect("local addr");
    let body = body.to_string();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let request = read_request(&mut stream);
        let reason = if (200..300).contains(&status) { "OK" } else { "Error" };
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reason,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).expect("write response");
        stream.flush().ok();
        request
    });

    (format!("http://{}", addr), handle)
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).expect("read request");
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);
        if request_complete(&raw) {
            break;
        }
    }
    String::from_utf8_lossy(&raw).into_owned()
}

fn request_complete(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    let Some(head_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let head = text[..head_end].to_ascii_lowercase();
    let body_len = raw.len() - (head_end + 4);

    if head.contains("transfer-encoding: chunked") {
        return text.ends_with("0\r\n\r\n");
    }
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    body_len >= content_length
}
