// === Polling ===
pub const POLL_INTERVAL_SECS: u64 = 12 * 3600; // 12h between cycles
pub const SHUTDOWN_CHECK_MS: u64 = 500;
pub const TARGET_STATUS: &str = "Completed";

// === Chunking ===
pub const MAX_BLOCK_LEN: usize = 2_000; // Notion rich_text content limit

// === Notion ===
pub const NOTION_BASE_URL: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";
pub const NOTION_PAGE_SIZE: u32 = 100;
pub const NOTION_MAX_CHILDREN: usize = 100; // per create/append request
pub const NOTION_TIMEOUT_SECS: u64 = 60;

// === OpenAI ===
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_MODEL: &str = "gpt-4o-mini";
pub const OPENAI_TIMEOUT_SECS: u64 = 300; // long outlines take a while

// === Environment ===
pub const ENV_NOTION_TOKEN: &str = "NotionAPI";
pub const ENV_LIBRARY_ID: &str = "LibraryID";
pub const ENV_NOTES_ID: &str = "NotesID";
pub const ENV_OPENAI_KEY: &str = "OpenAIAPI";

/// Truncate a string at a char boundary (UTF-8 safe), for log previews.
pub fn truncate_safe(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
