//! booknotes — summarize completed books from a Notion library.
//!
//! Polls a library database for books marked completed, asks a chat
//! completion model for a structured summary of each, and writes the summary
//! as a new page in a notes database, linked back to the book.

// Foundation
pub mod config;
pub mod constants;
pub mod error;
pub mod paths;
pub mod shutdown;
pub mod tracing_init;

// External services
pub mod notion;
pub mod openai;

// Pipeline
pub mod processing;
pub mod reader;
pub mod writer;
pub mod poller;

#[cfg(test)]
pub mod test_helpers;

// Re-exports for convenience
pub use error::{NoteError, NoteResult};
