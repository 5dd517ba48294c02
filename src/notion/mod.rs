pub mod client;
pub mod record;

pub use client::{NotionApi, NotionClient, QueryPage};
pub use record::{CoverImage, ReadingStatus, SourceRecord};
