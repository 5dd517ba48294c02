pub mod chunker;
pub mod summarizer;
