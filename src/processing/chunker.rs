//! Split long summaries into bounded blocks.
//!
//! Notion caps a rich_text fragment at 2000 characters, so a summary is cut
//! into paragraphs no longer than that. Cuts prefer the last newline before
//! the limit; otherwise the text is cut hard at the limit. After each cut the
//! remainder is trimmed, so blocks never start or end with stray whitespace
//! from the cut itself.
//!
//! Lengths are in characters, not bytes: a cut never lands inside a UTF-8
//! sequence.

/// Lazy iterator over the blocks of `text`.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: Option<&'a str>,
    max_len: usize,
}

impl<'a> Chunks<'a> {
    pub fn new(text: &'a str, max_len: usize) -> Self {
        Self {
            rest: Some(text),
            max_len: max_len.max(1),
        }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;

        // Byte offset of the first char past the limit; None means it fits.
        let Some((boundary, _)) = rest.char_indices().nth(self.max_len) else {
            self.rest = None;
            return Some(rest);
        };

        let cut = match rest[..boundary].rfind('\n') {
            Some(idx) if idx > 0 => idx,
            _ => boundary,
        };

        let remainder = rest[cut..].trim();
        self.rest = (!remainder.is_empty()).then_some(remainder);
        Some(&rest[..cut])
    }
}

/// Split `text` into owned blocks of at most `max_len` characters.
///
/// Always returns at least one block; an empty input yields a single empty
/// block.
pub fn split_text_into_blocks(text: &str, max_len: usize) -> Vec<String> {
    Chunks::new(text, max_len).map(str::to_string).collect()
}
