//! Word-window chunking.
//!
//! Chunks are the unit of embedding and storage: word-aligned windows of
//! the source text with a configurable overlap between neighbors, joined
//! back together with single spaces.

/// Splits `text` into overlapping word windows.
///
/// The window advances by `chunk_size - overlap` words per step, floored
/// at one word so the iterator always makes progress. The last window ends
/// exactly at the last word and is allowed to be shorter than
/// `chunk_size`. Empty input yields nothing; a `chunk_size` of zero yields
/// the whole text as a single chunk.
///
/// The returned iterator is lazy and owns no shared state. Call again for
/// a fresh pass.
pub fn chunk_words(text: &str, chunk_size: usize, overlap: usize) -> ChunkWords<'_> {
    let stride = chunk_size.saturating_sub(overlap).max(1);
    ChunkWords {
        text,
        words: text.split_whitespace().collect(),
        chunk_size,
        stride,
        start: 0,
        done: false,
    }
}

/// Iterator over the word windows of one text. Created by [`chunk_words`].
#[derive(Debug, Clone)]
pub struct ChunkWords<'a> {
    text: &'a str,
    words: Vec<&'a str>,
    chunk_size: usize,
    stride: usize,
    start: usize,
    done: bool,
}

impl Iterator for ChunkWords<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done || self.words.is_empty() {
            return None;
        }

        if self.chunk_size == 0 {
            self.done = true;
            return Some(self.text.to_string());
        }

        let end = (self.start + self.chunk_size).min(self.words.len());
        let chunk = self.words[self.start..end].join(" ");

        if end == self.words.len() {
            self.done = true;
        } else {
            self.start += self.stride;
        }

        Some(chunk)
    }
}
