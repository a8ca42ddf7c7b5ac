//! Pattern buffer with tail-search optimization.
//!
//! Only the last N bytes of the buffer are searched for prompt patterns,
//! so long `show` outputs do not make every chunk rescan the whole reply.

use bytes::BytesMut;
use regex::bytes::Regex;

/// Buffer for accumulating output and searching it for patterns.
#[derive(Debug)]
pub struct PatternBuffer {
    buffer: BytesMut,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,
}

impl PatternBuffer {
    /// Create a new pattern buffer searching the last `search_depth` bytes.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
        }
    }

    /// Append raw bytes.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Search only the tail of the buffer for the pattern.
    ///
    /// Offsets of the returned match are relative to the search region.
    pub fn search_tail(&self, pattern: &Regex) -> Option<regex::bytes::Match<'_>> {
        pattern.find(&self.buffer[self.tail_start()..])
    }

    /// Absolute end offset of a match in the tail, if any.
    pub fn find_tail(&self, pattern: &Regex) -> Option<usize> {
        let start = self.tail_start();
        self.search_tail(pattern).map(|m| start + m.end())
    }

    /// Check if the tail contains a pattern match.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.search_tail(pattern).is_some()
    }

    /// Remove and return the first `at` bytes, keeping the rest.
    pub fn split_to(&mut self, at: usize) -> Vec<u8> {
        self.buffer.split_to(at.min(self.buffer.len())).to_vec()
    }

    /// Take the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        self.buffer.split().to_vec()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn search_depth(&self) -> usize {
        self.search_depth
    }

    fn tail_start(&self) -> usize {
        self.buffer.len().saturating_sub(self.search_depth)
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}
