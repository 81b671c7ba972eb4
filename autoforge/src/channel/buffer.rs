//! Pattern buffer with tail-bounded search.
//!
//! Only the last N bytes of the accumulated output are searched for the
//! prompt, so a chatty installer with megabytes of output stays cheap to
//! scan. Match offsets are mapped back to the full buffer so callers can
//! split the contents around the match.

use std::ops::Range;

use super::patterns::PromptMatcher;

/// Buffer for accumulating child output and searching it for a prompt.
///
/// ANSI escape codes are stripped on ingest; CLI installers colorize
/// their prompts and the escape bytes would otherwise break substring
/// matching.
#[derive(Debug)]
pub struct PatternBuffer {
    /// The accumulated, escape-stripped output.
    buffer: Vec<u8>,

    /// How many bytes from the end to search for patterns.
    ///
    /// Must cover at least one read chunk plus the pattern length, or a
    /// match could scroll past the window before it is checked.
    search_depth: usize,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let cleaned = strip_ansi_escapes::strip(data);
        self.buffer.extend_from_slice(&cleaned);
    }

    /// Search the tail of the buffer for the pattern.
    ///
    /// Returns the match range in full-buffer offsets.
    pub fn find(&self, matcher: &dyn PromptMatcher) -> Option<Range<usize>> {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        matcher
            .find_match(&self.buffer[start..])
            .map(|m| m.start + start..m.end + start)
    }

    /// Check if the tail contains a pattern match.
    pub fn contains(&self, matcher: &dyn PromptMatcher) -> bool {
        self.find(matcher).is_some()
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Get the search depth setting.
    pub fn search_depth(&self) -> usize {
        self.search_depth
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(16 * 1024)
    }
}
