//! Prompt matching over raw output bytes.

use std::fmt;
use std::ops::Range;

use memchr::memmem::Finder;
use regex::bytes::Regex;

use crate::error::ChannelError;

/// Trait for prompt matching - literal substring by default, regex for
/// configurable patterns.
pub trait PromptMatcher: Send + Sync {
    /// Returns the byte range of the match, or None if no match.
    fn find_match(&self, data: &[u8]) -> Option<Range<usize>>;

    /// Check if the data matches the pattern.
    fn is_match(&self, data: &[u8]) -> bool {
        self.find_match(data).is_some()
    }
}

/// Literal substring matcher backed by a precompiled searcher.
///
/// The confirmation prompt is a fixed string, so this is the default
/// matcher for the install flow.
#[derive(Clone)]
pub struct LiteralPrompt {
    finder: Finder<'static>,
}

impl LiteralPrompt {
    /// Create a matcher for the given substring.
    pub fn new(needle: impl AsRef<[u8]>) -> Self {
        Self {
            finder: Finder::new(needle.as_ref()).into_owned(),
        }
    }

    /// The substring being searched for.
    pub fn needle(&self) -> &[u8] {
        self.finder.needle()
    }
}

impl fmt::Debug for LiteralPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiteralPrompt")
            .field("needle", &String::from_utf8_lossy(self.needle()))
            .finish()
    }
}

impl PromptMatcher for LiteralPrompt {
    fn find_match(&self, data: &[u8]) -> Option<Range<usize>> {
        self.finder
            .find(data)
            .map(|start| start..start + self.needle().len())
    }
}

/// Regex-based prompt matcher for installers whose prompt text varies.
impl PromptMatcher for Regex {
    fn find_match(&self, data: &[u8]) -> Option<Range<usize>> {
        self.find(data).map(|m| m.range())
    }
}

/// Compile a prompt pattern string into a regex.
pub fn compile_prompt(pattern: &str) -> Result<Regex, ChannelError> {
    Regex::new(pattern).map_err(ChannelError::from)
}
