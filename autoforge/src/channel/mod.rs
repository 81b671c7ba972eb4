//! Output buffering and prompt detection.
//!
//! This module accumulates child output, strips ANSI escape codes,
//! and locates the confirmation prompt in the stream.

mod buffer;
mod patterns;

pub use buffer::PatternBuffer;
pub use patterns::{LiteralPrompt, PromptMatcher, compile_prompt};
