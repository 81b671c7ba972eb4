//! Interruptible read loops: wait for a pattern, then drain to EOF.
//!
//! Both loops buffer incoming chunks and distinguish the three ways a
//! bounded wait on a live stream can end: the pattern appeared, the
//! stream closed, or the deadline passed. Callers decide which outcomes
//! are errors.

use std::time::Duration;

use log::{debug, trace};
use tokio::time::Instant;

use crate::channel::{PatternBuffer, PromptMatcher};
use crate::error::Result;
use crate::transport::{ReadEvent, SessionStream};

/// Outcome of waiting for a pattern on a live stream.
#[derive(Debug)]
pub enum WaitOutcome {
    /// The pattern appeared. `preamble` holds everything before the
    /// match, `remainder` everything after it that arrived in the same
    /// reads.
    Matched {
        preamble: Vec<u8>,
        remainder: Vec<u8>,
    },

    /// The stream closed first. Whatever was buffered is returned.
    Closed { partial: Vec<u8> },

    /// The deadline passed first. Whatever was buffered is returned.
    TimedOut { partial: Vec<u8> },
}

/// Outcome of the drain phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The child closed its output stream.
    Eof,

    /// The deadline passed with the stream still open.
    TimedOut,
}

/// Read until `matcher` finds the pattern, the stream closes, or
/// `timeout` elapses.
///
/// The pattern is re-checked after every chunk, so a prompt split across
/// chunk boundaries still matches once its last byte arrives.
pub async fn wait_for<S: SessionStream>(
    stream: &mut S,
    matcher: &dyn PromptMatcher,
    timeout: Duration,
    buffer: &mut PatternBuffer,
) -> Result<WaitOutcome> {
    let deadline = Instant::now() + timeout;
    loop {
        match stream.read_chunk(deadline).await? {
            ReadEvent::Data(chunk) => {
                buffer.extend(&chunk);
                if let Some(m) = buffer.find(matcher) {
                    trace!("pattern matched at bytes {}..{}", m.start, m.end);
                    let bytes = buffer.take();
                    return Ok(WaitOutcome::Matched {
                        preamble: bytes[..m.start].to_vec(),
                        remainder: bytes[m.end..].to_vec(),
                    });
                }
            }
            ReadEvent::Eof => {
                debug!("stream closed after {} bytes, no pattern", buffer.len());
                return Ok(WaitOutcome::Closed {
                    partial: buffer.take(),
                });
            }
            ReadEvent::TimedOut => {
                debug!(
                    "pattern not seen within {:?} ({} bytes buffered)",
                    timeout,
                    buffer.len()
                );
                return Ok(WaitOutcome::TimedOut {
                    partial: buffer.take(),
                });
            }
        }
    }
}

/// Read until the stream closes or `timeout` elapses, collecting
/// everything that arrives.
pub async fn drain<S: SessionStream>(
    stream: &mut S,
    timeout: Duration,
    buffer: &mut PatternBuffer,
) -> Result<(Vec<u8>, DrainOutcome)> {
    let deadline = Instant::now() + timeout;
    loop {
        match stream.read_chunk(deadline).await? {
            ReadEvent::Data(chunk) => buffer.extend(&chunk),
            ReadEvent::Eof => return Ok((buffer.take(), DrainOutcome::Eof)),
            ReadEvent::TimedOut => return Ok((buffer.take(), DrainOutcome::TimedOut)),
        }
    }
}
