//! PTY transport for driving an interactive child process.
//!
//! This module handles spawning the installer on a pseudo-terminal and
//! exposes its I/O as an async stream of output chunks plus a line-based
//! input channel.

mod command;
mod pty;

pub use command::CommandSpec;
pub use pty::{PtyOptions, PtyTransport};

use std::future::Future;

use bytes::Bytes;
use tokio::time::Instant;

use crate::error::Result;

/// One read from the child's output stream.
#[derive(Debug, Clone)]
pub enum ReadEvent {
    /// A chunk of output arrived.
    Data(Bytes),

    /// The child closed its output stream.
    Eof,

    /// The deadline passed before anything arrived.
    TimedOut,
}

/// Byte-stream seam the automator drives.
///
/// [`PtyTransport`] is the production implementation; tests drive the
/// confirm flow against a scripted stream instead.
pub trait SessionStream: Send {
    /// Wait for the next output chunk, EOF, or the deadline.
    fn read_chunk(&mut self, deadline: Instant) -> impl Future<Output = Result<ReadEvent>> + Send;

    /// Write a line of input (text plus a line terminator) to the child.
    fn send_line(&mut self, line: &str) -> impl Future<Output = Result<()>> + Send;

    /// Non-blocking check of the child's exit code, when one is known.
    fn exit_code(&mut self) -> Option<u32> {
        None
    }
}
