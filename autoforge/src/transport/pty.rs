//! Local PTY transport built on portable-pty.
//!
//! The child runs attached to a pseudo-terminal so it behaves exactly as
//! it would for a human operator: interactive prompts are written to the
//! terminal and input is read from it. A dedicated reader thread forwards
//! master-side output into a bounded async channel; the blocking PTY read
//! never touches the async runtime.

use std::io::{ErrorKind, Read, Write};
use std::thread;

use bytes::Bytes;
use log::{debug, trace, warn};
use portable_pty::{Child, CommandBuilder, MasterPty, PtySize, native_pty_system};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::command::CommandSpec;
use super::{ReadEvent, SessionStream};
use crate::error::{Result, TransportError};

/// PTY geometry and buffering configuration.
#[derive(Debug, Clone)]
pub struct PtyOptions {
    /// Terminal height.
    pub rows: u16,

    /// Terminal width. Wide by default so the prompt is never wrapped
    /// across lines by the terminal.
    pub cols: u16,

    /// Read buffer size for the PTY master.
    pub read_buffer_size: usize,

    /// Capacity of the output chunk channel.
    pub channel_capacity: usize,
}

impl Default for PtyOptions {
    fn default() -> Self {
        Self {
            rows: 24,
            cols: 511,
            read_buffer_size: 8192,
            channel_capacity: 64,
        }
    }
}

/// A child process attached to a local pseudo-terminal.
pub struct PtyTransport {
    child: Box<dyn Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
    chunks: mpsc::Receiver<Bytes>,

    /// Keeps the master side of the pair open for the life of the session.
    _master: Box<dyn MasterPty + Send>,
}

impl std::fmt::Debug for PtyTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyTransport").finish_non_exhaustive()
    }
}

impl PtyTransport {
    /// Spawn the command on a fresh PTY.
    ///
    /// The command's environment pairs are applied to the command
    /// builder, on top of the inherited environment. Spawn failures are
    /// returned, not swallowed.
    pub fn spawn(spec: &CommandSpec, opts: &PtyOptions) -> Result<Self> {
        let pty = native_pty_system();
        let pair = pty
            .openpty(PtySize {
                rows: opts.rows,
                cols: opts.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| TransportError::PtyOpen(e.to_string()))?;

        let mut cmd = CommandBuilder::new(spec.program());
        cmd.args(spec.argv());
        for (key, value) in spec.env_pairs() {
            cmd.env(key, value);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| TransportError::Spawn {
                command: spec.program().to_string(),
                message: e.to_string(),
            })?;

        // The child holds its own slave handle now; dropping ours lets the
        // master observe EOF once the child exits.
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| TransportError::PtyOpen(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| TransportError::PtyOpen(e.to_string()))?;

        let (tx, rx) = mpsc::channel(opts.channel_capacity);
        spawn_reader(reader, tx, opts.read_buffer_size);

        debug!("spawned {} on a {}x{} pty", spec, opts.cols, opts.rows);

        Ok(Self {
            child,
            writer,
            chunks: rx,
            _master: pair.master,
        })
    }
}

impl SessionStream for PtyTransport {
    async fn read_chunk(&mut self, deadline: Instant) -> Result<ReadEvent> {
        match tokio::time::timeout_at(deadline, self.chunks.recv()).await {
            Ok(Some(chunk)) => {
                trace!("read {} bytes from pty", chunk.len());
                Ok(ReadEvent::Data(chunk))
            }
            Ok(None) => Ok(ReadEvent::Eof),
            Err(_) => Ok(ReadEvent::TimedOut),
        }
    }

    async fn send_line(&mut self, line: &str) -> Result<()> {
        // A few bytes into the kernel PTY buffer; the write is bounded.
        self.writer
            .write_all(line.as_bytes())
            .map_err(TransportError::Io)?;
        self.writer.write_all(b"\n").map_err(TransportError::Io)?;
        self.writer.flush().map_err(TransportError::Io)?;
        trace!("sent line ({} bytes)", line.len() + 1);
        Ok(())
    }

    fn exit_code(&mut self) -> Option<u32> {
        match self.child.try_wait() {
            Ok(Some(status)) => Some(status.exit_code()),
            _ => None,
        }
    }
}

impl Drop for PtyTransport {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            warn!("child still running at drop, killing it");
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Forward master-side output into the chunk channel until EOF.
///
/// The thread exits on EOF, on EIO (how the master reports the child side
/// going away), or when the receiving side is dropped.
fn spawn_reader(mut reader: Box<dyn Read + Send>, tx: mpsc::Sender<Bytes>, buffer_size: usize) {
    thread::spawn(move || {
        let mut buf = vec![0u8; buffer_size];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.blocking_send(Bytes::copy_from_slice(&buf[..n])).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    trace!("pty reader stopping: {e}");
                    break;
                }
            }
        }
    });
}
