//! Drives the confirm-and-drain flow over a session stream.

use std::time::Instant;

use log::{debug, warn};

use super::config::InstallerConfig;
use super::credentials::Credentials;
use super::expect::{self, DrainOutcome, WaitOutcome};
use super::report::InstallReport;
use crate::channel::PatternBuffer;
use crate::error::{ChannelError, Result};
use crate::transport::{PtyTransport, SessionStream};

/// Automates a single interactive install: wait for the confirmation
/// prompt, reply once, drain the rest of the output.
///
/// The flow is linear: spawn is the caller's job, then
/// `{waiting-for-prompt}` either matches (reply, drain to EOF) or times
/// out (reported, nothing sent). A stream that closes before the prompt
/// and a drain that outlives its window are errors.
pub struct InstallAutomator<S> {
    stream: S,
    config: InstallerConfig,
}

impl<S: SessionStream> InstallAutomator<S> {
    /// Create an automator over an already-spawned stream.
    pub fn new(stream: S, config: InstallerConfig) -> Self {
        Self { stream, config }
    }

    /// Run the confirmation flow to completion.
    pub async fn run(mut self) -> Result<InstallReport> {
        let started = Instant::now();
        let matcher = self.config.matcher()?;
        // The search window must cover a full read plus the prompt, or a
        // match could scroll past before it is checked.
        let mut buffer = PatternBuffer::new(self.config.pty.read_buffer_size * 2);

        let outcome = expect::wait_for(
            &mut self.stream,
            matcher.as_ref(),
            self.config.confirm_timeout,
            &mut buffer,
        )
        .await?;

        match outcome {
            WaitOutcome::Matched { preamble, remainder } => {
                debug!(
                    "prompt matched after {} bytes: {:?}",
                    preamble.len(),
                    String::from_utf8_lossy(&preamble)
                );
                self.stream.send_line(&self.config.reply).await?;

                let (drained, drain_outcome) =
                    expect::drain(&mut self.stream, self.config.drain_timeout, &mut buffer).await?;
                if drain_outcome == DrainOutcome::TimedOut {
                    warn!(
                        "child kept producing output past {:?}",
                        self.config.drain_timeout
                    );
                    return Err(ChannelError::DrainTimeout(self.config.drain_timeout).into());
                }

                let mut bytes = remainder;
                bytes.extend_from_slice(&drained);
                let output = normalize_output(&bytes);
                let exit_code = self.stream.exit_code();
                debug!(
                    "drain complete: {} bytes, exit code {:?}, elapsed {:?}",
                    bytes.len(),
                    exit_code,
                    started.elapsed()
                );
                Ok(InstallReport::confirmed(output, started.elapsed(), exit_code))
            }
            WaitOutcome::TimedOut { partial } => {
                debug!(
                    "prompt not found; {} bytes of output before the window closed",
                    partial.len()
                );
                Ok(InstallReport::prompt_timeout(started.elapsed()))
            }
            WaitOutcome::Closed { partial } => {
                warn!(
                    "child exited before the confirmation prompt ({} bytes of output)",
                    partial.len()
                );
                Err(ChannelError::Closed.into())
            }
        }
    }
}

/// Spawn the forge CLI and run the confirmation flow against it.
pub async fn run_install(
    config: &InstallerConfig,
    credentials: &Credentials,
) -> Result<InstallReport> {
    let spec = config.command_spec(credentials);
    let stream = PtyTransport::spawn(&spec, &config.pty)?;
    InstallAutomator::new(stream, config.clone()).run().await
}

/// Collapse PTY line endings and drop surrounding newlines, so the
/// captured output reads like a terminal transcript.
fn normalize_output(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let mut text = text.replace("\r\n", "\n");
    text.retain(|c| c != '\r');
    text.trim_matches('\n').to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;
    use tokio::time::Instant;

    use super::*;
    use crate::error::Error;
    use crate::installer::config::SCOPES_PROMPT;
    use crate::installer::report::InstallOutcome;
    use crate::transport::ReadEvent;

    /// Scripted child session that records what was sent to it.
    struct FakeSession {
        script: VecDeque<ReadEvent>,
        sent: Arc<Mutex<Vec<String>>>,
        exit: Option<u32>,
    }

    impl FakeSession {
        fn new(events: impl IntoIterator<Item = ReadEvent>) -> (Self, Arc<Mutex<Vec<String>>>) {
            let sent = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    script: events.into_iter().collect(),
                    sent: sent.clone(),
                    exit: Some(0),
                },
                sent,
            )
        }

        fn data(text: &str) -> ReadEvent {
            ReadEvent::Data(Bytes::copy_from_slice(text.as_bytes()))
        }
    }

    impl SessionStream for FakeSession {
        async fn read_chunk(&mut self, _deadline: Instant) -> Result<ReadEvent> {
            Ok(self.script.pop_front().unwrap_or(ReadEvent::Eof))
        }

        async fn send_line(&mut self, line: &str) -> Result<()> {
            self.sent.lock().unwrap().push(line.to_string());
            Ok(())
        }

        fn exit_code(&mut self) -> Option<u32> {
            self.exit
        }
    }

    fn config() -> InstallerConfig {
        InstallerConfig::builder("example.atlassian.net").build().unwrap()
    }

    #[tokio::test]
    async fn test_prompt_is_confirmed_exactly_once() {
        let (session, sent) = FakeSession::new([
            FakeSession::data("Deploying app...\r\n"),
            FakeSession::data(SCOPES_PROMPT),
            FakeSession::data(" y\r\nInstalled successfully\r\n"),
            ReadEvent::Eof,
        ]);

        let report = InstallAutomator::new(session, config()).run().await.unwrap();

        assert_eq!(sent.lock().unwrap().as_slice(), ["y"]);
        match report.outcome {
            InstallOutcome::Confirmed { ref output } => {
                assert_eq!(output, " y\nInstalled successfully");
            }
            ref other => panic!("expected confirmation, got {other:?}"),
        }
        assert_eq!(report.exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_prompt_split_across_chunks_still_matches() {
        let (session, sent) = FakeSession::new([
            FakeSession::data("Are you sure you w"),
            FakeSession::data("ant to proceed?"),
            FakeSession::data("\r\nInstalled successfully\r\n"),
            ReadEvent::Eof,
        ]);

        let report = InstallAutomator::new(session, config()).run().await.unwrap();

        assert_eq!(sent.lock().unwrap().len(), 1);
        assert!(report.is_confirmed());
        assert_eq!(report.render(), "Installed successfully");
    }

    #[tokio::test]
    async fn test_prompt_timeout_sends_nothing() {
        let (session, sent) = FakeSession::new([
            FakeSession::data("still deploying..."),
            ReadEvent::TimedOut,
        ]);

        let report = InstallAutomator::new(session, config()).run().await.unwrap();

        assert!(sent.lock().unwrap().is_empty());
        assert_eq!(report.outcome, InstallOutcome::PromptTimeout);
        assert_eq!(report.render(), "Timeout - prompt not found");
    }

    #[tokio::test]
    async fn test_empty_capture_renders_empty() {
        let (session, _sent) =
            FakeSession::new([FakeSession::data(SCOPES_PROMPT), ReadEvent::Eof]);

        let report = InstallAutomator::new(session, config()).run().await.unwrap();

        assert!(report.is_confirmed());
        assert_eq!(report.render(), "");
    }

    #[tokio::test]
    async fn test_close_before_prompt_is_an_error() {
        let (session, _sent) =
            FakeSession::new([FakeSession::data("error: site not found\r\n"), ReadEvent::Eof]);

        let err = InstallAutomator::new(session, config()).run().await.unwrap_err();
        assert!(matches!(err, Error::Channel(ChannelError::Closed)));
    }

    #[tokio::test]
    async fn test_drain_timeout_is_an_error() {
        let (session, _sent) = FakeSession::new([
            FakeSession::data(SCOPES_PROMPT),
            FakeSession::data("endless output"),
            ReadEvent::TimedOut,
        ]);

        let err = InstallAutomator::new(session, config()).run().await.unwrap_err();
        assert!(matches!(err, Error::Channel(ChannelError::DrainTimeout(_))));
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output(b"a\r\nb\r\n"), "a\nb");
        assert_eq!(normalize_output(b"\r\nleading\r\n"), "leading");
        assert_eq!(normalize_output(b"plain"), "plain");
        assert_eq!(normalize_output(b"stray\rcr"), "straycr");
        assert_eq!(normalize_output(b""), "");
    }

    #[cfg(unix)]
    mod pty {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Duration;

        use super::*;
        use crate::installer::run_install;

        const FAKE_FORGE: &str = "#!/bin/sh\n\
            echo \"Deploying app to $2...\"\n\
            printf 'Are you sure you want to proceed? '\n\
            read answer\n\
            if [ \"$answer\" = \"y\" ]; then\n\
                echo \"Installed successfully\"\n\
            else\n\
                echo \"Aborted\"\n\
                exit 1\n\
            fi\n";

        #[tokio::test]
        async fn test_confirms_a_scripted_installer() {
            let dir = tempfile::tempdir().unwrap();
            let script = dir.path().join("fake-forge");
            std::fs::write(&script, FAKE_FORGE).unwrap();
            let mut perms = std::fs::metadata(&script).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&script, perms).unwrap();

            let config = InstallerConfig::builder("example.atlassian.net")
                .forge_bin(script.to_str().unwrap())
                .confirm_timeout(Duration::from_secs(10))
                .drain_timeout(Duration::from_secs(10))
                .build()
                .unwrap();
            let credentials = Credentials::new("dev@example.com", "tok-123");

            let report = run_install(&config, &credentials).await.unwrap();

            assert!(report.is_confirmed());
            assert!(
                report.render().contains("Installed successfully"),
                "output: {:?}",
                report.render()
            );
        }
    }
}
