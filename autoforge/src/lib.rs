//! # Autoforge
//!
//! Auto-confirms the scopes prompt when installing Atlassian Forge apps.
//!
//! `forge install` stops on an interactive confirmation before granting
//! scopes, which breaks unattended installs. Autoforge spawns the CLI on
//! a pseudo-terminal so it behaves exactly as it would for a human
//! operator, waits for the confirmation prompt, answers it, and collects
//! the rest of the output.
//!
//! ## Features
//!
//! - PTY-backed child process via portable-pty
//! - Incremental prompt detection with tail-bounded buffer search
//! - Credentials injected into the child environment, never hardcoded
//!   and never set on the calling process
//! - Match / stream-closed / timed-out distinguished as first-class
//!   outcomes for both the prompt wait and the drain
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use autoforge::{Credentials, InstallerConfig, installer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), autoforge::Error> {
//!     let config = InstallerConfig::builder("example.atlassian.net").build()?;
//!     let credentials = Credentials::from_env()?;
//!
//!     let report = installer::run_install(&config, &credentials).await?;
//!     println!("{}", report.render());
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod error;
pub mod installer;
pub mod transport;

// Re-export main types for convenience
pub use error::Error;
pub use installer::{
    Credentials, InstallAutomator, InstallOutcome, InstallReport, InstallerBuilder,
    InstallerConfig, run_install,
};
pub use transport::{CommandSpec, PtyOptions, PtyTransport, ReadEvent, SessionStream};
