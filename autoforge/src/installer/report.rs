//! Result of one automated install run.

use std::time::Duration;

/// How the run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The prompt was confirmed and the child ran to completion.
    Confirmed {
        /// Output captured after the prompt, line endings normalized.
        output: String,
    },

    /// The confirmation prompt never appeared within the wait window.
    PromptTimeout,
}

/// Report for a completed run.
#[derive(Debug, Clone)]
pub struct InstallReport {
    /// How the run ended.
    pub outcome: InstallOutcome,

    /// Wall time from spawn to completion.
    pub elapsed: Duration,

    /// The child's exit code, when it was observed.
    pub exit_code: Option<u32>,
}

impl InstallReport {
    /// Build a report for a confirmed run.
    pub fn confirmed(output: impl Into<String>, elapsed: Duration, exit_code: Option<u32>) -> Self {
        Self {
            outcome: InstallOutcome::Confirmed {
                output: output.into(),
            },
            elapsed,
            exit_code,
        }
    }

    /// Build a report for a run whose prompt never appeared.
    pub fn prompt_timeout(elapsed: Duration) -> Self {
        Self {
            outcome: InstallOutcome::PromptTimeout,
            elapsed,
            exit_code: None,
        }
    }

    /// Whether the prompt was confirmed.
    pub fn is_confirmed(&self) -> bool {
        matches!(self.outcome, InstallOutcome::Confirmed { .. })
    }

    /// The text printed for this run, ahead of the completion line.
    ///
    /// An empty capture renders as an empty string, never a missing
    /// value.
    pub fn render(&self) -> &str {
        match &self.outcome {
            InstallOutcome::Confirmed { output } => output,
            InstallOutcome::PromptTimeout => "Timeout - prompt not found",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_confirmed() {
        let report =
            InstallReport::confirmed("Installed successfully", Duration::from_secs(3), Some(0));
        assert!(report.is_confirmed());
        assert_eq!(report.render(), "Installed successfully");
    }

    #[test]
    fn test_render_empty_capture_is_empty_string() {
        let report = InstallReport::confirmed("", Duration::from_secs(3), Some(0));
        assert_eq!(report.render(), "");
    }

    #[test]
    fn test_render_prompt_timeout() {
        let report = InstallReport::prompt_timeout(Duration::from_secs(20));
        assert!(!report.is_confirmed());
        assert_eq!(report.render(), "Timeout - prompt not found");
    }
}
