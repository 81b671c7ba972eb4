//! Install run configuration.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::credentials::Credentials;
use crate::channel::{LiteralPrompt, PromptMatcher, compile_prompt};
use crate::error::{InstallError, Result};
use crate::transport::{CommandSpec, PtyOptions};

/// Confirmation prompt the forge CLI prints before granting scopes.
pub const SCOPES_PROMPT: &str = "Are you sure you want to proceed?";

/// Reply that accepts the prompt.
pub const CONFIRM_REPLY: &str = "y";

/// Environment variable fallback for the target site.
pub const SITE_VAR: &str = "FORGE_SITE";

/// Environment variable fallback for the target product.
pub const PRODUCT_VAR: &str = "FORGE_PRODUCT";

const DEFAULT_PRODUCT: &str = "jira";
const DEFAULT_FORGE_BIN: &str = "forge";
const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for one automated install run.
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    /// Target site, e.g. `acme.atlassian.net`.
    pub site: String,

    /// Target product, e.g. `jira`.
    pub product: String,

    /// Path to the forge binary, for hosts where it is not on `PATH`.
    pub forge_bin: String,

    /// Prompt text to wait for.
    pub prompt: String,

    /// Whether `prompt` is a regex rather than a literal substring.
    pub prompt_is_regex: bool,

    /// Reply sent when the prompt appears.
    pub reply: String,

    /// How long to wait for the prompt.
    pub confirm_timeout: Duration,

    /// How long to wait for the child to finish after the reply.
    pub drain_timeout: Duration,

    /// PTY geometry and buffering.
    pub pty: PtyOptions,
}

impl InstallerConfig {
    /// Start building a configuration for the given site.
    pub fn builder(site: impl Into<String>) -> InstallerBuilder {
        InstallerBuilder {
            config: InstallerConfig {
                site: site.into(),
                product: DEFAULT_PRODUCT.to_string(),
                forge_bin: DEFAULT_FORGE_BIN.to_string(),
                prompt: SCOPES_PROMPT.to_string(),
                prompt_is_regex: false,
                reply: CONFIRM_REPLY.to_string(),
                confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
                drain_timeout: DEFAULT_DRAIN_TIMEOUT,
                pty: PtyOptions::default(),
            },
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| InstallError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&text).map_err(InstallError::ConfigParse)?;

        let builder = Self::builder(file.site)
            .product(file.product)
            .forge_bin(file.forge_bin)
            .reply(file.reply)
            .confirm_timeout(Duration::from_secs(file.confirm_timeout_secs))
            .drain_timeout(Duration::from_secs(file.drain_timeout_secs));
        let builder = if file.prompt_is_regex {
            builder.prompt_regex(file.prompt)
        } else {
            builder.prompt_literal(file.prompt)
        };
        builder.build()
    }

    /// Build configuration from `FORGE_SITE` / `FORGE_PRODUCT` when no
    /// config file is present.
    pub fn from_env() -> Result<Self> {
        Self::from_env_lookup(|var| env::var(var).ok())
    }

    fn from_env_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let site = lookup(SITE_VAR)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| InstallError::InvalidConfig {
                message: format!("no config file and {SITE_VAR} is not set"),
            })?;
        let mut builder = Self::builder(site);
        if let Some(product) = lookup(PRODUCT_VAR).filter(|v| !v.is_empty()) {
            builder = builder.product(product);
        }
        builder.build()
    }

    /// Compile the prompt matcher for this configuration.
    pub fn matcher(&self) -> Result<Box<dyn PromptMatcher>> {
        if self.prompt_is_regex {
            Ok(Box::new(compile_prompt(&self.prompt)?))
        } else {
            Ok(Box::new(LiteralPrompt::new(&self.prompt)))
        }
    }

    /// Build the install command for this configuration.
    ///
    /// The argument list is deterministic: always `install`, the site
    /// flag, the product flag, and the confirmation flag, in that order.
    pub fn command_spec(&self, credentials: &Credentials) -> CommandSpec {
        let mut spec = CommandSpec::new(&self.forge_bin)
            .arg("install")
            .arg("-s")
            .arg(&self.site)
            .arg("-p")
            .arg(&self.product)
            .arg("--confirm-scopes");
        for (key, value) in credentials.child_env() {
            spec = spec.env(key, value);
        }
        spec
    }
}

/// Builder for [`InstallerConfig`].
#[derive(Debug, Clone)]
pub struct InstallerBuilder {
    config: InstallerConfig,
}

impl InstallerBuilder {
    /// Set the target product (default: `jira`).
    pub fn product(mut self, product: impl Into<String>) -> Self {
        self.config.product = product.into();
        self
    }

    /// Set the forge binary path (default: `forge`).
    pub fn forge_bin(mut self, path: impl Into<String>) -> Self {
        self.config.forge_bin = path.into();
        self
    }

    /// Wait for a literal prompt substring.
    pub fn prompt_literal(mut self, text: impl Into<String>) -> Self {
        self.config.prompt = text.into();
        self.config.prompt_is_regex = false;
        self
    }

    /// Wait for a regex prompt pattern.
    pub fn prompt_regex(mut self, pattern: impl Into<String>) -> Self {
        self.config.prompt = pattern.into();
        self.config.prompt_is_regex = true;
        self
    }

    /// Set the reply sent when the prompt appears (default: `y`).
    pub fn reply(mut self, reply: impl Into<String>) -> Self {
        self.config.reply = reply.into();
        self
    }

    /// Set the prompt wait cap (default: 20 seconds).
    pub fn confirm_timeout(mut self, timeout: Duration) -> Self {
        self.config.confirm_timeout = timeout;
        self
    }

    /// Set the drain cap (default: 60 seconds).
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.config.drain_timeout = timeout;
        self
    }

    /// Set the PTY options.
    pub fn pty(mut self, pty: PtyOptions) -> Self {
        self.config.pty = pty;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<InstallerConfig> {
        let config = self.config;
        if config.site.is_empty() {
            return Err(invalid("site must not be empty"));
        }
        if config.product.is_empty() {
            return Err(invalid("product must not be empty"));
        }
        if config.prompt.is_empty() {
            return Err(invalid("prompt must not be empty"));
        }
        if config.reply.is_empty() {
            return Err(invalid("reply must not be empty"));
        }
        if config.prompt_is_regex {
            // Surface a bad pattern here rather than mid-run.
            compile_prompt(&config.prompt)?;
        }
        Ok(config)
    }
}

fn invalid(message: &str) -> crate::error::Error {
    InstallError::InvalidConfig {
        message: message.to_string(),
    }
    .into()
}

/// On-disk configuration file shape.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    site: String,

    #[serde(default = "default_product")]
    product: String,

    #[serde(default = "default_forge_bin")]
    forge_bin: String,

    #[serde(default = "default_prompt")]
    prompt: String,

    #[serde(default)]
    prompt_is_regex: bool,

    #[serde(default = "default_reply")]
    reply: String,

    #[serde(default = "default_confirm_secs")]
    confirm_timeout_secs: u64,

    #[serde(default = "default_drain_secs")]
    drain_timeout_secs: u64,
}

fn default_product() -> String {
    DEFAULT_PRODUCT.to_string()
}

fn default_forge_bin() -> String {
    DEFAULT_FORGE_BIN.to_string()
}

fn default_prompt() -> String {
    SCOPES_PROMPT.to_string()
}

fn default_reply() -> String {
    CONFIRM_REPLY.to_string()
}

fn default_confirm_secs() -> u64 {
    DEFAULT_CONFIRM_TIMEOUT.as_secs()
}

fn default_drain_secs() -> u64 {
    DEFAULT_DRAIN_TIMEOUT.as_secs()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = InstallerConfig::builder("acme.atlassian.net").build().unwrap();
        assert_eq!(config.product, "jira");
        assert_eq!(config.forge_bin, "forge");
        assert_eq!(config.prompt, SCOPES_PROMPT);
        assert_eq!(config.reply, "y");
        assert_eq!(config.confirm_timeout, Duration::from_secs(20));
        assert_eq!(config.drain_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_builder_rejects_empty_site() {
        assert!(InstallerConfig::builder("").build().is_err());
    }

    #[test]
    fn test_builder_rejects_bad_regex_prompt() {
        let err = InstallerConfig::builder("acme.atlassian.net")
            .prompt_regex("proceed[")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("pattern"));
    }

    #[test]
    fn test_command_spec_is_stable() {
        let config = InstallerConfig::builder("acme.atlassian.net").build().unwrap();
        let creds = Credentials::new("dev@example.com", "tok-123");

        let spec = config.command_spec(&creds);
        assert_eq!(spec.program(), "forge");
        assert_eq!(
            spec.argv(),
            [
                "install",
                "-s",
                "acme.atlassian.net",
                "-p",
                "jira",
                "--confirm-scopes"
            ]
        );

        let keys: Vec<&str> = spec.env_pairs().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["FORGE_EMAIL", "FORGE_API_TOKEN"]);

        // Same config, same argv, run after run.
        assert_eq!(spec.argv(), config.command_spec(&creds).argv());
    }

    #[test]
    fn test_from_file_minimal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"site = "acme.atlassian.net""#).unwrap();

        let config = InstallerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.site, "acme.atlassian.net");
        assert_eq!(config.product, "jira");
        assert_eq!(config.confirm_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_from_file_full() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
site = "acme.atlassian.net"
product = "confluence"
forge_bin = "/opt/forge/bin/forge"
prompt = "proceed\\?"
prompt_is_regex = true
reply = "yes"
confirm_timeout_secs = 5
drain_timeout_secs = 30
"#
        )
        .unwrap();

        let config = InstallerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.product, "confluence");
        assert_eq!(config.forge_bin, "/opt/forge/bin/forge");
        assert!(config.prompt_is_regex);
        assert_eq!(config.reply, "yes");
        assert_eq!(config.confirm_timeout, Duration::from_secs(5));
        assert_eq!(config.drain_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_file_rejects_unknown_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "site = \"acme.atlassian.net\"\nnonsense = true").unwrap();
        assert!(InstallerConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_from_file_missing_is_a_read_error() {
        let err = InstallerConfig::from_file(Path::new("/no/such/autoforge.toml")).unwrap_err();
        assert!(err.to_string().contains("read config file"));
    }

    #[test]
    fn test_from_env_lookup() {
        let config = InstallerConfig::from_env_lookup(|var| match var {
            SITE_VAR => Some("acme.atlassian.net".to_string()),
            PRODUCT_VAR => Some("confluence".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.site, "acme.atlassian.net");
        assert_eq!(config.product, "confluence");

        assert!(InstallerConfig::from_env_lookup(|_| None).is_err());
    }

    #[test]
    fn test_matcher_kinds() {
        let config = InstallerConfig::builder("acme.atlassian.net").build().unwrap();
        let matcher = config.matcher().unwrap();
        assert!(matcher.is_match(SCOPES_PROMPT.as_bytes()));

        let config = InstallerConfig::builder("acme.atlassian.net")
            .prompt_regex(r"proceed\?")
            .build()
            .unwrap();
        let matcher = config.matcher().unwrap();
        assert!(matcher.is_match(b"want to proceed?"));
    }
}
