//! Credentials handed to the forge CLI through its environment.

use std::env;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{InstallError, Result};

/// Environment variable the forge CLI reads the account email from.
pub const EMAIL_VAR: &str = "FORGE_EMAIL";

/// Environment variable the forge CLI reads the API token from.
pub const TOKEN_VAR: &str = "FORGE_API_TOKEN";

/// Atlassian account credentials for a non-interactive forge run.
///
/// The token is wrapped in [`SecretString`]: it is redacted from `Debug`
/// output and only leaves the wrapper when the child environment is
/// assembled.
pub struct Credentials {
    email: String,
    token: SecretString,
}

impl Credentials {
    /// Create credentials from explicit values.
    pub fn new(email: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            token: SecretString::from(token.into()),
        }
    }

    /// Read credentials from the invoking environment.
    ///
    /// A missing variable is an error naming the variable; credentials are
    /// never sourced from anywhere inside this crate.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let email = lookup(EMAIL_VAR)
            .filter(|v| !v.is_empty())
            .ok_or(InstallError::MissingCredential { var: EMAIL_VAR })?;
        let token = lookup(TOKEN_VAR)
            .filter(|v| !v.is_empty())
            .ok_or(InstallError::MissingCredential { var: TOKEN_VAR })?;
        Ok(Self::new(email, token))
    }

    /// The account email.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Environment pairs for the child process.
    pub fn child_env(&self) -> Vec<(String, String)> {
        vec![
            (EMAIL_VAR.to_string(), self.email.clone()),
            (TOKEN_VAR.to_string(), self.token.expose_secret().to_string()),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("token", &"[REDACTED]")
            .finish()
    }
}
