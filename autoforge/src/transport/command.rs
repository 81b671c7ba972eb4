//! Child command description: program, arguments, environment.

use std::fmt;

/// A command to spawn on the PTY: program, ordered argument list, and the
/// explicit environment pairs the child receives on top of the inherited
/// environment.
///
/// The environment is carried here, local to the spawn, rather than set on
/// the calling process; nothing in this crate mutates its own environment.
#[derive(Clone)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Create a command spec for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append an environment pair for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// The program to execute.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The argument list, in order.
    pub fn argv(&self) -> &[String] {
        &self.args
    }

    /// The environment pairs for the child.
    pub fn env_pairs(&self) -> &[(String, String)] {
        &self.env
    }
}

impl fmt::Debug for CommandSpec {
    /// Environment values are redacted; they can carry secrets.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env_keys: Vec<&str> = self.env.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("CommandSpec")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("env", &env_keys)
            .finish()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
