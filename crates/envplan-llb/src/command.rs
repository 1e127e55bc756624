use crate::LlbError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Argument vector for an exec step.
///
/// Arguments are kept as discrete strings and handed to the engine without a
/// shell, so a package name can never be reinterpreted as shell syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    program: String,
    args: Vec<String>,
}

impl Command {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn get_program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }

    pub fn validate(&self) -> Result<(), LlbError> {
        if self.program.trim().is_empty() {
            return Err(LlbError::EmptyProgram);
        }
        if let Some(bad) = std::iter::once(&self.program)
            .chain(&self.args)
            .find(|a| a.contains('\0'))
        {
            return Err(LlbError::NulByte(bad.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(s: &str) -> String {
    if !s.is_empty() && !s.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"') {
        return s.to_owned();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}
