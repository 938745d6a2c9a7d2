// Test environment - variables handed to the downstream test process

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// A single exported variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// Ordered set of environment variables to export
///
/// Insertion order is preserved so that logs and env files list variables
/// in the order the setup produced them. Setting an existing name replaces
/// its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestEnv {
    vars: Vec<EnvVar>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a variable
    ///
    /// # Errors
    /// - DomainError::InvalidEnvName if the name is empty or contains `=` or NUL
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        validate_name(&name)?;
        let value = value.into();

        match self.vars.iter_mut().find(|v| v.name == name) {
            Some(existing) => existing.value = value,
            None => self.vars.push(EnvVar { name, value }),
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnvVar> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// `export NAME='value'` lines, safe to `eval` in a POSIX shell
    pub fn to_shell_exports(&self) -> String {
        self.vars
            .iter()
            .map(|v| format!("export {}={}\n", v.name, shell_quote(&v.value)))
            .collect()
    }

    /// `NAME=value` lines (GitHub Actions `$GITHUB_ENV` / dotenv format)
    pub fn to_dotenv(&self) -> String {
        self.vars
            .iter()
            .map(|v| format!("{}={}\n", v.name, v.value))
            .collect()
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('=') || name.contains('\0') {
        return Err(DomainError::InvalidEnvName(name.to_string()));
    }
    Ok(())
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
