// Env sink implementation
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use ci_actions_core::port::EnvSink;

/// Sets variables in this process and, optionally, appends them to an env
/// file read by later CI steps (GitHub Actions `$GITHUB_ENV` format)
pub struct ProcessEnvSink {
    env_file: Option<PathBuf>,
}

impl ProcessEnvSink {
    pub fn new(env_file: Option<PathBuf>) -> Self {
        Self { env_file }
    }

    pub fn env_file(&self) -> Option<&Path> {
        self.env_file.as_deref()
    }
}

impl EnvSink for ProcessEnvSink {
    fn set(&self, name: &str, value: &str) -> std::io::Result<()> {
        std::env::set_var(name, value);

        if let Some(path) = &self.env_file {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            file.write_all(env_file_entry(name, value).as_bytes())?;
            debug!(name = %name, env_file = %path.display(), "Persisted variable");
        }

        Ok(())
    }
}

/// `NAME=value`, or the delimiter form for values spanning lines
fn env_file_entry(name: &str, value: &str) -> String {
    if value.contains('\n') {
        let delimiter = format!("CI_ACTIONS_EOF_{}", name);
        format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
    } else {
        format!("{name}={value}\n")
    }
}
