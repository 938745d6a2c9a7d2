// Subprocess runner implementation
// reason: async-trait, tokio for async process management (ADR-001)
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::info;

use ci_actions_core::port::command_runner::{
    CommandOutput, CommandRunner, CommandSpec, ExecutionError, ExecutionStatus,
};
use ci_actions_core::port::TimeProvider;

/// Subprocess runner
/// Spawns the program as a child that inherits the parent's environment,
/// plus whatever the `CommandSpec` adds
pub struct SubprocessRunner {
    time_provider: Arc<dyn TimeProvider>,
}

impl SubprocessRunner {
    /// Create a new subprocess runner
    ///
    /// # Example
    /// ```ignore
    /// let runner = SubprocessRunner::new(Arc::new(SystemTimeProvider));
    /// ```
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { time_provider }
    }

    fn build_command(spec: &CommandSpec) -> Command {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args).envs(&spec.env).stdin(Stdio::null());

        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }

        if spec.capture {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        command
    }

    /// Spawn child process and wait for it
    ///
    /// Returns the exit status and the combined output (empty when streaming).
    async fn spawn_and_wait(
        &self,
        spec: &CommandSpec,
    ) -> Result<(std::process::ExitStatus, String), ExecutionError> {
        let mut child = Self::build_command(spec)
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed(format!("{}: {}", spec.program, e)))?;

        if spec.capture {
            let output = child
                .wait_with_output()
                .await
                .map_err(|e| ExecutionError::IoError(e.to_string()))?;
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            Ok((output.status, combined))
        } else {
            let status = child
                .wait()
                .await
                .map_err(|e| ExecutionError::IoError(e.to_string()))?;
            Ok((status, String::new()))
        }
    }
}

#[async_trait]
impl CommandRunner for SubprocessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecutionError> {
        let start_time = self.time_provider.now_millis();

        info!(
            command = %spec,
            working_dir = ?spec.working_dir,
            capture = %spec.capture,
            "Starting subprocess execution"
        );

        let (status, output) = self.spawn_and_wait(spec).await?;
        let duration_ms = self.time_provider.elapsed_millis(start_time);

        let result = CommandOutput {
            status: if status.success() {
                ExecutionStatus::Success
            } else {
                ExecutionStatus::Failed
            },
            exit_code: status.code(),
            duration_ms,
            output,
        };

        info!(
            command = %spec.program,
            duration_ms = %duration_ms,
            exit_code = ?result.exit_code,
            status = ?result.status,
            "Subprocess execution completed"
        );

        Ok(result)
    }
}
