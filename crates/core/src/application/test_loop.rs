// Repeated test runner (ADR-002)
use crate::application::constants::{
    DEFAULT_LOG_FILE, DEFAULT_TEST_ARGS, DEFAULT_TEST_ITERATIONS, DEFAULT_TEST_PROGRAM,
    MEMORY_TRACING_LEVEL, MEMORY_TRACING_VAR,
};
use crate::error::{AppError, Result};
use crate::port::{CommandRunner, CommandSpec, TimeProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// What to run and how often
#[derive(Debug, Clone)]
pub struct TestLoopConfig {
    pub command: CommandSpec,
    pub max_iterations: u32,
    pub log_file: PathBuf,
}

impl Default for TestLoopConfig {
    fn default() -> Self {
        Self {
            command: CommandSpec::new(DEFAULT_TEST_PROGRAM).args(DEFAULT_TEST_ARGS.iter().copied()),
            max_iterations: DEFAULT_TEST_ITERATIONS,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

/// Loop verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestVerdict {
    /// Every iteration exited 0
    Passed,
    /// Stopped at the first failing iteration (1-based)
    Failed { iteration: u32 },
}

/// Result of a test loop
#[derive(Debug, Clone)]
pub struct TestLoopOutcome {
    pub iterations_run: u32,
    pub verdict: TestVerdict,
    pub duration_ms: i64,
    /// Contents of the log file, None if it could not be read
    ///
    /// Invalid UTF-8 is replaced rather than dropping the log.
    pub log: Option<String>,
}

impl TestLoopOutcome {
    pub fn passed(&self) -> bool {
        self.verdict == TestVerdict::Passed
    }
}

/// Runs a test command repeatedly to shake out flaky native failures
///
/// Despite the surrounding tooling calling this a "retry", nothing is retried:
/// the command is run up to `max_iterations` times and the loop stops at the
/// first failure. The log file is read afterwards either way.
pub struct TestLoop {
    runner: Arc<dyn CommandRunner>,
    time_provider: Arc<dyn TimeProvider>,
}

impl TestLoop {
    pub fn new(runner: Arc<dyn CommandRunner>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            runner,
            time_provider,
        }
    }

    /// Run the loop
    ///
    /// A command that cannot be spawned counts as a failed iteration.
    ///
    /// # Errors
    /// - AppError::Config if `max_iterations` is 0
    pub async fn run(&self, config: &TestLoopConfig) -> Result<TestLoopOutcome> {
        if config.max_iterations == 0 {
            return Err(AppError::Config(
                "test loop needs at least one iteration".to_string(),
            ));
        }

        let command = config
            .command
            .clone()
            .env(MEMORY_TRACING_VAR, MEMORY_TRACING_LEVEL);
        let start_time = self.time_provider.now_millis();

        info!(
            command = %command,
            max_iterations = %config.max_iterations,
            "Starting test loop"
        );

        let mut iterations_run = 0;
        let mut verdict = TestVerdict::Passed;

        for iteration in 1..=config.max_iterations {
            iterations_run = iteration;
            info!(iteration = %iteration, max_iterations = %config.max_iterations, "Running tests");

            match self.runner.run(&command).await {
                Ok(output) if output.is_success() => {}
                Ok(output) => {
                    warn!(
                        iteration = %iteration,
                        exit_code = ?output.exit_code,
                        "Test run failed, stopping loop"
                    );
                    verdict = TestVerdict::Failed { iteration };
                    break;
                }
                Err(e) => {
                    error!(iteration = %iteration, error = %e, "Test command could not run");
                    verdict = TestVerdict::Failed { iteration };
                    break;
                }
            }
        }

        let log = read_log(&config.log_file).await;
        let duration_ms = self.time_provider.elapsed_millis(start_time);

        info!(
            iterations_run = %iterations_run,
            verdict = ?verdict,
            duration_ms = %duration_ms,
            "Test loop finished"
        );

        Ok(TestLoopOutcome {
            iterations_run,
            verdict,
            duration_ms,
            log,
        })
    }
}

async fn read_log(path: &Path) -> Option<String> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read test log");
            None
        }
    }
}
