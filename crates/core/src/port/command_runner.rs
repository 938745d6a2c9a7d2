// Command Runner Port (ADR-002)
// Abstraction for running external tools (test CLI, package managers, softhsm2-util)

use crate::domain::TestEnv;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Description of one external command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Variables added on top of the inherited environment
    pub env: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
    /// Capture stdout/stderr into `CommandOutput::output` instead of streaming
    /// them to the parent's terminal
    pub capture: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
            working_dir: None,
            capture: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Pass every variable of a test environment to the child
    pub fn envs(mut self, env: &TestEnv) -> Self {
        for var in env.iter() {
            self.env.insert(var.name.clone(), var.value.clone());
        }
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Result of running a command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExecutionStatus,
    pub exit_code: Option<i32>,
    pub duration_ms: i64,
    /// stdout followed by stderr; empty when the command was not captured
    pub output: String,
}

impl CommandOutput {
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}

/// Execution status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failed,
}

/// Execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Command Runner trait
///
/// Implementations:
/// - SubprocessRunner: spawns the program as a child process
/// - MockCommandRunner: scripted responses for tests
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion
    ///
    /// A non-zero exit is NOT an error here; it is reported through
    /// `CommandOutput::status` so callers choose their own policy.
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the program cannot be started
    /// - ExecutionError::IoError if waiting on the child fails
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Mock command behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Exit 0 with the given output
        Success(String),
        /// Exit with the given code and output
        Exit(i32, String),
        /// Fail to spawn
        SpawnFail(String),
    }

    struct Rule {
        program: String,
        first_arg: Option<String>,
        behaviors: VecDeque<MockBehavior>,
    }

    impl Rule {
        fn matches(&self, spec: &CommandSpec) -> bool {
            self.program == spec.program
                && match &self.first_arg {
                    Some(first) => spec.args.first() == Some(first),
                    None => true,
                }
        }
    }

    /// Mock Command Runner for testing
    ///
    /// Rules are matched on program name and (optionally) the first argument.
    /// Each rule replays its behaviors in order and then keeps repeating the
    /// last one. Unmatched commands succeed with empty output.
    pub struct MockCommandRunner {
        rules: Mutex<Vec<Rule>>,
        calls: Mutex<Vec<CommandSpec>>,
    }
    impl MockCommandRunner {
        pub fn new() -> Self {
            Self {
                rules: Mutex::new(Vec::new()),
                calls: Mutex::new(Vec::new()),
            }
        }
        pub fn on(
            self,
            program: impl Into<String>,
            first_arg: Option<&str>,
            behavior: MockBehavior,
        ) -> Self {
            let program = program.into();
            let first_arg = first_arg.map(str::to_string);
            {
                let mut rules = self.rules.lock().unwrap();
                match rules
                    .iter_mut()
                    .find(|r| r.program == program && r.first_arg == first_arg)
                {
                    Some(rule) => rule.behaviors.push_back(behavior),
                    None => rules.push(Rule {
                        program,
                        first_arg,
                        behaviors: VecDeque::from([behavior]),
                    }),
                }
            }
            self
        }
        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
        pub fn calls(&self) -> Vec<CommandSpec> {
            self.calls.lock().unwrap().clone()
        }
    }
    impl Default for MockCommandRunner {
        fn default() -> Self {
            Self::new()
        }
    }
    #[async_trait]
    impl CommandRunner for MockCommandRunner {
        async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecutionError> {
            self.calls.lock().unwrap().push(spec.clone());

            let scripted = {
                let mut rules = self.rules.lock().unwrap();
                let next = match rules.iter_mut().find(|r| r.matches(spec)) {
                    Some(rule) if rule.behaviors.len() > 1 => rule.behaviors.pop_front(),
                    Some(rule) => rule.behaviors.front().cloned(),
                    None => None,
                };
                next
            };
            let behavior = scripted.unwrap_or_else(|| MockBehavior::Success(String::new()));

            match behavior {
                MockBehavior::Success(output) => Ok(CommandOutput {
                    status: ExecutionStatus::Success,
                    exit_code: Some(0),
                    duration_ms: 1,
                    output,
                }),
                MockBehavior::Exit(code, output) => Ok(CommandOutput {
                    status: if code == 0 {
                        ExecutionStatus::Success
                    } else {
                        ExecutionStatus::Failed
                    },
                    exit_code: Some(code),
                    duration_ms: 1,
                    output,
                }),
                MockBehavior::SpawnFail(msg) => Err(ExecutionError::SpawnFailed(msg)),
            }
        }
    }
}
