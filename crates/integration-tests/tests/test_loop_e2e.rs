//! Test loop against real subprocesses
//!
//! Verifies the loop stops at the first failing run and still reads the log.

use std::sync::Arc;

use ci_actions_core::application::{TestLoop, TestLoopConfig, TestVerdict};
use ci_actions_core::port::time_provider::SystemTimeProvider;
use ci_actions_core::port::CommandSpec;
use ci_actions_infra_system::SubprocessRunner;

fn test_loop() -> TestLoop {
    let time_provider = Arc::new(SystemTimeProvider);
    TestLoop::new(
        Arc::new(SubprocessRunner::new(time_provider.clone())),
        time_provider,
    )
}

#[tokio::test]
async fn test_stops_on_third_run() {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("log.txt");

    // Appends one line per run and fails on the third
    let script = format!(
        "echo run >> {log}; [ $(wc -l < {log}) -lt 3 ]",
        log = log_file.display()
    );
    let config = TestLoopConfig {
        command: CommandSpec::new("sh").args(["-c", script.as_str()]),
        max_iterations: 100,
        log_file: log_file.clone(),
    };

    let outcome = test_loop().run(&config).await.unwrap();

    assert_eq!(outcome.verdict, TestVerdict::Failed { iteration: 3 });
    assert_eq!(outcome.iterations_run, 3);
    assert_eq!(outcome.log.as_deref(), Some("run\nrun\nrun\n"));
}

#[tokio::test]
async fn test_all_runs_pass() {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("log.txt");
    let script = format!("echo pass >> {}", log_file.display());
    let config = TestLoopConfig {
        command: CommandSpec::new("sh").args(["-c", script.as_str()]),
        max_iterations: 4,
        log_file,
    };

    let outcome = test_loop().run(&config).await.unwrap();

    assert!(outcome.passed());
    assert_eq!(outcome.iterations_run, 4);
    assert_eq!(outcome.log.as_deref(), Some("pass\npass\npass\npass\n"));
}

#[tokio::test]
async fn test_memory_tracing_reaches_child() {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("log.txt");
    let script = format!(
        "echo \"tracing=$AWS_CRT_MEMORY_TRACING\" > {}",
        log_file.display()
    );
    let config = TestLoopConfig {
        command: CommandSpec::new("sh").args(["-c", script.as_str()]),
        max_iterations: 1,
        log_file,
    };

    let outcome = test_loop().run(&config).await.unwrap();

    assert_eq!(outcome.log.as_deref(), Some("tracing=2\n"));
}

#[tokio::test]
async fn test_missing_program_fails_first_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = TestLoopConfig {
        command: CommandSpec::new("ci-actions-no-such-test-runner"),
        max_iterations: 100,
        log_file: dir.path().join("log.txt"),
    };

    let outcome = test_loop().run(&config).await.unwrap();

    assert_eq!(outcome.verdict, TestVerdict::Failed { iteration: 1 });
    assert!(outcome.log.is_none());
}
