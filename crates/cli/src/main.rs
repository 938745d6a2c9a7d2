//! CI Actions CLI - build actions for the native test pipeline
//!
//! - `test-loop`: run the test suite repeatedly, stop on the first failure,
//!   then print the test log
//! - `pkcs11-setup`: provision a SoftHSM2 token and export the variables the
//!   PKCS#11 tests read

mod config;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process::ExitCode;
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing::info;

use ci_actions_core::application::{
    Pkcs11SetupOutcome, Pkcs11TestSetup, TestLoop, TestVerdict,
};
use ci_actions_core::domain::TestEnv;
use ci_actions_core::port::time_provider::SystemTimeProvider;
use ci_actions_infra_system::{
    FsLibraryLocator, ProcessEnvSink, SubprocessRunner, SystemPackageInstaller, SystemProbeImpl,
};

use config::{ExportFormat, Pkcs11SetupArgs, TestLoopArgs};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "ci-actions")]
#[command(about = "CI build actions for native test runs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log format: pretty or json
    #[arg(long, global = true, env = "CI_ACTIONS_LOG_FORMAT", default_value = "pretty")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tests up to N times, stopping at the first failure
    TestLoop(TestLoopArgs),

    /// Configure SoftHSM2 for the PKCS#11 tests (skipped where unsupported)
    Pkcs11Setup(Pkcs11SetupArgs),
}

#[derive(Tabled)]
struct ExportRow {
    variable: String,
    value: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_format)?;

    info!("CI Actions v{} starting...", VERSION);

    match cli.command {
        Commands::TestLoop(args) => run_test_loop(args).await,
        Commands::Pkcs11Setup(args) => run_pkcs11_setup(args).await,
    }
}

async fn run_test_loop(args: TestLoopArgs) -> Result<ExitCode> {
    let config = args.to_config();
    let time_provider = Arc::new(SystemTimeProvider);
    let runner = Arc::new(SubprocessRunner::new(time_provider.clone()));

    let outcome = TestLoop::new(runner, time_provider)
        .run(&config)
        .await
        .context("Test loop failed to start")?;

    // The log is printed whatever the verdict
    match &outcome.log {
        Some(log) => print!("{}", log),
        None => println!(
            "{}",
            format!("No log at {}", config.log_file.display()).yellow()
        ),
    }

    match outcome.verdict {
        TestVerdict::Passed => println!(
            "{}",
            format!("✓ {} test runs passed", outcome.iterations_run)
                .green()
                .bold()
        ),
        TestVerdict::Failed { iteration } => println!(
            "{}",
            format!("✗ Tests failed on run {} of {}", iteration, config.max_iterations)
                .red()
                .bold()
        ),
    }

    Ok(ExitCode::from(test_loop_status(&outcome.verdict)))
}

/// Process exit status for a finished test loop
fn test_loop_status(verdict: &TestVerdict) -> u8 {
    match verdict {
        TestVerdict::Passed => 0,
        TestVerdict::Failed { .. } => 1,
    }
}

/// Process exit status for a finished setup
///
/// A skipped setup is not a build failure: the PKCS#11 tests just don't run.
fn pkcs11_setup_status(outcome: &Pkcs11SetupOutcome) -> u8 {
    match outcome {
        Pkcs11SetupOutcome::Configured(_) | Pkcs11SetupOutcome::Skipped(_) => 0,
    }
}

async fn run_pkcs11_setup(args: Pkcs11SetupArgs) -> Result<ExitCode> {
    let config = args.to_config();
    let env_file = args.env_file();
    info!(
        build_dir = %config.build_dir.display(),
        resources_dir = %config.resources_dir.display(),
        env_file = ?env_file,
        "Preparing PKCS#11 test setup"
    );

    // DI wiring
    let time_provider = Arc::new(SystemTimeProvider);
    let runner = Arc::new(SubprocessRunner::new(time_provider));
    let setup = Pkcs11TestSetup::new(
        runner.clone(),
        Arc::new(SystemPackageInstaller::new(runner)),
        Arc::new(FsLibraryLocator::new()),
        Arc::new(SystemProbeImpl::new()),
        Arc::new(ProcessEnvSink::new(env_file)),
    );

    let outcome = setup
        .run(&config)
        .await
        .context("PKCS#11 test setup failed")?;

    match &outcome {
        Pkcs11SetupOutcome::Skipped(reason) => {
            eprintln!(
                "{}",
                format!("WARNING: {}. PKCS#11 tests are disabled", reason)
                    .yellow()
                    .bold()
            );
        }
        Pkcs11SetupOutcome::Configured(result) => {
            // stdout is reserved for --print-exports output
            eprintln!(
                "{}",
                format!("✓ SoftHSM2 token ready in slot {}", result.slot)
                    .green()
                    .bold()
            );
            match args.print_exports {
                Some(format) => print_exports(&result.env, format)?,
                None => eprint_export_table(&result.env),
            }
        }
    }

    Ok(ExitCode::from(pkcs11_setup_status(&outcome)))
}

fn eprint_export_table(env: &TestEnv) {
    let rows: Vec<ExportRow> = env
        .iter()
        .map(|var| ExportRow {
            variable: var.name.clone(),
            value: var.value.clone(),
        })
        .collect();
    eprintln!();
    eprintln!("{}", Table::new(rows));
}

fn print_exports(env: &TestEnv, format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Shell => print!("{}", env.to_shell_exports()),
        ExportFormat::Dotenv => print!("{}", env.to_dotenv()),
        ExportFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(env).context("Failed to serialize exports")?
        ),
    }
    Ok(())
}
