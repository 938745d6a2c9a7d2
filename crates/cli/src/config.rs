//! Command-line and environment configuration

use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};

use ci_actions_core::application::constants::*;
use ci_actions_core::application::{Pkcs11SetupConfig, TestLoopConfig};
use ci_actions_core::port::CommandSpec;

/// Options for `test-loop`
#[derive(Args, Debug)]
pub struct TestLoopArgs {
    /// Maximum number of test runs
    #[arg(short = 'n', long, env = "CI_ACTIONS_TEST_ITERATIONS", default_value_t = DEFAULT_TEST_ITERATIONS)]
    pub iterations: u32,

    /// Log file printed after the loop
    #[arg(long, env = "CI_ACTIONS_TEST_LOG", default_value = DEFAULT_LOG_FILE)]
    pub log_file: String,

    /// Working directory for the test command
    #[arg(long)]
    pub working_dir: Option<String>,

    /// Test command and arguments (default: the Maven test invocation)
    #[arg(last = true)]
    pub command: Vec<String>,
}

impl TestLoopArgs {
    pub fn to_config(&self) -> TestLoopConfig {
        let defaults = TestLoopConfig::default();

        let mut command = match self.command.split_first() {
            Some((program, args)) => CommandSpec::new(program.as_str()).args(args.iter().cloned()),
            None => defaults.command,
        };
        if let Some(dir) = &self.working_dir {
            command = command.current_dir(expand_path(dir));
        }

        TestLoopConfig {
            command,
            max_iterations: self.iterations,
            log_file: expand_path(&self.log_file),
        }
    }
}

/// Format of the `--print-exports` output
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    /// `export NAME='value'` lines
    Shell,
    /// `NAME=value` lines
    Dotenv,
    /// JSON document
    Json,
}

/// Options for `pkcs11-setup`
#[derive(Args, Debug)]
pub struct Pkcs11SetupArgs {
    /// Build directory that receives softhsm2/
    #[arg(long, env = "CI_ACTIONS_BUILD_DIR", default_value = "build")]
    pub build_dir: String,

    /// Source checkout the resources directory is relative to
    #[arg(long, env = "CI_ACTIONS_SOURCE_DIR", default_value = ".")]
    pub source_dir: String,

    /// Directory with unittests.p8 and unittests.crt, relative to --source-dir
    #[arg(long, env = "CI_ACTIONS_PKCS11_RESOURCES", default_value = DEFAULT_RESOURCES_DIR)]
    pub resources_dir: String,

    #[arg(long, default_value = SOFTHSM_PACKAGE)]
    pub package: String,

    /// Substring of the shared library file name to search for
    #[arg(long, default_value = SOFTHSM_LIBRARY_NAME)]
    pub library_name: String,

    #[arg(long, env = "CI_ACTIONS_SOFTHSM_UTIL", default_value = SOFTHSM_UTIL_PROGRAM)]
    pub softhsm_util: String,

    #[arg(long, default_value = DEFAULT_TOKEN_LABEL)]
    pub token_label: String,

    #[arg(long, default_value = DEFAULT_PIN)]
    pub pin: String,

    #[arg(long, default_value = DEFAULT_SO_PIN)]
    pub so_pin: String,

    #[arg(long, default_value = DEFAULT_KEY_LABEL)]
    pub key_label: String,

    /// Key object ID (hex)
    #[arg(long, default_value = DEFAULT_KEY_ID)]
    pub key_id: String,

    /// Env file to append exports to (GitHub Actions sets GITHUB_ENV)
    #[arg(long, env = "GITHUB_ENV")]
    pub env_file: Option<String>,

    /// Print the exported variables on stdout
    #[arg(long, value_enum)]
    pub print_exports: Option<ExportFormat>,
}

impl Pkcs11SetupArgs {
    pub fn to_config(&self) -> Pkcs11SetupConfig {
        let resources_dir = Pkcs11SetupConfig::resolve_resources_dir(
            &expand_path(&self.source_dir),
            Path::new(&self.resources_dir),
        );

        Pkcs11SetupConfig {
            package: self.package.clone(),
            library_name: self.library_name.clone(),
            util_program: self.softhsm_util.clone(),
            token_label: self.token_label.clone(),
            pin: self.pin.clone(),
            so_pin: self.so_pin.clone(),
            key_label: self.key_label.clone(),
            key_id: self.key_id.clone(),
            ..Pkcs11SetupConfig::new(absolute(expand_path(&self.build_dir)), resources_dir)
        }
    }

    pub fn env_file(&self) -> Option<PathBuf> {
        self.env_file
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(expand_path)
    }
}

/// Expand `~` and `$VARS` the way a shell would
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).into_owned()),
    }
}

/// softhsm2.conf must hold an absolute token path
fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(&path))
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        test_loop: TestLoopArgs,
    }

    #[derive(Parser)]
    struct SetupCli {
        #[command(flatten)]
        setup: Pkcs11SetupArgs,
    }

    #[test]
    fn test_loop_defaults_to_maven() {
        let cli = TestCli::parse_from(["t"]);
        let config = cli.test_loop.to_config();

        assert_eq!(config.command.program, "mvn");
        assert_eq!(config.log_file, PathBuf::from("log.txt"));
    }

    #[test]
    fn test_loop_command_override() {
        let cli = TestCli::parse_from(["t", "-n", "3", "--", "cargo", "test", "--workspace"]);
        let config = cli.test_loop.to_config();

        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.command.to_string(), "cargo test --workspace");
    }

    #[test]
    fn test_setup_overrides() {
        let cli = SetupCli::parse_from([
            "t",
            "--build-dir",
            "/tmp/b",
            "--source-dir",
            "/src",
            "--token-label",
            "other-token",
            "--print-exports",
            "dotenv",
        ]);
        let config = cli.setup.to_config();

        assert_eq!(config.build_dir, PathBuf::from("/tmp/b"));
        assert_eq!(config.token_label, "other-token");
        assert_eq!(config.pin, "0000");
        assert_eq!(
            config.private_key_path(),
            PathBuf::from("/src/crt/aws-c-io/tests/resources/unittests.p8")
        );
        assert_eq!(cli.setup.print_exports, Some(ExportFormat::Dotenv));
    }

    #[test]
    fn test_relative_build_dir_made_absolute() {
        assert!(absolute(PathBuf::from("build")).is_absolute());
    }

    #[test]
    fn test_expand_tilde() {
        if std::env::var_os("HOME").is_none() {
            return;
        }
        let expanded = expand_path("~/x");
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
