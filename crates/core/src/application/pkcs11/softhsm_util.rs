// softhsm2-util wrapper
use crate::application::constants::SOFTHSM_USAGE_BANNER;
use crate::application::pkcs11::slots::parse_initialized_slots;
use crate::domain::{DomainError, SlotId, TestEnv};
use crate::error::Result;
use crate::port::{CommandOutput, CommandRunner, CommandSpec};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// True if `output` contains softhsm2-util's help text
///
/// Older releases (2.1.0 is a known offender) exit 0 and print the help when
/// given flags they do not know, which newer releases accept.
pub fn contains_usage_banner(output: &str) -> bool {
    output.contains(SOFTHSM_USAGE_BANNER)
}

/// Runs `softhsm2-util` with checked results
///
/// Every invocation fails on a non-zero exit status and also on a usage
/// banner in the output, whatever the exit status was.
pub struct SoftHsmUtil {
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl SoftHsmUtil {
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    /// Run the utility with `env` added to its environment
    ///
    /// Output is always captured; `quiet` only controls whether it is logged
    /// at info level.
    ///
    /// # Errors
    /// - AppError::Execution if the utility cannot be spawned
    /// - DomainError::CommandFailed on a non-zero exit
    /// - DomainError::UsageBanner if the help text was printed
    pub async fn exec(&self, env: &TestEnv, args: &[&str], quiet: bool) -> Result<CommandOutput> {
        let spec = CommandSpec::new(&self.program)
            .args(args.iter().copied())
            .envs(env)
            .captured();

        info!(command = %spec, "Running softhsm2-util");
        let output = self.runner.run(&spec).await?;

        if quiet {
            debug!(output = %output.output, "softhsm2-util output");
        } else {
            info!(output = %output.output, "softhsm2-util output");
        }

        if !output.is_success() {
            return Err(DomainError::CommandFailed {
                program: self.program.clone(),
                exit_code: output.exit_code,
            }
            .into());
        }

        if contains_usage_banner(&output.output) {
            return Err(DomainError::UsageBanner {
                program: self.program.clone(),
            }
            .into());
        }

        Ok(output)
    }

    pub async fn print_version(&self, env: &TestEnv) -> Result<()> {
        self.exec(env, &["--version"], false).await.map(|_| ())
    }

    /// Initialize a token in any free slot
    pub async fn init_token(&self, env: &TestEnv, label: &str, pin: &str, so_pin: &str) -> Result<()> {
        self.exec(
            env,
            &[
                "--init-token",
                "--free",
                "--label",
                label,
                "--pin",
                pin,
                "--so-pin",
                so_pin,
            ],
            false,
        )
        .await
        .map(|_| ())
    }

    /// Slots with an initialized token
    ///
    /// Needed because old utilities only take `--slot <number>` (not
    /// `--token <label>`), and newer ones assign large slot numbers to new
    /// tokens instead of 0.
    pub async fn initialized_slots(&self, env: &TestEnv) -> Result<Vec<SlotId>> {
        let output = self.exec(env, &["--show-slots"], true).await?;
        Ok(parse_initialized_slots(&output.output))
    }

    /// Import a PKCS#8 private key into `slot`
    pub async fn import_key(
        &self,
        env: &TestEnv,
        key_file: &Path,
        slot: SlotId,
        label: &str,
        id_hex: &str,
        pin: &str,
    ) -> Result<()> {
        let key_file = key_file.display().to_string();
        let slot = slot.to_string();
        self.exec(
            env,
            &[
                "--import",
                key_file.as_str(),
                "--slot",
                slot.as_str(),
                "--label",
                label,
                "--id",
                id_hex,
                "--pin",
                pin,
            ],
            false,
        )
        .await
        .map(|_| ())
    }

    /// Print slot state (for the build log)
    pub async fn show_slots(&self, env: &TestEnv, pin: &str) -> Result<()> {
        self.exec(env, &["--show-slots", "--pin", pin], false)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::port::command_runner::mocks::{MockBehavior, MockCommandRunner};

    const USAGE: &str = "Usage: softhsm2-util [ACTION] [OPTIONS]\nSupport tool for PKCS#11\n";

    #[test]
    fn test_usage_banner_detection() {
        assert!(contains_usage_banner(USAGE));
        assert!(contains_usage_banner("error\nUsage: softhsm2-util [ACTION]"));
        assert!(!contains_usage_banner("2.6.1\n"));
    }

    #[tokio::test]
    async fn test_usage_banner_fails_despite_exit_zero() {
        let runner = Arc::new(MockCommandRunner::new().on(
            "softhsm2-util",
            Some("--init-token"),
            MockBehavior::Success(USAGE.to_string()),
        ));
        let util = SoftHsmUtil::new(runner, "softhsm2-util");

        let result = util
            .init_token(&TestEnv::new(), "my-test-token", "0000", "0000")
            .await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::UsageBanner { .. }))
        ));
    }

    #[tokio::test]
    async fn test_non_zero_exit_fails() {
        let runner = Arc::new(MockCommandRunner::new().on(
            "softhsm2-util",
            Some("--version"),
            MockBehavior::Exit(2, String::new()),
        ));
        let util = SoftHsmUtil::new(runner, "softhsm2-util");

        let result = util.print_version(&TestEnv::new()).await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::CommandFailed {
                exit_code: Some(2),
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_spawn_failure_propagates() {
        let runner = Arc::new(MockCommandRunner::new().on(
            "softhsm2-util",
            None,
            MockBehavior::SpawnFail("No such file".to_string()),
        ));
        let util = SoftHsmUtil::new(runner, "softhsm2-util");

        let result = util.print_version(&TestEnv::new()).await;

        assert!(matches!(result, Err(AppError::Execution(_))));
    }

    #[tokio::test]
    async fn test_import_key_args_and_env() {
        let runner = Arc::new(MockCommandRunner::new());
        let util = SoftHsmUtil::new(runner.clone(), "softhsm2-util");
        let mut env = TestEnv::new();
        env.set("SOFTHSM2_CONF", "/b/softhsm2/softhsm2.conf").unwrap();

        util.import_key(
            &env,
            Path::new("/res/unittests.p8"),
            SlotId::new(42),
            "my-test-key",
            "BEEFCAFE",
            "0000",
        )
        .await
        .unwrap();

        let calls = runner.calls();
        assert_eq!(
            calls[0].to_string(),
            "softhsm2-util --import /res/unittests.p8 --slot 42 --label my-test-key --id BEEFCAFE --pin 0000"
        );
        assert_eq!(
            calls[0].env.get("SOFTHSM2_CONF").map(String::as_str),
            Some("/b/softhsm2/softhsm2.conf")
        );
        assert!(calls[0].capture);
    }

    #[tokio::test]
    async fn test_initialized_slots_parses_output() {
        let runner = Arc::new(MockCommandRunner::new().on(
            "softhsm2-util",
            Some("--show-slots"),
            MockBehavior::Success(
                "Slot 11\n    Token info:\n        Initialized:      yes\n".to_string(),
            ),
        ));
        let util = SoftHsmUtil::new(runner, "softhsm2-util");

        let slots = util.initialized_slots(&TestEnv::new()).await.unwrap();

        assert_eq!(slots, vec![SlotId::new(11)]);
    }
}
