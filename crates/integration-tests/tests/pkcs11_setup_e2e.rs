//! PKCS#11 setup end to end with a scripted softhsm2-util
//!
//! The fake utility behaves like softhsm2-util 2.6 (or 2.1 for the usage
//! banner case) so the real subprocess runner, env sink and library locator
//! are exercised together.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ci_actions_core::application::{
    Pkcs11SetupConfig, Pkcs11SetupOutcome, Pkcs11TestSetup, SkipReason,
};
use ci_actions_core::domain::{DomainError, SlotId};
use ci_actions_core::port::package_installer::mocks::MockPackageInstaller;
use ci_actions_core::port::system_probe::mocks::MockSystemProbe;
use ci_actions_core::port::time_provider::SystemTimeProvider;
use ci_actions_core::AppError;
use ci_actions_infra_system::{FsLibraryLocator, ProcessEnvSink, SubprocessRunner};

const FAKE_UTIL: &str = r#"#!/bin/sh
# Records every call, refuses to run without SOFTHSM2_CONF
echo "$@" >> "$(dirname "$0")/calls.log"
[ -f "$SOFTHSM2_CONF" ] || { echo "ERROR: Could not load the SoftHSM configuration" >&2; exit 1; }
case "$1" in
  --version) echo "2.6.1" ;;
  --init-token)
    touch "$(dirname "$0")/initialized"
    echo "The token has been initialized and is reassigned to slot 1234567"
    ;;
  --show-slots)
    echo "Available slots:"
    if [ -f "$(dirname "$0")/initialized" ]; then
      echo "Slot 1234567"
      echo "    Slot info:"
      echo "        Token present:    yes"
      echo "    Token info:"
      echo "        Label:            my-test-token"
      echo "        Initialized:      yes"
    fi
    echo "Slot 1"
    echo "    Slot info:"
    echo "        Token present:    yes"
    echo "    Token info:"
    echo "        Initialized:      no"
    ;;
  --import)
    [ "$4" = "1234567" ] || { echo "wrong slot $4" >&2; exit 1; }
    echo "The key pair has been imported."
    ;;
  *) echo "Usage: softhsm2-util [ACTION] [OPTIONS]"; exit 0 ;;
esac
"#;

// softhsm2-util 2.1: no --free support, prints help and exits 0
const OLD_UTIL: &str = r#"#!/bin/sh
case "$1" in
  --version) echo "2.1.0" ;;
  *) echo "Usage: softhsm2-util [ACTION] [OPTIONS]" ;;
esac
"#;

struct Sandbox {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Sandbox {
    fn new(util_script: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();

        let bin = root.join("bin");
        fs::create_dir_all(&bin).unwrap();
        let util = bin.join("softhsm2-util");
        fs::write(&util, util_script).unwrap();
        fs::set_permissions(&util, fs::Permissions::from_mode(0o755)).unwrap();

        let lib = root.join("usr/lib/softhsm/libsofthsm2.so");
        fs::create_dir_all(lib.parent().unwrap()).unwrap();
        fs::write(&lib, b"").unwrap();

        let resources = root.join("src/crt/aws-c-io/tests/resources");
        fs::create_dir_all(&resources).unwrap();
        fs::write(resources.join("unittests.p8"), b"key").unwrap();
        fs::write(resources.join("unittests.crt"), b"cert").unwrap();

        Self { _dir: dir, root }
    }

    fn config(&self) -> Pkcs11SetupConfig {
        let mut config = Pkcs11SetupConfig::new(
            self.root.join("build"),
            Pkcs11SetupConfig::resolve_resources_dir(
                &self.root.join("src"),
                Path::new("crt/aws-c-io/tests/resources"),
            ),
        );
        config.util_program = self.root.join("bin/softhsm2-util").display().to_string();
        config
    }

    fn env_file(&self) -> PathBuf {
        self.root.join("github_env")
    }

    fn setup(&self, installer: MockPackageInstaller) -> Pkcs11TestSetup {
        let time_provider = Arc::new(SystemTimeProvider);
        Pkcs11TestSetup::new(
            Arc::new(SubprocessRunner::new(time_provider)),
            Arc::new(installer),
            Arc::new(FsLibraryLocator::with_search_dirs(vec![self.root.join("usr/lib")])),
            Arc::new(MockSystemProbe::new("x86_64")),
            Arc::new(ProcessEnvSink::new(Some(self.env_file()))),
        )
    }
}

#[tokio::test]
async fn test_setup_with_scripted_util() {
    let sandbox = Sandbox::new(FAKE_UTIL);
    let config = sandbox.config();

    let outcome = sandbox
        .setup(MockPackageInstaller::new_success())
        .run(&config)
        .await
        .unwrap();

    let Pkcs11SetupOutcome::Configured(result) = outcome else {
        panic!("expected configured outcome");
    };
    assert_eq!(result.slot, SlotId::new(1_234_567));
    assert_eq!(result.library, sandbox.root.join("usr/lib/softhsm/libsofthsm2.so"));

    let conf = fs::read_to_string(sandbox.root.join("build/softhsm2/softhsm2.conf")).unwrap();
    assert_eq!(
        conf,
        format!(
            "directories.tokendir = {}\n",
            sandbox.root.join("build/softhsm2/tokens").display()
        )
    );

    let calls = fs::read_to_string(sandbox.root.join("bin/calls.log")).unwrap();
    let first_words: Vec<&str> = calls
        .lines()
        .map(|l| l.split_whitespace().next().unwrap_or(""))
        .collect();
    assert_eq!(
        first_words,
        vec!["--version", "--init-token", "--show-slots", "--import", "--show-slots"]
    );

    let env_file = fs::read_to_string(sandbox.env_file()).unwrap();
    let cert = config.cert_path().display().to_string();
    assert!(env_file.starts_with("SOFTHSM2_CONF="));
    assert!(env_file.contains("TEST_PKCS11_TOKEN_LABEL=my-test-token\n"));
    assert!(env_file.contains("TEST_PKCS11_PIN=0000\n"));
    assert!(env_file.contains("TEST_PKCS11_PKEY_LABEL=my-test-key\n"));
    assert!(env_file.contains(&format!("TEST_PKCS11_CERT_FILE={}\n", cert)));
    assert!(env_file.contains(&format!("TEST_PKCS11_CA_FILE={}\n", cert)));
    assert_eq!(env_file.lines().count(), 7);
}

#[tokio::test]
async fn test_old_util_usage_banner_fails() {
    let sandbox = Sandbox::new(OLD_UTIL);

    let result = sandbox
        .setup(MockPackageInstaller::new_success())
        .run(&sandbox.config())
        .await;

    assert!(matches!(
        result,
        Err(AppError::Domain(DomainError::UsageBanner { .. }))
    ));
    let env_file = fs::read_to_string(sandbox.env_file()).unwrap();
    assert!(!env_file.contains("TEST_PKCS11_LIB"));
}

#[tokio::test]
async fn test_install_failure_leaves_no_trace() {
    let sandbox = Sandbox::new(FAKE_UTIL);

    let outcome = sandbox
        .setup(MockPackageInstaller::new_fail())
        .run(&sandbox.config())
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        Pkcs11SetupOutcome::Skipped(SkipReason::InstallFailed(_))
    ));
    assert!(!sandbox.env_file().exists());
    assert!(!sandbox.root.join("build").exists());
    assert!(!sandbox.root.join("bin/calls.log").exists());
}
