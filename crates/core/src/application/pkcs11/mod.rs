// PKCS#11 test setup - SoftHSM2 token provisioning for HSM-backed tests

pub mod slots;
pub mod softhsm_util;

pub use slots::parse_initialized_slots;
pub use softhsm_util::{contains_usage_banner, SoftHsmUtil};

use crate::application::constants::*;
use crate::domain::{DomainError, SlotId, SoftHsmLayout, TestEnv};
use crate::error::{AppError, Result};
use crate::port::{CommandRunner, EnvSink, LibraryLocator, PackageInstaller, SystemProbe};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Setup parameters
#[derive(Debug, Clone)]
pub struct Pkcs11SetupConfig {
    /// Directory that receives `softhsm2/softhsm2.conf` and `softhsm2/tokens/`
    pub build_dir: PathBuf,
    /// Directory holding the test key and certificate
    pub resources_dir: PathBuf,
    pub package: String,
    pub library_name: String,
    pub util_program: String,
    pub token_label: String,
    pub pin: String,
    pub so_pin: String,
    pub key_label: String,
    pub key_id: String,
}

impl Pkcs11SetupConfig {
    /// Config with the stock token, key and tool names
    pub fn new(build_dir: impl Into<PathBuf>, resources_dir: impl Into<PathBuf>) -> Self {
        Self {
            build_dir: build_dir.into(),
            resources_dir: resources_dir.into(),
            package: SOFTHSM_PACKAGE.to_string(),
            library_name: SOFTHSM_LIBRARY_NAME.to_string(),
            util_program: SOFTHSM_UTIL_PROGRAM.to_string(),
            token_label: DEFAULT_TOKEN_LABEL.to_string(),
            pin: DEFAULT_PIN.to_string(),
            so_pin: DEFAULT_SO_PIN.to_string(),
            key_label: DEFAULT_KEY_LABEL.to_string(),
            key_id: DEFAULT_KEY_ID.to_string(),
        }
    }

    /// Resolve `relative` against `source_dir`, following symlinks when the
    /// directory exists
    pub fn resolve_resources_dir(source_dir: &Path, relative: &Path) -> PathBuf {
        let joined = source_dir.join(relative);
        std::fs::canonicalize(&joined).unwrap_or(joined)
    }

    pub fn private_key_path(&self) -> PathBuf {
        self.resources_dir.join(PRIVATE_KEY_FILE)
    }

    pub fn cert_path(&self) -> PathBuf {
        self.resources_dir.join(CERT_FILE)
    }
}

/// Why the setup was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    UnsupportedMachine(String),
    InstallFailed(String),
    LibraryNotFound(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedMachine(machine) => {
                write!(f, "PKCS#11 on '{}' is not currently supported", machine)
            }
            SkipReason::InstallFailed(package) => {
                write!(f, "{} could not be installed", package)
            }
            SkipReason::LibraryNotFound(name) => write!(f, "{} not found", name),
        }
    }
}

/// A provisioned token
#[derive(Debug, Clone)]
pub struct Pkcs11Setup {
    pub library: PathBuf,
    pub slot: SlotId,
    pub layout: SoftHsmLayout,
    /// Everything exported, in export order
    pub env: TestEnv,
}

#[derive(Debug, Clone)]
pub enum Pkcs11SetupOutcome {
    Configured(Pkcs11Setup),
    Skipped(SkipReason),
}

/// Sets up SoftHSM2 so the PKCS#11 tests can run
///
/// Hosts that cannot provide SoftHSM2 are skipped with a warning instead of
/// failing the build. Once configuration has started, every error is fatal.
pub struct Pkcs11TestSetup {
    runner: Arc<dyn CommandRunner>,
    installer: Arc<dyn PackageInstaller>,
    locator: Arc<dyn LibraryLocator>,
    system_probe: Arc<dyn SystemProbe>,
    env_sink: Arc<dyn EnvSink>,
}

impl Pkcs11TestSetup {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        installer: Arc<dyn PackageInstaller>,
        locator: Arc<dyn LibraryLocator>,
        system_probe: Arc<dyn SystemProbe>,
        env_sink: Arc<dyn EnvSink>,
    ) -> Self {
        Self {
            runner,
            installer,
            locator,
            system_probe,
            env_sink,
        }
    }

    /// Run the setup
    ///
    /// Steps:
    /// 1. Skip on ARM hosts, when the package cannot be installed, or when
    ///    the shared library cannot be found
    /// 2. Write `softhsm2.conf` and export `SOFTHSM2_CONF`
    /// 3. Init a token in a free slot and find which slot it landed in
    /// 4. Import the test key into that slot
    /// 5. Export the `TEST_PKCS11_*` variables
    ///
    /// # Errors
    /// - DomainError::UsageBanner / CommandFailed from softhsm2-util
    /// - DomainError::NoInitializedToken if no slot reports a token
    /// - AppError::Io if the config file or token dir cannot be written
    pub async fn run(&self, config: &Pkcs11SetupConfig) -> Result<Pkcs11SetupOutcome> {
        if let Some(reason) = self.check_host(config).await {
            warn!(reason = %reason, "PKCS#11 tests are disabled");
            return Ok(Pkcs11SetupOutcome::Skipped(reason));
        }

        let Some(library) = self.locate_library(&config.library_name).await? else {
            let reason = SkipReason::LibraryNotFound(config.library_name.clone());
            warn!(reason = %reason, "PKCS#11 tests are disabled");
            return Ok(Pkcs11SetupOutcome::Skipped(reason));
        };
        info!(library = %library.display(), "Found SoftHSM2 library");

        let mut env = TestEnv::new();

        let layout = SoftHsmLayout::under(&config.build_dir);
        tokio::fs::create_dir_all(&layout.token_dir).await?;
        self.export(&mut env, SOFTHSM2_CONF_VAR, &layout.conf_path.display().to_string())?;
        tokio::fs::write(&layout.conf_path, layout.conf_contents()).await?;
        info!(conf = %layout.conf_path.display(), "Wrote SoftHSM2 config");

        let util = SoftHsmUtil::new(self.runner.clone(), &config.util_program);
        util.print_version(&env).await?;
        util.init_token(&env, &config.token_label, &config.pin, &config.so_pin)
            .await?;

        let slot = util
            .initialized_slots(&env)
            .await?
            .first()
            .copied()
            .ok_or(DomainError::NoInitializedToken)?;
        info!(slot = %slot, token_label = %config.token_label, "Token initialized");

        util.import_key(
            &env,
            &config.private_key_path(),
            slot,
            &config.key_label,
            &config.key_id,
            &config.pin,
        )
        .await?;
        util.show_slots(&env, &config.pin).await?;

        let cert = config.cert_path().display().to_string();
        self.export(&mut env, TEST_PKCS11_LIB_VAR, &library.display().to_string())?;
        self.export(&mut env, TEST_PKCS11_TOKEN_LABEL_VAR, &config.token_label)?;
        self.export(&mut env, TEST_PKCS11_PIN_VAR, &config.pin)?;
        self.export(&mut env, TEST_PKCS11_PKEY_LABEL_VAR, &config.key_label)?;
        self.export(&mut env, TEST_PKCS11_CERT_FILE_VAR, &cert)?;
        self.export(&mut env, TEST_PKCS11_CA_FILE_VAR, &cert)?;

        info!(slot = %slot, exported = %env.len(), "PKCS#11 test setup complete");

        Ok(Pkcs11SetupOutcome::Configured(Pkcs11Setup {
            library,
            slot,
            layout,
            env,
        }))
    }

    /// Soft-skip checks that need nothing configured yet
    async fn check_host(&self, config: &Pkcs11SetupConfig) -> Option<SkipReason> {
        let machine = self.system_probe.machine();
        if machine.starts_with(UNSUPPORTED_MACHINE_PREFIX) {
            return Some(SkipReason::UnsupportedMachine(machine));
        }

        if let Err(e) = self.installer.install(&[config.package.clone()]).await {
            warn!(package = %config.package, error = %e, "Package installation failed");
            return Some(SkipReason::InstallFailed(config.package.clone()));
        }

        None
    }

    /// Filesystem walk, kept off the runtime thread
    async fn locate_library(&self, name_fragment: &str) -> Result<Option<PathBuf>> {
        let locator = self.locator.clone();
        let name_fragment = name_fragment.to_string();
        tokio::task::spawn_blocking(move || locator.locate(&name_fragment))
            .await
            .map_err(|e| AppError::Internal(format!("library search task failed: {}", e)))
    }

    /// Set a variable now and for the later test run
    fn export(&self, env: &mut TestEnv, name: &str, value: &str) -> Result<()> {
        env.set(name, value)?;
        self.env_sink.set(name, value)?;
        debug!(name = %name, value = %value, "Exported variable");
        Ok(())
    }
}
