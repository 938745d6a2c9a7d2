// Package installer implementation
// Drives whichever system package manager the host has
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use ci_actions_core::port::command_runner::{CommandRunner, CommandSpec};
use ci_actions_core::port::package_installer::{InstallError, PackageInstaller};

/// A known package manager and how to drive it non-interactively
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageManager {
    pub program: &'static str,
    /// Index refresh run before installing, if the manager needs one
    pub refresh_args: Option<&'static [&'static str]>,
    pub install_args: &'static [&'static str],
    /// System-wide managers need root (brew refuses to run as root)
    pub needs_root: bool,
}

/// Detection order
pub const PACKAGE_MANAGERS: &[PackageManager] = &[
    PackageManager {
        program: "apt-get",
        refresh_args: Some(&["-qq", "update"]),
        install_args: &["-qq", "install", "-y"],
        needs_root: true,
    },
    PackageManager {
        program: "dnf",
        refresh_args: None,
        install_args: &["install", "-y"],
        needs_root: true,
    },
    PackageManager {
        program: "yum",
        refresh_args: None,
        install_args: &["install", "-y"],
        needs_root: true,
    },
    PackageManager {
        program: "apk",
        refresh_args: None,
        install_args: &["add", "--no-cache"],
        needs_root: true,
    },
    PackageManager {
        program: "brew",
        refresh_args: None,
        install_args: &["install"],
        needs_root: false,
    },
];

/// Installs packages with the first package manager found on the search path
pub struct SystemPackageInstaller {
    runner: Arc<dyn CommandRunner>,
    search_path: Vec<PathBuf>,
    is_root: bool,
}

impl SystemPackageInstaller {
    /// Installer using `$PATH` and the real effective user
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        let search_path = std::env::var_os("PATH")
            .map(|p| std::env::split_paths(&p).collect())
            .unwrap_or_default();
        Self::with_search_path(runner, search_path, effective_user_is_root())
    }

    pub fn with_search_path(
        runner: Arc<dyn CommandRunner>,
        search_path: Vec<PathBuf>,
        is_root: bool,
    ) -> Self {
        Self {
            runner,
            search_path,
            is_root,
        }
    }

    fn find_program(&self, program: &str) -> Option<PathBuf> {
        self.search_path
            .iter()
            .map(|dir| dir.join(program))
            .find(|candidate| candidate.is_file())
    }

    /// First known package manager present on the search path
    pub fn detect(&self) -> Option<PackageManager> {
        PACKAGE_MANAGERS
            .iter()
            .copied()
            .find(|pm| self.find_program(pm.program).is_some())
    }

    /// Build the command, going through sudo when root is needed and available
    fn command(&self, pm: &PackageManager, args: &[&str], packages: &[String]) -> CommandSpec {
        let spec = if pm.needs_root && !self.is_root && self.find_program("sudo").is_some() {
            CommandSpec::new("sudo").arg(pm.program)
        } else {
            CommandSpec::new(pm.program)
        };
        spec.args(args.iter().copied())
            .args(packages.iter().cloned())
    }
}

#[async_trait]
impl PackageInstaller for SystemPackageInstaller {
    async fn install(&self, packages: &[String]) -> Result<(), InstallError> {
        let pm = self.detect().ok_or(InstallError::NoPackageManager)?;
        info!(manager = %pm.program, packages = ?packages, "Installing packages");

        if let Some(refresh_args) = pm.refresh_args {
            let refresh = self.command(&pm, refresh_args, &[]);
            let output = self.runner.run(&refresh).await?;
            if !output.is_success() {
                warn!(
                    manager = %pm.program,
                    exit_code = ?output.exit_code,
                    "Package index refresh failed, installing anyway"
                );
            }
        }

        let install = self.command(&pm, pm.install_args, packages);
        let output = self.runner.run(&install).await?;
        if !output.is_success() {
            return Err(InstallError::Failed {
                manager: pm.program.to_string(),
                packages: packages.to_vec(),
                exit_code: output.exit_code,
            });
        }

        info!(manager = %pm.program, packages = ?packages, "Packages installed");
        Ok(())
    }
}

#[cfg(unix)]
fn effective_user_is_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
fn effective_user_is_root() -> bool {
    false
}
