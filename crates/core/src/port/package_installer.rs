// Package Installer Port
// Abstraction over the host package manager (apt-get, dnf, yum, apk, brew)

use crate::port::ExecutionError;
use async_trait::async_trait;
use thiserror::Error;

/// Installation errors
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("No supported package manager found on PATH")]
    NoPackageManager,

    #[error("{manager} failed to install {packages:?} (exit status {exit_code:?})")]
    Failed {
        manager: String,
        packages: Vec<String>,
        exit_code: Option<i32>,
    },

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Package Installer trait
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    /// Install packages by name, non-interactively
    ///
    /// # Errors
    /// - InstallError::NoPackageManager if the host has no known manager
    /// - InstallError::Failed if the manager exits non-zero
    async fn install(&self, packages: &[String]) -> Result<(), InstallError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Mock Package Installer for testing
    pub struct MockPackageInstaller {
        fail: bool,
        installed: Mutex<Vec<String>>,
    }
    impl MockPackageInstaller {
        pub fn new_success() -> Self {
            Self {
                fail: false,
                installed: Mutex::new(Vec::new()),
            }
        }
        pub fn new_fail() -> Self {
            Self {
                fail: true,
                installed: Mutex::new(Vec::new()),
            }
        }
        pub fn installed(&self) -> Vec<String> {
            self.installed.lock().unwrap().clone()
        }
    }
    #[async_trait]
    impl PackageInstaller for MockPackageInstaller {
        async fn install(&self, packages: &[String]) -> Result<(), InstallError> {
            if self.fail {
                return Err(InstallError::NoPackageManager);
            }
            self.installed.lock().unwrap().extend_from_slice(packages);
            Ok(())
        }
    }
}
