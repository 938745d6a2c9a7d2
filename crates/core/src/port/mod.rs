// Port Layer - Interfaces for external dependencies

pub mod command_runner;
pub mod env_sink;
pub mod library_locator;
pub mod package_installer;
pub mod system_probe;
pub mod time_provider;

// Re-exports
pub use command_runner::{
    CommandOutput, CommandRunner, CommandSpec, ExecutionError, ExecutionStatus,
};
pub use env_sink::EnvSink;
pub use library_locator::LibraryLocator;
pub use package_installer::{InstallError, PackageInstaller};
pub use system_probe::SystemProbe;
pub use time_provider::TimeProvider;
