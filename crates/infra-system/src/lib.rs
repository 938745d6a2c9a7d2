// CI Actions Infrastructure - System Adapters
// Implements: CommandRunner, PackageInstaller, LibraryLocator, EnvSink, SystemProbe (ADR-002)

pub mod env_sink;
pub mod library_locator;
pub mod package_installer;
pub mod subprocess_runner;
pub mod system_probe_impl;

pub use env_sink::ProcessEnvSink;
pub use library_locator::FsLibraryLocator;
pub use package_installer::SystemPackageInstaller;
pub use subprocess_runner::SubprocessRunner;
pub use system_probe_impl::SystemProbeImpl;
