// System probe implementation
// reason: nix for uname(2) on unix hosts (ADR-001)
use tracing::debug;

use ci_actions_core::port::SystemProbe;

/// System probe backed by `uname`
#[derive(Debug, Default)]
pub struct SystemProbeImpl;

impl SystemProbeImpl {
    pub fn new() -> Self {
        Self
    }
}

impl SystemProbe for SystemProbeImpl {
    #[cfg(unix)]
    fn machine(&self) -> String {
        let machine = match nix::sys::utsname::uname() {
            Ok(uts) => uts.machine().to_string_lossy().into_owned(),
            Err(e) => {
                debug!(error = %e, "uname failed, using compile-time arch");
                std::env::consts::ARCH.to_string()
            }
        };
        debug!(machine = %machine, "Host machine");
        machine
    }

    #[cfg(not(unix))]
    fn machine(&self) -> String {
        let machine = std::env::consts::ARCH.to_string();
        debug!(machine = %machine, "Host machine");
        machine
    }
}
