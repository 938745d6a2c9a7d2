// Host inspection port
// reason: lets the setup use case decide on unsupported hosts without touching libc

/// System probe port for host facts
///
/// Used to skip PKCS#11 setup on hosts SoftHSM2 does not support
pub trait SystemProbe: Send + Sync {
    /// Hardware name as reported by `uname -m` (e.g. "x86_64", "armv7l")
    fn machine(&self) -> String;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;

    /// Mock SystemProbe for testing
    pub struct MockSystemProbe {
        machine: String,
    }
    impl MockSystemProbe {
        pub fn new(machine: impl Into<String>) -> Self {
            Self {
                machine: machine.into(),
            }
        }
    }
    impl SystemProbe for MockSystemProbe {
        fn machine(&self) -> String {
            self.machine.clone()
        }
    }
}
