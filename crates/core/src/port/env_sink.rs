// Env Sink Port
// Receives every variable the setup exports (now, and for later CI steps)

/// Destination for exported environment variables
pub trait EnvSink: Send + Sync {
    /// Set a variable now and make sure a later test process sees it too
    ///
    /// # Errors
    /// - std::io::Error if the variable cannot be persisted (e.g. env file)
    fn set(&self, name: &str, value: &str) -> std::io::Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Records variables instead of touching the process environment
    pub struct RecordingEnvSink {
        recorded: Mutex<Vec<(String, String)>>,
    }
    impl RecordingEnvSink {
        pub fn new() -> Self {
            Self {
                recorded: Mutex::new(Vec::new()),
            }
        }
        pub fn recorded(&self) -> Vec<(String, String)> {
            self.recorded.lock().unwrap().clone()
        }
        pub fn get(&self, name: &str) -> Option<String> {
            self.recorded
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        }
    }
    impl Default for RecordingEnvSink {
        fn default() -> Self {
            Self::new()
        }
    }
    impl EnvSink for RecordingEnvSink {
        fn set(&self, name: &str, value: &str) -> std::io::Result<()> {
            self.recorded
                .lock()
                .unwrap()
                .push((name.to_string(), value.to_string()));
            Ok(())
        }
    }
}
