// Library Locator Port
// reason: the filesystem walk is infrastructure; the setup only needs "where is it?"

use std::path::PathBuf;

/// Finds a shared library on the host
pub trait LibraryLocator: Send + Sync {
    /// Return the first file whose name contains `name_fragment`, or None
    ///
    /// `ldconfig` is deliberately not consulted: some installers put the
    /// library in subfolders under lib/ that ldconfig does not index.
    fn locate(&self, name_fragment: &str) -> Option<PathBuf>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Mock LibraryLocator for testing
    pub struct MockLibraryLocator {
        found: Option<PathBuf>,
        queries: Mutex<Vec<String>>,
    }
    impl MockLibraryLocator {
        pub fn found(path: impl Into<PathBuf>) -> Self {
            Self {
                found: Some(path.into()),
                queries: Mutex::new(Vec::new()),
            }
        }
        pub fn missing() -> Self {
            Self {
                found: None,
                queries: Mutex::new(Vec::new()),
            }
        }
        pub fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }
    impl LibraryLocator for MockLibraryLocator {
        fn locate(&self, name_fragment: &str) -> Option<PathBuf> {
            self.queries.lock().unwrap().push(name_fragment.to_string());
            self.found.clone()
        }
    }
}
