// Application Layer - Build action use cases

pub mod constants;
pub mod pkcs11;
pub mod test_loop;

// Re-exports
pub use pkcs11::{Pkcs11Setup, Pkcs11SetupConfig, Pkcs11SetupOutcome, Pkcs11TestSetup, SkipReason};
pub use test_loop::{TestLoop, TestLoopConfig, TestLoopOutcome, TestVerdict};
