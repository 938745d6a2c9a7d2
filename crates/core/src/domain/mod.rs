// Domain Layer - Values passed between the build actions and their tools

pub mod error;
pub mod slot;
pub mod softhsm;
pub mod test_env;

// Re-exports
pub use error::DomainError;
pub use slot::SlotId;
pub use softhsm::SoftHsmLayout;
pub use test_env::TestEnv;
