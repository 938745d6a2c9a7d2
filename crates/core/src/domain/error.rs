// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Old softhsm2-util builds print their help and exit 0 on unknown flags
    #[error("{program} printed its usage banner (unsupported arguments?)")]
    UsageBanner { program: String },

    #[error("{program} exited with status {exit_code:?}")]
    CommandFailed {
        program: String,
        exit_code: Option<i32>,
    },

    #[error("No slot with an initialized token was reported")]
    NoInitializedToken,

    #[error("Invalid environment variable name: {0:?}")]
    InvalidEnvName(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
