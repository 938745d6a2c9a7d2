//! Logging setup
//!
//! Logs go to stderr so stdout stays usable for the test log and exports.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: `ci_actions=info`)
//! - `CI_ACTIONS_LOG_FORMAT`: `pretty` (default) or `json`

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "ci_actions=info,ci_actions_core=info,ci_actions_infra_system=info";

/// Initialize the global tracing subscriber
pub fn init_logging(format: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Failed to create env filter")?;

    match format {
        "json" => {
            // CI log collectors: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to install JSON subscriber")?;
        }
        _ => {
            // Interactive: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to install subscriber")?;
        }
    }

    Ok(())
}
