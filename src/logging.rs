//! Tracing subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ExecError, Result};

/// Initializes the global tracing subscriber with the given filter directive.
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| ExecError::InvalidArgument(format!("Invalid log level: {e}")))?,
        )
        .with_target(true)
        .try_init()
        .map_err(|_| ExecError::InvalidArgument("Logging already initialized".into()))
}
