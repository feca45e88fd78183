use tracing::level_filters::LevelFilter;

use crate::{errors::Error, Result};

/// Initialize logging/tracing for the monitor.
///
/// `RUST_LOG` wins when set. Otherwise our crates log at `level` and
/// dependencies at `warn`.
pub fn init(service_name: &str, level: LevelFilter) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,{service_name}={level},tgmon_core={level},tgmon_telegram={level},tgmon_userbot={level}"
        ))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .try_init()
        .map_err(|e| Error::External(format!("failed to install log subscriber: {e}")))
}
