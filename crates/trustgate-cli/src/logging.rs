//! Diagnostics go to stderr so stdout stays machine-readable.

use trustgate_settings::{LogFormat, LogSettings};
use tracing_subscriber::EnvFilter;

pub fn init_logging(settings: &LogSettings) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_new(&settings.filter)
        .map_err(|e| anyhow::anyhow!("invalid log filter '{}': {}", settings.filter, e))?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match settings.format {
        LogFormat::Pretty => subscriber
            .pretty()
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize pretty logger: {}", e))?,
        LogFormat::Compact => subscriber
            .compact()
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize compact logger: {}", e))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize JSON logger: {}", e))?,
    }

    tracing::debug!(format = %settings.format, filter = %settings.filter, "logging initialized");
    Ok(())
}
