use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;
use crate::error::ResolverError;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `settings.level` when set. Fails if a subscriber is
/// already installed.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), ResolverError> {
    let log_level = settings.level.parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("defi_underlying_resolver={}", log_level).into())
    };

    match settings.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter())
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(filter())
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter())
                .with(tracing_subscriber::fmt::layer().compact())
                .try_init()?;
        }
    }

    Ok(())
}
