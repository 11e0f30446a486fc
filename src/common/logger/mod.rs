use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub mod formatter;

pub use formatter::*;

use crate::configs::LoggingConfig;

/// Builds the filter string from config: `<level>,<filters>`, with noisy
/// HTTP internals held at `warn` unless the filters say otherwise.
pub fn filter_directives(logging: Option<&LoggingConfig>) -> String {
    let level = logging
        .and_then(|l| l.level.as_deref())
        .unwrap_or("info");
    let filters = logging.and_then(|l| l.filters.as_deref()).unwrap_or("");

    if filters.is_empty() {
        format!("{},hyper=warn,reqwest=warn", level)
    } else {
        format!("{},hyper=warn,reqwest=warn,{}", level, filters)
    }
}

/// `RUST_LOG` wins over the config file.
pub fn init(logging: Option<&LoggingConfig>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(logging)));

    let stdout_layer = fmt::layer()
        .event_format(CustomFormatter::new(true))
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .init();
}
