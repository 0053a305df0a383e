//! Logging and tracing utilities

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "warn,letter_market=info,market_newsletter=info";

/// Filter used for `--verbose` when `RUST_LOG` is not set
pub const VERBOSE_FILTER: &str = "info,letter_market=debug,letter_llm=debug,market_newsletter=debug";

/// Output options for the tracing subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    /// Use the verbose default filter
    pub verbose: bool,
    /// Emit newline-delimited JSON instead of human-readable lines
    pub json: bool,
}

impl LogOptions {
    /// Filter directive applied when `RUST_LOG` is absent
    pub fn default_directive(&self) -> &'static str {
        if self.verbose {
            VERBOSE_FILTER
        } else {
            DEFAULT_FILTER
        }
    }
}

/// Initialize the tracing subscriber
///
/// Logs go to stderr so command output on stdout stays clean.
pub fn init_tracing(options: LogOptions) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.default_directive()));

    let json_layer = options
        .json
        .then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!options.json).then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
