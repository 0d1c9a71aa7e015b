//! Diagnostic logging setup.

use std::io;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are shown at the chosen level.
const CRATES: &[&str] = &[
    "askyourdocs",
    "ayd_config",
    "ayd_document",
    "ayd_index",
    "ayd_llm",
    "ayd_query",
];

/// Builds the filter directive for a `-v` count.
pub fn filter_directive(verbose: u8) -> String {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let mut directive = String::from("warn");
    for krate in CRATES {
        directive.push_str(&format!(",{krate}={level}"));
    }
    directive
}

/// Installs a stderr subscriber. `RUST_LOG` overrides the verbosity flag.
pub fn init(verbose: u8, ansi: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbose)));
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(ansi)
        .with_target(verbose > 1);
    // A second init (e.g. in tests) keeps the first subscriber.
    if tracing_subscriber::registry().with(filter).with(layer).try_init().is_err() {
        tracing::debug!("logging already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert!(filter_directive(0).contains("ayd_index=warn"));
        assert!(filter_directive(1).contains("ayd_query=info"));
        assert!(filter_directive(3).contains("askyourdocs=debug"));
        assert!(filter_directive(2).starts_with("warn,"));
    }
}
