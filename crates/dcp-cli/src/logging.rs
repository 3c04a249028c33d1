//! Tracing subscriber setup

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber
///
/// Logs go to stderr so that stdout stays free for reports. `RUST_LOG`
/// overrides `default_level`.
///
/// # Errors
/// Returns error if the filter is invalid or a subscriber is already installed
pub fn init(default_level: &str) -> anyhow::Result<()> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    let filter_layer =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_fails() {
        // Only one global subscriber per process
        let _ = init("debug");
        tracing::info!("logging initialized");
        assert!(init("debug").is_err());
    }
}
