//! Process-wide tracing setup.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize a tracing subscriber writing compact lines to stderr.
///
/// The level comes from `RUST_LOG`, defaulting to `info`.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a global subscriber is
/// already installed.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry().with(filter_layer).with(fmt_layer).try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_rejected() {
        // Only the first call in a process can install the subscriber.
        let _ = init();
        assert!(init().is_err());
        tracing::info!("logging initialized");
    }
}
