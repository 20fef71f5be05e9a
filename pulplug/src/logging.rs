//! Logging setup for provider plugins
//!
//! All output goes to **stderr**: stdout carries the port handshake and must
//! contain nothing else. `RUST_LOG` wins when set; otherwise the level follows
//! the `-v` verbosity the engine passes on the command line.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Map the engine's verbosity to a default filter directive
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0..=2 => "info",
        3..=8 => "debug",
        _ => "trace",
    }
}

fn filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)))
}

/// Install the global subscriber.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging(verbosity: u8) {
    tracing_subscriber::registry()
        .with(filter(verbosity))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(false),
        )
        .init();
}

/// Like [`init_logging`], but returns an error instead of panicking when a
/// subscriber is already installed.
pub fn try_init_logging(verbosity: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(filter(verbosity))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(false),
        )
        .try_init()?;
    Ok(())
}
