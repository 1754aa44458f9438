//! Runner diagnostics
//!
//! stdout carries the node's JSON output, so every log line goes to stderr.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset: `info` with `--verbose`, else `warn`
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "info"
    } else {
        "warn"
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_directive`, e.g.
/// `RUST_LOG=gitlab_api=debug` shows each request the client sends
/// (the access token is never part of a log field).
///
/// Fails if a subscriber is already installed.
pub fn init(default_directive: &str) -> crate::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| crate::Error::Other(format!("Failed to initialize tracing: {}", e)))?;

    Ok(())
}

/// Debug-level logging for tests; repeated calls are ignored
pub fn init_test() {
    let _ = init("debug");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true), "info");
        assert_eq!(default_directive(false), "warn");
    }

    #[test]
    fn test_init_test_is_repeatable() {
        init_test();
        init_test();
    }

    #[test]
    fn test_second_init_fails() {
        init_test();
        assert!(init("warn").is_err());
    }
}
