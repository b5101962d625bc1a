// src/telemetry.rs
//! Tracing subscriber setup for binaries and local runs.
//!
//! Library code only emits events; installing a subscriber is the caller's choice.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_FORMAT: &str = "LYRICS_LOG_FORMAT";
pub const DEFAULT_FILTER: &str = "rock_lyrics_analytics=info,warn";

/// Install a global subscriber: `RUST_LOG` filter (default `DEFAULT_FILTER`), compact
/// output, or JSON lines when `LYRICS_LOG_FORMAT=json`. Safe to call more than once;
/// returns false when a subscriber was already set.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var(ENV_LOG_FORMAT).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        init_tracing();
        assert!(!init_tracing());
    }
}
