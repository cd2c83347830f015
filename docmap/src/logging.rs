//! Logging initialization.
//!
//! The library itself only emits `tracing` events; applications pick a subscriber here
//! or install their own.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

/// Logging profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output, `docmap=debug` unless `RUST_LOG` says otherwise.
    Development,
    /// JSON output, `docmap=info` unless `RUST_LOG` says otherwise.
    Production,
    /// Registry without output, for tests.
    Test,
}

static INIT_ONCE: Once = Once::new();

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Installs the global subscriber for `profile`.
///
/// Only the first call has an effect. A subscriber installed elsewhere beforehand is
/// left in place.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let _ = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_env_filter(filter("docmap=debug"))
                .finish()
                .try_init(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter("docmap=info"))
                .finish()
                .try_init(),
            Profile::Test => tracing_subscriber::registry().try_init(),
        };

        tracing::debug!(?profile, "logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init(Profile::Test);
        init(Profile::Test);
        init(Profile::Development);
    }
}
