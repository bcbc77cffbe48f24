//! Command implementations.

pub mod config;
pub mod snapshot;
pub mod watch;

use crate::domain::models::Config;

/// Apply a `--limit` override to the loaded configuration.
pub(crate) fn with_limit(mut config: Config, limit: Option<usize>) -> Config {
    if let Some(limit) = limit {
        config.poll.commit_limit = limit;
    }
    config
}
