use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project config file, looked up in the working directory.
pub const CONFIG_FILE: &str = "pipewatch.yaml";
/// Optional local overrides, not meant to be committed.
pub const LOCAL_CONFIG_FILE: &str = "pipewatch.local.yaml";
/// Prefix of environment overrides; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "PIPEWATCH_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid commit_limit: {0}. Must be at least 1")]
    InvalidCommitLimit(usize),

    #[error("Invalid min_interval_secs: {0}. Must be at least 1")]
    InvalidMinInterval(u64),

    #[error(
        "Invalid poll interval bounds: min_interval_secs ({0}) must not exceed max_interval_secs ({1})"
    )]
    InvertedIntervals(u64, u64),

    #[error("Invalid root_interval_secs: {0}. Must be at least 1")]
    InvalidRootInterval(u64),

    #[error("Invalid fetch_timeout_secs: {0}. Must be at least 1")]
    InvalidFetchTimeout(u64),

    #[error("Invalid rate limit: {0}. Must be positive")]
    InvalidRateLimit(f64),

    #[error("Invalid burst_size: {0}. Must be at least 1")]
    InvalidBurstSize(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `pipewatch.yaml` in the working directory
    /// 3. `pipewatch.local.yaml` in the working directory
    /// 4. Environment variables (`PIPEWATCH_*`, `__` for nesting)
    /// 5. An explicit `--config` file, when given
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        Self::load_from_dir(Path::new("."), explicit)
    }

    /// Same as [`ConfigLoader::load`] with project files resolved in `dir`.
    pub fn load_from_dir(dir: &Path, explicit: Option<&Path>) -> Result<Config> {
        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file {} does not exist", path.display());
            }
        }

        let config: Config = Self::figment(dir, explicit)
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a single file on top of the defaults
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(dir: &Path, explicit: Option<&Path>) -> Figment {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join(CONFIG_FILE)))
            .merge(Yaml::file(dir.join(LOCAL_CONFIG_FILE)))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        match explicit {
            Some(path) => figment.merge(Yaml::file(path)),
            None => figment,
        }
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let poll = &config.poll;
        if poll.commit_limit == 0 {
            return Err(ConfigError::InvalidCommitLimit(poll.commit_limit));
        }
        if poll.root_interval_secs == 0 {
            return Err(ConfigError::InvalidRootInterval(poll.root_interval_secs));
        }
        if poll.min_interval_secs == 0 {
            return Err(ConfigError::InvalidMinInterval(poll.min_interval_secs));
        }
        if poll.min_interval_secs > poll.max_interval_secs {
            return Err(ConfigError::InvertedIntervals(
                poll.min_interval_secs,
                poll.max_interval_secs,
            ));
        }
        if poll.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidFetchTimeout(poll.fetch_timeout_secs));
        }

        let rps = config.rate_limit.requests_per_second;
        if !rps.is_finite() || rps <= 0.0 {
            return Err(ConfigError::InvalidRateLimit(
                config.rate_limit.requests_per_second,
            ));
        }
        if config.rate_limit.burst_size == 0 {
            return Err(ConfigError::InvalidBurstSize(config.rate_limit.burst_size));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        let required = [
            ("github.api_base", &config.github.api_base),
            ("github.owner", &config.github.owner),
            ("github.repo", &config.github.repo),
            ("travis.api_base", &config.travis.api_base),
            ("travis.repo_slug", &config.travis.repo_slug),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField(name));
            }
        }

        Ok(())
    }
}
