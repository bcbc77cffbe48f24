use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration structure for pipewatch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Source-control API configuration
    #[serde(default)]
    pub github: GitHubConfig,

    /// Build-matrix API configuration
    #[serde(default)]
    pub travis: TravisConfig,

    /// Polling cadence and bounds
    #[serde(default)]
    pub poll: PollConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Source-control (GitHub) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GitHubConfig {
    /// REST API base URL
    #[serde(default = "default_github_api_base")]
    pub api_base: String,

    /// Repository owner
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Repository name
    #[serde(default = "default_repo")]
    pub repo: String,

    /// Optional access token; unauthenticated requests are heavily rate limited
    #[serde(default)]
    pub token: Option<String>,
}

fn default_github_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_owner() -> String {
    "mozilla-platform-ops".to_string()
}

fn default_repo() -> String {
    "cloud-image-builder".to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_github_api_base(),
            owner: default_owner(),
            repo: default_repo(),
            token: None,
        }
    }
}

/// Build-matrix (Travis) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TravisConfig {
    /// REST API base URL
    #[serde(default = "default_travis_api_base")]
    pub api_base: String,

    /// `owner/repo` slug the builds belong to
    #[serde(default = "default_repo_slug")]
    pub repo_slug: String,

    /// Status contexts served by the build-matrix API; every other
    /// context is treated as a task group
    #[serde(default = "default_travis_contexts")]
    pub contexts: Vec<String>,
}

fn default_travis_api_base() -> String {
    "https://api.travis-ci.org".to_string()
}

fn default_repo_slug() -> String {
    "mozilla-platform-ops/cloud-image-builder".to_string()
}

fn default_travis_contexts() -> Vec<String> {
    vec!["continuous-integration/travis-ci/push".to_string()]
}

impl Default for TravisConfig {
    fn default() -> Self {
        Self {
            api_base: default_travis_api_base(),
            repo_slug: default_repo_slug(),
            contexts: default_travis_contexts(),
        }
    }
}

/// Polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PollConfig {
    /// Number of recent commits watched by the dashboard
    #[serde(default = "default_commit_limit")]
    pub commit_limit: usize,

    /// Fixed re-poll period of the commit list
    #[serde(default = "default_root_interval_secs")]
    pub root_interval_secs: u64,

    /// Lower bound of the jittered period for every other node
    #[serde(default = "default_min_interval_secs")]
    pub min_interval_secs: u64,

    /// Upper bound of the jittered period for every other node
    #[serde(default = "default_max_interval_secs")]
    pub max_interval_secs: u64,

    /// Bound on a single upstream fetch
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

const fn default_commit_limit() -> usize {
    3
}

const fn default_root_interval_secs() -> u64 {
    300
}

const fn default_min_interval_secs() -> u64 {
    5
}

const fn default_max_interval_secs() -> u64 {
    60
}

const fn default_fetch_timeout_secs() -> u64 {
    30
}

impl PollConfig {
    pub fn root_interval(&self) -> Duration {
        Duration::from_secs(self.root_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            commit_limit: default_commit_limit(),
            root_interval_secs: default_root_interval_secs(),
            min_interval_secs: default_min_interval_secs(),
            max_interval_secs: default_max_interval_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateLimitConfig {
    /// Requests per second allowed
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// Burst size for token bucket
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

const fn default_requests_per_second() -> f64 {
    10.0
}

const fn default_burst_size() -> u32 {
    20
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotation of log files: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
