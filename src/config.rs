use std::time::Duration;

use serde::Deserialize;

use crate::models::TimeWindow;

/// Placeholder token shipped in sample env files; treated as "not configured"
const PLACEHOLDER_TOKEN: &str = "your_tmdb_access_token_here";

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB v4 read access token. Absent or placeholder means demo mode.
    #[serde(default)]
    pub tmdb_access_token: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds between trending polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds between heartbeats on open viewer connections
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// Time window the poller asks the metadata API for
    #[serde(default)]
    pub trending_window: TimeWindow,

    /// Upper bound on entries in one delta notification
    #[serde(default = "default_max_delta_size")]
    pub max_delta_size: usize,

    /// Entries sent to a viewer right after it connects
    #[serde(default = "default_initial_burst_size")]
    pub initial_burst_size: usize,

    /// Per-viewer outbound queue depth
    #[serde(default = "default_viewer_buffer")]
    pub viewer_buffer: usize,

    /// Maximum simultaneously registered viewers
    #[serde(default = "default_max_viewers")]
    pub max_viewers: usize,

    /// Requests per client per minute on rate-limited routes
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,

    /// Key rate limits on `x-forwarded-for`; only safe behind a trusted proxy
    #[serde(default)]
    pub trust_forwarded_for: bool,

    /// Origins allowed by CORS. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_heartbeat_interval_secs() -> u64 {
    30
}

fn default_max_delta_size() -> usize {
    3
}

fn default_initial_burst_size() -> usize {
    5
}

fn default_viewer_buffer() -> usize {
    16
}

fn default_max_viewers() -> usize {
    1024
}

fn default_rate_limit_per_minute() -> u32 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmdb_access_token: None,
            tmdb_api_url: default_tmdb_api_url(),
            host: default_host(),
            port: default_port(),
            poll_interval_secs: default_poll_interval_secs(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            trending_window: TimeWindow::default(),
            max_delta_size: default_max_delta_size(),
            initial_burst_size: default_initial_burst_size(),
            viewer_buffer: default_viewer_buffer(),
            max_viewers: default_max_viewers(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
            trust_forwarded_for: false,
            cors_origins: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make the pipeline misbehave at runtime
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_secs == 0 {
            anyhow::bail!("POLL_INTERVAL_SECS must be greater than zero");
        }
        if self.heartbeat_interval_secs == 0 {
            anyhow::bail!("HEARTBEAT_INTERVAL_SECS must be greater than zero");
        }
        if self.viewer_buffer == 0 {
            anyhow::bail!("VIEWER_BUFFER must be greater than zero");
        }
        if self.max_delta_size == 0 {
            anyhow::bail!("MAX_DELTA_SIZE must be greater than zero");
        }
        Ok(())
    }

    /// Returns the access token only when it looks usable
    pub fn usable_token(&self) -> Option<&str> {
        self.tmdb_access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty() && *token != PLACEHOLDER_TOKEN)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_ok!(config.validate());
        assert_eq!(config.poll_interval(), Duration::from_secs(300));
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(30));
        assert_eq!(config.max_delta_size, 3);
        assert_eq!(config.initial_burst_size, 5);
    }

    #[test]
    fn test_zero_viewer_buffer_rejected() {
        let config = Config {
            viewer_buffer: 0,
            ..Config::default()
        };
        assert_err!(config.validate());
    }

    #[test]
    fn test_usable_token_filters_placeholder_and_blank() {
        let mut config = Config::default();
        assert_eq!(config.usable_token(), None);

        config.tmdb_access_token = Some("   ".to_string());
        assert_eq!(config.usable_token(), None);

        config.tmdb_access_token = Some(PLACEHOLDER_TOKEN.to_string());
        assert_eq!(config.usable_token(), None);

        config.tmdb_access_token = Some(" eyJhbGciOi ".to_string());
        assert_eq!(config.usable_token(), Some("eyJhbGciOi"));
    }

    #[test]
    fn test_bind_addr() {
        let config = Config {
            host: "0.0.0.0".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }
}
