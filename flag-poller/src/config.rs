use std::time::Duration;

use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(default = "http://127.0.0.1:3001")]
    pub flags_url: String,

    #[envconfig(default = "10000")]
    pub poll_base_interval_ms: u64,

    #[envconfig(default = "1.5")]
    pub poll_backoff_factor: f64,

    #[envconfig(default = "6.0")]
    pub poll_max_multiplier: f64,

    #[envconfig(default = "10000")]
    pub poll_fetch_timeout_ms: u64,

    // Set to run as an admin session.
    pub admin_key: Option<String>,

    #[envconfig(from = "DEBUG", default = "false")]
    pub debug: bool,
}

impl Config {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            base_interval: Duration::from_millis(self.poll_base_interval_ms),
            backoff_factor: self.poll_backoff_factor.max(1.0),
            max_multiplier: self.poll_max_multiplier.max(1.0),
            fetch_timeout: Duration::from_millis(self.poll_fetch_timeout_ms),
        }
    }
}

/// Scheduling knobs for one polling session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PollSettings {
    pub base_interval: Duration,
    pub backoff_factor: f64,
    pub max_multiplier: f64,
    pub fetch_timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings {
            base_interval: Duration::from_secs(10),
            backoff_factor: 1.5,
            max_multiplier: 6.0,
            fetch_timeout: Duration::from_secs(10),
        }
    }
}
