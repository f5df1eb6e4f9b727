use std::net::SocketAddr;
use std::ops::Deref;
use std::str::FromStr;
use std::time::Duration;

use envconfig::Envconfig;
use once_cell::sync::Lazy;

/// Boolean env var that also accepts the usual shell spellings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlexBool(pub bool);

impl FromStr for FlexBool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(FlexBool(true)),
            "false" | "0" | "no" | "off" | "" => Ok(FlexBool(false)),
            _ => Err(format!("Invalid boolean value: {}", s)),
        }
    }
}

impl Deref for FlexBool {
    type Target = bool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(default = "127.0.0.1:3001")]
    pub address: SocketAddr,

    // Empty means the in-process store: fine for a single instance, lost on restart.
    #[envconfig(default = "")]
    pub redis_url: String,

    #[envconfig(default = "500")]
    pub redis_timeout_ms: u64,

    #[envconfig(default = "wedding-admin")]
    pub admin_key: String,

    #[envconfig(default = "1000")]
    pub max_concurrency: usize,

    #[envconfig(default = "false")]
    pub enable_metrics: bool,

    #[envconfig(default = "10")]
    pub store_health_interval_secs: u64,

    #[envconfig(from = "DEBUG", default = "false")]
    pub debug: FlexBool,
}

impl Config {
    pub fn default_test_config() -> Self {
        Self {
            address: SocketAddr::from_str("127.0.0.1:0").expect("valid test address"),
            redis_url: "".to_string(),
            redis_timeout_ms: 500,
            admin_key: "test-admin-key".to_string(),
            max_concurrency: 1000,
            enable_metrics: false,
            store_health_interval_secs: 1,
            debug: FlexBool(false),
        }
    }

    pub fn uses_redis(&self) -> bool {
        !self.redis_url.trim().is_empty()
    }

    pub fn redis_timeout(&self) -> Duration {
        Duration::from_millis(self.redis_timeout_ms)
    }

    pub fn store_health_interval(&self) -> Duration {
        Duration::from_secs(self.store_health_interval_secs.max(1))
    }
}

pub static DEFAULT_TEST_CONFIG: Lazy<Config> = Lazy::new(Config::default_test_config);
