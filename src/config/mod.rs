use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

/// Complete worldcast configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorldConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub subscriber: SubscriberConfig,
}

/// HTTP/WebSocket listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Directory served under /static
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            static_dir: default_static_dir(),
        }
    }
}

/// What happens when a subscriber's outbound queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Drop the subscriber; the client must reconnect and re-fetch the world
    #[default]
    Disconnect,
    /// Discard the oldest pending notification to make room
    DropOldest,
}

impl FromStr for OverflowPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disconnect" => Ok(Self::Disconnect),
            "drop_oldest" => Ok(Self::DropOldest),
            other => Err(ConfigError::InvalidValue {
                key: "overflow_policy",
                value: other.to_string(),
            }),
        }
    }
}

/// Per-subscriber outbound queue configuration
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SubscriberConfig {
    /// Maximum pending notifications per subscriber (at least 1)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default)]
    pub overflow_policy: OverflowPolicy,
}

fn default_queue_capacity() -> usize {
    4096
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            overflow_policy: OverflowPolicy::default(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<WorldConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: WorldConfig = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

impl WorldConfig {
    /// Apply WORLDCAST_* environment overrides; unparseable values are ignored
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("WORLDCAST_BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Ok(v) = std::env::var("WORLDCAST_STATIC_DIR") {
            self.server.static_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("WORLDCAST_QUEUE_CAPACITY") {
            if let Ok(n) = v.parse::<usize>() {
                if n > 0 {
                    self.subscriber.queue_capacity = n;
                }
            }
        }
        if let Ok(v) = std::env::var("WORLDCAST_OVERFLOW_POLICY") {
            if let Ok(policy) = v.parse::<OverflowPolicy>() {
                self.subscriber.overflow_policy = policy;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.subscriber.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "queue_capacity",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}
