//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origins for CORS, comma-separated ("*" allows any)
    pub client_origin: String,
    /// Max inbound messages per second per connection
    pub input_rate_limit: u32,

    /// Simulation rules
    pub game: GameConfig,
}

/// Rules and timing of the arena simulation
#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    /// Score a team needs to win the game
    pub win_score: u32,
    /// Period of the tick driver
    pub tick_interval: Duration,
    /// Spawn positions are drawn from [-n, n] on the x and z axes
    pub spawn_half_extent: i32,
    /// Seed for AI decisions and spawn positions (random when unset)
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            win_score: 10,
            tick_interval: Duration::from_millis(100),
            spawn_half_extent: 10,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Load simulation settings, falling back to defaults for unset variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let tick_interval_ms: u64 = parse_var(
            "TICK_INTERVAL_MS",
            defaults.tick_interval.as_millis() as u64,
        )?;
        if tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("TICK_INTERVAL_MS"));
        }

        let spawn_half_extent: i32 = parse_var("SPAWN_HALF_EXTENT", defaults.spawn_half_extent)?;
        if spawn_half_extent < 0 {
            return Err(ConfigError::Invalid("SPAWN_HALF_EXTENT"));
        }

        let win_score: u32 = parse_var("WIN_SCORE", defaults.win_score)?;
        if win_score == 0 {
            return Err(ConfigError::Invalid("WIN_SCORE"));
        }

        let seed = match env::var("ARENA_SEED") {
            Ok(raw) => Some(
                raw.parse()
                    .map_err(|_| ConfigError::Invalid("ARENA_SEED"))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            win_score,
            tick_interval: Duration::from_millis(tick_interval_ms),
            spawn_half_extent,
            seed,
        })
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        let input_rate_limit: u32 = parse_var("INPUT_RATE_LIMIT", 30)?;
        if input_rate_limit == 0 {
            return Err(ConfigError::Invalid("INPUT_RATE_LIMIT"));
        }

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            client_origin: env::var("CLIENT_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            input_rate_limit,

            game: GameConfig::from_env()?,
        })
    }
}

/// Parse an optional variable, using `default` when it is not set
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
