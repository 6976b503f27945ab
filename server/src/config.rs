use arena_shared::config::GameConfig;
use std::env;
use std::str::FromStr;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub tick_rate_hz: u32,
    pub rng_seed: u64,
    /// Per-recipient bound on a snapshot send (milliseconds)
    pub send_timeout_ms: u64,
    /// Frames buffered per session before sends start to wait
    pub outbound_queue: usize,
    pub static_dir: String,
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5050".to_string(),
            tick_rate_hz: 10,
            rng_seed: 42,
            send_timeout_ms: 1000,
            outbound_queue: 16,
            static_dir: "./static".to_string(),
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overlaid with `ARENA_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(addr) = env_string("ARENA_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(dir) = env_string("ARENA_STATIC_DIR") {
            config.static_dir = dir;
        }
        config.tick_rate_hz = env_parse("ARENA_TICK_RATE_HZ").unwrap_or(config.tick_rate_hz);
        config.rng_seed = env_parse("ARENA_RNG_SEED").unwrap_or(config.rng_seed);
        config
    }

    pub fn tick_seconds(&self) -> f64 {
        1.0 / self.tick_rate_hz as f64
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.tick_rate_hz == 0 {
            return Err("tick_rate_hz must be > 0".to_string());
        }
        if self.outbound_queue == 0 {
            return Err("outbound_queue must be > 0".to_string());
        }
        if self.send_timeout_ms == 0 {
            return Err("send_timeout_ms must be > 0".to_string());
        }
        self.game.validate()
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|value| value.parse().ok())
}
