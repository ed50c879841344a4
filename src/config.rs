use std::time::Duration;

use clap::Args;

/// Storage settings. Every field can also come from the environment.
#[derive(Args, Debug, Clone)]
pub struct StoreConfig {
    /// Database file path
    #[arg(short, long, env = "STRONGROOM_DATABASE", default_value = "strongroom.db")]
    pub database: String,

    /// Maximum number of pooled connections
    #[arg(long, env = "STRONGROOM_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// How long a transaction waits for a locked database before failing, in milliseconds
    #[arg(long, env = "STRONGROOM_BUSY_TIMEOUT_MS", default_value_t = 5000)]
    pub busy_timeout_ms: u64,
}

impl StoreConfig {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: "strongroom.db".to_string(),
            max_connections: 5,
            busy_timeout_ms: 5000,
        }
    }
}
