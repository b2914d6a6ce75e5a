// Configuration module entry point
// Manages application configuration and runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, ContentConfig, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig,
    StoreBackend, StoreConfig,
};

/// Environment variable prefix, e.g. `JSONKV_SERVER__PORT=9000`
const ENV_PREFIX: &str = "JSONKV";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.shutdown_timeout", 10)?
            .set_default("http.server_name", "jsonkv-edge")?
            .set_default("store.backend", "fs")?
            .set_default("store.data_dir", "data")?
            .set_default("content.suffix", ".json")?
            .set_default("content.list_keys_path", "/list-keys")?
            .set_default("content.max_age", 300)?
            .set_default("content.list_page_size", 1000)?
            .set_default("content.max_list_pages", 10_000)?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would make the server unusable
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.content.max_list_pages == 0 {
            return Err(config::ConfigError::Message(
                "content.max_list_pages must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
