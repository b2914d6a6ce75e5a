// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

use crate::content::EnumerationLimits;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub store: StoreConfig,
    pub content: ContentConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
    /// Seconds to wait for in-flight connections on shutdown
    pub shutdown_timeout: u64,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
}

/// Store backend selection
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Ordered in-memory map, optionally seeded from `seed_file`
    Memory,
    /// Directory tree under `data_dir`
    Fs,
}

/// Document store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub data_dir: String,
    #[serde(default)]
    pub seed_file: Option<String>,
}

/// Document serving configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    /// Suffix appended to derived storage keys
    pub suffix: String,
    /// Exact path of the key listing endpoint
    pub list_keys_path: String,
    /// `max-age` for full document responses (seconds)
    pub max_age: u32,
    pub list_page_size: usize,
    pub max_list_pages: usize,
}

impl ContentConfig {
    pub const fn enumeration_limits(&self) -> EnumerationLimits {
        EnumerationLimits {
            page_size: self.list_page_size,
            max_pages: self.max_list_pages,
        }
    }
}
