use serde::{Deserialize, Serialize};

/// Application configuration, loaded once per process and passed explicitly
/// into construction. The pipeline never reads ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub source: SourceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding one CSV file per source table.
    pub data_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            source: SourceConfig {
                data_dir: "./data".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults above.
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: std::env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            source: SourceConfig {
                data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            },
        }
    }
}
