use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Placeholder signing secret shipped in the defaults.
pub const DEFAULT_SECRET: &str = "change-me";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub secret: String,
}

impl AuthConfig {
    pub fn uses_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Mongodb,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub mongodb_uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3001,
            },
            auth: AuthConfig {
                secret: DEFAULT_SECRET.to_string(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Mongodb,
                mongodb_uri: "mongodb://localhost:27017".to_string(),
                database: "TourLedger".to_string(),
            },
            cors: CorsConfig {
                origins: vec![
                    "http://localhost:5173".to_string(),
                    "http://localhost:4173".to_string(),
                ],
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix("TOURLEDGER")
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("cors.origins")
        .try_parsing(true)
}

impl Config {
    /// Defaults, then an optional `tourledger.{toml,yaml,...}` file, then
    /// `TOURLEDGER_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        ConfigBuilder::builder()
            .add_source(ConfigBuilder::try_from(&Config::default())?)
            .add_source(File::with_name("tourledger").required(false))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }
}
