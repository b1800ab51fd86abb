use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
    /// Prefix every API route is mounted under
    pub base_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub path: String,
    pub seed_demo_data: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
    pub backend: StorageBackend,
    /// Directory uploads are written to by the local backend
    pub local_dir: String,
    /// URL prefix returned for stored objects
    pub public_url: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub storage: Storage,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // 1. Optional settings.toml, in the working directory or the crate directory
        let config_file_name = "settings.toml";
        for path in [
            PathBuf::from(config_file_name),
            PathBuf::from("murmur-server").join(config_file_name),
        ] {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.base_path", "/actions")?
            .set_default("database.path", "murmur.db")?
            .set_default("database.seed_demo_data", false)?
            .set_default("storage.backend", "local")?
            .set_default("storage.local_dir", "media")?
            .set_default("storage.public_url", "/media")?;

        // 2. Environment variables win over everything else
        let overrides = [
            ("HOST", "server.host"),
            ("PORT", "server.port"),
            ("BASE_PATH", "server.base_path"),
            ("DATABASE_PATH", "database.path"),
            ("SEED_DEMO_DATA", "database.seed_demo_data"),
            ("STORAGE_BACKEND", "storage.backend"),
            ("STORAGE_LOCAL_DIR", "storage.local_dir"),
            ("STORAGE_PUBLIC_URL", "storage.public_url"),
            ("STORAGE_ENDPOINT", "storage.endpoint"),
            ("STORAGE_API_KEY", "storage.api_key"),
        ];
        for (var, key) in overrides {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        let s = builder.build()?;
        s.try_deserialize()
    }

    /// Base path normalised to a leading slash and no trailing slash
    pub fn base_path(&self) -> String {
        normalize_base_path(&self.server.base_path)
    }
}

pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
