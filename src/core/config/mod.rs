//! Server configuration.
//!
//! Layers, lowest to highest priority: built-in defaults, the TOML file
//! (`chantierserver.toml` or `--config <path>`), `CHANTIER_`-prefixed
//! environment variables (`CHANTIER_SERVER__PORT=9000`), and finally
//! `DATABASE_URL` when no URL was configured otherwise.

use anyhow::{bail, Context};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::shared::dates::parse_hour;

pub const DEFAULT_CONFIG_FILE: &str = "chantierserver.toml";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub planning: PlanningConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
    /// Memory backend only: start with a small demo data set.
    pub seed_demo: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Postgres,
            database_url: None,
            max_connections: 10,
            run_migrations: true,
            seed_demo: false,
        }
    }
}

/// Defaults of the planning board, overridable at runtime through the
/// configuration endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    pub day_start: String,
    pub day_end: String,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            day_start: "08:00".to_string(),
            day_end: "17:00".to_string(),
        }
    }
}

impl AppConfig {
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("CHANTIER_").split("__"))
    }

    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config: AppConfig = Self::figment(path)
            .extract()
            .context("Failed to load configuration")?;

        if config.storage.database_url.is_none() {
            config.storage.database_url = std::env::var("DATABASE_URL").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage.backend == StorageBackend::Postgres && self.storage.database_url.is_none() {
            bail!("storage.database_url (or DATABASE_URL) is required for the postgres backend");
        }
        if self.storage.max_connections == 0 {
            bail!("storage.max_connections must be at least 1");
        }

        let start = parse_hour(&self.planning.day_start).context("planning.day_start")?;
        let end = parse_hour(&self.planning.day_end).context("planning.day_end")?;
        if end <= start {
            bail!("planning.day_end must be later than planning.day_start");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.planning.day_start, "08:00");
    }

    #[test]
    fn test_file_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "chantierserver.toml",
                r#"
                [server]
                port = 9000

                [storage]
                backend = "memory"
                "#,
            )?;
            jail.set_env("CHANTIER_SERVER__HOST", "0.0.0.0");

            let config: AppConfig = AppConfig::figment(None).extract()?;
            assert_eq!(config.server.port, 9000);
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.storage.backend, StorageBackend::Memory);
            assert_eq!(config.storage.max_connections, 10);
            Ok(())
        });
    }

    #[test]
    fn test_postgres_requires_url() {
        let config = AppConfig::default();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.storage.database_url = Some("postgres://localhost/chantiers".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_working_day() {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Memory;
        config.planning.day_start = "18:00".to_string();
        assert!(config.validate().is_err());
    }
}
