use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilerConfig {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout_seconds: u64,
    pub migrate_on_start: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory backing the bootstrap local disk.
    pub root: PathBuf,
    /// Name the bootstrap local disk is registered under.
    pub disk_name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:./fileable.db".to_string(),
            max_connections: 10,
            min_connections: 1,
            connection_timeout_seconds: 30,
            migrate_on_start: true,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./storage"),
            disk_name: "local".to_string(),
        }
    }
}

impl FilerConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&FilerConfig::default())?);

        if std::path::Path::new("fileable.toml").exists() {
            builder = builder.add_source(File::with_name("fileable"));
        }

        builder = builder.add_source(
            Environment::with_prefix("FILEABLE")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let filer_config: FilerConfig = config.try_deserialize()?;

        filer_config.validate()?;

        Ok(filer_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.is_empty() {
            return Err(ConfigError::Message(
                "database URL cannot be empty".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "database max connections must be greater than 0".to_string(),
            ));
        }

        if self.storage.root.as_os_str().is_empty() {
            return Err(ConfigError::Message(
                "storage root cannot be empty".to_string(),
            ));
        }

        if self.storage.disk_name.is_empty() {
            return Err(ConfigError::Message(
                "storage disk name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = FilerConfig::default();
        assert_eq!(config.database.url, "sqlite:./fileable.db");
        assert_eq!(config.storage.disk_name, "local");
        assert!(config.database.migrate_on_start);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = FilerConfig::default();
        config.database.url = String::new();
        assert!(config.validate().is_err());

        config = FilerConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        config = FilerConfig::default();
        config.storage.disk_name = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_falls_back_to_defaults() {
        std::env::remove_var("FILEABLE_DATABASE_URL");

        let config = FilerConfig::load().expect("should load default configuration");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.storage.root, PathBuf::from("./storage"));
    }
}
