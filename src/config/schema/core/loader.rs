use super::Config;
use crate::error::{ConfigError, Result};
use directories::UserDirs;
use std::fs;
use std::path::Path;

impl Config {
    /// Loads `~/.toolweave/config.toml`, writing defaults on first run.
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .ok_or_else(|| ConfigError::Load("could not find home directory".into()))?;
        let toolweave_dir = home.join(".toolweave");
        let config_path = toolweave_dir.join("config.toml");

        if !toolweave_dir.exists() {
            fs::create_dir_all(&toolweave_dir).map_err(ConfigError::from)?;
        }

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self {
                config_path,
                ..Self::default()
            };
            config.save()?;
            tracing::info!(path = %config.config_path.display(), "wrote default config");
            Ok(config)
        }
    }

    /// Loads an explicit config file. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|error| {
            ConfigError::Load(format!("Failed to read config file {}: {error}", path.display()))
        })?;
        let mut config: Config = toml::from_str(&contents).map_err(|error| {
            ConfigError::Load(format!("Failed to parse config file {}: {error}", path.display()))
        })?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self)
            .map_err(|error| ConfigError::Load(format!("Failed to serialize config: {error}")))?;
        fs::write(&self.config_path, toml_str).map_err(ConfigError::from)?;
        Ok(())
    }
}
