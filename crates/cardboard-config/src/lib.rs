mod error;
mod types;

pub use error::ConfigError;
pub use types::*;

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Returns the config directory: <user config dir>/cardboard-vr/
pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("cardboard-vr");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Returns the config file path: <user config dir>/cardboard-vr/config.toml
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from disk, or return default if not found.
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_path()?)
}

/// Load and validate a config file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        info!(?path, "Loaded config");
        Ok(config)
    } else {
        info!("No config found, using defaults");
        Ok(AppConfig::default())
    }
}

/// Save config to disk.
pub fn save_config(config: &AppConfig) -> Result<()> {
    save_config_to(config, &config_path()?)
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    info!(?path, "Saved config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cardboard-config-{}-{name}", std::process::id()))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = scratch_file("missing.toml");
        let config = load_config_from(&path).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn saved_config_loads_back() {
        let path = scratch_file("saved.toml");
        let mut config = AppConfig::default();
        config.render.z_far = 250.0;
        config.device = config.device.with_interpupillary_distance(0.062);

        save_config_to(&config, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn invalid_file_is_rejected() {
        let path = scratch_file("invalid.toml");
        std::fs::write(&path, "[render]\nz_near = 5.0\nz_far = 1.0\n").unwrap();
        let result = load_config_from(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }
}
