mod init;
mod schema;
mod validation;

pub use init::write_default_config;
pub use schema::{
    AiConfig, Config, StorageConfig, DEFAULT_CHAT_MODEL, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT,
    DEFAULT_VISION_MODEL,
};
pub use validation::validate_config;

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Get the config directory path (~/.config/campus-ai/)
pub fn get_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("campus-ai")
}

/// Get the default config file path (~/.config/campus-ai/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Load configuration from a YAML file
///
/// A missing file at the default location yields the default configuration;
/// a missing file that was named explicitly is an error.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", config_path.display());
        }
        tracing::debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    if config_content.trim().is_empty() {
        return Ok(Config::default());
    }

    let config: Config = serde_saphyr::from_str(&config_content).with_context(|| {
        format!("Failed to parse config: invalid YAML in {}", config_path.display())
    })?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(dir.path().join("nope.yaml"))).is_err());
    }

    #[test]
    fn test_load_and_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        fs::write(&path, "").unwrap();
        assert_eq!(load_config(Some(path.clone())).unwrap(), Config::default());

        fs::write(&path, "ai:\n  retries: 3\n").unwrap();
        assert_eq!(load_config(Some(path.clone())).unwrap().ai.retries, 3);

        fs::write(&path, "ai: [not, a, map]\n").unwrap();
        assert!(load_config(Some(path)).is_err());
    }
}
