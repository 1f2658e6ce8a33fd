use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::{get_config_path, Config};

const HEADER: &str = "\
# campus-ai configuration
#
# The Gemini API key is read from CAMPUSAI_API_KEY or GEMINI_API_KEY first;
# set ai.api_key here only if you prefer keeping it in this file.
#
# policies maps an institution slug (see `campus unis`) to one of
# exam-olevel, exam-olevel-secondary, exam-secondary-heavy.
";

/// Write a config file holding the defaults.
///
/// Refuses to replace an existing file unless `force` is set. Returns the
/// path that was written.
pub fn write_default_config(path: Option<PathBuf>, force: bool) -> Result<PathBuf> {
    let config_path = path.unwrap_or_else(get_config_path);

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let yaml = serde_saphyr::to_string(&Config::default())
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    // Create parent directories
    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    write_file(&config_path, &format!("{}\n{}", HEADER, yaml))?;
    tracing::info!(path = %config_path.display(), "config written");
    Ok(config_path)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write config to {}", path.display()))
}
