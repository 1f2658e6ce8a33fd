use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use super::Storage;

/// Get the default data directory (~/.local/share/campus-ai/ or platform equivalent)
pub fn get_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("campus-ai"))
        .unwrap_or_else(|| crate::config::get_config_dir().join("data"))
}

/// One JSON file per record inside a directory.
///
/// Writes go through atomic-write-file so a record is never left half written.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            anyhow::bail!("Invalid storage key '{}'", key);
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.record_path(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read record at {}", path.display()))
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.record_path(key)?;
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create data directory at {}", self.dir.display())
        })?;

        let mut file = AtomicWriteFile::open(&path)
            .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
        file.write_all(value.as_bytes())
            .with_context(|| format!("Failed to write record '{}'", key))?;
        file.commit()
            .with_context(|| format!("Failed to save record '{}'", key))?;

        tracing::debug!(key, path = %path.display(), "record saved");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let path = self.record_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to remove record at {}", path.display()))
            }
        }
    }
}
