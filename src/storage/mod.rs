pub mod file;
pub mod memory;

pub use file::{get_data_dir, FileStorage};
pub use memory::MemoryStorage;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Named-record persistence used by the history and news views.
///
/// Values are opaque strings; callers own their serialization format.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Returns true if a record was removed.
    fn delete(&self, key: &str) -> Result<bool>;
}

impl<S: Storage + ?Sized> Storage for &S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        (**self).delete(key)
    }
}

/// Read a JSON record, `None` if it was never written.
pub fn get_json<T: DeserializeOwned>(storage: &impl Storage, key: &str) -> Result<Option<T>> {
    match storage.get(key)? {
        Some(raw) => {
            let value = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse stored record '{}'", key))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

pub fn set_json<T: Serialize + ?Sized>(storage: &impl Storage, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize record '{}'", key))?;
    storage.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_helpers_roundtrip_through_port() {
        let storage = MemoryStorage::new();
        assert!(get_json::<Vec<u32>>(&storage, "numbers").unwrap().is_none());

        set_json(&storage, "numbers", &vec![1u32, 2, 3]).unwrap();
        let back: Vec<u32> = get_json(&storage, "numbers").unwrap().unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn test_get_json_reports_corrupt_record() {
        let storage = MemoryStorage::new();
        storage.set("numbers", "not json").unwrap();
        let err = get_json::<Vec<u32>>(&storage, "numbers").unwrap_err();
        assert!(err.to_string().contains("numbers"));
    }
}
