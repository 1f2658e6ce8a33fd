use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::scoring::Policy;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_VISION_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_TIMEOUT: &str = "30s";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub ai: AiConfig,
    /// Institution slug to weighting policy, layered over the built-in table.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub policies: HashMap<String, Policy>,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub endpoint: String,
    pub chat_model: String,
    pub vision_model: String,
    /// Per-request timeout, e.g. "30s" or "1m 30s".
    pub timeout: String,
    pub retries: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT.to_string(),
            retries: 0,
        }
    }
}

impl AiConfig {
    pub fn timeout_duration(&self) -> Result<Duration> {
        humantime::parse_duration(self.timeout.trim())
            .with_context(|| format!("Invalid ai.timeout '{}'", self.timeout))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_default() {
        let config: Config = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.ai.timeout_duration().unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
ai:
  timeout: 1m 30s
  retries: 2
policies:
  unilag: exam-secondary-heavy
storage:
  data_dir: /tmp/campus
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.ai.chat_model, DEFAULT_CHAT_MODEL);
        assert_eq!(config.ai.retries, 2);
        assert_eq!(config.ai.timeout_duration().unwrap(), Duration::from_secs(90));
        assert_eq!(config.policies["unilag"], Policy::ExamSecondaryHeavy);
        assert_eq!(config.storage.data_dir, Some(PathBuf::from("/tmp/campus")));
    }

    #[test]
    fn test_bad_timeout() {
        let ai = AiConfig {
            timeout: "soon".to_string(),
            ..AiConfig::default()
        };
        assert!(ai.timeout_duration().is_err());
    }
}
