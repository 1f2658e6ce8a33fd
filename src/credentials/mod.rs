/// Environment variable checked first for the Gemini API key
pub const ENV_KEY_VAR: &str = "CAMPUSAI_API_KEY";

/// Fallback environment variable used by Google's own tooling
pub const ENV_GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Env(&'static str),
    ConfigFile,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "undefined")
        .map(str::to_string)
}

/// Check an environment variable for an API key.
/// Returns Some(key) if the variable is set and non-empty, None otherwise.
fn get_key_from_env(var: &str) -> Option<String> {
    non_blank(std::env::var(var).ok().as_deref())
}

/// First usable key from the two environment variables and the config file,
/// in that order.
pub fn pick_api_key(
    campus_env: Option<&str>,
    gemini_env: Option<&str>,
    config_key: Option<&str>,
) -> Option<(String, KeySource)> {
    non_blank(campus_env)
        .map(|k| (k, KeySource::Env(ENV_KEY_VAR)))
        .or_else(|| non_blank(gemini_env).map(|k| (k, KeySource::Env(ENV_GEMINI_KEY_VAR))))
        .or_else(|| non_blank(config_key).map(|k| (k, KeySource::ConfigFile)))
}

/// Resolve the API key from the environment, falling back to `ai.api_key`.
pub fn resolve_api_key(config_key: Option<&str>) -> Option<String> {
    let picked = pick_api_key(
        get_key_from_env(ENV_KEY_VAR).as_deref(),
        get_key_from_env(ENV_GEMINI_KEY_VAR).as_deref(),
        config_key,
    );
    match picked {
        Some((key, source)) => {
            tracing::debug!(?source, "using Gemini API key");
            Some(key)
        }
        None => {
            tracing::debug!("no Gemini API key configured");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_precedence() {
        let (key, source) = pick_api_key(Some("a"), Some("b"), Some("c")).unwrap();
        assert_eq!((key.as_str(), source), ("a", KeySource::Env(ENV_KEY_VAR)));

        let (key, source) = pick_api_key(None, Some(" b "), Some("c")).unwrap();
        assert_eq!((key.as_str(), source), ("b", KeySource::Env(ENV_GEMINI_KEY_VAR)));

        let (key, source) = pick_api_key(Some(""), None, Some("c")).unwrap();
        assert_eq!((key.as_str(), source), ("c", KeySource::ConfigFile));
    }

    #[test]
    fn test_blank_and_placeholder_keys_ignored() {
        assert_eq!(pick_api_key(Some("  "), Some("undefined"), None), None);
        assert_eq!(pick_api_key(None, None, Some("")), None);
    }
}
