use super::Config;
use crate::institutions;

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    match config.ai.timeout_duration() {
        Err(e) => errors.push(format!("ai.timeout: {:#}", e)),
        Ok(d) if d.is_zero() => errors.push("ai.timeout: must be greater than zero".to_string()),
        Ok(_) => {}
    }

    let endpoint = config.ai.endpoint.trim();
    if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
        errors.push(format!(
            "ai.endpoint: '{}' must be an http(s) URL",
            config.ai.endpoint
        ));
    }

    if config.ai.chat_model.trim().is_empty() {
        errors.push("ai.chat_model: must not be empty".to_string());
    }
    if config.ai.vision_model.trim().is_empty() {
        errors.push("ai.vision_model: must not be empty".to_string());
    }

    let mut slugs: Vec<&String> = config.policies.keys().collect();
    slugs.sort();
    for slug in slugs {
        if institutions::find_by_slug(slug).is_none() {
            errors.push(format!("policies.{}: unknown institution slug", slug));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
