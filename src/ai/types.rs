use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// An image sent inline with a prompt, already base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Read an image or PDF from disk, inferring the MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mime_type = mime_for_path(path).with_context(|| {
            format!(
                "Unsupported attachment type for {} (expected png, jpg, jpeg, webp, heic or pdf)",
                path.display()
            )
        })?;
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read attachment at {}", path.display()))?;
        Ok(Self::from_bytes(mime_type, &bytes))
    }
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    Image(InlineImage),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl From<&ChatMessage> for Content {
    fn from(msg: &ChatMessage) -> Self {
        Content {
            role: msg.role,
            parts: vec![Part::Text(msg.text.clone())],
        }
    }
}

/// One call to a generative model.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub contents: Vec<Content>,
    pub system_instruction: Option<String>,
    /// When set, the model is asked for JSON matching this schema.
    pub response_schema: Option<serde_json::Value>,
    pub google_search: bool,
}

impl GenerateRequest {
    pub fn prompt(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            contents: vec![Content {
                role: Role::User,
                parts: vec![Part::Text(text.into())],
            }],
            system_instruction: None,
            response_schema: None,
            google_search: false,
        }
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_search(mut self) -> Self {
        self.google_search = true;
        self
    }

    pub fn with_system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroundingSource {
    pub uri: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    pub text: Option<String>,
    pub sources: Vec<GroundingSource>,
}

/// Merit cut-off estimate for one course, for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutoffEstimate {
    pub cutoff: String,
    pub subject_combination: String,
    pub recommendation: String,
    pub reliability: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversityProfile {
    pub bio: String,
    pub founded: String,
    pub motto: String,
    pub best_known_for: String,
    pub campus_vibe: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_image_encodes_base64() {
        let image = InlineImage::from_bytes("image/png", b"hello");
        assert_eq!(image.data, "aGVsbG8=");
        assert_eq!(image.mime_type, "image/png");
    }

    #[test]
    fn test_inline_image_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jamb-slip.JPG");
        fs::write(&path, b"\xff\xd8\xff").unwrap();

        let image = InlineImage::from_path(&path).unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data, "/9j/");
    }

    #[test]
    fn test_inline_image_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"text").unwrap();
        assert!(InlineImage::from_path(&path).is_err());
    }

    #[test]
    fn test_cutoff_estimate_camel_case() {
        let json = r#"{"cutoff":"280","subjectCombination":"English, Biology, Chemistry, Physics","recommendation":"Aim higher","reliability":"Medium"}"#;
        let estimate: CutoffEstimate = serde_json::from_str(json).unwrap();
        assert_eq!(estimate.cutoff, "280");
        assert!(estimate.subject_combination.contains("Biology"));
    }

    #[test]
    fn test_chat_message_role_serde() {
        let json = serde_json::to_string(&ChatMessage::model("hi")).unwrap();
        assert_eq!(json, r#"{"role":"model","text":"hi"}"#);
    }
}
