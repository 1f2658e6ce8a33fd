use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;

use super::backend::ModelBackend;
use super::error::AiError;
use super::types::{Content, GenerateRequest, GenerateResponse, GroundingSource, Part, Role};
use crate::config::AiConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// rustls 0.23 needs a process-wide crypto provider before the first TLS client is built.
fn ensure_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        let _ = rustls::crypto::ring::default_provider().install_default();
    }
}

/// Google Gemini `generateContent` over REST.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    retries: usize,
}

impl GeminiClient {
    /// A missing key is not an error here: every call fails with
    /// [`AiError::MissingApiKey`] and callers fall back to local data.
    pub fn new(config: &AiConfig, api_key: Option<String>) -> Result<Self> {
        ensure_crypto_provider();
        let http = reqwest::Client::builder()
            .user_agent(concat!("campus-ai/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            retries: config.retries,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, model)
    }

    async fn send_once(&self, url: &str, key: &str, body: &WireRequest) -> Result<GenerateResponse, AiError> {
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AiError::Status {
                status: status.as_u16(),
                body: truncate_body(&text),
            });
        }

        let wire: WireResponse = serde_json::from_str(&text)?;
        Ok(wire.into_response())
    }
}

impl ModelBackend for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, AiError> {
        let Some(key) = self.api_key.as_deref() else {
            tracing::debug!("AI API key is missing; skipping request");
            return Err(AiError::MissingApiKey);
        };

        let url = self.url(&request.model);
        let body = WireRequest::from(&request);
        tracing::debug!(model = %request.model, search = request.google_search, "sending generateContent");

        let strategy = ExponentialBackoff::from_millis(200)
            .max_delay(std::time::Duration::from_secs(2))
            .take(self.retries);

        RetryIf::spawn(
            strategy,
            || self.send_once(&url, key, &body),
            |e: &AiError| {
                let retry = e.is_transient();
                if retry {
                    tracing::debug!(error = %e, "retrying AI request");
                }
                retry
            },
        )
        .await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 300;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX {
        trimmed.to_string()
    } else {
        format!("{}...", trimmed.chars().take(MAX).collect::<String>())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum WirePart {
    Text(String),
    InlineData(WireInlineData),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

impl From<&Content> for WireContent {
    fn from(content: &Content) -> Self {
        WireContent {
            role: Some(content.role),
            parts: content
                .parts
                .iter()
                .map(|part| match part {
                    Part::Text(text) => WirePart::Text(text.clone()),
                    Part::Image(image) => WirePart::InlineData(WireInlineData {
                        mime_type: image.mime_type.clone(),
                        data: image.data.clone(),
                    }),
                })
                .collect(),
        }
    }
}

impl From<&GenerateRequest> for WireRequest {
    fn from(request: &GenerateRequest) -> Self {
        WireRequest {
            contents: request.contents.iter().map(WireContent::from).collect(),
            system_instruction: request.system_instruction.as_ref().map(|text| WireContent {
                role: None,
                parts: vec![WirePart::Text(text.clone())],
            }),
            tools: if request.google_search {
                vec![serde_json::json!({ "googleSearch": {} })]
            } else {
                Vec::new()
            },
            generation_config: request.response_schema.as_ref().map(|schema| {
                WireGenerationConfig {
                    response_mime_type: "application/json",
                    response_schema: schema.clone(),
                }
            }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireResponseContent>,
    #[serde(default)]
    grounding_metadata: Option<WireGroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct WireResponseContent {
    #[serde(default)]
    parts: Vec<WireResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct WireResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<WireGroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct WireGroundingChunk {
    #[serde(default)]
    web: Option<WireWebSource>,
}

#[derive(Debug, Default, Deserialize)]
struct WireWebSource {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl WireResponse {
    fn into_response(self) -> GenerateResponse {
        let Some(candidate) = self.candidates.into_iter().next() else {
            return GenerateResponse::default();
        };

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text)
            .collect();

        let sources = candidate
            .grounding_metadata
            .map(|m| m.grounding_chunks)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|chunk| chunk.web)
            .filter_map(|web| {
                web.uri.map(|uri| GroundingSource {
                    uri,
                    title: web.title,
                })
            })
            .collect();

        GenerateResponse {
            text: if text.trim().is_empty() { None } else { Some(text) },
            sources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::types::InlineImage;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn config(endpoint: &str) -> AiConfig {
        AiConfig {
            endpoint: endpoint.to_string(),
            ..AiConfig::default()
        }
    }

    #[test]
    fn test_wire_request_shape() {
        let mut request = GenerateRequest::prompt("gemini-3-flash-preview", "List courses")
            .with_system("Be brief")
            .with_search()
            .with_schema(serde_json::json!({ "type": "ARRAY", "items": { "type": "STRING" } }));
        request.contents[0]
            .parts
            .push(Part::Image(InlineImage::from_bytes("image/png", b"hi")));

        let json = serde_json::to_value(WireRequest::from(&request)).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "List courses");
        assert_eq!(json["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(json["contents"][0]["parts"][1]["inlineData"]["data"], "aGk=");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be brief");
        assert!(json["systemInstruction"].get("role").is_none());
        assert!(json["tools"][0].get("googleSearch").is_some());
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["generationConfig"]["responseSchema"]["type"], "ARRAY");
    }

    #[test]
    fn test_wire_request_omits_optional_fields() {
        let request = GenerateRequest::prompt("m", "hello");
        let json = serde_json::to_value(WireRequest::from(&request)).unwrap();
        assert!(json.get("systemInstruction").is_none());
        assert!(json.get("tools").is_none());
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_response_text_and_sources() {
        let raw = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "Cut-off is "},
                    {"text": "280."}
                ]},
                "groundingMetadata": {"groundingChunks": [
                    {"web": {"uri": "https://unilag.edu.ng/news", "title": "UNILAG"}},
                    {"retrievedContext": {}}
                ]}
            }]
        }"#;
        let wire: WireResponse = serde_json::from_str(raw).unwrap();
        let response = wire.into_response();
        assert_eq!(response.text.as_deref(), Some("Cut-off is 280."));
        assert_eq!(response.sources.len(), 1);
        assert_eq!(response.sources[0].title.as_deref(), Some("UNILAG"));
    }

    #[test]
    fn test_response_without_candidates() {
        let wire: WireResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(wire.into_response(), GenerateResponse::default());
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("  short  "), "short");
        let long = "x".repeat(400);
        assert_eq!(truncate_body(&long).len(), 303);
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let client = GeminiClient::new(&config("http://127.0.0.1:9"), Some("  ".to_string())).unwrap();
        assert!(!client.has_api_key());
        let err = client
            .generate(GenerateRequest::prompt("m", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::MissingApiKey));
    }

    /// Accept one connection, capture the raw request and answer with `status` and `body`.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            let reply = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).to_string()
        });
        (format!("http://{}/v1beta", addr), handle)
    }

    #[tokio::test]
    async fn test_generate_against_local_server() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello from the model"}]}}]}"#,
        )
        .await;
        let client = GeminiClient::new(&config(&endpoint), Some("secret-key".to_string())).unwrap();

        let response = client
            .generate(GenerateRequest::prompt("gemini-3-flash-preview", "hi"))
            .await
            .unwrap();
        assert_eq!(response.text.as_deref(), Some("Hello from the model"));

        let raw_request = server.await.unwrap().to_lowercase();
        assert!(raw_request.starts_with("post /v1beta/models/gemini-3-flash-preview:generatecontent"));
        assert!(raw_request.contains("x-goog-api-key: secret-key"));
    }

    #[tokio::test]
    async fn test_generate_reports_error_status() {
        let (endpoint, _server) =
            serve_once("403 Forbidden", r#"{"error":{"message":"API key not valid"}}"#).await;
        let client = GeminiClient::new(&config(&endpoint), Some("bad".to_string())).unwrap();

        let err = client
            .generate(GenerateRequest::prompt("m", "hi"))
            .await
            .unwrap_err();
        match err {
            AiError::Status { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("API key not valid"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
