//! Gemini `generateContent` client

use super::TextGenerator;
use crate::config::GenerationConfig;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Client for the Gemini REST API
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(config: &GenerationConfig) -> Result<Self, AppError> {
        // The call deadline is enforced by `generate_with_timeout`
        let client = Client::builder()
            .connect_timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ServiceError("not configured".to_string()))?;

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        debug!("Calling {} ({} char prompt)", self.model, prompt.len());

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(self.timeout_secs)
                } else {
                    AppError::ServiceError(format!("HTTP request failed: {}", e.without_url()))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::ServiceError(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::ServiceError(error_message(status.as_u16(), &text)));
        }

        parse_response(&text)
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Concatenated text of the first candidate
fn parse_response(body: &str) -> Result<String, AppError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| AppError::ServiceError(format!("Failed to parse response: {}", e)))?;

    if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(AppError::ServiceError(format!("prompt blocked: {}", reason)));
    }

    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AppError::ServiceError("empty response".to_string()));
    }
    Ok(text)
}

fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => format!("{} {}", status, parsed.error.message),
        Err(_) => format!("{} {}", status, body.chars().take(200).collect::<String>()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_includes_model() {
        let client = GeminiClient::new(&GenerationConfig::default()).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert!(!client.is_configured());
    }

    #[tokio::test]
    async fn test_missing_key_is_service_error() {
        let client = GeminiClient::new(&GenerationConfig::default()).unwrap();
        let err = client.generate("hi").await.unwrap_err();
        assert!(matches!(err, AppError::ServiceError(ref m) if m == "not configured"));
    }

    #[test]
    fn test_parse_response_joins_parts() {
        let body = r####"{"candidates":[{"content":{"parts":[{"text":"### 1. "},{"text":"문제 배경"}],"role":"model"}}]}"####;
        assert_eq!(parse_response(body).unwrap(), "### 1. 문제 배경");
    }

    #[test]
    fn test_parse_response_rejects_blocked_or_empty() {
        let blocked = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert!(matches!(parse_response(blocked), Err(AppError::ServiceError(_))));
        assert!(matches!(parse_response(r#"{"candidates":[]}"#), Err(AppError::ServiceError(_))));
        assert!(matches!(parse_response("not json"), Err(AppError::ServiceError(_))));
    }

    #[test]
    fn test_error_message_prefers_api_detail() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(400, body), "400 API key not valid");
        assert_eq!(error_message(502, "bad gateway"), "502 bad gateway");
    }

    #[tokio::test]
    async fn test_unresponsive_service_times_out() {
        use crate::generation::generate_with_timeout;
        use tokio::net::TcpListener;

        // Accepts connections and never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = GenerationConfig {
            api_key: Some("key".to_string()),
            base_url: format!("http://{}", addr),
            timeout_secs: 1,
            ..GenerationConfig::default()
        };
        let client = GeminiClient::new(&config).unwrap();

        for _ in 0..3 {
            let err = generate_with_timeout(&client, "prompt", config.timeout())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Timeout(1)), "got {:?}", err);
        }
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = GenerationConfig {
            api_key: Some("secret".to_string()),
            ..GenerationConfig::default()
        };
        let client = GeminiClient::new(&config).unwrap();
        assert!(!format!("{:?}", client).contains("secret"));
    }
}
