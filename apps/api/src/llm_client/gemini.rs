use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{classify_status, LlmClient, LlmError};
use crate::config::LlmConfig;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
    status: Option<String>,
    #[serde(default)]
    details: Vec<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    reason: Option<String>,
}

/// Google Generative Language API (`models/{model}:generateContent`).
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

impl GeminiClient {
    pub fn new(client: Client, config: &LlmConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            max_output_tokens: config.max_tokens,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn invoke(&self, prompt: &str) -> Result<String, LlmError> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                top_p: self.top_p,
                max_output_tokens: self.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(error_from_response(status, text));
        }

        let reply = reply_text(&text)?;
        debug!(
            "Gemini call succeeded: model={}, reply_chars={}",
            self.model,
            reply.len()
        );
        Ok(reply)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Gemini rejects a bad key with 400 `INVALID_ARGUMENT` + reason `API_KEY_INVALID`
/// rather than 401, so the status code alone cannot identify auth failures.
fn error_from_response(status: StatusCode, body: String) -> LlmError {
    let error = match serde_json::from_str::<GeminiError>(&body) {
        Ok(parsed) => parsed.error,
        Err(_) => return classify_status(status, body),
    };

    let rejected_credentials = matches!(
        error.status.as_deref(),
        Some("UNAUTHENTICATED" | "PERMISSION_DENIED")
    ) || error
        .details
        .iter()
        .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"));

    if rejected_credentials {
        return LlmError::Auth {
            status: status.as_u16(),
            message: error.message,
        };
    }
    classify_status(status, error.message)
}

/// Joins the text parts of the first candidate.
fn reply_text(body: &str) -> Result<String, LlmError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::Transport(format!("malformed Gemini response: {e}")))?;

    let candidate = parsed
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Transport("Gemini returned no candidates".into()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
        return Err(LlmError::Transport(format!(
            "Gemini returned empty content (finish reason: {reason})"
        )));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use axum::{http::HeaderMap, routing::post, Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::config::LlmProvider;
    use crate::llm_client::stub::{serve, stub_config};

    const INVALID_KEY_BODY: &str = r#"{
      "error": {
        "code": 400,
        "message": "API key not valid. Please pass a valid API key.",
        "status": "INVALID_ARGUMENT",
        "details": [
          {
            "@type": "type.googleapis.com/google.rpc.ErrorInfo",
            "reason": "API_KEY_INVALID",
            "domain": "googleapis.com",
            "metadata": {"service": "generativelanguage.googleapis.com"}
          }
        ]
      }
    }"#;

    fn client_for(base_url: String) -> GeminiClient {
        GeminiClient::new(Client::new(), &stub_config(LlmProvider::Gemini, base_url))
    }

    #[tokio::test]
    async fn test_invoke_maps_invalid_key_to_auth() {
        let router = Router::new().route(
            "/v1beta/models/:model",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    [("content-type", "application/json")],
                    INVALID_KEY_BODY,
                )
            }),
        );
        let client = client_for(serve(router).await);

        let err = client.invoke("hello").await.unwrap_err();
        assert!(matches!(
            err,
            LlmError::Auth { status: 400, ref message } if message.starts_with("API key not valid")
        ));
    }

    #[tokio::test]
    async fn test_invoke_sends_key_and_returns_reply() {
        let router = Router::new().route(
            "/v1beta/models/:model",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let key = headers
                    .get("x-goog-api-key")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let prompt = body["contents"][0]["parts"][0]["text"].clone();
                Json(json!({
                    "candidates": [{
                        "content": {"parts": [{"text": format!("{key}:{}", prompt.as_str().unwrap_or_default())}]},
                        "finishReason": "STOP"
                    }]
                }))
            }),
        );
        let client = client_for(serve(router).await);

        assert_eq!(client.invoke("hello").await.unwrap(), "stub-key:hello");
    }

    #[test]
    fn test_error_statuses_classify_credentials() {
        let unauthenticated =
            r#"{"error":{"code":401,"message":"no auth","status":"UNAUTHENTICATED"}}"#;
        assert!(matches!(
            error_from_response(StatusCode::UNAUTHORIZED, unauthenticated.into()),
            LlmError::Auth { status: 401, .. }
        ));

        let denied = r#"{"error":{"code":403,"message":"denied","status":"PERMISSION_DENIED"}}"#;
        assert!(matches!(
            error_from_response(StatusCode::FORBIDDEN, denied.into()),
            LlmError::Auth { status: 403, .. }
        ));

        let quota = r#"{"error":{"code":429,"message":"quota","status":"RESOURCE_EXHAUSTED"}}"#;
        assert!(matches!(
            error_from_response(StatusCode::TOO_MANY_REQUESTS, quota.into()),
            LlmError::RateLimited(m) if m == "quota"
        ));
    }

    #[test]
    fn test_other_bad_request_stays_transport() {
        let too_long = r#"{"error":{"code":400,"message":"prompt too long","status":"INVALID_ARGUMENT"}}"#;
        assert!(matches!(
            error_from_response(StatusCode::BAD_REQUEST, too_long.into()),
            LlmError::Transport(ref m) if m.contains("prompt too long")
        ));
        assert!(matches!(
            error_from_response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>".into()),
            LlmError::Transport(ref m) if m.contains("502")
        ));
    }

    #[test]
    fn test_reply_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"JD Match\": "},{"text":"\"80%\"}"}],"role":"model"},"finishReason":"STOP"}]}"#;
        assert_eq!(reply_text(body).unwrap(), r#"{"JD Match": "80%"}"#);
    }

    #[test]
    fn test_reply_text_blocked_candidate() {
        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        let err = reply_text(body).unwrap_err();
        assert!(matches!(err, LlmError::Transport(ref m) if m.contains("SAFETY")));
    }

    #[test]
    fn test_reply_text_no_candidates() {
        assert!(matches!(
            reply_text(r#"{"promptFeedback":{"blockReason":"OTHER"}}"#),
            Err(LlmError::Transport(_))
        ));
    }

    #[test]
    fn test_request_serializes_generation_config() {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: "hello" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.5,
                top_p: 1.0,
                max_output_tokens: 512,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["topP"], 1.0);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 512);
    }
}
