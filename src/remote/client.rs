//! HTTP client for the remote thread-digest service.

use std::collections::BTreeMap;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::DigestBackend;
use crate::config::RemoteConfig;
use crate::error::RemoteError;
use crate::model::{Digest, Thread};

const BACKEND_NAME: &str = "remote";

/// Talks to `{base_url}/health` and `{base_url}/compress/thread`.
pub struct RemoteCompressor {
    config: RemoteConfig,
    client: reqwest::Client,
}

impl RemoteCompressor {
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url)
    }

    fn map_send_error(&self, e: reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Timeout {
                backend: BACKEND_NAME.into(),
                timeout: self.config.timeout,
            }
        } else {
            RemoteError::RequestFailed {
                backend: BACKEND_NAME.into(),
                reason: e.to_string(),
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ThreadPayload<'a> {
    thread_id: &'a str,
    subject: &'a str,
    message_count: usize,
    messages: Vec<MessagePayload<'a>>,
}

#[derive(Debug, Serialize)]
struct MessagePayload<'a> {
    id: &'a str,
    sender: &'a str,
    timestamp: String,
    content: &'a str,
}

impl<'a> From<&'a Thread> for ThreadPayload<'a> {
    fn from(thread: &'a Thread) -> Self {
        Self {
            thread_id: &thread.thread_id,
            subject: &thread.subject,
            message_count: thread.message_count(),
            messages: thread
                .messages()
                .iter()
                .map(|m| MessagePayload {
                    id: &m.id,
                    sender: &m.sender.email,
                    timestamp: m.received_at.to_rfc3339(),
                    content: &m.body_text,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CompressResponse {
    summary: String,
    decisions: Vec<String>,
    questions: Vec<String>,
    action_items: BTreeMap<String, Vec<String>>,
    original_tokens: usize,
    compressed_tokens: usize,
    compression_ratio: f64,
    error: Option<String>,
    fallback: bool,
}

impl CompressResponse {
    /// Remote digests carry no timeline.
    fn into_digest(self) -> Digest {
        Digest {
            summary: self.summary,
            key_decisions: self.decisions,
            unresolved_questions: self.questions,
            action_items_by_person: self.action_items,
            timeline: Vec::new(),
            original_token_count: self.original_tokens,
            compressed_token_count: self.compressed_tokens,
            compression_ratio: self.compression_ratio,
        }
    }
}

#[async_trait]
impl DigestBackend for RemoteCompressor {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    async fn healthy(&self) -> bool {
        let result = self
            .client
            .get(self.url("health"))
            .bearer_auth(self.config.api_key.expose_secret())
            .timeout(self.config.health_timeout)
            .send()
            .await;

        match result {
            Ok(resp) => resp.status() == reqwest::StatusCode::OK,
            Err(e) => {
                debug!(error = %e, "Remote health check failed");
                false
            }
        }
    }

    async fn digest(&self, thread: &Thread) -> Result<Digest, RemoteError> {
        let payload = ThreadPayload::from(thread);

        let resp = self
            .client
            .post(self.url("compress/thread"))
            .bearer_auth(self.config.api_key.expose_secret())
            .timeout(self.config.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::RequestFailed {
                backend: BACKEND_NAME.into(),
                reason: format!("HTTP {status}: {body}"),
            });
        }

        let body: CompressResponse = resp.json().await.map_err(|e| RemoteError::InvalidResponse {
            backend: BACKEND_NAME.into(),
            reason: e.to_string(),
        })?;

        if body.fallback || body.error.is_some() {
            return Err(RemoteError::Fallback {
                backend: BACKEND_NAME.into(),
                reason: body.error.unwrap_or_else(|| "fallback requested".into()),
            });
        }

        debug!(
            thread_id = %thread.thread_id,
            ratio = body.compression_ratio,
            "Remote digest received"
        );
        Ok(body.into_digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::Json;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use chrono::Utc;
    use secrecy::SecretString;

    use crate::model::{Address, Message};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_for(base_url: &str) -> RemoteCompressor {
        RemoteCompressor::new(RemoteConfig::new(base_url, SecretString::from("test-key")))
    }

    fn make_thread() -> Thread {
        let msg = Message::new(
            "m-1",
            "t-1",
            "Launch",
            Address::new("alice@example.com"),
            "We decided to launch Monday.",
            Utc::now(),
        );
        Thread::new("t-1", "Launch", vec![], vec![msg])
    }

    #[tokio::test]
    async fn health_ok_and_unavailable() {
        let up = serve(Router::new().route("/health", get(|| async { "ok" }))).await;
        assert!(client_for(&up).healthy().await);

        let down = serve(Router::new().route(
            "/health",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        ))
        .await;
        assert!(!client_for(&down).healthy().await);
    }

    #[tokio::test]
    async fn health_false_when_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        assert!(!client_for(&format!("http://{addr}")).healthy().await);
    }

    #[tokio::test]
    async fn digest_sends_thread_and_maps_response() {
        async fn compress(
            headers: HeaderMap,
            Json(body): Json<serde_json::Value>,
        ) -> (StatusCode, Json<serde_json::Value>) {
            if headers.get("authorization").and_then(|v| v.to_str().ok())
                != Some("Bearer test-key")
            {
                return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({})));
            }
            let sender = body["messages"][0]["sender"]
                .as_str()
                .unwrap_or("?")
                .to_string();
            let mut action_items = serde_json::Map::new();
            action_items.insert(sender, serde_json::json!(["send invite"]));
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "summary": format!("{} message(s)", body["message_count"]),
                    "decisions": ["launch Monday"],
                    "questions": [],
                    "action_items": action_items,
                    "original_tokens": 40,
                    "compressed_tokens": 10,
                    "compression_ratio": 75.0
                })),
            )
        }
        let base = serve(Router::new().route("/compress/thread", post(compress))).await;

        let digest = client_for(&base).digest(&make_thread()).await.unwrap();

        assert_eq!(digest.summary, "1 message(s)");
        assert_eq!(digest.key_decisions, vec!["launch Monday"]);
        assert_eq!(
            digest.action_items_by_person["alice@example.com"],
            vec!["send invite"]
        );
        assert_eq!(digest.compression_ratio, 75.0);
        assert!(digest.timeline.is_empty());
    }

    #[tokio::test]
    async fn fallback_body_is_an_error() {
        let base = serve(Router::new().route(
            "/compress/thread",
            post(|| async { Json(serde_json::json!({"error": "quota", "fallback": true})) }),
        ))
        .await;

        let err = client_for(&base).digest(&make_thread()).await.unwrap_err();
        assert!(matches!(err, RemoteError::Fallback { ref reason, .. } if reason == "quota"));
    }

    #[tokio::test]
    async fn http_error_status_is_request_failed() {
        let base = serve(Router::new().route(
            "/compress/thread",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        ))
        .await;

        let err = client_for(&base).digest(&make_thread()).await.unwrap_err();
        match err {
            RemoteError::RequestFailed { reason, .. } => {
                assert!(reason.contains("500"));
                assert!(reason.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn non_json_body_is_invalid_response() {
        let base = serve(Router::new().route(
            "/compress/thread",
            post(|| async { "not json" }),
        ))
        .await;

        let err = client_for(&base).digest(&make_thread()).await.unwrap_err();
        assert!(matches!(err, RemoteError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let base = serve(Router::new().route(
            "/compress/thread",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(serde_json::json!({}))
            }),
        ))
        .await;

        let mut config = RemoteConfig::new(&base, SecretString::from("test-key"));
        config.timeout = Duration::from_millis(100);
        let err = RemoteCompressor::new(config)
            .digest(&make_thread())
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Timeout { .. }));
    }
}
