//! JSON-over-HTTP chat endpoint.
//!
//! Request: `POST <url>` with body `{"message": ..., "session_id": ...}`.
//! Response: a JSON object whose `response` string is the reply. A success
//! status with a missing, empty or non-string `response` yields the fallback
//! reply rather than an error.

use async_trait::async_trait;
use chatline_application::ports::chat_endpoint::{ChatEndpoint, TransportError};
use chatline_domain::SessionId;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Reply used when the service answers without a usable `response`
pub const DEFAULT_FALLBACK_REPLY: &str = "Sorry, I could not process your request.";

const USER_AGENT: &str = concat!("chatline/", env!("CARGO_PKG_VERSION"));

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    session_id: &'a str,
}

/// [`ChatEndpoint`] backed by a shared [`reqwest::Client`]
pub struct HttpChatEndpoint {
    client: reqwest::Client,
    url: String,
    fallback_reply: String,
}

impl HttpChatEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_string(),
        }
    }

    pub fn with_fallback_reply(mut self, reply: impl Into<String>) -> Self {
        self.fallback_reply = reply.into();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Pull the reply text out of a decoded response body
pub fn extract_reply(body: &Value, fallback: &str) -> String {
    match body.get("response").and_then(Value::as_str) {
        Some(reply) if !reply.is_empty() => reply.to_string(),
        _ => fallback.to_string(),
    }
}

#[async_trait]
impl ChatEndpoint for HttpChatEndpoint {
    async fn send(&self, message: &str, session_id: &SessionId) -> Result<String, TransportError> {
        debug!("POST {} ({} chars)", self.url, message.chars().count());

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&ChatRequest {
                message,
                session_id: session_id.as_str(),
            })
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let value: Value =
            serde_json::from_slice(&body).map_err(|e| TransportError::Decode(e.to_string()))?;

        Ok(extract_reply(&value, &self.fallback_reply))
    }
}
