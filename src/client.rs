//! HTTP client for the ChatMind backend.
//!
//! Controllers talk to the backend only through [`Backend`], so they can be
//! driven by [`HttpBackend`] in the binary and by an in-memory double in
//! tests.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::api::*;
use crate::config::ClientConfig;
use crate::error::{ChatmindError, Result};

/// The endpoints the dashboard consumes.
///
/// Transport failures surface as [`ChatmindError::Timeout`] or
/// [`ChatmindError::Transport`]; a non-2xx reply whose body carries an
/// `error` field surfaces as [`ChatmindError::Application`] with that text.
/// A 2xx reply is returned as-is, including `success: false` bodies.
#[allow(async_fn_in_trait)]
pub trait Backend {
    async fn models(&self) -> Result<ModelsResponse>;
    async fn set_model(&self, model: &str) -> Result<SetModelResponse>;
    async fn history(&self) -> Result<HistoryResponse>;
    async fn chat(&self, message: &str) -> Result<ChatResponse>;
    async fn clear_history(&self) -> Result<ClearHistoryResponse>;
    /// Returns the raw document so it can be exported verbatim.
    async fn run_tests(&self, request: &TestBatchRequest) -> Result<serde_json::Value>;
}

impl<B: Backend> Backend for &B {
    async fn models(&self) -> Result<ModelsResponse> {
        (**self).models().await
    }
    async fn set_model(&self, model: &str) -> Result<SetModelResponse> {
        (**self).set_model(model).await
    }
    async fn history(&self) -> Result<HistoryResponse> {
        (**self).history().await
    }
    async fn chat(&self, message: &str) -> Result<ChatResponse> {
        (**self).chat(message).await
    }
    async fn clear_history(&self) -> Result<ClearHistoryResponse> {
        (**self).clear_history().await
    }
    async fn run_tests(&self, request: &TestBatchRequest) -> Result<serde_json::Value> {
        (**self).run_tests(request).await
    }
}

/// [`Backend`] over HTTP.
///
/// Chat history lives in the backend's session cookie, so the underlying
/// client keeps a cookie store for the lifetime of this value.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    chat_timeout: Duration,
    batch_timeout: Duration,
    request_timeout: Duration,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ChatmindError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(HttpBackend {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_timeout: config.chat_timeout(),
            batch_timeout: config.batch_timeout(),
            request_timeout: config.request_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        url: &str,
        timeout: Duration,
    ) -> Result<T> {
        debug!(%url, timeout_secs = timeout.as_secs(), "sending request");
        let resp = req
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(url, e))?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| classify(url, e))?;

        if !status.is_success() {
            if let Ok(ErrorBody { error: Some(message) }) = serde_json::from_slice::<ErrorBody>(&bytes) {
                warn!(%url, status = status.as_u16(), %message, "backend returned error body");
                return Err(ChatmindError::Application(message));
            }
            warn!(%url, status = status.as_u16(), "backend returned non-2xx without error body");
            return Err(ChatmindError::Transport(format!(
                "HTTP {} from {url}",
                status.as_u16()
            )));
        }

        serde_json::from_slice::<T>(&bytes)
            .map_err(|e| ChatmindError::Transport(format!("invalid JSON from {url}: {e}")))
    }
}

fn classify(url: &str, err: reqwest::Error) -> ChatmindError {
    if err.is_timeout() {
        ChatmindError::Timeout(format!("{url} timed out"))
    } else {
        ChatmindError::Transport(format!("request to {url} failed: {err}"))
    }
}

impl Backend for HttpBackend {
    async fn models(&self) -> Result<ModelsResponse> {
        let url = self.url("/api/models");
        self.send_json(self.client.get(&url), &url, self.request_timeout).await
    }

    async fn set_model(&self, model: &str) -> Result<SetModelResponse> {
        let url = self.url("/api/set_model");
        let body = SetModelRequest { model: model.to_string() };
        self.send_json(self.client.post(&url).json(&body), &url, self.request_timeout)
            .await
    }

    async fn history(&self) -> Result<HistoryResponse> {
        let url = self.url("/api/history");
        self.send_json(self.client.get(&url), &url, self.request_timeout).await
    }

    async fn chat(&self, message: &str) -> Result<ChatResponse> {
        let url = self.url("/api/chat");
        let body = ChatRequest { message: message.to_string() };
        self.send_json(self.client.post(&url).json(&body), &url, self.chat_timeout)
            .await
    }

    async fn clear_history(&self) -> Result<ClearHistoryResponse> {
        let url = self.url("/api/clear-history");
        self.send_json(self.client.post(&url), &url, self.request_timeout).await
    }

    async fn run_tests(&self, request: &TestBatchRequest) -> Result<serde_json::Value> {
        let url = self.url("/api/test");
        self.send_json(self.client.post(&url).json(request), &url, self.batch_timeout)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ClientConfig::default().with_base_url("http://127.0.0.1:5000/");
        let backend = HttpBackend::new(&config).expect("build");
        assert_eq!(backend.base_url(), "http://127.0.0.1:5000");
        assert_eq!(backend.url("/api/chat"), "http://127.0.0.1:5000/api/chat");
    }

    #[test]
    fn test_timeouts_follow_config() {
        let backend = HttpBackend::new(&ClientConfig::default()).expect("build");
        assert_eq!(backend.chat_timeout, Duration::from_secs(30));
        assert_eq!(backend.batch_timeout, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Port 9 (discard) is essentially never listening on loopback.
        let config = ClientConfig::default().with_base_url("http://127.0.0.1:9");
        let backend = HttpBackend::new(&config).expect("build");
        let err = backend.models().await.unwrap_err();
        assert!(matches!(err, ChatmindError::Transport(_) | ChatmindError::Timeout(_)));
    }
}
