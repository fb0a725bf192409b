//! Chat page controller: one message out, one reply in, appended to a
//! transcript.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use tracing::{debug, info, warn};

use crate::api::HistoryEntry;
use crate::client::Backend;
use crate::error::{ChatmindError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Ai,
    System,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Local>,
    /// Seconds the backend took to answer; AI bubbles only.
    pub response_time: Option<f64>,
    pub is_error: bool,
}

impl ChatMessage {
    fn new(sender: Sender, content: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        ChatMessage {
            sender,
            content: content.into(),
            timestamp,
            response_time: None,
            is_error: false,
        }
    }
}

/// The status badge next to the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    Ready,
    Sending,
    Success,
    Error,
}

impl ApiStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ApiStatus::Ready => "Ready",
            ApiStatus::Sending => "Sending...",
            ApiStatus::Success => "Success",
            ApiStatus::Error => "Error",
        }
    }
}

/// Parse a backend history timestamp. The backend writes naive local time
/// (`2024-05-01T12:30:00.123456`); RFC 3339 is accepted too. Unparseable
/// stamps fall back to now.
pub fn parse_timestamp(raw: &str) -> DateTime<Local> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local);
    }
    raw.parse::<NaiveDateTime>()
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .unwrap_or_else(Local::now)
}

pub struct ChatController<B> {
    backend: B,
    transcript: Vec<ChatMessage>,
    status: ApiStatus,
    input_enabled: bool,
    typing: bool,
    last_response_time: Option<f64>,
}

impl<B: Backend> ChatController<B> {
    pub fn new(backend: B) -> Self {
        ChatController {
            backend,
            transcript: Vec::new(),
            status: ApiStatus::Ready,
            input_enabled: true,
            typing: false,
            last_response_time: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn status(&self) -> ApiStatus {
        self.status
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn last_response_time(&self) -> Option<f64> {
        self.last_response_time
    }

    pub fn push_system(&mut self, text: impl Into<String>) {
        self.transcript
            .push(ChatMessage::new(Sender::System, text, Local::now()));
    }

    /// Send one message and append the reply.
    ///
    /// Whitespace-only input is ignored and returns `None`. Otherwise the
    /// user bubble is appended before the request goes out, and the returned
    /// bubble is either the AI reply or an error bubble. Input is re-enabled
    /// and the typing indicator removed whatever the outcome.
    pub async fn send(&mut self, text: &str) -> Option<&ChatMessage> {
        let message = text.trim();
        if message.is_empty() {
            return None;
        }

        self.input_enabled = false;
        self.status = ApiStatus::Sending;
        self.transcript
            .push(ChatMessage::new(Sender::User, message, Local::now()));
        self.typing = true;
        debug!(len = message.len(), "sending chat message");

        let result = self.backend.chat(message).await;
        self.typing = false;

        let reply = match result {
            Ok(resp) if resp.success => {
                let mut bubble = ChatMessage::new(
                    Sender::Ai,
                    resp.response.unwrap_or_default(),
                    Local::now(),
                );
                bubble.response_time = resp.response_time;
                self.last_response_time = resp.response_time;
                self.status = ApiStatus::Success;
                bubble
            }
            Ok(resp) => {
                let cause = resp.error.unwrap_or_else(|| "Unknown error".to_string());
                self.error_bubble(&cause)
            }
            Err(ChatmindError::Timeout(detail)) => {
                warn!(%detail, "chat request timed out");
                self.error_bubble("Request timed out")
            }
            Err(ChatmindError::Application(cause)) => self.error_bubble(&cause),
            Err(e) => {
                warn!(error = %e, "chat request failed");
                self.error_bubble("Network error occurred")
            }
        };

        self.transcript.push(reply);
        self.input_enabled = true;
        self.transcript.last()
    }

    fn error_bubble(&mut self, cause: &str) -> ChatMessage {
        self.status = ApiStatus::Error;
        let mut bubble = ChatMessage::new(Sender::Ai, format!("Error: {cause}"), Local::now());
        bubble.is_error = true;
        bubble
    }

    /// Replace the transcript with the backend's history, oldest first.
    /// An empty history leaves the transcript alone. Returns the number of
    /// turns replayed.
    pub async fn load_history(&mut self) -> Result<usize> {
        let resp = self.backend.history().await.map_err(|e| {
            warn!(error = %e, "failed to load chat history");
            e
        })?;
        if !resp.success {
            return Err(ChatmindError::Application(
                resp.error.unwrap_or_else(|| "Failed to load chat history".to_string()),
            ));
        }
        if resp.history.is_empty() {
            return Ok(0);
        }

        self.transcript.clear();
        for entry in &resp.history {
            self.replay(entry);
        }
        info!(turns = resp.history.len(), "chat history loaded");
        Ok(resp.history.len())
    }

    fn replay(&mut self, entry: &HistoryEntry) {
        let at = parse_timestamp(&entry.timestamp);
        self.transcript
            .push(ChatMessage::new(Sender::User, entry.user_message.clone(), at));
        let mut ai = ChatMessage::new(Sender::Ai, entry.ai_response.clone(), at);
        ai.response_time = entry.response_time;
        self.transcript.push(ai);
    }

    /// Clear server-side history after `confirm` agrees. Returns whether the
    /// transcript was reset.
    pub async fn clear_history<F>(&mut self, confirm: F) -> Result<bool>
    where
        F: FnOnce() -> bool,
    {
        if !confirm() {
            return Ok(false);
        }
        let resp = self.backend.clear_history().await.map_err(|e| {
            warn!(error = %e, "clear-history request failed");
            ChatmindError::Transport("Failed to clear chat history".to_string())
        })?;
        if !resp.success {
            return Ok(false);
        }
        self.transcript.clear();
        self.status = ApiStatus::Ready;
        self.last_response_time = None;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_naive_timestamp() {
        let dt = parse_timestamp("2024-05-01T12:30:45.123456");
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (12, 30, 45));
    }

    #[test]
    fn test_parse_rfc3339_timestamp() {
        let dt = parse_timestamp("2024-05-01T12:30:45Z");
        let utc = dt.with_timezone(&chrono::Utc);
        assert_eq!((utc.hour(), utc.minute()), (12, 30));
    }

    #[test]
    fn test_parse_garbage_falls_back_to_now() {
        let before = Local::now();
        let dt = parse_timestamp("yesterday-ish");
        assert!(dt >= before);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(ApiStatus::Ready.label(), "Ready");
        assert_eq!(ApiStatus::Sending.label(), "Sending...");
    }
}
