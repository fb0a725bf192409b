//! Model selector shared by the chat and batch pages.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::api::ModelInfo;
use crate::client::Backend;
use crate::error::{ChatmindError, Result};

const SWITCH_PREFIX: &str = "Model switched to ";

/// A transient notice emitted after a successful switch.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Server message, e.g. "Model switched to GPT-4o Mini".
    pub message: String,
    /// The display name pulled out of `message`.
    pub model_name: String,
}

impl Notification {
    fn from_message(message: String) -> Self {
        let model_name = message
            .strip_prefix(SWITCH_PREFIX)
            .unwrap_or(&message)
            .to_string();
        Notification { message, model_name }
    }

    /// The line the chat transcript shows as a system bubble.
    pub fn system_line(&self) -> String {
        format!("✓ Switched to {}", self.model_name)
    }
}

/// What the selector currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveModel {
    pub id: String,
    pub name: String,
    pub provider: String,
}

#[derive(Debug, Clone, Default)]
pub struct ModelSelector {
    registry: BTreeMap<String, ModelInfo>,
    current: Option<String>,
}

impl ModelSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &BTreeMap<String, ModelInfo> {
        &self.registry
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The active model for display. Names missing from the registry show as
    /// "Unknown Model" / "Unknown Provider".
    pub fn active(&self) -> Option<ActiveModel> {
        let id = self.current.as_ref()?;
        let info = self.registry.get(id);
        Some(ActiveModel {
            id: id.clone(),
            name: info
                .and_then(|m| m.name.clone())
                .unwrap_or_else(|| "Unknown Model".to_string()),
            provider: info
                .and_then(|m| m.provider.clone())
                .unwrap_or_else(|| "Unknown Provider".to_string()),
        })
    }

    /// Fetch registry and current id. On failure the previous state is kept.
    pub async fn load<B: Backend>(&mut self, backend: &B) -> Result<()> {
        let resp = backend.models().await?;
        if !resp.success {
            let message = resp.error.unwrap_or_else(|| "Error loading models".to_string());
            warn!(%message, "model registry unavailable");
            return Err(ChatmindError::Application(message));
        }
        if let Some(current) = &resp.current_model {
            if !resp.models.contains_key(current) {
                warn!(%current, "current model not found in registry");
            }
        }
        self.registry = resp.models;
        self.current = resp.current_model;
        Ok(())
    }

    /// Ask the backend to switch, then refresh. The displayed model only
    /// changes after both calls succeed; a failed refresh after an accepted
    /// switch is logged and the notification is still returned.
    pub async fn switch<B: Backend>(&mut self, backend: &B, model: &str) -> Result<Notification> {
        let resp = match backend.set_model(model).await {
            Ok(resp) => resp,
            Err(ChatmindError::Application(message)) => {
                return Err(ChatmindError::Application(format!("Error switching model: {message}")))
            }
            Err(e) => {
                warn!(error = %e, "set_model request failed");
                return Err(ChatmindError::Transport(
                    "Failed to switch model. Please try again.".to_string(),
                ));
            }
        };
        if !resp.success {
            let message = resp.error.unwrap_or_else(|| "unknown error".to_string());
            return Err(ChatmindError::Application(format!("Error switching model: {message}")));
        }

        if let Err(e) = self.load(backend).await {
            warn!(error = %e, %model, "model switched but registry reload failed");
        }
        let message = resp
            .message
            .unwrap_or_else(|| format!("{SWITCH_PREFIX}{model}"));
        info!(%model, "active model switched");
        Ok(Notification::from_message(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_extracts_name() {
        let n = Notification::from_message("Model switched to GPT-4o Mini".to_string());
        assert_eq!(n.model_name, "GPT-4o Mini");
        assert_eq!(n.system_line(), "✓ Switched to GPT-4o Mini");
    }

    #[test]
    fn test_notification_without_prefix_uses_whole_message() {
        let n = Notification::from_message("Now using mistral".to_string());
        assert_eq!(n.model_name, "Now using mistral");
    }

    #[test]
    fn test_active_unknown_when_missing_from_registry() {
        let selector = ModelSelector {
            registry: BTreeMap::new(),
            current: Some("ghost".to_string()),
        };
        let active = selector.active().expect("active");
        assert_eq!(active.name, "Unknown Model");
        assert_eq!(active.provider, "Unknown Provider");
    }

    #[test]
    fn test_active_none_before_load() {
        assert!(ModelSelector::new().active().is_none());
    }
}
