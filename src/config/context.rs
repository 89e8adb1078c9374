//! Session context: the client-local state the UI reads at startup.
//!
//! One explicit value object for theme, sidebar visibility, the active
//! chat/RAG selection, and the saved model configuration, with exactly
//! two persistence touch points: [`ContextStore::load`] at startup and
//! [`ContextStore::save`] on change.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::provider::ModelConfig;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Display theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggle(&mut self) {
        *self = match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
    }
}

/// Sidebar visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SidebarVisibility {
    #[default]
    Visible,
    PartiallyHidden,
}

impl SidebarVisibility {
    pub fn toggle(&mut self) {
        *self = match self {
            SidebarVisibility::Visible => SidebarVisibility::PartiallyHidden,
            SidebarVisibility::PartiallyHidden => SidebarVisibility::Visible,
        };
    }
}

/// Everything the client remembers between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub theme: Theme,
    pub sidebar: SidebarVisibility,

    /// Selected regular-chat session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_chat: Option<i64>,

    /// Selected RAG corpus and its chat session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_rag: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_rag_session: Option<i64>,

    /// Last saved model configuration, kept client-side as a backup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_draft: Option<ModelConfig>,
}

/// Loads and saves the [`SessionContext`] as JSON under the user's home
/// directory.
pub struct ContextStore {
    path: PathBuf,
}

impl ContextStore {
    /// Store at the default location, `~/.forgechat/context.json`.
    pub fn new() -> Self {
        let path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".forgechat")
            .join("context.json");
        Self { path }
    }

    /// Store at a custom path.
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the saved context. A missing or unreadable file falls back
    /// to the defaults; startup never fails on bad local state.
    pub fn load(&self) -> SessionContext {
        match fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(context) => context,
                Err(err) => {
                    tracing::warn!("discarding corrupt session context: {err}");
                    SessionContext::default()
                }
            },
            Err(_) => SessionContext::default(),
        }
    }

    /// Persist the context. Called after every state change.
    pub fn save(&self, context: &SessionContext) -> Result<(), ContextError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(context)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}
