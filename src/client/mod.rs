//! HTTP transport to the chat backend.
//!
//! Thin request/response wrappers over the backend's three chat
//! surfaces. Calls are sequential with no retry or deduplication; any
//! failure becomes an error-styled transcript message rather than a
//! propagated panic. Response bodies are parsed defensively through
//! pure functions so the wire handling is testable without a server.

use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::ModelConfig;
use crate::render::{MessageRenderer, RegionSet};
use crate::session::SessionEntry;
use crate::transcript::MessageClass;

/// Displayed when a reply body has none of the expected fields.
pub const MALFORMED_REPLY: &str = "Malformed reply from server.";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned status {0}")]
    Status(u16),

    #[error("Unexpected response shape: {0}")]
    Shape(String),
}

/// Which chat surface a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    /// The generic multi-provider chat.
    Regular,
    /// The developer assistant (RAG-backed, session-per-corpus).
    DeveloperAssistant,
    /// Direct RAG chat against one corpus.
    Rag,
}

impl ChatMode {
    /// The special regions replies from this surface may carry.
    pub fn regions(&self) -> RegionSet {
        match self {
            ChatMode::Regular => RegionSet::reasoning_only(),
            // RAG-backed surfaces attach source excerpts to answers.
            ChatMode::DeveloperAssistant | ChatMode::Rag => RegionSet::all(),
        }
    }

    /// A renderer configured for this surface.
    pub fn renderer(&self) -> MessageRenderer {
        MessageRenderer::with_regions(self.regions())
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChatMode::Regular => "regular",
            ChatMode::DeveloperAssistant => "developer",
            ChatMode::Rag => "rag",
        };
        f.write_str(name)
    }
}

impl FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "regular" | "chat" => Ok(ChatMode::Regular),
            "developer" | "dev" | "assistant" => Ok(ChatMode::DeveloperAssistant),
            "rag" => Ok(ChatMode::Rag),
            other => Err(format!("unknown chat mode: {}", other)),
        }
    }
}

/// One completed turn, ready for the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    /// Raw reply text, including any tagged regions.
    pub text: String,
    pub is_error: bool,
    /// Session the backend attributed the turn to, when it says.
    pub session_id: Option<i64>,
}

impl TurnReply {
    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
            session_id: None,
        }
    }

    /// How the transcript should style this turn.
    pub fn class(&self) -> MessageClass {
        if self.is_error {
            MessageClass::Error
        } else {
            MessageClass::Incoming
        }
    }
}

/// One prompt/reply pair from a history fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub prompt: String,
    pub reply: String,
}

/// Parse a reply body. The backend answers with one of `response` /
/// `answer` (success) or `error`; RAG-backed surfaces add a `sources`
/// string array, which is inlined as a `<sources>` tagged region so the
/// rendering pipeline handles inline and side-channel sources the same
/// way.
pub fn parse_turn(body: &Value) -> TurnReply {
    if let Some(error) = body.get("error").and_then(|v| v.as_str()) {
        return TurnReply::error(error);
    }

    let text = body
        .get("response")
        .or_else(|| body.get("answer"))
        .and_then(|v| v.as_str());
    let Some(text) = text else {
        tracing::debug!("reply body carried no response/answer/error field");
        return TurnReply::error(MALFORMED_REPLY);
    };

    let mut text = text.to_string();
    if let Some(sources) = body.get("sources").and_then(|v| v.as_array()) {
        let entries: Vec<&str> = sources.iter().filter_map(|v| v.as_str()).collect();
        if !entries.is_empty() {
            if let Ok(json) = serde_json::to_string(&entries) {
                text.push_str("<sources>");
                text.push_str(&json);
                text.push_str("</sources>");
            }
        }
    }

    TurnReply {
        text,
        is_error: false,
        session_id: parse_id(body.get("session_id")),
    }
}

/// Parse a history body. Accepts both wire shapes the backend uses:
/// `{"chat_details": [[prompt, reply, ...], ...]}` and a bare array of
/// `{"user_message", "bot_response"}` objects. Rows that do not carry a
/// recognizable pair are skipped.
pub fn parse_history(body: &Value) -> Result<Vec<HistoryTurn>, ClientError> {
    if let Some(error) = body.get("error").and_then(|v| v.as_str()) {
        return Err(ClientError::Shape(error.to_string()));
    }

    let rows = body
        .get("chat_details")
        .and_then(|v| v.as_array())
        .or_else(|| body.as_array())
        .ok_or_else(|| ClientError::Shape("history body is not a list".to_string()))?;

    Ok(rows.iter().filter_map(history_row).collect())
}

fn history_row(row: &Value) -> Option<HistoryTurn> {
    if let Some(pair) = row.as_array() {
        return Some(HistoryTurn {
            prompt: pair.first()?.as_str()?.to_string(),
            reply: pair.get(1)?.as_str()?.to_string(),
        });
    }
    Some(HistoryTurn {
        prompt: row.get("user_message")?.as_str()?.to_string(),
        reply: row.get("bot_response")?.as_str()?.to_string(),
    })
}

/// Parse a session-creation response into a sidebar entry. The chat
/// surfaces answer with `chat_id`/`chat_name`, the RAG surface with
/// `session_id`/`session_name`.
pub fn parse_new_session(body: &Value) -> Result<SessionEntry, ClientError> {
    if let Some(error) = body.get("error").and_then(|v| v.as_str()) {
        return Err(ClientError::Shape(error.to_string()));
    }
    let id = parse_id(body.get("chat_id").or_else(|| body.get("session_id")))
        .ok_or_else(|| ClientError::Shape("session body has no chat or session id".to_string()))?;
    let name = body
        .get("chat_name")
        .or_else(|| body.get("session_name"))
        .and_then(|v| v.as_str())
        .unwrap_or("New Chat")
        .to_string();
    Ok(SessionEntry::new(id, name))
}

/// Session ids arrive as numbers or numeric strings depending on the
/// route; accept both.
fn parse_id(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Client for the chat backend's HTTP surface.
pub struct ChatApi {
    base_url: String,
    http: Client,
}

impl ChatApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_body(&self, path: &str) -> Result<Value, ClientError> {
        tracing::debug!(path, "GET");
        let response = self.http.get(self.url(path)).send().await?;
        Ok(response.json().await?)
    }

    /// Submit one user message. Non-2xx responses with a JSON `error`
    /// body degrade into an error turn rather than a transport failure,
    /// matching how the UI displays backend-side errors.
    pub async fn send_message(
        &self,
        mode: ChatMode,
        target: &ChatTarget,
        message: &str,
    ) -> Result<TurnReply, ClientError> {
        tracing::debug!(%mode, "submitting message");
        let request = match mode {
            // The chat surfaces take form posts; the RAG surface takes JSON.
            ChatMode::Regular => self.http.post(self.url("/regularchat/")).form(&[
                ("userInput", message.to_string()),
                ("chat_id", target.chat_id()),
            ]),
            ChatMode::DeveloperAssistant => {
                let mut form = vec![
                    ("userInput", message.to_string()),
                    ("rag_id", target.rag_id()),
                ];
                if let Some(session) = target.session {
                    form.push(("session_id", session.to_string()));
                }
                self.http
                    .post(self.url("/rag/developerassistant/"))
                    .form(&form)
            }
            ChatMode::Rag => self
                .http
                .post(self.url(&format!("/rag/{}/chat", target.rag_id())))
                .json(&serde_json::json!({
                    "query": message,
                    "session_id": target.session,
                })),
        };

        let body: Value = request.send().await?.json().await?;
        Ok(parse_turn(&body))
    }

    /// Fetch a session's history.
    pub async fn history(
        &self,
        mode: ChatMode,
        target: &ChatTarget,
    ) -> Result<Vec<HistoryTurn>, ClientError> {
        let path = match mode {
            ChatMode::Regular => format!("/regularchat/{}", target.chat_id()),
            ChatMode::DeveloperAssistant => {
                format!("/rag/developerassistant/chat_history/{}", target.chat_id())
            }
            ChatMode::Rag => format!(
                "/rag/{}/session/{}/history",
                target.rag_id(),
                target.chat_id()
            ),
        };
        parse_history(&self.get_body(&path).await?)
    }

    /// Create a new chat session.
    pub async fn new_session(
        &self,
        mode: ChatMode,
        rag_id: Option<i64>,
    ) -> Result<SessionEntry, ClientError> {
        let needs_rag = || {
            rag_id.ok_or_else(|| {
                ClientError::Shape("RAG modes need a rag id to create a session".to_string())
            })
        };
        let request = match mode {
            ChatMode::Regular => self
                .http
                .post(self.url("/regularchat/new_chat"))
                .form::<[(&str, &str); 0]>(&[]),
            ChatMode::DeveloperAssistant => self
                .http
                .post(self.url("/rag/developerassistant/new_chat"))
                .form(&[("rag_id", needs_rag()?.to_string())]),
            ChatMode::Rag => self
                .http
                .post(self.url(&format!("/rag/{}/new-session", needs_rag()?)))
                .json(&serde_json::json!({"session_name": "New Session"})),
        };
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }
        parse_new_session(&response.json().await?)
    }

    /// Fetch the model configuration attached to a chat. `None` when
    /// the chat has no configuration the client can understand.
    pub async fn model_config(&self, chat_id: i64) -> Result<Option<ModelConfig>, ClientError> {
        let path = format!("/regularchat/get_model_config?chat_id={}", chat_id);
        let body = self.get_body(&path).await?;
        Ok(ModelConfig::from_wire(&body))
    }

    /// Save a chat's model configuration.
    pub async fn update_model_config(
        &self,
        chat_id: i64,
        config: &ModelConfig,
    ) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/regularchat/update_model_config"))
            .json(&config.wire_body(chat_id))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }
        Ok(())
    }

    /// List locally served models.
    pub async fn local_models(&self) -> Result<Vec<String>, ClientError> {
        let body = self.get_body("/ollama/models").await?;
        let models = body
            .as_array()
            .ok_or_else(|| ClientError::Shape("model list is not an array".to_string()))?;
        Ok(models
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect())
    }
}

/// Which session a request addresses. `chat` is the chat/session id for
/// the mode; RAG-backed modes also need the corpus id.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatTarget {
    pub chat: Option<i64>,
    pub rag: Option<i64>,
    pub session: Option<i64>,
}

impl ChatTarget {
    pub fn chat_session(chat: i64) -> Self {
        Self {
            chat: Some(chat),
            ..Default::default()
        }
    }

    pub fn rag_session(rag: i64, session: Option<i64>) -> Self {
        Self {
            chat: session,
            rag: Some(rag),
            session,
        }
    }

    fn chat_id(&self) -> String {
        self.chat.map(|id| id.to_string()).unwrap_or_default()
    }

    fn rag_id(&self) -> String {
        self.rag.map(|id| id.to_string()).unwrap_or_default()
    }
}
