//! Forgechat Library
//!
//! Client-side presentation logic for a multi-provider chat backend:
//! reply parsing into structured segments, transcript view state,
//! terminal display, session sidebar, provider configuration, and the
//! thin HTTP transport the UI glues together.
//!
//! ## Main Components
//!
//! - [`render`] - Reply parsing pipeline (MessageRenderer, Segment)
//! - [`transcript`] - Conversation view state (Transcript, copy affordances)
//! - [`display`] - Terminal materialization of a transcript
//! - [`client`] - HTTP transport to the chat backend
//! - [`config`] - Provider/model configuration and the persisted session context
//! - [`session`] - Session sidebar state
//!
//! ## Quick Start
//!
//! ```ignore
//! use forgechat::{ChatApi, ChatMode, ChatTarget, Transcript};
//!
//! let api = ChatApi::new("http://localhost:5000");
//! let renderer = ChatMode::Regular.renderer();
//! let mut transcript = Transcript::new();
//!
//! let reply = api
//!     .send_message(ChatMode::Regular, &ChatTarget::chat_session(1), "hello")
//!     .await?;
//! transcript.push_reply(&renderer, reply.class(), &reply.text);
//! ```

pub mod client;
pub mod config;
pub mod display;
pub mod render;
pub mod session;
pub mod transcript;

// Re-export commonly used types
pub use client::{ChatApi, ChatMode, ChatTarget, ClientError, HistoryTurn, TurnReply};
pub use config::{ContextStore, ModelConfig, Provider, SessionContext};
pub use display::TranscriptDisplay;
pub use render::{MessageRenderer, RegionSet, RenderedMessage, Segment};
pub use session::{Selection, SessionEntry, Sidebar};
pub use transcript::{MessageClass, Transcript, TranscriptMessage};
