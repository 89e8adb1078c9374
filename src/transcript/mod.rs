//! Transcript state for the conversation view.
//!
//! The transcript owns the ordered message list for the active session.
//! Messages are appended as turns complete and the whole list is
//! cleared when the user switches sessions; rendered segments live only
//! as long as the transcript that holds them.

mod copy;
mod message;

pub use copy::{CopyFeedback, ACK_DURATION, ACK_LABEL, IDLE_LABEL};
pub use message::{MessageClass, TranscriptMessage, REASONING_HEADER, SOURCES_HEADER};

use crate::render::{MessageRenderer, RenderedMessage};

/// Placeholder bubble shown while a submission is in flight.
pub const PENDING_TEXT: &str = "Answering...";

/// Ordered message list for one conversation view.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<TranscriptMessage>,
    pending_id: Option<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[TranscriptMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Append an already-rendered message and return its id.
    pub fn push(&mut self, class: MessageClass, rendered: RenderedMessage) -> String {
        let message = TranscriptMessage::new(class, rendered);
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    /// Parse raw reply text through `renderer` and append it.
    pub fn push_reply(
        &mut self,
        renderer: &MessageRenderer,
        class: MessageClass,
        reply: &str,
    ) -> String {
        self.push(class, renderer.render(reply))
    }

    /// Show the "Answering..." placeholder for an in-flight submission.
    /// A new placeholder replaces any previous one.
    pub fn begin_pending(&mut self, renderer: &MessageRenderer) {
        self.remove_pending();
        let id = self.push_reply(renderer, MessageClass::Incoming, PENDING_TEXT);
        self.pending_id = Some(id);
    }

    /// Replace the placeholder with the turn's actual outcome.
    pub fn resolve_pending(
        &mut self,
        renderer: &MessageRenderer,
        class: MessageClass,
        reply: &str,
    ) -> String {
        self.remove_pending();
        self.push_reply(renderer, class, reply)
    }

    /// Drop the placeholder without adding anything, e.g. when the
    /// request failed before producing a displayable reply.
    pub fn remove_pending(&mut self) {
        if let Some(id) = self.pending_id.take() {
            self.messages.retain(|m| m.id != id);
        }
    }

    /// Clear the view, e.g. on session switch.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.pending_id = None;
    }

    pub fn get(&self, id: &str) -> Option<&TranscriptMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut TranscriptMessage> {
        self.messages.iter_mut().find(|m| m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> MessageRenderer {
        MessageRenderer::new()
    }

    #[test]
    fn test_push_reply_appends_in_order() {
        let mut transcript = Transcript::new();
        transcript.push_reply(&renderer(), MessageClass::Outgoing, "question");
        transcript.push_reply(&renderer(), MessageClass::Incoming, "answer");

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[0].class, MessageClass::Outgoing);
        assert_eq!(transcript.messages()[1].class, MessageClass::Incoming);
    }

    #[test]
    fn test_pending_placeholder_is_replaced_by_reply() {
        let mut transcript = Transcript::new();
        let r = renderer();
        transcript.push_reply(&r, MessageClass::Outgoing, "question");
        transcript.begin_pending(&r);
        assert_eq!(transcript.len(), 2);

        transcript.resolve_pending(&r, MessageClass::Incoming, "the answer");
        assert_eq!(transcript.len(), 2);
        let last = &transcript.messages()[1];
        assert_eq!(last.class, MessageClass::Incoming);
        assert_eq!(last.rendered.segments.len(), 1);
    }

    #[test]
    fn test_pending_removed_on_transport_failure() {
        let mut transcript = Transcript::new();
        let r = renderer();
        transcript.begin_pending(&r);
        transcript.remove_pending();
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_second_pending_replaces_first() {
        let mut transcript = Transcript::new();
        let r = renderer();
        transcript.begin_pending(&r);
        transcript.begin_pending(&r);
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_clear_on_session_switch() {
        let mut transcript = Transcript::new();
        let r = renderer();
        transcript.push_reply(&r, MessageClass::Incoming, "hello");
        transcript.begin_pending(&r);
        transcript.clear();
        assert!(transcript.is_empty());

        // A stale resolve after clear must not resurrect the placeholder.
        transcript.resolve_pending(&r, MessageClass::Incoming, "late reply");
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_get_by_id() {
        let mut transcript = Transcript::new();
        let id = transcript.push_reply(&renderer(), MessageClass::Incoming, "hello");
        assert!(transcript.get(&id).is_some());
        assert!(transcript.get("missing").is_none());

        if let Some(msg) = transcript.get_mut(&id) {
            msg.toggle_reasoning();
        }
        assert!(!transcript.get(&id).unwrap().is_reasoning_collapsed());
    }
}
