//! Per-message view state: collapsible sections and copy affordances.

use std::time::Instant;

use crate::render::{RenderedMessage, Segment};

use super::copy::CopyFeedback;

/// Header label shown above a reasoning section.
pub const REASONING_HEADER: &str = "Thinking Process";

/// Header label shown above a sources section.
pub const SOURCES_HEADER: &str = "Sources";

/// Visual classification of a transcript bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    /// A message the user sent.
    Outgoing,
    /// A reply from the backend.
    Incoming,
    /// A displayed failure (network error, unconfigured chat, ...).
    Error,
    /// A confirmation notice (e.g. configuration saved).
    Success,
}

/// A rendered reply plus the interactive state the transcript owns for
/// it: collapsed flags for the reasoning and sources sections, and copy
/// acknowledgment state for each code block and for the whole message.
#[derive(Debug, Clone)]
pub struct TranscriptMessage {
    pub id: String,
    pub class: MessageClass,
    pub rendered: RenderedMessage,
    reasoning_collapsed: bool,
    sources_collapsed: bool,
    code_feedback: Vec<(usize, CopyFeedback)>,
    message_feedback: CopyFeedback,
}

impl TranscriptMessage {
    /// Wrap a rendered reply. Reasoning and sources start collapsed.
    pub fn new(class: MessageClass, rendered: RenderedMessage) -> Self {
        let code_feedback = rendered
            .segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_code())
            .map(|(i, _)| (i, CopyFeedback::new()))
            .collect();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            class,
            rendered,
            reasoning_collapsed: true,
            sources_collapsed: true,
            code_feedback,
            message_feedback: CopyFeedback::new(),
        }
    }

    // =========================================================================
    // Collapsible sections
    // =========================================================================

    pub fn is_reasoning_collapsed(&self) -> bool {
        self.reasoning_collapsed
    }

    pub fn is_sources_collapsed(&self) -> bool {
        self.sources_collapsed
    }

    /// Toggle the reasoning section. No effect on other segments.
    pub fn toggle_reasoning(&mut self) {
        self.reasoning_collapsed = !self.reasoning_collapsed;
    }

    /// Toggle the sources section. No effect on other segments.
    pub fn toggle_sources(&mut self) {
        self.sources_collapsed = !self.sources_collapsed;
    }

    // =========================================================================
    // Copy affordances
    // =========================================================================

    /// The literal text a code block's copy button places on the
    /// clipboard, by segment index. `None` if the index is not a code
    /// segment.
    pub fn code_copy_payload(&self, segment_index: usize) -> Option<&str> {
        match self.rendered.segments.get(segment_index) {
            Some(Segment::Code { text, .. }) => Some(text),
            _ => None,
        }
    }

    /// Record a copy of the given code block at `now`.
    pub fn copy_code(&mut self, segment_index: usize, now: Instant) {
        if let Some((_, feedback)) = self
            .code_feedback
            .iter_mut()
            .find(|(i, _)| *i == segment_index)
        {
            feedback.record(now);
        }
    }

    /// Current label of a code block's copy button.
    pub fn code_copy_label(&self, segment_index: usize, now: Instant) -> Option<&'static str> {
        self.code_feedback
            .iter()
            .find(|(i, _)| *i == segment_index)
            .map(|(_, feedback)| feedback.label(now))
    }

    /// The text the whole-message copy affordance places on the
    /// clipboard: every section's header and content, in display order,
    /// with the copy-button labels themselves excluded. Sources entries
    /// are copied in full, not in their truncated display form.
    pub fn message_copy_payload(&self) -> String {
        let mut blocks = Vec::new();
        for segment in &self.rendered.segments {
            match segment {
                Segment::Reasoning { markup } => {
                    blocks.push(format!("{}\n{}", REASONING_HEADER, markup));
                }
                Segment::Sources { entries } => {
                    blocks.push(format!("{}\n{}", SOURCES_HEADER, entries.join("\n")));
                }
                Segment::Code { language, text } => {
                    blocks.push(format!("{}\n{}", language, text));
                }
                Segment::Prose { markup } => {
                    blocks.push(markup.clone());
                }
            }
        }
        blocks.join("\n")
    }

    /// Record a whole-message copy at `now`.
    pub fn copy_message(&mut self, now: Instant) {
        self.message_feedback.record(now);
    }

    /// Current label of the whole-message copy affordance.
    pub fn message_copy_label(&self, now: Instant) -> &'static str {
        self.message_feedback.label(now)
    }
}
