//! Segment types for rendered replies.
//!
//! A raw reply string is parsed into an ordered sequence of segments:
//! at most one reasoning block, at most one sources block, and the
//! remaining content split into literal code and markup prose.

/// Maximum characters of a source entry shown before truncation.
pub const SOURCE_PREVIEW_MAX: usize = 200;

/// Placeholder entry used when a sources payload fails to parse.
pub const SOURCES_PARSE_ERROR: &str = "Failed to load sources.";

/// Language tag used when a code fence carries no language line.
pub const DEFAULT_LANGUAGE: &str = "text";

/// One unit of a rendered reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Model reasoning extracted from `<think>` tags, collapsed by default.
    Reasoning { markup: String },
    /// Retrieved document excerpts attached to a RAG answer, collapsed by default.
    Sources { entries: Vec<String> },
    /// Fenced literal code. Whitespace is preserved and never markup-processed.
    Code { language: String, text: String },
    /// Markup text outside any special region.
    Prose { markup: String },
}

impl Segment {
    pub fn is_reasoning(&self) -> bool {
        matches!(self, Segment::Reasoning { .. })
    }

    pub fn is_sources(&self) -> bool {
        matches!(self, Segment::Sources { .. })
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Segment::Code { .. })
    }

    pub fn is_prose(&self) -> bool {
        matches!(self, Segment::Prose { .. })
    }
}

/// A fully parsed reply: segments in display order.
///
/// Reasoning comes first and sources second when present, regardless of
/// where their tags appeared in the raw text; code and prose follow in
/// original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedMessage {
    pub segments: Vec<Segment>,
}

impl RenderedMessage {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The reasoning markup, if a reasoning region was extracted.
    pub fn reasoning(&self) -> Option<&str> {
        self.segments.iter().find_map(|s| match s {
            Segment::Reasoning { markup } => Some(markup.as_str()),
            _ => None,
        })
    }

    /// The source entries, if a sources region was extracted.
    pub fn sources(&self) -> Option<&[String]> {
        self.segments.iter().find_map(|s| match s {
            Segment::Sources { entries } => Some(entries.as_slice()),
            _ => None,
        })
    }

    /// Code and prose segments in display order.
    pub fn content_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments
            .iter()
            .filter(|s| s.is_code() || s.is_prose())
    }
}

/// Truncate a source entry for display: at most [`SOURCE_PREVIEW_MAX`]
/// characters, with an ellipsis when the entry is longer.
pub fn source_preview(entry: &str) -> String {
    let truncated: String = entry.chars().take(SOURCE_PREVIEW_MAX).collect();
    if truncated.len() < entry.len() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_predicates() {
        let code = Segment::Code {
            language: "rust".to_string(),
            text: "fn main() {}".to_string(),
        };
        assert!(code.is_code());
        assert!(!code.is_prose());

        let prose = Segment::Prose {
            markup: "hello".to_string(),
        };
        assert!(prose.is_prose());
        assert!(!prose.is_reasoning());
    }

    #[test]
    fn test_rendered_message_accessors() {
        let message = RenderedMessage {
            segments: vec![
                Segment::Reasoning {
                    markup: "hmm".to_string(),
                },
                Segment::Sources {
                    entries: vec!["a".to_string()],
                },
                Segment::Prose {
                    markup: "answer".to_string(),
                },
            ],
        };
        assert_eq!(message.reasoning(), Some("hmm"));
        assert_eq!(message.sources(), Some(&["a".to_string()][..]));
        assert_eq!(message.content_segments().count(), 1);
    }

    #[test]
    fn test_rendered_message_without_special_regions() {
        let message = RenderedMessage {
            segments: vec![Segment::Prose {
                markup: "plain".to_string(),
            }],
        };
        assert!(message.reasoning().is_none());
        assert!(message.sources().is_none());
    }

    #[test]
    fn test_source_preview_short_entry_unchanged() {
        assert_eq!(source_preview("short excerpt"), "short excerpt");
    }

    #[test]
    fn test_source_preview_truncates_long_entry() {
        let entry = "x".repeat(300);
        let preview = source_preview(&entry);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), SOURCE_PREVIEW_MAX + 3);
    }

    #[test]
    fn test_source_preview_exactly_at_limit() {
        let entry = "y".repeat(SOURCE_PREVIEW_MAX);
        assert_eq!(source_preview(&entry), entry);
    }
}
