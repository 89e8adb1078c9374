//! Reply parsing: tagged-region extraction and code-fence segmentation.
//!
//! The backend returns one raw string per turn. Replies may embed a
//! `<think>` region (model reasoning), a `<sources>` region (a JSON
//! array of retrieved excerpts), and any number of triple-backtick code
//! fences. Parsing is a pure function of the input and never fails:
//! malformed input degrades into plain prose.
//!
//! Extraction is a forward scan (find the open tag, then the close tag
//! after it) rather than a regex, so the unbalanced-tag fallback is an
//! explicit branch: a lone open or close tag leaves the text untouched
//! and the tag shows up literally in prose.

use regex::Regex;
use std::sync::OnceLock;

use super::segment::{RenderedMessage, Segment, DEFAULT_LANGUAGE, SOURCES_PARSE_ERROR};

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";
const SOURCES_OPEN: &str = "<sources>";
const SOURCES_CLOSE: &str = "</sources>";
const FENCE: &str = "```";

/// Which optional regions a chat mode recognizes.
///
/// Regular chat only ever sees reasoning tags; RAG-backed modes also
/// receive sources. One pipeline parametrized by this set serves every
/// mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSet {
    pub reasoning: bool,
    pub sources: bool,
}

impl RegionSet {
    /// Reasoning only: the plain chat modes.
    pub const fn reasoning_only() -> Self {
        Self {
            reasoning: true,
            sources: false,
        }
    }

    /// Reasoning and sources: RAG-backed modes.
    pub const fn all() -> Self {
        Self {
            reasoning: true,
            sources: true,
        }
    }
}

impl Default for RegionSet {
    fn default() -> Self {
        Self::all()
    }
}

/// Parses raw reply text into an ordered [`RenderedMessage`].
#[derive(Debug, Clone)]
pub struct MessageRenderer {
    regions: RegionSet,
}

impl MessageRenderer {
    /// Create a renderer recognizing every region type.
    pub fn new() -> Self {
        Self::with_regions(RegionSet::default())
    }

    /// Create a renderer recognizing only the given regions.
    pub fn with_regions(regions: RegionSet) -> Self {
        Self { regions }
    }

    /// Parse one reply. Pure and infallible: no I/O, no panics, and
    /// structurally identical output for identical input.
    ///
    /// Fixed order: reasoning extraction, then sources extraction over
    /// the reduced text, then code/prose segmentation of the remainder.
    /// The reasoning segment (if any) is placed first and the sources
    /// segment (if any) second, wherever their tags appeared.
    pub fn render(&self, reply: &str) -> RenderedMessage {
        let mut segments = Vec::new();
        let mut working = reply.to_string();

        if self.regions.reasoning {
            if let Some(inner) = extract_tagged(&mut working, THINK_OPEN, THINK_CLOSE) {
                segments.push(Segment::Reasoning {
                    markup: inner.trim().to_string(),
                });
            }
        }

        if self.regions.sources {
            if let Some(inner) = extract_tagged(&mut working, SOURCES_OPEN, SOURCES_CLOSE) {
                segments.push(Segment::Sources {
                    entries: parse_source_entries(&inner),
                });
            }
        }

        split_fences(&working, &mut segments);
        RenderedMessage { segments }
    }
}

impl Default for MessageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove the first `open`..`close` region from `text` and return its
/// inner content. Requires the close tag to appear after the open tag;
/// if either is missing the text is left untouched. No partial
/// extraction.
fn extract_tagged(text: &mut String, open: &str, close: &str) -> Option<String> {
    let start = text.find(open)?;
    let inner_start = start + open.len();
    let close_rel = text[inner_start..].find(close)?;
    let inner_end = inner_start + close_rel;
    let inner = text[inner_start..inner_end].to_string();
    text.replace_range(start..inner_end + close.len(), "");
    Some(inner)
}

/// Parse a sources payload: a JSON array of strings. A malformed
/// payload still yields a sources block, with a single placeholder
/// entry, so the user sees that sources existed but could not load.
fn parse_source_entries(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(raw.trim()) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!("sources payload is not a JSON string array: {err}");
            vec![SOURCES_PARSE_ERROR.to_string()]
        }
    }
}

/// Matches a bare language word on the first line of a fenced block.
fn language_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\w+)\n").expect("static pattern compiles"))
}

/// Split text on triple-backtick fences, pushing code and prose
/// segments in order. An opening fence with no closing fence is not a
/// code block; it stays literal in the trailing prose.
fn split_fences(text: &str, segments: &mut Vec<Segment>) {
    let mut rest = text;
    while let Some(open) = rest.find(FENCE) {
        let after_open = &rest[open + FENCE.len()..];
        let Some(close) = after_open.find(FENCE) else {
            break;
        };
        push_prose(segments, &rest[..open]);
        segments.push(code_segment(&after_open[..close]));
        rest = &after_open[close + FENCE.len()..];
    }
    push_prose(segments, rest);
}

/// Whitespace-only prose pieces are dropped; the rest is kept untrimmed
/// so the markup pass sees the original spacing.
fn push_prose(segments: &mut Vec<Segment>, piece: &str) {
    if !piece.trim().is_empty() {
        segments.push(Segment::Prose {
            markup: piece.to_string(),
        });
    }
}

/// Build a code segment from the text between a pair of fences. If the
/// first line is a single bare word it names the language and is
/// stripped from the code; otherwise the language defaults to `text`.
fn code_segment(inner: &str) -> Segment {
    let trimmed = inner.trim();
    if let Some(found) = language_line().find(trimmed) {
        Segment::Code {
            language: trimmed[..found.end()].trim_end().to_string(),
            text: trimmed[found.end()..].to_string(),
        }
    } else {
        Segment::Code {
            language: DEFAULT_LANGUAGE.to_string(),
            text: trimmed.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(reply: &str) -> RenderedMessage {
        MessageRenderer::new().render(reply)
    }

    // ==========================================================================
    // Plain prose
    // ==========================================================================

    #[test]
    fn test_plain_text_is_one_prose_segment() {
        let message = render("Just a plain answer.");
        assert_eq!(
            message.segments,
            vec![Segment::Prose {
                markup: "Just a plain answer.".to_string()
            }]
        );
    }

    #[test]
    fn test_empty_input_yields_no_segments() {
        assert!(render("").is_empty());
        assert!(render("   \n\t  ").is_empty());
    }

    #[test]
    fn test_rendering_is_pure() {
        let reply = "<think>A</think>B\n```rust\nlet x = 1;\n```";
        assert_eq!(render(reply), render(reply));
    }

    // ==========================================================================
    // Reasoning extraction
    // ==========================================================================

    #[test]
    fn test_reasoning_then_prose() {
        let message = render("<think>A</think>B");
        assert_eq!(
            message.segments,
            vec![
                Segment::Reasoning {
                    markup: "A".to_string()
                },
                Segment::Prose {
                    markup: "B".to_string()
                },
            ]
        );
        assert!(message.sources().is_none());
    }

    #[test]
    fn test_reasoning_inner_text_is_trimmed() {
        let message = render("<think>\n  pondering  \n</think>done");
        assert_eq!(message.reasoning(), Some("pondering"));
    }

    #[test]
    fn test_unclosed_reasoning_tag_stays_literal() {
        let message = render("<think>half a thought");
        assert_eq!(
            message.segments,
            vec![Segment::Prose {
                markup: "<think>half a thought".to_string()
            }]
        );
    }

    #[test]
    fn test_lone_closing_tag_stays_literal() {
        let message = render("an answer</think>");
        assert!(message.reasoning().is_none());
        assert_eq!(message.segments.len(), 1);
    }

    #[test]
    fn test_close_tag_before_open_tag_stays_literal() {
        let message = render("</think>oops<think>");
        assert!(message.reasoning().is_none());
    }

    #[test]
    fn test_only_first_reasoning_region_extracted() {
        let message = render("<think>one</think>mid<think>two</think>end");
        assert_eq!(message.reasoning(), Some("one"));
        // The second region's tags survive into prose verbatim.
        let prose: Vec<_> = message
            .segments
            .iter()
            .filter(|s| s.is_prose())
            .collect();
        assert_eq!(prose.len(), 1);
        assert_eq!(
            prose[0],
            &Segment::Prose {
                markup: "mid<think>two</think>end".to_string()
            }
        );
    }

    #[test]
    fn test_reasoning_disabled_leaves_tags_in_prose() {
        let renderer = MessageRenderer::with_regions(RegionSet {
            reasoning: false,
            sources: false,
        });
        let message = renderer.render("<think>A</think>B");
        assert!(message.reasoning().is_none());
        assert_eq!(
            message.segments,
            vec![Segment::Prose {
                markup: "<think>A</think>B".to_string()
            }]
        );
    }

    // ==========================================================================
    // Sources extraction
    // ==========================================================================

    #[test]
    fn test_trailing_sources_ordered_before_content() {
        let message = render(r#"The answer.<sources>["a","b"]</sources>"#);
        assert_eq!(
            message.sources(),
            Some(&["a".to_string(), "b".to_string()][..])
        );
        // Sources segment sits before the content segments.
        assert!(message.segments[0].is_sources());
        assert!(message.segments[1].is_prose());
    }

    #[test]
    fn test_sources_after_reasoning() {
        let message = render(r#"<think>T</think>body<sources>["s"]</sources>"#);
        assert!(message.segments[0].is_reasoning());
        assert!(message.segments[1].is_sources());
        assert!(message.segments[2].is_prose());
    }

    #[test]
    fn test_malformed_sources_payload_yields_placeholder() {
        let message = render("<sources>not-json</sources>answer");
        assert_eq!(
            message.sources(),
            Some(&[SOURCES_PARSE_ERROR.to_string()][..])
        );
    }

    #[test]
    fn test_sources_array_of_non_strings_yields_placeholder() {
        let message = render("<sources>[1,2,3]</sources>");
        assert_eq!(
            message.sources(),
            Some(&[SOURCES_PARSE_ERROR.to_string()][..])
        );
    }

    #[test]
    fn test_empty_sources_array_yields_empty_entries() {
        let message = render("<sources>[]</sources>text");
        assert_eq!(message.sources(), Some(&[][..]));
    }

    #[test]
    fn test_unclosed_sources_tag_stays_literal() {
        let message = render(r#"<sources>["a""#);
        assert!(message.sources().is_none());
        assert!(message.segments[0].is_prose());
    }

    #[test]
    fn test_sources_disabled_for_plain_chat_mode() {
        let renderer = MessageRenderer::with_regions(RegionSet::reasoning_only());
        let message = renderer.render(r#"A<sources>["x"]</sources>"#);
        assert!(message.sources().is_none());
        assert_eq!(
            message.segments,
            vec![Segment::Prose {
                markup: r#"A<sources>["x"]</sources>"#.to_string()
            }]
        );
    }

    // ==========================================================================
    // Code fences
    // ==========================================================================

    #[test]
    fn test_fence_with_language_line() {
        let message = render("```python\nprint(1)\n```");
        assert_eq!(
            message.segments,
            vec![Segment::Code {
                language: "python".to_string(),
                text: "print(1)".to_string(),
            }]
        );
    }

    #[test]
    fn test_fence_without_language_defaults_to_text() {
        let message = render("```\nplain\n```");
        assert_eq!(
            message.segments,
            vec![Segment::Code {
                language: "text".to_string(),
                text: "plain".to_string(),
            }]
        );
    }

    #[test]
    fn test_prose_around_fence_keeps_order() {
        let message = render("before\n```rust\nlet a = 1;\n```\nafter");
        assert_eq!(message.segments.len(), 3);
        assert!(message.segments[0].is_prose());
        assert!(message.segments[1].is_code());
        assert!(message.segments[2].is_prose());
    }

    #[test]
    fn test_multiple_fences() {
        let message = render("```\none\n```mid```\ntwo\n```");
        let codes: Vec<_> = message.segments.iter().filter(|s| s.is_code()).collect();
        assert_eq!(codes.len(), 2);
        assert!(message.segments[1].is_prose());
    }

    #[test]
    fn test_unmatched_opening_fence_stays_in_prose() {
        let message = render("start ```rust\nlet x = 1;");
        assert_eq!(
            message.segments,
            vec![Segment::Prose {
                markup: "start ```rust\nlet x = 1;".to_string()
            }]
        );
    }

    #[test]
    fn test_code_preserves_interior_whitespace() {
        let message = render("```python\ndef f():\n    return 1\n```");
        assert_eq!(
            message.segments,
            vec![Segment::Code {
                language: "python".to_string(),
                text: "def f():\n    return 1".to_string(),
            }]
        );
    }

    #[test]
    fn test_empty_fence_is_empty_text_code_block() {
        let message = render("``````");
        assert_eq!(
            message.segments,
            vec![Segment::Code {
                language: "text".to_string(),
                text: String::new(),
            }]
        );
    }

    #[test]
    fn test_first_line_with_spaces_is_not_a_language() {
        let message = render("```two words\nrest\n```");
        assert_eq!(
            message.segments,
            vec![Segment::Code {
                language: "text".to_string(),
                text: "two words\nrest".to_string(),
            }]
        );
    }

    // ==========================================================================
    // Combined
    // ==========================================================================

    #[test]
    fn test_full_reply_with_every_region() {
        let reply = concat!(
            "<think>let me check the docs</think>",
            "Here you go:\n```python\nprint(1)\n```\nDone.",
            r#"<sources>["doc one","doc two"]</sources>"#,
        );
        let message = render(reply);
        assert!(message.segments[0].is_reasoning());
        assert!(message.segments[1].is_sources());
        assert!(message.segments[2].is_prose());
        assert!(message.segments[3].is_code());
        assert!(message.segments[4].is_prose());
    }
}
