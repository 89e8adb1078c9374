//! Terminal materialization of the transcript.
//!
//! Each transcript message is written to the terminal: collapsed
//! reasoning/sources sections as one-line headers with a preview, code
//! blocks through syntect with the copy label in the header, and prose
//! through a small line-oriented markdown pass. Display never fails the
//! caller beyond plain IO errors; highlighting failures fall back to
//! raw text.

use crossterm::{
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    ExecutableCommand,
};
use std::io::{stdout, Write};
use std::time::Instant;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

use crate::render::{source_preview, Segment};
use crate::transcript::{
    MessageClass, Transcript, TranscriptMessage, ACK_LABEL, REASONING_HEADER, SOURCES_HEADER,
};

/// Characters of a collapsed section's first line shown as preview.
const PREVIEW_MAX: usize = 50;

/// Bubble and accent colors.
#[derive(Debug, Clone)]
pub struct DisplayStyle {
    pub outgoing_color: Color,
    pub incoming_color: Color,
    pub error_color: Color,
    pub success_color: Color,
    pub section_color: Color,
}

impl Default for DisplayStyle {
    fn default() -> Self {
        Self {
            outgoing_color: Color::Cyan,
            incoming_color: Color::White,
            error_color: Color::Red,
            success_color: Color::Green,
            section_color: Color::DarkCyan,
        }
    }
}

/// Writes transcript messages to the terminal.
pub struct TranscriptDisplay {
    style: DisplayStyle,
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl TranscriptDisplay {
    pub fn new() -> Self {
        Self::with_style(DisplayStyle::default())
    }

    pub fn with_style(style: DisplayStyle) -> Self {
        Self {
            style,
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    /// Render every message in order.
    pub fn render_transcript(&self, transcript: &Transcript, now: Instant) -> std::io::Result<()> {
        for message in transcript.messages() {
            self.render_message(message, now)?;
        }
        Ok(())
    }

    /// Render one message: a classed header line, then its segments.
    pub fn render_message(
        &self,
        message: &TranscriptMessage,
        now: Instant,
    ) -> std::io::Result<()> {
        let (label, color) = match message.class {
            MessageClass::Outgoing => ("You", self.style.outgoing_color),
            MessageClass::Incoming => ("Assistant", self.style.incoming_color),
            MessageClass::Error => ("✗ Error", self.style.error_color),
            MessageClass::Success => ("✓", self.style.success_color),
        };

        stdout()
            .execute(SetForegroundColor(color))?
            .execute(SetAttribute(Attribute::Bold))?
            .execute(Print(label))?
            .execute(SetAttribute(Attribute::Reset))?
            .execute(ResetColor)?
            .execute(Print("\n"))?;

        for (index, segment) in message.rendered.segments.iter().enumerate() {
            match segment {
                Segment::Reasoning { markup } => {
                    self.render_reasoning(markup, message.is_reasoning_collapsed())?;
                }
                Segment::Sources { entries } => {
                    self.render_sources(entries, message.is_sources_collapsed())?;
                }
                Segment::Code { language, text } => {
                    let label = message.code_copy_label(index, now).unwrap_or_default();
                    self.render_code(language, text, label)?;
                }
                Segment::Prose { markup } => self.render_prose(markup)?,
            }
        }

        // Transient whole-message copy acknowledgment.
        if message.message_copy_label(now) == ACK_LABEL {
            stdout()
                .execute(SetForegroundColor(self.style.success_color))?
                .execute(Print("✓ Copied\n"))?
                .execute(ResetColor)?;
        }

        println!();
        Ok(())
    }

    fn render_reasoning(&self, markup: &str, collapsed: bool) -> std::io::Result<()> {
        let mut out = stdout();
        out.execute(SetForegroundColor(self.style.section_color))?;
        if collapsed {
            out.execute(Print(format!(
                "▸ {} — {}\n",
                REASONING_HEADER,
                collapse_preview(markup)
            )))?;
            out.execute(ResetColor)?;
            return Ok(());
        }
        out.execute(Print(format!("▾ {}\n", REASONING_HEADER)))?;
        out.execute(ResetColor)?;
        out.execute(SetAttribute(Attribute::Dim))?;
        self.render_prose(markup)?;
        out.execute(SetAttribute(Attribute::Reset))?;
        Ok(())
    }

    fn render_sources(&self, entries: &[String], collapsed: bool) -> std::io::Result<()> {
        let mut out = stdout();
        out.execute(SetForegroundColor(self.style.section_color))?;
        if collapsed {
            out.execute(Print(format!("▸ {} ({})\n", SOURCES_HEADER, entries.len())))?;
            out.execute(ResetColor)?;
            return Ok(());
        }
        out.execute(Print(format!("▾ {}\n", SOURCES_HEADER)))?;
        out.execute(ResetColor)?;
        for entry in entries {
            out.execute(SetForegroundColor(Color::DarkGrey))?
                .execute(Print("• "))?
                .execute(ResetColor)?
                .execute(Print(source_preview(entry)))?
                .execute(Print("\n"))?;
        }
        Ok(())
    }

    /// Code block: framed header carrying the language and the copy
    /// label, syntect-highlighted body, footer.
    fn render_code(&self, language: &str, text: &str, copy_label: &str) -> std::io::Result<()> {
        let mut out = stdout();

        out.execute(SetForegroundColor(Color::DarkGrey))?
            .execute(Print(format!("┌── {} · {}\n", language, copy_label)))?
            .execute(ResetColor)?;

        let syntax = self
            .syntax_set
            .find_syntax_by_token(language)
            .or_else(|| self.syntax_set.find_syntax_by_extension(language))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());
        let theme = &self.theme_set.themes["base16-ocean.dark"];
        let mut highlighter = HighlightLines::new(syntax, theme);

        for line in LinesWithEndings::from(text) {
            out.execute(SetForegroundColor(Color::DarkGrey))?
                .execute(Print("│ "))?
                .execute(ResetColor)?;
            match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => print!("{}", as_24_bit_terminal_escaped(&ranges[..], false)),
                Err(_) => print!("{}", line),
            }
        }
        if !text.ends_with('\n') {
            println!();
        }

        out.execute(SetForegroundColor(Color::DarkGrey))?
            .execute(Print("└──\n"))?
            .execute(ResetColor)?;
        Ok(())
    }

    /// Line-oriented markdown pass over a prose segment.
    fn render_prose(&self, markup: &str) -> std::io::Result<()> {
        for line in markup.trim().lines() {
            self.render_markdown_line(line)?;
        }
        Ok(())
    }

    fn render_markdown_line(&self, line: &str) -> std::io::Result<()> {
        let mut out = stdout();

        if let Some(rest) = strip_heading(line) {
            out.execute(SetForegroundColor(Color::Cyan))?
                .execute(SetAttribute(Attribute::Bold))?
                .execute(Print(rest))?
                .execute(SetAttribute(Attribute::Reset))?
                .execute(ResetColor)?
                .execute(Print("\n"))?;
            return Ok(());
        }

        if line == "---" || line == "***" || line == "___" {
            out.execute(SetForegroundColor(Color::DarkGrey))?
                .execute(Print("─".repeat(40)))?
                .execute(ResetColor)?
                .execute(Print("\n"))?;
            return Ok(());
        }

        if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            out.execute(SetForegroundColor(Color::Yellow))?
                .execute(Print("• "))?
                .execute(ResetColor)?;
            self.print_spans(rest)?;
            return Ok(());
        }

        if let Some(rest) = line.strip_prefix("> ") {
            out.execute(SetForegroundColor(Color::DarkGrey))?
                .execute(Print("│ "))?
                .execute(ResetColor)?;
            self.print_spans(rest)?;
            return Ok(());
        }

        self.print_spans(line)
    }

    fn print_spans(&self, text: &str) -> std::io::Result<()> {
        let mut out = stdout();
        for span in inline_spans(text) {
            match span {
                InlineSpan::Plain(s) => {
                    out.execute(Print(s))?;
                }
                InlineSpan::Bold(s) => {
                    out.execute(SetAttribute(Attribute::Bold))?
                        .execute(Print(s))?
                        .execute(SetAttribute(Attribute::Reset))?;
                }
                InlineSpan::Italic(s) => {
                    out.execute(SetAttribute(Attribute::Italic))?
                        .execute(Print(s))?
                        .execute(SetAttribute(Attribute::Reset))?;
                }
                InlineSpan::Code(s) => {
                    out.execute(SetForegroundColor(Color::Magenta))?
                        .execute(Print(s))?
                        .execute(ResetColor)?;
                }
            }
        }
        out.execute(Print("\n"))?;
        Ok(())
    }
}

impl Default for TranscriptDisplay {
    fn default() -> Self {
        Self::new()
    }
}

/// First line of a collapsed section, capped at [`PREVIEW_MAX`]
/// characters, with an ellipsis when anything was cut.
fn collapse_preview(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    let first_line = content.lines().next().unwrap_or("");
    let truncated: String = first_line.chars().take(PREVIEW_MAX).collect();
    let cut = truncated.len() < first_line.len() || content.contains('\n');
    if cut {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

fn strip_heading(line: &str) -> Option<&str> {
    line.strip_prefix("### ")
        .or_else(|| line.strip_prefix("## "))
        .or_else(|| line.strip_prefix("# "))
}

/// One styled run of inline text.
#[derive(Debug, Clone, PartialEq, Eq)]
enum InlineSpan {
    Plain(String),
    Bold(String),
    Italic(String),
    Code(String),
}

/// Split a line into styled spans: `**bold**`, `*italic*` (or the
/// underscore forms) and `` `code` ``. An unterminated delimiter stays
/// literal.
fn inline_spans(text: &str) -> Vec<InlineSpan> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut i = 0;

    let flush = |spans: &mut Vec<InlineSpan>, plain: &mut String| {
        if !plain.is_empty() {
            spans.push(InlineSpan::Plain(std::mem::take(plain)));
        }
    };

    while i < chars.len() {
        let c = chars[i];
        if c == '`' {
            if let Some(end) = find_single(&chars, i + 1, '`') {
                flush(&mut spans, &mut plain);
                spans.push(InlineSpan::Code(chars[i + 1..end].iter().collect()));
                i = end + 1;
                continue;
            }
        } else if (c == '*' || c == '_') && chars.get(i + 1) == Some(&c) {
            if let Some(end) = find_double(&chars, i + 2, c) {
                flush(&mut spans, &mut plain);
                spans.push(InlineSpan::Bold(chars[i + 2..end].iter().collect()));
                i = end + 2;
                continue;
            }
        } else if c == '*' || c == '_' {
            if let Some(end) = find_single(&chars, i + 1, c) {
                flush(&mut spans, &mut plain);
                spans.push(InlineSpan::Italic(chars[i + 1..end].iter().collect()));
                i = end + 1;
                continue;
            }
        }
        plain.push(c);
        i += 1;
    }

    flush(&mut spans, &mut plain);
    spans
}

fn find_single(chars: &[char], from: usize, delim: char) -> Option<usize> {
    (from..chars.len()).find(|&j| chars[j] == delim)
}

fn find_double(chars: &[char], from: usize, delim: char) -> Option<usize> {
    (from..chars.len().saturating_sub(1)).find(|&j| chars[j] == delim && chars[j + 1] == delim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_preview_empty() {
        assert_eq!(collapse_preview(""), "");
    }

    #[test]
    fn test_collapse_preview_short_single_line() {
        assert_eq!(collapse_preview("quick thought"), "quick thought");
    }

    #[test]
    fn test_collapse_preview_multiline_gets_ellipsis() {
        assert_eq!(collapse_preview("first\nsecond"), "first...");
    }

    #[test]
    fn test_collapse_preview_long_line_truncated() {
        let long = "z".repeat(80);
        let preview = collapse_preview(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), PREVIEW_MAX + 3);
    }

    #[test]
    fn test_inline_spans_plain() {
        assert_eq!(
            inline_spans("just text"),
            vec![InlineSpan::Plain("just text".to_string())]
        );
    }

    #[test]
    fn test_inline_spans_mixed() {
        assert_eq!(
            inline_spans("a **b** `c` *d*"),
            vec![
                InlineSpan::Plain("a ".to_string()),
                InlineSpan::Bold("b".to_string()),
                InlineSpan::Plain(" ".to_string()),
                InlineSpan::Code("c".to_string()),
                InlineSpan::Plain(" ".to_string()),
                InlineSpan::Italic("d".to_string()),
            ]
        );
    }

    #[test]
    fn test_inline_spans_underscore_forms() {
        assert_eq!(
            inline_spans("__strong__ _soft_"),
            vec![
                InlineSpan::Bold("strong".to_string()),
                InlineSpan::Plain(" ".to_string()),
                InlineSpan::Italic("soft".to_string()),
            ]
        );
    }

    #[test]
    fn test_inline_spans_unterminated_delimiter_stays_literal() {
        assert_eq!(
            inline_spans("a `broken"),
            vec![InlineSpan::Plain("a `broken".to_string())]
        );
        assert_eq!(
            inline_spans("**alone"),
            vec![InlineSpan::Plain("**alone".to_string())]
        );
    }

    #[test]
    fn test_strip_heading() {
        assert_eq!(strip_heading("## Title"), Some("Title"));
        assert_eq!(strip_heading("plain"), None);
    }
}
