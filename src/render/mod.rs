//! Reply rendering pipeline.
//!
//! Turns one raw backend reply into an ordered, structured
//! [`RenderedMessage`]: an optional collapsed reasoning block, an
//! optional collapsed sources block, then literal code and markup
//! prose in original order. Stateless and infallible; a reply is
//! re-parsed from scratch every time it is displayed.

mod parser;
mod segment;

pub use parser::{MessageRenderer, RegionSet};
pub use segment::{
    source_preview, RenderedMessage, Segment, DEFAULT_LANGUAGE, SOURCES_PARSE_ERROR,
    SOURCE_PREVIEW_MAX,
};
