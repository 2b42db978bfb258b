//! Inline markup embedded in dialogue text.
//!
//! Two families of tags share the `<name ...>` syntax:
//! - **Native** tags (`<b>`, `<color=#fff>`, ...) belong to the host text renderer and
//!   pass through to the display text untouched.
//! - **Custom** tags (`<wait=0.5/>`, `<gradient=#f00,#00f>...</gradient>`) are stripped
//!   from the display text and returned as [`TagInstance`]s positioned in display-text
//!   character coordinates.
//!
//! Spans that do not form a valid tag, or whose name is unknown, are ordinary text.

mod effects;
mod parser;
mod registry;

use miette::Diagnostic;
use thiserror::Error;

pub use effects::{GradientSpan, Rgba, TextEffects, WaitPoint};
pub use parser::{
    scan_tag, Attribute, AttributeIter, ParsedText, RawTag, Scan, TagBoundary, TagInstance,
    TagParser,
};
pub use registry::{CustomTagDef, TagBehavior, TagRegistry, TagShape, TagVariant, NATIVE_TAGS};

/// Malformed markup. Offsets are byte offsets into the source text.
#[derive(Clone, Debug, PartialEq, Eq, Error, Diagnostic)]
pub enum TagError {
    #[error("unterminated quoted value in tag `{tag}` at byte {offset}")]
    #[diagnostic(
        code(ds::tag::unterminated_quote),
        help("Close the quote before the tag's `>`")
    )]
    UnterminatedQuote { tag: String, offset: usize },

    #[error("invalid attribute name `{attribute}` in tag `{tag}` at byte {offset}")]
    #[diagnostic(
        code(ds::tag::attribute_name),
        help("Attribute names may only contain letters and `-`")
    )]
    InvalidAttributeName {
        tag: String,
        attribute: String,
        offset: usize,
    },

    #[error("empty attribute value in tag `{tag}` at byte {offset}")]
    #[diagnostic(code(ds::tag::empty_value))]
    EmptyAttributeValue { tag: String, offset: usize },

    #[error("closing tag `{tag}` at byte {offset} has no matching opening tag")]
    #[diagnostic(code(ds::tag::unmatched_end))]
    UnmatchedEnd { tag: String, offset: usize },

    #[error("tag `{tag}` at byte {offset} must be written as a {expected} tag")]
    #[diagnostic(code(ds::tag::shape), help("Span tags use <tag>..</tag>, single tags use <tag/>"))]
    ShapeMismatch {
        tag: String,
        expected: TagShape,
        offset: usize,
    },

    #[error("invalid parameter `{parameter}` for tag `{tag}`: {reason}")]
    #[diagnostic(code(ds::tag::parameter))]
    InvalidParameter {
        tag: String,
        parameter: String,
        reason: String,
    },

    #[error("tag name `{tag}` is reserved by the text renderer")]
    #[diagnostic(code(ds::tag::reserved_name))]
    ReservedName { tag: String },
}
