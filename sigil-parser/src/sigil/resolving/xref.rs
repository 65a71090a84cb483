//! Link text for cross references
//!
//! ```text
//! full:   Section 2. "Getting started"
//! short:  Getting started
//! ```
//!
//! A full style target without a caption prefix or number falls back to its bare title.

use crate::sigil::index::IdRecord;
use crate::sigil::registry::XrefStyle;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XrefError {
    UnknownTarget(String),
    UnknownStyle(String),
    EmptyBody,
    TitleTargetNotHeader(String),
}

impl fmt::Display for XrefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XrefError::UnknownTarget(id) => write!(f, "cross reference to unknown id: \"{}\"", id),
            XrefError::UnknownStyle(style) => {
                write!(f, "unknown cross reference style: \"{}\"", style)
            }
            XrefError::EmptyBody => write!(f, "empty cross reference body"),
            XrefError::TitleTargetNotHeader(id) => write!(
                f,
                "cross reference inside a header title must target a header: \"{}\"",
                id
            ),
        }
    }
}

impl std::error::Error for XrefError {}

/// Parse an explicit `style` argument, empty meaning "use the target's default"
pub fn parse_style(text: &str) -> Result<Option<XrefStyle>, XrefError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<XrefStyle>()
        .map(Some)
        .map_err(|_| XrefError::UnknownStyle(text.to_string()))
}

/// Plain text for a link to `record`
pub fn link_text(record: &IdRecord, style: XrefStyle) -> Result<String, XrefError> {
    let title = record.title.trim();
    let number = match (style, record.count) {
        (XrefStyle::Full, Some(count)) if !record.caption_prefix.is_empty() => {
            Some(format!("{} {}", record.caption_prefix, count))
        }
        _ => None,
    };
    let text = match (number, title.is_empty()) {
        (Some(number), false) => format!("{}. \"{}\"", number, title),
        (Some(number), true) => number,
        (None, _) => title.to_string(),
    };
    if text.is_empty() {
        Err(XrefError::EmptyBody)
    } else {
        Ok(text)
    }
}
