//! Camera directives embedded in agent replies.
//!
//! The agent may place one marker anywhere in its reply text:
//!
//! ```text
//! [VIEW: {"target_id": "SHP-001"}]
//! [VIEW: {"lat": 51.9, "lng": 4.5, "zoom": 8}]
//! ```
//!
//! Grammar: the literal `[VIEW:`, optional whitespace, a brace-balanced JSON
//! object (braces inside strings are ignored), optional whitespace, `]`.
//! Only the first marker that opens an object is considered. If that object
//! never closes into `}]`, the reply carries no directive at all.

use serde_json::Value;
use thiserror::Error;

use crate::types::{DEFAULT_DIRECTIVE_ZOOM, ViewDirective};

const MARKER_OPEN: &str = "[VIEW:";

/// Why a marker did not yield a directive.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DirectiveIssue {
    /// Marker left in the display text.
    #[error("directive payload is not valid JSON: {0}")]
    InvalidJson(String),

    /// Marker stripped, nothing to act on.
    #[error("directive has neither a target_id nor numeric lat/lng")]
    Unclassified,
}

/// A reply split into what to show and what to do.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub text: String,
    pub directive: Option<ViewDirective>,
    pub issue: Option<DirectiveIssue>,
}

impl ParsedReply {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            directive: None,
            issue: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MarkerSpan {
    start: usize,
    end: usize,
    payload_start: usize,
    payload_end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Complete(MarkerSpan),
    Unterminated,
}

#[derive(Debug, Clone, Copy)]
pub struct DirectiveParser {
    default_zoom: f64,
}

impl Default for DirectiveParser {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTIVE_ZOOM)
    }
}

impl DirectiveParser {
    /// `default_zoom` applies to coordinate directives without a zoom.
    pub fn new(default_zoom: f64) -> Self {
        Self { default_zoom }
    }

    /// Split an agent reply into display text and an optional directive.
    ///
    /// Never fails: every problem degrades to "no directive".
    pub fn parse(&self, text: &str) -> ParsedReply {
        let span = match find_marker(text) {
            None => return ParsedReply::plain(text),
            Some(Scan::Unterminated) => {
                return ParsedReply {
                    text: text.to_string(),
                    directive: None,
                    issue: Some(DirectiveIssue::InvalidJson(
                        "directive object is not closed by `}]`".to_string(),
                    )),
                };
            }
            Some(Scan::Complete(span)) => span,
        };

        let payload = &text[span.payload_start..span.payload_end];
        let value: Value = match serde_json::from_str(payload) {
            Ok(v) => v,
            Err(e) => {
                return ParsedReply {
                    text: text.to_string(),
                    directive: None,
                    issue: Some(DirectiveIssue::InvalidJson(e.to_string())),
                };
            }
        };

        let stripped = format!("{}{}", &text[..span.start], &text[span.end..]);
        match self.classify(&value) {
            Some(directive) => ParsedReply {
                text: stripped,
                directive: Some(directive),
                issue: None,
            },
            None => ParsedReply {
                text: stripped,
                directive: None,
                issue: Some(DirectiveIssue::Unclassified),
            },
        }
    }

    fn classify(&self, value: &Value) -> Option<ViewDirective> {
        let obj = value.as_object()?;

        if let Some(target_id) = obj
            .get("target_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
        {
            return Some(ViewDirective::ByEntityId {
                target_id: target_id.to_string(),
            });
        }

        let lat = obj.get("lat").and_then(Value::as_f64)?;
        let lng = obj.get("lng").and_then(Value::as_f64)?;
        let zoom = obj
            .get("zoom")
            .and_then(Value::as_f64)
            .unwrap_or(self.default_zoom);

        Some(ViewDirective::ByCoordinates { lat, lng, zoom })
    }
}

/// Parse with the default coordinate zoom.
pub fn parse_reply(text: &str) -> ParsedReply {
    DirectiveParser::default().parse(text)
}

/// First `[VIEW:` that opens an object. Markers without an object are skipped.
fn find_marker(text: &str) -> Option<Scan> {
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find(MARKER_OPEN) {
        let start = search_from + offset;
        let after_open = start + MARKER_OPEN.len();
        if let Some(scan) = marker_at(text, start, after_open) {
            return Some(scan);
        }
        search_from = after_open;
    }

    None
}

fn marker_at(text: &str, start: usize, after_open: usize) -> Option<Scan> {
    let payload_start = skip_whitespace(text, after_open);
    if !text[payload_start..].starts_with('{') {
        return None;
    }

    let Some(payload_end) = object_end(text, payload_start) else {
        return Some(Scan::Unterminated);
    };
    let close = skip_whitespace(text, payload_end);
    if !text[close..].starts_with(']') {
        return Some(Scan::Unterminated);
    }

    Some(Scan::Complete(MarkerSpan {
        start,
        end: close + 1,
        payload_start,
        payload_end,
    }))
}

fn skip_whitespace(text: &str, from: usize) -> usize {
    text[from..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| from + i)
        .unwrap_or(text.len())
}

/// Byte index just past the `}` closing the object that opens at `open`.
fn object_end(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[open..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i + 1);
                }
            }
            _ => {}
        }
    }

    None
}
