//! Delimiter-joined segment codec.
//!
//! Store keys (`GUILD#42`, `MESSAGE#7#Chess#99`) and the opaque identifiers
//! carried through buttons and menus are both built from segments joined with
//! [`DELIMITER`]. Segment values are escaped so that free text supplied by users
//! (activity names) can never split into extra segments:
//!
//! - `%` becomes `%25`
//! - `#` becomes `%23`
//!
//! Escaping is applied per character, so the escaped form of a prefix is always a
//! prefix of the escaped form of the full value. Prefix scans over escaped keys
//! therefore behave like prefix scans over the raw values.

use std::borrow::Cow;

use thiserror::Error;

pub const DELIMITER: char = '#';
const ESCAPE: char = '%';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    #[error("invalid escape sequence in segment '{0}'")]
    InvalidEscape(String),
}

/// Escapes a single segment value.
pub fn escape_segment(value: &str) -> Cow<'_, str> {
    if !value.contains([DELIMITER, ESCAPE]) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        match c {
            ESCAPE => escaped.push_str("%25"),
            DELIMITER => escaped.push_str("%23"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Reverses [`escape_segment`].
pub fn unescape_segment(segment: &str) -> Result<String, SegmentError> {
    if !segment.contains(ESCAPE) {
        return Ok(segment.to_string());
    }

    let mut value = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(idx) = rest.find(ESCAPE) {
        value.push_str(&rest[..idx]);
        let code = rest.get(idx + 1..idx + 3);
        match code {
            Some("25") => value.push(ESCAPE),
            Some("23") => value.push(DELIMITER),
            _ => return Err(SegmentError::InvalidEscape(segment.to_string())),
        }
        rest = &rest[idx + 3..];
    }
    value.push_str(rest);
    Ok(value)
}

/// Escapes every segment and joins them with [`DELIMITER`].
pub fn join_segments<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for (i, segment) in segments.into_iter().enumerate() {
        if i > 0 {
            joined.push(DELIMITER);
        }
        joined.push_str(&escape_segment(segment.as_ref()));
    }
    joined
}

/// Splits on [`DELIMITER`] and unescapes every segment.
pub fn split_segments(joined: &str) -> Result<Vec<String>, SegmentError> {
    joined.split(DELIMITER).map(unescape_segment).collect()
}
