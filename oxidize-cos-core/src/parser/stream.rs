//! Stream payload boundaries
//!
//! `/Length` is often wrong, and a payload can contain the bytes `endstream`.
//! The terminator is therefore searched from the end of the buffer backwards,
//! preferring the occurrence preceded by the same end-of-line sequence that
//! followed the `stream` keyword.

use super::{ParseError, ParseResult};
use crate::objects::NewlineStyle;
use std::ops::Range;
use tracing::debug;

const ENDSTREAM: &[u8] = b"endstream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadBounds {
    /// Payload bytes, without the end-of-line before `endstream`.
    pub data: Range<usize>,
    /// Position just past the `endstream` keyword.
    pub end: usize,
}

/// Locates the payload that starts at `start` in `source`.
///
/// A `length` hint is used only when `endstream` follows it, possibly after
/// one end-of-line.
pub fn locate_payload(
    source: &[u8],
    start: usize,
    newline: NewlineStyle,
    length: Option<usize>,
) -> ParseResult<PayloadBounds> {
    if start > source.len() {
        return Err(ParseError::UnexpectedEof {
            position: source.len(),
            expected: "stream data".to_string(),
        });
    }

    if let Some(length) = length {
        match bounds_from_length(source, start, length) {
            Some(bounds) => return Ok(bounds),
            None => debug!(
                "Ignoring /Length {} for stream at offset {}, no endstream there",
                length, start
            ),
        }
    }

    let eol = newline.as_bytes();
    let styled = candidates(source, start)
        .find(|&pos| pos >= start + eol.len() && source[..pos].ends_with(eol));
    if let Some(pos) = styled {
        return Ok(PayloadBounds {
            data: start..pos - eol.len(),
            end: pos + ENDSTREAM.len(),
        });
    }

    match candidates(source, start).next() {
        Some(pos) => {
            debug!(
                "endstream at {} is not preceded by the stream's line ending",
                pos
            );
            let payload = &source[start..pos];
            let trailing = if payload.ends_with(b"\r\n") {
                2
            } else if payload.ends_with(b"\n") || payload.ends_with(b"\r") {
                1
            } else {
                0
            };
            Ok(PayloadBounds {
                data: start..pos - trailing,
                end: pos + ENDSTREAM.len(),
            })
        }
        None => Err(ParseError::UnexpectedEof {
            position: source.len(),
            expected: "endstream".to_string(),
        }),
    }
}

fn bounds_from_length(source: &[u8], start: usize, length: usize) -> Option<PayloadBounds> {
    let data_end = start.checked_add(length)?;
    let rest = source.get(data_end..)?;
    let skip = if rest.starts_with(b"\r\n") {
        2
    } else if rest.starts_with(b"\n") || rest.starts_with(b"\r") {
        1
    } else {
        0
    };
    rest[skip..].starts_with(ENDSTREAM).then(|| PayloadBounds {
        data: start..data_end,
        end: data_end + skip + ENDSTREAM.len(),
    })
}

/// Positions of `endstream` at or after `start`, last one first.
fn candidates(source: &[u8], start: usize) -> impl Iterator<Item = usize> + '_ {
    let last = source.len().saturating_sub(ENDSTREAM.len());
    (start..=last)
        .rev()
        .filter(move |&pos| source[pos..].starts_with(ENDSTREAM))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn payload<'a>(source: &'a [u8], bounds: &PayloadBounds) -> &'a [u8] {
        &source[bounds.data.clone()]
    }

    #[test]
    fn test_simple_lf() {
        let source = b"stream\nabc\nendstream";
        let bounds = locate_payload(source, 7, NewlineStyle::Lf, None).unwrap();
        assert_eq!(payload(source, &bounds), b"abc");
        assert_eq!(bounds.end, source.len());
    }

    #[test]
    fn test_crlf_with_embedded_endstream() {
        let source = b"stream\r\nxx\nendstream yy\r\nendstream\r\nendobj";
        let bounds = locate_payload(source, 8, NewlineStyle::CrLf, None).unwrap();
        assert_eq!(payload(source, &bounds), b"xx\nendstream yy");
    }

    #[test]
    fn test_prefers_matching_line_ending() {
        // the trailing occurrence in the comment is not preceded by CRLF
        let source = b"stream\r\nAB\r\nendstream\nendobj % endstream";
        let bounds = locate_payload(source, 8, NewlineStyle::CrLf, None).unwrap();
        assert_eq!(payload(source, &bounds), b"AB");
        assert_eq!(&source[bounds.end..bounds.end + 1], b"\n");
    }

    #[test]
    fn test_falls_back_to_any_occurrence() {
        let source = b"stream\r\nAB\nendstream";
        let bounds = locate_payload(source, 8, NewlineStyle::CrLf, None).unwrap();
        assert_eq!(payload(source, &bounds), b"AB");

        let source = b"stream\nABendstream";
        let bounds = locate_payload(source, 7, NewlineStyle::Lf, None).unwrap();
        assert_eq!(payload(source, &bounds), b"AB");
    }

    #[test]
    fn test_empty_payload() {
        let source = b"stream\r\nendstream";
        let bounds = locate_payload(source, 8, NewlineStyle::CrLf, None).unwrap();
        assert_eq!(bounds.data, 8..8);
    }

    #[test]
    fn test_length_hint() {
        let source = b"stream\nab\nendstream\nendstream";
        let bounds = locate_payload(source, 7, NewlineStyle::Lf, Some(2)).unwrap();
        assert_eq!(payload(source, &bounds), b"ab");
        assert_eq!(bounds.end, 19);
    }

    #[test]
    fn test_wrong_length_hint_is_ignored() {
        let source = b"stream\nabcdef\nendstream";
        let bounds = locate_payload(source, 7, NewlineStyle::Lf, Some(2)).unwrap();
        assert_eq!(payload(source, &bounds), b"abcdef");

        let bounds = locate_payload(source, 7, NewlineStyle::Lf, Some(1000)).unwrap();
        assert_eq!(payload(source, &bounds), b"abcdef");
    }

    #[test]
    fn test_missing_endstream() {
        let result = locate_payload(b"stream\nabc", 7, NewlineStyle::Lf, None);
        assert!(matches!(result, Err(ParseError::UnexpectedEof { .. })));

        let result = locate_payload(b"abc", 10, NewlineStyle::Lf, None);
        assert!(result.is_err());
    }
}
