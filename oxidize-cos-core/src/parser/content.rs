//! Content stream parser
//!
//! Operands pile up until a keyword made of graphic characters shows up;
//! that keyword becomes an [`Operator`] owning them. Inline images
//! (`BI ... ID <data> EI`) are read in one go since their data is binary.

use super::objects::ObjectParser;
use super::operators::{Nesting, OpCode};
use super::tokenizer::{is_delimiter, is_whitespace, TokenKind, Tokenizer};
use super::{ParseError, ParseOptions, ParseResult};
use crate::objects::{Content, Node, NodeRef, Operator, Stream};
use tracing::{debug, warn};

pub struct ContentParser<'a> {
    parser: ObjectParser<'a>,
    /// Open `BX` sections; unknown operators are expected inside them.
    compat_depth: usize,
}

impl<'a> ContentParser<'a> {
    pub fn new(content: &'a [u8]) -> Self {
        Self::with_options(content, ParseOptions::default())
    }

    pub fn with_options(content: &'a [u8], options: ParseOptions) -> Self {
        let mut parser = ObjectParser::with_options(content, options);
        parser.tokens().keep_comments();
        Self {
            parser,
            compat_depth: 0,
        }
    }

    /// Parse a content stream with default options.
    pub fn parse(content: &[u8]) -> ParseResult<Content> {
        ContentParser::new(content).parse_content()
    }

    pub fn parse_content(&mut self) -> ParseResult<Content> {
        let mut content = Content::new();
        let mut operands: Vec<NodeRef> = Vec::new();
        let mut pending_comments: Vec<&[u8]> = Vec::new();

        loop {
            let token = self.parser.tokens().peek(1);
            // only the comments that sit before the next token, however far
            // the lookahead has scanned
            while let Some(comment) = self.parser.tokens().take_comment_before(token.start) {
                match content.last_mut() {
                    Some(last) if operands.is_empty() && pending_comments.is_empty() => {
                        last.push_comment(comment)
                    }
                    _ => pending_comments.push(comment),
                }
            }

            match token.kind {
                TokenKind::Done => break,
                TokenKind::Word if is_operator(self.parser.tokens().text(token)) => {
                    self.parser.tokens().shift();
                    let name = String::from_utf8_lossy(self.parser.tokens().text(token)).into_owned();
                    if name == "BI" {
                        operands.push(self.parse_inline_image()?.into_ref());
                    }

                    let mut op = Operator::new(name, std::mem::take(&mut operands));
                    for comment in pending_comments.drain(..) {
                        op.push_comment(comment);
                    }
                    self.check_operator(&op, token.start)?;
                    content.push(op);
                }
                _ => match self.parser.parse_object() {
                    Ok(node) => operands.push(node.into_ref()),
                    Err(ParseError::UnknownWord { position, word })
                        if self.parser.options().lenient_syntax =>
                    {
                        warn!("Skipping unknown keyword '{}' at position {}", word, position);
                    }
                    Err(err) => return Err(err),
                },
            }
        }

        if !operands.is_empty() {
            let position = self.parser.position();
            if !self.parser.options().lenient_syntax {
                return Err(ParseError::SyntaxError {
                    position,
                    message: format!("{} operands without an operator", operands.len()),
                });
            }
            warn!(
                "Dropping {} trailing operands without an operator",
                operands.len()
            );
        }

        debug!("Parsed content stream with {} operators", content.len());
        Ok(content)
    }

    fn check_operator(&mut self, op: &Operator, position: usize) -> ParseResult<()> {
        match op.opcode().nesting() {
            Nesting::Open if op.opcode() == OpCode::BeginCompat => self.compat_depth += 1,
            Nesting::Close if op.opcode() == OpCode::EndCompat => {
                self.compat_depth = self.compat_depth.saturating_sub(1)
            }
            _ => {}
        }

        if op.opcode() == OpCode::Unknown && self.compat_depth > 0 {
            return Ok(());
        }

        if let Err(message) = op.opcode().check(op.arguments()) {
            if !self.parser.options().lenient_syntax {
                return Err(ParseError::InvalidOperands {
                    position,
                    operator: op.name().to_string(),
                    message,
                });
            }
            warn!(
                "Invalid operands for '{}' at position {}: {}",
                op.name(),
                position,
                message
            );
        }
        Ok(())
    }

    /// Reads the rest of an inline image after the `BI` keyword.
    fn parse_inline_image(&mut self) -> ParseResult<Node> {
        let dict_start = self.parser.tokens().next_start();
        let (items, id) = self.parser.parse_until(b"ID")?;
        let dict = self.parser.pair_entries(items, dict_start)?;

        let lenient = self.parser.options().lenient_syntax;
        let tokens = self.parser.tokens();
        let buf = tokens.buffer();
        let mut data_start = id.end();
        match buf.get(data_start) {
            Some(&ch) if is_whitespace(ch) => data_start += 1,
            _ => {
                return Err(ParseError::SyntaxError {
                    position: data_start,
                    message: "ID must be followed by a single whitespace".to_string(),
                })
            }
        }

        let declared = dict
            .get("Length")
            .or_else(|| dict.get("L"))
            .and_then(|v| v.as_integer())
            .and_then(|len| usize::try_from(len).ok());

        let (data_end, resume) = match declared {
            Some(len) => {
                let data_end = data_start
                    .checked_add(len)
                    .filter(|&end| end <= buf.len())
                    .ok_or_else(|| ParseError::UnexpectedEof {
                        position: buf.len(),
                        expected: "inline image data".to_string(),
                    })?;
                tokens.seek(data_end);
                let ei = tokens.peek(1);
                if !tokens.is_word(ei, b"EI") {
                    return Err(ParseError::UnexpectedToken {
                        position: ei.start,
                        expected: "EI".to_string(),
                        found: String::from_utf8_lossy(tokens.text(ei)).into_owned(),
                    });
                }
                (data_end, ei.end())
            }
            None => match find_inline_image_end(buf, data_start - 1) {
                Some((ws, after)) => (ws.max(data_start), after),
                None if lenient => {
                    warn!(
                        "Inline image at position {} has no EI, taking the rest of the stream",
                        id.start
                    );
                    (buf.len(), buf.len())
                }
                None => {
                    return Err(ParseError::UnexpectedEof {
                        position: buf.len(),
                        expected: "EI".to_string(),
                    })
                }
            },
        };

        let data = buf[data_start..data_end].to_vec();
        tokens.seek(resume);
        debug!("Read inline image with {} data bytes", data.len());
        Ok(Node::InlineImage(Stream::new(dict, data)))
    }
}

/// Keywords made of graphic characters, other than the object keywords.
fn is_operator(text: &[u8]) -> bool {
    !text.is_empty()
        && text.iter().all(|ch| (b'!'..=b'~').contains(ch))
        && !matches!(text, b"true" | b"false" | b"null")
}

/// Whether a terminator scan over `data` would stop inside it.
pub(crate) fn hides_inline_image_end(data: &[u8]) -> bool {
    let mut framed = Vec::with_capacity(data.len() + 1);
    framed.push(b' ');
    framed.extend_from_slice(data);
    find_inline_image_end(&framed, 0).is_some()
}

/// Finds a whitespace byte followed by `EI` that re-tokenizes as exactly
/// that keyword. Returns the whitespace position and the position after `EI`.
fn find_inline_image_end(buf: &[u8], from: usize) -> Option<(usize, usize)> {
    (from..buf.len()).find_map(|pos| {
        if !is_whitespace(buf[pos]) || !buf[pos + 1..].starts_with(b"EI") {
            return None;
        }
        let mut tokens = Tokenizer::new(buf);
        tokens.seek(pos + 1);
        let token = tokens.peek(1);
        let exact = token.kind == TokenKind::Word
            && token.start == pos + 1
            && tokens.text(token) == b"EI";
        let boundary = buf
            .get(token.end())
            .map_or(true, |&ch| is_whitespace(ch) || is_delimiter(ch));
        (exact && boundary).then(|| (pos, token.end()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(content: &Content) -> Vec<&str> {
        content.iter().map(Operator::name).collect()
    }

    #[test]
    fn test_simple_path() {
        let content = ContentParser::parse(b"10 20 m 30 40 l S").unwrap();
        assert_eq!(names(&content), vec!["m", "l", "S"]);
        assert_eq!(content.operators()[0].opcode(), OpCode::MoveTo);
        assert_eq!(content.operators()[0].operands().len(), 2);
        assert!(content.operators()[2].operands().is_empty());
    }

    #[test]
    fn test_text_object() {
        let content =
            ContentParser::parse(b"BT /F1 12 Tf 72 712 Td (Hello) Tj [(A) -120 (B)] TJ ET")
                .unwrap();
        assert_eq!(names(&content), vec!["BT", "Tf", "Td", "Tj", "TJ", "ET"]);
        assert!(content.iter().all(Operator::is_valid));
    }

    #[test]
    fn test_quote_operators() {
        let content = ContentParser::parse(b"(line) ' 1 2 (spaced) \"").unwrap();
        assert_eq!(names(&content), vec!["'", "\""]);
        assert_eq!(content.operators()[1].operands().len(), 3);
    }

    #[test]
    fn test_marked_content() {
        let content = ContentParser::parse(b"/Span << /MCID 0 >> BDC (x) Tj EMC").unwrap();
        assert_eq!(names(&content), vec!["BDC", "Tj", "EMC"]);
        assert!(content.operators()[0].operands()[1].as_dict().is_some());
    }

    #[test]
    fn test_booleans_are_operands() {
        let content = ContentParser::parse(b"true false null MP").unwrap();
        assert_eq!(content.operators()[0].operands().len(), 3);
    }

    #[test]
    fn test_invalid_operands_lenient() {
        let content = ContentParser::parse(b"1 2 re").unwrap();
        assert_eq!(content.len(), 1);
        assert!(!content.operators()[0].is_valid());
    }

    #[test]
    fn test_invalid_operands_strict() {
        let result = ContentParser::with_options(b"1 2 re", ParseOptions::strict()).parse_content();
        match result {
            Err(ParseError::InvalidOperands { operator, position, .. }) => {
                assert_eq!(operator, "re");
                assert_eq!(position, 4);
            }
            other => panic!("expected invalid operands, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_operator_in_compat_section() {
        let strict = ParseOptions::strict();
        let ok = ContentParser::with_options(b"BX 1 foo EX", strict).parse_content();
        assert_eq!(ok.unwrap().len(), 3);

        let err = ContentParser::with_options(b"1 foo", strict).parse_content();
        assert!(matches!(err, Err(ParseError::InvalidOperands { .. })));
    }

    #[test]
    fn test_trailing_operands() {
        let lenient = ContentParser::parse(b"q 1 2").unwrap();
        assert_eq!(lenient.len(), 1);

        let strict = ContentParser::with_options(b"q 1 2", ParseOptions::strict()).parse_content();
        assert!(matches!(strict, Err(ParseError::SyntaxError { .. })));
    }

    #[test]
    fn test_comments_follow_operators() {
        let content = ContentParser::parse(b"q % save\n1 0 0 1 0 0 cm %move\n%again\nQ").unwrap();
        assert_eq!(names(&content), vec!["q", "cm", "Q"]);

        let save = &content.operators()[0];
        assert_eq!(save.comments().len(), 1);
        assert!(save.arguments().is_empty());

        let cm = &content.operators()[1];
        assert_eq!(cm.arguments().len(), 6);
        let texts: Vec<&[u8]> = cm
            .comments()
            .iter()
            .filter_map(|c| match &**c {
                Node::Comment(text) => Some(text.as_slice()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec![&b"move"[..], &b"again"[..]]);
        assert!(cm.is_valid());
    }

    #[test]
    fn test_comments_seen_by_lookahead_are_kept() {
        // "1 2" and "1 0" make the parser look three tokens ahead, past the
        // comment, while checking for a reference
        let content = ContentParser::parse(b"1 2 %keep\n3 4 re").unwrap();
        let re = &content.operators()[0];
        assert_eq!(re.arguments().len(), 4);
        assert_eq!(re.comments().len(), 1);
        assert!(matches!(&*re.comments()[0], Node::Comment(text) if text == b"keep"));

        let content = ContentParser::parse(b"q 1 0 %keep\n0 1 0 0 cm Q").unwrap();
        assert_eq!(names(&content), vec!["q", "cm", "Q"]);
        assert!(content.operators()[0].comments().is_empty());
        assert_eq!(content.operators()[1].arguments().len(), 6);
        assert_eq!(content.operators()[1].comments().len(), 1);
    }

    #[test]
    fn test_comment_after_last_operator() {
        let content = ContentParser::parse(b"q Q %done").unwrap();
        assert_eq!(content.operators()[1].comments().len(), 1);
    }

    #[test]
    fn test_inline_image_scan() {
        let input = b"q BI /W 2 /H 1 /BPC 8 /CS /G ID \x00EI\xFF\nEI Q";
        let content = ContentParser::parse(input).unwrap();
        assert_eq!(names(&content), vec!["q", "BI", "Q"]);

        let image = content.operators()[1].operands()[0].as_stream().unwrap();
        assert_eq!(image.data(), Some(&b"\x00EI\xFF"[..]));
        assert_eq!(
            image.dictionary().get("W").and_then(|v| v.as_integer()),
            Some(2)
        );
        assert!(content.operators()[1].is_valid());
    }

    #[test]
    fn test_inline_image_ei_must_stand_alone() {
        // " EIX" does not tokenize as EI
        let input = b"BI /W 1 ID ab EIX\nEI";
        let content = ContentParser::parse(input).unwrap();
        let image = content.operators()[0].operands()[0].as_stream().unwrap();
        assert_eq!(image.data(), Some(&b"ab EIX"[..]));
    }

    #[test]
    fn test_hidden_inline_image_end() {
        assert!(hides_inline_image_end(b"ab EI cd"));
        assert!(hides_inline_image_end(b"EI\x00"));
        assert!(hides_inline_image_end(b"ab\nEI"));
        assert!(!hides_inline_image_end(b"abEI EIX"));
        assert!(!hides_inline_image_end(b""));
    }

    #[test]
    fn test_inline_image_with_length() {
        let input = b"BI /L 4 ID a\nEIEI Q";
        let content = ContentParser::parse(input).unwrap();
        assert_eq!(names(&content), vec!["BI", "Q"]);
        let image = content.operators()[0].operands()[0].as_stream().unwrap();
        assert_eq!(image.data(), Some(&b"a\nEI"[..]));
    }

    #[test]
    fn test_inline_image_errors() {
        assert!(ContentParser::parse(b"BI /W 1 ID").is_err());
        assert!(ContentParser::parse(b"BI /W ID x EI").is_err());
        assert!(ContentParser::parse(b"BI /W 1").is_err());
    }

    #[test]
    fn test_inline_image_without_ei() {
        let lenient = ContentParser::parse(b"BI /W 1 ID abc").unwrap();
        let image = lenient.operators()[0].operands()[0].as_stream().unwrap();
        assert_eq!(image.data(), Some(&b"abc"[..]));

        let strict =
            ContentParser::with_options(b"BI /W 1 ID abc", ParseOptions::strict()).parse_content();
        assert!(matches!(strict, Err(ParseError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_unknown_word_skipped_when_lenient() {
        let input = b"q \x01 Q";
        let lenient = ContentParser::parse(input).unwrap();
        assert_eq!(names(&lenient), vec!["q", "Q"]);

        let strict = ContentParser::with_options(input, ParseOptions::strict()).parse_content();
        assert!(matches!(strict, Err(ParseError::UnknownWord { .. })));
    }
}
