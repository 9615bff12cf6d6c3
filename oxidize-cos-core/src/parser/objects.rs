//! Object parser
//!
//! Builds [`Node`] values from the token stream. Strings are decoded straight
//! from the buffer since their bodies are not token-shaped.

use super::tokenizer::{is_whitespace, Token, TokenKind, Tokenizer};
use super::{ParseError, ParseOptions, ParseResult, StreamLoading};
use crate::objects::{Dictionary, IndirectObject, Name, NewlineStyle, Node, ObjectId, Stream};
use tracing::{debug, trace};

pub struct ObjectParser<'a> {
    tokens: Tokenizer<'a>,
    options: ParseOptions,
    depth: usize,
}

impl<'a> ObjectParser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_options(buf, ParseOptions::default())
    }

    pub fn with_options(buf: &'a [u8], options: ParseOptions) -> Self {
        Self {
            tokens: Tokenizer::new(buf),
            options,
            depth: 0,
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub(crate) fn tokens(&mut self) -> &mut Tokenizer<'a> {
        &mut self.tokens
    }

    pub fn position(&self) -> usize {
        self.tokens.position()
    }

    /// Whether only whitespace and comments remain.
    pub fn at_end(&mut self) -> bool {
        self.tokens.peek(1).kind == TokenKind::Done
    }

    pub fn parse_object(&mut self) -> ParseResult<Node> {
        let token = self.tokens.peek(1);
        match token.kind {
            TokenKind::Integer => {
                if let Some(id) = self.reference_ahead()? {
                    self.tokens.advance();
                    return Ok(Node::Reference(id));
                }
                self.tokens.shift();
                match self.read_integer(token) {
                    Some(value) => Ok(Node::Integer(value)),
                    None => {
                        debug!(
                            "Integer at position {} does not fit 64 bits, reading it as a real",
                            token.start
                        );
                        Ok(Node::Real(self.read_real(token)))
                    }
                }
            }
            TokenKind::Real => {
                self.tokens.shift();
                Ok(Node::Real(self.read_real(token)))
            }
            TokenKind::Name => {
                self.tokens.shift();
                Ok(Node::Name(self.read_name(token)?))
            }
            TokenKind::Word => {
                self.tokens.shift();
                match self.tokens.text(token) {
                    b"true" => Ok(Node::Boolean(true)),
                    b"false" => Ok(Node::Boolean(false)),
                    b"null" => Ok(Node::Null),
                    word => Err(ParseError::UnknownWord {
                        position: token.start,
                        word: String::from_utf8_lossy(word).into_owned(),
                    }),
                }
            }
            TokenKind::Delimiter => {
                self.tokens.shift();
                match self.tokens.text(token) {
                    b"[" => self.nested(|p| p.parse_array()),
                    b"<<" => self.nested(|p| p.parse_dictionary()).map(Node::Dictionary),
                    b"(" => self.parse_literal_string(token.end()),
                    b"<" => self.parse_hex_string(token.end()),
                    other => Err(ParseError::UnexpectedToken {
                        position: token.start,
                        expected: "object".to_string(),
                        found: String::from_utf8_lossy(other).into_owned(),
                    }),
                }
            }
            TokenKind::Done | TokenKind::Start => Err(ParseError::UnexpectedEof {
                position: token.start,
                expected: "object".to_string(),
            }),
        }
    }

    /// Parses `<num> <gen> obj`, one object, and `endobj`.
    ///
    /// A dictionary followed by `stream` and an end-of-line becomes a stream,
    /// which ends the indirect object without needing `endobj`.
    pub fn parse_indirect_object(&mut self) -> ParseResult<IndirectObject> {
        let (number, generation, keyword) =
            (self.tokens.peek(1), self.tokens.peek(2), self.tokens.peek(3));
        if !(self.tokens.is_uint(number)
            && self.tokens.is_uint(generation)
            && self.tokens.is_word(keyword, b"obj"))
        {
            return Err(ParseError::UnexpectedToken {
                position: number.start,
                expected: "<num> <gen> obj".to_string(),
                found: String::from_utf8_lossy(self.tokens.text(number)).into_owned(),
            });
        }
        let id = self.object_id(number, generation)?;
        self.tokens.advance();
        trace!("Parsing indirect object {} {}", id.number(), id.generation());

        let value = match self.parse_object()? {
            Node::Dictionary(dict) => match self.stream_start()? {
                Some((offset, newline)) => Node::Stream(self.parse_stream(dict, offset, newline)?),
                None => Node::Dictionary(dict),
            },
            other => other,
        };

        if !matches!(value, Node::Stream(_)) {
            self.expect_word(b"endobj")?;
        }

        Ok(IndirectObject::new(id, value))
    }

    /// Parses objects up to `stopper` and consumes it, returning its token.
    pub(crate) fn parse_until(&mut self, stopper: &[u8]) -> ParseResult<(Vec<Node>, Token)> {
        let mut objects = Vec::new();
        loop {
            let token = self.tokens.peek(1);
            if self.tokens.is_word(token, stopper) {
                self.tokens.shift();
                return Ok((objects, token));
            }
            if token.kind == TokenKind::Done {
                return Err(ParseError::UnexpectedEof {
                    position: token.start,
                    expected: String::from_utf8_lossy(stopper).into_owned(),
                });
            }
            objects.push(self.parse_object()?);
        }
    }

    /// Pairs up parsed objects as dictionary entries.
    pub(crate) fn pair_entries(&self, objects: Vec<Node>, position: usize) -> ParseResult<Dictionary> {
        if objects.len() % 2 != 0 {
            return Err(ParseError::SyntaxError {
                position,
                message: "odd number of dictionary elements".to_string(),
            });
        }

        let mut entries = Vec::with_capacity(objects.len() / 2);
        let mut items = objects.into_iter();
        while let (Some(key), Some(value)) = (items.next(), items.next()) {
            match key {
                Node::Name(name) => entries.push((name, value.into_ref())),
                other => {
                    return Err(ParseError::SyntaxError {
                        position,
                        message: format!("dictionary key is a {}, not a name", other.type_name()),
                    })
                }
            }
        }
        Ok(Dictionary::from_entries(entries))
    }

    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= self.options.max_depth {
            return Err(ParseError::RecursionLimit {
                depth: self.options.max_depth,
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_array(&mut self) -> ParseResult<Node> {
        let (items, _) = self.parse_until(b"]")?;
        Ok(Node::Array(items.into_iter().map(Node::into_ref).collect()))
    }

    fn parse_dictionary(&mut self) -> ParseResult<Dictionary> {
        let start = self.tokens.next_start();
        let (items, _) = self.parse_until(b">>")?;
        self.pair_entries(items, start)
    }

    /// Decodes a literal string body starting right after `(`.
    fn parse_literal_string(&mut self, start: usize) -> ParseResult<Node> {
        let buf = self.tokens.buffer();
        let eof = |position: usize| ParseError::UnexpectedEof {
            position,
            expected: ")".to_string(),
        };

        let mut out = Vec::new();
        let mut pos = start;
        let mut depth = 1usize;

        loop {
            let &ch = buf.get(pos).ok_or_else(|| eof(pos))?;
            pos += 1;
            match ch {
                b'\\' => {
                    let &escaped = buf.get(pos).ok_or_else(|| eof(pos))?;
                    pos += 1;
                    match escaped {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'b' => out.push(b'\x08'),
                        b'f' => out.push(b'\x0C'),
                        b'0'..=b'7' => {
                            let mut value = u32::from(escaped - b'0');
                            for _ in 0..2 {
                                match buf.get(pos) {
                                    Some(&digit @ b'0'..=b'7') => {
                                        value = value * 8 + u32::from(digit - b'0');
                                        pos += 1;
                                    }
                                    _ => break,
                                }
                            }
                            // \777 and friends keep the low byte
                            out.push(value as u8);
                        }
                        b'\r' => {
                            if buf.get(pos) == Some(&b'\n') {
                                pos += 1;
                            }
                        }
                        b'\n' => {}
                        other => out.push(other),
                    }
                }
                b'(' => {
                    depth += 1;
                    out.push(ch);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    out.push(ch);
                }
                _ => out.push(ch),
            }
        }

        self.tokens.seek(pos);
        Ok(Node::LiteralString(out))
    }

    /// Decodes a hex string body starting right after `<`.
    fn parse_hex_string(&mut self, start: usize) -> ParseResult<Node> {
        let buf = self.tokens.buffer();
        let end = buf[start..]
            .iter()
            .position(|&ch| ch == b'>')
            .map(|i| start + i)
            .ok_or_else(|| ParseError::UnexpectedEof {
                position: buf.len(),
                expected: ">".to_string(),
            })?;

        let mut out = Vec::with_capacity((end - start) / 2);
        let mut high: Option<u8> = None;
        for (offset, &ch) in buf[start..end].iter().enumerate() {
            if is_whitespace(ch) {
                continue;
            }
            let nibble = hex_value(ch).ok_or_else(|| ParseError::SyntaxError {
                position: start + offset,
                message: format!("invalid hex digit '{}'", ch as char),
            })?;
            match high.take() {
                Some(h) => out.push(h << 4 | nibble),
                None => high = Some(nibble),
            }
        }
        if let Some(h) = high {
            out.push(h << 4);
        }

        self.tokens.seek(end + 1);
        Ok(Node::HexString(out))
    }

    fn reference_ahead(&mut self) -> ParseResult<Option<ObjectId>> {
        let number = self.tokens.peek(1);
        if !self.tokens.is_uint(number) {
            return Ok(None);
        }
        let generation = self.tokens.peek(2);
        if !self.tokens.is_uint(generation) {
            return Ok(None);
        }
        let keyword = self.tokens.peek(3);
        if !self.tokens.is_word(keyword, b"R") {
            return Ok(None);
        }
        self.object_id(number, generation).map(Some)
    }

    fn object_id(&self, number: Token, generation: Token) -> ParseResult<ObjectId> {
        let out_of_range = |token: Token| ParseError::SyntaxError {
            position: token.start,
            message: "object number or generation out of range".to_string(),
        };
        let num = self
            .read_integer(number)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| out_of_range(number))?;
        let gen = self
            .read_integer(generation)
            .and_then(|n| u16::try_from(n).ok())
            .ok_or_else(|| out_of_range(generation))?;
        Ok(ObjectId::new(num, gen))
    }

    /// Digits are accumulated below zero so that `i64::MIN` fits. `None`
    /// when the value does not fit 64 bits.
    fn read_integer(&self, token: Token) -> Option<i64> {
        let text = self.tokens.text(token);
        let (negative, digits) = split_sign(text);

        let mut value: i64 = 0;
        for &d in digits {
            value = value.checked_mul(10)?.checked_sub(i64::from(d - b'0'))?;
        }
        if negative {
            Some(value)
        } else {
            value.checked_neg()
        }
    }

    /// Integer and fraction parts are accumulated separately, with trailing
    /// zeros of the fraction dropped first.
    fn read_real(&self, token: Token) -> f64 {
        let text = self.tokens.text(token);
        let (negative, body) = split_sign(text);

        let point = body.iter().position(|&b| b == b'.').unwrap_or(body.len());
        let mut end = body.len();
        while end > point + 1 && body[end - 1] == b'0' {
            end -= 1;
        }

        let mut value = 0.0f64;
        for &d in body[..point].iter().filter(|d| d.is_ascii_digit()) {
            value = value * 10.0 + f64::from(d - b'0');
        }

        let mut fraction = 0.0f64;
        let mut magnitude = 1.0f64;
        for &d in body
            .get(point + 1..end)
            .unwrap_or(&[])
            .iter()
            .filter(|d| d.is_ascii_digit())
        {
            fraction = fraction * 10.0 + f64::from(d - b'0');
            magnitude *= 10.0;
        }
        value += fraction / magnitude;

        if negative {
            -value
        } else {
            value
        }
    }

    fn read_name(&self, token: Token) -> ParseResult<Name> {
        let raw = &self.tokens.text(token)[1..];
        let invalid = |message: &str| ParseError::SyntaxError {
            position: token.start,
            message: message.to_string(),
        };

        let mut bytes = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            if raw[i] != b'#' {
                bytes.push(raw[i]);
                i += 1;
                continue;
            }
            match raw.get(i + 1) {
                None => return Err(invalid("incomplete escape in name")),
                Some(b'#') => {
                    bytes.push(b'#');
                    i += 2;
                }
                Some(&high) => {
                    let low = raw
                        .get(i + 2)
                        .copied()
                        .ok_or_else(|| invalid("incomplete escape in name"))?;
                    match (hex_value(high), hex_value(low)) {
                        (Some(h), Some(l)) => bytes.push(h << 4 | l),
                        _ => return Err(invalid("invalid hex escape in name")),
                    }
                    i += 3;
                }
            }
        }

        let (name, malformed) = Name::from_utf8_lenient(&bytes);
        if malformed {
            debug!(
                "Name at position {} is not valid UTF-8, kept byte values",
                token.start
            );
        }
        Ok(name)
    }

    /// Checks for `stream` plus a strict end-of-line after a dictionary.
    fn stream_start(&mut self) -> ParseResult<Option<(usize, NewlineStyle)>> {
        let token = self.tokens.peek(1);
        if !self.tokens.is_word(token, b"stream") {
            return Ok(None);
        }
        self.tokens.seek(token.end());
        match self.tokens.scan_newline() {
            Some(style) => Ok(Some((self.tokens.position(), style))),
            None => Err(ParseError::SyntaxError {
                position: token.end(),
                message: "stream keyword must be followed by CRLF or LF".to_string(),
            }),
        }
    }

    fn parse_stream(
        &mut self,
        dict: Dictionary,
        offset: usize,
        newline: NewlineStyle,
    ) -> ParseResult<Stream> {
        match self.options.stream_loading {
            StreamLoading::Deferred => {
                trace!("Deferring stream payload at offset {}", offset);
                Ok(Stream::deferred(dict, offset, newline))
            }
            StreamLoading::Eager => {
                let mut stream = Stream::deferred(dict, offset, newline);
                if let Some(end) = stream.load_payload(self.tokens.buffer(), &self.options)? {
                    self.tokens.seek(end);
                }
                Ok(stream)
            }
        }
    }

    fn expect_word(&mut self, word: &[u8]) -> ParseResult<()> {
        let token = self.tokens.peek(1);
        if self.tokens.is_word(token, word) {
            self.tokens.shift();
            return Ok(());
        }
        let expected = String::from_utf8_lossy(word).into_owned();
        Err(match token.kind {
            TokenKind::Done => ParseError::UnexpectedEof {
                position: token.start,
                expected,
            },
            _ => ParseError::UnexpectedToken {
                position: token.start,
                expected,
                found: String::from_utf8_lossy(self.tokens.text(token)).into_owned(),
            },
        })
    }
}

fn split_sign(text: &[u8]) -> (bool, &[u8]) {
    match text.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        _ => (false, text),
    }
}

pub(crate) fn hex_value(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        _ => None,
    }
}
