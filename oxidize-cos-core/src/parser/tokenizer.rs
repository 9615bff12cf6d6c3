//! Tokenizer
//!
//! Splits a byte buffer into classified tokens. A token only records where it
//! sits in the buffer; the parser decodes the bytes it needs. Up to three
//! tokens can be looked at before any is consumed, which is what
//! `<num> <gen> R` and `<num> <gen> obj` need.

use crate::objects::NewlineStyle;
use std::collections::VecDeque;

const LOOKAHEAD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenKind {
    #[default]
    Start,
    /// End of input.
    Done,
    Delimiter,
    Integer,
    Real,
    Name,
    Word,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub len: usize,
}

impl Token {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

pub fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b'\0' | b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

pub fn is_delimiter(ch: u8) -> bool {
    matches!(
        ch,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// Fixed size ring of scanned but unconsumed tokens.
#[derive(Debug, Clone, Copy, Default)]
struct Lookahead {
    tokens: [Token; LOOKAHEAD],
    head: usize,
    len: usize,
}

impl Lookahead {
    fn get(&self, n: usize) -> Option<Token> {
        (n < self.len).then(|| self.tokens[(self.head + n) % LOOKAHEAD])
    }

    fn push(&mut self, token: Token) {
        debug_assert!(self.len < LOOKAHEAD);
        self.tokens[(self.head + self.len) % LOOKAHEAD] = token;
        self.len += 1;
    }

    fn pop_front(&mut self) -> Option<Token> {
        let token = self.get(0)?;
        self.head = (self.head + 1) % LOOKAHEAD;
        self.len -= 1;
        Some(token)
    }

    fn clear(&mut self) {
        self.len = 0;
    }
}

#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    buf: &'a [u8],
    pos: usize,
    lookahead: Lookahead,
    keep_comments: bool,
    /// Skipped comments with the offset of their `%`, oldest first.
    comments: VecDeque<(usize, &'a [u8])>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            lookahead: Lookahead::default(),
            keep_comments: false,
            comments: VecDeque::new(),
        }
    }

    /// Queues the comments skipped from now on instead of dropping them.
    pub fn keep_comments(&mut self) {
        self.keep_comments = true;
    }

    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    /// Scan position, just past the last token scanned so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Start offset of the next unconsumed token.
    pub fn next_start(&mut self) -> usize {
        self.peek(1).start
    }

    /// Looks at the `n`th upcoming token, 1 based, scanning as needed.
    pub fn peek(&mut self, n: usize) -> Token {
        debug_assert!((1..=LOOKAHEAD).contains(&n));
        let n = n.clamp(1, LOOKAHEAD);
        while self.lookahead.len < n {
            let token = self.scan();
            self.lookahead.push(token);
        }
        self.lookahead.get(n - 1).unwrap_or_default()
    }

    /// Consumes the next token.
    pub fn shift(&mut self) -> Token {
        match self.lookahead.pop_front() {
            Some(token) => token,
            None => self.scan(),
        }
    }

    /// Consumes every buffered token.
    pub fn advance(&mut self) {
        self.lookahead.clear();
    }

    /// Moves the scan position and forgets buffered tokens.
    pub fn seek(&mut self, pos: usize) {
        self.discard_lookahead();
        self.pos = pos.min(self.buf.len());
    }

    /// Drops buffered tokens along with the comments scanned to reach them.
    fn discard_lookahead(&mut self) {
        let consumed = self.lookahead.get(0).map_or(self.pos, |token| token.start);
        self.comments.retain(|&(at, _)| at < consumed);
        self.lookahead.clear();
    }

    pub fn text(&self, token: Token) -> &'a [u8] {
        &self.buf[token.start..token.end()]
    }

    /// Whether the token text is exactly `word`, whatever its kind.
    pub fn is_word(&self, token: Token, word: &[u8]) -> bool {
        token.kind != TokenKind::Done && self.text(token) == word
    }

    /// Integer without a leading minus sign.
    pub fn is_uint(&self, token: Token) -> bool {
        token.kind == TokenKind::Integer && self.text(token).first() != Some(&b'-')
    }

    /// Skips whitespace and comments from the scan position.
    pub fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.buf.get(self.pos) {
            if ch == b'%' {
                let start = self.pos;
                let end = self.buf[start..]
                    .iter()
                    .position(|&ch| ch == b'\n' || ch == b'\r')
                    .map_or(self.buf.len(), |i| start + i);
                if self.keep_comments {
                    self.comments.push_back((start, &self.buf[start + 1..end]));
                }
                self.pos = end;
            } else if is_whitespace(ch) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Takes the oldest queued comment if it starts before `pos`.
    ///
    /// Returns the comment text without the `%` and the line ending.
    pub fn take_comment_before(&mut self, pos: usize) -> Option<&'a [u8]> {
        match self.comments.front() {
            Some(&(at, text)) if at < pos => {
                self.comments.pop_front();
                Some(text)
            }
            _ => None,
        }
    }

    /// Reads the end-of-line right at the scan position: `\n` or `\r\n`.
    pub fn scan_newline(&mut self) -> Option<NewlineStyle> {
        let rest = &self.buf[self.pos..];
        let style = if rest.starts_with(b"\r\n") {
            NewlineStyle::CrLf
        } else if rest.starts_with(b"\n") {
            NewlineStyle::Lf
        } else {
            return None;
        };
        self.discard_lookahead();
        self.pos += style.as_bytes().len();
        Some(style)
    }

    fn scan(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.pos;
        let mut kind = TokenKind::Start;
        let mut prev = 0u8;
        let mut digits = false;

        while let Some(&ch) = self.buf.get(self.pos) {
            let len = self.pos - start;
            let next = match ch {
                _ if is_whitespace(ch) || ch == b'%' => None,
                b'+' | b'-' => match kind {
                    TokenKind::Start => Some(TokenKind::Integer),
                    TokenKind::Integer | TokenKind::Real => Some(TokenKind::Word),
                    TokenKind::Delimiter => None,
                    other => Some(other),
                },
                b'.' => match kind {
                    TokenKind::Start | TokenKind::Integer => Some(TokenKind::Real),
                    TokenKind::Real => Some(TokenKind::Word),
                    TokenKind::Delimiter => None,
                    other => Some(other),
                },
                b'0'..=b'9' => {
                    digits = true;
                    match kind {
                        TokenKind::Start => Some(TokenKind::Integer),
                        TokenKind::Delimiter => None,
                        other => Some(other),
                    }
                }
                b'/' => match kind {
                    TokenKind::Start => Some(TokenKind::Name),
                    _ => None,
                },
                b'<' | b'>' => match kind {
                    TokenKind::Start => Some(TokenKind::Delimiter),
                    TokenKind::Delimiter if len == 1 && prev == ch => Some(TokenKind::Delimiter),
                    _ => None,
                },
                b'(' | b')' | b'[' | b']' | b'{' | b'}' => match kind {
                    TokenKind::Start => Some(TokenKind::Delimiter),
                    _ => None,
                },
                _ => match kind {
                    TokenKind::Name if !(b'!'..=b'~').contains(&ch) => Some(TokenKind::Word),
                    TokenKind::Name | TokenKind::Word => Some(kind),
                    TokenKind::Delimiter => None,
                    _ => Some(TokenKind::Word),
                },
            };

            match next {
                Some(next) => kind = next,
                None => break,
            }
            prev = ch;
            self.pos += 1;
        }

        let kind = match kind {
            TokenKind::Start => TokenKind::Done,
            TokenKind::Integer | TokenKind::Real if !digits => TokenKind::Word,
            other => other,
        };

        Token {
            kind,
            start,
            len: self.pos - start,
        }
    }
}
