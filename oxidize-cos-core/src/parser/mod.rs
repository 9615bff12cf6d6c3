//! COS parser
//!
//! Turns bytes into [`Node`] trees. Three entry shapes are supported: a bare
//! object, an indirect object (`<num> <gen> obj ... endobj`, possibly a stream)
//! and a content stream.
//!
//! # Example
//!
//! ```rust
//! use oxidize_cos::parser::{parse_indirect_object, ParseOptions};
//!
//! let obj = parse_indirect_object(b"12 0 obj 42 endobj", ParseOptions::default())?;
//! assert_eq!(obj.id.number(), 12);
//! assert_eq!(obj.value.as_integer(), Some(42));
//! # Ok::<(), oxidize_cos::parser::ParseError>(())
//! ```

pub mod content;
pub mod objects;
pub mod operators;
pub mod stream;
pub mod tokenizer;

use crate::objects::{Content, IndirectObject, Node};

pub use self::content::ContentParser;
pub use self::objects::ObjectParser;
pub use self::tokenizer::{Token, TokenKind, Tokenizer};

/// Default nesting limit for arrays and dictionaries.
pub const MAX_RECURSION_DEPTH: usize = 1000;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Parser errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("Unexpected end of input at position {position}: expected {expected}")]
    UnexpectedEof { position: usize, expected: String },

    #[error("Unexpected token at position {position}: expected {expected}, found {found}")]
    UnexpectedToken {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("Unknown keyword '{word}' at position {position}")]
    UnknownWord { position: usize, word: String },

    #[error("Invalid operands for '{operator}' at position {position}: {message}")]
    InvalidOperands {
        position: usize,
        operator: String,
        message: String,
    },

    #[error("Nesting deeper than {depth} levels")]
    RecursionLimit { depth: usize },
}

/// How stream payloads are handled while parsing indirect objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamLoading {
    /// Record where the payload starts and leave the bytes in the source.
    Deferred,
    /// Locate the `endstream` terminator and copy the payload.
    #[default]
    Eager,
}

/// Options for parser behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub stream_loading: StreamLoading,
    /// Log and keep content operators whose operands do not fit, and skip
    /// unknown keywords inside content streams, instead of failing.
    pub lenient_syntax: bool,
    /// Trust a direct `/Length` entry when it lands right before `endstream`.
    pub trust_length: bool,
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            stream_loading: StreamLoading::Eager,
            lenient_syntax: true,
            trust_length: true,
            max_depth: MAX_RECURSION_DEPTH,
        }
    }
}

impl ParseOptions {
    /// Create options for strict parsing
    pub fn strict() -> Self {
        Self {
            lenient_syntax: false,
            ..Self::default()
        }
    }

    /// Create options for lenient parsing
    pub fn lenient() -> Self {
        Self::default()
    }

    pub fn deferred() -> Self {
        Self {
            stream_loading: StreamLoading::Deferred,
            ..Self::default()
        }
    }
}

/// Parses a single object from the start of `buf`.
pub fn parse_object(buf: &[u8]) -> ParseResult<Node> {
    ObjectParser::new(buf).parse_object()
}

/// Parses whitespace separated objects until the end of `buf`.
pub fn parse_objects(buf: &[u8]) -> ParseResult<Vec<Node>> {
    let mut parser = ObjectParser::new(buf);
    let mut objects = Vec::new();
    while !parser.at_end() {
        objects.push(parser.parse_object()?);
    }
    Ok(objects)
}

pub fn parse_indirect_object(buf: &[u8], options: ParseOptions) -> ParseResult<IndirectObject> {
    ObjectParser::with_options(buf, options).parse_indirect_object()
}

pub fn parse_content(buf: &[u8], options: ParseOptions) -> ParseResult<Content> {
    ContentParser::with_options(buf, options).parse_content()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_options_presets() {
        let default = ParseOptions::default();
        assert_eq!(default.stream_loading, StreamLoading::Eager);
        assert!(default.lenient_syntax);
        assert!(default.trust_length);
        assert_eq!(default.max_depth, MAX_RECURSION_DEPTH);

        assert!(!ParseOptions::strict().lenient_syntax);
        assert_eq!(ParseOptions::lenient(), default);
        assert_eq!(
            ParseOptions::deferred().stream_loading,
            StreamLoading::Deferred
        );
    }

    #[test]
    fn test_parse_error_display() {
        let errors = [
            (
                "Syntax error at position 3: bad",
                ParseError::SyntaxError {
                    position: 3,
                    message: "bad".to_string(),
                },
            ),
            (
                "Unexpected end of input at position 9: expected )",
                ParseError::UnexpectedEof {
                    position: 9,
                    expected: ")".to_string(),
                },
            ),
            (
                "Unknown keyword 'foo' at position 0",
                ParseError::UnknownWord {
                    position: 0,
                    word: "foo".to_string(),
                },
            ),
            (
                "Nesting deeper than 1000 levels",
                ParseError::RecursionLimit { depth: 1000 },
            ),
        ];

        for (expected, error) in errors {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_parse_objects_sequence() {
        let objects = parse_objects(b"1 /Two (three) [4] 5 0 R").unwrap();
        let kinds: Vec<&str> = objects.iter().map(Node::type_name).collect();
        assert_eq!(
            kinds,
            vec!["integer", "name", "literal string", "array", "reference"]
        );
    }

    #[test]
    fn test_parse_objects_empty() {
        assert!(parse_objects(b"  % nothing here\n").unwrap().is_empty());
    }
}
