use super::Dictionary;
use crate::parser::stream::locate_payload;
use crate::parser::{ParseOptions, ParseResult};

/// End-of-line sequence that followed the `stream` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewlineStyle {
    Lf,
    CrLf,
}

impl NewlineStyle {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            NewlineStyle::Lf => b"\n",
            NewlineStyle::CrLf => b"\r\n",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamPayload {
    Loaded(Vec<u8>),
    /// Payload left in the source buffer, starting at `offset`.
    Deferred { offset: usize, newline: NewlineStyle },
}

/// A dictionary followed by a raw payload.
#[derive(Debug, Clone)]
pub struct Stream {
    dict: Dictionary,
    payload: StreamPayload,
}

impl Stream {
    pub fn new(dict: Dictionary, data: Vec<u8>) -> Self {
        Self {
            dict,
            payload: StreamPayload::Loaded(data),
        }
    }

    pub fn deferred(dict: Dictionary, offset: usize, newline: NewlineStyle) -> Self {
        Self {
            dict,
            payload: StreamPayload::Deferred { offset, newline },
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        &mut self.dict
    }

    pub fn payload(&self) -> &StreamPayload {
        &self.payload
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.payload, StreamPayload::Loaded(_))
    }

    pub fn data(&self) -> Option<&[u8]> {
        match &self.payload {
            StreamPayload::Loaded(data) => Some(data),
            StreamPayload::Deferred { .. } => None,
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut Vec<u8>> {
        match &mut self.payload {
            StreamPayload::Loaded(data) => Some(data),
            StreamPayload::Deferred { .. } => None,
        }
    }

    pub fn source_offset(&self) -> Option<usize> {
        match self.payload {
            StreamPayload::Deferred { offset, .. } => Some(offset),
            StreamPayload::Loaded(_) => None,
        }
    }

    /// Value of `/Length` when it is a non-negative direct integer.
    pub fn declared_length(&self) -> Option<usize> {
        self.dict
            .get("Length")
            .and_then(|v| v.as_integer())
            .and_then(|len| usize::try_from(len).ok())
    }

    /// Pulls a deferred payload out of `source`, the buffer the stream was
    /// parsed from, finding its end the way an eager parse with `options`
    /// would. Loaded streams are left alone.
    pub fn load(&mut self, source: &[u8], options: &ParseOptions) -> ParseResult<()> {
        self.load_payload(source, options).map(|_| ())
    }

    /// Same as [`Stream::load`], returning the position just past
    /// `endstream` when a payload was loaded.
    pub(crate) fn load_payload(
        &mut self,
        source: &[u8],
        options: &ParseOptions,
    ) -> ParseResult<Option<usize>> {
        let StreamPayload::Deferred { offset, newline } = self.payload else {
            return Ok(None);
        };
        let length = if options.trust_length {
            self.declared_length()
        } else {
            None
        };
        let bounds = locate_payload(source, offset, newline, length)?;
        self.payload = StreamPayload::Loaded(source[bounds.data].to_vec());
        Ok(Some(bounds.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Node;

    #[test]
    fn test_loaded_stream() {
        let stream = Stream::new(Dictionary::new(), b"q Q".to_vec());
        assert!(stream.is_loaded());
        assert_eq!(stream.data(), Some(&b"q Q"[..]));
        assert_eq!(stream.source_offset(), None);
    }

    #[test]
    fn test_load_deferred_payload() {
        let source = b"<< >>\nstream\nHello\nendstream";
        let offset = 13;
        let mut stream = Stream::deferred(Dictionary::new(), offset, NewlineStyle::Lf);
        assert_eq!(stream.data(), None);
        assert_eq!(stream.source_offset(), Some(offset));

        stream.load(source, &ParseOptions::default()).unwrap();
        assert_eq!(stream.data(), Some(&b"Hello"[..]));
    }

    #[test]
    fn test_load_uses_declared_length() {
        let source = b"stream\r\nab\r\nendstream\r\nendstream";
        let mut dict = Dictionary::new();
        dict.set("Length", Node::Integer(2));
        let mut stream = Stream::deferred(dict, 8, NewlineStyle::CrLf);

        stream.load(source, &ParseOptions::default()).unwrap();
        assert_eq!(stream.data(), Some(&b"ab"[..]));
    }

    #[test]
    fn test_load_can_ignore_declared_length() {
        let source = b"stream\r\nab\r\nendstream\r\nendstream";
        let mut dict = Dictionary::new();
        dict.set("Length", Node::Integer(2));
        let mut stream = Stream::deferred(dict, 8, NewlineStyle::CrLf);

        let options = ParseOptions {
            trust_length: false,
            ..ParseOptions::default()
        };
        stream.load(source, &options).unwrap();
        assert_eq!(stream.data(), Some(&b"ab\r\nendstream"[..]));
    }

    #[test]
    fn test_load_without_terminator_fails() {
        let mut stream = Stream::deferred(Dictionary::new(), 7, NewlineStyle::Lf);
        assert!(stream
            .load(b"stream\nno end here", &ParseOptions::default())
            .is_err());
        assert!(!stream.is_loaded());
    }

    #[test]
    fn test_newline_bytes() {
        assert_eq!(NewlineStyle::Lf.as_bytes(), b"\n");
        assert_eq!(NewlineStyle::CrLf.as_bytes(), b"\r\n");
    }
}
