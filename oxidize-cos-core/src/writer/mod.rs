//! COS serializer
//!
//! Writes [`Node`] trees back out as PDF syntax into a caller provided,
//! fixed size buffer. Dictionaries go on one line unless that line would be
//! wider than [`MAX_INLINE_DICT_WIDTH`]; content streams get one operator per
//! line, indented by nesting level.

mod buffer;
mod estimate;

pub use buffer::BoundedBuffer;

use crate::objects::{Content, Dictionary, IndirectObject, Name, Node, Operator, Stream};
use crate::parser::content::hides_inline_image_end;
use crate::parser::operators::Nesting;
use tracing::trace;

/// Widest dictionary, in bytes, that is kept on a single line.
pub const MAX_INLINE_DICT_WIDTH: usize = 65;

/// Result type for writer operations
pub type WriteResult<T> = Result<T, WriteError>;

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("Output exceeds buffer capacity {capacity} (needs at least {needed} bytes)")]
    CapacityExceeded { capacity: usize, needed: usize },

    #[error("Stream payload at source offset {offset} has not been loaded")]
    PayloadNotLoaded { offset: usize },
}

/// Layout settings for the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    /// Dictionaries wider than this are written one entry per line.
    pub reflow_width: usize,
    /// Spaces per nesting level inside content streams.
    pub content_indent: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            reflow_width: MAX_INLINE_DICT_WIDTH,
            content_indent: 2,
        }
    }
}

pub struct CosWriter<'a> {
    out: BoundedBuffer<'a>,
    config: WriterConfig,
}

impl<'a> CosWriter<'a> {
    pub fn new(out: &'a mut [u8]) -> Self {
        Self::with_config(out, WriterConfig::default())
    }

    pub fn with_config(out: &'a mut [u8], config: WriterConfig) -> Self {
        Self {
            out: BoundedBuffer::new(out),
            config,
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn written(&self) -> &[u8] {
        self.out.written()
    }

    /// Writes `node` at the current position. `indent` is the column that
    /// reflowed dictionary lines and content operators are aligned to.
    pub fn write_node(&mut self, node: &Node, indent: usize) -> WriteResult<()> {
        match node {
            Node::Null => self.out.push(b"null"),
            Node::Boolean(true) => self.out.push(b"true"),
            Node::Boolean(false) => self.out.push(b"false"),
            Node::Integer(i) => self.out.push(i.to_string().as_bytes()),
            Node::Real(r) => self.out.push(format_real(*r).as_bytes()),
            Node::Name(name) => self.write_name(name),
            Node::LiteralString(bytes) => self.write_literal_string(bytes),
            Node::HexString(bytes) => self.write_hex_string(bytes),
            Node::Comment(text) => {
                self.out.push_byte(b'%')?;
                self.out.push(text)
            }
            Node::Reference(id) => self.out.push(id.to_string().as_bytes()),
            Node::IndirectObject(obj) => self.write_indirect_object(obj, indent),
            Node::Array(items) => {
                self.out.push_byte(b'[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.push_byte(b' ')?;
                    }
                    self.write_node(item, indent)?;
                }
                self.out.push_byte(b']')
            }
            Node::Dictionary(dict) => self.write_dictionary(dict, indent),
            Node::Stream(stream) => self.write_stream(stream, indent),
            Node::InlineImage(image) => self.write_inline_image(image, indent),
            Node::Operator(op) => self.write_operator(op, indent),
            Node::Content(content) => self.write_content(content, indent),
        }
    }

    fn write_name(&mut self, name: &Name) -> WriteResult<()> {
        self.out.push_byte(b'/')?;
        let mut utf8 = [0u8; 4];
        for ch in name.as_str().chars() {
            if is_regular_name_char(ch) {
                self.out.push_byte(ch as u8)?;
            } else {
                for &byte in ch.encode_utf8(&mut utf8).as_bytes() {
                    self.out.push(&[
                        b'#',
                        HEX_DIGITS[usize::from(byte >> 4)],
                        HEX_DIGITS[usize::from(byte & 0xF)],
                    ])?;
                }
            }
        }
        Ok(())
    }

    fn write_literal_string(&mut self, bytes: &[u8]) -> WriteResult<()> {
        self.out.push_byte(b'(')?;
        for &byte in bytes {
            match byte {
                b'\n' => self.out.push(b"\\n")?,
                b'\r' => self.out.push(b"\\r")?,
                b'\t' => self.out.push(b"\\t")?,
                b'\x08' => self.out.push(b"\\b")?,
                b'\x0C' => self.out.push(b"\\f")?,
                b'(' | b')' | b'\\' => self.out.push(&[b'\\', byte])?,
                0x00..=0x1F | 0x7F => self.out.push(&[
                    b'\\',
                    b'0' + (byte >> 6),
                    b'0' + ((byte >> 3) & 7),
                    b'0' + (byte & 7),
                ])?,
                _ => self.out.push_byte(byte)?,
            }
        }
        self.out.push_byte(b')')
    }

    fn write_hex_string(&mut self, bytes: &[u8]) -> WriteResult<()> {
        self.out.push_byte(b'<')?;
        for &byte in bytes {
            self.out.push(&[
                HEX_DIGITS[usize::from(byte >> 4)],
                HEX_DIGITS[usize::from(byte & 0xF)],
            ])?;
        }
        self.out.push_byte(b'>')
    }

    fn write_indirect_object(&mut self, obj: &IndirectObject, indent: usize) -> WriteResult<()> {
        let header = format!("{} {} obj\n", obj.id.number(), obj.id.generation());
        self.out.push(header.as_bytes())?;
        self.write_node(&obj.value, indent)?;
        self.out.push(b"\nendobj\n")
    }

    /// Writes the dictionary on one line, then breaks it up in place if the
    /// line came out too wide.
    fn write_dictionary(&mut self, dict: &Dictionary, indent: usize) -> WriteResult<()> {
        let start = self.out.len();
        let mut separators = Vec::with_capacity(dict.len() + 1);

        self.out.push(b"<<")?;
        for (key, value) in dict.entries() {
            separators.push(self.out.len());
            self.out.push_byte(b' ')?;
            self.write_name(key)?;
            self.out.push_byte(b' ')?;
            self.write_node(value, indent + 2)?;
        }
        separators.push(self.out.len());
        self.out.push(b" >>")?;

        let width = self.out.len() - start;
        if width > self.config.reflow_width {
            trace!("Reflowing {} byte wide dictionary", width);
            let last = separators.len() - 1;
            self.out.expand_separators(&separators, |i| {
                let spaces = if i == last { indent } else { indent + 2 };
                let mut line = Vec::with_capacity(spaces + 1);
                line.push(b'\n');
                line.resize(spaces + 1, b' ');
                line
            })?;
        }
        Ok(())
    }

    fn write_stream(&mut self, stream: &Stream, indent: usize) -> WriteResult<()> {
        let data = stream.data().ok_or(WriteError::PayloadNotLoaded {
            offset: stream.source_offset().unwrap_or_default(),
        })?;
        self.write_dictionary(stream.dictionary(), indent)?;
        self.out.push(b"\nstream\n")?;
        self.out.push(data)?;
        self.out.push(b"\nendstream")
    }

    fn write_inline_image(&mut self, image: &Stream, indent: usize) -> WriteResult<()> {
        let data = image.data().ok_or(WriteError::PayloadNotLoaded {
            offset: image.source_offset().unwrap_or_default(),
        })?;
        let dict = image.dictionary();
        self.out.push(b"BI")?;
        for (key, value) in dict.entries() {
            self.out.push_byte(b' ')?;
            self.write_name(key)?;
            self.out.push_byte(b' ')?;
            self.write_node(value, indent)?;
        }
        // without a length the reader would stop at the EI inside the data
        if !dict.contains_key("L") && !dict.contains_key("Length") && hides_inline_image_end(data)
        {
            trace!("Adding /L {} to inline image", data.len());
            self.out.push(b" /L ")?;
            self.out.push(data.len().to_string().as_bytes())?;
        }
        self.out.push(b" ID ")?;
        self.out.push(data)?;
        self.out.push(b"\nEI")
    }

    fn write_operator(&mut self, op: &Operator, indent: usize) -> WriteResult<()> {
        self.out.push_repeated(b' ', indent)?;
        match op.arguments() {
            // an inline image writes its own BI keyword
            [image] if matches!(**image, Node::InlineImage(_)) => self.write_node(image, indent)?,
            arguments => {
                for operand in arguments {
                    self.write_node(operand, indent)?;
                    self.out.push_byte(b' ')?;
                }
                self.out.push(op.name().as_bytes())?;
            }
        }
        self.write_comments(op, indent)
    }

    fn write_comments(&mut self, op: &Operator, indent: usize) -> WriteResult<()> {
        for (i, comment) in op.comments().iter().enumerate() {
            if i == 0 {
                self.out.push_byte(b' ')?;
            } else {
                self.out.push_byte(b'\n')?;
                self.out.push_repeated(b' ', indent)?;
            }
            self.write_node(comment, indent)?;
        }
        Ok(())
    }

    fn write_content(&mut self, content: &Content, indent: usize) -> WriteResult<()> {
        let mut level = 0usize;
        for (i, op) in content.iter().enumerate() {
            if op.opcode().nesting() == Nesting::Close {
                level = level.saturating_sub(1);
            }
            if i > 0 {
                self.out.push_byte(b'\n')?;
            }
            self.write_operator(op, indent + level * self.config.content_indent)?;
            if op.opcode().nesting() == Nesting::Open {
                level += 1;
            }
        }
        Ok(())
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Printable ASCII that can appear in a name without an escape.
fn is_regular_name_char(ch: char) -> bool {
    ('!'..='~').contains(&ch)
        && !matches!(
            ch,
            '#' | '(' | ')' | '<' | '>' | '[' | ']' | '{' | '}' | '/' | '%'
        )
}

/// Fixed point with five decimals, one for very large magnitudes, and
/// trailing zeros dropped.
pub fn format_real(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let mut text = if value.abs() > 9_999_999.0 {
        format!("{value:.1}")
    } else {
        format!("{value:.5}")
    };
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text.remove(0);
    }
    text
}

/// Writes `node` into `out` with default layout, returning the byte count.
pub fn write_node(node: &Node, out: &mut [u8], indent: usize) -> WriteResult<usize> {
    let mut writer = CosWriter::new(out);
    writer.write_node(node, indent)?;
    Ok(writer.len())
}

impl Node {
    /// Writes this node into `out`, returning the number of bytes written.
    pub fn write(&self, out: &mut [u8], indent: usize) -> WriteResult<usize> {
        write_node(self, out, indent)
    }

    /// Upper bound for the bytes [`Node::write`] needs.
    pub fn estimate_write_size(&self, indent: usize) -> usize {
        estimate::estimate(self, indent, &WriterConfig::default())
    }

    /// Serializes into a freshly allocated buffer.
    pub fn to_bytes(&self) -> WriteResult<Vec<u8>> {
        to_bytes_with(self, WriterConfig::default())
    }
}

pub fn to_bytes_with(node: &Node, config: WriterConfig) -> WriteResult<Vec<u8>> {
    let mut capacity = estimate::estimate(node, 0, &config).max(16);
    loop {
        let mut buf = vec![0u8; capacity];
        let mut writer = CosWriter::with_config(&mut buf, config);
        match writer.write_node(node, 0) {
            Ok(()) => {
                let len = writer.len();
                buf.truncate(len);
                return Ok(buf);
            }
            Err(WriteError::CapacityExceeded { needed, .. }) => {
                capacity = needed.max(capacity * 2);
            }
            Err(err) => return Err(err),
        }
    }
}
