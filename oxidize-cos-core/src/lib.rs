//! # oxidize-cos
//!
//! The object layer of a PDF toolkit: an in-memory model for COS objects, a
//! tokenizer and parser that build it from bytes, and a serializer that
//! writes it back out.
//!
//! ## Features
//!
//! - **Object Model**: Null, booleans, numbers, names, strings, references,
//!   arrays, dictionaries, streams, inline images and content streams
//! - **Shared Subtrees**: Nodes are reference counted and can hang under
//!   several parents at once
//! - **Parsing**: Bare objects, indirect objects and content streams, with
//!   operand validation for every standard content operator
//! - **Deferred Streams**: Leave stream payloads in the source and load them
//!   on demand
//! - **Serialization**: Canonical output into a fixed size buffer, with a
//!   size estimate to allocate it
//! - **Comparison**: Structural equality that tells exact matches from
//!   reordered dictionaries
//! - **Crypt Traversal**: Apply a caller supplied cipher to every string and
//!   stream payload of an object
//!
//! ## Quick Start
//!
//! ```rust
//! use oxidize_cos::{parse_indirect_object, Comparison, Node, ParseOptions, Result};
//!
//! # fn main() -> Result<()> {
//! let obj = parse_indirect_object(b"12 0 obj << /Width 3.140 /Kids [1 0 R] >> endobj", ParseOptions::default())?;
//! assert_eq!(obj.id.to_string(), "12 0 R");
//!
//! let node = Node::IndirectObject(obj);
//! let bytes = node.to_bytes()?;
//! assert_eq!(bytes, b"12 0 obj\n<< /Width 3.14 /Kids [1 0 R] >>\nendobj\n".to_vec());
//!
//! let reparsed = Node::IndirectObject(parse_indirect_object(&bytes, ParseOptions::default())?);
//! assert_eq!(node.compare(&reparsed), Comparison::Equal);
//! # Ok(())
//! # }
//! ```
//!
//! ### Content Streams
//!
//! ```rust
//! use oxidize_cos::{parse_content, ParseOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let content = parse_content(b"q 1 0 0 1 72 720 cm BT /F1 12 Tf (Hi) Tj ET Q", ParseOptions::strict())?;
//! let names: Vec<&str> = content.iter().map(|op| op.name()).collect();
//! assert_eq!(names, ["q", "cm", "BT", "Tf", "Tj", "ET", "Q"]);
//! # Ok(())
//! # }
//! ```

pub mod encryption;
pub mod error;
pub mod objects;
pub mod parser;
pub mod structure;
pub mod writer;

pub use encryption::{crypt_object, CryptMode, ObjectCrypter};
pub use error::{CosError, Result};
pub use objects::{
    ref_count, reference, release, Comparison, Content, Dictionary, IndirectObject, Name,
    NewlineStyle, Node, NodeRef, ObjectId, Operator, Stream, StreamPayload,
};
pub use parser::{
    parse_content, parse_indirect_object, parse_object, parse_objects, ContentParser,
    ObjectParser, ParseError, ParseOptions, ParseResult, StreamLoading,
};
pub use structure::{MarkedContentRef, ObjectRef, StructElem};
pub use writer::{
    format_real, to_bytes_with, write_node, CosWriter, WriteError, WriteResult, WriterConfig,
    MAX_INLINE_DICT_WIDTH,
};

/// Current version of oxidize-cos
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_reexports_reach_the_same_types() {
        let node: Node = parse_object(b"/Type").unwrap();
        assert_eq!(node.as_name().map(Name::as_str), Some("Type"));
        assert_eq!(MAX_INLINE_DICT_WIDTH, 65);
        assert_eq!(CryptMode::default(), CryptMode::All);
    }
}
