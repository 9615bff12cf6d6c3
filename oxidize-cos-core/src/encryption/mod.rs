//! Crypt traversal
//!
//! Walks an indirect object and hands every string and stream payload to a
//! caller supplied transform, together with the id of the enclosing object.
//! The actual cipher lives with the caller; this module only decides what
//! gets transformed.
//!
//! Shared subtrees are copied before they are changed, so other owners of a
//! node never see the transformed bytes.

use crate::error::{CosError, Result};
use crate::objects::{IndirectObject, Node, NodeRef, ObjectId, Stream};
use std::rc::Rc;
use tracing::trace;

/// Which payloads the transform is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CryptMode {
    #[default]
    All,
    StringsOnly,
    StreamsOnly,
}

impl CryptMode {
    fn strings(self) -> bool {
        matches!(self, CryptMode::All | CryptMode::StringsOnly)
    }

    fn streams(self) -> bool {
        matches!(self, CryptMode::All | CryptMode::StreamsOnly)
    }
}

/// Applies a byte transform to the payloads of indirect objects.
pub struct ObjectCrypter<F> {
    mode: CryptMode,
    transform: F,
}

impl<F> ObjectCrypter<F>
where
    F: FnMut(ObjectId, &mut Vec<u8>) -> Result<()>,
{
    pub fn new(mode: CryptMode, transform: F) -> Self {
        Self { mode, transform }
    }

    pub fn mode(&self) -> CryptMode {
        self.mode
    }

    /// Transforms the payloads of `object`, returning how many were handed
    /// to the transform.
    pub fn crypt_indirect_object(&mut self, object: &mut IndirectObject) -> Result<usize> {
        trace!(
            "Crypt pass over object {} {} ({:?})",
            object.id.number(),
            object.id.generation(),
            self.mode
        );
        self.crypt_object(&mut object.value, object.id)
    }

    /// Transforms the payloads below `node` on behalf of object `obj_id`.
    pub fn crypt_object(&mut self, node: &mut NodeRef, obj_id: ObjectId) -> Result<usize> {
        match **node {
            Node::LiteralString(_) | Node::HexString(_) if self.mode.strings() => {}
            Node::Array(_) | Node::Dictionary(_) | Node::Stream(_) | Node::IndirectObject(_) => {}
            // Names, numbers, references and content stream nodes carry no
            // encrypted payload
            _ => return Ok(0),
        }

        match Rc::make_mut(node) {
            Node::LiteralString(bytes) | Node::HexString(bytes) => {
                (self.transform)(obj_id, bytes)?;
                Ok(1)
            }
            Node::Array(items) => {
                let mut count = 0;
                for item in items.iter_mut() {
                    count += self.crypt_object(item, obj_id)?;
                }
                Ok(count)
            }
            Node::Dictionary(dict) => {
                let mut count = 0;
                for value in dict.values_mut() {
                    count += self.crypt_object(value, obj_id)?;
                }
                Ok(count)
            }
            Node::Stream(stream) => self.crypt_stream(stream, obj_id),
            Node::IndirectObject(inner) => {
                let id = inner.id;
                self.crypt_object(&mut inner.value, id)
            }
            _ => Ok(0),
        }
    }

    fn crypt_stream(&mut self, stream: &mut Stream, obj_id: ObjectId) -> Result<usize> {
        let mut count = 0;
        for value in stream.dictionary_mut().values_mut() {
            count += self.crypt_object(value, obj_id)?;
        }

        if self.mode.streams() {
            let offset = stream.source_offset();
            let data = stream.data_mut().ok_or(CosError::PayloadNotLoaded {
                offset: offset.unwrap_or_default(),
            })?;
            (self.transform)(obj_id, data)?;
            count += 1;
        }
        Ok(count)
    }
}

/// Runs `transform` over the payloads of `object` selected by `mode`.
pub fn crypt_object<F>(object: &mut IndirectObject, mode: CryptMode, transform: F) -> Result<usize>
where
    F: FnMut(ObjectId, &mut Vec<u8>) -> Result<()>,
{
    ObjectCrypter::new(mode, transform).crypt_indirect_object(object)
}
