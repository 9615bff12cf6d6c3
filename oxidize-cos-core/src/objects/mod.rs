//! COS object model
//!
//! Every parsed value is a [`Node`]. Containers own their children through
//! [`NodeRef`] handles, so a node can be attached under several parents and is
//! torn down exactly once, when its last owner lets go of it.

mod compare;
mod content;
mod dictionary;
mod name;
mod node;
mod stream;

pub use compare::Comparison;
pub use content::{Content, Operator};
pub use dictionary::Dictionary;
pub use name::Name;
pub use node::{ref_count, reference, release, IndirectObject, Node, NodeRef, ObjectId};
pub use stream::{NewlineStyle, Stream, StreamPayload};
