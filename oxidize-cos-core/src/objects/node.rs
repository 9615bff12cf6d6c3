use super::{Content, Dictionary, Name, Operator, Stream};
use std::fmt;
use std::rc::Rc;

/// Shared, reference counted handle to a [`Node`].
///
/// Attaching a node to a container takes a reference, tearing the container
/// down releases one per child. The node itself is dropped when the count
/// reaches zero, so it can never be reached after its last release.
pub type NodeRef = Rc<Node>;

/// Takes an additional reference to `node`.
pub fn reference(node: &NodeRef) -> NodeRef {
    Rc::clone(node)
}

/// Gives up one reference to `node`, tearing it down if it was the last one.
pub fn release(node: NodeRef) {
    drop(node);
}

/// Number of live references to `node`.
pub fn ref_count(node: &NodeRef) -> usize {
    Rc::strong_count(node)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
    number: u32,
    generation: u16,
}

impl ObjectId {
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn generation(&self) -> u16 {
        self.generation
    }

    /// Object number 0 is the head of the free list and never a valid target.
    pub fn is_valid(&self) -> bool {
        self.number > 0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// An object with a persistent number and generation, `<num> <gen> obj ... endobj`.
#[derive(Debug, Clone)]
pub struct IndirectObject {
    pub id: ObjectId,
    pub value: NodeRef,
}

impl IndirectObject {
    pub fn new(id: ObjectId, value: impl Into<NodeRef>) -> Self {
        Self {
            id,
            value: value.into(),
        }
    }
}

/// COS object types
#[derive(Debug, Clone)]
pub enum Node {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Name(Name),
    LiteralString(Vec<u8>),
    HexString(Vec<u8>),
    Comment(Vec<u8>),
    Reference(ObjectId),
    IndirectObject(IndirectObject),
    Array(Vec<NodeRef>),
    Dictionary(Dictionary),
    Stream(Stream),
    /// Only produced inside content streams, by `BI ... ID ... EI`.
    InlineImage(Stream),
    Operator(Operator),
    Content(Content),
}

impl Node {
    pub fn name(name: impl Into<Name>) -> Self {
        Node::Name(name.into())
    }

    pub fn literal(bytes: impl Into<Vec<u8>>) -> Self {
        Node::LiteralString(bytes.into())
    }

    pub fn hex(bytes: impl Into<Vec<u8>>) -> Self {
        Node::HexString(bytes.into())
    }

    pub fn reference(number: u32, generation: u16) -> Self {
        Node::Reference(ObjectId::new(number, generation))
    }

    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<NodeRef>,
    {
        Node::Array(items.into_iter().map(Into::into).collect())
    }

    /// Wraps this node in a fresh handle holding the first reference.
    pub fn into_ref(self) -> NodeRef {
        Rc::new(self)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Boolean(_) => "boolean",
            Node::Integer(_) => "integer",
            Node::Real(_) => "real",
            Node::Name(_) => "name",
            Node::LiteralString(_) => "literal string",
            Node::HexString(_) => "hex string",
            Node::Comment(_) => "comment",
            Node::Reference(_) => "reference",
            Node::IndirectObject(_) => "indirect object",
            Node::Array(_) => "array",
            Node::Dictionary(_) => "dictionary",
            Node::Stream(_) => "stream",
            Node::InlineImage(_) => "inline image",
            Node::Operator(_) => "operator",
            Node::Content(_) => "content",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Node::Integer(_) | Node::Real(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Node::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Node::Real(r) => Some(*r),
            Node::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&Name> {
        match self {
            Node::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Decoded bytes of a literal or hex string.
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Node::LiteralString(s) | Node::HexString(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[NodeRef]> {
        match self {
            Node::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Dictionary of a dictionary, stream or inline image.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Node::Dictionary(dict) => Some(dict),
            Node::Stream(stream) | Node::InlineImage(stream) => Some(stream.dictionary()),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Node::Stream(stream) | Node::InlineImage(stream) => Some(stream),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            Node::Reference(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_indirect(&self) -> Option<&IndirectObject> {
        match self {
            Node::IndirectObject(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_operator(&self) -> Option<&Operator> {
        match self {
            Node::Operator(op) => Some(op),
            _ => None,
        }
    }

    pub fn as_content(&self) -> Option<&Content> {
        match self {
            Node::Content(content) => Some(content),
            _ => None,
        }
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Boolean(b)
    }
}

impl From<i32> for Node {
    fn from(i: i32) -> Self {
        Node::Integer(i as i64)
    }
}

impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Node::Integer(i)
    }
}

impl From<f64> for Node {
    fn from(f: f64) -> Self {
        Node::Real(f)
    }
}

impl From<Name> for Node {
    fn from(n: Name) -> Self {
        Node::Name(n)
    }
}

impl From<ObjectId> for Node {
    fn from(id: ObjectId) -> Self {
        Node::Reference(id)
    }
}

impl From<Dictionary> for Node {
    fn from(d: Dictionary) -> Self {
        Node::Dictionary(d)
    }
}

impl From<Stream> for Node {
    fn from(s: Stream) -> Self {
        Node::Stream(s)
    }
}

impl From<IndirectObject> for Node {
    fn from(obj: IndirectObject) -> Self {
        Node::IndirectObject(obj)
    }
}

impl From<Operator> for Node {
    fn from(op: Operator) -> Self {
        Node::Operator(op)
    }
}

impl From<Content> for Node {
    fn from(content: Content) -> Self {
        Node::Content(content)
    }
}

impl From<Vec<NodeRef>> for Node {
    fn from(items: Vec<NodeRef>) -> Self {
        Node::Array(items)
    }
}
