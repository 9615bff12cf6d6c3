use super::{Node, NodeRef};
use crate::parser::operators::OpCode;

/// A content stream operator together with the operands that preceded it.
///
/// Comments that followed the operator in the source are kept as trailing
/// [`Node::Comment`] operands so that they survive a rewrite.
#[derive(Debug, Clone)]
pub struct Operator {
    name: String,
    opcode: OpCode,
    operands: Vec<NodeRef>,
}

impl Operator {
    pub fn new(name: impl Into<String>, operands: Vec<NodeRef>) -> Self {
        let name = name.into();
        Self {
            opcode: OpCode::from_name(&name),
            name,
            operands,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn opcode(&self) -> OpCode {
        self.opcode
    }

    /// All operands, trailing comments included.
    pub fn operands(&self) -> &[NodeRef] {
        &self.operands
    }

    /// Operands without the trailing comments.
    pub fn arguments(&self) -> &[NodeRef] {
        let end = self.operands.len() - self.comments().len();
        &self.operands[..end]
    }

    pub fn comments(&self) -> &[NodeRef] {
        let start = self
            .operands
            .iter()
            .rposition(|op| !matches!(**op, Node::Comment(_)))
            .map_or(0, |i| i + 1);
        &self.operands[start..]
    }

    pub fn push_comment(&mut self, text: impl Into<Vec<u8>>) {
        self.operands.push(Node::Comment(text.into()).into_ref());
    }

    /// Whether the arguments fit the operand rule of a known operator.
    pub fn is_valid(&self) -> bool {
        self.opcode.check(self.arguments()).is_ok()
    }
}

/// Parsed content stream, a flat sequence of operators.
#[derive(Debug, Clone, Default)]
pub struct Content {
    operators: Vec<Operator>,
}

impl Content {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: Operator) {
        self.operators.push(op);
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn last_mut(&mut self) -> Option<&mut Operator> {
        self.operators.last_mut()
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operator> {
        self.operators.iter()
    }
}

impl FromIterator<Operator> for Content {
    fn from_iter<I: IntoIterator<Item = Operator>>(iter: I) -> Self {
        Self {
            operators: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Content {
    type Item = &'a Operator;
    type IntoIter = std::slice::Iter<'a, Operator>;

    fn into_iter(self) -> Self::IntoIter {
        self.operators.iter()
    }
}
