//! Loose upper bound on serialized size, used to size output buffers.

use super::WriterConfig;
use crate::objects::{Dictionary, Name, Node, Operator};
use crate::parser::operators::Nesting;

/// `-9223372036854775808`
const MAX_INTEGER_WIDTH: usize = 20;
/// `4294967295 65535 R`
const MAX_REFERENCE_WIDTH: usize = 18;
/// Sign, 309 integer digits and one decimal.
const MAX_LARGE_REAL_WIDTH: usize = 312;
/// Sign, 7 integer digits and five decimals.
const MAX_SMALL_REAL_WIDTH: usize = 14;

pub(super) fn estimate(node: &Node, indent: usize, config: &WriterConfig) -> usize {
    match node {
        Node::Null => 4,
        Node::Boolean(_) => 5,
        Node::Integer(_) => MAX_INTEGER_WIDTH,
        Node::Real(r) if r.abs() > 9_999_999.0 => MAX_LARGE_REAL_WIDTH,
        Node::Real(_) => MAX_SMALL_REAL_WIDTH,
        Node::Name(name) => name_size(name),
        Node::LiteralString(bytes) => 2 + 4 * bytes.len(),
        Node::HexString(bytes) => 2 + 2 * bytes.len(),
        Node::Comment(text) => 1 + text.len(),
        Node::Reference(_) => MAX_REFERENCE_WIDTH,
        Node::IndirectObject(obj) => {
            // "<num> <gen> obj\n" and "\nendobj\n"
            MAX_REFERENCE_WIDTH + 3 + estimate(&obj.value, indent, config) + 8
        }
        Node::Array(items) => {
            2 + items
                .iter()
                .map(|item| estimate(item, indent, config) + 1)
                .sum::<usize>()
        }
        Node::Dictionary(dict) => dictionary_size(dict, indent, config),
        Node::Stream(stream) => {
            let data = stream.data().map_or(0, <[u8]>::len);
            dictionary_size(stream.dictionary(), indent, config) + 8 + data + 10
        }
        Node::InlineImage(image) => {
            let data = image.data().map_or(0, <[u8]>::len);
            let entries: usize = image
                .dictionary()
                .entries()
                .map(|(key, value)| 2 + name_size(key) + estimate(value, indent, config))
                .sum();
            // room for an added " /L <len>"
            2 + entries + 4 + MAX_INTEGER_WIDTH + 4 + data + 3
        }
        Node::Operator(op) => operator_size(op, indent, config),
        Node::Content(content) => {
            let mut level = 0usize;
            let mut total = 0;
            for op in content {
                if op.opcode().nesting() == Nesting::Close {
                    level = level.saturating_sub(1);
                }
                total += 1 + operator_size(op, indent + level * config.content_indent, config);
                if op.opcode().nesting() == Nesting::Open {
                    level += 1;
                }
            }
            total
        }
    }
}

fn name_size(name: &Name) -> usize {
    1 + 3 * name.as_str().len()
}

/// Size of the reflowed layout, which is never shorter than the inline one.
fn dictionary_size(dict: &Dictionary, indent: usize, config: &WriterConfig) -> usize {
    let entries: usize = dict
        .entries()
        .map(|(key, value)| {
            1 + indent + 2 + name_size(key) + 1 + estimate(value, indent + 2, config)
        })
        .sum();
    2 + entries + 1 + indent + 2 + 1
}

fn operator_size(op: &Operator, indent: usize, config: &WriterConfig) -> usize {
    let operands: usize = op
        .operands()
        .iter()
        .map(|operand| 1 + indent + estimate(operand, indent, config))
        .sum();
    indent + operands + op.name().len()
}
