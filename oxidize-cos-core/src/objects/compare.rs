use super::{Content, Dictionary, Node, NodeRef, Operator, Stream, StreamPayload};

/// Outcome of a structural comparison, from closest to furthest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Comparison {
    Equal,
    /// Same value with a different representation, such as `1` and `1.0`,
    /// or a literal and a hex string holding the same bytes.
    Similar,
    Different,
    DifferentType,
}

impl Comparison {
    /// Equal or similar.
    pub fn is_match(self) -> bool {
        matches!(self, Comparison::Equal | Comparison::Similar)
    }
}

impl Node {
    pub fn compare(&self, other: &Node) -> Comparison {
        use Comparison::*;

        match (self, other) {
            (Node::Null, Node::Null) => Equal,
            (Node::Boolean(a), Node::Boolean(b)) => equal_if(a == b),
            (Node::Integer(a), Node::Integer(b)) => equal_if(a == b),
            (Node::Real(a), Node::Real(b)) => equal_if(a == b),
            (Node::Integer(i), Node::Real(r)) | (Node::Real(r), Node::Integer(i)) => {
                if *i as f64 == *r {
                    Similar
                } else {
                    Different
                }
            }
            (Node::Name(a), Node::Name(b)) => equal_if(a == b),
            (Node::LiteralString(a), Node::LiteralString(b))
            | (Node::HexString(a), Node::HexString(b))
            | (Node::Comment(a), Node::Comment(b)) => equal_if(a == b),
            (Node::LiteralString(a), Node::HexString(b))
            | (Node::HexString(a), Node::LiteralString(b)) => {
                if a == b {
                    Similar
                } else {
                    Different
                }
            }
            (Node::Reference(a), Node::Reference(b)) => equal_if(a == b),
            (Node::IndirectObject(a), Node::IndirectObject(b)) => {
                if a.id != b.id {
                    return Different;
                }
                contained(a.value.compare(&b.value))
            }
            (Node::Array(a), Node::Array(b)) => compare_sequences(a, b),
            (Node::Dictionary(a), Node::Dictionary(b)) => compare_dictionaries(a, b),
            (Node::Stream(a), Node::Stream(b)) | (Node::InlineImage(a), Node::InlineImage(b)) => {
                compare_streams(a, b)
            }
            (Node::Operator(a), Node::Operator(b)) => compare_operators(a, b),
            (Node::Content(a), Node::Content(b)) => compare_contents(a, b),
            _ => DifferentType,
        }
    }
}

fn equal_if(same: bool) -> Comparison {
    if same {
        Comparison::Equal
    } else {
        Comparison::Different
    }
}

/// A type mismatch below a container makes the container different, not
/// of a different type.
fn contained(result: Comparison) -> Comparison {
    match result {
        Comparison::DifferentType => Comparison::Different,
        other => other,
    }
}

/// Folds element results: any difference wins, otherwise any similarity.
fn combine<I>(results: I) -> Comparison
where
    I: IntoIterator<Item = Comparison>,
{
    let mut status = Comparison::Equal;
    for result in results {
        match contained(result) {
            Comparison::Equal => {}
            Comparison::Similar => status = Comparison::Similar,
            _ => return Comparison::Different,
        }
    }
    status
}

fn compare_sequences(a: &[NodeRef], b: &[NodeRef]) -> Comparison {
    if a.len() != b.len() {
        return Comparison::Different;
    }
    combine(a.iter().zip(b).map(|(x, y)| x.compare(y)))
}

fn compare_dictionaries(a: &Dictionary, b: &Dictionary) -> Comparison {
    let a_keys: Vec<_> = a.live_entries().map(|(k, _)| k).collect();
    let b_keys: Vec<_> = b.live_entries().map(|(k, _)| k).collect();
    if a_keys.len() != b_keys.len() {
        return Comparison::Different;
    }

    // same key order, possibly with repeated keys: pair entries up in place
    if a_keys == b_keys {
        return combine(
            a.live_entries()
                .zip(b.live_entries())
                .map(|((_, x), (_, y))| x.compare(y)),
        );
    }

    let status = combine(a.live_entries().map(|(key, value)| match b.get(key.as_str()) {
        Some(other) => value.compare(other),
        None => Comparison::Different,
    }));
    match status {
        Comparison::Equal => Comparison::Similar,
        other => other,
    }
}

fn compare_streams(a: &Stream, b: &Stream) -> Comparison {
    let dict = compare_dictionaries(a.dictionary(), b.dictionary());
    let payload = match (a.payload(), b.payload()) {
        (StreamPayload::Loaded(x), StreamPayload::Loaded(y)) => equal_if(x == y),
        (
            StreamPayload::Deferred { offset: x, .. },
            StreamPayload::Deferred { offset: y, .. },
        ) => equal_if(x == y),
        _ => Comparison::Different,
    };
    combine([dict, payload])
}

fn compare_operators(a: &Operator, b: &Operator) -> Comparison {
    if a.name() != b.name() {
        return Comparison::Different;
    }
    compare_sequences(a.operands(), b.operands())
}

fn compare_contents(a: &Content, b: &Content) -> Comparison {
    if a.len() != b.len() {
        return Comparison::Different;
    }
    combine(a.iter().zip(b).map(|(x, y)| compare_operators(x, y)))
}
