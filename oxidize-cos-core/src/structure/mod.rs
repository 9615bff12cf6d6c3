//! Structure tree reference dictionaries
//!
//! Builders for the small dictionaries that tie tagged content to the
//! structure tree: marked-content references (`/MCR`), object references
//! (`/OBJR`) and structure elements. References to object 0 and empty
//! strings are left out of the result.

use crate::objects::{Dictionary, Name, Node, ObjectId};

fn push_reference(dict: &mut Dictionary, key: &str, id: Option<ObjectId>) {
    if let Some(id) = id.filter(ObjectId::is_valid) {
        dict.push(key, Node::Reference(id));
    }
}

/// Reference to a marked-content sequence, `<< /Type /MCR ... >>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarkedContentRef {
    /// Page the content stream is drawn on.
    pub page: Option<ObjectId>,
    /// Content stream holding the sequence, when it is not the page's own.
    pub stream: Option<ObjectId>,
    pub mcid: i64,
}

impl MarkedContentRef {
    pub fn new(mcid: i64) -> Self {
        Self {
            mcid,
            ..Self::default()
        }
    }

    pub fn to_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::with_capacity(4);
        dict.push("Type", Node::name("MCR"));
        push_reference(&mut dict, "Pg", self.page);
        push_reference(&mut dict, "Stm", self.stream);
        dict.push("MCID", Node::Integer(self.mcid));
        dict
    }
}

/// Reference to an annotation or XObject, `<< /Type /OBJR ... >>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectRef {
    pub page: Option<ObjectId>,
    pub object: Option<ObjectId>,
}

impl ObjectRef {
    pub fn to_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::with_capacity(3);
        dict.push("Type", Node::name("OBJR"));
        push_reference(&mut dict, "Pg", self.page);
        push_reference(&mut dict, "Obj", self.object);
        dict
    }
}

/// Structure element, `<< /Type /StructElem ... >>`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructElem {
    /// Structure type such as `P` or `Figure`.
    pub kind: String,
    /// Element identifier, written as a hex string.
    pub id: Vec<u8>,
    pub page: Option<ObjectId>,
    pub parent: Option<ObjectId>,
}

impl StructElem {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn to_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::with_capacity(5);
        dict.push("Type", Node::name("StructElem"));
        if !self.kind.is_empty() {
            dict.push("S", Node::Name(Name::new(self.kind.as_str())));
        }
        if !self.id.is_empty() {
            dict.push("ID", Node::hex(self.id.clone()));
        }
        push_reference(&mut dict, "Pg", self.page);
        push_reference(&mut dict, "P", self.parent);
        dict
    }
}

impl From<MarkedContentRef> for Node {
    fn from(mcr: MarkedContentRef) -> Self {
        Node::Dictionary(mcr.to_dictionary())
    }
}

impl From<ObjectRef> for Node {
    fn from(objr: ObjectRef) -> Self {
        Node::Dictionary(objr.to_dictionary())
    }
}

impl From<StructElem> for Node {
    fn from(elem: StructElem) -> Self {
        Node::Dictionary(elem.to_dictionary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(node: Node) -> String {
        String::from_utf8(node.to_bytes().unwrap()).unwrap()
    }

    #[test]
    fn test_marked_content_ref() {
        let mcr = MarkedContentRef {
            page: Some(ObjectId::new(4, 0)),
            stream: None,
            mcid: 7,
        };
        assert_eq!(text(mcr.into()), "<< /Type /MCR /Pg 4 0 R /MCID 7 >>");

        let with_stream = MarkedContentRef {
            stream: Some(ObjectId::new(9, 0)),
            ..MarkedContentRef::new(0)
        };
        assert_eq!(text(with_stream.into()), "<< /Type /MCR /Stm 9 0 R /MCID 0 >>");
    }

    #[test]
    fn test_object_ref_skips_object_zero() {
        let objr = ObjectRef {
            page: Some(ObjectId::new(0, 0)),
            object: Some(ObjectId::new(12, 0)),
        };
        assert_eq!(text(objr.into()), "<< /Type /OBJR /Obj 12 0 R >>");
    }

    #[test]
    fn test_struct_elem() {
        let elem = StructElem {
            kind: "Figure".to_string(),
            id: b"fig1".to_vec(),
            page: Some(ObjectId::new(3, 0)),
            parent: None,
        };
        assert_eq!(
            text(elem.clone().into()),
            "<< /Type /StructElem /S /Figure /ID <66696731> /Pg 3 0 R >>"
        );

        let child = StructElem {
            parent: Some(ObjectId::new(2, 0)),
            ..elem
        };
        let dict = child.to_dictionary();
        assert_eq!(dict.get_type(), Some("StructElem"));
        assert_eq!(
            dict.get("P").and_then(|v| v.as_reference()),
            Some(ObjectId::new(2, 0))
        );
        assert_eq!(dict.get("S").and_then(|v| v.as_name()).map(Name::as_str), Some("Figure"));
    }

    #[test]
    fn test_empty_struct_elem() {
        assert_eq!(text(StructElem::new("").into()), "<< /Type /StructElem >>");
    }
}
