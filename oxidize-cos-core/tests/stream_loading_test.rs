//! Deferred and eager stream payloads, crypt traversal and the writer
//! working together on whole indirect objects.

use oxidize_cos::{
    crypt_object, parse_indirect_object, CosError, CryptMode, Node, ObjectId, ParseOptions,
    StreamLoading, WriteError,
};
use pretty_assertions::assert_eq;
use std::rc::Rc;

const SOURCE: &[u8] =
    b"4 0 obj\r\n<< /Filter /FlateDecode /Length 8 >>\r\nstream\r\nx\x9c\x03\x00\x00\x00\x00\x01\r\nendstream\r\nendobj\r\n";

#[test]
fn test_deferred_then_loaded() {
    let mut obj = parse_indirect_object(SOURCE, ParseOptions::deferred()).unwrap();
    assert_eq!(obj.id, ObjectId::new(4, 0));

    let stream = obj.value.as_stream().unwrap();
    assert!(!stream.is_loaded());
    let offset = stream.source_offset().unwrap();
    assert_eq!(&SOURCE[offset..offset + 2], b"x\x9c");

    match Rc::make_mut(&mut obj.value) {
        Node::Stream(stream) => stream.load(SOURCE, &ParseOptions::default()).unwrap(),
        other => panic!("expected a stream, got {}", other.type_name()),
    }

    let eager = parse_indirect_object(SOURCE, ParseOptions::default()).unwrap();
    let loaded = obj.value.as_stream().unwrap();
    assert!(loaded.is_loaded());
    assert_eq!(loaded.data(), eager.value.as_stream().unwrap().data());
    assert_eq!(loaded.data().map(<[u8]>::len), Some(8));
}

#[test]
fn test_deferred_stream_cannot_be_written() {
    let obj = parse_indirect_object(SOURCE, ParseOptions::deferred()).unwrap();
    let result = Node::IndirectObject(obj).to_bytes();
    assert!(matches!(result, Err(WriteError::PayloadNotLoaded { .. })));
}

#[test]
fn test_untrusted_length_still_finds_payload() {
    let options = ParseOptions {
        trust_length: false,
        ..ParseOptions::default()
    };
    assert_eq!(options.stream_loading, StreamLoading::Eager);

    let obj = parse_indirect_object(SOURCE, options).unwrap();
    assert_eq!(
        obj.value.as_stream().unwrap().data(),
        Some(&b"x\x9c\x03\x00\x00\x00\x00\x01"[..])
    );
}

#[test]
fn test_deferred_load_matches_eager_without_trusted_length() {
    // /Length points at the endstream inside the payload
    let source = b"6 0 obj\n<< /Length 2 >>\nstream\nab\nendstream\nendstream\nendobj\n";
    for trust_length in [true, false] {
        let eager = ParseOptions {
            trust_length,
            ..ParseOptions::default()
        };
        let deferred = ParseOptions {
            stream_loading: StreamLoading::Deferred,
            ..eager
        };

        let expected = parse_indirect_object(source, eager).unwrap();
        let mut obj = parse_indirect_object(source, deferred).unwrap();
        if let Node::Stream(stream) = Rc::make_mut(&mut obj.value) {
            stream.load(source, &deferred).unwrap();
        }

        let data = obj.value.as_stream().unwrap().data();
        assert_eq!(data, expected.value.as_stream().unwrap().data());
        let want: &[u8] = if trust_length { b"ab" } else { b"ab\nendstream" };
        assert_eq!(data, Some(want));
    }
}

#[test]
fn test_stream_written_back() {
    let source = b"9 0 obj\n<< /Length 3 >>\nstream\nq Q\nendstream\nendobj\n";
    let obj = parse_indirect_object(source, ParseOptions::default()).unwrap();
    let bytes = Node::IndirectObject(obj).to_bytes().unwrap();
    assert_eq!(
        String::from_utf8(bytes.clone()).unwrap(),
        "9 0 obj\n<< /Length 3 >>\nstream\nq Q\nendstream\nendobj\n"
    );

    let again = parse_indirect_object(&bytes, ParseOptions::default()).unwrap();
    assert_eq!(again.value.as_stream().unwrap().data(), Some(&b"q Q"[..]));
}

#[test]
fn test_crypt_round_trip_restores_payloads() {
    let mut obj = parse_indirect_object(
        b"2 0 obj\n<< /T (secret) /Length 4 >>\nstream\ndata\nendstream",
        ParseOptions::default(),
    )
    .unwrap();
    let original = Node::IndirectObject(obj.clone());

    let rotate = |by: u8| {
        move |_: ObjectId, data: &mut Vec<u8>| -> oxidize_cos::Result<()> {
            for byte in data.iter_mut() {
                *byte = byte.wrapping_add(by);
            }
            Ok(())
        }
    };

    assert_eq!(crypt_object(&mut obj, CryptMode::All, rotate(13)).unwrap(), 2);
    assert!(!Node::IndirectObject(obj.clone()).compare(&original).is_match());

    crypt_object(&mut obj, CryptMode::All, rotate(243)).unwrap();
    assert!(Node::IndirectObject(obj).compare(&original).is_match());
}

#[test]
fn test_crypt_on_deferred_stream_fails() {
    let mut obj = parse_indirect_object(SOURCE, ParseOptions::deferred()).unwrap();
    let result = crypt_object(&mut obj, CryptMode::StreamsOnly, |_, _| Ok(()));
    assert!(matches!(result, Err(CosError::PayloadNotLoaded { .. })));
}
