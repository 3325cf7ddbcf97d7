use byteorder::{LittleEndian, WriteBytesExt};
use chrono::{TimeZone, Utc};
use mongo_bson::{
    deserialize, doc, serialize, spec::BinarySubtype, Binary, Bson, DbRef, ErrorKind,
    JavaScriptCodeWithScope, ObjectId, Regex, Timestamp,
};
use pretty_assertions::assert_eq;
use std::io::Write;

// Wraps a single already-encoded element into a full document payload.
fn document_with_element(element: &[u8]) -> Vec<u8> {
    let mut bytes = vec![];
    bytes
        .write_i32::<LittleEndian>((element.len() + 5) as i32)
        .unwrap();
    bytes.write_all(element).unwrap();
    bytes.write_u8(0).unwrap();
    bytes
}

#[test]
fn test_decode_round_trips_every_variant() {
    let doc = doc! {
        "double" => 3.25,
        "string" => "value",
        "array" => [1, "two", false],
        "doc" => { "nested" => (Bson::Null) },
        "bool" => true,
        "null" => (Bson::Null),
        "regex" => (Regex { pattern: "^a".to_owned(), options: "im".to_owned() }),
        "code" => (Bson::JavaScriptCode("return 1;".to_owned())),
        "code_w_scope" => (JavaScriptCodeWithScope {
            code: "f(x)".to_owned(),
            scope: doc! { "x" => 10 },
        }),
        "int_small" => 17,
        "int_large" => (1i64 << 40),
        "timestamp" => (Timestamp { time: 4, increment: 9 }),
        "binary" => (Binary { subtype: BinarySubtype::Md5, bytes: vec![9, 8, 7] }),
        "binary_old" => (Binary { subtype: BinarySubtype::BinaryOld, bytes: vec![1, 2] }),
        "oid" => (ObjectId::with_string("507f1f77bcf86cd799439011").unwrap()),
        "date" => (Utc.timestamp_millis_opt(1286705410555).unwrap()),
        "symbol" => (Bson::Symbol("sym".to_owned())),
        "dbref" => (DbRef {
            namespace: "db.collection".to_owned(),
            id: Box::new(Bson::ObjectId(ObjectId::with_string("507f1f77bcf86cd799439011").unwrap())),
        }),
        "min" => (Bson::MinKey),
        "max" => (Bson::MaxKey),
    };

    let bytes = serialize(&doc, false, false).unwrap();
    let decoded = deserialize(&bytes).unwrap();

    assert_eq!(decoded, doc);
}

#[test]
fn test_decode_undefined_becomes_null() {
    let bytes = document_with_element(&[0x06, b'u', 0]);
    let decoded = deserialize(&bytes).unwrap();

    assert_eq!(decoded, doc! { "u" => (Bson::Null) });
}

#[test]
fn test_decode_dbpointer_becomes_dbref() {
    let mut element = vec![0x0C, b'p', 0];
    element.write_i32::<LittleEndian>(5).unwrap();
    element.write_all(b"db.c\0").unwrap();
    element
        .write_all(&ObjectId::with_string("507f1f77bcf86cd799439011").unwrap().bytes())
        .unwrap();

    let decoded = deserialize(&document_with_element(&element)).unwrap();

    assert_eq!(
        decoded,
        doc! {
            "p" => (DbRef {
                namespace: "db.c".to_owned(),
                id: Box::new(Bson::ObjectId(
                    ObjectId::with_string("507f1f77bcf86cd799439011").unwrap()
                )),
            })
        }
    );
}

#[test]
fn test_decode_ref_document_becomes_dbref() {
    let inner = doc! { "$ref" => "coll", "$id" => 5 };
    let bytes = serialize(&doc! { "r" => (inner) }, false, false).unwrap();
    let decoded = deserialize(&bytes).unwrap();

    assert_eq!(
        decoded.get("r"),
        Some(&Bson::DbRef(DbRef {
            namespace: "coll".to_owned(),
            id: Box::new(Bson::Integer(5)),
        }))
    );
}

#[test]
fn test_ref_must_be_first_key_for_dbref() {
    let inner = doc! { "a" => 1, "$ref" => "coll", "$id" => 5 };
    let bytes = serialize(&doc! { "r" => (inner.clone()) }, false, false).unwrap();
    let decoded = deserialize(&bytes).unwrap();

    assert_eq!(decoded.get("r"), Some(&Bson::Document(inner)));
}

#[test]
fn test_decode_boolean_accepts_nonzero() {
    let bytes = document_with_element(&[0x08, b'b', 0, 0x02]);
    let decoded = deserialize(&bytes).unwrap();

    assert_eq!(decoded, doc! { "b" => true });
}

#[test]
fn test_decode_array_discards_keys() {
    // Array whose index keys are "5" and "9"; values still come out in
    // wire order.
    let mut array = vec![];
    array.write_i32::<LittleEndian>(19).unwrap();
    array.write_all(&[0x10, b'5', 0]).unwrap();
    array.write_i32::<LittleEndian>(1).unwrap();
    array.write_all(&[0x10, b'9', 0]).unwrap();
    array.write_i32::<LittleEndian>(2).unwrap();
    array.write_u8(0).unwrap();

    let mut element = vec![0x04, b'a', 0];
    element.write_all(&array).unwrap();

    let decoded = deserialize(&document_with_element(&element)).unwrap();
    assert_eq!(decoded, doc! { "a" => [1, 2] });
}

#[test]
fn test_decode_negative_datetime() {
    let doc = doc! { "d" => (Utc.timestamp_millis_opt(-1000).unwrap()) };
    let bytes = serialize(&doc, false, false).unwrap();

    assert_eq!(deserialize(&bytes).unwrap(), doc);
}

#[test]
fn test_decode_unknown_tag_names_it() {
    let bytes = document_with_element(&[0xAB, b'u', 0]);
    let err = deserialize(&bytes).unwrap_err();

    match err.kind {
        ErrorKind::UnrecognizedElementType { key, element_type } => {
            assert_eq!(key, "u");
            assert_eq!(element_type, 0xAB);
        }
        other => panic!("expected unrecognized element type, got {other}"),
    }
}

#[test]
fn test_decode_empty_input() {
    let err = deserialize(&[]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::EndOfStream));
}

#[test]
fn test_decode_truncated_document() {
    let bytes = serialize(&doc! { "a" => 1 }, false, false).unwrap();
    let err = deserialize(&bytes[..bytes.len() - 1]).unwrap_err();

    assert!(matches!(
        err.kind,
        ErrorKind::EndOfStream | ErrorKind::MalformedBytes { .. }
    ));
}

#[test]
fn test_decode_length_overruns_input() {
    let err = deserialize(&[10, 0, 0, 0, 0]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::EndOfStream));
}

#[test]
fn test_decode_length_shorter_than_content() {
    let mut bytes = serialize(&doc! { "a" => 1, "b" => 2 }, false, false).unwrap();
    let shorter = (bytes.len() as i32 - 9).to_le_bytes();
    bytes[..4].copy_from_slice(&shorter);

    assert!(deserialize(&bytes).is_err());
}

#[test]
fn test_decode_trailing_garbage() {
    let mut bytes = serialize(&doc! { "a" => 1 }, false, false).unwrap();
    bytes.push(0);

    let err = deserialize(&bytes).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MalformedBytes { .. }));
}

#[test]
fn test_decode_invalid_utf8_string() {
    let mut element = vec![0x02, b's', 0];
    element.write_i32::<LittleEndian>(3).unwrap();
    element.write_all(&[0x80, 0xAE, 0x00]).unwrap();

    let err = deserialize(&document_with_element(&element)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Utf8Encoding));
}

#[test]
fn test_decode_string_missing_terminator() {
    let mut element = vec![0x02, b's', 0];
    element.write_i32::<LittleEndian>(3).unwrap();
    element.write_all(&[b'h', b'i', b'!']).unwrap();

    let err = deserialize(&document_with_element(&element)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MalformedBytes { .. }));
}

#[test]
fn test_decode_binary_old_inner_length_mismatch() {
    let mut element = vec![0x05, b'b', 0];
    element.write_i32::<LittleEndian>(8).unwrap();
    element.write_u8(0x02).unwrap();
    element.write_i32::<LittleEndian>(3).unwrap(); // should be 4
    element.write_all(&[1, 2, 3, 4]).unwrap();

    let err = deserialize(&document_with_element(&element)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MalformedBytes { .. }));
}

#[test]
fn test_decode_negative_binary_length() {
    let mut element = vec![0x05, b'b', 0];
    element.write_i32::<LittleEndian>(-1).unwrap();
    element.write_u8(0x00).unwrap();

    let err = deserialize(&document_with_element(&element)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MalformedBytes { .. }));
}

#[test]
fn test_decode_code_with_scope_length_mismatch() {
    // Valid code and scope, but the declared total is one byte short.
    let mut payload = vec![];
    payload.write_i32::<LittleEndian>(2).unwrap();
    payload.write_all(b"f\0").unwrap();
    payload.write_all(&[5, 0, 0, 0, 0]).unwrap();

    let mut element = vec![0x0F, b'c', 0];
    element
        .write_i32::<LittleEndian>((payload.len() + 4 - 1) as i32)
        .unwrap();
    element.write_all(&payload).unwrap();

    let err = deserialize(&document_with_element(&element)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MalformedBytes { .. }));
}

#[test]
fn test_decode_illegal_size() {
    let buffer = [0x06, 0xcc, 0xf9, 0x0a, 0x05, 0x00, 0x00, 0x03, 0x00, 0xff, 0xff];
    assert!(deserialize(&buffer).is_err());
}

#[test]
fn test_decode_overflowing_lengths() {
    let buffer = b"*\xc9*\xc9\t\x00\x00\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\xca\x01\t\x00\x00\x01\x10";
    assert!(deserialize(&buffer[..]).is_err());
}

#[test]
fn test_decode_wire_order_is_preserved() {
    let doc = doc! { "z" => 1, "a" => 2, "m" => 3 };
    let bytes = serialize(&doc, false, false).unwrap();
    let decoded = deserialize(&bytes).unwrap();

    let keys: Vec<_> = decoded.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["z", "a", "m"]);
}
