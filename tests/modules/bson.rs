use chrono::{TimeZone, Utc};
use mongo_bson::{
    doc, spec::BinarySubtype, spec::ElementType, Binary, Bson, DbRef, ErrorKind, ObjectId, Regex,
    Timestamp,
};
use serde_json::json;

#[test]
fn test_element_type_follows_integer_width() {
    assert_eq!(Bson::Integer(1).element_type(), ElementType::Int32);
    assert_eq!(
        Bson::Integer(i64::from(i32::MAX)).element_type(),
        ElementType::Int32
    );
    assert_eq!(
        Bson::Integer(i64::from(i32::MAX) + 1).element_type(),
        ElementType::Int64
    );
    assert_eq!(
        Bson::Integer(i64::from(i32::MIN) - 1).element_type(),
        ElementType::Int64
    );
}

#[test]
fn test_dbref_reports_document_element_type() {
    let value = Bson::DbRef(DbRef {
        namespace: "ns".to_owned(),
        id: Box::new(Bson::Integer(1)),
    });
    assert_eq!(value.element_type(), ElementType::EmbeddedDocument);
}

#[test]
fn test_try_from_oversized_integers() {
    let err = Bson::try_from(u64::MAX).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IntegerOutOfRange { .. }));

    let err = Bson::try_from(i128::from(i64::MAX) + 1).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IntegerOutOfRange { .. }));

    let err = Bson::try_from(i128::from(i64::MIN) - 1).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IntegerOutOfRange { .. }));

    assert_eq!(Bson::try_from(42u64).unwrap(), Bson::Integer(42));
    assert_eq!(Bson::try_from(-3i128).unwrap(), Bson::Integer(-3));
}

#[test]
fn test_to_json_plain_values() {
    let doc = doc! { "s" => "x", "n" => 5, "f" => 1.5, "b" => true, "null" => (Bson::Null) };
    let value = Bson::Document(doc).to_json();

    assert_eq!(
        value,
        json!({ "s": "x", "n": 5, "f": 1.5, "b": true, "null": null })
    );
}

#[test]
fn test_to_json_extended_values() {
    let id = ObjectId::with_string("507f1f77bcf86cd799439011").unwrap();
    assert_eq!(
        Bson::ObjectId(id).to_json(),
        json!({ "$oid": "507f1f77bcf86cd799439011" })
    );

    let regex = Bson::RegularExpression(Regex {
        pattern: "^a".to_owned(),
        options: "i".to_owned(),
    });
    assert_eq!(regex.to_json(), json!({ "$regex": "^a", "$options": "i" }));

    let date = Bson::DateTime(Utc.timestamp_millis_opt(1_000).unwrap());
    assert_eq!(date.to_json(), json!({ "$date": { "$numberLong": 1000 } }));
}

#[test]
fn test_from_json_reverses_extended_forms() {
    let value = Bson::from_json(&json!({ "$oid": "507f1f77bcf86cd799439011" }));
    assert_eq!(
        value,
        Bson::ObjectId(ObjectId::with_string("507f1f77bcf86cd799439011").unwrap())
    );

    let value = Bson::from_json(&json!({ "$symbol": "s" }));
    assert_eq!(value, Bson::Symbol("s".to_owned()));

    let value = Bson::from_json(&json!({ "$minKey": 1 }));
    assert_eq!(value, Bson::MinKey);

    // Near-misses stay plain documents.
    let value = Bson::from_json(&json!({ "$oid": "not-hex" }));
    assert!(matches!(value, Bson::Document(_)));
}

#[test]
fn test_extended_document_round_trips() {
    let values = vec![
        Bson::RegularExpression(Regex {
            pattern: "p".to_owned(),
            options: "im".to_owned(),
        }),
        Bson::JavaScriptCode("f()".to_owned()),
        Bson::Timestamp(Timestamp {
            time: 7,
            increment: 3,
        }),
        Bson::Binary(Binary {
            subtype: BinarySubtype::Md5,
            bytes: vec![1, 2],
        }),
        Bson::ObjectId(ObjectId::with_string("507f1f77bcf86cd799439011").unwrap()),
        Bson::DateTime(Utc.timestamp_millis_opt(86_400_000).unwrap()),
        Bson::Symbol("sym".to_owned()),
        Bson::DbRef(DbRef {
            namespace: "db.c".to_owned(),
            id: Box::new(Bson::Integer(9)),
        }),
        Bson::MinKey,
        Bson::MaxKey,
    ];

    for value in values {
        let extended = value.to_extended_document();
        assert_eq!(Bson::from_extended_document(extended), value);
    }
}

#[test]
fn test_accessors() {
    assert_eq!(Bson::Double(1.5).as_f64(), Some(1.5));
    assert_eq!(Bson::String("x".to_owned()).as_str(), Some("x"));
    assert_eq!(Bson::Integer(2).as_i64(), Some(2));
    assert_eq!(Bson::Boolean(true).as_bool(), Some(true));
    assert_eq!(Bson::Null.as_null(), Some(()));
    assert_eq!(Bson::Symbol("s".to_owned()).as_symbol(), Some("s"));

    assert_eq!(Bson::Null.as_i64(), None);
    assert_eq!(Bson::Integer(2).as_f64(), None);
}
