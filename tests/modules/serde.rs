use mongo_bson::{
    deserialize, doc, from_bson, from_document, serialize, to_bson, to_document, Bson, ErrorKind,
    ObjectId, Timestamp,
};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Address {
    city: String,
    zip: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Person {
    name: String,
    age: i64,
    tags: Vec<String>,
    address: Option<Address>,
}

fn sample_person() -> Person {
    Person {
        name: "Ada".to_owned(),
        age: 36,
        tags: vec!["math".to_owned(), "engines".to_owned()],
        address: Some(Address {
            city: "London".to_owned(),
            zip: 1815,
        }),
    }
}

#[test]
fn test_struct_round_trip() {
    let person = sample_person();

    let bson = to_bson(&person).unwrap();
    let back: Person = from_bson(bson).unwrap();
    assert_eq!(back, person);
}

#[test]
fn test_struct_to_document_preserves_field_order() {
    let doc = to_document(&sample_person()).unwrap();
    let keys: Vec<_> = doc.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["name", "age", "tags", "address"]);
}

#[test]
fn test_struct_through_the_wire() {
    let person = sample_person();

    let doc = to_document(&person).unwrap();
    let bytes = serialize(&doc, false, false).unwrap();
    let decoded = deserialize(&bytes).unwrap();
    let back: Person = from_document(decoded).unwrap();

    assert_eq!(back, person);
}

#[test]
fn test_option_none_becomes_null() {
    let person = Person {
        address: None,
        ..sample_person()
    };

    let doc = to_document(&person).unwrap();
    assert!(doc.is_null("address"));

    let back: Person = from_document(doc).unwrap();
    assert_eq!(back.address, None);
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
enum Shape {
    Point,
    Circle(i64),
    Segment(i64, i64),
    Rect { w: i64, h: i64 },
}

#[test]
fn test_enum_representations() {
    assert_eq!(to_bson(&Shape::Point).unwrap(), Bson::String("Point".to_owned()));

    let circle = to_bson(&Shape::Circle(3)).unwrap();
    assert_eq!(circle, Bson::Document(doc! { "Circle" => 3 }));

    let segment = to_bson(&Shape::Segment(1, 2)).unwrap();
    assert_eq!(segment, Bson::Document(doc! { "Segment" => [1, 2] }));

    let rect = to_bson(&Shape::Rect { w: 4, h: 5 }).unwrap();
    assert_eq!(rect, Bson::Document(doc! { "Rect" => { "w" => 4, "h" => 5 } }));
}

#[test]
fn test_enum_round_trips() {
    for shape in [
        Shape::Point,
        Shape::Circle(3),
        Shape::Segment(1, 2),
        Shape::Rect { w: 4, h: 5 },
    ] {
        let bson = to_bson(&shape).unwrap();
        let back: Shape = from_bson(bson).unwrap();
        assert_eq!(back, shape);
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Record {
    id: ObjectId,
    seq: i64,
}

#[test]
fn test_object_id_field() {
    let record = Record {
        id: ObjectId::with_string("507f1f77bcf86cd799439011").unwrap(),
        seq: 1,
    };

    let doc = to_document(&record).unwrap();
    assert_eq!(
        doc.get_object_id("id").unwrap(),
        &ObjectId::with_string("507f1f77bcf86cd799439011").unwrap()
    );

    let back: Record = from_document(doc).unwrap();
    assert_eq!(back, record);
}

#[test]
fn test_bson_identity_through_serde() {
    let values = vec![
        Bson::Integer(7),
        Bson::String("s".to_owned()),
        Bson::Timestamp(Timestamp {
            time: 1,
            increment: 2,
        }),
        Bson::ObjectId(ObjectId::with_string("507f1f77bcf86cd799439011").unwrap()),
        Bson::MinKey,
        Bson::Document(doc! { "nested" => [1, 2] }),
    ];

    for value in values {
        let back: Bson = from_bson(value.clone()).unwrap();
        assert_eq!(back, value);
    }
}

#[test]
fn test_map_with_string_keys() {
    let mut map = BTreeMap::new();
    map.insert("one".to_owned(), 1i64);
    map.insert("two".to_owned(), 2i64);

    let doc = to_document(&map).unwrap();
    assert_eq!(doc, doc! { "one" => 1, "two" => 2 });

    let back: BTreeMap<String, i64> = from_document(doc).unwrap();
    assert_eq!(back, map);
}

#[test]
fn test_map_with_non_string_keys_is_rejected() {
    let mut map = BTreeMap::new();
    map.insert(1i64, "one".to_owned());

    let err = to_bson(&map).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Serialization { .. }));
}

#[test]
fn test_oversized_u64_is_rejected() {
    let err = to_bson(&u64::MAX).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IntegerOutOfRange { .. }));

    assert_eq!(to_bson(&5u64).unwrap(), Bson::Integer(5));
}

#[test]
fn test_missing_field_fails() {
    let doc = doc! { "name" => "only-name" };
    let result: Result<Person, _> = from_document(doc);
    assert!(result.is_err());
}

#[test]
fn test_wrong_type_fails() {
    let doc = doc! {
        "name" => "x",
        "age" => "not a number",
        "tags" => [],
        "address" => (Bson::Null)
    };
    let result: Result<Person, _> = from_document(doc);
    assert!(result.is_err());
}
