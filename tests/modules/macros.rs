use mongo_bson::{bson, doc, Bson};

#[test]
fn test_empty_literals() {
    assert_eq!(bson!([]), Bson::Array(vec![]));
    assert!(doc! {}.is_empty());
}

#[test]
fn test_nested_literals() {
    let value = bson!({
        "name" => "library",
        "tags" => ["binary", ["nested", 1]],
        "meta" => { "depth" => 2 }
    });

    let doc = match value {
        Bson::Document(doc) => doc,
        other => panic!("expected document, got {other}"),
    };

    assert_eq!(doc.get_str("name").unwrap(), "library");

    let tags = doc.get_array("tags").unwrap();
    assert_eq!(tags[0], Bson::String("binary".to_owned()));
    assert_eq!(
        tags[1],
        Bson::Array(vec![Bson::String("nested".to_owned()), Bson::Integer(1)])
    );

    assert_eq!(doc.get_document("meta").unwrap().get_i64("depth").unwrap(), 2);
}

#[test]
fn test_trailing_commas() {
    let doc = doc! {
        "a" => 1,
        "b" => [2, 3,],
    };

    assert_eq!(doc.get_i64("a").unwrap(), 1);
    assert_eq!(doc.get_array("b").unwrap().len(), 2);
}

#[test]
fn test_expression_values() {
    let n = 4;
    let doc = doc! {
        "sum" => (n + 1),
        "negative" => (-20),
        "null" => (Bson::Null)
    };

    assert_eq!(doc.get_i64("sum").unwrap(), 5);
    assert_eq!(doc.get_i64("negative").unwrap(), -20);
    assert!(doc.is_null("null"));
}

#[test]
fn test_owned_and_borrowed_strings() {
    let owned = "value".to_owned();
    let doc = doc! {
        "borrowed" => "str",
        "owned" => (owned.clone()),
        "reference" => (&owned)
    };

    assert_eq!(doc.get_str("borrowed").unwrap(), "str");
    assert_eq!(doc.get_str("owned").unwrap(), "value");
    assert_eq!(doc.get_str("reference").unwrap(), "value");
}
