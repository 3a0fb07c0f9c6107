use skein_stream::{read_document, Node};

#[test]
fn test_member_order_and_duplicates() {
    let doc = read_document(r#"{"b":1,"a":"x","b":2}"#.as_bytes()).unwrap();
    let obj = match &doc {
        Node::Object(obj) => obj,
        other => panic!("expected object, got {}", other.kind()),
    };

    let names: Vec<_> = obj.fields().map(|f| f.name()).collect();
    assert_eq!(names, ["b", "a", "b"]);

    let b = obj.field("b").unwrap();
    assert!(matches!(b.value(), Node::Number(n) if n == "1"));
}

#[test]
fn test_consume_once() {
    let doc = read_document(r#"{"v":true}"#.as_bytes()).unwrap();
    let Node::Object(obj) = &doc else {
        panic!("expected object");
    };

    let field = obj.field("v").unwrap();
    assert!(!field.is_consumed());
    assert!(matches!(field.consume(), Some(Node::Bool(true))));
    assert!(field.is_consumed());
    assert!(field.consume().is_none());
}

#[test]
fn test_number_text() {
    let doc = read_document("[0, -7, 18446744073709551615, 1.5, -2.25]".as_bytes()).unwrap();
    let Node::Array(items) = doc else {
        panic!("expected array");
    };

    let texts: Vec<_> = items
        .iter()
        .map(|n| match n {
            Node::Number(t) => t.as_str(),
            other => panic!("expected number, got {}", other.kind()),
        })
        .collect();
    assert_eq!(texts, ["0", "-7", "18446744073709551615", "1.5", "-2.25"]);
}

#[test]
fn test_number_lexeme_kept() {
    let doc = read_document(r#"{"a": 2.0, "b": 1e3, "c": -0.50, "d": 1E-2}"#.as_bytes()).unwrap();
    let Node::Object(object) = doc else {
        panic!("expected object");
    };

    let texts: Vec<_> = object
        .fields()
        .map(|f| match f.value() {
            Node::Number(t) => t.as_str(),
            other => panic!("expected number, got {}", other.kind()),
        })
        .collect();
    assert_eq!(texts, ["2.0", "1e3", "-0.50", "1E-2"]);
}

#[test]
fn test_kinds() {
    let doc = read_document(r#"[null, false, "s", [], {}]"#.as_bytes()).unwrap();
    let Node::Array(items) = doc else {
        panic!("expected array");
    };

    let kinds: Vec<_> = items.iter().map(Node::kind).collect();
    assert_eq!(kinds, ["null", "boolean", "string", "array", "object"]);
    assert!(items[0].is_null());
}

#[test]
fn test_malformed() {
    assert!(read_document("{\"a\":".as_bytes()).is_err());
    assert!(read_document("{} {}".as_bytes()).is_err());
    assert!(read_document("".as_bytes()).is_err());
}
