use skein_stream::JsonWriter;

fn compact(f: impl FnOnce(&mut JsonWriter<&mut Vec<u8>>) -> std::io::Result<()>) -> String {
    let mut buf = Vec::new();
    let mut writer = JsonWriter::new(&mut buf);
    f(&mut writer).unwrap();
    writer.finish().unwrap();

    String::from_utf8(buf).unwrap()
}

#[test]
fn test_object_members() {
    let out = compact(|w| {
        w.begin_object()?;
        w.name("x")?;
        w.f64(1.5)?;
        w.name("y")?;
        w.f64(-2.25)?;
        w.end_object()
    });

    assert_eq!(out, r#"{"x":1.5,"y":-2.25}"#);
}

#[test]
fn test_nested_arrays() {
    let out = compact(|w| {
        w.begin_array()?;
        w.i64(-1)?;
        w.begin_array()?;
        w.end_array()?;
        w.null()?;
        w.bool(true)?;
        w.u64(u64::MAX)?;
        w.end_array()
    });

    assert_eq!(out, "[-1,[],null,true,18446744073709551615]");
}

#[test]
fn test_string_escapes() {
    let out = compact(|w| w.string("a \"quoted\"\n\\ line"));
    assert_eq!(out, r#""a \"quoted\"\n\\ line""#);
}

#[test]
fn test_pretty_indent() {
    let mut buf = Vec::new();
    let mut writer = JsonWriter::with_pretty(&mut buf, true);
    writer.begin_object().unwrap();
    writer.name("a").unwrap();
    writer.begin_array().unwrap();
    writer.i64(1).unwrap();
    writer.end_array().unwrap();
    writer.end_object().unwrap();
    writer.finish().unwrap();

    assert_eq!(
        String::from_utf8(buf).unwrap(),
        "{\n    \"a\": [\n        1\n    ]\n}"
    );
}

#[test]
fn test_non_finite_rejected() {
    let mut buf = Vec::new();
    let mut writer = JsonWriter::new(&mut buf);
    assert!(writer.f64(f64::NAN).is_err());
    assert!(writer.f32(f32::INFINITY).is_err());
}

#[test]
fn test_misplaced_tokens() {
    let mut buf = Vec::new();
    let mut writer = JsonWriter::new(&mut buf);
    writer.begin_object().unwrap();
    assert!(writer.i64(1).is_err());
    assert!(writer.end_array().is_err());

    let mut buf = Vec::new();
    let mut writer = JsonWriter::new(&mut buf);
    assert!(writer.name("x").is_err());
}

#[test]
fn test_unterminated() {
    let mut buf = Vec::new();
    let mut writer = JsonWriter::new(&mut buf);
    writer.begin_array().unwrap();
    assert_eq!(writer.depth(), 1);
    assert!(writer.finish().is_err());
}
