use chrono::DateTime;
use skein::{shared, Composite, Error, JsonSerializer, SerializableEnum, Shared};

#[derive(Composite, Debug, Default, PartialEq)]
struct Point {
    x: f64,
    y: f64,
}

#[derive(Composite, Debug, Default, PartialEq)]
struct Line {
    start: Point,
    end: Point,
}

#[derive(Clone, Copy, Debug, PartialEq, SerializableEnum)]
enum Color {
    Red,
    #[variant(name = "deep-blue")]
    Blue,
}

impl Default for Color {
    fn default() -> Self {
        Color::Red
    }
}

#[derive(Composite, Debug, Default)]
struct Everything {
    flag: bool,
    small: i8,
    medium: i16,
    int: i32,
    long: i64,
    single: f32,
    double: f64,
    text: Option<String>,
    stamp: Option<DateTime<chrono::FixedOffset>>,
    color: Color,
    numbers: Vec<i32>,
    grid: Vec<Vec<u8>>,
    nothing: Option<Vec<i32>>,
}

fn serializer() -> JsonSerializer {
    let mut serializer = JsonSerializer::new();
    serializer
        .register::<Point>()
        .register::<Line>()
        .register::<Everything>();
    serializer
}

#[test]
fn test_point_layout() {
    let serializer = serializer();

    let json = serializer.to_string(&Point { x: 1.5, y: -2.25 }).unwrap();
    assert_eq!(json, r#"{"x":1.5,"y":-2.25}"#);

    let point: Point = serializer.from_str(&json).unwrap();
    assert_eq!(point, Point { x: 1.5, y: -2.25 });
}

#[test]
fn test_pretty_print() {
    let mut serializer = serializer();
    serializer.set_pretty_print(true);

    let json = serializer.to_string(&Point { x: 1.5, y: -2.25 }).unwrap();
    assert_eq!(json, "{\n    \"x\": 1.5,\n    \"y\": -2.25\n}");

    let point: Point = serializer.from_str(&json).unwrap();
    assert_eq!(point, Point { x: 1.5, y: -2.25 });
}

#[test]
fn test_nested_owned() {
    let serializer = serializer();
    let line = Line {
        start: Point { x: 0.5, y: 1.5 },
        end: Point { x: -3.5, y: 4.5 },
    };

    let json = serializer.to_string(&line).unwrap();
    assert_eq!(
        json,
        r#"{"start":{"x":0.5,"y":1.5},"end":{"x":-3.5,"y":4.5}}"#
    );
    assert_eq!(serializer.from_str::<Line>(&json).unwrap(), line);
}

#[test]
fn test_owned_ids() {
    let mut serializer = serializer();
    serializer.set_preserve_references(true);
    let line = Line {
        start: Point { x: 0.5, y: 1.5 },
        end: Point { x: -3.5, y: 4.5 },
    };

    let json = serializer.to_string(&line).unwrap();
    assert_eq!(
        json,
        r#"{"start":{"$id":"0","x":0.5,"y":1.5},"end":{"$id":"1","x":-3.5,"y":4.5}}"#
    );
    assert_eq!(serializer.from_str::<Line>(&json).unwrap(), line);
}

#[test]
fn test_all_kinds() {
    let serializer = serializer();
    let value = Everything {
        flag: true,
        small: -8,
        medium: 1600,
        int: -320_000,
        long: i64::MAX,
        single: 0.25,
        double: -1e-7,
        text: Some("line\nbreak \"quoted\"".into()),
        stamp: Some(DateTime::parse_from_rfc3339("2024-03-01T12:30:00.125+02:00").unwrap()),
        color: Color::Blue,
        numbers: vec![1, -2, 3],
        grid: vec![vec![1, 2], vec![], vec![3]],
        nothing: None,
    };

    let json = serializer.to_string(&value).unwrap();
    assert!(json.contains(r#""color":"deep-blue""#));
    assert!(json.contains(r#""stamp":"2024-03-01T12:30:00.125+02:00""#));
    assert!(json.contains(r#""grid":[[1,2],[],[3]]"#));
    assert!(json.contains(r#""nothing":null"#));

    let back: Everything = serializer.from_str(&json).unwrap();
    assert!(back.flag);
    assert_eq!(back.small, -8);
    assert_eq!(back.medium, 1600);
    assert_eq!(back.int, -320_000);
    assert_eq!(back.long, i64::MAX);
    assert_eq!(back.single, 0.25);
    assert_eq!(back.double, -1e-7);
    assert_eq!(back.text, value.text);
    assert_eq!(back.stamp, value.stamp);
    assert_eq!(back.color, Color::Blue);
    assert_eq!(back.numbers, vec![1, -2, 3]);
    assert_eq!(back.grid, value.grid);
    assert_eq!(back.nothing, None);
}

#[test]
fn test_empty_and_null() {
    #[derive(Composite, Default)]
    struct Bag {
        label: Option<String>,
        items: Vec<i32>,
        maybe: Option<Vec<i32>>,
        inner: Option<Point>,
        link: Option<Shared<Point>>,
    }

    let mut serializer = serializer();
    serializer.register::<Bag>();

    let json = serializer.to_string(&Bag::default()).unwrap();
    assert_eq!(
        json,
        r#"{"label":null,"items":[],"maybe":null,"inner":null,"link":null}"#
    );

    let bag: Bag = serializer.from_str(&json).unwrap();
    assert_eq!(bag.label, None);
    assert!(bag.items.is_empty());
    assert_eq!(bag.maybe, None);
    assert!(bag.inner.is_none());
    assert!(bag.link.is_none());
}

#[test]
fn test_unknown_fields_ignored() {
    let serializer = serializer();

    let point: Point = serializer
        .from_str(r#"{"x":1.5,"comment":"ignored","y":2.5,"extra":[1,{}]}"#)
        .unwrap();
    assert_eq!(point, Point { x: 1.5, y: 2.5 });
}

#[test]
fn test_first_duplicate_wins() {
    let serializer = serializer();

    let point: Point = serializer.from_str(r#"{"x":1.5,"x":9.5,"y":2.5}"#).unwrap();
    assert_eq!(point, Point { x: 1.5, y: 2.5 });
}

#[test]
fn test_unregistered_root() {
    let serializer = JsonSerializer::new();

    match serializer.from_str::<Point>(r#"{"x":1.5,"y":2.5}"#) {
        Err(Error::UnsupportedType { type_name, .. }) => assert_eq!(type_name, "Point"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_shared_field_round_trip() {
    #[derive(Composite, Default)]
    struct Holder {
        point: Shared<Point>,
    }

    let mut serializer = serializer();
    serializer.register::<Holder>();

    let holder = Holder {
        point: shared(Point { x: 1.5, y: 2.5 }),
    };
    let json = serializer.to_string(&holder).unwrap();
    assert_eq!(json, r#"{"point":{"x":1.5,"y":2.5}}"#);

    let back: Holder = serializer.from_str(&json).unwrap();
    assert_eq!(*back.point.borrow(), Point { x: 1.5, y: 2.5 });
}

#[test]
fn test_serializer_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<JsonSerializer>();
}
