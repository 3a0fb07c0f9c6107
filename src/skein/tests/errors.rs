use std::io::{self, Read, Write};

use skein::{
    impl_primitive_value, Composite, CompositeDeserializationContext, CompositeSerializable,
    CompositeSerializationContext, Error, JsonSerializer, PrimitiveDeserializationContext,
    PrimitiveSerializable, PrimitiveSerializationContext, Result, SerializableEnum,
};

#[derive(Composite, Debug, Default, PartialEq)]
struct Point {
    x: f64,
    y: f64,
}

#[derive(Composite, Debug, Default)]
struct Counter {
    count: i8,
}

#[derive(Composite, Debug, Default)]
struct Tally {
    count: i32,
}

#[derive(Composite, Debug, Default)]
struct Upload {
    name: String,
    data: String,
}

/// A sink whose every write fails.
struct ClosedPipe;

impl Write for ClosedPipe {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A source whose every read fails.
struct DroppedConnection;

impl Read for DroppedConnection {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
    }
}

#[derive(Debug, Default, PartialEq, SerializableEnum)]
enum Mode {
    #[default]
    Fast,
    Safe,
}

#[derive(Composite, Debug, Default)]
struct Settings {
    mode: Mode,
}

fn serializer() -> JsonSerializer {
    let mut serializer = JsonSerializer::new();
    serializer
        .register::<Point>()
        .register::<Counter>()
        .register::<Tally>()
        .register::<Settings>();
    serializer
}

#[test]
fn test_missing_field() {
    match serializer().from_str::<Point>(r#"{"x":1.5}"#) {
        Err(Error::MissingRequiredField(field)) => assert_eq!(field, "y"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_malformed_number() {
    match serializer().from_str::<Counter>(r#"{"count":300}"#) {
        Err(Error::MalformedNumber { field, text }) => {
            assert_eq!(field, "count");
            assert_eq!(text, "300");
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let result = serializer().from_str::<Counter>(r#"{"count":1.5}"#);
    assert!(matches!(result, Err(Error::MalformedNumber { .. })));
}

#[test]
fn test_integer_rejects_fraction_and_exponent() {
    for (json, text) in [
        (r#"{"count":2.0}"#, "2.0"),
        (r#"{"count":1e3}"#, "1e3"),
        (r#"{"count":-0.0}"#, "-0.0"),
    ] {
        match serializer().from_str::<Tally>(json) {
            Err(Error::MalformedNumber { field, text: actual }) => {
                assert_eq!(field, "count");
                assert_eq!(actual, text);
            }
            other => panic!("unexpected result for {json}: {other:?}"),
        }
    }

    let tally: Tally = serializer().from_str(r#"{"count":-2147483648}"#).unwrap();
    assert_eq!(tally.count, i32::MIN);
}

#[test]
fn test_float_accepts_exponent() {
    let point: Point = serializer().from_str(r#"{"x":1e3,"y":-2.50E-1}"#).unwrap();
    assert_eq!(point, Point { x: 1000.0, y: -0.25 });
}

#[test]
fn test_field_type_mismatch() {
    match serializer().from_str::<Point>(r#"{"x":"1.5","y":2}"#) {
        Err(Error::FieldTypeMismatch {
            field,
            expected,
            actual,
        }) => {
            assert_eq!(field, "x");
            assert_eq!(expected, "number");
            assert_eq!(actual, "string");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_structural_mismatch() {
    let result = serializer().from_str::<Point>(r#"{"x":[1.5],"y":2}"#);
    assert!(matches!(result, Err(Error::StructuralMismatch { .. })));

    let result = serializer().from_str::<Point>("[1.5, 2]");
    assert!(matches!(result, Err(Error::StructuralMismatch { .. })));
}

#[test]
fn test_unknown_enum_value() {
    let serializer = serializer();

    let settings: Settings = serializer.from_str(r#"{"mode":"Safe"}"#).unwrap();
    assert_eq!(settings.mode, Mode::Safe);

    match serializer.from_str::<Settings>(r#"{"mode":"safe"}"#) {
        Err(Error::UnknownEnumValue {
            field,
            enum_name,
            value,
        }) => {
            assert_eq!(field, "mode");
            assert_eq!(enum_name, "Mode");
            assert_eq!(value, "safe");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_invalid_document() {
    let result = serializer().from_str::<Point>(r#"{"x":1.5,"y""#);
    assert!(matches!(result, Err(Error::InvalidDocument(_))));

    let result = serializer().from_str::<Point>(r#"{"x":1.5,"y":2} trailing"#);
    assert!(matches!(result, Err(Error::InvalidDocument(_))));
}

#[test]
fn test_non_finite_float() {
    let result = serializer().to_string(&Point { x: f64::NAN, y: 0.5 });
    match result {
        Err(Error::SerializationFailure { field, .. }) => assert_eq!(field, "x"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_write_failure_names_field() {
    // Larger than the output buffer, so the value reaches the sink
    // while its own token is written.
    let upload = Upload {
        name: "dump".to_owned(),
        data: "x".repeat(64 * 1024),
    };

    match serializer().serialize(&upload, ClosedPipe) {
        Err(Error::SerializationFailure { field, source }) => {
            assert_eq!(field, "data");
            assert_eq!(source.kind(), io::ErrorKind::BrokenPipe);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_write_failure_on_flush() {
    match serializer().serialize(&Point { x: 1.0, y: 2.0 }, ClosedPipe) {
        Err(Error::SerializationFailure { field, source }) => {
            assert_eq!(field, "<root>");
            assert_eq!(source.kind(), io::ErrorKind::BrokenPipe);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_read_failure_is_io() {
    match serializer().deserialize::<Point, _>(DroppedConnection) {
        Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_field_read_twice() {
    #[derive(Debug, Default)]
    struct Greedy;

    impl CompositeSerializable for Greedy {
        fn serialize(&self, ctx: &mut CompositeSerializationContext<'_, '_>) -> Result<()> {
            ctx.write_i32("value", 1)
        }

        fn deserialize(&mut self, ctx: &mut CompositeDeserializationContext<'_, '_>) -> Result<()> {
            ctx.read_i32("value")?;
            ctx.read_i32("value")?;
            Ok(())
        }
    }

    let mut serializer = serializer();
    serializer.register::<Greedy>();

    match serializer.from_str::<Greedy>(r#"{"value":1}"#) {
        Err(Error::FieldAlreadyRead(field)) => assert_eq!(field, "value"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_construction_failure() {
    #[derive(Debug, Default)]
    struct Picky {
        level: i32,
    }

    impl CompositeSerializable for Picky {
        fn serialize(&self, ctx: &mut CompositeSerializationContext<'_, '_>) -> Result<()> {
            ctx.write_i32("level", self.level)
        }

        fn deserialize(&mut self, ctx: &mut CompositeDeserializationContext<'_, '_>) -> Result<()> {
            self.level = ctx.read_i32("level")?;
            if self.level < 0 {
                return Err(Error::custom(format_args!("level {} is negative", self.level)));
            }
            Ok(())
        }
    }

    let mut serializer = serializer();
    serializer.register::<Picky>();

    assert_eq!(serializer.from_str::<Picky>(r#"{"level":3}"#).unwrap().level, 3);
    match serializer.from_str::<Picky>(r#"{"level":-3}"#) {
        Err(Error::Construction { type_name, source }) => {
            assert_eq!(type_name, "Picky");
            assert_eq!(source.to_string(), "level -3 is negative");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_invalid_primitive() {
    #[derive(Debug)]
    struct Chatty;

    impl PrimitiveSerializable for Chatty {
        fn serialize(&self, ctx: &mut PrimitiveSerializationContext<'_>) -> Result<()> {
            ctx.write(Some("one"));
            ctx.write(Some("two"));
            Ok(())
        }

        fn deserialize(_: &mut PrimitiveDeserializationContext<'_>) -> Result<Self> {
            Ok(Chatty)
        }
    }
    impl_primitive_value!(Chatty);

    #[derive(Debug, Default)]
    struct Wrapper;

    impl CompositeSerializable for Wrapper {
        fn serialize(&self, ctx: &mut CompositeSerializationContext<'_, '_>) -> Result<()> {
            ctx.write_field("chatty", &Chatty)
        }

        fn deserialize(&mut self, _: &mut CompositeDeserializationContext<'_, '_>) -> Result<()> {
            Ok(())
        }
    }

    match serializer().to_string(&Wrapper) {
        Err(Error::InvalidPrimitive { type_name, count }) => {
            assert_eq!(type_name, "Chatty");
            assert_eq!(count, 2);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
