use skein::{Composite, Error, JsonSerializer, SerializableEnum};

#[derive(Clone, Copy, Debug, PartialEq, SerializableEnum)]
enum Level {
    Low,
    #[variant(name = "HIGH")]
    High,
}

#[test]
fn test_enum_names() {
    assert_eq!(Level::Low.name(), "Low");
    assert_eq!(Level::High.name(), "HIGH");
    assert_eq!(Level::from_name("HIGH"), Some(Level::High));
    assert_eq!(Level::from_name("High"), None);
    assert_eq!(Level::from_name("low"), None);
}

#[test]
fn test_renamed_fields() {
    #[derive(Composite, Debug, Default, PartialEq)]
    #[object(name = "Box")]
    struct Crate {
        #[field(name = "Width")]
        width: u32,
        #[field(name = "Height")]
        height: u32,
    }

    let mut serializer = JsonSerializer::new();
    serializer.register::<Crate>();
    assert_eq!(serializer.registry().type_name_of::<Crate>(), Some("Box"));

    let value = Crate {
        width: 3,
        height: 4,
    };
    let json = serializer.to_string(&value).unwrap();
    assert_eq!(json, r#"{"Width":3,"Height":4}"#);
    assert_eq!(serializer.from_str::<Crate>(&json).unwrap(), value);
}

#[test]
fn test_skipped_and_defaulted() {
    #[derive(Composite, Debug, PartialEq)]
    struct Job {
        name: Option<String>,
        #[field(default)]
        retries: i32,
        #[field(default)]
        level: Level,
        #[field(skip)]
        cache: Vec<u8>,
    }

    let mut serializer = JsonSerializer::new();
    serializer.register_with(|| Job {
        name: None,
        retries: 3,
        level: Level::Low,
        cache: vec![0xAA],
    });

    let job = Job {
        name: Some("build".into()),
        retries: 5,
        level: Level::High,
        cache: vec![1, 2, 3],
    };
    let json = serializer.to_string(&job).unwrap();
    assert_eq!(json, r#"{"name":"build","retries":5,"level":"HIGH"}"#);

    let back: Job = serializer.from_str(r#"{"name":"test"}"#).unwrap();
    assert_eq!(
        back,
        Job {
            name: Some("test".into()),
            retries: 3,
            level: Level::Low,
            cache: vec![0xAA],
        }
    );

    match serializer.from_str::<Job>(r#"{"retries":1}"#) {
        Err(Error::MissingRequiredField(field)) => assert_eq!(field, "name"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_unit_struct() {
    #[derive(Composite, Debug, Default, PartialEq)]
    struct Marker;

    let mut serializer = JsonSerializer::new();
    serializer.register::<Marker>();

    assert_eq!(serializer.to_string(&Marker).unwrap(), "{}");
    assert_eq!(serializer.from_str::<Marker>("{}").unwrap(), Marker);
}

#[test]
fn test_generic_struct() {
    #[derive(Composite, Debug, Default, PartialEq)]
    struct Wrapper<T: skein::WriteValue + skein::ReadValue + Default + 'static> {
        inner: T,
    }

    let mut serializer = JsonSerializer::new();
    serializer.register::<Wrapper<i64>>();

    let json = serializer.to_string(&Wrapper { inner: -9i64 }).unwrap();
    assert_eq!(json, r#"{"inner":-9}"#);
    assert_eq!(
        serializer.from_str::<Wrapper<i64>>(&json).unwrap(),
        Wrapper { inner: -9 }
    );
}
