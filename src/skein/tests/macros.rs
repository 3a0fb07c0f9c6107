use skein::{
    impl_enum_value, impl_primitive_value, Composite, CompositeDeserializationContext,
    CompositeSerializable, CompositeSerializationContext, Error, JsonSerializer,
    PrimitiveDeserializationContext, PrimitiveSerializable, PrimitiveSerializationContext, Result,
    SerializableEnum,
};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum Weekday {
    #[default]
    Monday,
    Friday,
}

impl SerializableEnum for Weekday {
    fn name(&self) -> &'static str {
        match self {
            Weekday::Monday => "MONDAY",
            Weekday::Friday => "FRIDAY",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "MONDAY" => Some(Weekday::Monday),
            "FRIDAY" => Some(Weekday::Friday),
            _ => None,
        }
    }
}
impl_enum_value!(Weekday);

#[derive(Debug, Default, PartialEq)]
struct Hour(u8);

impl PrimitiveSerializable for Hour {
    fn serialize(&self, ctx: &mut PrimitiveSerializationContext<'_>) -> Result<()> {
        ctx.write(Some(&format!("{:02}h", self.0)));
        Ok(())
    }

    fn deserialize(ctx: &mut PrimitiveDeserializationContext<'_>) -> Result<Self> {
        let text = ctx.read();
        let hour = text
            .strip_suffix('h')
            .ok_or_else(|| Error::custom(format_args!("'{text}' is not an hour")))?;
        Ok(Hour(hour.parse().map_err(Error::other)?))
    }
}
impl_primitive_value!(Hour);

#[derive(Debug, Default, PartialEq, SerializableEnum)]
enum Shift {
    #[default]
    Early,
    Late,
}

#[derive(Composite, Debug, Default, PartialEq)]
struct Slot {
    day: Weekday,
    start: Hour,
    shift: Shift,
    fallback: Option<Weekday>,
    hours: Vec<Hour>,
}

#[derive(Debug, Default, PartialEq)]
struct Manual {
    day: Weekday,
    start: Option<Hour>,
}

impl CompositeSerializable for Manual {
    fn serialize(&self, ctx: &mut CompositeSerializationContext<'_, '_>) -> Result<()> {
        ctx.write_field("day", &self.day)?;
        ctx.write_field("start", &self.start)
    }

    fn deserialize(&mut self, ctx: &mut CompositeDeserializationContext<'_, '_>) -> Result<()> {
        self.day = ctx.read_field("day")?;
        self.start = ctx.read_field_or("start", None)?;
        Ok(())
    }
}

#[test]
fn test_macro_values_in_derived_composite() {
    let mut serializer = JsonSerializer::new();
    serializer.register::<Slot>();

    let slot = Slot {
        day: Weekday::Friday,
        start: Hour(7),
        shift: Shift::Late,
        fallback: None,
        hours: vec![Hour(7), Hour(15)],
    };

    let json = serializer.to_string(&slot).unwrap();
    assert_eq!(
        json,
        r#"{"day":"FRIDAY","start":"07h","shift":"Late","fallback":null,"hours":["07h","15h"]}"#
    );
    assert_eq!(serializer.from_str::<Slot>(&json).unwrap(), slot);
}

#[test]
fn test_macro_values_in_handwritten_composite() {
    let mut serializer = JsonSerializer::new();
    serializer.register::<Manual>();

    let manual: Manual = serializer.from_str(r#"{"day":"MONDAY"}"#).unwrap();
    assert_eq!(manual, Manual { day: Weekday::Monday, start: None });

    match serializer.from_str::<Manual>(r#"{"day":"SUNDAY"}"#) {
        Err(Error::UnknownEnumValue { field, value, .. }) => {
            assert_eq!(field, "day");
            assert_eq!(value, "SUNDAY");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
