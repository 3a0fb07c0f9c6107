//! The write side of the engine.

use std::{any::Any, collections::HashMap, io::Write};

use chrono::{DateTime, FixedOffset};
use indexmap::IndexSet;
use skein_stream::JsonWriter;

use crate::{
    codec,
    registry::simple_type_name,
    value::{ObjectValue, WriteValue},
    CompositeSerializable, Config, Error, Handle, Result, SerializableEnum, Shared,
};

/// The field name reported for failures at the document root.
pub(crate) const ROOT: &str = "<root>";

/// State of a single serialization call.
pub(crate) struct WriteEngine<'w> {
    writer: JsonWriter<&'w mut dyn Write>,
    config: &'w Config,
    options: Option<&'w dyn Any>,
    // Keyed by the address of the shared allocation, so distinct
    // but equal objects never collapse into one.
    ids: HashMap<*const (), u64>,
    next_id: u64,
    depth: u32,
}

impl<'w> WriteEngine<'w> {
    pub fn new(out: &'w mut dyn Write, config: &'w Config, options: Option<&'w dyn Any>) -> Self {
        Self {
            writer: JsonWriter::with_pretty(out, config.pretty_print()),
            config,
            options,
            ids: HashMap::new(),
            next_id: 0,
            depth: 0,
        }
    }

    /// Writes `value` as the bare root object of the document and
    /// flushes the output.
    pub fn write_root<T: CompositeSerializable>(mut self, value: &T) -> Result<()> {
        self.token(ROOT, |w| w.begin_object())?;
        value.serialize(&mut CompositeSerializationContext { engine: &mut self })?;
        self.token(ROOT, |w| w.end_object())?;

        tracing::trace!(objects = self.next_id, "finished writing object graph");
        self.writer
            .finish()
            .map(drop)
            .map_err(|source| failure(ROOT, source))
    }

    /// Emits a single token, attributing I/O failures to `field`.
    #[inline]
    pub fn token<F>(&mut self, field: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut JsonWriter<&'w mut dyn Write>) -> std::io::Result<()>,
    {
        f(&mut self.writer).map_err(|source| failure(field, source))
    }

    /// Writes a composite value inline.
    ///
    /// `identity` is the address of the allocation holding the
    /// value if it is shared, in which case repeated occurrences
    /// are reduced to `$ref` markers when references are preserved.
    pub fn composite<T>(
        &mut self,
        field: &str,
        value: &T,
        identity: Option<*const ()>,
        tagged: bool,
    ) -> Result<()>
    where
        T: ?Sized + CompositeSerializable,
    {
        if self.depth >= self.config.recursion_limit {
            return Err(Error::RecursionLimit {
                field: field.to_owned(),
                limit: self.config.recursion_limit,
            });
        }

        self.depth += 1;
        let result = self.composite_body(field, value, identity, tagged);
        self.depth -= 1;

        result
    }

    fn composite_body<T>(
        &mut self,
        field: &str,
        value: &T,
        identity: Option<*const ()>,
        tagged: bool,
    ) -> Result<()>
    where
        T: ?Sized + CompositeSerializable,
    {
        self.token(field, |w| w.begin_object())?;

        if self.config.preserve_references() {
            if let Some(&id) = identity.and_then(|key| self.ids.get(&key)) {
                tracing::trace!(id, field, "writing object reference");
                let id = id.to_string();
                self.token(field, |w| {
                    w.name("$ref")?;
                    w.string(&id)?;
                    w.end_object()
                })?;
                return Ok(());
            }

            let id = self.next_id;
            self.next_id += 1;
            if let Some(key) = identity {
                self.ids.insert(key, id);
            }

            tracing::trace!(id, type_name = value.type_name(), "assigned object id");
            let id = id.to_string();
            self.token(field, |w| {
                w.name("$id")?;
                w.string(&id)
            })?;
        }

        if tagged {
            let type_name = value.type_name();
            self.token(field, |w| {
                w.name("$type")?;
                w.string(type_name)
            })?;
        }

        value.serialize(&mut CompositeSerializationContext { engine: self })?;
        self.token(field, |w| w.end_object())
    }

    /// Writes a shared composite value, honoring its identity.
    pub fn shared<B>(&mut self, field: &str, value: &Shared<B>, tagged: bool) -> Result<()>
    where
        B: ?Sized + CompositeSerializable,
    {
        let identity = std::rc::Rc::as_ptr(value) as *const ();
        let inner = value.try_borrow().map_err(|_| {
            Error::custom(format_args!(
                "{} in field '{field}' is mutably borrowed",
                simple_type_name::<B>()
            ))
        })?;

        self.composite(field, &*inner, Some(identity), tagged)
    }

    /// Writes a value produced by a [`PrimitiveSerializable`][crate::PrimitiveSerializable]
    /// implementation.
    pub fn primitive<T: crate::PrimitiveSerializable>(&mut self, field: &str, value: &T) -> Result<()> {
        let mut ctx = PrimitiveSerializationContext {
            token: None,
            count: 0,
            options: self.options,
        };
        value.serialize(&mut ctx)?;

        match (ctx.count, ctx.token) {
            (1, Some(token)) => {
                let token = token.as_deref();
                self.token(field, |w| match token {
                    Some(v) => w.string(v),
                    None => w.null(),
                })
            }
            (count, _) => Err(Error::InvalidPrimitive {
                type_name: simple_type_name::<T>(),
                count,
            }),
        }
    }
}

#[cold]
fn failure(field: &str, source: std::io::Error) -> Error {
    Error::SerializationFailure {
        field: field.to_owned(),
        source,
    }
}

/// The surface through which a [`CompositeSerializable`] writes its
/// named fields.
///
/// Fields are emitted in exactly the order of the calls.
pub struct CompositeSerializationContext<'a, 'w> {
    pub(crate) engine: &'a mut WriteEngine<'w>,
}

impl<'a, 'w> CompositeSerializationContext<'a, 'w> {
    /// Gets the options passed to the serialization call, if they
    /// are of type `T`.
    pub fn options<T: Any>(&self) -> Option<&T> {
        self.engine.options.and_then(|o| o.downcast_ref())
    }

    /// Writes a field of any supported kind.
    pub fn write_field<V: ?Sized + WriteValue>(&mut self, name: &str, value: &V) -> Result<()> {
        self.engine.token(name, |w| w.name(name))?;
        value.write_value(self, name, false)
    }

    /// Writes a field of any supported kind, tagging every
    /// composite value in it with its `$type`.
    pub fn write_polymorphic_field<V: ?Sized + WriteValue>(&mut self, name: &str, value: &V) -> Result<()> {
        self.engine.token(name, |w| w.name(name))?;
        value.write_value(self, name, true)
    }

    /// Writes a boolean field.
    pub fn write_bool(&mut self, name: &str, value: bool) -> Result<()> {
        self.write_field(name, &value)
    }

    /// Writes an 8-bit integer field.
    pub fn write_i8(&mut self, name: &str, value: i8) -> Result<()> {
        self.write_field(name, &value)
    }

    /// Writes a 16-bit integer field.
    pub fn write_i16(&mut self, name: &str, value: i16) -> Result<()> {
        self.write_field(name, &value)
    }

    /// Writes a 32-bit integer field.
    pub fn write_i32(&mut self, name: &str, value: i32) -> Result<()> {
        self.write_field(name, &value)
    }

    /// Writes a 64-bit integer field.
    pub fn write_i64(&mut self, name: &str, value: i64) -> Result<()> {
        self.write_field(name, &value)
    }

    /// Writes a single precision float field.
    ///
    /// NaN and infinities cannot be represented and fail with
    /// [`Error::SerializationFailure`].
    pub fn write_f32(&mut self, name: &str, value: f32) -> Result<()> {
        self.write_field(name, &value)
    }

    /// Writes a double precision float field.
    ///
    /// NaN and infinities cannot be represented and fail with
    /// [`Error::SerializationFailure`].
    pub fn write_f64(&mut self, name: &str, value: f64) -> Result<()> {
        self.write_field(name, &value)
    }

    /// Writes a string field, or `null`.
    pub fn write_string(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        self.write_nullable(name, value, false)
    }

    /// Writes a byte array field as MIME base64, or `null`.
    pub fn write_bytes(&mut self, name: &str, value: Option<&[u8]>) -> Result<()> {
        let encoded = value.map(codec::encode_bytes);
        self.write_field(name, &encoded)
    }

    /// Writes a timestamp field in RFC 3339 form, or `null`.
    pub fn write_timestamp(&mut self, name: &str, value: Option<&DateTime<FixedOffset>>) -> Result<()> {
        self.write_nullable(name, value, false)
    }

    /// Writes an enum field by the name of its variant.
    pub fn write_enum<E: SerializableEnum>(&mut self, name: &str, value: &E) -> Result<()> {
        let variant = value.name();
        self.engine.token(name, |w| {
            w.name(name)?;
            w.string(variant)
        })
    }

    /// Writes a composite field without a `$type` tag.
    ///
    /// `value` may be an owned composite, a [`Shared`] handle or an
    /// [`Option`] of either.
    pub fn write_object<V: ObjectValue>(&mut self, name: &str, value: &V) -> Result<()> {
        self.write_field(name, value)
    }

    /// Writes a polymorphic composite field, tagged with the
    /// `$type` of the object it holds.
    pub fn write_polymorphic_object<B>(&mut self, name: &str, value: Option<&Shared<B>>) -> Result<()>
    where
        B: ?Sized + CompositeSerializable,
    {
        self.write_nullable(name, value, true)
    }

    /// Writes a collection field as a JSON array, or `null`.
    ///
    /// Elements may be of any supported kind, including nested
    /// collections.
    pub fn write_collection<V: WriteValue>(&mut self, name: &str, value: Option<&[V]>) -> Result<()> {
        self.write_nullable(name, value, false)
    }

    /// Writes a collection of polymorphic objects, each tagged with
    /// its `$type`, or `null`.
    pub fn write_polymorphic_collection<B>(&mut self, name: &str, value: Option<&[Shared<B>]>) -> Result<()>
    where
        B: ?Sized + CompositeSerializable,
    {
        self.write_nullable(name, value, true)
    }

    /// Writes a set field as a JSON array in insertion order, or
    /// `null`.
    pub fn write_set<V: WriteValue>(&mut self, name: &str, value: Option<&IndexSet<V>>) -> Result<()> {
        self.write_nullable(name, value, false)
    }

    /// Writes a set of polymorphic objects, each tagged with its
    /// `$type`, or `null`.
    pub fn write_polymorphic_set<B>(&mut self, name: &str, value: Option<&IndexSet<Handle<B>>>) -> Result<()>
    where
        B: ?Sized + CompositeSerializable,
    {
        self.write_nullable(name, value, true)
    }

    fn write_nullable<V>(&mut self, name: &str, value: Option<&V>, tagged: bool) -> Result<()>
    where
        V: ?Sized + WriteValue,
    {
        self.engine.token(name, |w| w.name(name))?;
        match value {
            Some(value) => value.write_value(self, name, tagged),
            None => self.engine.token(name, |w| w.null()),
        }
    }
}

/// The surface through which a [`PrimitiveSerializable`][crate::PrimitiveSerializable]
/// writes its single token.
pub struct PrimitiveSerializationContext<'a> {
    token: Option<Option<String>>,
    count: usize,
    options: Option<&'a dyn Any>,
}

impl PrimitiveSerializationContext<'_> {
    /// Gets the options passed to the serialization call, if they
    /// are of type `T`.
    pub fn options<T: Any>(&self) -> Option<&T> {
        self.options.and_then(|o| o.downcast_ref())
    }

    /// Writes the token of the value, or `null`.
    ///
    /// This must be called exactly once.
    pub fn write(&mut self, value: Option<&str>) {
        self.count += 1;
        self.token = Some(value.map(str::to_owned));
    }
}
