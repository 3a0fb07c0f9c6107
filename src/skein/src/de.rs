//! The read side of the engine.

use std::{any::Any, collections::HashMap, hash::Hash, rc::Rc};

use chrono::{DateTime, FixedOffset};
use indexmap::IndexSet;
use skein_stream::{Node, Object};

use crate::{
    codec,
    registry::{simple_type_name, Candidate, Registry},
    ser::ROOT,
    value::{expect_object, expect_string, mismatch, ObjectValue, ReadPolymorphic, ReadValue},
    CompositeSerializable, Config, Error, Handle, Result, SerializableEnum, Shared,
};

/// An object that is known under a document-local id.
struct KnownObject {
    handle: Rc<dyn Any>,
    type_name: &'static str,
}

/// State of a single deserialization call.
pub(crate) struct ReadEngine<'de> {
    registry: &'de Registry,
    config: &'de Config,
    options: Option<&'de dyn Any>,
    known: HashMap<String, KnownObject>,
}

impl<'de> ReadEngine<'de> {
    pub fn new(registry: &'de Registry, config: &'de Config, options: Option<&'de dyn Any>) -> Self {
        Self {
            registry,
            config,
            options,
            known: HashMap::new(),
        }
    }

    /// Reconstructs the root object of a buffered document.
    pub fn read_root<T: CompositeSerializable>(mut self, document: &Node) -> Result<T> {
        let value = self.owned(document, ROOT)?;
        tracing::trace!(objects = self.known.len(), "finished reading object graph");

        Ok(value)
    }

    /// Reconstructs a composite value that is owned by its field.
    pub fn owned<T: CompositeSerializable>(&mut self, node: &Node, field: &str) -> Result<T> {
        let object = expect_object(node, field)?;
        if let Some((id, actual)) = self.reference(object, field)? {
            return Err(Error::ReferenceTypeMismatch {
                field: field.to_owned(),
                id,
                expected: simple_type_name::<T>(),
                actual,
            });
        }

        let registry = self.registry;
        let constructor = registry.resolve_for::<T>()?;
        let type_name = constructor.name();
        check_type_tag(object, field, type_name)?;

        // Owned values cannot be referred to, so their id is dropped.
        metadata(object, "$id")?;

        let mut value = constructor.make_owned::<T>()?;
        self.populate(&mut value, object, type_name)?;

        Ok(value)
    }

    /// Reconstructs a shared composite value of a statically known
    /// type, or resolves a reference to one.
    pub fn shared<T: CompositeSerializable>(&mut self, node: &Node, field: &str) -> Result<Shared<T>> {
        let object = expect_object(node, field)?;
        if let Some((id, type_name)) = self.reference(object, field)? {
            let handle = self.known[&id].handle.clone();
            return handle
                .downcast()
                .map_err(|_| Error::ReferenceTypeMismatch {
                    field: field.to_owned(),
                    id,
                    expected: simple_type_name::<T>(),
                    actual: type_name,
                });
        }

        let registry = self.registry;
        let constructor = registry.resolve_for::<T>()?;
        let type_name = constructor.name();
        check_type_tag(object, field, type_name)?;

        let (handle, value) = constructor.make_shared::<T>()?;
        self.remember(object, handle, type_name)?;
        self.populate(&mut *value.borrow_mut(), object, type_name)?;

        Ok(value)
    }

    /// Reconstructs a polymorphic value as one of `candidates`, or
    /// resolves a reference to one.
    pub fn polymorphic<B>(&mut self, node: &Node, field: &str, candidates: &[Candidate<B>]) -> Result<Shared<B>>
    where
        B: ?Sized + CompositeSerializable,
    {
        let object = expect_object(node, field)?;
        if let Some((id, type_name)) = self.reference(object, field)? {
            let handle = &self.known[&id].handle;
            return candidates
                .iter()
                .find_map(|c| c.cast(handle.clone()))
                .ok_or_else(|| Error::ReferenceTypeMismatch {
                    field: field.to_owned(),
                    id,
                    expected: simple_type_name::<B>(),
                    actual: type_name,
                });
        }

        let (candidate, type_name) = self.select(object, field, candidates)?;
        let handle = candidate.constructor(self.registry)?.make();
        let value = candidate.cast(handle.clone()).ok_or_else(|| Error::UnsupportedType {
            type_name,
            reason: "registered constructor produced a value of another type".into(),
        })?;

        self.remember(object, handle, type_name)?;
        self.populate(&mut *value.borrow_mut(), object, type_name)?;

        Ok(value)
    }

    /// Picks the candidate matching the object's `$type` tag.
    ///
    /// Untagged objects are built as the first candidate.
    fn select<'c, B: ?Sized + 'static>(
        &self,
        object: &Object,
        field: &str,
        candidates: &'c [Candidate<B>],
    ) -> Result<(&'c Candidate<B>, &'static str)> {
        let first = candidates.first().ok_or_else(|| Error::UnsupportedType {
            type_name: simple_type_name::<B>(),
            reason: format!("no candidate types declared for field '{field}'"),
        })?;

        let tag = match metadata(object, "$type")? {
            Some(tag) => tag,
            None => return Ok((first, first.constructor(self.registry)?.name())),
        };

        let mut found = None;
        for candidate in candidates {
            let name = candidate.constructor(self.registry)?.name();
            if name != tag {
                continue;
            }

            if found.is_some() {
                return Err(Error::UnsupportedType {
                    type_name: simple_type_name::<B>(),
                    reason: format!("more than one candidate is named '{tag}'"),
                });
            }
            found = Some((candidate, name));
        }

        found.ok_or_else(|| Error::UnknownPolymorphicType {
            field: field.to_owned(),
            type_tag: tag.to_owned(),
        })
    }

    /// Resolves the object's `$ref` marker, if references are
    /// preserved and it has one.
    ///
    /// Yields the id and the type name of the known object.
    fn reference(&self, object: &Object, field: &str) -> Result<Option<(String, &'static str)>> {
        if !self.config.preserve_references() {
            return Ok(None);
        }

        let id = match metadata(object, "$ref")? {
            Some(id) => id,
            None => return Ok(None),
        };

        match self.known.get(id) {
            Some(known) => {
                tracing::trace!(id, field, "resolved object reference");
                Ok(Some((id.to_owned(), known.type_name)))
            }
            None => Err(Error::DanglingReference {
                field: field.to_owned(),
                id: id.to_owned(),
            }),
        }
    }

    /// Makes a freshly constructed placeholder known under the
    /// object's `$id` before it gets populated.
    fn remember(&mut self, object: &Object, handle: Rc<dyn Any>, type_name: &'static str) -> Result<()> {
        if !self.config.preserve_references() {
            return Ok(());
        }

        if let Some(id) = metadata(object, "$id")? {
            tracing::trace!(id, type_name, "registered object id");
            let previous = self
                .known
                .insert(id.to_owned(), KnownObject { handle, type_name });

            if previous.is_some() {
                tracing::debug!(id, "object id occurs more than once, later object wins");
            }
        }

        Ok(())
    }

    /// Lets a placeholder populate itself from the fields of
    /// `object`.
    fn populate<T>(&mut self, target: &mut T, object: &Object, type_name: &'static str) -> Result<()>
    where
        T: ?Sized + CompositeSerializable,
    {
        let mut ctx = CompositeDeserializationContext {
            engine: self,
            scope: object,
        };
        target
            .deserialize(&mut ctx)
            .map_err(|e| e.in_construction_of(type_name))?;

        for field in object.fields() {
            if !field.is_consumed() && !field.name().starts_with('$') {
                tracing::debug!(field = field.name(), type_name, "ignoring unread field");
            }
        }

        Ok(())
    }
}

/// The surface through which a [`CompositeSerializable`] reads its
/// named fields.
///
/// Lookups are confined to the object currently being populated.
/// Each field may be read once; reading it again fails with
/// [`Error::FieldAlreadyRead`].
pub struct CompositeDeserializationContext<'a, 'de> {
    pub(crate) engine: &'a mut ReadEngine<'de>,
    scope: &'a Object,
}

impl<'a, 'de> CompositeDeserializationContext<'a, 'de> {
    /// Gets the options passed to the deserialization call, if they
    /// are of type `T`.
    pub fn options<T: Any>(&self) -> Option<&T> {
        self.engine.options.and_then(|o| o.downcast_ref())
    }

    /// Whether the current object has a field named `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.scope.field(name).is_some()
    }

    /// Consumes the field named `name`, if present.
    fn take(&self, name: &str) -> Result<Option<&'a Node>> {
        let scope = self.scope;
        match scope.field(name) {
            Some(field) => field
                .consume()
                .map(Some)
                .ok_or_else(|| Error::FieldAlreadyRead(name.to_owned())),
            None => Ok(None),
        }
    }

    /// Reads a required field of any supported kind.
    pub fn read_field<T: ReadValue>(&mut self, name: &str) -> Result<T> {
        match self.take(name)? {
            Some(node) => T::read_value(node, self, name),
            None => Err(Error::MissingRequiredField(name.to_owned())),
        }
    }

    /// Reads a field of any supported kind, falling back to
    /// `fallback` when it is absent.
    pub fn read_field_or<T: ReadValue>(&mut self, name: &str, fallback: T) -> Result<T> {
        match self.take(name)? {
            Some(node) => T::read_value(node, self, name),
            None => Ok(fallback),
        }
    }

    /// Reads a required field holding polymorphic objects, each
    /// built as the candidate named by its `$type` tag.
    pub fn read_polymorphic_field<B, T>(&mut self, name: &str, candidates: &[Candidate<B>]) -> Result<T>
    where
        B: ?Sized,
        T: ReadPolymorphic<B>,
    {
        match self.take(name)? {
            Some(node) => T::read_polymorphic(node, self, name, candidates),
            None => Err(Error::MissingRequiredField(name.to_owned())),
        }
    }

    /// Reads a field holding polymorphic objects, falling back to
    /// `fallback` when it is absent.
    pub fn read_polymorphic_field_or<B, T>(
        &mut self,
        name: &str,
        candidates: &[Candidate<B>],
        fallback: T,
    ) -> Result<T>
    where
        B: ?Sized,
        T: ReadPolymorphic<B>,
    {
        match self.take(name)? {
            Some(node) => T::read_polymorphic(node, self, name, candidates),
            None => Ok(fallback),
        }
    }

    /// Reads a boolean field.
    pub fn read_bool(&mut self, name: &str) -> Result<bool> {
        self.read_field(name)
    }

    /// Reads a boolean field, or `fallback` when it is absent.
    pub fn read_bool_or(&mut self, name: &str, fallback: bool) -> Result<bool> {
        self.read_field_or(name, fallback)
    }

    /// Reads an 8-bit integer field.
    pub fn read_i8(&mut self, name: &str) -> Result<i8> {
        self.read_field(name)
    }

    /// Reads an 8-bit integer field, or `fallback` when it is absent.
    pub fn read_i8_or(&mut self, name: &str, fallback: i8) -> Result<i8> {
        self.read_field_or(name, fallback)
    }

    /// Reads a 16-bit integer field.
    pub fn read_i16(&mut self, name: &str) -> Result<i16> {
        self.read_field(name)
    }

    /// Reads a 16-bit integer field, or `fallback` when it is absent.
    pub fn read_i16_or(&mut self, name: &str, fallback: i16) -> Result<i16> {
        self.read_field_or(name, fallback)
    }

    /// Reads a 32-bit integer field.
    pub fn read_i32(&mut self, name: &str) -> Result<i32> {
        self.read_field(name)
    }

    /// Reads a 32-bit integer field, or `fallback` when it is absent.
    pub fn read_i32_or(&mut self, name: &str, fallback: i32) -> Result<i32> {
        self.read_field_or(name, fallback)
    }

    /// Reads a 64-bit integer field.
    pub fn read_i64(&mut self, name: &str) -> Result<i64> {
        self.read_field(name)
    }

    /// Reads a 64-bit integer field, or `fallback` when it is absent.
    pub fn read_i64_or(&mut self, name: &str, fallback: i64) -> Result<i64> {
        self.read_field_or(name, fallback)
    }

    /// Reads a single precision float field.
    pub fn read_f32(&mut self, name: &str) -> Result<f32> {
        self.read_field(name)
    }

    /// Reads a single precision float field, or `fallback` when it
    /// is absent.
    pub fn read_f32_or(&mut self, name: &str, fallback: f32) -> Result<f32> {
        self.read_field_or(name, fallback)
    }

    /// Reads a double precision float field.
    pub fn read_f64(&mut self, name: &str) -> Result<f64> {
        self.read_field(name)
    }

    /// Reads a double precision float field, or `fallback` when it
    /// is absent.
    pub fn read_f64_or(&mut self, name: &str, fallback: f64) -> Result<f64> {
        self.read_field_or(name, fallback)
    }

    /// Reads a string field, which may be `null`.
    pub fn read_string(&mut self, name: &str) -> Result<Option<String>> {
        self.read_field(name)
    }

    /// Reads a string field, or `fallback` when it is absent.
    pub fn read_string_or(&mut self, name: &str, fallback: Option<String>) -> Result<Option<String>> {
        self.read_field_or(name, fallback)
    }

    /// Reads a MIME base64 byte array field, which may be `null`.
    pub fn read_bytes(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        match self.take(name)? {
            Some(node) => decode_bytes(node, name),
            None => Err(Error::MissingRequiredField(name.to_owned())),
        }
    }

    /// Reads a MIME base64 byte array field, or `fallback` when it
    /// is absent.
    pub fn read_bytes_or(&mut self, name: &str, fallback: Option<Vec<u8>>) -> Result<Option<Vec<u8>>> {
        match self.take(name)? {
            Some(node) => decode_bytes(node, name),
            None => Ok(fallback),
        }
    }

    /// Reads an RFC 3339 timestamp field, which may be `null`.
    pub fn read_timestamp(&mut self, name: &str) -> Result<Option<DateTime<FixedOffset>>> {
        self.read_field(name)
    }

    /// Reads an RFC 3339 timestamp field, or `fallback` when it is
    /// absent.
    pub fn read_timestamp_or(
        &mut self,
        name: &str,
        fallback: Option<DateTime<FixedOffset>>,
    ) -> Result<Option<DateTime<FixedOffset>>> {
        self.read_field_or(name, fallback)
    }

    /// Reads an enum field by the name of its variant.
    pub fn read_enum<E: SerializableEnum>(&mut self, name: &str) -> Result<E> {
        match self.take(name)? {
            Some(node) => decode_enum(node, name),
            None => Err(Error::MissingRequiredField(name.to_owned())),
        }
    }

    /// Reads an enum field, or `fallback` when it is absent.
    pub fn read_enum_or<E: SerializableEnum>(&mut self, name: &str, fallback: E) -> Result<E> {
        match self.take(name)? {
            Some(node) => decode_enum(node, name),
            None => Ok(fallback),
        }
    }

    /// Reads a composite field of a statically known type.
    ///
    /// `T` may be an owned composite, a [`Shared`] handle or an
    /// [`Option`] of either.
    pub fn read_object<T: ReadValue + ObjectValue>(&mut self, name: &str) -> Result<T> {
        self.read_field(name)
    }

    /// Reads a composite field, or `fallback` when it is absent.
    pub fn read_object_or<T: ReadValue + ObjectValue>(&mut self, name: &str, fallback: T) -> Result<T> {
        self.read_field_or(name, fallback)
    }

    /// Reads a polymorphic composite field, which may be `null`.
    pub fn read_polymorphic_object<B>(
        &mut self,
        name: &str,
        candidates: &[Candidate<B>],
    ) -> Result<Option<Shared<B>>>
    where
        B: ?Sized + CompositeSerializable,
    {
        self.read_polymorphic_field(name, candidates)
    }

    /// Reads a polymorphic composite field, or `fallback` when it is
    /// absent.
    pub fn read_polymorphic_object_or<B>(
        &mut self,
        name: &str,
        candidates: &[Candidate<B>],
        fallback: Option<Shared<B>>,
    ) -> Result<Option<Shared<B>>>
    where
        B: ?Sized + CompositeSerializable,
    {
        self.read_polymorphic_field_or(name, candidates, fallback)
    }

    /// Reads a collection field, which may be `null`.
    pub fn read_collection<T: ReadValue>(&mut self, name: &str) -> Result<Option<Vec<T>>> {
        self.read_field(name)
    }

    /// Reads a collection field, or `fallback` when it is absent.
    pub fn read_collection_or<T: ReadValue>(
        &mut self,
        name: &str,
        fallback: Option<Vec<T>>,
    ) -> Result<Option<Vec<T>>> {
        self.read_field_or(name, fallback)
    }

    /// Reads a collection of polymorphic objects, which may be
    /// `null`.
    pub fn read_polymorphic_collection<B>(
        &mut self,
        name: &str,
        candidates: &[Candidate<B>],
    ) -> Result<Option<Vec<Shared<B>>>>
    where
        B: ?Sized + CompositeSerializable,
    {
        self.read_polymorphic_field(name, candidates)
    }

    /// Reads a collection of polymorphic objects, or `fallback` when
    /// it is absent.
    pub fn read_polymorphic_collection_or<B>(
        &mut self,
        name: &str,
        candidates: &[Candidate<B>],
        fallback: Option<Vec<Shared<B>>>,
    ) -> Result<Option<Vec<Shared<B>>>>
    where
        B: ?Sized + CompositeSerializable,
    {
        self.read_polymorphic_field_or(name, candidates, fallback)
    }

    /// Reads a set field, which may be `null`.
    ///
    /// Elements keep their document order. Of equal elements only
    /// the first is kept.
    pub fn read_set<T: ReadValue + Hash + Eq>(&mut self, name: &str) -> Result<Option<IndexSet<T>>> {
        self.read_field(name)
    }

    /// Reads a set field, or `fallback` when it is absent.
    pub fn read_set_or<T: ReadValue + Hash + Eq>(
        &mut self,
        name: &str,
        fallback: Option<IndexSet<T>>,
    ) -> Result<Option<IndexSet<T>>> {
        self.read_field_or(name, fallback)
    }

    /// Reads a set of polymorphic objects, which may be `null`.
    ///
    /// Several references to one object yield a single element.
    pub fn read_polymorphic_set<B>(
        &mut self,
        name: &str,
        candidates: &[Candidate<B>],
    ) -> Result<Option<IndexSet<Handle<B>>>>
    where
        B: ?Sized + CompositeSerializable,
    {
        self.read_polymorphic_field(name, candidates)
    }

    /// Reads a set of polymorphic objects, or `fallback` when it is
    /// absent.
    pub fn read_polymorphic_set_or<B>(
        &mut self,
        name: &str,
        candidates: &[Candidate<B>],
        fallback: Option<IndexSet<Handle<B>>>,
    ) -> Result<Option<IndexSet<Handle<B>>>>
    where
        B: ?Sized + CompositeSerializable,
    {
        self.read_polymorphic_field_or(name, candidates, fallback)
    }

    #[inline]
    pub(crate) fn primitive<'t>(&self, text: &'t str) -> PrimitiveDeserializationContext<'t>
    where
        'de: 't,
    {
        PrimitiveDeserializationContext {
            text,
            options: self.engine.options,
        }
    }
}

/// Rejects a `$type` tag that differs from the statically expected
/// type.
fn check_type_tag(object: &Object, field: &str, expected: &'static str) -> Result<()> {
    match metadata(object, "$type")? {
        Some(tag) if tag != expected => Err(Error::UnknownPolymorphicType {
            field: field.to_owned(),
            type_tag: tag.to_owned(),
        }),
        _ => Ok(()),
    }
}

/// Consumes an engine metadata field, which must be a string.
fn metadata<'o>(object: &'o Object, name: &'static str) -> Result<Option<&'o str>> {
    match object.field(name).and_then(|f| f.consume()) {
        Some(node) => expect_string(node, name).map(Some),
        None => Ok(None),
    }
}

fn decode_bytes(node: &Node, field: &str) -> Result<Option<Vec<u8>>> {
    match node {
        Node::Null => Ok(None),
        Node::String(text) => codec::decode_field(field, text).map(Some),
        other => Err(mismatch(field, "string", other)),
    }
}

pub(crate) fn decode_enum<E: SerializableEnum>(node: &Node, field: &str) -> Result<E> {
    let name = expect_string(node, field)?;
    E::from_name(name).ok_or_else(|| Error::UnknownEnumValue {
        field: field.to_owned(),
        enum_name: simple_type_name::<E>(),
        value: name.to_owned(),
    })
}

/// The surface through which a [`PrimitiveSerializable`][crate::PrimitiveSerializable]
/// reads its single token.
pub struct PrimitiveDeserializationContext<'a> {
    text: &'a str,
    options: Option<&'a dyn Any>,
}

impl<'a> PrimitiveDeserializationContext<'a> {
    /// Gets the options passed to the deserialization call, if they
    /// are of type `T`.
    pub fn options<T: Any>(&self) -> Option<&T> {
        self.options.and_then(|o| o.downcast_ref())
    }

    /// Reads the token of the value.
    pub fn read(&self) -> &'a str {
        self.text
    }
}
