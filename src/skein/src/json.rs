use std::{
    any::Any,
    io::{BufWriter, Read, Write},
};

use crate::{
    de::ReadEngine, ser::WriteEngine, CompositeSerializable, Config, Error, Registry, Result,
    SerializerFlags,
};

/// Serializes graphs of [`CompositeSerializable`] objects to JSON
/// and reconstructs them again.
///
/// All state of a call lives for the duration of that call only.
/// The [`Registry`] of constructors is filled up front and read
/// thereafter, so a fully set up serializer may be shared between
/// threads that each run their own calls.
///
/// # Example
///
/// ```
/// # use skein::{Composite, JsonSerializer};
/// #[derive(Composite, Debug, Default, PartialEq)]
/// struct Point {
///     x: f64,
///     y: f64,
/// }
///
/// let mut serializer = JsonSerializer::new();
/// serializer.register::<Point>();
///
/// let json = serializer.to_string(&Point { x: 1.5, y: -2.25 }).unwrap();
/// assert_eq!(json, r#"{"x":1.5,"y":-2.25}"#);
///
/// let point: Point = serializer.from_str(&json).unwrap();
/// assert_eq!(point, Point { x: 1.5, y: -2.25 });
/// ```
#[derive(Debug, Default)]
pub struct JsonSerializer {
    config: Config,
    registry: Registry,
}

impl JsonSerializer {
    /// Creates a serializer with the default [`Config`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a serializer with the given [`Config`].
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            registry: Registry::new(),
        }
    }

    /// Gets the active configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Enables or disables indentation of the output.
    pub fn set_pretty_print(&mut self, enabled: bool) -> &mut Self {
        self.config.flags.set(SerializerFlags::PRETTY_PRINT, enabled);
        self
    }

    /// Enables or disables reference preservation.
    pub fn set_preserve_references(&mut self, enabled: bool) -> &mut Self {
        self.config
            .flags
            .set(SerializerFlags::PRESERVE_REFERENCES, enabled);
        self
    }

    /// Gets the registry of constructors.
    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Gets mutable access to the registry of constructors.
    #[inline]
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Registers `T` with its [`Default`] value as the placeholder.
    ///
    /// See [`Registry::register`].
    pub fn register<T: CompositeSerializable + Default>(&mut self) -> &mut Self {
        self.registry.register::<T>();
        self
    }

    /// Registers `T` with a custom placeholder factory.
    ///
    /// See [`Registry::register_with`].
    pub fn register_with<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: CompositeSerializable,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.registry.register_with(factory);
        self
    }

    /// Writes the object graph rooted at `value` to `out`.
    pub fn serialize<T, W>(&self, value: &T, out: W) -> Result<()>
    where
        T: CompositeSerializable,
        W: Write,
    {
        self.serialize_impl(value, None, out)
    }

    /// Writes the object graph rooted at `value` to `out`, making
    /// `options` available to every serializable in it.
    pub fn serialize_with<T, W>(&self, value: &T, options: &dyn Any, out: W) -> Result<()>
    where
        T: CompositeSerializable,
        W: Write,
    {
        self.serialize_impl(value, Some(options), out)
    }

    fn serialize_impl<T, W>(&self, value: &T, options: Option<&dyn Any>, out: W) -> Result<()>
    where
        T: CompositeSerializable,
        W: Write,
    {
        let type_name = value.type_name();
        tracing::debug!(type_name, flags = ?self.config.flags, "serializing object graph");

        // Flushed by the engine once the root object is complete.
        let mut out = BufWriter::new(out);
        WriteEngine::new(&mut out, &self.config, options).write_root(value)?;

        tracing::debug!(type_name, "serialized object graph");
        Ok(())
    }

    /// Reads a document from `input` and reconstructs its root
    /// object as `T`.
    pub fn deserialize<T, R>(&self, input: R) -> Result<T>
    where
        T: CompositeSerializable,
        R: Read,
    {
        self.deserialize_impl(input, None)
    }

    /// Reads a document from `input` and reconstructs its root
    /// object as `T`, making `options` available to every
    /// serializable in it.
    pub fn deserialize_with<T, R>(&self, input: R, options: &dyn Any) -> Result<T>
    where
        T: CompositeSerializable,
        R: Read,
    {
        self.deserialize_impl(input, Some(options))
    }

    fn deserialize_impl<T, R>(&self, input: R, options: Option<&dyn Any>) -> Result<T>
    where
        T: CompositeSerializable,
        R: Read,
    {
        let type_name = crate::simple_type_name::<T>();
        tracing::debug!(type_name, flags = ?self.config.flags, "deserializing object graph");

        let document = skein_stream::read_document(input).map_err(|e| {
            // Failures of the underlying stream are reported as such
            // rather than as malformed documents.
            match e.downcast::<serde_json::Error>() {
                Ok(e) if e.is_io() => Error::Io(e.into()),
                Ok(e) => Error::InvalidDocument(e.into()),
                Err(e) => Error::InvalidDocument(e),
            }
        })?;
        let value = ReadEngine::new(&self.registry, &self.config, options).read_root(&document)?;

        tracing::debug!(type_name, "deserialized object graph");
        Ok(value)
    }

    /// Writes the object graph rooted at `value` into a string.
    pub fn to_string<T: CompositeSerializable>(&self, value: &T) -> Result<String> {
        let mut out = Vec::with_capacity(128);
        self.serialize(value, &mut out)?;

        // The writer only ever emits valid UTF-8.
        String::from_utf8(out).map_err(Error::other)
    }

    /// Reconstructs the root object of the document in `s` as `T`.
    pub fn from_str<T: CompositeSerializable>(&self, s: &str) -> Result<T> {
        self.deserialize(s.as_bytes())
    }
}
