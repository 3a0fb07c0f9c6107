//! Result and error for serialization and deserialization.

use std::{fmt::Display, io};

use thiserror::Error;

/// A [`Result`][std::result::Result] produced by this crate's
/// operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that abort a whole serialization or deserialization
/// call.
///
/// Field names reported by the read side are paths relative to the
/// object being populated; collection elements are reported as
/// `field[index]`.
#[derive(Debug, Error)]
pub enum Error {
    /// A number token could not be parsed into the requested width.
    #[error("malformed number '{text}' in field '{field}'")]
    MalformedNumber { field: String, text: String },

    /// A timestamp string is not in RFC 3339 offset format.
    #[error("malformed timestamp '{text}' in field '{field}'")]
    MalformedTimestamp {
        field: String,
        text: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A byte array string is not valid base64.
    #[error("invalid base64 data in field '{field}'")]
    DecodingError {
        field: String,
        #[source]
        source: base64::DecodeError,
    },

    /// An enum string does not name any variant.
    #[error("'{value}' is not a variant of {enum_name} in field '{field}'")]
    UnknownEnumValue {
        field: String,
        enum_name: &'static str,
        value: String,
    },

    /// No usable constructor exists for a type, or candidate
    /// resolution was ambiguous.
    #[error("unsupported type {type_name}: {reason}")]
    UnsupportedType {
        type_name: &'static str,
        reason: String,
    },

    /// A `$type` tag matches none of the declared candidates.
    #[error("unknown polymorphic type '{type_tag}' in field '{field}'")]
    UnknownPolymorphicType { field: String, type_tag: String },

    /// A `$ref` names an id that was never registered.
    #[error("reference '{id}' in field '{field}' does not point to a known object")]
    DanglingReference { field: String, id: String },

    /// A `$ref` resolves to an object of an incompatible type.
    #[error("reference '{id}' in field '{field}' resolves to {actual}, expected {expected}")]
    ReferenceTypeMismatch {
        field: String,
        id: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A required field is absent from the document.
    #[error("missing required field '{0}'")]
    MissingRequiredField(String),

    /// A scalar field holds a scalar of the wrong kind.
    #[error("field '{field}' holds {actual}, expected {expected}")]
    FieldTypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A field holds the wrong structure, e.g. an array where an
    /// object was expected.
    #[error("field '{field}' holds {actual}, expected {expected}")]
    StructuralMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A field was read a second time while populating the same
    /// object.
    #[error("field '{0}' was already read")]
    FieldAlreadyRead(String),

    /// Writing a field to the output failed.
    #[error("failed to write field '{field}'")]
    SerializationFailure {
        field: String,
        #[source]
        source: io::Error,
    },

    /// A primitive-serializable value did not emit exactly one token.
    #[error("{type_name} emitted {count} tokens as a primitive value, expected exactly one")]
    InvalidPrimitive { type_name: &'static str, count: usize },

    /// Composite values are nested deeper than the configured limit.
    #[error("recursion limit of {limit} exceeded at field '{field}'")]
    RecursionLimit { field: String, limit: u32 },

    /// The input is not a well-formed JSON document.
    #[error("invalid JSON document")]
    InvalidDocument(#[source] anyhow::Error),

    /// Reading from or flushing a stream failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A failure raised by a serializable type itself.
    #[error(transparent)]
    Custom(#[from] anyhow::Error),

    /// Populating an object of the given type failed.
    #[error("failed to construct {type_name}")]
    Construction {
        type_name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    /// Creates a new error from a custom message.
    ///
    /// Serializable types use this to reject values they cannot
    /// represent.
    pub fn custom<T: Display>(msg: T) -> Self {
        Self::Custom(anyhow::Error::msg(msg.to_string()))
    }

    /// Creates a new error wrapping an arbitrary error value.
    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Custom(anyhow::Error::new(err))
    }

    /// Attributes a failure raised by a serializable type to the
    /// type whose population failed.
    ///
    /// Errors raised by the engine itself are passed through as-is.
    pub(crate) fn in_construction_of(self, type_name: &'static str) -> Self {
        match self {
            Self::Custom(source) => Self::Construction { type_name, source },
            other => other,
        }
    }
}
