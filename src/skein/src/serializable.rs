use std::{
    any::Any,
    cell::RefCell,
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    rc::Rc,
};

use crate::{
    de::{CompositeDeserializationContext, PrimitiveDeserializationContext},
    registry::simple_type_name,
    ser::{CompositeSerializationContext, PrimitiveSerializationContext},
    Result,
};

/// A reference-counted, interiorly mutable handle to an object.
///
/// Handles are the unit of identity in an object graph: two
/// fields holding clones of the same handle refer to the same
/// object and are written once when references are preserved.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps a value into a fresh [`Shared`] handle.
#[inline]
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// A [`Shared`] handle that compares and hashes by the identity of
/// the object it points to.
///
/// This is the element type of sets of shared objects, which hold
/// every object at most once no matter what it contains.
pub struct Handle<T: ?Sized>(pub Shared<T>);

impl<T: ?Sized> Handle<T> {
    #[inline]
    fn address(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }

    /// Unwraps the underlying handle.
    #[inline]
    pub fn into_inner(self) -> Shared<T> {
        self.0
    }
}

impl<T: ?Sized> Clone for Handle<T> {
    #[inline]
    fn clone(&self) -> Self {
        Handle(Rc::clone(&self.0))
    }
}

impl<T: ?Sized> PartialEq for Handle<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.address(), other.address())
    }
}

impl<T: ?Sized> Eq for Handle<T> {}

impl<T: ?Sized> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl<T: ?Sized> Deref for Handle<T> {
    type Target = Shared<T>;

    #[inline]
    fn deref(&self) -> &Shared<T> {
        &self.0
    }
}

impl<T: ?Sized> From<Shared<T>> for Handle<T> {
    #[inline]
    fn from(handle: Shared<T>) -> Self {
        Handle(handle)
    }
}

impl<T: ?Sized> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.address()).finish()
    }
}

/// A type that is represented as a JSON object with named
/// fields.
///
/// Objects are reconstructed in two phases: the engine first
/// builds a placeholder through the constructor installed in the
/// [`Registry`][crate::Registry], makes it known to later `$ref`
/// markers and only then calls [`CompositeSerializable::deserialize`]
/// on it to populate its fields. This is what allows cyclic graphs
/// to be read back.
///
/// This trait is object safe so that polymorphic bases can be
/// declared as sub-traits of it and held in `Shared<dyn Base>`.
pub trait CompositeSerializable: Any {
    /// Writes the fields of this object, in order, to `ctx`.
    fn serialize(&self, ctx: &mut CompositeSerializationContext<'_, '_>) -> Result<()>;

    /// Populates this object in-place from the fields in `ctx`.
    fn deserialize(&mut self, ctx: &mut CompositeDeserializationContext<'_, '_>) -> Result<()>;

    /// The short name of the type, emitted as the `$type` tag of
    /// polymorphic values.
    ///
    /// Defaults to the unqualified Rust type name.
    fn type_name(&self) -> &'static str {
        simple_type_name::<Self>()
    }
}

/// A type that is represented as a single JSON string token.
pub trait PrimitiveSerializable: Sized + 'static {
    /// Writes the value to `ctx`.
    ///
    /// Implementations must call [`PrimitiveSerializationContext::write`]
    /// exactly once.
    fn serialize(&self, ctx: &mut PrimitiveSerializationContext<'_>) -> Result<()>;

    /// Constructs a value from the token in `ctx`.
    fn deserialize(ctx: &mut PrimitiveDeserializationContext<'_>) -> Result<Self>;
}

/// A fieldless enumeration that is represented by the names of
/// its variants.
///
/// Usually derived with [`SerializableEnum`][macro@crate::SerializableEnum].
pub trait SerializableEnum: Sized + 'static {
    /// The name of the variant.
    fn name(&self) -> &'static str;

    /// Looks up a variant by its exact, case-sensitive name.
    fn from_name(name: &str) -> Option<Self>;
}

/// Declares that [`Shared`] handles to `Self` can be viewed as
/// handles to the polymorphic base `B`.
///
/// Every type is a subtype of itself. Implementations for trait
/// object bases are usually generated by [`impl_subtype!`] or the
/// `#[object(subtype_of(..))]` derive attribute.
pub trait Subtype<B: ?Sized>: CompositeSerializable {
    /// Converts a handle into a handle of the base type.
    fn upcast(this: Shared<Self>) -> Shared<B>;
}

impl<T: CompositeSerializable> Subtype<T> for T {
    #[inline]
    fn upcast(this: Shared<Self>) -> Shared<T> {
        this
    }
}

/// Implements [`Subtype`] of a trait object base for one or more
/// types.
///
/// # Example
///
/// ```
/// # use skein::{impl_subtype, CompositeSerializable, CompositeSerializationContext, CompositeDeserializationContext, Result};
/// trait Shape: CompositeSerializable {}
///
/// #[derive(Default)]
/// struct Dot;
///
/// impl CompositeSerializable for Dot {
///     fn serialize(&self, _: &mut CompositeSerializationContext<'_, '_>) -> Result<()> {
///         Ok(())
///     }
///
///     fn deserialize(&mut self, _: &mut CompositeDeserializationContext<'_, '_>) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// impl Shape for Dot {}
/// impl_subtype!(dyn Shape: Dot);
/// ```
#[macro_export]
macro_rules! impl_subtype {
    ($base:ty: $($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Subtype<$base> for $ty {
                #[inline]
                fn upcast(this: $crate::Shared<Self>) -> $crate::Shared<$base> {
                    this
                }
            }
        )+
    };
}
