use std::{
    any::{Any, TypeId},
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::Rc,
};

use crate::{CompositeSerializable, Error, Result, Shared, Subtype};

/// Strips module paths and generic arguments off a Rust type name.
///
/// `my_app::shapes::Circle<f32>` becomes `Circle`.
pub fn simple_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

type MakeFn = dyn Fn() -> Rc<dyn Any> + Send + Sync;

/// The placeholder constructor of a registered composite type.
pub struct Constructor {
    name: &'static str,
    make: Box<MakeFn>,
}

impl Constructor {
    /// The `$type` name of the constructed type.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Creates a fresh placeholder in a type-erased [`Shared`]
    /// handle.
    #[inline]
    pub(crate) fn make(&self) -> Rc<dyn Any> {
        (self.make)()
    }

    /// Creates a fresh placeholder by value.
    pub(crate) fn make_owned<T: CompositeSerializable>(&self) -> Result<T> {
        let handle = self
            .make()
            .downcast::<RefCell<T>>()
            .map_err(|_| produced_foreign::<T>())?;

        Rc::try_unwrap(handle)
            .map(RefCell::into_inner)
            .map_err(|_| produced_foreign::<T>())
    }

    /// Creates a fresh placeholder in a typed [`Shared`] handle,
    /// together with its type-erased view.
    pub(crate) fn make_shared<T: CompositeSerializable>(&self) -> Result<(Rc<dyn Any>, Shared<T>)> {
        let any = self.make();
        let shared = any
            .clone()
            .downcast::<RefCell<T>>()
            .map_err(|_| produced_foreign::<T>())?;

        Ok((any, shared))
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cold]
fn produced_foreign<T>() -> Error {
    Error::UnsupportedType {
        type_name: simple_type_name::<T>(),
        reason: "registered constructor produced a value of another type".into(),
    }
}

/// Maps composite types to the constructors of their
/// placeholders.
///
/// The registry is populated once at startup and never
/// invalidated afterwards. Every composite type that is read from
/// a document, including the root type, must be registered.
#[derive(Debug, Default)]
pub struct Registry {
    constructors: HashMap<TypeId, Constructor>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` with its [`Default`] value as the placeholder.
    pub fn register<T: CompositeSerializable + Default>(&mut self) -> &mut Self {
        self.register_with(T::default)
    }

    /// Registers `T` with a custom placeholder factory.
    ///
    /// The `$type` name of `T` is taken from a probe value built by
    /// `factory` at registration time.
    pub fn register_with<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: CompositeSerializable,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let name = factory().type_name();
        let constructor = Constructor {
            name,
            make: Box::new(move || Rc::new(RefCell::new(factory())) as Rc<dyn Any>),
        };

        if self.constructors.insert(TypeId::of::<T>(), constructor).is_some() {
            tracing::debug!(type_name = name, "replaced registered constructor");
        }

        self
    }

    /// Whether `T` has been registered.
    pub fn contains<T: CompositeSerializable>(&self) -> bool {
        self.constructors.contains_key(&TypeId::of::<T>())
    }

    /// Gets the `$type` name `T` was registered under.
    pub fn type_name_of<T: CompositeSerializable>(&self) -> Option<&'static str> {
        self.constructors
            .get(&TypeId::of::<T>())
            .map(Constructor::name)
    }

    /// Resolves the constructor of a registered type.
    pub(crate) fn resolve(&self, type_id: TypeId, type_name: &'static str) -> Result<&Constructor> {
        self.constructors
            .get(&type_id)
            .ok_or_else(|| Error::UnsupportedType {
                type_name,
                reason: "no constructor is registered for it".into(),
            })
    }

    #[inline]
    pub(crate) fn resolve_for<T: CompositeSerializable>(&self) -> Result<&Constructor> {
        self.resolve(TypeId::of::<T>(), simple_type_name::<T>())
    }
}

/// A potential concrete type of a polymorphic value with base `B`.
///
/// Lists of candidates are usually built with [`candidates!`].
pub struct Candidate<B: ?Sized> {
    type_id: TypeId,
    type_name: &'static str,
    cast: fn(Rc<dyn Any>) -> Option<Shared<B>>,
}

impl<B: ?Sized + 'static> Candidate<B> {
    /// Creates the candidate for concrete type `T`.
    pub fn new<T: Subtype<B>>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: simple_type_name::<T>(),
            cast: cast_any::<T, B>,
        }
    }

    /// Resolves the constructor of the candidate type.
    pub(crate) fn constructor<'r>(&self, registry: &'r Registry) -> Result<&'r Constructor> {
        registry.resolve(self.type_id, self.type_name)
    }

    /// Views a type-erased handle as a handle to the base type if
    /// it holds the candidate type.
    #[inline]
    pub(crate) fn cast(&self, any: Rc<dyn Any>) -> Option<Shared<B>> {
        (self.cast)(any)
    }
}

impl<B: ?Sized> fmt::Debug for Candidate<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Candidate").field(&self.type_name).finish()
    }
}

fn cast_any<T: Subtype<B>, B: ?Sized>(any: Rc<dyn Any>) -> Option<Shared<B>> {
    any.downcast::<RefCell<T>>().ok().map(<T as Subtype<B>>::upcast)
}

/// Builds an array of [`Candidate`]s for the given types.
///
/// The first type is the one constructed when a polymorphic
/// object carries no `$type` tag.
///
/// ```
/// # use skein::{candidates, Candidate, CompositeSerializable, CompositeSerializationContext, CompositeDeserializationContext, Result};
/// #[derive(Default)]
/// struct Leaf;
///
/// impl CompositeSerializable for Leaf {
///     fn serialize(&self, _: &mut CompositeSerializationContext<'_, '_>) -> Result<()> {
///         Ok(())
///     }
///
///     fn deserialize(&mut self, _: &mut CompositeDeserializationContext<'_, '_>) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// let list: [Candidate<Leaf>; 1] = candidates![Leaf];
/// ```
#[macro_export]
macro_rules! candidates {
    ($($ty:ty),* $(,)?) => {
        [$($crate::Candidate::new::<$ty>()),*]
    };
}
