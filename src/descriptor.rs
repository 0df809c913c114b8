//! Runtime type descriptors.
//!
//! Rust has no runtime reflection, so every type that can be requested from a
//! [`Container`](crate::Container) describes itself through [`Resolvable`]:
//! its identity, its public constructors (for auto-wiring) and, for the few
//! synthesized shapes, how the engine builds it. Open generics are modelled as
//! a template identity plus a tuple of argument descriptors.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::constructor::Constructor;
use crate::container::Container;
use crate::internal::Frame;
use crate::registration::AnyArc;

/// A type that can be requested through the typed resolution API.
///
/// The defaults describe a type with no public constructors: it can be
/// registered and resolved, but never auto-wired. Override
/// [`constructors`](Resolvable::constructors) to make a type auto-wirable.
///
/// Trait objects opt in with an empty impl:
///
/// ```rust
/// use arbor_di::Resolvable;
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// impl Resolvable for dyn Clock {}
/// ```
///
/// Concrete types list their constructors in declaration order:
///
/// ```rust
/// use arbor_di::{Constructor, Parameter, Resolvable};
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// impl Resolvable for Greeter {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::new([Parameter::of::<String>("greeting")], |args| {
///             Ok(Greeter { greeting: args.cloned::<String>(0)? })
///         })]
///     }
/// }
/// ```
pub trait Resolvable: Send + Sync + 'static {
    /// Public constructors, in declaration order.
    fn constructors() -> Vec<Constructor> {
        Vec::new()
    }

    /// Runtime descriptor of this type.
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::plain::<Self>()
    }
}

/// Conversion of a concrete `Arc<Self>` into the registered service type.
///
/// Every type converts to itself. Conversions into trait objects are written
/// with the [`implements!`](crate::implements) macro.
pub trait Upcast<I: ?Sized> {
    fn upcast(self: Arc<Self>) -> Arc<I>;
}

impl<T: ?Sized> Upcast<T> for T {
    #[inline(always)]
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// Declares that a concrete type can be mapped onto one or more trait objects.
///
/// ```rust
/// use arbor_di::implements;
///
/// trait Animal: Send + Sync {}
/// trait Pet: Send + Sync {}
///
/// struct Dog;
/// impl Animal for Dog {}
/// impl Pet for Dog {}
///
/// implements!(Dog => dyn Animal, dyn Pet);
/// ```
#[macro_export]
macro_rules! implements {
    ($concrete:ty => $($service:ty),+ $(,)?) => {
        $(
            impl $crate::Upcast<$service> for $concrete {
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$service> {
                    self
                }
            }
        )+
    };
}

/// Synthesizes a value for a special shape on behalf of a container.
pub(crate) type Synthesizer = fn(&Container) -> AnyArc;

#[derive(Clone)]
pub(crate) enum ConstructorSource {
    Static(fn() -> Vec<Constructor>),
    Bound(Arc<[Constructor]>),
}

#[derive(Clone)]
pub(crate) enum TypeKind {
    /// Ordinary type, auto-wired through its constructors
    Plain(ConstructorSource),
    /// `Deferred<T>`
    Deferred(Synthesizer),
    /// `Invoker<Args, T>`
    Invocable {
        inputs: fn() -> Vec<TypeDescriptor>,
        synthesize: Synthesizer,
    },
    /// Closed member of an open generic family
    Closed {
        template: TemplateId,
        arguments: fn() -> Vec<TypeDescriptor>,
    },
    /// The container itself
    Container,
}

/// Runtime identity of a requestable type.
///
/// Two descriptors are equal when they describe the same `TypeId`.
#[derive(Clone)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
    kind: TypeKind,
}

impl TypeDescriptor {
    /// Descriptor of any [`Resolvable`] type.
    pub fn of<T: Resolvable + ?Sized>() -> Self {
        T::descriptor()
    }

    /// Descriptor built from `T`'s declared constructors.
    pub fn plain<T: Resolvable + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: TypeKind::Plain(ConstructorSource::Static(T::constructors)),
        }
    }

    /// Descriptor of a type that is never auto-wired.
    pub fn opaque<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: TypeKind::Plain(ConstructorSource::Static(Vec::new)),
        }
    }

    /// Descriptor whose constructors were built at runtime, typically by an
    /// open generic template closing over its type arguments.
    pub fn with_constructors<T: ?Sized + 'static>(constructors: Vec<Constructor>) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: TypeKind::Plain(ConstructorSource::Bound(constructors.into())),
        }
    }

    /// Descriptor of a closed generic member.
    pub fn closed<C: ClosedGeneric>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
            kind: TypeKind::Closed {
                template: TemplateId::of::<C::Template>(),
                arguments: C::arguments,
            },
        }
    }

    pub(crate) fn container() -> Self {
        Self {
            id: TypeId::of::<Container>(),
            name: std::any::type_name::<Container>(),
            kind: TypeKind::Container,
        }
    }

    pub(crate) fn deferred<T: ?Sized + 'static>(synthesize: Synthesizer) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: TypeKind::Deferred(synthesize),
        }
    }

    pub(crate) fn invocable<T: ?Sized + 'static>(
        inputs: fn() -> Vec<TypeDescriptor>,
        synthesize: Synthesizer,
    ) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: TypeKind::Invocable { inputs, synthesize },
        }
    }

    #[inline(always)]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    #[inline(always)]
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Type name without module paths, for traces.
    pub fn short_name(&self) -> String {
        shorten(self.name)
    }

    /// Public constructors of a plain type; empty for every other shape.
    pub fn constructors(&self) -> Vec<Constructor> {
        match &self.kind {
            TypeKind::Plain(ConstructorSource::Static(list)) => list(),
            TypeKind::Plain(ConstructorSource::Bound(list)) => list.to_vec(),
            _ => Vec::new(),
        }
    }

    /// Template identity, for closed generic members.
    pub fn template(&self) -> Option<TemplateId> {
        match &self.kind {
            TypeKind::Closed { template, .. } => Some(*template),
            _ => None,
        }
    }

    /// Template and type arguments, for closed generic members.
    pub fn generic_arguments(&self) -> Option<GenericArguments> {
        match &self.kind {
            TypeKind::Closed {
                template,
                arguments,
            } => Some(GenericArguments {
                template: *template,
                types: arguments().into(),
            }),
            _ => None,
        }
    }

    /// Input types of an invocable shape.
    pub fn invocable_inputs(&self) -> Option<Vec<TypeDescriptor>> {
        match &self.kind {
            TypeKind::Invocable { inputs, .. } => Some(inputs()),
            _ => None,
        }
    }

    pub(crate) fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Identity of auto-wiring this descriptor, for cycle detection.
    pub(crate) fn frame(&self) -> Frame {
        match &self.kind {
            TypeKind::Plain(ConstructorSource::Bound(list)) => {
                Frame::Bound(Arc::as_ptr(list) as *const () as usize)
            }
            _ => Frame::Type(self.id),
        }
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeDescriptor").field(&self.name).finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Strips module paths from every segment of a type name.
fn shorten(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut segment = String::new();
    for ch in name.chars() {
        match ch {
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';' => {
                out.push_str(segment.rsplit("::").next().unwrap_or(&segment));
                segment.clear();
                out.push(ch);
            }
            _ => segment.push(ch),
        }
    }
    out.push_str(segment.rsplit("::").next().unwrap_or(&segment));
    out
}

/// An open generic family, such as "speaker of any animal".
///
/// The family is a marker type; `Output` fixes the value type every closed
/// member of the family resolves to.
pub trait OpenGeneric: 'static {
    type Output: ?Sized + Send + Sync + 'static;
}

/// A closed member of an open generic family.
///
/// ```rust
/// use arbor_di::{ClosedGeneric, OpenGeneric, Resolvable, TypeDescriptor};
/// use std::marker::PhantomData;
///
/// trait Repository: Send + Sync {
///     fn entity(&self) -> &str;
/// }
///
/// struct Repositories;
/// impl OpenGeneric for Repositories {
///     type Output = dyn Repository;
/// }
///
/// struct RepositoryOf<E>(PhantomData<E>);
/// impl<E: Resolvable> ClosedGeneric for RepositoryOf<E> {
///     type Template = Repositories;
///     fn arguments() -> Vec<TypeDescriptor> {
///         vec![TypeDescriptor::of::<E>()]
///     }
/// }
/// ```
pub trait ClosedGeneric: 'static {
    type Template: OpenGeneric;

    /// Concrete type arguments, positionally.
    fn arguments() -> Vec<TypeDescriptor>;
}

/// Stable identity of an open generic family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateId {
    id: TypeId,
    name: &'static str,
}

impl TemplateId {
    pub fn of<F: OpenGeneric>() -> Self {
        Self {
            id: TypeId::of::<F>(),
            name: std::any::type_name::<F>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Type arguments handed to an open generic template when it is closed.
#[derive(Debug, Clone)]
pub struct GenericArguments {
    template: TemplateId,
    types: Arc<[TypeDescriptor]>,
}

impl GenericArguments {
    pub fn template(&self) -> TemplateId {
        self.template
    }

    pub fn get(&self, index: usize) -> Option<&TypeDescriptor> {
        self.types.get(index)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.iter()
    }

    /// Short names of the arguments, e.g. `["Cat"]`.
    pub fn short_names(&self) -> Vec<String> {
        self.types.iter().map(TypeDescriptor::short_name).collect()
    }
}

macro_rules! resolvable_values {
    ($($ty:ty),* $(,)?) => {
        $(impl Resolvable for $ty {})*
    };
}

resolvable_values!(
    String,
    &'static str,
    bool,
    char,
    (),
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    std::path::PathBuf,
    std::time::Duration,
);

impl<T: Send + Sync + 'static> Resolvable for Vec<T> {}

impl<T: Send + Sync + 'static> Resolvable for Option<T> {}
