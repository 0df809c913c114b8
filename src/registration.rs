//! Registrations and the per-container registry.

use std::any::Any;
use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::container::{Container, ResolutionContext};
use crate::descriptor::{GenericArguments, Resolvable, TypeDescriptor, Upcast};
use crate::error::{DiError, DiResult};
use crate::key::{key_of_type, Key};
use crate::lifetime::Lifetime;

#[cfg(feature = "ahash")]
type Map<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
type Map<K, V> = std::collections::HashMap<K, V>;

/// Type-erased value as stored by the engine.
///
/// Every value is an `Arc<T>` wrapped once more, so trait objects and sized
/// types are stored and recovered the same way.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Erases a shared value.
#[inline(always)]
pub fn erase<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> AnyArc {
    Arc::new(value)
}

/// Erases an owned value.
#[inline(always)]
pub fn erase_value<T: Send + Sync + 'static>(value: T) -> AnyArc {
    erase(Arc::new(value))
}

/// Recovers a value erased with [`erase`].
#[inline(always)]
pub fn unerase<T: ?Sized + Send + Sync + 'static>(value: &AnyArc) -> Option<Arc<T>> {
    value.downcast_ref::<Arc<T>>().cloned()
}

/// Converts a value erased as `C` into one erased as `I`.
pub(crate) type CastFn = fn(AnyArc) -> Option<AnyArc>;

fn cast_to<C, I>(value: AnyArc) -> Option<AnyArc>
where
    C: Upcast<I> + ?Sized + Send + Sync + 'static,
    I: ?Sized + Send + Sync + 'static,
{
    unerase::<C>(&value).map(|concrete| erase(C::upcast(concrete)))
}

pub(crate) type PlainFactory = Arc<dyn Fn(&Container) -> DiResult<AnyArc> + Send + Sync>;
pub(crate) type ContextualFactory =
    Arc<dyn Fn(&Container, &ResolutionContext<'_>) -> DiResult<AnyArc> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum FactoryFn {
    Plain(PlainFactory),
    Contextual(ContextualFactory),
}

impl FactoryFn {
    pub(crate) fn call(&self, container: &Container, ctx: &ResolutionContext<'_>) -> DiResult<AnyArc> {
        match self {
            FactoryFn::Plain(f) => f(container),
            FactoryFn::Contextual(f) => f(container, ctx),
        }
    }
}

type Closer = Arc<dyn Fn(&GenericArguments) -> DiResult<(TypeDescriptor, CastFn)> + Send + Sync>;
type GenericFactory =
    Arc<dyn Fn(&Container, &GenericArguments, &ResolutionContext<'_>) -> DiResult<AnyArc> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum ErasedTemplate {
    Type(Closer),
    Factory(GenericFactory),
}

/// How a registration produces its value.
pub(crate) enum Recipe {
    Instance(AnyArc),
    Type { concrete: TypeDescriptor, cast: CastFn },
    Factory(FactoryFn),
    OpenGeneric(ErasedTemplate),
    /// The container the request originated from
    Current,
}

/// What kind of recipe backs a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationKind {
    Instance,
    Type,
    Factory,
    OpenGeneric,
    Container,
}

/// A registration: recipe, lifetime and the singleton slot.
pub(crate) struct Registration {
    pub(crate) recipe: Recipe,
    pub(crate) lifetime: Lifetime,
    cache: OnceCell<AnyArc>,
}

impl Registration {
    pub(crate) fn new(recipe: Recipe, lifetime: Lifetime) -> Self {
        Self {
            recipe,
            lifetime,
            cache: OnceCell::new(),
        }
    }

    pub(crate) fn kind(&self) -> RegistrationKind {
        match self.recipe {
            Recipe::Instance(_) => RegistrationKind::Instance,
            Recipe::Type { .. } => RegistrationKind::Type,
            Recipe::Factory(_) => RegistrationKind::Factory,
            Recipe::OpenGeneric(_) => RegistrationKind::OpenGeneric,
            Recipe::Current => RegistrationKind::Container,
        }
    }

    pub(crate) fn cached(&self) -> Option<AnyArc> {
        self.cache.get().cloned()
    }

    /// Stores `value` unless another caller got there first. Returns the
    /// winning value and whether it was `value`.
    pub(crate) fn settle(&self, value: AnyArc) -> (AnyArc, bool) {
        let mut won = false;
        let stored = self.cache.get_or_init(|| {
            won = true;
            value
        });
        (stored.clone(), won)
    }

    pub(crate) fn is_materialized(&self) -> bool {
        matches!(self.recipe, Recipe::Instance(_)) || self.cache.get().is_some()
    }

    pub(crate) fn concrete_type(&self) -> Option<&'static str> {
        match &self.recipe {
            Recipe::Type { concrete, .. } => Some(concrete.type_name()),
            _ => None,
        }
    }

    /// Closes an open generic registration over concrete arguments.
    pub(crate) fn close(&self, arguments: GenericArguments) -> DiResult<Registration> {
        let recipe = match &self.recipe {
            Recipe::OpenGeneric(ErasedTemplate::Type(closer)) => {
                let (concrete, cast) = closer(&arguments)?;
                Recipe::Type { concrete, cast }
            }
            Recipe::OpenGeneric(ErasedTemplate::Factory(factory)) => {
                let factory = factory.clone();
                Recipe::Factory(FactoryFn::Contextual(Arc::new(move |c: &Container, ctx: &ResolutionContext<'_>| {
                    factory(c, &arguments, ctx)
                })))
            }
            _ => {
                return Err(DiError::InvalidArgument(
                    "only open generic registrations can be closed".to_string(),
                ))
            }
        };
        Ok(Registration::new(recipe, self.lifetime))
    }
}

/// Registration storage of one container.
///
/// Small registries are scanned linearly; past the threshold new keys go to a
/// hash map.
pub(crate) struct Registry {
    small: Vec<(Key, Arc<Registration>)>,
    large: Map<Key, Arc<Registration>>,
    small_threshold: usize,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            small: Vec::new(),
            large: Map::default(),
            small_threshold: 16,
        }
    }

    /// Inserts or replaces the registration for `key`.
    pub(crate) fn insert(&mut self, key: Key, registration: Arc<Registration>) {
        if let Some(slot) = self.small.iter_mut().find(|(k, _)| k == &key) {
            slot.1 = registration;
        } else if self.small.len() < self.small_threshold {
            self.small.push((key, registration));
        } else {
            self.large.insert(key, registration);
        }
    }

    #[inline(always)]
    pub(crate) fn get(&self, key: &Key) -> Option<Arc<Registration>> {
        for (k, registration) in &self.small {
            if k == key {
                return Some(registration.clone());
            }
        }
        self.large.get(key).cloned()
    }

    #[inline(always)]
    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.small.iter().any(|(k, _)| k == key) || self.large.contains_key(key)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, &Arc<Registration>)> {
        self.small.iter().map(|(k, r)| (k, r)).chain(self.large.iter())
    }

    pub(crate) fn len(&self) -> usize {
        self.small.len() + self.large.len()
    }

    pub(crate) fn clear(&mut self) {
        self.small.clear();
        self.large.clear();
    }
}

/// A pending registration of service type `I`.
///
/// ```rust
/// use arbor_di::{implements, Binding, Container, Resolvable, Resolver};
/// use std::sync::Arc;
///
/// trait Store: Send + Sync {
///     fn kind(&self) -> &'static str;
/// }
/// impl Resolvable for dyn Store {}
///
/// struct Memory;
/// impl Store for Memory {
///     fn kind(&self) -> &'static str { "memory" }
/// }
/// impl Resolvable for Memory {
///     fn constructors() -> Vec<arbor_di::Constructor> {
///         vec![arbor_di::Constructor::new([], |_| Ok(Memory))]
///     }
/// }
/// implements!(Memory => dyn Store);
///
/// let container = Container::new();
/// container.register(Binding::<dyn Store>::to::<Memory>().singleton()).unwrap();
/// container
///     .register(Binding::<dyn Store>::instance(Arc::new(Memory)).named("backup"))
///     .unwrap();
///
/// assert_eq!(container.resolve::<dyn Store>().unwrap().kind(), "memory");
/// assert!(container.can_resolve_named::<dyn Store>("backup").unwrap());
/// ```
pub struct Binding<I: ?Sized> {
    name: Option<Cow<'static, str>>,
    recipe: Recipe,
    lifetime: Lifetime,
    _service: PhantomData<fn() -> Arc<I>>,
}

impl<I: ?Sized + Send + Sync + 'static> Binding<I> {
    /// Binds a ready-made value. It is returned as is and never disposed.
    pub fn instance(value: Arc<I>) -> Self {
        Self::with_recipe(Recipe::Instance(erase(value)), Lifetime::Singleton)
    }

    /// Binds `I` to the concrete type `C`, auto-wired on demand.
    pub fn to<C>() -> Self
    where
        C: Resolvable + Upcast<I>,
    {
        Self::with_recipe(
            Recipe::Type {
                concrete: C::descriptor(),
                cast: cast_to::<C, I>,
            },
            Lifetime::Transient,
        )
    }

    /// Binds `I` to a factory callback.
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&Container) -> DiResult<Arc<I>> + Send + Sync + 'static,
    {
        let factory: PlainFactory = Arc::new(move |c: &Container| factory(c).map(erase));
        Self::with_recipe(Recipe::Factory(FactoryFn::Plain(factory)), Lifetime::Transient)
    }

    /// Binds `I` to a factory callback that also sees the resolution context.
    pub fn contextual<F>(factory: F) -> Self
    where
        F: Fn(&Container, &ResolutionContext<'_>) -> DiResult<Arc<I>> + Send + Sync + 'static,
    {
        let factory: ContextualFactory =
            Arc::new(move |c: &Container, ctx: &ResolutionContext<'_>| factory(c, ctx).map(erase));
        Self::with_recipe(Recipe::Factory(FactoryFn::Contextual(factory)), Lifetime::Transient)
    }

    /// Registers under a name instead of the default slot.
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Caches the first produced value.
    pub fn singleton(self) -> Self {
        self.lifetime(Lifetime::Singleton)
    }

    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    fn with_recipe(recipe: Recipe, lifetime: Lifetime) -> Self {
        Self {
            name: None,
            recipe,
            lifetime,
            _service: PhantomData,
        }
    }

    /// Splits into the storage key under `key` and the registration.
    pub(crate) fn into_parts_for(self, key: Key) -> DiResult<(Key, Registration)> {
        let key = match self.name {
            None => key,
            Some(name) => {
                validate_name(&name)?;
                match key {
                    Key::Type(id, type_name) | Key::TypeNamed(id, type_name, _) => {
                        Key::TypeNamed(id, type_name, Arc::from(name.as_ref()))
                    }
                    Key::Template(id, type_name) | Key::TemplateNamed(id, type_name, _) => {
                        Key::TemplateNamed(id, type_name, Arc::from(name.as_ref()))
                    }
                }
            }
        };
        Ok((key, Registration::new(self.recipe, self.lifetime)))
    }

    pub(crate) fn into_parts(self) -> DiResult<(Key, Registration)> {
        self.into_parts_for(key_of_type::<I>())
    }
}

/// Rejects empty registration and request names.
pub(crate) fn validate_name(name: &str) -> DiResult<()> {
    if name.is_empty() {
        return Err(DiError::InvalidArgument(
            "service name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// The concrete type an open template closes to, viewed as `O`.
pub struct Concrete<O: ?Sized> {
    descriptor: TypeDescriptor,
    cast: CastFn,
    _output: PhantomData<fn() -> Arc<O>>,
}

impl<O: ?Sized + Send + Sync + 'static> Concrete<O> {
    /// A statically known concrete type.
    pub fn of<C: Resolvable + Upcast<O>>() -> Self {
        Self {
            descriptor: C::descriptor(),
            cast: cast_to::<C, O>,
            _output: PhantomData,
        }
    }

    /// A concrete type whose constructors depend on the template arguments.
    pub fn with_constructors<C>(constructors: Vec<crate::Constructor>) -> Self
    where
        C: Upcast<O> + Send + Sync + 'static,
    {
        Self {
            descriptor: TypeDescriptor::with_constructors::<C>(constructors),
            cast: cast_to::<C, O>,
            _output: PhantomData,
        }
    }
}

/// An open generic registration for the family `F`.
///
/// ```rust
/// use arbor_di::{
///     ClosedGeneric, Constructor, Container, OpenGeneric, OpenTemplate, Resolvable, Resolver,
///     TypeDescriptor,
/// };
/// use std::marker::PhantomData;
/// use std::sync::Arc;
///
/// trait Describe: Send + Sync {
///     fn describe(&self) -> String;
/// }
///
/// struct Describers;
/// impl OpenGeneric for Describers {
///     type Output = dyn Describe;
/// }
///
/// struct DescriberOf<T>(PhantomData<T>);
/// impl<T: Resolvable> ClosedGeneric for DescriberOf<T> {
///     type Template = Describers;
///     fn arguments() -> Vec<TypeDescriptor> {
///         vec![TypeDescriptor::of::<T>()]
///     }
/// }
///
/// struct Named(String);
/// impl Describe for Named {
///     fn describe(&self) -> String { self.0.clone() }
/// }
///
/// let container = Container::new();
/// container
///     .register_open_generic::<Describers>(OpenTemplate::factory(|_, args| {
///         let name = args.short_names().join(",");
///         Ok(Arc::new(Named(name)) as Arc<dyn Describe>)
///     }))
///     .unwrap();
///
/// let describer = container.resolve_generic::<DescriberOf<u32>>().unwrap();
/// assert_eq!(describer.describe(), "u32");
/// ```
pub struct OpenTemplate<O: ?Sized> {
    template: ErasedTemplate,
    lifetime: Lifetime,
    _output: PhantomData<fn() -> Arc<O>>,
}

impl<O: ?Sized + Send + Sync + 'static> OpenTemplate<O> {
    /// Closes to a concrete type chosen from the arguments, then auto-wires it.
    pub fn types<F>(closer: F) -> Self
    where
        F: Fn(&GenericArguments) -> DiResult<Concrete<O>> + Send + Sync + 'static,
    {
        let closer: Closer = Arc::new(move |args: &GenericArguments| {
            let concrete = closer(args)?;
            Ok((concrete.descriptor, concrete.cast))
        });
        Self::with_template(ErasedTemplate::Type(closer))
    }

    /// Closes to a factory receiving the arguments.
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&Container, &GenericArguments) -> DiResult<Arc<O>> + Send + Sync + 'static,
    {
        let factory: GenericFactory =
            Arc::new(move |c: &Container, args: &GenericArguments, _: &ResolutionContext<'_>| {
                factory(c, args).map(erase)
            });
        Self::with_template(ErasedTemplate::Factory(factory))
    }

    /// Like [`factory`](Self::factory), with the resolution context.
    pub fn contextual<F>(factory: F) -> Self
    where
        F: Fn(&Container, &GenericArguments, &ResolutionContext<'_>) -> DiResult<Arc<O>>
            + Send
            + Sync
            + 'static,
    {
        let factory: GenericFactory =
            Arc::new(move |c: &Container, args: &GenericArguments, ctx: &ResolutionContext<'_>| {
                factory(c, args, ctx).map(erase)
            });
        Self::with_template(ErasedTemplate::Factory(factory))
    }

    /// Every closed registration caches its first value.
    pub fn singleton(mut self) -> Self {
        self.lifetime = Lifetime::Singleton;
        self
    }

    fn with_template(template: ErasedTemplate) -> Self {
        Self {
            template,
            lifetime: Lifetime::Transient,
            _output: PhantomData,
        }
    }

    pub(crate) fn into_registration(self) -> Registration {
        Registration::new(Recipe::OpenGeneric(self.template), self.lifetime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::TypeId;

    fn instance(value: u32) -> Arc<Registration> {
        Arc::new(Registration::new(Recipe::Instance(erase_value(value)), Lifetime::Singleton))
    }

    fn key(n: usize) -> Key {
        Key::TypeNamed(TypeId::of::<u32>(), "u32", Arc::from(n.to_string()))
    }

    #[test]
    fn registry_spills_to_map_and_replaces_in_place() {
        let mut registry = Registry::new();
        for n in 0..40 {
            registry.insert(key(n), instance(n as u32));
        }
        assert_eq!(registry.len(), 40);
        assert!(registry.contains_key(&key(3)));
        assert!(registry.contains_key(&key(39)));

        registry.insert(key(3), instance(300));
        registry.insert(key(39), instance(3900));
        assert_eq!(registry.len(), 40);

        let read = |k: Key| match registry.get(&k).map(|r| r.kind()) {
            Some(RegistrationKind::Instance) => match &registry.get(&k).unwrap().recipe {
                Recipe::Instance(v) => *unerase::<u32>(v).unwrap(),
                _ => unreachable!(),
            },
            _ => unreachable!(),
        };
        assert_eq!(read(key(3)), 300);
        assert_eq!(read(key(39)), 3900);
    }

    #[test]
    fn settle_keeps_first_value() {
        let reg = Registration::new(Recipe::Current, Lifetime::Singleton);
        let (first, won_first) = reg.settle(erase_value(1u8));
        let (second, won_second) = reg.settle(erase_value(2u8));
        assert!(won_first);
        assert!(!won_second);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(reg.is_materialized());
    }

    #[test]
    fn empty_names_are_rejected() {
        let binding = Binding::<u32>::instance(Arc::new(1)).named("");
        assert!(matches!(binding.into_parts(), Err(DiError::InvalidArgument(_))));
    }
}
