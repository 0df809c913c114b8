//! Deferred values, invokers and typed resolvers.
//!
//! All three are synthesized on request by any container, hold only a weak
//! handle to it and resolve through it later. A request for
//! `Deferred<dyn Service>` therefore succeeds even when `dyn Service` is not
//! resolvable yet.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::container::{Container, WeakContainer};
use crate::descriptor::{Resolvable, TypeDescriptor};
use crate::error::DiResult;
use crate::overrides::ParameterOverride;
use crate::registration::{erase_value, AnyArc};
use crate::traits::Resolver;

/// A `T` resolved on first use and then memoised.
///
/// ```rust
/// use arbor_di::{Container, Deferred, Resolver};
///
/// let container = Container::new();
/// let later = container.resolve::<Deferred<String>>().unwrap();
/// assert!(!later.is_resolved());
///
/// container.register_value(String::from("ready")).unwrap();
/// assert_eq!(*later.get().unwrap(), "ready");
/// assert!(later.is_resolved());
/// ```
pub struct Deferred<T: ?Sized> {
    container: WeakContainer,
    value: OnceCell<Arc<T>>,
}

impl<T: Resolvable + ?Sized> Deferred<T> {
    pub(crate) fn new(container: &Container) -> Self {
        Self {
            container: container.downgrade(),
            value: OnceCell::new(),
        }
    }

    /// Resolves `T` the first time, then returns the same value.
    ///
    /// Failures are not memoised; a later call tries again.
    pub fn get(&self) -> DiResult<Arc<T>> {
        if let Some(value) = self.value.get() {
            return Ok(value.clone());
        }
        let value = self.container.upgrade()?.resolve::<T>()?;
        Ok(self.value.get_or_init(|| value).clone())
    }

    pub fn is_resolved(&self) -> bool {
        self.value.get().is_some()
    }
}

fn synthesize_deferred<T: Resolvable + ?Sized>(container: &Container) -> AnyArc {
    erase_value(Deferred::<T>::new(container))
}

impl<T: Resolvable + ?Sized> Resolvable for Deferred<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::deferred::<Self>(synthesize_deferred::<T>)
    }
}

impl<T: ?Sized> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("target", &std::any::type_name::<T>())
            .field("resolved", &self.value.get().is_some())
            .finish()
    }
}

/// Positional arguments of an [`Invoker`].
///
/// Implemented for tuples of up to eight values. Each value becomes an
/// override by its exact type, so the first constructor parameter declared
/// with that type receives it.
pub trait ArgumentList: Send + 'static {
    fn descriptors() -> Vec<TypeDescriptor>;

    fn into_overrides(self) -> Vec<ParameterOverride>;
}

macro_rules! argument_list {
    ($($name:ident : $index:tt),*) => {
        impl<$($name: Send + Sync + 'static),*> ArgumentList for ($($name,)*) {
            fn descriptors() -> Vec<TypeDescriptor> {
                vec![$(TypeDescriptor::opaque::<$name>()),*]
            }

            #[allow(unused_variables)]
            fn into_overrides(self) -> Vec<ParameterOverride> {
                vec![$(ParameterOverride::by_type(self.$index)),*]
            }
        }
    };
}

argument_list!();
argument_list!(A: 0);
argument_list!(A: 0, B: 1);
argument_list!(A: 0, B: 1, C: 2);
argument_list!(A: 0, B: 1, C: 2, D: 3);
argument_list!(A: 0, B: 1, C: 2, D: 3, E: 4);
argument_list!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
argument_list!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
argument_list!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);

/// Resolves `T` from the container it came from, optionally with arguments.
///
/// ```rust
/// use arbor_di::{Constructor, Container, Parameter, Resolvable, Resolver};
///
/// struct Label(String, u32);
/// impl Resolvable for Label {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::new(
///             [Parameter::of::<String>("text"), Parameter::of::<u32>("width")],
///             |args| Ok(Label(args.cloned::<String>(0)?, args.cloned::<u32>(1)?)),
///         )]
///     }
/// }
///
/// let container = Container::new();
/// let labels = container.resolver_for::<Label>();
/// let label = labels.resolve_with((String::from("total"), 12u32)).unwrap();
/// assert_eq!((label.0.as_str(), label.1), ("total", 12));
/// ```
pub struct TypedResolver<T: ?Sized> {
    container: WeakContainer,
    _target: PhantomData<fn() -> Arc<T>>,
}

impl<T: Resolvable + ?Sized> TypedResolver<T> {
    pub(crate) fn new(container: &Container) -> Self {
        Self {
            container: container.downgrade(),
            _target: PhantomData,
        }
    }

    pub fn resolve(&self) -> DiResult<Arc<T>> {
        self.container.upgrade()?.resolve::<T>()
    }

    pub fn resolve_named(&self, name: &str) -> DiResult<Arc<T>> {
        self.container.upgrade()?.resolve_named::<T>(name)
    }

    /// Resolves `T` with `args` as by-type overrides of its constructor.
    pub fn resolve_with<A: ArgumentList>(&self, args: A) -> DiResult<Arc<T>> {
        self.container.upgrade()?.resolve_with::<T>(&args.into_overrides())
    }
}

impl<T: ?Sized> Clone for TypedResolver<T> {
    fn clone(&self) -> Self {
        Self {
            container: self.container.clone(),
            _target: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for TypedResolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedResolver").field(&std::any::type_name::<T>()).finish()
    }
}

/// A factory function `Args -> T` synthesized by the container.
///
/// Requesting `Invoker<(String, u32), Label>` yields a callable that resolves
/// `Label` with the call's arguments as by-type overrides.
///
/// ```rust
/// use arbor_di::{Constructor, Container, Invoker, Parameter, Resolvable, Resolver};
///
/// struct Session(u64);
/// impl Resolvable for Session {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::new([Parameter::of::<u64>("id")], |args| {
///             Ok(Session(args.cloned::<u64>(0)?))
///         })]
///     }
/// }
///
/// let container = Container::new();
/// let open = container.resolve::<Invoker<(u64,), Session>>().unwrap();
/// assert_eq!(open.invoke((41,)).unwrap().0, 41);
/// ```
pub struct Invoker<Args, T: ?Sized> {
    resolver: TypedResolver<T>,
    _args: PhantomData<fn(Args)>,
}

impl<Args: ArgumentList, T: Resolvable + ?Sized> Invoker<Args, T> {
    pub fn invoke(&self, args: Args) -> DiResult<Arc<T>> {
        self.resolver.resolve_with(args)
    }
}

fn synthesize_invoker<Args: ArgumentList, T: Resolvable + ?Sized>(container: &Container) -> AnyArc {
    erase_value(Invoker::<Args, T> {
        resolver: TypedResolver::new(container),
        _args: PhantomData,
    })
}

impl<Args: ArgumentList, T: Resolvable + ?Sized> Resolvable for Invoker<Args, T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::invocable::<Self>(Args::descriptors, synthesize_invoker::<Args, T>)
    }
}

impl<Args, T: ?Sized> fmt::Debug for Invoker<Args, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invoker")
            .field("args", &std::any::type_name::<Args>())
            .field("target", &std::any::type_name::<T>())
            .finish()
    }
}

impl Container {
    /// A handle that resolves `T` from this container on demand.
    pub fn resolver_for<T: Resolvable + ?Sized>(&self) -> TypedResolver<T> {
        TypedResolver::new(self)
    }
}
