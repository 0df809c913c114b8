//! Resolver traits for type resolution.

use std::sync::Arc;

use crate::descriptor::{ClosedGeneric, OpenGeneric, Resolvable, TypeDescriptor};
use crate::error::{DiError, DiResult};
use crate::overrides::ParameterOverride;
use crate::registration::{unerase, AnyArc};

/// Core resolver trait for object-safe resolution.
///
/// Everything works on runtime [`TypeDescriptor`]s and erased values; "not
/// found" is `Ok(None)`. Most users call the generic methods of [`Resolver`]
/// instead.
pub trait ResolverCore: Send + Sync {
    /// Resolves `ty` under `name`, applying `overrides` to the constructor of
    /// the requested type if it ends up auto-wired.
    fn resolve_erased(
        &self,
        ty: &TypeDescriptor,
        name: Option<&str>,
        overrides: &[ParameterOverride],
    ) -> DiResult<Option<AnyArc>>;

    /// Auto-wires `ty` directly, bypassing registrations for `ty` itself.
    fn construct_erased(
        &self,
        ty: &TypeDescriptor,
        overrides: &[ParameterOverride],
    ) -> DiResult<Option<AnyArc>>;

    /// True if a registration for `ty` (or its open template) exists here or,
    /// unless `locally`, in an ancestor.
    fn has_registration(&self, ty: &TypeDescriptor, name: Option<&str>, locally: bool) -> DiResult<bool>;
}

fn downcast<T: ?Sized + Send + Sync + 'static>(value: AnyArc) -> DiResult<Arc<T>> {
    unerase::<T>(&value).ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))
}

fn required<T: ?Sized + Send + Sync + 'static>(
    value: Option<AnyArc>,
    name: Option<&str>,
) -> DiResult<Arc<T>> {
    match value {
        Some(value) => downcast(value),
        None => Err(DiError::ResolutionFailed {
            type_name: std::any::type_name::<T>(),
            name: name.map(str::to_owned),
        }),
    }
}

/// Typed resolution API.
///
/// Strict calls (`resolve*`) fail with [`DiError::ResolutionFailed`] when
/// nothing can supply the type; lenient calls (`try_resolve*`) return
/// `Ok(None)`. Other failures propagate from both.
///
/// # Examples
///
/// ```
/// use arbor_di::{Binding, Container, Resolvable, Resolver};
/// use std::sync::Arc;
///
/// trait Database: Send + Sync {
///     fn url(&self) -> &str;
/// }
/// impl Resolvable for dyn Database {}
///
/// struct Postgres;
/// impl Database for Postgres {
///     fn url(&self) -> &str { "postgres://..." }
/// }
///
/// let container = Container::new();
/// container.register(Binding::<dyn Database>::instance(Arc::new(Postgres))).unwrap();
///
/// assert_eq!(container.resolve::<dyn Database>().unwrap().url(), "postgres://...");
/// assert!(container.try_resolve::<String>().unwrap().is_none());
/// ```
pub trait Resolver: ResolverCore {
    fn resolve<T: Resolvable + ?Sized>(&self) -> DiResult<Arc<T>> {
        required(self.resolve_erased(&T::descriptor(), None, &[])?, None)
    }

    fn resolve_named<T: Resolvable + ?Sized>(&self, name: &str) -> DiResult<Arc<T>> {
        required(self.resolve_erased(&T::descriptor(), Some(name), &[])?, Some(name))
    }

    /// Resolves `T`, overriding parameters of its auto-wired constructor.
    ///
    /// ```
    /// use arbor_di::{Constructor, Container, Parameter, ParameterOverride, Resolvable, Resolver};
    ///
    /// struct Greeting(String);
    /// impl Resolvable for Greeting {
    ///     fn constructors() -> Vec<Constructor> {
    ///         vec![Constructor::new([Parameter::of::<String>("text")], |args| {
    ///             Ok(Greeting(args.cloned::<String>(0)?))
    ///         })]
    ///     }
    /// }
    ///
    /// let container = Container::new();
    /// let greeting = container
    ///     .resolve_with::<Greeting>(&[ParameterOverride::by_name("text", String::from("hi"))])
    ///     .unwrap();
    /// assert_eq!(greeting.0, "hi");
    /// ```
    fn resolve_with<T: Resolvable + ?Sized>(&self, overrides: &[ParameterOverride]) -> DiResult<Arc<T>> {
        required(self.resolve_erased(&T::descriptor(), None, overrides)?, None)
    }

    fn resolve_named_with<T: Resolvable + ?Sized>(
        &self,
        name: &str,
        overrides: &[ParameterOverride],
    ) -> DiResult<Arc<T>> {
        required(self.resolve_erased(&T::descriptor(), Some(name), overrides)?, Some(name))
    }

    fn try_resolve<T: Resolvable + ?Sized>(&self) -> DiResult<Option<Arc<T>>> {
        self.resolve_erased(&T::descriptor(), None, &[])?
            .map(downcast)
            .transpose()
    }

    fn try_resolve_named<T: Resolvable + ?Sized>(&self, name: &str) -> DiResult<Option<Arc<T>>> {
        self.resolve_erased(&T::descriptor(), Some(name), &[])?
            .map(downcast)
            .transpose()
    }

    fn try_resolve_with<T: Resolvable + ?Sized>(
        &self,
        overrides: &[ParameterOverride],
    ) -> DiResult<Option<Arc<T>>> {
        self.resolve_erased(&T::descriptor(), None, overrides)?
            .map(downcast)
            .transpose()
    }

    /// Resolves the closed generic member `C`, e.g. `SpeakerOf<Cat>`.
    fn resolve_generic<C: ClosedGeneric>(&self) -> DiResult<Arc<<C::Template as OpenGeneric>::Output>> {
        required(self.resolve_erased(&TypeDescriptor::closed::<C>(), None, &[])?, None)
    }

    fn resolve_generic_named<C: ClosedGeneric>(
        &self,
        name: &str,
    ) -> DiResult<Arc<<C::Template as OpenGeneric>::Output>> {
        required(
            self.resolve_erased(&TypeDescriptor::closed::<C>(), Some(name), &[])?,
            Some(name),
        )
    }

    fn try_resolve_generic<C: ClosedGeneric>(
        &self,
    ) -> DiResult<Option<Arc<<C::Template as OpenGeneric>::Output>>> {
        self.resolve_erased(&TypeDescriptor::closed::<C>(), None, &[])?
            .map(downcast)
            .transpose()
    }

    /// Auto-wires a fresh `T` even if `T` itself is registered.
    fn create_instance<T: Resolvable + ?Sized>(&self, overrides: &[ParameterOverride]) -> DiResult<Arc<T>> {
        required(self.construct_erased(&T::descriptor(), overrides)?, None)
    }

    /// True if `T` is registered here or in an ancestor. Auto-wirable but
    /// unregistered types report `false`.
    fn can_resolve<T: Resolvable + ?Sized>(&self) -> DiResult<bool> {
        self.has_registration(&T::descriptor(), None, false)
    }

    fn can_resolve_named<T: Resolvable + ?Sized>(&self, name: &str) -> DiResult<bool> {
        self.has_registration(&T::descriptor(), Some(name), false)
    }

    /// Like [`can_resolve`](Resolver::can_resolve), ignoring ancestors.
    fn can_resolve_locally<T: Resolvable + ?Sized>(&self, name: Option<&str>) -> DiResult<bool> {
        self.has_registration(&T::descriptor(), name, true)
    }

    fn can_resolve_generic<C: ClosedGeneric>(&self) -> DiResult<bool> {
        self.has_registration(&TypeDescriptor::closed::<C>(), None, false)
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
