//! The hierarchical container.
//!
//! A [`Container`] holds registrations and the values it is responsible for
//! disposing. Children see everything their ancestors registered; ancestors
//! never see their children. A request that no registration along the chain
//! can answer is auto-wired by the container it was made on, which then owns
//! the result.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use crate::descriptor::{ClosedGeneric, OpenGeneric, Resolvable, TemplateId, TypeDescriptor, Upcast};
use crate::descriptors::RegistrationInfo;
use crate::error::{DiError, DiResult};
use crate::internal::{DisposeBag, Frame, StackGuard};
use crate::key::{key_of_type, Key};
use crate::lifetime::Lifetime;
use crate::options::{ContainerBuilder, ContainerOptions, TraceSink};
use crate::overrides::ParameterOverride;
use crate::registration::{
    erase_value, validate_name, AnyArc, Binding, OpenTemplate, Recipe, Registration, Registry,
};
use crate::traits::{Dispose, ResolverCore};

/// Appends a formatted line to an optional tracer, formatting only when tracing.
macro_rules! step {
    ($tracer:expr, $($arg:tt)*) => {
        if let Some(t) = $tracer.as_deref_mut() {
            t.add(format!($($arg)*));
        }
    };
}

mod autowire;
mod context;
mod tracer;

pub use context::ResolutionContext;
pub(crate) use tracer::ResolutionTracer;

/// Process-unique container identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(u64);

impl ContainerId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ContainerId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) struct ContainerInner {
    id: ContainerId,
    name: Option<Arc<str>>,
    options: ContainerOptions,
    sink: Option<TraceSink>,
    parent: Option<Container>,
    registry: RwLock<Registry>,
    disposables: Mutex<DisposeBag>,
    disposed: AtomicBool,
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        let pending = self.disposables.get_mut().len();
        if !*self.disposed.get_mut() && pending > 0 {
            warn!(
                container = %self.id,
                name = self.name.as_deref().unwrap_or(""),
                pending,
                "container dropped without dispose(); tracked values were not disposed"
            );
        }
    }
}

/// A node in the container tree.
///
/// `Container` is a cheap handle; clones share the same registrations and
/// disposal state. Every container answers requests for [`Container`] with
/// the container the request was made on.
///
/// Singletons that capture a `Container` keep it alive until it is disposed;
/// [`Deferred`](crate::Deferred), [`Invoker`](crate::Invoker) and
/// [`TypedResolver`](crate::TypedResolver) hold a [`WeakContainer`] instead.
///
/// # Examples
///
/// ```rust
/// use arbor_di::{Container, Resolver};
///
/// let root = Container::new();
/// root.register_value(String::from("shared")).unwrap();
///
/// let child = root.create_child().unwrap();
/// child.register_value(7u32).unwrap();
///
/// assert_eq!(*child.resolve::<String>().unwrap(), "shared");
/// assert_eq!(*child.resolve::<u32>().unwrap(), 7);
/// assert!(root.try_resolve::<u32>().unwrap().is_none());
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// A root container with default options.
    pub fn new() -> Self {
        Self::from_parts(ContainerOptions::default(), None, None)
    }

    /// Starts configuring a root container.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub(crate) fn from_parts(
        options: ContainerOptions,
        sink: Option<TraceSink>,
        parent: Option<Container>,
    ) -> Self {
        let mut registry = Registry::new();
        registry.insert(
            key_of_type::<Container>(),
            Arc::new(Registration::new(Recipe::Current, Lifetime::Transient)),
        );

        let container = Self {
            inner: Arc::new(ContainerInner {
                id: ContainerId::next(),
                name: options.name.as_deref().map(Arc::from),
                options,
                sink,
                parent,
                registry: RwLock::new(registry),
                disposables: Mutex::new(DisposeBag::default()),
                disposed: AtomicBool::new(false),
            }),
        };
        debug!(
            container = %container,
            parent = ?container.inner.parent.as_ref().map(Container::id),
            "container created"
        );
        container
    }

    /// A child sharing this container's trace name, options and sink.
    pub fn create_child(&self) -> DiResult<Container> {
        self.spawn_child(self.inner.options.name.clone())
    }

    /// A child traced as `parent/name`.
    pub fn create_named_child(&self, name: &str) -> DiResult<Container> {
        validate_name(name)?;
        let name = match &self.inner.name {
            Some(parent) => format!("{parent}/{name}"),
            None => name.to_string(),
        };
        self.spawn_child(Some(name))
    }

    fn spawn_child(&self, name: Option<String>) -> DiResult<Container> {
        self.ensure_active()?;
        let options = ContainerOptions {
            name,
            ..self.inner.options.clone()
        };
        Ok(Container::from_parts(options, self.inner.sink.clone(), Some(self.clone())))
    }

    pub fn id(&self) -> ContainerId {
        self.inner.id
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn parent(&self) -> Option<&Container> {
        self.inner.parent.as_ref()
    }

    /// The topmost ancestor, or `self` for a root.
    pub fn root(&self) -> &Container {
        let mut current = self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.inner.options
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// True if both handles refer to the same container.
    pub fn same(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakContainer {
        WeakContainer {
            inner: Arc::downgrade(&self.inner),
            label: self.trace_name().into(),
        }
    }

    /// Registers `binding`, replacing any local registration under the same key.
    pub fn register<I: ?Sized + Send + Sync + 'static>(&self, binding: Binding<I>) -> DiResult<&Self> {
        let (key, registration) = binding.into_parts()?;
        self.insert(key, registration)
    }

    /// Registers a specific closed member of an open generic family, taking
    /// precedence over the family's template.
    pub fn register_generic<C: ClosedGeneric>(
        &self,
        binding: Binding<<C::Template as OpenGeneric>::Output>,
    ) -> DiResult<&Self> {
        let (key, registration) = binding.into_parts_for(key_of_type::<C>())?;
        self.insert(key, registration)
    }

    /// Registers a template for every closed member of the family `F`.
    pub fn register_open_generic<F: OpenGeneric>(&self, template: OpenTemplate<F::Output>) -> DiResult<&Self> {
        self.insert(Key::for_template(TemplateId::of::<F>(), None), template.into_registration())
    }

    pub fn register_named_open_generic<F: OpenGeneric>(
        &self,
        name: &str,
        template: OpenTemplate<F::Output>,
    ) -> DiResult<&Self> {
        validate_name(name)?;
        self.insert(
            Key::for_template(TemplateId::of::<F>(), Some(name)),
            template.into_registration(),
        )
    }

    pub fn register_instance<I: ?Sized + Send + Sync + 'static>(&self, value: Arc<I>) -> DiResult<&Self> {
        self.register(Binding::instance(value))
    }

    pub fn register_named_instance<I: ?Sized + Send + Sync + 'static>(
        &self,
        name: impl Into<Cow<'static, str>>,
        value: Arc<I>,
    ) -> DiResult<&Self> {
        self.register(Binding::instance(value).named(name))
    }

    pub fn register_value<T: Send + Sync + 'static>(&self, value: T) -> DiResult<&Self> {
        self.register(Binding::instance(Arc::new(value)))
    }

    pub fn register_type<I, C>(&self) -> DiResult<&Self>
    where
        I: ?Sized + Send + Sync + 'static,
        C: Resolvable + Upcast<I>,
    {
        self.register(Binding::<I>::to::<C>())
    }

    pub fn register_singleton_type<I, C>(&self) -> DiResult<&Self>
    where
        I: ?Sized + Send + Sync + 'static,
        C: Resolvable + Upcast<I>,
    {
        self.register(Binding::<I>::to::<C>().singleton())
    }

    pub fn register_named_type<I, C>(&self, name: impl Into<Cow<'static, str>>) -> DiResult<&Self>
    where
        I: ?Sized + Send + Sync + 'static,
        C: Resolvable + Upcast<I>,
    {
        self.register(Binding::<I>::to::<C>().named(name))
    }

    pub fn register_factory<I, F>(&self, factory: F) -> DiResult<&Self>
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> DiResult<Arc<I>> + Send + Sync + 'static,
    {
        self.register(Binding::factory(factory))
    }

    pub fn register_singleton_factory<I, F>(&self, factory: F) -> DiResult<&Self>
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> DiResult<Arc<I>> + Send + Sync + 'static,
    {
        self.register(Binding::factory(factory).singleton())
    }

    fn insert(&self, key: Key, registration: Registration) -> DiResult<&Self> {
        self.ensure_active()?;
        debug!(
            container = %self,
            key = %key,
            kind = ?registration.kind(),
            lifetime = ?registration.lifetime,
            "registration added"
        );
        self.inner.registry.write().insert(key, Arc::new(registration));
        Ok(self)
    }

    /// Snapshot of the local registrations, including closed generics
    /// materialized so far.
    pub fn registrations(&self) -> DiResult<Vec<RegistrationInfo>> {
        self.ensure_active()?;
        Ok(self
            .inner
            .registry
            .read()
            .iter()
            .map(|(key, registration)| RegistrationInfo::new(key, registration))
            .collect())
    }

    /// Disposes every value this container constructed, most recent first,
    /// then drops all registrations. Later calls do nothing; every other
    /// operation fails with [`DiError::Disposed`].
    ///
    /// Children are not disposed with their parent.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut bag = std::mem::take(&mut *self.inner.disposables.lock());
        let count = bag.len();
        bag.run_all_reverse();
        self.inner.registry.write().clear();
        debug!(container = %self, disposed = count, "container disposed");
    }

    pub(crate) fn ensure_active(&self) -> DiResult<()> {
        if self.is_disposed() {
            return Err(DiError::Disposed {
                container: self.trace_name(),
            });
        }
        Ok(())
    }

    pub(crate) fn trace_name(&self) -> String {
        self.to_string()
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.inner.options.max_depth
    }

    /// Core lookup: local registration, then local open template, then the
    /// parent chain, then auto-wiring when `self` is the origin.
    ///
    /// `origin` is the container the top-level request was made on; whatever
    /// registration answers, it produces against `origin`.
    pub(crate) fn try_get(
        &self,
        ty: &TypeDescriptor,
        name: Option<&str>,
        overrides: &[ParameterOverride],
        origin: &Container,
        parent_ctx: Option<&ResolutionContext<'_>>,
        mut tracer: Option<&mut ResolutionTracer>,
    ) -> DiResult<Option<AnyArc>> {
        self.ensure_active()?;
        let ctx = match parent_ctx {
            Some(parent) => parent.child(ty.clone()),
            None => ResolutionContext::root(ty.clone()),
        };
        let key = Key::for_type(ty, name);
        step!(tracer, "Resolving type {}...", key);

        let local = self.inner.registry.read().get(&key);
        if let Some(registration) = local {
            step!(tracer, "Using local registration...");
            return origin.produce(&registration, &key, &ctx, overrides, tracer);
        }

        if let Some(registration) = self.close_template(ty, name, &key)? {
            step!(tracer, "Using open generic registration...");
            return origin.produce(&registration, &key, &ctx, overrides, tracer);
        }

        if let Some(parent) = &self.inner.parent {
            let mut nested = tracer.as_deref().map(|t| t.child(parent.trace_name()));
            let found = parent.try_get(ty, name, overrides, origin, parent_ctx, nested.as_mut());
            if let (Some(t), Some(nested)) = (tracer.as_deref_mut(), nested) {
                t.nest(nested);
            }
            if let Some(value) = found? {
                step!(tracer, "Parent resolved.");
                return Ok(Some(value));
            }
        }

        if self.same(origin) {
            step!(tracer, "Creating...");
            return self.create(ty, &ctx, overrides, tracer);
        }

        step!(tracer, "Unable to resolve...");
        Ok(None)
    }

    /// Closes a local open template for `ty`, memoizing the closed
    /// registration under `key`. Two racing closers agree on one registration.
    fn close_template(
        &self,
        ty: &TypeDescriptor,
        name: Option<&str>,
        key: &Key,
    ) -> DiResult<Option<Arc<Registration>>> {
        let Some(template) = ty.template() else {
            return Ok(None);
        };
        let template_key = Key::for_template(template, name);
        if !self.inner.registry.read().contains_key(&template_key) {
            return Ok(None);
        }
        let Some(arguments) = ty.generic_arguments() else {
            return Ok(None);
        };

        let mut registry = self.inner.registry.write();
        if let Some(existing) = registry.get(key) {
            return Ok(Some(existing));
        }
        let Some(open) = registry.get(&template_key) else {
            return Ok(None);
        };
        let closed = Arc::new(open.close(arguments)?);
        registry.insert(key.clone(), closed.clone());
        debug!(container = %self, key = %key, template = template.name(), "open generic closed");
        Ok(Some(closed))
    }

    /// Produces a value from `registration` on behalf of this container.
    fn produce(
        &self,
        registration: &Registration,
        key: &Key,
        ctx: &ResolutionContext<'_>,
        overrides: &[ParameterOverride],
        mut tracer: Option<&mut ResolutionTracer>,
    ) -> DiResult<Option<AnyArc>> {
        match &registration.recipe {
            Recipe::Instance(value) => {
                step!(tracer, "Resolved to registered instance.");
                Ok(Some(value.clone()))
            }
            Recipe::Current => Ok(Some(erase_value(self.clone()))),
            Recipe::OpenGeneric(_) => Ok(None),
            Recipe::Type { concrete, cast } => {
                if let Some(value) = registration.cached() {
                    step!(tracer, "Resolved to cached singleton.");
                    return Ok(Some(value));
                }
                step!(tracer, "Mapped to {}", concrete);
                let ctx = ctx.with_resolved(concrete.clone());
                let Some(produced) = self.construct(concrete, &ctx, overrides, tracer)? else {
                    return Ok(None);
                };
                let value = cast(produced.value).ok_or(DiError::TypeMismatch(key.display_name()))?;
                Ok(Some(self.keep(registration, value, produced.disposer)))
            }
            Recipe::Factory(factory) => {
                if let Some(value) = registration.cached() {
                    step!(tracer, "Resolved to cached singleton.");
                    return Ok(Some(value));
                }
                let frame = Frame::Registration(registration as *const Registration as usize);
                let _guard = StackGuard::enter(frame, key.display_name(), self.max_depth())?;
                step!(tracer, "Invoking factory...");
                let value = factory.call(self, ctx)?;
                Ok(Some(self.keep(registration, value, None)))
            }
        }
    }

    /// Applies the registration's lifetime to a fresh value. Only the value
    /// that ends up cached (or handed out, for transients) is tracked.
    fn keep(
        &self,
        registration: &Registration,
        value: AnyArc,
        disposer: Option<Arc<dyn Dispose>>,
    ) -> AnyArc {
        if !registration.lifetime.is_singleton() {
            self.track(disposer);
            return value;
        }
        let (stored, won) = registration.settle(value);
        if won {
            self.track(disposer);
        }
        stored
    }

    /// Hands `disposer` to the bag, or runs it at once when this container
    /// was disposed while the value was being built.
    pub(crate) fn track(&self, disposer: Option<Arc<dyn Dispose>>) {
        let Some(disposer) = disposer else {
            return;
        };
        let mut bag = self.inner.disposables.lock();
        // `dispose` raises the flag before it takes the bag
        if self.is_disposed() {
            drop(bag);
            disposer.dispose();
            return;
        }
        bag.push(disposer);
    }

    fn start_trace(&self) -> Option<ResolutionTracer> {
        let enabled = self.inner.sink.is_some()
            || self.inner.options.trace
            || tracing::enabled!(tracing::Level::TRACE);
        enabled.then(|| ResolutionTracer::new(self.trace_name()))
    }

    fn emit_trace(&self, tracer: &ResolutionTracer) {
        let rendered = tracer.to_string();
        trace!(container = %self, "resolution trace:{}", rendered);
        if let Some(sink) = &self.inner.sink {
            sink(&rendered);
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverCore for Container {
    fn resolve_erased(
        &self,
        ty: &TypeDescriptor,
        name: Option<&str>,
        overrides: &[ParameterOverride],
    ) -> DiResult<Option<AnyArc>> {
        if let Some(name) = name {
            validate_name(name)?;
        }
        let mut tracer = self.start_trace();
        let result = self.try_get(ty, name, overrides, self, None, tracer.as_mut());
        if let Some(mut tracer) = tracer {
            match &result {
                Ok(Some(_)) => {}
                Ok(None) => tracer.add(format!("Cannot resolve {ty}")),
                Err(e) => tracer.add(format!("Failed: {e}")),
            }
            self.emit_trace(&tracer);
        }
        result
    }

    fn construct_erased(
        &self,
        ty: &TypeDescriptor,
        overrides: &[ParameterOverride],
    ) -> DiResult<Option<AnyArc>> {
        self.ensure_active()?;
        let mut tracer = self.start_trace();
        let ctx = ResolutionContext::root(ty.clone());
        let result = self.create(ty, &ctx, overrides, tracer.as_mut());
        if let Some(tracer) = tracer {
            self.emit_trace(&tracer);
        }
        result
    }

    fn has_registration(&self, ty: &TypeDescriptor, name: Option<&str>, locally: bool) -> DiResult<bool> {
        if let Some(name) = name {
            validate_name(name)?;
        }
        self.ensure_active()?;
        {
            let registry = self.inner.registry.read();
            if registry.contains_key(&Key::for_type(ty, name)) {
                return Ok(true);
            }
            if let Some(template) = ty.template() {
                if registry.contains_key(&Key::for_template(template, name)) {
                    return Ok(true);
                }
            }
        }
        match (&self.inner.parent, locally) {
            (Some(parent), false) => parent.has_registration(ty, name, false),
            _ => Ok(false),
        }
    }
}

impl Resolvable for Container {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::container()
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.name {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.inner.id),
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("registrations", &self.inner.registry.read().len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Non-owning handle to a [`Container`].
#[derive(Clone)]
pub struct WeakContainer {
    inner: Weak<ContainerInner>,
    label: Arc<str>,
}

impl WeakContainer {
    /// The container, or [`DiError::Disposed`] once it is gone.
    pub fn upgrade(&self) -> DiResult<Container> {
        let inner = self.inner.upgrade().ok_or_else(|| DiError::Disposed {
            container: self.label.to_string(),
        })?;
        Ok(Container { inner })
    }
}

impl fmt::Debug for WeakContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WeakContainer").field(&self.label).finish()
    }
}
