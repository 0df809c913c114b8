//! Resolution context handed to contextual factories.

use crate::descriptor::TypeDescriptor;

/// One step of an in-flight resolution.
///
/// Each nested dependency request gets a child context whose parent is the
/// context of the type that needed it, so a factory can tell who asked for
/// its value.
///
/// # Examples
///
/// ```
/// use arbor_di::{Binding, Constructor, Container, Parameter, Resolvable, Resolver};
/// use std::sync::Arc;
///
/// struct Logger(String);
/// impl Resolvable for Logger {}
///
/// struct Orders(Arc<Logger>);
/// impl Resolvable for Orders {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::new([Parameter::of::<Logger>("log")], |args| {
///             Ok(Orders(args.get::<Logger>(0)?))
///         })]
///     }
/// }
///
/// let container = Container::new();
/// container
///     .register(Binding::<Logger>::contextual(|_, ctx| {
///         let owner = ctx
///             .parent()
///             .and_then(|p| p.resolved())
///             .map(|t| t.short_name())
///             .unwrap_or_default();
///         Ok(Arc::new(Logger(owner)))
///     }))
///     .unwrap();
///
/// let orders = container.resolve::<Orders>().unwrap();
/// assert_eq!(orders.0 .0, "Orders");
/// ```
#[derive(Debug, Clone)]
pub struct ResolutionContext<'a> {
    requested: TypeDescriptor,
    resolved: Option<TypeDescriptor>,
    parent: Option<&'a ResolutionContext<'a>>,
}

impl<'a> ResolutionContext<'a> {
    pub(crate) fn root(requested: TypeDescriptor) -> Self {
        Self {
            requested,
            resolved: None,
            parent: None,
        }
    }

    /// Context for a nested request made on behalf of `self`.
    pub(crate) fn child<'b>(&'b self, requested: TypeDescriptor) -> ResolutionContext<'b> {
        ResolutionContext {
            requested,
            resolved: None,
            parent: Some(self),
        }
    }

    /// Same step, with the concrete type being constructed filled in.
    pub(crate) fn with_resolved(&self, resolved: TypeDescriptor) -> ResolutionContext<'a> {
        ResolutionContext {
            requested: self.requested.clone(),
            resolved: Some(resolved),
            parent: self.parent,
        }
    }

    /// The type that was asked for at this step.
    pub fn requested(&self) -> &TypeDescriptor {
        &self.requested
    }

    /// The concrete type being constructed, once known.
    pub fn resolved(&self) -> Option<&TypeDescriptor> {
        self.resolved.as_ref()
    }

    /// The step that needed this one; `None` at the top of a resolution.
    pub fn parent(&self) -> Option<&'a ResolutionContext<'a>> {
        self.parent
    }

    /// Number of steps above this one.
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    pub fn ancestors(&self) -> impl Iterator<Item = &'a ResolutionContext<'a>> {
        std::iter::successors(self.parent, |ctx| ctx.parent)
    }

    /// Requested type names from the top of the resolution down to this step.
    pub fn path(&self) -> Vec<&'static str> {
        let mut path: Vec<_> = self.ancestors().map(|c| c.requested.type_name()).collect();
        path.reverse();
        path.push(self.requested.type_name());
        path
    }
}
