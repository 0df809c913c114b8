//! Registration lifetimes.

/// Controls whether a registration caches what it produces.
///
/// # Examples
///
/// ```rust
/// use arbor_di::{Binding, Container, Resolver};
/// use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
///
/// let counter = Arc::new(AtomicU32::new(0));
/// let container = Container::new();
///
/// let c = counter.clone();
/// container
///     .register(Binding::<u32>::factory(move |_| Ok(Arc::new(c.fetch_add(1, Ordering::SeqCst)))))
///     .unwrap();
/// let c = counter.clone();
/// container
///     .register(
///         Binding::<u32>::factory(move |_| Ok(Arc::new(c.fetch_add(1, Ordering::SeqCst) + 100)))
///             .named("cached")
///             .singleton(),
///     )
///     .unwrap();
///
/// // Transient: a fresh value on every request
/// assert_eq!(*container.resolve::<u32>().unwrap(), 0);
/// assert_eq!(*container.resolve::<u32>().unwrap(), 1);
///
/// // Singleton: produced once, then shared
/// let first = container.resolve_named::<u32>("cached").unwrap();
/// let second = container.resolve_named::<u32>("cached").unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// New value on every resolution
    #[default]
    Transient,
    /// First successfully produced value is cached on the registration and
    /// shared by every container that reaches it.
    Singleton,
}

impl Lifetime {
    pub fn is_singleton(self) -> bool {
        matches!(self, Lifetime::Singleton)
    }
}
