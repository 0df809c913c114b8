//! Disposal trait for resource cleanup.

/// Structured teardown for values a container constructs.
///
/// When auto-wiring produces a value through
/// [`Constructor::disposable`](crate::Constructor::disposable), the
/// constructing container keeps a hook and calls [`dispose`](Dispose::dispose)
/// exactly once when it is disposed, most recent first. Registered instances
/// and factory results are never disposed by the container.
///
/// # Examples
///
/// ```
/// use arbor_di::{Constructor, Container, Dispose, Resolvable, Resolver};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// static CLOSED: AtomicBool = AtomicBool::new(false);
///
/// struct Connection;
///
/// impl Dispose for Connection {
///     fn dispose(&self) {
///         CLOSED.store(true, Ordering::SeqCst);
///     }
/// }
///
/// impl Resolvable for Connection {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::disposable([], |_| Ok(Connection))]
///     }
/// }
///
/// let container = Container::new();
/// let _connection = container.resolve::<Connection>().unwrap();
/// container.dispose();
/// assert!(CLOSED.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Releases whatever the value holds. Called at most once per tracked value.
    fn dispose(&self);
}
