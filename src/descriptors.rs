//! Registration descriptors for introspection and diagnostics.

use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{Registration, RegistrationKind};

/// Snapshot of one local registration.
///
/// # Examples
///
/// ```rust
/// use arbor_di::{Binding, Container, Lifetime, RegistrationKind};
/// use std::sync::Arc;
///
/// let container = Container::new();
/// container.register(Binding::<u32>::instance(Arc::new(8080)).named("port")).unwrap();
///
/// let port = container
///     .registrations()
///     .unwrap()
///     .into_iter()
///     .find(|info| info.service_name() == Some("port"))
///     .unwrap();
/// assert_eq!(port.kind, RegistrationKind::Instance);
/// assert_eq!(port.lifetime, Lifetime::Singleton);
/// assert_eq!(port.type_name(), "u32");
/// assert!(port.materialized);
/// ```
#[derive(Debug, Clone)]
pub struct RegistrationInfo {
    /// Storage key: requested type or template, plus optional name
    pub key: Key,
    pub kind: RegistrationKind,
    pub lifetime: Lifetime,
    /// True once a value exists: instances always, singletons after first use
    pub materialized: bool,
    /// Concrete type of a type mapping
    pub concrete_type: Option<&'static str>,
}

impl RegistrationInfo {
    pub(crate) fn new(key: &Key, registration: &Registration) -> Self {
        Self {
            key: key.clone(),
            kind: registration.kind(),
            lifetime: registration.lifetime,
            materialized: registration.is_materialized(),
            concrete_type: registration.concrete_type(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    pub fn service_name(&self) -> Option<&str> {
        self.key.service_name()
    }

    pub fn is_named(&self) -> bool {
        self.key.service_name().is_some()
    }

    pub fn is_open_generic(&self) -> bool {
        self.key.is_template()
    }
}
