//! Registration keys.

use std::any::TypeId;
use std::sync::Arc;

use crate::descriptor::{TemplateId, TypeDescriptor};

/// Key for registration storage and lookup.
///
/// A key is a requested type plus an optional disambiguating name. Closed
/// generic requests also derive a template key, which is how an open generic
/// registration is found.
///
/// # Examples
///
/// ```rust
/// use arbor_di::Key;
/// use std::any::TypeId;
///
/// let plain = Key::Type(TypeId::of::<u32>(), "u32");
/// let named = Key::TypeNamed(TypeId::of::<u32>(), "u32", "port".into());
///
/// assert_eq!(plain.display_name(), "u32");
/// assert_eq!(named.service_name(), Some("port"));
/// assert_ne!(plain, named);
/// ```
#[derive(Debug, Clone)]
pub enum Key {
    /// Concrete type or trait object, with type name for diagnostics
    Type(TypeId, &'static str),
    /// Named variant of [`Key::Type`]
    TypeNamed(TypeId, &'static str, Arc<str>),
    /// Open generic template identity
    Template(TypeId, &'static str),
    /// Named variant of [`Key::Template`]
    TemplateNamed(TypeId, &'static str, Arc<str>),
}

impl Key {
    /// Builds the key for a type descriptor and optional name.
    pub fn for_type(ty: &TypeDescriptor, name: Option<&str>) -> Self {
        match name {
            None => Key::Type(ty.type_id(), ty.type_name()),
            Some(name) => Key::TypeNamed(ty.type_id(), ty.type_name(), Arc::from(name)),
        }
    }

    /// Builds the key for an open generic template and optional name.
    pub fn for_template(template: TemplateId, name: Option<&str>) -> Self {
        match name {
            None => Key::Template(template.type_id(), template.name()),
            Some(name) => {
                Key::TemplateNamed(template.type_id(), template.name(), Arc::from(name))
            }
        }
    }

    /// Get the type or template name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name)
            | Key::TypeNamed(_, name, _)
            | Key::Template(_, name)
            | Key::TemplateNamed(_, name, _) => name,
        }
    }

    /// Get the registration name, or None for unnamed keys
    pub fn service_name(&self) -> Option<&str> {
        match self {
            Key::Type(_, _) | Key::Template(_, _) => None,
            Key::TypeNamed(_, _, name) | Key::TemplateNamed(_, _, name) => Some(name),
        }
    }

    /// True for template keys.
    pub fn is_template(&self) -> bool {
        matches!(self, Key::Template(..) | Key::TemplateNamed(..))
    }
}

// Equality ignores the display string; TypeId already identifies the type.
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::TypeNamed(a, _, name_a), Key::TypeNamed(b, _, name_b)) => {
                a == b && name_a == name_b
            }
            (Key::Template(a, _), Key::Template(b, _)) => a == b,
            (Key::TemplateNamed(a, _, name_a), Key::TemplateNamed(b, _, name_b)) => {
                a == b && name_a == name_b
            }
            _ => false,
        }
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Key::TypeNamed(id, _, name) => {
                1u8.hash(state);
                id.hash(state);
                name.hash(state);
            }
            Key::Template(id, _) => {
                2u8.hash(state);
                id.hash(state);
            }
            Key::TemplateNamed(id, _, name) => {
                3u8.hash(state);
                id.hash(state);
                name.hash(state);
            }
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.service_name() {
            Some(name) => write!(f, "{}[{}]", self.display_name(), name),
            None => f.write_str(self.display_name()),
        }
    }
}

#[inline(always)]
pub fn key_of_type<T: ?Sized + 'static>() -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}
