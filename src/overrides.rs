//! Per-call constructor parameter overrides.
//!
//! Overrides apply only to the constructor auto-wired for the type requested
//! by the call that carries them. They never reach registered instances or
//! factories, and nested dependencies resolve without them.

use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::constructor::Parameter;
use crate::container::Container;
use crate::error::DiResult;
use crate::registration::{erase, AnyArc};

type Producer = Arc<dyn Fn(&Container) -> DiResult<AnyArc> + Send + Sync>;

/// A value to substitute for a constructor parameter.
#[derive(Clone)]
pub enum OverrideValue {
    /// Fixed value
    Value(AnyArc),
    /// Produced on demand against the constructing container
    Producer(Producer),
}

impl OverrideValue {
    fn produce(&self, container: &Container) -> DiResult<AnyArc> {
        match self {
            OverrideValue::Value(value) => Ok(value.clone()),
            OverrideValue::Producer(produce) => produce(container),
        }
    }
}

/// A record of named fields, matched against parameter names.
///
/// Implement it for a struct to pass several values at once, or build one
/// ad hoc with [`Fields`] and the [`fields!`](crate::fields) macro.
pub trait ObjectShape: Send + Sync {
    /// Value of the field called `name`, if the shape has one.
    fn field(&self, name: &str) -> Option<AnyArc>;

    fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// Ad hoc [`ObjectShape`] built field by field.
///
/// ```rust
/// use arbor_di::{fields, ObjectShape};
///
/// let shape = fields! { word: String::from("Hello"), times: 2u32 };
/// assert!(shape.has_field("word"));
/// assert!(!shape.has_field("volume"));
/// ```
#[derive(Clone, Default)]
pub struct Fields {
    entries: Vec<(Cow<'static, str>, AnyArc)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Send + Sync + 'static>(mut self, name: impl Into<Cow<'static, str>>, value: T) -> Self {
        self.entries.push((name.into(), erase(Arc::new(value))));
        self
    }
}

impl ObjectShape for Fields {
    fn field(&self, name: &str) -> Option<AnyArc> {
        self.entries
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.clone())
    }
}

impl fmt::Debug for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter().map(|(name, _)| name)).finish()
    }
}

/// Builds a [`Fields`] shape from `name: value` pairs.
#[macro_export]
macro_rules! fields {
    ($($name:ident : $value:expr),* $(,)?) => {
        $crate::Fields::new()$(.with(stringify!($name), $value))*
    };
}

/// Substitutes a value for matching constructor parameters.
///
/// The first override in a call's list that matches a parameter supplies it.
/// If that override yields nothing, normal resolution of the parameter's
/// declared type takes over.
#[derive(Clone)]
pub enum ParameterOverride {
    /// Matches parameters whose declared type is exactly `ty`
    ByType {
        ty: TypeId,
        type_name: &'static str,
        value: OverrideValue,
    },
    /// Matches parameters by name
    ByName {
        name: Cow<'static, str>,
        value: OverrideValue,
    },
    /// Matches parameters named like one of the shape's fields
    ByShape(Arc<dyn ObjectShape>),
}

impl ParameterOverride {
    /// Fixed value for parameters of type `T`.
    pub fn by_type<T: Send + Sync + 'static>(value: T) -> Self {
        Self::by_type_shared(Arc::new(value))
    }

    /// Shared value for parameters of type `T`, which may be a trait object.
    pub fn by_type_shared<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        ParameterOverride::ByType {
            ty: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            value: OverrideValue::Value(erase(value)),
        }
    }

    /// Value for parameters of type `T`, produced per construction.
    pub fn by_type_with<T, F>(produce: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        ParameterOverride::ByType {
            ty: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            value: OverrideValue::Producer(Arc::new(move |c: &Container| produce(c).map(erase))),
        }
    }

    /// Fixed value for the parameter called `name`.
    pub fn by_name<T: Send + Sync + 'static>(name: impl Into<Cow<'static, str>>, value: T) -> Self {
        ParameterOverride::ByName {
            name: name.into(),
            value: OverrideValue::Value(erase(Arc::new(value))),
        }
    }

    /// Value for the parameter called `name`, produced per construction.
    pub fn by_name_with<T, F>(name: impl Into<Cow<'static, str>>, produce: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        ParameterOverride::ByName {
            name: name.into(),
            value: OverrideValue::Producer(Arc::new(move |c: &Container| produce(c).map(erase))),
        }
    }

    /// Every field of `shape` overrides the parameter of the same name.
    pub fn by_shape(shape: impl ObjectShape + 'static) -> Self {
        ParameterOverride::ByShape(Arc::new(shape))
    }

    /// True when this override can supply `parameter`.
    pub fn matches(&self, parameter: &Parameter) -> bool {
        match self {
            ParameterOverride::ByType { ty, .. } => *ty == parameter.declared_type().type_id(),
            ParameterOverride::ByName { name, .. } => name == parameter.name(),
            ParameterOverride::ByShape(shape) => shape.has_field(parameter.name()),
        }
    }

    pub(crate) fn value_for(&self, parameter: &Parameter, container: &Container) -> DiResult<Option<AnyArc>> {
        match self {
            ParameterOverride::ByType { value, .. } | ParameterOverride::ByName { value, .. } => {
                value.produce(container).map(Some)
            }
            ParameterOverride::ByShape(shape) => Ok(shape.field(parameter.name())),
        }
    }
}

impl fmt::Debug for ParameterOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterOverride::ByType { type_name, .. } => write!(f, "ByType({type_name})"),
            ParameterOverride::ByName { name, .. } => write!(f, "ByName({name})"),
            ParameterOverride::ByShape(_) => f.write_str("ByShape"),
        }
    }
}
