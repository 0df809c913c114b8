//! Constructors and their arguments.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::descriptor::{ClosedGeneric, OpenGeneric, Resolvable, TypeDescriptor};
use crate::error::{ArgumentError, BoxError};
use crate::registration::{erase, unerase, AnyArc};
use crate::traits::Dispose;

/// A named, typed constructor parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: &'static str,
    ty: TypeDescriptor,
}

impl Parameter {
    /// Parameter of a [`Resolvable`] type.
    pub fn of<T: Resolvable + ?Sized>(name: &'static str) -> Self {
        Self {
            name,
            ty: T::descriptor(),
        }
    }

    /// Parameter of a closed generic member, e.g. `SpeakerOf<Cat>`.
    pub fn generic<C: ClosedGeneric>(name: &'static str) -> Self {
        Self {
            name,
            ty: TypeDescriptor::closed::<C>(),
        }
    }

    /// Parameter with an explicit descriptor, for constructors built at runtime.
    pub fn typed(name: &'static str, ty: TypeDescriptor) -> Self {
        Self { name, ty }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declared_type(&self) -> &TypeDescriptor {
        &self.ty
    }
}

/// Value produced by a constructor, with its disposal hook if it has one.
pub(crate) struct Produced {
    pub(crate) value: AnyArc,
    pub(crate) disposer: Option<Arc<dyn Dispose>>,
}

type Invoke = Arc<dyn Fn(&Arguments<'_>) -> Result<Produced, BoxError> + Send + Sync>;

/// A public constructor of an auto-wirable type.
///
/// The body receives one slot per parameter, in declaration order. A slot is
/// empty when nothing could supply the parameter; reading it as required then
/// fails, reading it through [`Arguments::optional`] yields `None`.
#[derive(Clone)]
pub struct Constructor {
    parameters: Arc<[Parameter]>,
    preferred: bool,
    invoke: Invoke,
}

impl Constructor {
    /// Constructor producing a `T`.
    pub fn new<T, F>(parameters: impl IntoIterator<Item = Parameter>, body: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Arguments<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            parameters: parameters.into_iter().collect(),
            preferred: false,
            invoke: Arc::new(move |args: &Arguments<'_>| {
                let value = body(args)?;
                Ok(Produced {
                    value: erase(Arc::new(value)),
                    disposer: None,
                })
            }),
        }
    }

    /// Constructor producing a `T` that the constructing container disposes.
    pub fn disposable<T, F>(parameters: impl IntoIterator<Item = Parameter>, body: F) -> Self
    where
        T: Dispose,
        F: Fn(&Arguments<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            parameters: parameters.into_iter().collect(),
            preferred: false,
            invoke: Arc::new(move |args: &Arguments<'_>| {
                let value = Arc::new(body(args)?);
                Ok(Produced {
                    value: erase(value.clone()),
                    disposer: Some(value as Arc<dyn Dispose>),
                })
            }),
        }
    }

    /// Marks this constructor as the one auto-wiring must use.
    pub fn preferred(mut self) -> Self {
        self.preferred = true;
        self
    }

    pub fn is_preferred(&self) -> bool {
        self.preferred
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub(crate) fn invoke(&self, args: &Arguments<'_>) -> Result<Produced, BoxError> {
        (self.invoke)(args)
    }
}

impl std::fmt::Debug for Constructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Constructor")
            .field("parameters", &self.parameters)
            .field("preferred", &self.preferred)
            .finish()
    }
}

/// Picks the constructor auto-wiring uses.
///
/// A lone constructor always wins; otherwise the first preferred one, otherwise
/// the first with the fewest parameters.
pub(crate) fn select(constructors: &[Constructor]) -> Option<&Constructor> {
    match constructors {
        [] => None,
        [only] => Some(only),
        _ => constructors
            .iter()
            .find(|c| c.preferred)
            .or_else(|| constructors.iter().min_by_key(|c| c.parameters.len())),
    }
}

/// Resolved argument slots handed to a constructor body.
pub struct Arguments<'a> {
    parameters: &'a [Parameter],
    values: SmallVec<[Option<AnyArc>; 4]>,
}

impl<'a> Arguments<'a> {
    pub(crate) fn new(parameters: &'a [Parameter], values: SmallVec<[Option<AnyArc>; 4]>) -> Self {
        Self { parameters, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Shared handle to a required argument.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>, ArgumentError> {
        self.optional(index)?.ok_or(ArgumentError::Missing {
            index,
            name: self.name(index),
        })
    }

    /// Owned copy of a required argument.
    pub fn cloned<T: Clone + Send + Sync + 'static>(&self, index: usize) -> Result<T, ArgumentError> {
        self.get::<T>(index).map(|value| (*value).clone())
    }

    /// Argument that may legitimately be unresolved.
    pub fn optional<T: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> Result<Option<Arc<T>>, ArgumentError> {
        match self.values.get(index) {
            None => Err(ArgumentError::OutOfRange(index)),
            Some(None) => Ok(None),
            Some(Some(any)) => unerase::<T>(any).map(Some).ok_or(ArgumentError::TypeMismatch {
                index,
                name: self.name(index),
                expected: std::any::type_name::<T>(),
            }),
        }
    }

    /// Required argument declared with [`Parameter::generic`].
    pub fn generic<C: ClosedGeneric>(
        &self,
        index: usize,
    ) -> Result<Arc<<C::Template as OpenGeneric>::Output>, ArgumentError> {
        self.get::<<C::Template as OpenGeneric>::Output>(index)
    }

    /// The raw slot, for constructors that forward values untyped.
    pub fn erased(&self, index: usize) -> Option<&AnyArc> {
        self.values.get(index).and_then(Option::as_ref)
    }

    fn name(&self, index: usize) -> &'static str {
        self.parameters.get(index).map_or("?", Parameter::name)
    }
}
