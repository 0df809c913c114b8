//! Error types for the dependency resolution engine.

use thiserror::Error;

/// Boxed cause carried by construction failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Resolution errors
///
/// Represents the conditions that can surface from registration, resolution or
/// disposal. "Not found" is not an error inside the engine: the `try_*` family
/// reports it as `Ok(None)` and only the strict calls turn it into
/// [`DiError::ResolutionFailed`].
///
/// # Examples
///
/// ```rust
/// use arbor_di::{Container, DiError, Resolver};
///
/// let container = Container::new();
/// match container.resolve::<String>() {
///     Err(DiError::ResolutionFailed { type_name, name }) => {
///         assert_eq!(type_name, "alloc::string::String");
///         assert_eq!(name, None);
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Error)]
pub enum DiError {
    /// Nothing local, no ancestor and no auto-wiring produced a value
    #[error("Cannot resolve {type_name} with name {}", .name.as_deref().unwrap_or("<none>"))]
    ResolutionFailed {
        type_name: &'static str,
        name: Option<String>,
    },
    /// The selected constructor returned an error
    #[error("Construction of {type_name} failed: {source}")]
    ConstructionFailed {
        type_name: &'static str,
        #[source]
        source: BoxError,
    },
    /// The container was disposed before the call
    #[error("Container {container} has been disposed")]
    Disposed { container: String },
    /// A required identifier was missing or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A stored value did not downcast to the requested type
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Maximum recursion depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
}

impl DiError {
    /// Wraps an arbitrary error as a construction failure of `T`.
    pub fn construction<T: ?Sized>(source: impl Into<BoxError>) -> Self {
        DiError::ConstructionFailed {
            type_name: std::any::type_name::<T>(),
            source: source.into(),
        }
    }

    /// True for the recoverable "nothing found" outcome of strict calls.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiError::ResolutionFailed { .. })
    }
}

/// Failure to read a constructor argument.
///
/// Constructors receive their arguments through [`Arguments`](crate::Arguments);
/// reading an unresolved slot or one holding another type yields this error,
/// which the engine wraps into [`DiError::ConstructionFailed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("argument {index} ({name}) could not be resolved")]
    Missing { index: usize, name: &'static str },
    #[error("argument {index} ({name}) is not a {expected}")]
    TypeMismatch {
        index: usize,
        name: &'static str,
        expected: &'static str,
    },
    #[error("constructor has no argument {0}")]
    OutOfRange(usize),
}

/// Result type for resolution operations
pub type DiResult<T> = Result<T, DiError>;
