//! Circular dependency detection infrastructure.

use std::any::TypeId;
use std::cell::RefCell;

use crate::error::{DiError, DiResult};

/// Default bound on nested productions per thread.
pub(crate) const MAX_DEPTH: usize = 1024;

/// What is being produced, compared by identity.
///
/// A type is only a cycle with itself when its constructors are the static
/// ones; runtime-bound constructor lists and registrations are compared by
/// address, so a child's factory may ask its parent's factory for the same
/// key, and closed members sharing one concrete type stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Frame {
    /// Auto-wiring through a type's declared constructors
    Type(TypeId),
    /// Auto-wiring through constructors bound at runtime
    Bound(usize),
    /// Invoking one registration's factory
    Registration(usize),
}

// Thread-local stack of frames currently being produced
thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<(Frame, &'static str)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a frame as in production on this thread until dropped.
///
/// Entering a frame that is already on the stack fails with the cycle path,
/// e.g. `["A", "B", "A"]`. Entering past `max_depth` fails with
/// [`DiError::DepthExceeded`].
pub(crate) struct StackGuard {
    _private: (),
}

impl StackGuard {
    pub(crate) fn enter(frame: Frame, name: &'static str, max_depth: usize) -> DiResult<Self> {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            // Circular detection BEFORE pushing the new frame
            if let Some(start) = stack.iter().position(|(f, _)| *f == frame) {
                let mut path: Vec<_> = stack[start..].iter().map(|(_, n)| *n).collect();
                path.push(name);
                return Err(DiError::Circular(path));
            }

            if stack.len() >= max_depth {
                return Err(DiError::DepthExceeded(stack.len()));
            }

            stack.push((frame, name));
            Ok(Self { _private: () })
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

#[cfg(test)]
pub(crate) fn depth() -> usize {
    RESOLUTION_STACK.with(|stack| stack.borrow().len())
}
