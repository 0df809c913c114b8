//! Internal disposal bag for tracked values.

use std::sync::Arc;

use crate::traits::Dispose;

/// Disposal hooks with LIFO execution order.
///
/// A value is tracked at most once, however many times it is pushed.
#[derive(Default)]
pub(crate) struct DisposeBag {
    items: Vec<Arc<dyn Dispose>>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, item: Arc<dyn Dispose>) {
        let addr = Arc::as_ptr(&item) as *const ();
        if !self.items.iter().any(|i| Arc::as_ptr(i) as *const () == addr) {
            self.items.push(item);
        }
    }

    /// Dispose every tracked value, most recent first.
    pub(crate) fn run_all_reverse(&mut self) {
        while let Some(item) = self.items.pop() {
            item.dispose();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
