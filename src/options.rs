//! Container configuration.

use std::sync::Arc;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::container::Container;
use crate::internal::MAX_DEPTH;

/// Receives rendered resolution traces.
pub type TraceSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Settings of a root container, inherited by its children.
///
/// With the `config` feature the options deserialize from any serde format;
/// missing fields take their defaults.
///
/// ```rust
/// use arbor_di::ContainerOptions;
///
/// let options = ContainerOptions::default();
/// assert_eq!(options.name, None);
/// assert_eq!(options.max_depth, 1024);
/// assert!(!options.trace);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerOptions {
    /// Trace name of the root container
    pub name: Option<String>,
    /// Bound on nested productions in one resolution
    pub max_depth: usize,
    /// Render a trace for every top-level resolution
    pub trace: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            name: None,
            max_depth: MAX_DEPTH,
            trace: false,
        }
    }
}

/// Builds a root [`Container`].
///
/// ```rust
/// use arbor_di::ContainerBuilder;
/// use std::sync::{Arc, Mutex};
///
/// let lines = Arc::new(Mutex::new(Vec::new()));
/// let sink = lines.clone();
/// let container = ContainerBuilder::new()
///     .name("app")
///     .trace_sink(move |trace| sink.lock().unwrap().push(trace.to_string()))
///     .build();
///
/// assert_eq!(container.name(), Some("app"));
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
    options: ContainerOptions,
    sink: Option<TraceSink>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.options.name = Some(name.into());
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    /// Renders traces even without a sink; they go to `tracing` at TRACE level.
    pub fn trace(mut self, enabled: bool) -> Self {
        self.options.trace = enabled;
        self
    }

    /// Sends every rendered trace to `sink`. Implies tracing.
    pub fn trace_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.sink = Some(Arc::new(sink));
        self
    }

    pub fn build(self) -> Container {
        Container::from_parts(self.options, self.sink, None)
    }
}
