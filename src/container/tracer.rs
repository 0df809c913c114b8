//! Human-readable trace of a single resolution.

use std::fmt;

enum Entry {
    Line(String),
    Nested(ResolutionTracer),
}

/// Collects the steps of one top-level resolution.
///
/// Lines are indented two spaces per level and prefixed with the name of the
/// container that took the step. Delegation to a parent container nests a
/// child tracer at the point where it happened.
pub(crate) struct ResolutionTracer {
    indent: usize,
    prefix: String,
    entries: Vec<Entry>,
}

impl ResolutionTracer {
    pub(crate) fn new(prefix: impl Into<String>) -> Self {
        Self {
            indent: 1,
            prefix: prefix.into(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, line: impl Into<String>) {
        self.entries.push(Entry::Line(line.into()));
    }

    /// A tracer one level deeper, to be attached back with [`nest`](Self::nest).
    pub(crate) fn child(&self, prefix: impl Into<String>) -> Self {
        Self {
            indent: self.indent + 1,
            prefix: prefix.into(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn nest(&mut self, child: ResolutionTracer) {
        self.entries.push(Entry::Nested(child));
    }
}

impl fmt::Display for ResolutionTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            match entry {
                Entry::Line(line) => write!(
                    f,
                    "\n{:width$}{} : {}",
                    "",
                    self.prefix,
                    line,
                    width = self.indent * 2
                )?,
                Entry::Nested(child) => write!(f, "{child}")?,
            }
        }
        Ok(())
    }
}
