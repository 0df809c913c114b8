//! # arbor-di
//!
//! Hierarchical dependency resolution for Rust: a tree of containers with
//! parent fallback, constructor auto-wiring, open generic families,
//! per-call parameter overrides and scoped disposal.
//!
//! ## Features
//!
//! - **Container tree**: children see their ancestors' registrations, never the reverse
//! - **Auto-wiring**: unregistered types are built from their declared constructors
//! - **Open generics**: one template serves every member of a generic family
//! - **Overrides**: substitute constructor parameters per call, by type, name or shape
//! - **Deferred values and invokers**: resolve later, or resolve with arguments
//! - **Disposal**: each container disposes what it constructed, most recent first
//! - **Diagnostics**: optional indented resolution traces and `tracing` events
//!
//! ## Quick Start
//!
//! ```rust
//! use arbor_di::{implements, Constructor, Container, Parameter, Resolvable, Resolver};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//! impl Resolvable for dyn Greeter {}
//!
//! struct Polite {
//!     name: Arc<String>,
//! }
//!
//! impl Greeter for Polite {
//!     fn greet(&self) -> String {
//!         format!("Good day, {}", self.name)
//!     }
//! }
//!
//! impl Resolvable for Polite {
//!     fn constructors() -> Vec<Constructor> {
//!         vec![Constructor::new([Parameter::of::<String>("name")], |args| {
//!             Ok(Polite { name: args.get::<String>(0)? })
//!         })]
//!     }
//! }
//! implements!(Polite => dyn Greeter);
//!
//! let root = Container::new();
//! root.register_value(String::from("Ada")).unwrap();
//! root.register_type::<dyn Greeter, Polite>().unwrap();
//!
//! let request = root.create_child().unwrap();
//! assert_eq!(request.resolve::<dyn Greeter>().unwrap().greet(), "Good day, Ada");
//! request.dispose();
//! ```
//!
//! ## Resolution Order
//!
//! A request made on container `O` for a type and optional name is answered by
//! the first of:
//!
//! 1. a registration on the container being searched,
//! 2. an open generic template on that container, closed and memoised,
//! 3. the same search on the parent, still on behalf of `O`,
//! 4. auto-wiring on `O` itself.
//!
//! Whichever registration answers, it produces against `O`: factories receive
//! `O`, constructor parameters resolve from `O`, and disposable values are
//! tracked by `O`.
//!
//! ## Overrides
//!
//! ```rust
//! use arbor_di::{fields, Constructor, Container, Parameter, ParameterOverride, Resolvable, Resolver};
//!
//! struct Speech(String);
//! impl Resolvable for Speech {
//!     fn constructors() -> Vec<Constructor> {
//!         vec![Constructor::new(
//!             [Parameter::of::<String>("word"), Parameter::of::<u32>("times")],
//!             |args| {
//!                 let word = args.cloned::<String>(0)?;
//!                 let times = args.cloned::<u32>(1)? as usize;
//!                 Ok(Speech(vec![word; times].join(", ")))
//!             },
//!         )]
//!     }
//! }
//!
//! let container = Container::new();
//! let speech = container
//!     .resolve_with::<Speech>(&[ParameterOverride::by_shape(fields! {
//!         word: String::from("Hello"),
//!         times: 2u32,
//!     })])
//!     .unwrap();
//! assert_eq!(speech.0, "Hello, Hello");
//! ```

pub mod constructor;
pub mod container;
pub mod deferred;
pub mod descriptor;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod options;
pub mod overrides;
pub mod traits;

// Internal modules
mod internal;
mod registration;

pub use constructor::{Arguments, Constructor, Parameter};
pub use container::{Container, ContainerId, ResolutionContext, WeakContainer};
pub use deferred::{ArgumentList, Deferred, Invoker, TypedResolver};
pub use descriptor::{
    ClosedGeneric, GenericArguments, OpenGeneric, Resolvable, TemplateId, TypeDescriptor, Upcast,
};
pub use descriptors::RegistrationInfo;
pub use error::{ArgumentError, BoxError, DiError, DiResult};
pub use key::{key_of_type, Key};
pub use lifetime::Lifetime;
pub use options::{ContainerBuilder, ContainerOptions, TraceSink};
pub use overrides::{Fields, ObjectShape, OverrideValue, ParameterOverride};
pub use registration::{
    erase, erase_value, unerase, AnyArc, Binding, Concrete, OpenTemplate, RegistrationKind,
};
pub use traits::{Dispose, Resolver, ResolverCore};
