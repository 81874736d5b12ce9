//! Step bindings for behaviour-driven test runners.
//!
//! Test authors declare steps and hooks on ordinary types. At run time a
//! step invocation (pattern plus the scenario's tags) is resolved to exactly
//! one handler, the owning object and the context objects it depends on are
//! built once per scenario, and everything is torn down when the scenario
//! ends.
//!
//! - [`registry`] collects declarations during a registration phase.
//! - [`resolve`] picks the binding for a step under the active tags.
//! - [`scenario`] activates and disposes per-scenario objects.
//! - [`runner`] is the glue a host framework drives.

pub mod binding;
pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod resolve;
pub mod runner;
pub mod scenario;

pub use error::BindingError;
