//! Binding descriptors and the values they are made of.
//!
//! A binding ties a step pattern (or a lifecycle hook) to a handler on an
//! owning type. Descriptors are immutable once built; the
//! [`registry`](crate::registry) indexes them and the
//! [`runner`](crate::runner) invokes them against activated instances.

mod descriptor;
mod handler;
mod owner;
mod values;

pub use descriptor::{BindingDescriptor, HookDef, StepDef};
pub use handler::{CallError, HookHandler, IntoStepResult, StepHandler, WithScenario};
pub use owner::TypeHandle;
pub use values::{
    BindingKind, MemberId, SourceLocation, StepPattern, Tag, WILDCARD_PATTERN, WILDCARD_TAG,
    tags,
};

pub(crate) use descriptor::DescriptorParts;
pub(crate) use handler::{InvokeError, Invoker};
pub(crate) use owner::Teardown;
