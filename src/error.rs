//! Error types raised while resolving, activating and invoking bindings.
//!
//! Every variant is a [`miette::Diagnostic`] with a stable code so host
//! frameworks can render resolution failures with hints rather than bare
//! strings.

// Module-level suppression for version-dependent lint false positives from
// miette/thiserror derive macros. The unused_assignments lint fires in some
// Rust versions but not others, so `#[expect]` cannot be used here.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use std::fmt::{self, Display, Formatter};

use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;

use crate::binding::{MemberId, SourceLocation, Tag};

/// Boxed error used for failures surfaced by user code.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One of several bindings that matched the same step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Name of the type declaring the binding.
    pub owner: &'static str,
    /// Handler that would have been invoked.
    pub member: MemberId,
    /// Tag the binding was registered under.
    pub tag: Tag,
    /// Where the binding was declared.
    pub location: SourceLocation,
}

impl Display for Candidate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {} [{}] ({})",
            self.member, self.owner, self.tag, self.location
        )
    }
}

fn list_candidates(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .map(|candidate| format!("\n\t{candidate}"))
        .collect()
}

fn list_tags(tags: &[Tag]) -> String {
    if tags.is_empty() {
        return "<none>".to_owned();
    }
    tags.iter().join(", ")
}

/// Failures raised by the registry, the resolution engine and the activator.
#[derive(Debug, Error, Diagnostic)]
pub enum BindingError {
    /// More than one binding matched the step under the active tags.
    #[error(
        "ambiguous step definitions for '{pattern}' under tags [{}]:{}",
        list_tags(.tags),
        list_candidates(.candidates)
    )]
    #[diagnostic(
        code(stepbind::resolve::ambiguous_step),
        help("scope the competing bindings with distinct tags")
    )]
    AmbiguousStep {
        /// Pattern that was looked up.
        pattern: String,
        /// Tags active for the scenario.
        tags: Vec<Tag>,
        /// Every matching binding.
        candidates: Vec<Candidate>,
    },

    /// No binding matched the step.
    #[error("no step definition bound to '{pattern}' for tags [{}]", list_tags(.tags))]
    #[diagnostic(
        code(stepbind::resolve::step_not_bound),
        help("declare the step on a binding type, or register it under the wildcard tag")
    )]
    StepNotBound {
        /// Pattern that was looked up.
        pattern: String,
        /// Tags active for the scenario.
        tags: Vec<Tag>,
    },

    /// Activation revisited a type that was still under construction.
    #[error("circular context dependency: {}", .cycle.join(" -> "))]
    #[diagnostic(
        code(stepbind::activate::dependency_cycle),
        help("break the cycle by removing one of the required context types")
    )]
    DependencyCycle {
        /// The activation chain, closed by the revisited type.
        cycle: Vec<&'static str>,
    },

    /// The scenario context was used after it had been disposed.
    #[error("scenario '{scenario}' was used after teardown")]
    #[diagnostic(code(stepbind::scenario::post_disposal_use))]
    PostDisposalUse {
        /// Title of the scenario.
        scenario: String,
    },

    /// Teardown found objects still borrowed and could not dispose them.
    ///
    /// The context keeps those objects and tears them down again when it is
    /// dropped.
    #[error(
        "scenario '{scenario}' could not tear down {} while still borrowed",
        .owners.join(", ")
    )]
    #[diagnostic(
        code(stepbind::scenario::teardown_incomplete),
        help("release every borrow of scenario objects before the scenario ends")
    )]
    TeardownIncomplete {
        /// Title of the scenario.
        scenario: String,
        /// Types whose teardown was deferred, in teardown order.
        owners: Vec<&'static str>,
        /// How many objects were disposed.
        disposed: usize,
    },

    /// The step was invoked with the wrong number of arguments.
    #[error("step '{pattern}' takes {expected} argument(s) but {actual} were supplied")]
    #[diagnostic(code(stepbind::invoke::arity_mismatch))]
    ArityMismatch {
        /// Pattern of the resolved step.
        pattern: String,
        /// Arity declared by the handler.
        expected: usize,
        /// Number of arguments supplied by the framework.
        actual: usize,
    },

    /// A step argument could not be converted to the handler's parameter type.
    #[error("argument {index} ('{value}') for {member} is not a valid {expected}: {reason}")]
    #[diagnostic(code(stepbind::invoke::invalid_argument))]
    InvalidArgument {
        /// Handler receiving the argument.
        member: MemberId,
        /// Zero-based argument position.
        index: usize,
        /// Raw argument text.
        value: String,
        /// Name of the parameter type.
        expected: &'static str,
        /// Parser message.
        reason: String,
    },

    /// A factory asked for a context instance it was not given.
    #[error("{owner} requested context {requested}, which is not among its activated contexts")]
    #[diagnostic(
        code(stepbind::activate::context_unavailable),
        help("declare the type with `.context::<T>()` on the owner's binding")
    )]
    ContextUnavailable {
        /// Type being constructed.
        owner: &'static str,
        /// Context type that was requested.
        requested: &'static str,
    },

    /// A factory returned an error.
    #[error("failed to activate {type_name}")]
    #[diagnostic(code(stepbind::activate::failed))]
    ActivationFailed {
        /// Type being constructed.
        type_name: &'static str,
        /// Error returned by the factory.
        #[source]
        source: BoxedError,
    },

    /// The activated instance could not be borrowed for the call.
    #[error("instance of {owner} is unavailable: {reason}")]
    #[diagnostic(code(stepbind::invoke::instance_unavailable))]
    InstanceUnavailable {
        /// Owning type.
        owner: &'static str,
        /// Why the borrow failed.
        reason: &'static str,
    },

    /// A step handler returned an error.
    #[error("step {member} ({location}) failed")]
    #[diagnostic(code(stepbind::invoke::step_failed))]
    StepFailed {
        /// Handler that failed.
        member: MemberId,
        /// Where the step was declared.
        location: SourceLocation,
        /// Error returned by the handler.
        #[source]
        source: BoxedError,
    },

    /// A hook handler returned an error.
    #[error("hook {member} ({location}) failed")]
    #[diagnostic(code(stepbind::invoke::hook_failed))]
    HookFailed {
        /// Handler that failed.
        member: MemberId,
        /// Where the hook was declared.
        location: SourceLocation,
        /// Error returned by the handler.
        #[source]
        source: BoxedError,
    },
}

/// Errors raised while loading configuration or installing the subscriber.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration from {}", .path.display())]
    #[diagnostic(code(stepbind::config::read))]
    Read {
        /// Path that was read.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration was not valid TOML for [`crate::config::RuntimeConfig`].
    #[error("invalid configuration")]
    #[diagnostic(code(stepbind::config::parse))]
    Parse(#[from] toml::de::Error),

    /// The configured log level is not recognised.
    #[error("unknown log level '{level}'")]
    #[diagnostic(
        code(stepbind::config::log_level),
        help("use one of trace, debug, info, warn, error")
    )]
    LogLevel {
        /// Level text from the configuration.
        level: String,
    },

    /// A global tracing subscriber was already installed.
    #[error("failed to install tracing subscriber: {reason}")]
    #[diagnostic(code(stepbind::logging::install))]
    Subscriber {
        /// Message from `tracing-subscriber`.
        reason: String,
    },
}
