//! Drives bindings for a host BDD framework.
//!
//! The framework owns step matching and scenario scheduling; for each
//! scenario it calls, in order:
//!
//! 1. [`StepRunner::start_scenario`] to open a [`ScenarioContext`];
//! 2. [`StepRunner::run_before_hooks`];
//! 3. [`StepRunner::run_step`] once per matched step;
//! 4. [`StepRunner::finish_scenario`], which runs the After hooks and then
//!    tears the context down whether or not anything failed.
//!
//! [`StepRunner::run_before_all`] and [`StepRunner::run_after_all`] bracket
//! the whole run.
//!
//! # Examples
//! ```rust
//! use stepbind::binding::tags;
//! use stepbind::config::RuntimeConfig;
//! use stepbind::registry::Registry;
//! use stepbind::runner::StepRunner;
//! use stepbind::scenario::{Activate, ContextArgs};
//!
//! #[derive(Default)]
//! struct Counter {
//!     value: u32,
//! }
//!
//! impl Activate for Counter {
//!     fn activate(_: &ContextArgs) -> anyhow::Result<Self> {
//!         Ok(Self::default())
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry
//!     .binding::<Counter>()
//!     .when("I add {int}", |counter: &mut Counter, n: u32| counter.value += n)
//!     .then("the value is {int}", |counter: &mut Counter, n: u32| {
//!         anyhow::ensure!(counter.value == n, "value is {}", counter.value);
//!         Ok(())
//!     });
//!
//! let runner = StepRunner::new(&registry, RuntimeConfig::default());
//! let mut scenario = runner.start_scenario("adding", tags(["@math"]));
//! runner.run_before_hooks(&mut scenario)?;
//! runner.run_step(&mut scenario, "I add {int}", &["2"])?;
//! runner.run_step(&mut scenario, "the value is {int}", &["2"])?;
//! runner.finish_scenario(&mut scenario)?;
//! # Ok::<(), stepbind::error::BindingError>(())
//! ```

use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::binding::{
    BindingDescriptor, BindingKind, CallError, InvokeError, MemberId, SourceLocation, Tag,
};
use crate::config::RuntimeConfig;
use crate::error::BindingError;
use crate::registry::Registry;
use crate::resolve::resolve;
use crate::scenario::{ScenarioContext, ScenarioInfo};

/// Outcome of a successful step invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    member: MemberId,
    location: SourceLocation,
    elapsed: Duration,
    timeout: Option<Duration>,
}

impl StepReport {
    /// Handler that ran.
    #[must_use]
    pub const fn member(&self) -> MemberId {
        self.member
    }

    /// Where the step was declared.
    #[must_use]
    pub const fn location(&self) -> SourceLocation {
        self.location
    }

    /// Wall-clock time spent in the handler.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The effective advisory timeout: the step's own, else the configured
    /// default.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether the handler ran longer than its timeout.
    #[must_use]
    pub fn exceeded_timeout(&self) -> bool {
        self.timeout.is_some_and(|limit| self.elapsed > limit)
    }
}

/// Runs steps and hooks from a [`Registry`] against scenario contexts.
#[derive(Debug)]
pub struct StepRunner<'r> {
    registry: &'r Registry,
    config: RuntimeConfig,
}

impl<'r> StepRunner<'r> {
    /// A runner over a fully populated registry.
    #[must_use]
    pub const fn new(registry: &'r Registry, config: RuntimeConfig) -> Self {
        Self { registry, config }
    }

    /// The registry bindings are resolved from.
    #[must_use]
    pub const fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Open the context for a new scenario.
    #[must_use]
    pub fn start_scenario(&self, title: impl Into<String>, tags: Vec<Tag>) -> ScenarioContext {
        let info = ScenarioInfo::new(title, tags);
        debug!(scenario = %info.title(), tags = info.tags().len(), "scenario started");
        ScenarioContext::new(info)
    }

    /// Run every `BeforeAll` hook, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::HookFailed`] for the failing hook.
    pub fn run_before_all(&self) -> Result<(), BindingError> {
        for descriptor in self.registry.hooks(BindingKind::BeforeAll) {
            self.call_global(descriptor)?;
        }
        Ok(())
    }

    /// Run every `AfterAll` hook, even when an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first [`BindingError::HookFailed`].
    pub fn run_after_all(&self) -> Result<(), BindingError> {
        let mut first = None;
        for descriptor in self.registry.hooks(BindingKind::AfterAll) {
            if let Err(err) = self.call_global(descriptor) {
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err)
    }

    /// Run the `Before` hooks that apply to the scenario, in registration
    /// order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::PostDisposalUse`] for a disposed context,
    /// any activation error for a hook's owner, and
    /// [`BindingError::HookFailed`] when a hook fails.
    pub fn run_before_hooks(&self, ctx: &mut ScenarioContext) -> Result<(), BindingError> {
        ctx.ensure_live()?;
        let hooks: Vec<&BindingDescriptor> = self
            .registry
            .hooks(BindingKind::Before)
            .filter(|hook| applies_to(hook, ctx.info()))
            .collect();
        for hook in hooks {
            self.call_hook(ctx, hook)?;
        }
        Ok(())
    }

    /// Resolve and run one step.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::PostDisposalUse`] for a disposed context,
    /// any resolution error, [`BindingError::ArityMismatch`] when `args`
    /// does not match the handler, any activation error,
    /// [`BindingError::InvalidArgument`] when an argument fails to parse
    /// and [`BindingError::StepFailed`] when the handler fails.
    pub fn run_step(
        &self,
        ctx: &mut ScenarioContext,
        pattern: &str,
        args: &[&str],
    ) -> Result<StepReport, BindingError> {
        ctx.ensure_live()?;
        let step = resolve(self.registry, pattern, ctx.info().tags())?;
        if args.len() != step.arity() {
            return Err(BindingError::ArityMismatch {
                pattern: pattern.to_owned(),
                expected: step.arity(),
                actual: args.len(),
            });
        }

        let descriptor = step.descriptor();
        let instance = ctx.get_or_activate_handle(self.registry, step.owner())?;
        let started = Instant::now();
        let outcome = descriptor.invoker().call_step(&*instance, args);
        let report = StepReport {
            member: step.member(),
            location: step.location(),
            elapsed: started.elapsed(),
            timeout: step.timeout().or_else(|| self.config.default_step_timeout()),
        };
        outcome.map_err(|err| invoke_failure(descriptor, err))?;

        if report.exceeded_timeout() && self.config.warn_on_timeout {
            warn!(
                scenario = %ctx.info().title(),
                pattern,
                location = %report.location,
                elapsed = ?report.elapsed,
                timeout = ?report.timeout,
                "step exceeded its timeout",
            );
        }
        trace!(pattern, member = %report.member, "step finished");
        Ok(report)
    }

    /// Run the `After` hooks that apply to the scenario in reverse
    /// registration order, then dispose the context. Disposal happens even
    /// when a hook fails. Returns the number of disposed objects.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::PostDisposalUse`] for an already disposed
    /// context, otherwise the first error raised by an After hook, or
    /// [`BindingError::TeardownIncomplete`] when disposal found borrowed
    /// objects.
    pub fn finish_scenario(&self, ctx: &mut ScenarioContext) -> Result<usize, BindingError> {
        ctx.ensure_live()?;
        let hooks: Vec<&BindingDescriptor> = self
            .registry
            .hooks(BindingKind::After)
            .filter(|hook| applies_to(hook, ctx.info()))
            .collect();
        let mut first = None;
        for hook in hooks.into_iter().rev() {
            if let Err(err) = self.call_hook(ctx, hook) {
                warn!(
                    scenario = %ctx.info().title(),
                    location = %hook.location(),
                    error = %err,
                    "after hook failed",
                );
                first.get_or_insert(err);
            }
        }
        let disposed = ctx.dispose();
        first.map_or(disposed, Err)
    }

    fn call_hook(
        &self,
        ctx: &mut ScenarioContext,
        hook: &BindingDescriptor,
    ) -> Result<(), BindingError> {
        let instance = ctx.get_or_activate_handle(self.registry, hook.owner())?;
        trace!(kind = %hook.kind(), owner = %hook.owner(), "running hook");
        hook.invoker()
            .call_hook(&*instance, ctx.info())
            .map_err(|err| invoke_failure(hook, err))
    }

    fn call_global(&self, hook: &BindingDescriptor) -> Result<(), BindingError> {
        debug!(kind = %hook.kind(), location = %hook.location(), "running global hook");
        hook.invoker()
            .call_global()
            .map_err(|err| invoke_failure(hook, err))
    }
}

/// Whether a per-scenario hook is in scope for the scenario.
fn applies_to(hook: &BindingDescriptor, info: &ScenarioInfo) -> bool {
    hook.tag().is_wildcard() || info.has_tag(hook.tag())
}

fn invoke_failure(descriptor: &BindingDescriptor, err: InvokeError) -> BindingError {
    match err {
        InvokeError::Call(CallError::Argument {
            index,
            value,
            expected,
            reason,
        }) => BindingError::InvalidArgument {
            member: descriptor.member(),
            index,
            value,
            expected,
            reason,
        },
        InvokeError::Call(CallError::Failed(source)) if descriptor.kind().is_step() => {
            BindingError::StepFailed {
                member: descriptor.member(),
                location: descriptor.location(),
                source: source.into(),
            }
        }
        InvokeError::Call(CallError::Failed(source)) => BindingError::HookFailed {
            member: descriptor.member(),
            location: descriptor.location(),
            source: source.into(),
        },
        InvokeError::Unavailable(reason) => BindingError::InstanceUnavailable {
            owner: descriptor.owner().name(),
            reason,
        },
    }
}
