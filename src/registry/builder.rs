//! Declaration builder used during the registration phase.
//!
//! Each call records one descriptor (or the owner's context types) straight
//! into the registry. Step and hook methods are `#[track_caller]`, so the
//! declaration site becomes the descriptor's source location and calling the
//! same registration code twice coalesces into one declaration.

use std::marker::PhantomData;

use crate::binding::{
    BindingDescriptor, BindingKind, DescriptorParts, HookDef, HookHandler, IntoStepResult,
    Invoker, MemberId, SourceLocation, StepDef, StepHandler, StepPattern, Tag, TypeHandle,
};
use crate::scenario::Activate;

use super::Registry;

/// Declares the steps and hooks owned by `T`.
///
/// Returned by [`Registry::binding`].
#[derive(Debug)]
pub struct BindingBuilder<'r, T> {
    registry: &'r mut Registry,
    owner: TypeHandle,
    context_types: Vec<TypeHandle>,
    _owner: PhantomData<fn() -> T>,
}

impl<'r, T: Activate> BindingBuilder<'r, T> {
    pub(super) fn new(registry: &'r mut Registry) -> Self {
        Self {
            registry,
            owner: TypeHandle::of::<T>(),
            context_types: Vec::new(),
            _owner: PhantomData,
        }
    }

    /// Require a `C` to be activated before `T` and passed to its factory.
    ///
    /// Context types are handed to [`Activate::activate`] in the order they
    /// are declared here. The list declared through this builder replaces
    /// any list an earlier builder declared for `T`.
    pub fn context<C: Activate>(&mut self) -> &mut Self {
        let handle = TypeHandle::of::<C>();
        if !self.context_types.contains(&handle) {
            self.context_types.push(handle);
        }
        self.registry
            .register_required_context_types(self.owner, self.context_types.clone());
        self
    }

    /// Declare a `Given` step.
    #[track_caller]
    pub fn given<M: 'static, H: StepHandler<T, M>>(
        &mut self,
        pattern: impl Into<StepPattern>,
        handler: H,
    ) -> &mut Self {
        self.step(StepDef::given(pattern), handler)
    }

    /// Declare a `When` step.
    #[track_caller]
    pub fn when<M: 'static, H: StepHandler<T, M>>(
        &mut self,
        pattern: impl Into<StepPattern>,
        handler: H,
    ) -> &mut Self {
        self.step(StepDef::when(pattern), handler)
    }

    /// Declare a `Then` step.
    #[track_caller]
    pub fn then<M: 'static, H: StepHandler<T, M>>(
        &mut self,
        pattern: impl Into<StepPattern>,
        handler: H,
    ) -> &mut Self {
        self.step(StepDef::then(pattern), handler)
    }

    /// Declare a step with explicit options.
    #[track_caller]
    pub fn step<M: 'static, H: StepHandler<T, M>>(
        &mut self,
        def: StepDef,
        handler: H,
    ) -> &mut Self {
        let parts = def.into_parts(
            self.owner,
            MemberId::of::<H>(),
            H::ARITY,
            SourceLocation::caller(),
        );
        self.record(parts, Invoker::step::<T, M, H>(handler))
    }

    /// Declare a hook run before every scenario.
    #[track_caller]
    pub fn before<M: 'static, H: HookHandler<T, M>>(&mut self, handler: H) -> &mut Self {
        self.hook(HookDef::before(), handler)
    }

    /// Declare a hook run after every scenario.
    #[track_caller]
    pub fn after<M: 'static, H: HookHandler<T, M>>(&mut self, handler: H) -> &mut Self {
        self.hook(HookDef::after(), handler)
    }

    /// Declare a per-scenario hook with explicit options.
    #[track_caller]
    pub fn hook<M: 'static, H: HookHandler<T, M>>(
        &mut self,
        def: HookDef,
        handler: H,
    ) -> &mut Self {
        let parts = def.into_parts(
            self.owner,
            MemberId::of::<H>(),
            H::ARITY,
            SourceLocation::caller(),
        );
        self.record(parts, Invoker::hook::<T, M, H>(handler))
    }

    /// Declare a hook run once before any scenario. It gets no instance.
    #[track_caller]
    pub fn before_all<F, R>(&mut self, handler: F) -> &mut Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoStepResult,
    {
        self.global(BindingKind::BeforeAll, handler, SourceLocation::caller())
    }

    /// Declare a hook run once after every scenario. It gets no instance.
    #[track_caller]
    pub fn after_all<F, R>(&mut self, handler: F) -> &mut Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoStepResult,
    {
        self.global(BindingKind::AfterAll, handler, SourceLocation::caller())
    }

    fn global<F, R>(
        &mut self,
        kind: BindingKind,
        handler: F,
        location: SourceLocation,
    ) -> &mut Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoStepResult,
    {
        let parts = DescriptorParts {
            pattern: StepPattern::wildcard(),
            kind,
            owner: self.owner,
            member: MemberId::of::<F>(),
            tag: Tag::wildcard(),
            timeout: None,
            arity: 0,
            location,
        };
        self.record(parts, Invoker::global(handler))
    }

    fn record(&mut self, parts: DescriptorParts, invoker: Invoker) -> &mut Self {
        self.registry
            .register_binding(BindingDescriptor::new(parts, invoker));
        self
    }
}
