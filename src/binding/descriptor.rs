//! The immutable record of one declared step or hook.

use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use super::handler::Invoker;
use super::owner::TypeHandle;
use super::values::{BindingKind, MemberId, SourceLocation, StepPattern, Tag};
use crate::error::Candidate;

/// Describes one declared step or hook.
///
/// Descriptors are created by the declaration builder returned from
/// [`crate::registry::Registry::binding`] and shared between the registry's
/// indices.
#[derive(Clone)]
pub struct BindingDescriptor {
    pattern: StepPattern,
    kind: BindingKind,
    owner: TypeHandle,
    member: MemberId,
    tag: Tag,
    timeout: Option<Duration>,
    arity: usize,
    location: SourceLocation,
    invoker: Invoker,
}

/// Fields of a descriptor other than its invoker.
pub(crate) struct DescriptorParts {
    pub(crate) pattern: StepPattern,
    pub(crate) kind: BindingKind,
    pub(crate) owner: TypeHandle,
    pub(crate) member: MemberId,
    pub(crate) tag: Tag,
    pub(crate) timeout: Option<Duration>,
    pub(crate) arity: usize,
    pub(crate) location: SourceLocation,
}

impl BindingDescriptor {
    pub(crate) fn new(parts: DescriptorParts, invoker: Invoker) -> Self {
        let DescriptorParts {
            pattern,
            kind,
            owner,
            member,
            tag,
            timeout,
            arity,
            location,
        } = parts;
        Self {
            pattern,
            kind,
            owner,
            member,
            tag,
            timeout,
            arity,
            location,
            invoker,
        }
    }

    /// Pattern key; the wildcard pattern for hooks.
    #[must_use]
    pub const fn pattern(&self) -> &StepPattern {
        &self.pattern
    }

    /// Step keyword or hook kind.
    #[must_use]
    pub const fn kind(&self) -> BindingKind {
        self.kind
    }

    /// Type declaring the binding.
    #[must_use]
    pub const fn owner(&self) -> TypeHandle {
        self.owner
    }

    /// Handler identity.
    #[must_use]
    pub const fn member(&self) -> MemberId {
        self.member
    }

    /// Tag the binding is scoped to.
    #[must_use]
    pub const fn tag(&self) -> &Tag {
        &self.tag
    }

    /// Advisory timeout override.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Number of arguments the handler takes.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.arity
    }

    /// Declaration site.
    #[must_use]
    pub const fn location(&self) -> SourceLocation {
        self.location
    }

    /// Whether `other` records the same declaration: same call site, kind,
    /// pattern text and tag.
    ///
    /// Re-running registration code reproduces all of these, while distinct
    /// declarations sharing a line (chained hooks, tags added in a loop)
    /// differ in at least one.
    #[must_use]
    pub fn is_same_declaration(&self, other: &Self) -> bool {
        self.location == other.location
            && self.kind == other.kind
            && self.pattern == other.pattern
            && self.tag == other.tag
    }

    pub(crate) const fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    pub(crate) fn candidate(&self) -> Candidate {
        Candidate {
            owner: self.owner.name(),
            member: self.member,
            tag: self.tag.clone(),
            location: self.location,
        }
    }
}

impl Debug for BindingDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingDescriptor")
            .field("pattern", &self.pattern)
            .field("kind", &self.kind)
            .field("owner", &self.owner)
            .field("member", &self.member)
            .field("tag", &self.tag)
            .field("timeout", &self.timeout)
            .field("arity", &self.arity)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Options for declaring a step: keyword, pattern, tag and timeout.
///
/// # Examples
/// ```rust
/// use std::time::Duration;
/// use stepbind::binding::{BindingKind, StepDef};
///
/// let def = StepDef::given("I am logged in")
///     .tagged("@auth")
///     .timeout(Duration::from_secs(5));
/// assert_eq!(def.kind(), BindingKind::Given);
/// ```
#[derive(Debug, Clone)]
pub struct StepDef {
    kind: BindingKind,
    pattern: StepPattern,
    tag: Tag,
    timeout: Option<Duration>,
}

impl StepDef {
    fn new(kind: BindingKind, pattern: impl Into<StepPattern>) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
            tag: Tag::wildcard(),
            timeout: None,
        }
    }

    /// A `Given` step.
    #[must_use]
    pub fn given(pattern: impl Into<StepPattern>) -> Self {
        Self::new(BindingKind::Given, pattern)
    }

    /// A `When` step.
    #[must_use]
    pub fn when(pattern: impl Into<StepPattern>) -> Self {
        Self::new(BindingKind::When, pattern)
    }

    /// A `Then` step.
    #[must_use]
    pub fn then(pattern: impl Into<StepPattern>) -> Self {
        Self::new(BindingKind::Then, pattern)
    }

    /// Scope the step to scenarios carrying `tag`.
    #[must_use]
    pub fn tagged(mut self, tag: impl Into<Tag>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Attach an advisory timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The step keyword.
    #[must_use]
    pub const fn kind(&self) -> BindingKind {
        self.kind
    }

    pub(crate) fn into_parts(
        self,
        owner: TypeHandle,
        member: MemberId,
        arity: usize,
        location: SourceLocation,
    ) -> DescriptorParts {
        DescriptorParts {
            pattern: self.pattern,
            kind: self.kind,
            owner,
            member,
            tag: self.tag,
            timeout: self.timeout,
            arity,
            location,
        }
    }
}

/// Options for declaring a per-scenario hook.
#[derive(Debug, Clone)]
pub struct HookDef {
    kind: BindingKind,
    tag: Tag,
    timeout: Option<Duration>,
}

impl HookDef {
    fn new(kind: BindingKind) -> Self {
        Self {
            kind,
            tag: Tag::wildcard(),
            timeout: None,
        }
    }

    /// Runs before each scenario.
    #[must_use]
    pub fn before() -> Self {
        Self::new(BindingKind::Before)
    }

    /// Runs after each scenario.
    #[must_use]
    pub fn after() -> Self {
        Self::new(BindingKind::After)
    }

    /// Only run for scenarios carrying `tag`.
    #[must_use]
    pub fn tagged(mut self, tag: impl Into<Tag>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Attach an advisory timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn into_parts(
        self,
        owner: TypeHandle,
        member: MemberId,
        arity: usize,
        location: SourceLocation,
    ) -> DescriptorParts {
        DescriptorParts {
            pattern: StepPattern::wildcard(),
            kind: self.kind,
            owner,
            member,
            tag: self.tag,
            timeout: self.timeout,
            arity,
            location,
        }
    }
}
