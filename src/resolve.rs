//! Step resolution.
//!
//! Turns a pattern and the scenario's active tags into exactly one step
//! binding. Hooks share the registry's indices but are never resolution
//! candidates; they are selected by the [`runner`](crate::runner).

use std::time::Duration;

use tracing::trace;

use crate::binding::{BindingDescriptor, MemberId, SourceLocation, Tag, TypeHandle};
use crate::error::BindingError;
use crate::registry::Registry;

/// The single step binding a pattern resolved to.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedStep<'r> {
    descriptor: &'r BindingDescriptor,
}

impl<'r> ResolvedStep<'r> {
    /// The full descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &'r BindingDescriptor {
        self.descriptor
    }

    /// Type that must be activated to run the step.
    #[must_use]
    pub const fn owner(&self) -> TypeHandle {
        self.descriptor.owner()
    }

    /// Handler identity.
    #[must_use]
    pub const fn member(&self) -> MemberId {
        self.descriptor.member()
    }

    /// Number of arguments the handler expects.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.descriptor.arity()
    }

    /// Timeout declared on the step, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.descriptor.timeout()
    }

    /// Declaration site.
    #[must_use]
    pub const fn location(&self) -> SourceLocation {
        self.descriptor.location()
    }
}

/// Resolve `pattern` under the active `tags` to exactly one step binding.
///
/// # Errors
///
/// Returns [`BindingError::StepNotBound`] when nothing matches and
/// [`BindingError::AmbiguousStep`] when several step bindings survive tag
/// filtering.
///
/// # Examples
/// ```rust
/// use stepbind::binding::{StepDef, tags};
/// use stepbind::registry::Registry;
/// use stepbind::resolve::resolve;
/// use stepbind::scenario::{Activate, ContextArgs};
///
/// struct Login;
///
/// impl Activate for Login {
///     fn activate(_: &ContextArgs) -> anyhow::Result<Self> {
///         Ok(Self)
///     }
/// }
///
/// let mut registry = Registry::new();
/// registry
///     .binding::<Login>()
///     .given("I am logged in", |_: &mut Login| {})
///     .step(StepDef::given("I am logged in").tagged("@auth"), |_: &mut Login| {});
///
/// let step = resolve(&registry, "I am logged in", &tags(["@auth"])).expect("resolves");
/// assert_eq!(step.descriptor().tag().as_str(), "@auth");
/// assert!(resolve(&registry, "I am logged out", &[]).is_err());
/// ```
pub fn resolve<'r>(
    registry: &'r Registry,
    pattern: &str,
    tags: &[Tag],
) -> Result<ResolvedStep<'r>, BindingError> {
    let mut matches = registry.lookup_steps(pattern, tags);

    match matches.len() {
        0 => Err(BindingError::StepNotBound {
            pattern: pattern.to_owned(),
            tags: tags.to_vec(),
        }),
        1 => {
            let descriptor = matches.remove(0);
            trace!(
                pattern,
                owner = %descriptor.owner(),
                tag = %descriptor.tag(),
                "resolved step",
            );
            Ok(ResolvedStep { descriptor })
        }
        _ => Err(BindingError::AmbiguousStep {
            pattern: pattern.to_owned(),
            tags: tags.to_vec(),
            candidates: matches
                .iter()
                .map(|descriptor| descriptor.candidate())
                .collect(),
        }),
    }
}

impl Registry {
    /// Shorthand for [`resolve`] against this registry.
    ///
    /// # Errors
    ///
    /// As for [`resolve`].
    pub fn resolve(&self, pattern: &str, tags: &[Tag]) -> Result<ResolvedStep<'_>, BindingError> {
        resolve(self, pattern, tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{BindingKind, HookDef, StepDef, tags};
    use crate::scenario::{Activate, ContextArgs};
    use rstest::{fixture, rstest};

    struct Account;

    impl Activate for Account {
        fn activate(_: &ContextArgs) -> anyhow::Result<Self> {
            Ok(Self)
        }
    }

    #[fixture]
    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .binding::<Account>()
            .given("I am logged in", |_: &mut Account| {})
            .step(
                StepDef::given("I am logged in").tagged("@auth"),
                |_: &mut Account| {},
            )
            .step(
                StepDef::given("I am logged in").tagged("@other"),
                |_: &mut Account| {},
            )
            .when("I pay {int}", |_: &mut Account, _amount: u32| {})
            .before(|_: &mut Account| {})
            .hook(HookDef::after().tagged("@auth"), |_: &mut Account| {});
        registry
    }

    #[rstest]
    #[case::untagged(&[], "*")]
    #[case::auth(&["@auth"], "@auth")]
    #[case::unrelated_tag(&["@slow"], "*")]
    fn resolves_by_tag(registry: Registry, #[case] active: &[&str], #[case] expected: &str) {
        let step = resolve(&registry, "I am logged in", &tags(active.iter().copied()))
            .expect("step resolves");
        assert_eq!(step.descriptor().tag().as_str(), expected);
        assert_eq!(step.descriptor().kind(), BindingKind::Given);
        assert_eq!(step.arity(), 0);
    }

    #[rstest]
    fn two_matching_tags_are_ambiguous(registry: Registry) {
        let err = resolve(&registry, "I am logged in", &tags(["@auth", "@other"]))
            .expect_err("two tagged bindings match");
        let BindingError::AmbiguousStep { candidates, .. } = err else {
            panic!("expected AmbiguousStep, got {err:?}");
        };
        let found: Vec<_> = candidates.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(found, ["@auth", "@other"]);
        assert!(candidates.iter().all(|c| c.location.file().ends_with("resolve.rs")));
    }

    #[rstest]
    fn unknown_pattern_is_not_bound(registry: Registry) {
        let err = resolve(&registry, "I am logged out", &tags(["@auth"]))
            .expect_err("nothing declared");
        assert!(matches!(err, BindingError::StepNotBound { ref pattern, .. } if pattern == "I am logged out"));
    }

    #[rstest]
    fn hooks_never_resolve_as_steps(registry: Registry) {
        let err = registry
            .resolve(crate::binding::WILDCARD_PATTERN, &tags(["@auth"]))
            .expect_err("hooks are not steps");
        assert!(matches!(err, BindingError::StepNotBound { .. }));
    }

    #[test]
    fn tagged_hook_does_not_hide_a_wildcard_step() {
        let mut registry = Registry::new();
        registry
            .binding::<Account>()
            .given(crate::binding::WILDCARD_PATTERN, |_: &mut Account| {})
            .hook(HookDef::before().tagged("@auth"), |_: &mut Account| {});
        let step = registry
            .resolve(crate::binding::WILDCARD_PATTERN, &tags(["@auth"]))
            .expect("wildcard step resolves");
        assert_eq!(step.descriptor().kind(), BindingKind::Given);
        assert!(step.descriptor().tag().is_wildcard());
    }

    #[rstest]
    fn resolved_step_reports_arity(registry: Registry) {
        let step = registry.resolve("I pay {int}", &[]).expect("step resolves");
        assert_eq!(step.arity(), 1);
        assert!(step.owner().is::<Account>());
        assert!(step.timeout().is_none());
    }
}
