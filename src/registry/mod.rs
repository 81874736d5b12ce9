//! The binding registry.
//!
//! The registry keeps two views of the same descriptors:
//!
//! - a pattern index, `pattern -> tag -> descriptors`, consulted when a step
//!   is resolved; and
//! - an owner index, `type -> (required context types, descriptors)`,
//!   consulted when a binding object is activated.
//!
//! Both views hold the same [`Arc`]s, so they cannot drift apart. The
//! registry is filled during a registration phase (which needs `&mut`) and
//! is read-only afterwards, so scenarios on several threads may share it.

mod builder;

#[cfg(test)]
mod tests;

pub use builder::BindingBuilder;

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::binding::{BindingDescriptor, BindingKind, Tag, TypeHandle, WILDCARD_TAG};
use crate::scenario::Activate;

type TagMap = IndexMap<String, Vec<Arc<BindingDescriptor>>>;

#[derive(Debug, Default)]
struct OwnerEntry {
    context_types: Vec<TypeHandle>,
    descriptors: Vec<Arc<BindingDescriptor>>,
}

/// A distinct step pattern and the step keywords declared for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSummary<'r> {
    /// Pattern text.
    pub pattern: &'r str,
    /// Step keywords with at least one binding for the pattern, in first
    /// registration order.
    pub kinds: Vec<BindingKind>,
}

/// Index of every declared step and hook.
#[derive(Debug, Default)]
pub struct Registry {
    patterns: IndexMap<String, TagMap>,
    owners: IndexMap<TypeHandle, OwnerEntry>,
}

impl Registry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start declaring bindings owned by `T`.
    ///
    /// # Examples
    /// ```rust
    /// use stepbind::registry::Registry;
    /// use stepbind::scenario::{Activate, ContextArgs};
    ///
    /// #[derive(Default)]
    /// struct Calculator {
    ///     total: i64,
    /// }
    ///
    /// impl Activate for Calculator {
    ///     fn activate(_: &ContextArgs) -> anyhow::Result<Self> {
    ///         Ok(Self::default())
    ///     }
    /// }
    ///
    /// let mut registry = Registry::new();
    /// registry
    ///     .binding::<Calculator>()
    ///     .when("I add {int}", |calc: &mut Calculator, n: i64| calc.total += n);
    /// assert_eq!(registry.lookup("I add {int}", &[]).len(), 1);
    /// ```
    pub fn binding<T: Activate>(&mut self) -> BindingBuilder<'_, T> {
        BindingBuilder::new(self)
    }

    /// Record a descriptor in both indices.
    ///
    /// Registering the same declaration again (see
    /// [`BindingDescriptor::is_same_declaration`]) is a no-op. Returns
    /// whether the descriptor was new.
    pub fn register_binding(&mut self, descriptor: BindingDescriptor) -> bool {
        let by_tag = self
            .patterns
            .entry(descriptor.pattern().as_str().to_owned())
            .or_default();
        if by_tag
            .values()
            .flatten()
            .any(|existing| existing.is_same_declaration(&descriptor))
        {
            trace!(
                pattern = %descriptor.pattern(),
                location = %descriptor.location(),
                "binding already registered; ignoring duplicate declaration",
            );
            return false;
        }

        let descriptor = Arc::new(descriptor);
        by_tag
            .entry(descriptor.tag().as_str().to_owned())
            .or_default()
            .push(Arc::clone(&descriptor));
        self.owners
            .entry(descriptor.owner())
            .or_default()
            .descriptors
            .push(Arc::clone(&descriptor));

        debug!(
            kind = %descriptor.kind(),
            pattern = %descriptor.pattern(),
            tag = %descriptor.tag(),
            owner = %descriptor.owner(),
            location = %descriptor.location(),
            "registered binding",
        );
        true
    }

    /// Record the context types `owner` needs activated before it, in
    /// constructor order. Replaces any earlier list for `owner`.
    pub fn register_required_context_types(&mut self, owner: TypeHandle, types: Vec<TypeHandle>) {
        debug!(owner = %owner, count = types.len(), "registered context types");
        self.owners.entry(owner).or_default().context_types = types;
    }

    /// Every step and hook declared directly on `owner`, in registration
    /// order.
    #[must_use]
    pub fn descriptors_for_owner(&self, owner: TypeHandle) -> &[Arc<BindingDescriptor>] {
        self.owners
            .get(&owner)
            .map(|entry| entry.descriptors.as_slice())
            .unwrap_or_default()
    }

    /// The context types `owner` requires; empty when none were registered.
    #[must_use]
    pub fn context_types_for_owner(&self, owner: TypeHandle) -> &[TypeHandle] {
        self.owners
            .get(&owner)
            .map(|entry| entry.context_types.as_slice())
            .unwrap_or_default()
    }

    /// Descriptors registered for `pattern` under the active `tags`.
    ///
    /// The descriptors of every active tag are combined, each declaration at
    /// most once. When no active tag has a descriptor, the wildcard-tag
    /// descriptors are returned instead; tagged and wildcard descriptors are
    /// never mixed.
    #[must_use]
    pub fn lookup(&self, pattern: &str, tags: &[Tag]) -> Vec<&BindingDescriptor> {
        self.lookup_where(pattern, tags, |_| true)
    }

    /// As [`Self::lookup`], considering step descriptors only.
    ///
    /// Hooks sit under the wildcard pattern; restricting before the
    /// wildcard fallback keeps a tagged hook from shadowing a wildcard step
    /// declared with that same pattern.
    #[must_use]
    pub fn lookup_steps(&self, pattern: &str, tags: &[Tag]) -> Vec<&BindingDescriptor> {
        self.lookup_where(pattern, tags, |descriptor| descriptor.kind().is_step())
    }

    fn lookup_where<F>(&self, pattern: &str, tags: &[Tag], keep: F) -> Vec<&BindingDescriptor>
    where
        F: Fn(&BindingDescriptor) -> bool,
    {
        let Some(by_tag) = self.patterns.get(pattern) else {
            return Vec::new();
        };
        let mut matched: Vec<&Arc<BindingDescriptor>> = Vec::new();
        for descriptor in tags
            .iter()
            .filter_map(|tag| by_tag.get(tag.as_str()))
            .flatten()
            .filter(|descriptor| keep(descriptor))
        {
            if !matched.iter().any(|seen| Arc::ptr_eq(seen, descriptor)) {
                matched.push(descriptor);
            }
        }
        if matched.is_empty() {
            matched.extend(
                by_tag
                    .get(WILDCARD_TAG)
                    .into_iter()
                    .flatten()
                    .filter(|descriptor| keep(descriptor)),
            );
        }
        matched.into_iter().map(|descriptor| &**descriptor).collect()
    }

    /// Hooks of `kind`, grouped by owner in the order owners were first
    /// registered, then in declaration order.
    pub fn hooks(&self, kind: BindingKind) -> impl Iterator<Item = &BindingDescriptor> + '_ {
        self.owners
            .values()
            .flat_map(|entry| entry.descriptors.iter())
            .filter(move |descriptor| descriptor.kind() == kind)
            .map(|descriptor| &**descriptor)
    }

    /// Each distinct step pattern with the keywords declared for it.
    ///
    /// A host framework registers one matcher per pattern and keyword from
    /// this list and routes every match back through the resolver.
    #[must_use]
    pub fn step_patterns(&self) -> Vec<PatternSummary<'_>> {
        self.patterns
            .iter()
            .filter_map(|(pattern, by_tag)| {
                let mut kinds = Vec::new();
                for descriptor in by_tag.values().flatten() {
                    let kind = descriptor.kind();
                    if kind.is_step() && !kinds.contains(&kind) {
                        kinds.push(kind);
                    }
                }
                (!kinds.is_empty()).then_some(PatternSummary {
                    pattern: pattern.as_str(),
                    kinds,
                })
            })
            .collect()
    }

    /// Number of distinct declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners
            .values()
            .map(|entry| entry.descriptors.len())
            .sum()
    }

    /// Whether nothing has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
