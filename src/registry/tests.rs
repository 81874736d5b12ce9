//! Unit tests for registration and lookup.

use super::*;
use crate::binding::{HookDef, StepDef, WILDCARD_PATTERN, tags};
use crate::scenario::ContextArgs;
use rstest::{fixture, rstest};

struct Steps;

struct Helper;

impl Activate for Steps {
    fn activate(_: &ContextArgs) -> anyhow::Result<Self> {
        Ok(Self)
    }
}

impl Activate for Helper {
    fn activate(_: &ContextArgs) -> anyhow::Result<Self> {
        Ok(Self)
    }
}

fn declare(registry: &mut Registry) {
    registry
        .binding::<Steps>()
        .context::<Helper>()
        .given("a step", |_: &mut Steps| {})
        .step(StepDef::given("a step").tagged("@slow"), |_: &mut Steps| {})
        .then("a result", |_: &mut Steps| {})
        .before(|_: &mut Steps| {})
        .hook(HookDef::after().tagged("@slow"), |_: &mut Steps| {});
}

#[fixture]
fn registry() -> Registry {
    let mut registry = Registry::new();
    declare(&mut registry);
    registry
}

fn tag_names(found: &[&BindingDescriptor]) -> Vec<String> {
    found
        .iter()
        .map(|descriptor| descriptor.tag().to_string())
        .collect()
}

#[rstest]
fn repeated_registration_is_idempotent(mut registry: Registry) {
    let before = registry.len();
    declare(&mut registry);
    assert_eq!(registry.len(), before);
    assert_eq!(registry.len(), 5);
    assert_eq!(
        registry
            .descriptors_for_owner(TypeHandle::of::<Steps>())
            .len(),
        5
    );
    assert_eq!(registry.lookup("a step", &[]).len(), 1);
    assert_eq!(registry.lookup("a step", &tags(["@slow"])).len(), 1);
    assert_eq!(
        registry.context_types_for_owner(TypeHandle::of::<Steps>()),
        [TypeHandle::of::<Helper>()]
    );
}

#[rstest]
fn register_binding_reports_duplicates(mut registry: Registry) {
    let existing = registry.lookup("a result", &[])[0].clone();
    assert!(!registry.register_binding(existing));
}

#[rstest]
#[case::no_tags(&[], &["*"])]
#[case::matching_tag(&["@slow"], &["@slow"])]
#[case::unrelated_tag(&["@fast"], &["*"])]
#[case::tag_order_ignored(&["@fast", "@slow"], &["@slow"])]
fn lookup_prefers_tagged_bindings(
    registry: Registry,
    #[case] active: &[&str],
    #[case] expected: &[&str],
) {
    let found = registry.lookup("a step", &tags(active.iter().copied()));
    assert_eq!(tag_names(&found), expected);
}

#[rstest]
fn lookup_unions_active_tags_without_repeats() {
    let mut registry = Registry::new();
    registry
        .binding::<Steps>()
        .step(StepDef::when("x").tagged("@a"), |_: &mut Steps| {})
        .step(StepDef::when("x").tagged("@b"), |_: &mut Steps| {})
        .when("x", |_: &mut Steps| {});
    let found = registry.lookup("x", &tags(["@b", "@a", "@b"]));
    assert_eq!(tag_names(&found), ["@b", "@a"]);
}

#[rstest]
fn unknown_pattern_yields_nothing(registry: Registry) {
    assert!(registry.lookup("missing", &tags(["@slow"])).is_empty());
}

#[rstest]
fn unknown_owner_has_empty_indices(registry: Registry) {
    let helper = TypeHandle::of::<Helper>();
    assert!(registry.descriptors_for_owner(helper).is_empty());
    assert!(registry.context_types_for_owner(helper).is_empty());
}

#[rstest]
fn context_types_last_write_wins(mut registry: Registry) {
    let owner = TypeHandle::of::<Steps>();
    registry.register_required_context_types(owner, Vec::new());
    assert!(registry.context_types_for_owner(owner).is_empty());
    registry.binding::<Steps>().context::<Helper>().context::<Helper>();
    assert_eq!(registry.context_types_for_owner(owner).len(), 1);
}

#[rstest]
fn hooks_are_indexed_under_the_wildcard_pattern(registry: Registry) {
    let before: Vec<_> = registry.hooks(BindingKind::Before).collect();
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].pattern().as_str(), WILDCARD_PATTERN);
    assert_eq!(registry.hooks(BindingKind::After).count(), 1);
    assert_eq!(registry.hooks(BindingKind::BeforeAll).count(), 0);
    assert_eq!(registry.lookup(WILDCARD_PATTERN, &[]).len(), 1);
}

#[rstest]
fn step_patterns_list_step_keywords_only(registry: Registry) {
    let patterns = registry.step_patterns();
    assert_eq!(
        patterns,
        [
            PatternSummary {
                pattern: "a step",
                kinds: vec![BindingKind::Given],
            },
            PatternSummary {
                pattern: "a result",
                kinds: vec![BindingKind::Then],
            },
        ]
    );
}

#[rstest]
fn descriptors_record_declaration_site(registry: Registry) {
    let found = registry.lookup("a result", &[]);
    let location = found[0].location();
    assert!(location.file().ends_with("tests.rs"));
    assert!(location.line() > 0);
    assert_eq!(found[0].arity(), 0);
    assert!(found[0].owner().is::<Steps>());
}

#[test]
fn new_registry_is_empty() {
    let registry = Registry::new();
    assert!(registry.is_empty());
    assert!(registry.step_patterns().is_empty());
}

#[rustfmt::skip]
fn declare_on_one_line(registry: &mut Registry) {
    registry.binding::<Steps>().before(|_: &mut Steps| {}).after(|_: &mut Steps| {}).before_all(|| {}).after_all(|| {});
}

#[test]
fn declarations_sharing_a_line_are_kept_apart() {
    let mut registry = Registry::new();
    declare_on_one_line(&mut registry);
    declare_on_one_line(&mut registry);
    assert_eq!(registry.len(), 4);
    for kind in [
        BindingKind::Before,
        BindingKind::After,
        BindingKind::BeforeAll,
        BindingKind::AfterAll,
    ] {
        assert_eq!(registry.hooks(kind).count(), 1, "{kind}");
    }
}

fn declare_tagged_variants(registry: &mut Registry) {
    let mut builder = registry.binding::<Steps>();
    for tag in ["@a", "@b"] {
        builder.step(StepDef::given("x").tagged(tag), |_: &mut Steps| {});
    }
}

#[test]
fn tagged_variants_from_one_call_site_are_distinct() {
    let mut registry = Registry::new();
    declare_tagged_variants(&mut registry);
    declare_tagged_variants(&mut registry);
    assert_eq!(registry.len(), 2);
    assert_eq!(tag_names(&registry.lookup("x", &tags(["@b"]))), ["@b"]);
    assert_eq!(tag_names(&registry.lookup("x", &tags(["@a"]))), ["@a"]);
}

#[rstest]
fn lookup_steps_ignores_hooks_before_falling_back() {
    let mut registry = Registry::new();
    registry
        .binding::<Steps>()
        .given(WILDCARD_PATTERN, |_: &mut Steps| {})
        .hook(HookDef::before().tagged("@slow"), |_: &mut Steps| {});
    let active = tags(["@slow"]);
    assert_eq!(tag_names(&registry.lookup(WILDCARD_PATTERN, &active)), ["@slow"]);
    assert_eq!(tag_names(&registry.lookup_steps(WILDCARD_PATTERN, &active)), ["*"]);
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn registry_can_be_shared_across_threads() {
    assert_send_sync::<Registry>();
}
