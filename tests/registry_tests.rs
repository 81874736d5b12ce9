//! Registration behaviour of the sample login domain.

use rstest::{fixture, rstest};
use stepbind::binding::{BindingKind, TypeHandle, tags};
use stepbind::registry::Registry;
use test_support::bindings::{AuthSteps, Database, Session, register_auth, register_calculator};

#[fixture]
fn registry() -> Registry {
    let mut registry = Registry::new();
    register_auth(&mut registry);
    registry
}

#[rstest]
fn registering_twice_keeps_one_descriptor_per_declaration(mut registry: Registry) {
    let owner = TypeHandle::of::<AuthSteps>();
    let declared = registry.descriptors_for_owner(owner).len();
    register_auth(&mut registry);
    register_auth(&mut registry);
    assert_eq!(registry.descriptors_for_owner(owner).len(), declared);
    assert_eq!(registry.lookup("I am logged in", &[]).len(), 1);
    assert_eq!(registry.lookup("I am logged in", &tags(["@auth"])).len(), 1);
    assert_eq!(
        registry.context_types_for_owner(TypeHandle::of::<Session>()),
        [TypeHandle::of::<Database>()]
    );
}

#[rstest]
fn owner_index_lists_steps_and_hooks_in_declaration_order(registry: Registry) {
    let kinds: Vec<BindingKind> = registry
        .descriptors_for_owner(TypeHandle::of::<AuthSteps>())
        .iter()
        .map(|descriptor| descriptor.kind())
        .collect();
    assert_eq!(
        kinds,
        [
            BindingKind::Given,
            BindingKind::Given,
            BindingKind::Then,
            BindingKind::Before,
            BindingKind::Before,
            BindingKind::After,
            BindingKind::After,
            BindingKind::BeforeAll,
            BindingKind::AfterAll,
        ]
    );
}

#[rstest]
fn step_patterns_cover_every_owner(mut registry: Registry) {
    register_calculator(&mut registry);
    let patterns: Vec<&str> = registry
        .step_patterns()
        .into_iter()
        .map(|summary| summary.pattern)
        .collect();
    assert_eq!(
        patterns,
        [
            "I am logged in",
            "the user is {word}",
            "I add {int}",
            "I add {int} and {int}",
            "the total is {int}",
        ]
    );
}

#[rstest]
fn descriptors_carry_handler_arity(mut registry: Registry) {
    register_calculator(&mut registry);
    let arities: Vec<usize> = ["I add {int}", "I add {int} and {int}", "the user is {word}"]
        .iter()
        .map(|pattern| registry.lookup(pattern, &[])[0].arity())
        .collect();
    assert_eq!(arities, [1, 2, 1]);
}
