//! Activation and teardown of the sample login domain.

use std::rc::Rc;

use rstest::{fixture, rstest};
use stepbind::error::BindingError;
use stepbind::registry::Registry;
use stepbind::scenario::{Lifecycle, ScenarioContext, ScenarioInfo};
use test_support::bindings::{
    AuthSteps, Chicken, Database, Session, register_auth, register_broken, register_cycle,
};
use test_support::{display_error_chain, ledger};

#[fixture]
fn registry() -> Registry {
    let mut registry = Registry::new();
    register_auth(&mut registry);
    register_broken(&mut registry);
    register_cycle(&mut registry);
    registry
}

fn context(title: &str) -> ScenarioContext {
    ScenarioContext::new(ScenarioInfo::new(title, Vec::new()))
}

#[rstest]
fn context_types_are_activated_first_and_once(registry: Registry) {
    ledger::reset();
    let mut ctx = context("login");
    let steps = ctx.get_or_activate::<AuthSteps>(&registry).expect("steps");
    let session = ctx.get_or_activate::<Session>(&registry).expect("session");
    let database = ctx.get_or_activate::<Database>(&registry).expect("database");

    assert!(Rc::ptr_eq(&steps.borrow().session, &session));
    assert!(Rc::ptr_eq(&session.borrow().database, &database));
    assert_eq!(
        ledger::take(),
        [
            "Database::activate",
            "Session::activate",
            "AuthSteps::activate"
        ]
    );
}

#[rstest]
fn separate_scenarios_get_separate_instances(registry: Registry) {
    let mut first = context("first");
    let mut second = context("second");
    let a = first.get_or_activate::<Session>(&registry).expect("first");
    let b = second.get_or_activate::<Session>(&registry).expect("second");
    assert!(!Rc::ptr_eq(&a, &b));
    assert!(!Rc::ptr_eq(&a.borrow().database, &b.borrow().database));
}

#[rstest]
fn disposal_runs_each_teardown_once(registry: Registry) {
    ledger::reset();
    let mut ctx = context("teardown");
    for _ in 0..3 {
        ctx.get_or_activate::<AuthSteps>(&registry).expect("steps");
        ctx.get_or_activate::<Session>(&registry).expect("session");
    }
    ledger::reset();

    assert_eq!(ctx.dispose().expect("dispose"), 2);
    assert_eq!(ledger::take(), ["Session::dispose", "Database::dispose"]);
    assert_eq!(ctx.state(), Lifecycle::Disposed);

    drop(ctx);
    assert!(ledger::take().is_empty());
}

#[rstest]
fn drop_disposes_an_active_context(registry: Registry) {
    ledger::reset();
    let mut ctx = context("dropped");
    ctx.get_or_activate::<Database>(&registry).expect("database");
    drop(ctx);
    assert_eq!(ledger::count("Database::dispose"), 1);
}

#[rstest]
fn use_after_disposal_is_an_error(registry: Registry) {
    let mut ctx = context("finished");
    ctx.dispose().expect("dispose");
    let err = ctx
        .get_or_activate::<Session>(&registry)
        .err()
        .expect("context is terminal");
    assert_eq!(err.to_string(), "scenario 'finished' was used after teardown");
}

#[rstest]
fn mutual_context_types_are_a_cycle(registry: Registry) {
    let mut ctx = context("cycle");
    let err = ctx
        .get_or_activate::<Chicken>(&registry)
        .err()
        .expect("cycle");
    let BindingError::DependencyCycle { cycle } = &err else {
        panic!("expected DependencyCycle, got {err:?}");
    };
    let short: Vec<&str> = cycle
        .iter()
        .map(|name| name.rsplit("::").next().unwrap_or_default())
        .collect();
    assert_eq!(short, ["Chicken", "Egg", "Chicken"]);
    assert_eq!(ctx.active_count(), 0);
}

#[rstest]
fn factory_failure_keeps_its_cause(registry: Registry) {
    let mut ctx = context("broken");
    let err = ctx
        .get_or_activate::<test_support::bindings::Broken>(&registry)
        .err()
        .expect("factory fails");
    assert!(matches!(err, BindingError::ActivationFailed { .. }));
    assert!(display_error_chain(&err).ends_with(": no connection available"));
}
