//! Sample binding and context types.
//!
//! The types form a small login domain:
//!
//! - [`Database`] is a disposable leaf context;
//! - [`Session`] needs a [`Database`] and is disposable;
//! - [`AuthSteps`] owns the login steps and needs a [`Session`].
//!
//! [`Calculator`] has no context types; [`Broken`] always fails to
//! activate; [`Chicken`] and [`Egg`] require each other.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{bail, ensure};
use stepbind::binding::{HookDef, StepDef};
use stepbind::registry::Registry;
use stepbind::scenario::{Activate, ContextArgs, Disposable, ScenarioInfo};

use crate::ledger::record;

/// Leaf context standing in for a connection.
#[derive(Debug, Default)]
pub struct Database {
    /// Statements issued through the connection.
    pub queries: Vec<String>,
}

impl Activate for Database {
    fn activate(_: &ContextArgs) -> anyhow::Result<Self> {
        record("Database::activate");
        Ok(Self::default())
    }

    fn as_disposable(&mut self) -> Option<&mut dyn Disposable> {
        Some(self)
    }
}

impl Disposable for Database {
    fn dispose(&mut self) {
        record("Database::dispose");
    }
}

/// Logged-in user state, backed by a [`Database`].
#[derive(Debug)]
pub struct Session {
    /// Current user, if any.
    pub user: Option<String>,
    /// The scenario's database.
    pub database: Rc<RefCell<Database>>,
}

impl Activate for Session {
    fn activate(context: &ContextArgs) -> anyhow::Result<Self> {
        record("Session::activate");
        Ok(Self {
            user: None,
            database: context.get::<Database>()?,
        })
    }

    fn as_disposable(&mut self) -> Option<&mut dyn Disposable> {
        Some(self)
    }
}

impl Disposable for Session {
    fn dispose(&mut self) {
        record("Session::dispose");
        self.user = None;
    }
}

/// Owner of the login steps and hooks.
#[derive(Debug)]
pub struct AuthSteps {
    /// The scenario's session.
    pub session: Rc<RefCell<Session>>,
}

impl Activate for AuthSteps {
    fn activate(context: &ContextArgs) -> anyhow::Result<Self> {
        record("AuthSteps::activate");
        Ok(Self {
            session: context.nth::<Session>(0)?,
        })
    }
}

impl AuthSteps {
    fn log_in(&self, user: &str) {
        let mut session = self.session.borrow_mut();
        session
            .database
            .borrow_mut()
            .queries
            .push(format!("login {user}"));
        session.user = Some(user.to_owned());
    }
}

/// Declare the login domain: a wildcard and an `@auth` variant of
/// `I am logged in`, a parameterised `Then`, and hooks of both scopes.
///
/// Calling it again registers nothing new.
pub fn register_auth(registry: &mut Registry) {
    registry.binding::<Session>().context::<Database>();
    registry
        .binding::<AuthSteps>()
        .context::<Session>()
        .given("I am logged in", |steps: &mut AuthSteps| {
            record("given:*");
            steps.log_in("guest");
        })
        .step(
            StepDef::given("I am logged in").tagged("@auth"),
            |steps: &mut AuthSteps| {
                record("given:@auth");
                steps.log_in("admin");
            },
        )
        .then("the user is {word}", |steps: &mut AuthSteps, name: String| {
            let user = steps.session.borrow().user.clone();
            ensure!(user.as_deref() == Some(name.as_str()), "logged in as {user:?}");
            Ok(())
        })
        .before(|_: &mut AuthSteps| record("before:*"))
        .hook(
            HookDef::before().tagged("@auth"),
            |_: &mut AuthSteps, info: &ScenarioInfo| {
                record(format!("before:@auth:{}", info.title()));
            },
        )
        .after(|_: &mut AuthSteps| record("after:*"))
        .hook(HookDef::after().tagged("@auth"), |_: &mut AuthSteps| {
            record("after:@auth");
        })
        .before_all(|| record("before_all"))
        .after_all(|| record("after_all"));
}

/// Declare an `@other` variant of `I am logged in`, owned by
/// [`Calculator`], which collides with `@auth` when both tags are active.
pub fn register_other_login(registry: &mut Registry) {
    registry.binding::<Calculator>().step(
        StepDef::given("I am logged in").tagged("@other"),
        |_: &mut Calculator| record("given:@other"),
    );
}

/// Context-free binding with arithmetic steps.
#[derive(Debug, Default)]
pub struct Calculator {
    /// Running total.
    pub total: i64,
}

impl Activate for Calculator {
    fn activate(_: &ContextArgs) -> anyhow::Result<Self> {
        record("Calculator::activate");
        Ok(Self::default())
    }
}

/// Declare `I add {int}`, `I add {int} and {int}` and `the total is {int}`.
pub fn register_calculator(registry: &mut Registry) {
    registry
        .binding::<Calculator>()
        .when("I add {int}", |calc: &mut Calculator, n: i64| calc.total += n)
        .when(
            "I add {int} and {int}",
            |calc: &mut Calculator, a: i64, b: i64| calc.total += a + b,
        )
        .then("the total is {int}", |calc: &mut Calculator, n: i64| {
            ensure!(calc.total == n, "total is {}", calc.total);
            Ok(())
        });
}

/// Binding whose factory always fails.
#[derive(Debug)]
pub struct Broken;

impl Activate for Broken {
    fn activate(_: &ContextArgs) -> anyhow::Result<Self> {
        bail!("no connection available")
    }
}

/// Declare `a broken step` on [`Broken`].
pub fn register_broken(registry: &mut Registry) {
    registry
        .binding::<Broken>()
        .given("a broken step", |_: &mut Broken| {});
}

/// Half of a context cycle; requires [`Egg`].
#[derive(Debug)]
pub struct Chicken;

/// Half of a context cycle; requires [`Chicken`].
#[derive(Debug)]
pub struct Egg;

impl Activate for Chicken {
    fn activate(_: &ContextArgs) -> anyhow::Result<Self> {
        Ok(Self)
    }
}

impl Activate for Egg {
    fn activate(_: &ContextArgs) -> anyhow::Result<Self> {
        Ok(Self)
    }
}

/// Make [`Chicken`] and [`Egg`] require each other and declare
/// `which came first` on [`Chicken`].
pub fn register_cycle(registry: &mut Registry) {
    registry.binding::<Egg>().context::<Chicken>();
    registry
        .binding::<Chicken>()
        .context::<Egg>()
        .given("which came first", |_: &mut Chicken| {});
}
