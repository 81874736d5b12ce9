//! Typed handler adapters.
//!
//! A step handler is any `Fn(&mut T, A0, A1, ..)` whose arguments implement
//! [`FromStr`]; its arity is known at compile time and recorded on the
//! descriptor. Hooks take the instance and, optionally, the
//! [`ScenarioInfo`]. Global hooks take nothing.

use std::any::{Any, type_name};
use std::cell::{RefCell, RefMut};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use crate::scenario::ScenarioInfo;

/// Conversion of a handler's return value into a step outcome.
pub trait IntoStepResult {
    /// Convert into `Ok(())` or the failure to report.
    ///
    /// # Errors
    ///
    /// Returns the handler's own error.
    fn into_step_result(self) -> anyhow::Result<()>;
}

impl IntoStepResult for () {
    fn into_step_result(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<E> IntoStepResult for Result<(), E>
where
    E: Into<anyhow::Error>,
{
    fn into_step_result(self) -> anyhow::Result<()> {
        self.map_err(Into::into)
    }
}

/// Why calling a typed handler failed.
#[derive(Debug)]
pub enum CallError {
    /// A step argument did not parse into the parameter type.
    Argument {
        /// Zero-based argument position.
        index: usize,
        /// Raw argument text.
        value: String,
        /// Parameter type name.
        expected: &'static str,
        /// Parser message.
        reason: String,
    },
    /// The handler itself returned an error.
    Failed(anyhow::Error),
}

/// A function usable as a step handler on `T`.
///
/// Implemented for `Fn(&mut T, A0, .., An) -> R` with up to eight
/// arguments; `Args` is the tuple of argument types and only serves to keep
/// the implementations apart.
pub trait StepHandler<T, Args>: Send + Sync + 'static {
    /// Number of step arguments the handler takes.
    const ARITY: usize;

    /// Parse `args` and call the handler.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Argument`] when an argument fails to parse and
    /// [`CallError::Failed`] when the handler fails.
    fn call(&self, target: &mut T, args: &[&str]) -> Result<(), CallError>;
}

fn parse_arg<A>(args: &[&str], index: usize) -> Result<A, CallError>
where
    A: FromStr,
    A::Err: Display,
{
    let raw = args.get(index).copied().ok_or_else(|| CallError::Argument {
        index,
        value: String::new(),
        expected: type_name::<A>(),
        reason: "argument missing".to_owned(),
    })?;
    raw.parse::<A>().map_err(|err| CallError::Argument {
        index,
        value: raw.to_owned(),
        expected: type_name::<A>(),
        reason: err.to_string(),
    })
}

macro_rules! impl_step_handler {
    ($arity:expr; $($arg:ident => $idx:tt),*) => {
        impl<T, F, R, $($arg,)*> StepHandler<T, ($($arg,)*)> for F
        where
            T: 'static,
            F: Fn(&mut T, $($arg),*) -> R + Send + Sync + 'static,
            R: IntoStepResult,
            $($arg: FromStr + 'static, <$arg as FromStr>::Err: Display,)*
        {
            const ARITY: usize = $arity;

            #[allow(
                clippy::allow_attributes,
                unused_variables,
                reason = "zero-argument handlers ignore `args`"
            )]
            fn call(&self, target: &mut T, args: &[&str]) -> Result<(), CallError> {
                (self)(target, $(parse_arg::<$arg>(args, $idx)?),*)
                    .into_step_result()
                    .map_err(CallError::Failed)
            }
        }
    };
}

impl_step_handler!(0;);
impl_step_handler!(1; A0 => 0);
impl_step_handler!(2; A0 => 0, A1 => 1);
impl_step_handler!(3; A0 => 0, A1 => 1, A2 => 2);
impl_step_handler!(4; A0 => 0, A1 => 1, A2 => 2, A3 => 3);
impl_step_handler!(5; A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4);
impl_step_handler!(6; A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4, A5 => 5);
impl_step_handler!(7; A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4, A5 => 5, A6 => 6);
impl_step_handler!(8; A0 => 0, A1 => 1, A2 => 2, A3 => 3, A4 => 4, A5 => 5, A6 => 6, A7 => 7);

/// Marker for hooks that receive the scenario metadata.
#[derive(Debug)]
pub struct WithScenario;

/// A function usable as a Before/After hook on `T`.
///
/// Implemented for `Fn(&mut T) -> R` and `Fn(&mut T, &ScenarioInfo) -> R`.
pub trait HookHandler<T, Marker>: Send + Sync + 'static {
    /// Number of parameters after the instance.
    const ARITY: usize;

    /// Call the hook.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Failed`] when the hook fails.
    fn call(&self, target: &mut T, scenario: &ScenarioInfo) -> Result<(), CallError>;
}

impl<T, F, R> HookHandler<T, ()> for F
where
    T: 'static,
    F: Fn(&mut T) -> R + Send + Sync + 'static,
    R: IntoStepResult,
{
    const ARITY: usize = 0;

    fn call(&self, target: &mut T, _scenario: &ScenarioInfo) -> Result<(), CallError> {
        (self)(target).into_step_result().map_err(CallError::Failed)
    }
}

impl<T, F, R> HookHandler<T, (WithScenario,)> for F
where
    T: 'static,
    F: Fn(&mut T, &ScenarioInfo) -> R + Send + Sync + 'static,
    R: IntoStepResult,
{
    const ARITY: usize = 1;

    fn call(&self, target: &mut T, scenario: &ScenarioInfo) -> Result<(), CallError> {
        (self)(target, scenario)
            .into_step_result()
            .map_err(CallError::Failed)
    }
}

/// Failure of an erased invocation.
#[derive(Debug)]
pub(crate) enum InvokeError {
    Call(CallError),
    Unavailable(&'static str),
}

type StepFn = dyn Fn(&(dyn Any + 'static), &[&str]) -> Result<(), InvokeError> + Send + Sync;
type HookFn =
    dyn Fn(&(dyn Any + 'static), &ScenarioInfo) -> Result<(), InvokeError> + Send + Sync;
type GlobalFn = dyn Fn() -> anyhow::Result<()> + Send + Sync;

/// Type-erased callable stored on a descriptor.
#[derive(Clone)]
pub(crate) enum Invoker {
    Step(Arc<StepFn>),
    Hook(Arc<HookFn>),
    Global(Arc<GlobalFn>),
}

impl Invoker {
    pub(crate) fn step<T, M, H>(handler: H) -> Self
    where
        T: 'static,
        M: 'static,
        H: StepHandler<T, M>,
    {
        Self::Step(Arc::new(
            move |target: &(dyn Any + 'static), args: &[&str]| {
                let mut this = borrow_target::<T>(target)?;
                handler.call(&mut this, args).map_err(InvokeError::Call)
            },
        ))
    }

    pub(crate) fn hook<T, M, H>(handler: H) -> Self
    where
        T: 'static,
        M: 'static,
        H: HookHandler<T, M>,
    {
        Self::Hook(Arc::new(
            move |target: &(dyn Any + 'static), scenario: &ScenarioInfo| {
                let mut this = borrow_target::<T>(target)?;
                handler.call(&mut this, scenario).map_err(InvokeError::Call)
            },
        ))
    }

    pub(crate) fn global<F, R>(handler: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoStepResult,
    {
        Self::Global(Arc::new(move || handler().into_step_result()))
    }
}

impl Invoker {
    pub(crate) fn call_step(
        &self,
        target: &(dyn Any + 'static),
        args: &[&str],
    ) -> Result<(), InvokeError> {
        match self {
            Self::Step(call) => call(target, args),
            Self::Hook(_) | Self::Global(_) => Err(InvokeError::Unavailable("binding is not a step")),
        }
    }

    pub(crate) fn call_hook(
        &self,
        target: &(dyn Any + 'static),
        scenario: &ScenarioInfo,
    ) -> Result<(), InvokeError> {
        match self {
            Self::Hook(call) => call(target, scenario),
            Self::Step(_) | Self::Global(_) => {
                Err(InvokeError::Unavailable("binding is not a scenario hook"))
            }
        }
    }

    pub(crate) fn call_global(&self) -> Result<(), InvokeError> {
        match self {
            Self::Global(call) => call().map_err(|err| InvokeError::Call(CallError::Failed(err))),
            Self::Step(_) | Self::Hook(_) => {
                Err(InvokeError::Unavailable("binding is not a global hook"))
            }
        }
    }
}

fn borrow_target<'a, T: 'static>(
    target: &'a (dyn Any + 'static),
) -> Result<RefMut<'a, T>, InvokeError> {
    let cell = target
        .downcast_ref::<RefCell<T>>()
        .ok_or(InvokeError::Unavailable("activated instance has a different type"))?;
    cell.try_borrow_mut()
        .map_err(|_| InvokeError::Unavailable("instance is already borrowed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrowed_target_is_unavailable() {
        let cell = RefCell::new(7_u32);
        let target: &(dyn Any + 'static) = &cell;
        *borrow_target::<u32>(target).expect("free cell") += 1;
        assert_eq!(*cell.borrow(), 8);

        let guard = cell.borrow();
        assert!(matches!(
            borrow_target::<u32>(target),
            Err(InvokeError::Unavailable("instance is already borrowed"))
        ));
        drop(guard);
        assert!(matches!(
            borrow_target::<String>(target),
            Err(InvokeError::Unavailable(_))
        ));
    }
}
