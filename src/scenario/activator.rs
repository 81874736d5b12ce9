//! Lazy, memoised construction of binding objects and their contexts.
//!
//! Activation is a depth-first walk over the required context types
//! recorded in the registry. Types currently being built sit on a stack; a
//! type seen again while still on the stack closes a dependency cycle.

use std::any::Any;
use std::rc::Rc;

use tracing::debug;

use super::{ContextArgs, Lifecycle, ScenarioContext};
use crate::binding::TypeHandle;
use crate::error::BindingError;
use crate::registry::Registry;

impl ScenarioContext {
    pub(super) fn activate(
        &mut self,
        registry: &Registry,
        handle: TypeHandle,
    ) -> Result<Rc<dyn Any>, BindingError> {
        if let Some(existing) = self.active.get(&handle) {
            return Ok(Rc::clone(existing));
        }
        if let Some(cycle) = self.cycle_through(handle) {
            return Err(BindingError::DependencyCycle { cycle });
        }

        self.state = Lifecycle::Active;
        self.under_construction.push(handle);
        let built = self.construct(registry, handle);
        self.under_construction.pop();
        let instance = built?;

        debug!(
            scenario = %self.info.title(),
            owner = %handle,
            "activated binding object",
        );
        self.active.insert(handle, Rc::clone(&instance));
        Ok(instance)
    }

    fn construct(
        &mut self,
        registry: &Registry,
        handle: TypeHandle,
    ) -> Result<Rc<dyn Any>, BindingError> {
        let required = registry.context_types_for_owner(handle);
        let mut args = ContextArgs::with_capacity(handle.name(), required.len());
        for context in required {
            let instance = self.activate(registry, *context)?;
            args.push(*context, instance);
        }
        handle.construct(&args)
    }

    /// The activation chain from the first visit of `handle` back to
    /// `handle`, if it is still under construction.
    fn cycle_through(&self, handle: TypeHandle) -> Option<Vec<&'static str>> {
        let start = self
            .under_construction
            .iter()
            .position(|pending| *pending == handle)?;
        let mut cycle: Vec<&'static str> = self
            .under_construction
            .iter()
            .skip(start)
            .map(TypeHandle::name)
            .collect();
        cycle.push(handle.name());
        Some(cycle)
    }
}
