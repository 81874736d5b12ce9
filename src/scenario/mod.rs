//! Per-scenario state: metadata and the cache of activated objects.
//!
//! A [`ScenarioContext`] is created when a scenario starts, fills lazily as
//! steps and hooks need their owning objects, and is disposed exactly once
//! when the scenario ends. It holds `Rc` handles and is therefore confined to
//! the thread running the scenario; concurrent scenarios each get their own.

mod activator;
mod capability;


pub use capability::{Activate, ContextArgs, Disposable};

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::binding::{Tag, Teardown, TypeHandle};
use crate::error::BindingError;
use crate::registry::Registry;

/// Title and tags of a running scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioInfo {
    title: String,
    tags: Vec<Tag>,
}

impl ScenarioInfo {
    /// Describe a scenario.
    #[must_use]
    pub fn new(title: impl Into<String>, tags: Vec<Tag>) -> Self {
        Self {
            title: title.into(),
            tags,
        }
    }

    /// Scenario title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Tags in scope for the scenario, in the order the framework gave them.
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Whether the scenario carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }
}

/// Where a [`ScenarioContext`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Nothing activated yet.
    Created,
    /// At least one activation happened.
    Active,
    /// Torn down; terminal.
    Disposed,
}

/// Scenario metadata plus the objects activated for it.
#[derive(Debug)]
pub struct ScenarioContext {
    info: ScenarioInfo,
    state: Lifecycle,
    active: IndexMap<TypeHandle, Rc<dyn Any>>,
    under_construction: Vec<TypeHandle>,
}

impl ScenarioContext {
    /// Start a context for a scenario.
    #[must_use]
    pub fn new(info: ScenarioInfo) -> Self {
        Self {
            info,
            state: Lifecycle::Created,
            active: IndexMap::new(),
            under_construction: Vec::new(),
        }
    }

    /// Scenario metadata.
    #[must_use]
    pub const fn info(&self) -> &ScenarioInfo {
        &self.info
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> Lifecycle {
        self.state
    }

    /// Number of activated objects.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Whether an instance of `handle` has been activated.
    #[must_use]
    pub fn is_activated(&self, handle: TypeHandle) -> bool {
        self.active.contains_key(&handle)
    }

    /// The scenario's instance of `T`, activating it (and its context types)
    /// on first use.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::PostDisposalUse`] after teardown,
    /// [`BindingError::DependencyCycle`] when the context types of `T`
    /// require `T` again, and any error raised by a factory.
    pub fn get_or_activate<T: Activate>(
        &mut self,
        registry: &Registry,
    ) -> Result<Rc<RefCell<T>>, BindingError> {
        let handle = TypeHandle::of::<T>();
        self.get_or_activate_handle(registry, handle)?
            .downcast::<RefCell<T>>()
            .map_err(|_| BindingError::InstanceUnavailable {
                owner: handle.name(),
                reason: "activated instance has a different type",
            })
    }

    /// Type-erased form of [`Self::get_or_activate`]; the returned value is
    /// an `Rc<RefCell<T>>` for the type `handle` identifies.
    ///
    /// # Errors
    ///
    /// As for [`Self::get_or_activate`].
    pub fn get_or_activate_handle(
        &mut self,
        registry: &Registry,
        handle: TypeHandle,
    ) -> Result<Rc<dyn Any>, BindingError> {
        self.ensure_live()?;
        self.activate(registry, handle)
    }

    /// Tear down every activated object that exposes [`Disposable`], once,
    /// in reverse activation order. Returns how many were disposed.
    ///
    /// An object still borrowed elsewhere cannot be torn down. It stays in
    /// the context and is torn down when the context is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::PostDisposalUse`] when the context was
    /// already disposed and [`BindingError::TeardownIncomplete`] when some
    /// objects were still borrowed.
    pub fn dispose(&mut self) -> Result<usize, BindingError> {
        self.ensure_live()?;
        self.teardown_all()
    }

    pub(crate) fn ensure_live(&self) -> Result<(), BindingError> {
        if self.state == Lifecycle::Disposed {
            return Err(BindingError::PostDisposalUse {
                scenario: self.info.title.clone(),
            });
        }
        Ok(())
    }

    fn teardown_all(&mut self) -> Result<usize, BindingError> {
        self.state = Lifecycle::Disposed;
        let mut disposed = 0;
        let mut busy = IndexMap::new();
        for (handle, instance) in self.active.drain(..).rev() {
            match handle.teardown(&*instance) {
                Teardown::Disposed => disposed += 1,
                Teardown::NotDisposable => {}
                Teardown::Busy => {
                    busy.insert(handle, instance);
                }
            }
        }
        debug!(scenario = %self.info.title, disposed, "scenario context disposed");
        if busy.is_empty() {
            return Ok(disposed);
        }
        let owners: Vec<&'static str> = busy.keys().map(TypeHandle::name).collect();
        warn!(
            scenario = %self.info.title,
            owners = ?owners,
            "deferring teardown of instances that are still borrowed",
        );
        // Kept in teardown order for the retry on drop.
        self.active = busy;
        Err(BindingError::TeardownIncomplete {
            scenario: self.info.title.clone(),
            owners,
            disposed,
        })
    }

    fn retry_deferred(&mut self) {
        for (handle, instance) in self.active.drain(..) {
            if handle.teardown(&*instance) == Teardown::Busy {
                warn!(
                    scenario = %self.info.title,
                    owner = %handle,
                    "instance still borrowed when the scenario context was dropped",
                );
            }
        }
    }
}

impl Drop for ScenarioContext {
    fn drop(&mut self) {
        if self.state != Lifecycle::Disposed {
            if let Err(err) = self.teardown_all() {
                warn!(error = %err, "scenario context dropped with borrowed instances");
            }
        } else if !self.active.is_empty() {
            self.retry_deferred();
        }
    }
}
