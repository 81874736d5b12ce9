//! Capabilities activated types expose to the activator.

use std::any::{Any, type_name};
use std::cell::RefCell;
use std::rc::Rc;

use crate::binding::TypeHandle;
use crate::error::BindingError;

/// A type the activator can construct once per scenario.
///
/// The factory receives the already-activated context instances the type
/// declared with [`crate::registry::BindingBuilder::context`], in declared
/// order.
///
/// # Examples
/// ```rust
/// use stepbind::scenario::{Activate, ContextArgs};
///
/// #[derive(Default)]
/// struct Session {
///     user: Option<String>,
/// }
///
/// impl Activate for Session {
///     fn activate(_: &ContextArgs) -> anyhow::Result<Self> {
///         Ok(Self::default())
///     }
/// }
/// ```
pub trait Activate: Sized + 'static {
    /// Build the instance from its activated context objects.
    ///
    /// # Errors
    ///
    /// Returns any error that prevents construction; it is reported as
    /// [`BindingError::ActivationFailed`].
    fn activate(context: &ContextArgs) -> anyhow::Result<Self>;

    /// The teardown capability, when the type has one.
    ///
    /// Types implementing [`Disposable`] override this to return
    /// `Some(self)`.
    fn as_disposable(&mut self) -> Option<&mut dyn Disposable> {
        None
    }
}

/// Teardown run once when the owning scenario ends.
pub trait Disposable {
    /// Release whatever the instance holds.
    fn dispose(&mut self);
}

/// The ordered context instances handed to [`Activate::activate`].
#[derive(Debug)]
pub struct ContextArgs {
    owner: &'static str,
    entries: Vec<(TypeHandle, Rc<dyn Any>)>,
}

impl ContextArgs {
    pub(crate) fn with_capacity(owner: &'static str, capacity: usize) -> Self {
        Self {
            owner,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, handle: TypeHandle, instance: Rc<dyn Any>) {
        self.entries.push((handle, instance));
    }

    /// Number of context instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no context instances were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The context types, in declared order.
    pub fn types(&self) -> impl Iterator<Item = TypeHandle> + '_ {
        self.entries.iter().map(|(handle, _)| *handle)
    }

    /// The first context instance of type `C`.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::ContextUnavailable`] when no context of that
    /// type was supplied.
    pub fn get<C: 'static>(&self) -> Result<Rc<RefCell<C>>, BindingError> {
        self.entries
            .iter()
            .find(|(handle, _)| handle.is::<C>())
            .and_then(|(_, instance)| Rc::clone(instance).downcast::<RefCell<C>>().ok())
            .ok_or_else(|| self.unavailable::<C>())
    }

    /// The context instance at `index`, which must be of type `C`.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::ContextUnavailable`] when the index is out of
    /// range or holds a different type.
    pub fn nth<C: 'static>(&self, index: usize) -> Result<Rc<RefCell<C>>, BindingError> {
        self.entries
            .get(index)
            .and_then(|(_, instance)| Rc::clone(instance).downcast::<RefCell<C>>().ok())
            .ok_or_else(|| self.unavailable::<C>())
    }

    fn unavailable<C>(&self) -> BindingError {
        BindingError::ContextUnavailable {
            owner: self.owner,
            requested: type_name::<C>(),
        }
    }
}
