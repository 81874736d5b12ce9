//! Runtime identity of binding and context types.

use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::error::BindingError;
use crate::scenario::{Activate, ContextArgs};

/// Erased constructor producing an `Rc<RefCell<T>>` behind `dyn Any`.
pub(crate) type ConstructFn = fn(&ContextArgs) -> Result<Rc<dyn Any>, BindingError>;

/// Erased teardown for one activated instance.
pub(crate) type TeardownFn = fn(&(dyn Any + 'static)) -> Teardown;

/// What happened when an activated instance was offered for teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Teardown {
    Disposed,
    NotDisposable,
    Busy,
}

/// Identity of a type that can be activated in a scenario.
///
/// Equality and hashing use the [`TypeId`] only; the handle also carries the
/// monomorphised constructor and teardown for the type so the activator can
/// build context types it only knows by handle.
#[derive(Clone, Copy)]
pub struct TypeHandle {
    id: TypeId,
    name: &'static str,
    construct: ConstructFn,
    teardown: TeardownFn,
}

impl TypeHandle {
    /// The handle for `T`.
    #[must_use]
    pub fn of<T: Activate>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            construct: construct_erased::<T>,
            teardown: teardown_erased::<T>,
        }
    }

    /// The underlying type id.
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this handle identifies `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    pub(crate) fn construct(&self, args: &ContextArgs) -> Result<Rc<dyn Any>, BindingError> {
        (self.construct)(args)
    }

    pub(crate) fn teardown(&self, instance: &(dyn Any + 'static)) -> Teardown {
        (self.teardown)(instance)
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for TypeHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeHandle").field(&self.name).finish()
    }
}

impl Display for TypeHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

fn construct_erased<T: Activate>(args: &ContextArgs) -> Result<Rc<dyn Any>, BindingError> {
    let value = T::activate(args).map_err(|err| BindingError::ActivationFailed {
        type_name: type_name::<T>(),
        source: err.into(),
    })?;
    Ok(Rc::new(RefCell::new(value)))
}

fn teardown_erased<T: Activate>(instance: &(dyn Any + 'static)) -> Teardown {
    // Instances are keyed by the handle that built them.
    let Some(cell) = instance.downcast_ref::<RefCell<T>>() else {
        return Teardown::NotDisposable;
    };
    let Ok(mut value) = cell.try_borrow_mut() else {
        return Teardown::Busy;
    };
    match value.as_disposable() {
        Some(disposable) => {
            disposable.dispose();
            Teardown::Disposed
        }
        None => Teardown::NotDisposable,
    }
}
