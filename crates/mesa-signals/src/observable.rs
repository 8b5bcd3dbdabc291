//! `Observable<T>` — an attribute that announces every assignment.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::runtime::{Source, SourceKey};
use crate::{SignalError, SignalHub, SignalResult, SignalType};

pub(crate) struct ObservableInner<T> {
    key:   SourceKey,
    name:  String,
    hub:   SignalHub,
    value: RefCell<T>,
}

/// A value that emits a `change` signal each time it is set.
///
/// Cloning yields another handle to the same value.  Reads made while a
/// [`Computed`](crate::Computed) evaluates become dependencies of that
/// Computed.
pub struct Observable<T> {
    inner: Rc<ObservableInner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    pub const SIGNALS: &'static [SignalType] = &[SignalType::Change];

    pub(crate) fn new(hub: SignalHub, name: &str, initial: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                key:   hub.runtime().next_key(),
                name:  name.to_owned(),
                hub,
                value: RefCell::new(initial),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The current value.  Recorded as a dependency of the evaluating
    /// Computed, if any.
    pub fn get(&self) -> T {
        let value = self.peek();
        self.track(&value);
        value
    }

    /// Borrow the current value.  Tracked like [`get`](Self::get).
    ///
    /// Setting this observable from inside `f` fails with
    /// [`SignalError::Borrowed`](crate::SignalError::Borrowed).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.inner.value.borrow();
        if self.inner.hub.runtime().is_tracking() {
            self.track(&value);
        }
        f(&value)
    }

    /// The current value, never recorded as a dependency.
    pub fn peek(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Assign and emit `change`, even if the value is equal to the old one.
    ///
    /// # Errors
    ///
    /// [`SignalError::CyclicalDependency`](crate::SignalError::CyclicalDependency)
    /// if a Computed that is evaluating right now has already read this
    /// observable, or [`SignalError::Borrowed`](crate::SignalError::Borrowed)
    /// from inside [`with`](Self::with).  The value is left unchanged.
    pub fn set(&self, value: T) -> SignalResult<()> {
        let inner = &self.inner;
        inner.hub.runtime().check_write(inner.key, &self.label())?;

        let old = {
            let mut slot =
                inner.value.try_borrow_mut().map_err(|_| SignalError::Borrowed(self.label()))?;
            std::mem::replace(&mut *slot, value)
        };
        let new = self.peek();
        inner.hub.notify(&inner.name, SignalType::Change, Some(&old), Some(&new));
        Ok(())
    }

    /// `set(f(&current))`.  The read is not tracked.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> SignalResult<()> {
        let next = f(&self.inner.value.borrow());
        self.set(next)
    }

    fn label(&self) -> String {
        format!("{}.{}", self.inner.hub.owner(), self.inner.name)
    }

    fn track(&self, value: &T) {
        let source: Rc<dyn Source> = self.inner.clone();
        self.inner.hub.runtime().track(source, || Box::new(value.clone()));
    }
}

impl<T: Clone + PartialEq + 'static> Source for ObservableInner<T> {
    fn key(&self) -> SourceKey {
        self.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn hub(&self) -> &SignalHub {
        &self.hub
    }

    fn changed_since(&self, seen: &dyn Any) -> SignalResult<bool> {
        Ok(seen.downcast_ref::<T>().is_none_or(|seen| *seen != *self.value.borrow()))
    }

    fn depends_on(&self, key: SourceKey) -> bool {
        self.key == key
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("name", &self.inner.name)
            .field("value", &self.inner.value.borrow())
            .finish()
    }
}
