//! `ObservableList<T>` — a sequence that reports element-level edits.

use std::any::Any;
use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::hub::Message;
use crate::runtime::{Source, SourceKey};
use crate::{SignalError, SignalHub, SignalResult, SignalType};

pub(crate) struct ListInner<T> {
    key:   SourceKey,
    name:  String,
    hub:   SignalHub,
    items: RefCell<Vec<T>>,
}

/// A list attribute.
///
/// Whole-list assignment emits `change`; the element operations emit
/// `append`, `insert`, `remove` and `replace` with the affected element and
/// its index.  A Computed that reads the list is invalidated by all of them.
pub struct ObservableList<T> {
    inner: Rc<ListInner<T>>,
}

impl<T> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<T: Clone + PartialEq + 'static> ObservableList<T> {
    pub const SIGNALS: &'static [SignalType] = &[
        SignalType::Change,
        SignalType::Append,
        SignalType::Insert,
        SignalType::Remove,
        SignalType::Replace,
    ];

    pub(crate) fn new(hub: SignalHub, name: &str, initial: Vec<T>) -> Self {
        Self {
            inner: Rc::new(ListInner {
                key:   hub.runtime().next_key(),
                name:  name.to_owned(),
                hub,
                items: RefCell::new(initial),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// A copy of the whole list.  Tracked.
    pub fn get(&self) -> Vec<T> {
        let items = self.peek();
        self.track(&items);
        items
    }

    /// Borrow the list.  Tracked.  Mutating this list from inside `f` fails
    /// with [`SignalError::Borrowed`].
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        let items = self.inner.items.borrow();
        if self.inner.hub.runtime().is_tracking() {
            self.track(&items);
        }
        f(&items)
    }

    /// Untracked copy.
    pub fn peek(&self) -> Vec<T> {
        self.inner.items.borrow().clone()
    }

    /// Tracked.
    pub fn len(&self) -> usize {
        self.with(<[T]>::len)
    }

    /// Tracked.
    pub fn is_empty(&self) -> bool {
        self.with(<[T]>::is_empty)
    }

    // ── Mutation ────────────────────────────────────────────────────────

    /// Replace the whole list and emit `change`.
    pub fn set(&self, items: Vec<T>) -> SignalResult<()> {
        self.check_write()?;
        let old = std::mem::replace(&mut *self.items_mut()?, items);
        let new = self.peek();
        self.inner.hub.notify(&self.inner.name, SignalType::Change, Some(&old), Some(&new));
        Ok(())
    }

    pub fn push(&self, item: T) -> SignalResult<()> {
        self.check_write()?;
        let index = {
            let mut items = self.items_mut()?;
            items.push(item.clone());
            items.len() - 1
        };
        self.emit(SignalType::Append, index, None, Some(&item));
        Ok(())
    }

    /// # Errors
    ///
    /// [`SignalError::IndexOutOfRange`] if `index > len`.
    pub fn insert(&self, index: usize, item: T) -> SignalResult<()> {
        self.check_write()?;
        {
            let mut items = self.items_mut()?;
            if index > items.len() {
                return Err(self.out_of_range(index, items.len()));
            }
            items.insert(index, item.clone());
        }
        self.emit(SignalType::Insert, index, None, Some(&item));
        Ok(())
    }

    /// Remove and return the element at `index`.
    pub fn remove(&self, index: usize) -> SignalResult<T> {
        self.check_write()?;
        let removed = {
            let mut items = self.items_mut()?;
            if index >= items.len() {
                return Err(self.out_of_range(index, items.len()));
            }
            items.remove(index)
        };
        self.emit(SignalType::Remove, index, Some(&removed), None);
        Ok(removed)
    }

    /// Overwrite the element at `index` and return the old one.
    pub fn replace(&self, index: usize, item: T) -> SignalResult<T> {
        self.check_write()?;
        let old = {
            let mut items = self.items_mut()?;
            let len = items.len();
            let slot = items.get_mut(index).ok_or_else(|| self.out_of_range(index, len))?;
            std::mem::replace(slot, item.clone())
        };
        self.emit(SignalType::Replace, index, Some(&old), Some(&item));
        Ok(old)
    }

    fn emit(&self, signal: SignalType, index: usize, old: Option<&T>, new: Option<&T>) {
        let inner = &self.inner;
        let message = Message::new(
            inner.hub.owner(),
            &inner.name,
            signal,
            old.map(|v| v as &dyn Any),
            new.map(|v| v as &dyn Any),
        )
        .at(index);
        inner.hub.emit(message);
    }

    fn label(&self) -> String {
        format!("{}.{}", self.inner.hub.owner(), self.inner.name)
    }

    fn items_mut(&self) -> SignalResult<RefMut<'_, Vec<T>>> {
        self.inner.items.try_borrow_mut().map_err(|_| SignalError::Borrowed(self.label()))
    }

    fn check_write(&self) -> SignalResult<()> {
        self.inner.hub.runtime().check_write(self.inner.key, &self.label())
    }

    fn out_of_range(&self, index: usize, len: usize) -> SignalError {
        SignalError::IndexOutOfRange { observable: self.label(), index, len }
    }

    fn track(&self, items: &[T]) {
        let source: Rc<dyn Source> = self.inner.clone();
        self.inner.hub.runtime().track(source, || Box::new(items.to_vec()));
    }
}

impl<T: Clone + PartialEq + 'static> Source for ListInner<T> {
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
        Ok(seen
            .downcast_ref::<Vec<T>>()
            .is_none_or(|seen| *seen != *self.items.borrow()))
    }

    fn depends_on(&self, key: SourceKey) -> bool {
        self.key == key
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableList")
            .field("name", &self.inner.name)
            .field("items", &self.inner.items.borrow())
            .finish()
    }
}
