//! `Computed<T>` — a memoized value derived from other observables.
//!
//! # Evaluation
//!
//! ```text
//! get()
//!  ├─ clean                      → cached value
//!  └─ dirty
//!      ├─ never evaluated / last evaluation failed → run f
//!      ├─ every recorded dependency still equals its snapshot → cached value
//!      └─ otherwise: drop old subscriptions, run f with this Computed on the
//!                    evaluation stack, cache, emit `change` if different
//! ```
//!
//! A dependency that changes marks the Computed dirty and emits `change`
//! with no new value, so Computeds built on top of it go dirty too.  The
//! function itself only ever runs inside `get`.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::hub::Handler;
use crate::runtime::{Dependency, Source, SourceKey, Tracker};
use crate::{Message, SignalError, SignalHub, SignalResult, SignalType};

type ComputeFn<T> = Box<dyn Fn() -> SignalResult<T>>;

pub(crate) struct ComputedInner<T> {
    key:       SourceKey,
    name:      String,
    hub:       SignalHub,
    this:      Weak<ComputedInner<T>>,
    func:      ComputeFn<T>,
    value:     RefCell<Option<T>>,
    dirty:     Cell<bool>,
    /// Cleared when an evaluation fails so the next read runs `func` again.
    evaluated: Cell<bool>,
    running:   Cell<bool>,
    parents:   RefCell<Vec<Dependency>>,
    /// Subscribed to every dependency; marks this Computed dirty.
    on_parent_change: Handler,
}

/// A lazily evaluated, cached function of other observables.
///
/// Cloning yields another handle to the same Computed.
pub struct Computed<T> {
    inner: Rc<ComputedInner<T>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<T: Clone + PartialEq + 'static> Computed<T> {
    pub const SIGNALS: &'static [SignalType] = &[SignalType::Change];

    pub(crate) fn new<F>(hub: SignalHub, name: &str, f: F) -> Self
    where
        F: Fn() -> SignalResult<T> + 'static,
    {
        let key = hub.runtime().next_key();
        let inner = Rc::new_cyclic(|this: &Weak<ComputedInner<T>>| {
            let me = this.clone();
            let on_parent_change: Handler = Rc::new(move |_: &Message<'_>| {
                if let Some(me) = me.upgrade() {
                    me.mark_dirty();
                }
            });
            ComputedInner {
                key,
                name: name.to_owned(),
                hub,
                this: this.clone(),
                func: Box::new(f),
                value: RefCell::new(None),
                dirty: Cell::new(true),
                evaluated: Cell::new(false),
                running: Cell::new(false),
                parents: RefCell::new(Vec::new()),
                on_parent_change,
            }
        });
        Self { inner }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The current value, re-evaluating only if a dependency changed.
    /// Recorded as a dependency of the evaluating Computed, if any.
    ///
    /// # Errors
    ///
    /// Whatever the function returns, plus
    /// [`SignalError::CyclicalDependency`] if the function (transitively)
    /// reads this Computed.
    pub fn get(&self) -> SignalResult<T> {
        let value = self.inner.read()?;
        let source: Rc<dyn Source> = self.inner.clone();
        self.inner.hub.runtime().track(source, || Box::new(value.clone()));
        Ok(value)
    }

    /// `true` if a dependency changed since the last evaluation.
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    /// Number of dependencies recorded by the last evaluation.
    pub fn dependency_count(&self) -> usize {
        self.inner.parents.borrow().len()
    }
}

impl<T: Clone + PartialEq + 'static> ComputedInner<T> {
    fn label(&self) -> String {
        format!("{}.{}", self.hub.owner(), self.name)
    }

    /// Untracked read.
    fn read(&self) -> SignalResult<T> {
        if self.running.get() {
            let label = self.label();
            return Err(SignalError::CyclicalDependency { computed: label.clone(), observable: label });
        }

        if self.dirty.get() {
            let stale = !self.evaluated.get() || self.parents_changed()?;
            if stale {
                self.evaluate()?;
            } else {
                trace!(computed = %self.label(), "dependencies unchanged; cache reused");
            }
            self.dirty.set(false);
        }

        self.value
            .borrow()
            .clone()
            .ok_or_else(|| SignalError::Unevaluated(self.label()))
    }

    fn parents_changed(&self) -> SignalResult<bool> {
        let parents = self.parents.borrow();
        for dep in parents.iter() {
            // Dependencies that no longer exist cannot have changed.
            let Some(source) = dep.source.upgrade() else { continue };
            if source.changed_since(dep.seen.as_ref())? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn evaluate(&self) -> SignalResult<()> {
        let tracker: Rc<dyn Tracker> = self
            .this
            .upgrade()
            .ok_or_else(|| SignalError::Unevaluated(self.label()))?;

        for dep in self.parents.take() {
            dep.hub.unsubscribe_all(&dep.name, &self.on_parent_change);
        }

        trace!(computed = %self.label(), "evaluating");
        self.running.set(true);
        let result = {
            let _frame = self.hub.runtime().enter(tracker);
            (self.func)()
        };
        self.running.set(false);

        match result {
            Ok(new) => {
                self.evaluated.set(true);
                let old = self.value.replace(Some(new.clone()));
                if old.as_ref() != Some(&new) {
                    self.hub.notify(
                        &self.name,
                        SignalType::Change,
                        old.as_ref().map(|v| v as &dyn Any),
                        Some(&new),
                    );
                }
                Ok(())
            }
            Err(err) => {
                self.evaluated.set(false);
                Err(err)
            }
        }
    }

    fn mark_dirty(&self) {
        if self.dirty.replace(true) {
            return;
        }
        let cached = self.value.borrow().clone();
        self.hub.notify(
            &self.name,
            SignalType::Change,
            cached.as_ref().map(|v| v as &dyn Any),
            None,
        );
    }
}

impl<T: Clone + PartialEq + 'static> Tracker for ComputedInner<T> {
    fn record(&self, source: Rc<dyn Source>, seen: Box<dyn Any>) {
        let key = source.key();
        let mut parents = self.parents.borrow_mut();
        if parents.iter().any(|dep| dep.key == key) {
            return;
        }
        source.hub().subscribe_all(source.name(), &self.on_parent_change);
        parents.push(Dependency {
            key,
            name: source.name().to_owned(),
            hub: source.hub().clone(),
            source: Rc::downgrade(&source),
            seen,
        });
    }

    fn reads(&self, key: SourceKey) -> bool {
        self.parents.borrow().iter().any(|dep| {
            dep.key == key || dep.source.upgrade().is_some_and(|s| s.depends_on(key))
        })
    }

    fn label(&self) -> String {
        ComputedInner::label(self)
    }
}

impl<T: Clone + PartialEq + 'static> Source for ComputedInner<T> {
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
        let current = self.read()?;
        Ok(seen.downcast_ref::<T>().is_none_or(|seen| *seen != current))
    }

    fn depends_on(&self, key: SourceKey) -> bool {
        self.key == key || Tracker::reads(self, key)
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("name", &self.inner.name)
            .field("dirty", &self.inner.dirty.get())
            .field("value", &self.inner.value.borrow())
            .finish()
    }
}
