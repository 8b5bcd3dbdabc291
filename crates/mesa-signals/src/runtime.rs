//! `Signals` — the evaluation context shared by every owner of one model.
//!
//! While a [`Computed`](crate::Computed) runs its function it sits on top of
//! the evaluation stack; every observable read during that time is recorded
//! as one of its dependencies.  An `untracked` frame masks the stack so reads
//! inside it are not recorded.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::{SignalError, SignalHub, SignalResult};

pub(crate) type SourceKey = u64;

// ── Internal seams ────────────────────────────────────────────────────────────

/// Anything a Computed can depend on.
pub(crate) trait Source {
    fn key(&self) -> SourceKey;
    fn name(&self) -> &str;
    fn hub(&self) -> &SignalHub;

    /// Whether the current value differs from the snapshot taken when the
    /// dependency was recorded.  A Computed source may re-evaluate here.
    fn changed_since(&self, seen: &dyn Any) -> SignalResult<bool>;

    /// `true` if this source is `key`, or was computed from it.
    fn depends_on(&self, key: SourceKey) -> bool;
}

/// A Computed in the middle of evaluating.
pub(crate) trait Tracker {
    fn record(&self, source: Rc<dyn Source>, seen: Box<dyn Any>);

    /// `true` if anything read so far is, or was computed from, `key`.
    fn reads(&self, key: SourceKey) -> bool;

    fn label(&self) -> String;
}

/// One recorded read: the source and the value it had at the time.
pub(crate) struct Dependency {
    pub key:    SourceKey,
    pub name:   String,
    pub hub:    SignalHub,
    pub source: Weak<dyn Source>,
    pub seen:   Box<dyn Any>,
}

// ── Signals ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RuntimeInner {
    /// `None` frames come from [`Signals::untracked`].
    stack:    RefCell<Vec<Option<Rc<dyn Tracker>>>>,
    next_key: Cell<SourceKey>,
}

/// Shared evaluation context.  Cheap to clone; clones share state.
///
/// Create one per model and build every owner's [`SignalHub`] from it;
/// dependency tracking only sees reads of sources that share the runtime of
/// the evaluating Computed.
#[derive(Clone, Default)]
pub struct Signals {
    inner: Rc<RuntimeInner>,
}

impl Signals {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh registry for one owner (an agent, the model, …).
    ///
    /// `owner` only appears in signal messages and error text.
    pub fn hub(&self, owner: impl Into<String>) -> SignalHub {
        SignalHub::new(self.clone(), owner.into())
    }

    /// `true` while some Computed is evaluating and reads are being tracked.
    pub fn is_tracking(&self) -> bool {
        matches!(self.inner.stack.borrow().last(), Some(Some(_)))
    }

    /// Run `f` without recording any reads it makes.
    pub fn untracked<R>(&self, f: impl FnOnce() -> R) -> R {
        let _frame = self.push(None);
        f()
    }

    // ── Crate-side ──────────────────────────────────────────────────────

    pub(crate) fn next_key(&self) -> SourceKey {
        let key = self.inner.next_key.get();
        self.inner.next_key.set(key + 1);
        key
    }

    pub(crate) fn enter(&self, tracker: Rc<dyn Tracker>) -> Frame {
        self.push(Some(tracker))
    }

    /// Record a read of `source` with the innermost evaluating Computed.
    /// `snapshot` is only called when something is listening.
    pub(crate) fn track(&self, source: Rc<dyn Source>, snapshot: impl FnOnce() -> Box<dyn Any>) {
        let top = match self.inner.stack.borrow().last() {
            Some(Some(tracker)) => Rc::clone(tracker),
            _ => return,
        };
        top.record(source, snapshot());
    }

    /// Refuse a write to `key` if any Computed currently evaluating has
    /// already read it, directly or through another Computed.
    pub(crate) fn check_write(&self, key: SourceKey, label: &str) -> SignalResult<()> {
        let frames: Vec<Rc<dyn Tracker>> =
            self.inner.stack.borrow().iter().flatten().cloned().collect();
        match frames.iter().find(|frame| frame.reads(key)) {
            Some(frame) => Err(SignalError::CyclicalDependency {
                computed:   frame.label(),
                observable: label.to_owned(),
            }),
            None => Ok(()),
        }
    }

    fn push(&self, frame: Option<Rc<dyn Tracker>>) -> Frame {
        self.inner.stack.borrow_mut().push(frame);
        Frame { runtime: self.clone() }
    }
}

/// Pops its evaluation frame when dropped, including on early return.
pub(crate) struct Frame {
    runtime: Signals,
}

impl Drop for Frame {
    fn drop(&mut self) {
        self.runtime.inner.stack.borrow_mut().pop();
    }
}
