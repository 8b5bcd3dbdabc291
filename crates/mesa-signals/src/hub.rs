//! Per-owner signal registry: which observables exist, which signals they
//! emit, and who is subscribed.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{Computed, Observable, ObservableList, SignalError, SignalResult, Signals};

// ── SignalType ────────────────────────────────────────────────────────────────

/// The kind of change a signal reports.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum SignalType {
    /// The whole value was replaced (or, for a Computed, invalidated).
    Change,
    Append,
    Insert,
    Remove,
    Replace,
}

impl SignalType {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalType::Change => "change",
            SignalType::Append => "append",
            SignalType::Insert => "insert",
            SignalType::Remove => "remove",
            SignalType::Replace => "replace",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Selectors ─────────────────────────────────────────────────────────────────

/// Wildcard accepted wherever an observable name or a signal type is
/// expected.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct All;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum NameSelector<'a> {
    All,
    Name(&'a str),
}

impl From<All> for NameSelector<'_> {
    fn from(_: All) -> Self {
        NameSelector::All
    }
}

impl<'a> From<&'a str> for NameSelector<'a> {
    fn from(name: &'a str) -> Self {
        NameSelector::Name(name)
    }
}

impl<'a> From<&'a String> for NameSelector<'a> {
    fn from(name: &'a String) -> Self {
        NameSelector::Name(name)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SignalSelector {
    All,
    Only(SignalType),
}

impl From<All> for SignalSelector {
    fn from(_: All) -> Self {
        SignalSelector::All
    }
}

impl From<SignalType> for SignalSelector {
    fn from(signal: SignalType) -> Self {
        SignalSelector::Only(signal)
    }
}

// ── Message ───────────────────────────────────────────────────────────────────

/// What a subscriber receives.
///
/// Values are passed as `&dyn Any`; use [`old_value`](Self::old_value) /
/// [`new_value`](Self::new_value) with the observable's value type to read
/// them.  For list signals the values are single elements and `index` is
/// set.
#[derive(Clone, Copy)]
pub struct Message<'a> {
    pub owner:       &'a str,
    pub name:        &'a str,
    pub signal_type: SignalType,
    pub index:       Option<usize>,
    old:             Option<&'a dyn Any>,
    new:             Option<&'a dyn Any>,
}

impl<'a> Message<'a> {
    pub(crate) fn new(
        owner:       &'a str,
        name:        &'a str,
        signal_type: SignalType,
        old:         Option<&'a dyn Any>,
        new:         Option<&'a dyn Any>,
    ) -> Self {
        Self { owner, name, signal_type, index: None, old, new }
    }

    pub(crate) fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// The previous value, if there was one and it has type `T`.
    pub fn old_value<T: 'static>(&self) -> Option<&'a T> {
        self.old.and_then(|v| v.downcast_ref())
    }

    /// The new value, if there is one and it has type `T`.
    ///
    /// `None` on a Computed's change signal means the cached value went
    /// stale; read the Computed to get the fresh one.
    pub fn new_value<T: 'static>(&self) -> Option<&'a T> {
        self.new.and_then(|v| v.downcast_ref())
    }
}

impl fmt::Debug for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("signal_type", &self.signal_type)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// A subscriber callback.  The hub holds only a weak reference: keep the
/// `Rc` alive for as long as the subscription should last.
pub type Handler = Rc<dyn Fn(&Message<'_>)>;

type WeakHandler = Weak<dyn Fn(&Message<'_>)>;

// ── SignalHub ─────────────────────────────────────────────────────────────────

struct Registered {
    name:    String,
    signals: &'static [SignalType],
}

pub(crate) struct HubInner {
    runtime:     Signals,
    owner:       String,
    observables: RefCell<Vec<Registered>>,
    subscribers: RefCell<FxHashMap<String, FxHashMap<SignalType, Vec<WeakHandler>>>>,
}

/// The observables of one owner and their subscribers.
///
/// Cheap to clone; clones share state.  Embed one in any agent or model
/// that exposes observable attributes, and create those attributes through
/// it.
#[derive(Clone)]
pub struct SignalHub {
    inner: Rc<HubInner>,
}

impl SignalHub {
    pub(crate) fn new(runtime: Signals, owner: String) -> Self {
        Self {
            inner: Rc::new(HubInner {
                runtime,
                owner,
                observables: RefCell::new(Vec::new()),
                subscribers: RefCell::new(FxHashMap::default()),
            }),
        }
    }

    pub fn owner(&self) -> &str {
        &self.inner.owner
    }

    pub fn runtime(&self) -> &Signals {
        &self.inner.runtime
    }

    /// Names of every registered observable, in registration order.
    pub fn observable_names(&self) -> Vec<String> {
        self.inner.observables.borrow().iter().map(|o| o.name.clone()).collect()
    }

    /// Signal types `name` emits, if it is registered.
    pub fn signal_types(&self, name: &str) -> Option<&'static [SignalType]> {
        self.inner
            .observables
            .borrow()
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.signals)
    }

    // ── Creating observables ────────────────────────────────────────────

    /// Register a plain observable attribute.
    pub fn observable<T>(&self, name: &str, initial: T) -> SignalResult<Observable<T>>
    where
        T: Clone + PartialEq + 'static,
    {
        self.register(name, Observable::<T>::SIGNALS)?;
        Ok(Observable::new(self.clone(), name, initial))
    }

    /// Register an observable list attribute.
    pub fn observable_list<T>(&self, name: &str, initial: Vec<T>) -> SignalResult<ObservableList<T>>
    where
        T: Clone + PartialEq + 'static,
    {
        self.register(name, ObservableList::<T>::SIGNALS)?;
        Ok(ObservableList::new(self.clone(), name, initial))
    }

    /// Register a derived attribute.  `f` is not run until the first read.
    pub fn computed<T, F>(&self, name: &str, f: F) -> SignalResult<Computed<T>>
    where
        T: Clone + PartialEq + 'static,
        F: Fn() -> SignalResult<T> + 'static,
    {
        self.register(name, Computed::<T>::SIGNALS)?;
        Ok(Computed::new(self.clone(), name, f))
    }

    fn register(&self, name: &str, signals: &'static [SignalType]) -> SignalResult<()> {
        let mut observables = self.inner.observables.borrow_mut();
        if observables.iter().any(|o| o.name == name) {
            return Err(SignalError::DuplicateObservable {
                owner: self.inner.owner.clone(),
                name:  name.to_owned(),
            });
        }
        observables.push(Registered { name: name.to_owned(), signals });
        debug!(owner = %self.inner.owner, name, "observable registered");
        Ok(())
    }

    // ── Subscriptions ───────────────────────────────────────────────────

    /// Subscribe `handler` to the selected signals.
    ///
    /// # Errors
    ///
    /// [`SignalError::UnknownObservable`] for an unregistered name;
    /// [`SignalError::UnsupportedSignal`] if a named observable does not emit
    /// the requested signal type.
    pub fn observe<'a>(
        &self,
        name:    impl Into<NameSelector<'a>>,
        signal:  impl Into<SignalSelector>,
        handler: &Handler,
    ) -> SignalResult<()> {
        let targets = self.resolve(name.into(), signal.into())?;
        let mut subscribers = self.inner.subscribers.borrow_mut();
        for (name, signals) in targets {
            let by_type = subscribers.entry(name).or_default();
            for signal in signals {
                by_type.entry(signal).or_default().push(Rc::downgrade(handler));
            }
        }
        Ok(())
    }

    /// Remove `handler` from the selected signals.  Missing subscriptions
    /// are ignored.
    pub fn unobserve<'a>(
        &self,
        name:    impl Into<NameSelector<'a>>,
        signal:  impl Into<SignalSelector>,
        handler: &Handler,
    ) -> SignalResult<()> {
        let targets = self.resolve(name.into(), signal.into())?;
        for (name, signals) in targets {
            for signal in signals {
                self.drop_subscriber(&name, signal, handler);
            }
        }
        Ok(())
    }

    /// Drop every subscriber of the selected observables.
    pub fn clear_all_subscriptions<'a>(&self, name: impl Into<NameSelector<'a>>) -> SignalResult<()> {
        match name.into() {
            NameSelector::All => self.inner.subscribers.borrow_mut().clear(),
            NameSelector::Name(name) => {
                self.registered(name)?;
                self.inner.subscribers.borrow_mut().remove(name);
            }
        }
        Ok(())
    }

    /// Live subscribers of one signal of one observable.
    pub fn subscriber_count(&self, name: &str, signal: SignalType) -> usize {
        self.inner
            .subscribers
            .borrow()
            .get(name)
            .and_then(|by_type| by_type.get(&signal))
            .map_or(0, |list| list.iter().filter(|h| h.strong_count() > 0).count())
    }

    /// Deliver a signal to every live subscriber.  Dead subscribers are
    /// pruned on the way.
    pub fn notify(&self, name: &str, signal: SignalType, old: Option<&dyn Any>, new: Option<&dyn Any>) {
        self.emit(Message::new(&self.inner.owner, name, signal, old, new));
    }

    pub(crate) fn emit(&self, message: Message<'_>) {
        // Collect first: handlers may subscribe or notify re-entrantly.
        let handlers: Vec<Handler> = {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            let Some(list) = subscribers
                .get_mut(message.name)
                .and_then(|by_type| by_type.get_mut(&message.signal_type))
            else {
                return;
            };
            list.retain(|h| h.strong_count() > 0);
            list.iter().filter_map(Weak::upgrade).collect()
        };
        for handler in handlers {
            handler(&message);
        }
    }

    /// Subscribe to every signal type of `name` without validation.  Used by
    /// Computeds to follow their dependencies.
    pub(crate) fn subscribe_all(&self, name: &str, handler: &Handler) {
        let signals = self.signal_types(name).unwrap_or(&[SignalType::Change]);
        let mut subscribers = self.inner.subscribers.borrow_mut();
        let by_type = subscribers.entry(name.to_owned()).or_default();
        for &signal in signals {
            let list = by_type.entry(signal).or_default();
            if !list.iter().any(|h| std::ptr::addr_eq(h.as_ptr(), Rc::as_ptr(handler))) {
                list.push(Rc::downgrade(handler));
            }
        }
    }

    pub(crate) fn unsubscribe_all(&self, name: &str, handler: &Handler) {
        for &signal in self.signal_types(name).unwrap_or(&[SignalType::Change]) {
            self.drop_subscriber(name, signal, handler);
        }
    }

    fn drop_subscriber(&self, name: &str, signal: SignalType, handler: &Handler) {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        if let Some(list) = subscribers.get_mut(name).and_then(|by_type| by_type.get_mut(&signal)) {
            list.retain(|h| h.strong_count() > 0 && !std::ptr::addr_eq(h.as_ptr(), Rc::as_ptr(handler)));
        }
    }

    fn registered(&self, name: &str) -> SignalResult<&'static [SignalType]> {
        self.signal_types(name).ok_or_else(|| SignalError::UnknownObservable {
            owner: self.inner.owner.clone(),
            name:  name.to_owned(),
        })
    }

    /// Expand selectors into concrete `(name, signal types)` pairs.
    fn resolve(
        &self,
        name:   NameSelector<'_>,
        signal: SignalSelector,
    ) -> SignalResult<Vec<(String, Vec<SignalType>)>> {
        let wildcard = name == NameSelector::All;
        let names = match name {
            NameSelector::All => self.observable_names(),
            NameSelector::Name(name) => {
                self.registered(name)?;
                vec![name.to_owned()]
            }
        };

        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let supported = self.registered(&name)?;
            let signals = match signal {
                SignalSelector::All => supported.to_vec(),
                SignalSelector::Only(s) if supported.contains(&s) => vec![s],
                // A wildcard name only picks the observables that emit `s`.
                SignalSelector::Only(_) if wildcard => continue,
                SignalSelector::Only(s) => {
                    return Err(SignalError::UnsupportedSignal {
                        owner:  self.inner.owner.clone(),
                        name,
                        signal: s,
                    });
                }
            };
            out.push((name, signals));
        }
        Ok(out)
    }
}

impl fmt::Debug for SignalHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalHub")
            .field("owner", &self.inner.owner)
            .field("observables", &self.observable_names())
            .finish()
    }
}

// ── HasObservables ────────────────────────────────────────────────────────────

/// Implemented by anything that owns a [`SignalHub`].  Supplies the
/// subscription API as provided methods.
pub trait HasObservables {
    fn signals(&self) -> &SignalHub;

    fn observe<'a>(
        &self,
        name:    impl Into<NameSelector<'a>>,
        signal:  impl Into<SignalSelector>,
        handler: &Handler,
    ) -> SignalResult<()> {
        self.signals().observe(name, signal, handler)
    }

    fn unobserve<'a>(
        &self,
        name:    impl Into<NameSelector<'a>>,
        signal:  impl Into<SignalSelector>,
        handler: &Handler,
    ) -> SignalResult<()> {
        self.signals().unobserve(name, signal, handler)
    }

    fn clear_all_subscriptions<'a>(&self, name: impl Into<NameSelector<'a>>) -> SignalResult<()> {
        self.signals().clear_all_subscriptions(name)
    }

    fn notify(&self, name: &str, signal: SignalType, old: Option<&dyn Any>, new: Option<&dyn Any>) {
        self.signals().notify(name, signal, old, new)
    }
}

impl HasObservables for SignalHub {
    fn signals(&self) -> &SignalHub {
        self
    }
}
