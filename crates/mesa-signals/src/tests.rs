//! Unit tests for mesa-signals.

#[cfg(test)]
mod helpers {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::{Handler, Message, SignalType};

    /// Records `(name, signal type)` of every message it sees.
    pub fn recorder() -> (Handler, Rc<RefCell<Vec<(String, SignalType)>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let handler: Handler = Rc::new(move |m: &Message<'_>| {
            log.borrow_mut().push((m.name.to_owned(), m.signal_type));
        });
        (handler, seen)
    }
}

// ── Observable ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observable {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::helpers::recorder;
    use crate::{Handler, HasObservables, Message, SignalError, SignalType, Signals};

    #[test]
    fn set_notifies_with_old_and_new() {
        let signals = Signals::new();
        let hub = signals.hub("Agent");
        let wealth = hub.observable("wealth", 1_i64).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let handler: Handler = Rc::new(move |m: &Message<'_>| {
            log.borrow_mut().push((*m.old_value::<i64>().unwrap(), *m.new_value::<i64>().unwrap()));
            assert_eq!(m.owner, "Agent");
        });
        hub.observe("wealth", SignalType::Change, &handler).unwrap();

        wealth.set(5).unwrap();
        wealth.update(|w| w * 2).unwrap();
        assert_eq!(*seen.borrow(), vec![(1, 5), (5, 10)]);
        assert_eq!(wealth.get(), 10);
    }

    #[test]
    fn equal_assignment_still_notifies() {
        let hub = Signals::new().hub("Agent");
        let x = hub.observable("x", 3).unwrap();
        let (handler, seen) = recorder();
        hub.observe("x", SignalType::Change, &handler).unwrap();
        x.set(3).unwrap();
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn dropped_handler_is_not_called() {
        let hub = Signals::new().hub("Agent");
        let x = hub.observable("x", 0).unwrap();
        let (handler, seen) = recorder();
        hub.observe("x", SignalType::Change, &handler).unwrap();
        assert_eq!(hub.subscriber_count("x", SignalType::Change), 1);

        drop(handler);
        x.set(1).unwrap();
        assert!(seen.borrow().is_empty());
        assert_eq!(hub.subscriber_count("x", SignalType::Change), 0);
    }

    #[test]
    fn unobserve_stops_delivery() {
        let hub = Signals::new().hub("Agent");
        let x = hub.observable("x", 0).unwrap();
        let (handler, seen) = recorder();
        hub.observe("x", SignalType::Change, &handler).unwrap();
        hub.unobserve("x", SignalType::Change, &handler).unwrap();
        x.set(1).unwrap();
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn unknown_name_and_unsupported_signal() {
        let hub = Signals::new().hub("Agent");
        let _x = hub.observable("x", 0).unwrap();
        let (handler, _) = recorder();

        assert!(matches!(
            hub.observe("y", SignalType::Change, &handler),
            Err(SignalError::UnknownObservable { .. })
        ));
        assert!(matches!(
            hub.observe("x", SignalType::Append, &handler),
            Err(SignalError::UnsupportedSignal { signal: SignalType::Append, .. })
        ));
    }

    #[test]
    fn set_inside_with_is_an_error() {
        let hub = Signals::new().hub("Agent");
        let x = hub.observable("x", 1u8).unwrap();
        let inner = x.clone();
        let result = x.with(|&v| inner.set(v + 1));
        assert!(matches!(result, Err(SignalError::Borrowed(ref label)) if label == "Agent.x"));
        assert_eq!(x.peek(), 1);
        x.set(2).unwrap();
        assert_eq!(x.peek(), 2);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let hub = Signals::new().hub("Agent");
        let _x = hub.observable("x", 0).unwrap();
        assert!(matches!(
            hub.observable("x", 1),
            Err(SignalError::DuplicateObservable { .. })
        ));
    }

    #[test]
    fn has_observables_on_an_agent() {
        struct Agent {
            hub:    crate::SignalHub,
            health: crate::Observable<u32>,
        }
        impl HasObservables for Agent {
            fn signals(&self) -> &crate::SignalHub {
                &self.hub
            }
        }

        let hub = Signals::new().hub("Agent");
        let agent = Agent { health: hub.observable("health", 10).unwrap(), hub };
        let (handler, seen) = recorder();
        agent.observe("health", crate::All, &handler).unwrap();
        agent.health.set(9).unwrap();
        agent.clear_all_subscriptions(crate::All).unwrap();
        agent.health.set(8).unwrap();
        assert_eq!(*seen.borrow(), vec![("health".to_owned(), SignalType::Change)]);
    }
}

// ── Selectors ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod selectors {
    use super::helpers::recorder;
    use crate::{All, SignalType, Signals};

    #[test]
    fn all_names_all_types() {
        let hub = Signals::new().hub("Model");
        let a = hub.observable("a", 0i32).unwrap();
        let items = hub.observable_list("items", Vec::<u8>::new()).unwrap();
        let (handler, seen) = recorder();
        hub.observe(All, All, &handler).unwrap();

        a.set(1).unwrap();
        items.push(1).unwrap();
        items.remove(0).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![
                ("a".to_owned(), SignalType::Change),
                ("items".to_owned(), SignalType::Append),
                ("items".to_owned(), SignalType::Remove),
            ]
        );
    }

    #[test]
    fn all_names_one_type_skips_non_emitters() {
        let hub = Signals::new().hub("Model");
        let a = hub.observable("a", 0i32).unwrap();
        let items = hub.observable_list("items", vec![1, 2]).unwrap();
        let (handler, seen) = recorder();
        hub.observe(All, SignalType::Append, &handler).unwrap();

        a.set(1).unwrap();
        items.push(3).unwrap();
        assert_eq!(*seen.borrow(), vec![("items".to_owned(), SignalType::Append)]);
    }

    #[test]
    fn clear_one_name() {
        let hub = Signals::new().hub("Model");
        let a = hub.observable("a", 0i32).unwrap();
        let b = hub.observable("b", 0i32).unwrap();
        let (handler, seen) = recorder();
        hub.observe(All, All, &handler).unwrap();
        hub.clear_all_subscriptions("a").unwrap();

        a.set(1).unwrap();
        b.set(1).unwrap();
        assert_eq!(*seen.borrow(), vec![("b".to_owned(), SignalType::Change)]);
        assert!(hub.clear_all_subscriptions("zzz").is_err());
    }
}

// ── ObservableList ────────────────────────────────────────────────────────────

#[cfg(test)]
mod list {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::{All, Handler, Message, SignalError, SignalType, Signals};

    #[test]
    fn element_signals_carry_index_and_values() {
        let hub = Signals::new().hub("Model");
        let items = hub.observable_list("items", vec!['a', 'b']).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let handler: Handler = Rc::new(move |m: &Message<'_>| {
            log.borrow_mut().push((
                m.signal_type,
                m.index,
                m.old_value::<char>().copied(),
                m.new_value::<char>().copied(),
            ));
        });
        hub.observe("items", All, &handler).unwrap();

        items.push('c').unwrap();
        items.insert(0, 'z').unwrap();
        assert_eq!(items.replace(1, 'A').unwrap(), 'a');
        assert_eq!(items.remove(3).unwrap(), 'c');

        assert_eq!(items.peek(), vec!['z', 'A', 'b']);
        assert_eq!(
            *seen.borrow(),
            vec![
                (SignalType::Append, Some(2), None, Some('c')),
                (SignalType::Insert, Some(0), None, Some('z')),
                (SignalType::Replace, Some(1), Some('a'), Some('A')),
                (SignalType::Remove, Some(3), Some('c'), None),
            ]
        );
    }

    #[test]
    fn out_of_range_is_error_and_silent() {
        let hub = Signals::new().hub("Model");
        let items = hub.observable_list("items", vec![1]).unwrap();
        assert!(matches!(items.remove(1), Err(SignalError::IndexOutOfRange { index: 1, len: 1, .. })));
        assert!(items.insert(3, 0).is_err());
        assert!(items.replace(5, 0).is_err());
        assert_eq!(items.peek(), vec![1]);
    }

    #[test]
    fn mutation_inside_with_is_an_error() {
        let hub = Signals::new().hub("Model");
        let items = hub.observable_list("items", vec![1, 2]).unwrap();
        let inner = items.clone();
        let pushed = items.with(|_| inner.push(3));
        assert!(matches!(pushed, Err(SignalError::Borrowed(_))));
        let reset = items.with(|_| inner.set(Vec::new()));
        assert!(matches!(reset, Err(SignalError::Borrowed(_))));
        assert_eq!(items.peek(), vec![1, 2]);
    }

    #[test]
    fn computed_over_list_tracks_appends() {
        let hub = Signals::new().hub("Model");
        let items = hub.observable_list("items", vec![1, 2, 3]).unwrap();
        let src = items.clone();
        let total = hub.computed("total", move || Ok(src.with(|xs| xs.iter().sum::<i32>()))).unwrap();

        assert_eq!(total.get().unwrap(), 6);
        items.push(4).unwrap();
        assert!(total.is_dirty());
        assert_eq!(total.get().unwrap(), 10);
    }
}

// ── Computed ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod computed {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::helpers::recorder;
    use crate::{SignalError, SignalType, Signals};

    #[test]
    fn memoizes_until_a_dependency_changes() {
        let hub = Signals::new().hub("Agent");
        let x = hub.observable("x", 2).unwrap();
        let calls = Rc::new(Cell::new(0));

        let (src, n) = (x.clone(), Rc::clone(&calls));
        let double = hub
            .computed("double", move || {
                n.set(n.get() + 1);
                Ok(src.get() * 2)
            })
            .unwrap();

        assert_eq!(calls.get(), 0, "lazy until first read");
        assert_eq!(double.get().unwrap(), 4);
        assert_eq!(double.get().unwrap(), 4);
        assert_eq!(calls.get(), 1);
        assert_eq!(double.dependency_count(), 1);

        x.set(5).unwrap();
        assert!(double.is_dirty());
        assert_eq!(calls.get(), 1, "invalidation does not evaluate");
        assert_eq!(double.get().unwrap(), 10);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn same_value_assignment_reuses_cache() {
        let hub = Signals::new().hub("Agent");
        let x = hub.observable("x", 7).unwrap();
        let calls = Rc::new(Cell::new(0));
        let (src, n) = (x.clone(), Rc::clone(&calls));
        let c = hub
            .computed("c", move || {
                n.set(n.get() + 1);
                Ok(src.get())
            })
            .unwrap();

        c.get().unwrap();
        x.set(7).unwrap();
        assert!(c.is_dirty());
        assert_eq!(c.get().unwrap(), 7);
        assert_eq!(calls.get(), 1);
        assert!(!c.is_dirty());
    }

    #[test]
    fn chained_computeds_propagate() {
        let hub = Signals::new().hub("Agent");
        let x = hub.observable("x", 1).unwrap();
        let sx = x.clone();
        let plus_one = hub.computed("plus_one", move || Ok(sx.get() + 1)).unwrap();
        let sp = plus_one.clone();
        let squared = hub
            .computed("squared", move || {
                let v = sp.get()?;
                Ok(v * v)
            })
            .unwrap();

        assert_eq!(squared.get().unwrap(), 4);
        x.set(2).unwrap();
        assert!(plus_one.is_dirty());
        assert!(squared.is_dirty());
        assert_eq!(squared.get().unwrap(), 9);
    }

    #[test]
    fn unchanged_intermediate_stops_recomputation() {
        let hub = Signals::new().hub("Agent");
        let x = hub.observable("x", 3).unwrap();
        let sx = x.clone();
        let parity = hub.computed("parity", move || Ok(sx.get() % 2)).unwrap();

        let calls = Rc::new(Cell::new(0));
        let (sp, n) = (parity.clone(), Rc::clone(&calls));
        let label = hub
            .computed("label", move || {
                n.set(n.get() + 1);
                Ok(if sp.get()? == 0 { "even" } else { "odd" })
            })
            .unwrap();

        assert_eq!(label.get().unwrap(), "odd");
        x.set(5).unwrap();
        assert_eq!(label.get().unwrap(), "odd");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn writing_a_dependency_while_evaluating_is_cyclical() {
        let hub = Signals::new().hub("Agent");
        let x = hub.observable("x", 1).unwrap();
        let sx = x.clone();
        let bad = hub
            .computed("bad", move || {
                let v = sx.get();
                sx.set(v + 1)?;
                Ok(v)
            })
            .unwrap();

        let err = bad.get().unwrap_err();
        assert!(matches!(err, SignalError::CyclicalDependency { .. }));
        assert!(err.to_string().contains("Agent.x"));
        assert_eq!(x.get(), 1);
    }

    #[test]
    fn indirect_write_is_cyclical() {
        let hub = Signals::new().hub("Agent");
        let x = hub.observable("x", 1).unwrap();
        let sx = x.clone();
        let inner = hub.computed("inner", move || Ok(sx.get())).unwrap();
        let (si, sx) = (inner.clone(), x.clone());
        let outer = hub
            .computed("outer", move || {
                let v = si.get()?;
                sx.set(v + 1)?;
                Ok(v)
            })
            .unwrap();
        assert!(matches!(outer.get(), Err(SignalError::CyclicalDependency { .. })));
    }

    #[test]
    fn writing_an_unread_observable_is_allowed() {
        let hub = Signals::new().hub("Agent");
        let x = hub.observable("x", 1).unwrap();
        let log = hub.observable("log", 0).unwrap();
        let (sx, sl) = (x.clone(), log.clone());
        let c = hub
            .computed("c", move || {
                let v = sx.get();
                sl.set(v)?;
                Ok(v)
            })
            .unwrap();
        assert_eq!(c.get().unwrap(), 1);
        assert_eq!(log.get(), 1);
    }

    #[test]
    fn self_read_is_cyclical() {
        let hub = Signals::new().hub("Agent");
        let slot: Rc<std::cell::RefCell<Option<crate::Computed<i32>>>> = Rc::default();
        let s = Rc::clone(&slot);
        let c = hub
            .computed("c", move || match s.borrow().as_ref() {
                Some(me) => me.get(),
                None => Ok(0),
            })
            .unwrap();
        *slot.borrow_mut() = Some(c.clone());
        assert!(matches!(c.get(), Err(SignalError::CyclicalDependency { .. })));
    }

    #[test]
    fn failed_evaluation_is_retried() {
        let hub = Signals::new().hub("Agent");
        let x = hub.observable("x", 0).unwrap();
        let sx = x.clone();
        let inverse = hub
            .computed("inverse", move || {
                let v = sx.get();
                if v == 0 {
                    return Err(SignalError::computation(std::fmt::Error));
                }
                Ok(100 / v)
            })
            .unwrap();

        assert!(matches!(inverse.get(), Err(SignalError::Computation(_))));
        assert!(inverse.is_dirty());
        x.set(4).unwrap();
        assert_eq!(inverse.get().unwrap(), 25);
    }

    #[test]
    fn computed_emits_change_on_invalidation() {
        let hub = Signals::new().hub("Agent");
        let x = hub.observable("x", 1).unwrap();
        let sx = x.clone();
        let c = hub.computed("c", move || Ok(sx.get() * 10)).unwrap();
        let (handler, seen) = recorder();
        hub.observe("c", SignalType::Change, &handler).unwrap();

        c.get().unwrap();
        seen.borrow_mut().clear();
        x.set(2).unwrap();
        x.set(3).unwrap();
        // dirty once, not once per write
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn untracked_reads_are_not_dependencies() {
        let signals = Signals::new();
        let hub = signals.hub("Agent");
        let x = hub.observable("x", 1).unwrap();
        let y = hub.observable("y", 1).unwrap();
        let (sx, sy, rt) = (x.clone(), y.clone(), signals.clone());
        let c = hub.computed("c", move || Ok(sx.get() + rt.untracked(|| sy.get()))).unwrap();

        assert_eq!(c.get().unwrap(), 2);
        assert_eq!(c.dependency_count(), 1);
        y.set(10).unwrap();
        assert!(!c.is_dirty());
        assert_eq!(c.get().unwrap(), 2);
        assert!(!signals.is_tracking());
    }

    #[test]
    fn dependencies_across_owners() {
        let signals = Signals::new();
        let a = signals.hub("A");
        let b = signals.hub("B");
        let x = a.observable("x", 1).unwrap();
        let sx = x.clone();
        let c = b.computed("c", move || Ok(sx.get() + 1)).unwrap();
        assert_eq!(c.get().unwrap(), 2);
        x.set(2).unwrap();
        assert_eq!(c.get().unwrap(), 3);
    }
}

// ── Property tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod properties {
    use proptest::prelude::*;

    use crate::Signals;

    proptest! {
        #[test]
        fn computed_always_matches_direct_evaluation(
            writes in prop::collection::vec((any::<bool>(), -50i32..50), 0..40),
        ) {
            let hub = Signals::new().hub("Agent");
            let a = hub.observable("a", 0i32).unwrap();
            let b = hub.observable("b", 0i32).unwrap();
            let (sa, sb) = (a.clone(), b.clone());
            let sum = hub.computed("sum", move || Ok(sa.get() + sb.get())).unwrap();
            let ss = sum.clone();
            let abs = hub.computed("abs", move || Ok(ss.get()?.abs())).unwrap();

            for (first, v) in writes {
                if first { a.set(v).unwrap() } else { b.set(v).unwrap() }
                prop_assert_eq!(abs.get().unwrap(), (a.peek() + b.peek()).abs());
            }
        }
    }
}
