//! Unit tests for mesa-core primitives.

#[cfg(test)]
mod ids {
    use crate::{AgentId, CellId, EventId};

    #[test]
    fn index_roundtrip() {
        let id = CellId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(CellId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(AgentId(0) < AgentId(1));
        assert!(EventId(100) > EventId(99));
    }

    #[test]
    fn event_ids_advance() {
        let first = EventId(0);
        assert_eq!(first.next(), EventId(1));
        assert!(first.next() > first);
    }

    #[test]
    fn try_from_rejects_overflow() {
        assert!(AgentId::try_from(u32::MAX as usize + 1).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(AgentId(7).to_string(), "agent 7");
        assert_eq!(CellId(3).to_string(), "cell 3");
    }
}

#[cfg(test)]
mod time {
    use crate::{CoreError, SimTime, Tick, TimeUnit};

    #[test]
    fn new_rejects_non_finite() {
        assert!(SimTime::new(1.5).is_ok());
        assert!(SimTime::new(f64::NAN).unwrap_err().to_string().contains("finite"));
        assert!(matches!(SimTime::new(f64::INFINITY), Err(CoreError::NonFiniteTime(_))));
    }

    #[test]
    fn total_order() {
        let mut times = vec![SimTime::from(5), SimTime::from(0.5), SimTime::from(3u64)];
        times.sort();
        assert_eq!(times, vec![SimTime::from(0.5), SimTime::from(3), SimTime::from(5.0)]);
    }

    #[test]
    fn hash_agrees_with_eq() {
        use std::collections::HashSet;

        let set: HashSet<SimTime> =
            [SimTime::from(3), SimTime::from(3.0), SimTime::from(0.5)].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&SimTime::from(3u64)));
        assert!(!set.contains(&SimTime::from(-0.0)));
    }

    #[test]
    fn integral_detection() {
        assert!(SimTime::from(3).is_integral());
        assert!(SimTime::from(3.0).is_integral());
        assert!(!SimTime::from(2.5).is_integral());
        assert_eq!(SimTime::from(4.0).as_tick(), Some(Tick(4)));
        assert_eq!(SimTime::from(4.5).as_tick(), None);
        assert_eq!(SimTime::from(-1).as_tick(), None);
    }

    #[test]
    fn arithmetic() {
        assert_eq!(SimTime::from(2) + SimTime::from(0.5), SimTime::from(2.5));
        assert_eq!(SimTime::from(2) - SimTime::from(0.5), SimTime::from(1.5));
        assert_eq!(Tick(10) + 5, Tick(15));
        assert_eq!(Tick(10).offset(3), Tick(13));
        assert_eq!(SimTime::from(Tick(7)), SimTime::from(7));
    }

    #[test]
    fn time_unit_acceptance() {
        assert!(TimeUnit::Integer.accepts(SimTime::from(3)));
        assert!(TimeUnit::Integer.accepts(SimTime::from(3.0)));
        assert!(!TimeUnit::Integer.accepts(SimTime::from(2.5)));
        assert!(TimeUnit::Real.accepts(SimTime::from(2.5)));
        assert!(!TimeUnit::Real.accepts(SimTime::from(f64::NAN)));
    }
}

#[cfg(test)]
mod rng {
    use rand::Rng;

    use crate::SimRng;

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = SimRng::new(12345);
        let mut r2 = SimRng::new(12345);
        for _ in 0..100 {
            let a: f32 = r1.random();
            let b: f32 = r2.random();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn streams_diverge() {
        let root = SimRng::new(1);
        let a: u64 = root.stream(0).random();
        let b: u64 = root.stream(1).random();
        let c: u64 = SimRng::new(1).random();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn streams_ignore_root_draws() {
        let mut root = SimRng::new(9);
        let before: u64 = root.stream(3).random();
        for _ in 0..10 {
            let _: u64 = root.random();
        }
        let after: u64 = root.stream(3).random();
        assert_eq!(before, after);
        assert_eq!(root.stream(3).seed(), root.stream(3).seed());
    }

    #[test]
    fn rewind_replays() {
        let mut rng = SimRng::new(5);
        let first: Vec<u32> = (0..8).map(|_| rng.random()).collect();
        rng.rewind();
        let again: Vec<u32> = (0..8).map(|_| rng.random()).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn usable_as_rng() {
        let mut rng = SimRng::new(0);
        for _ in 0..1000 {
            let v = rng.gen_range(0.0f32..1.0);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn chance_clamps() {
        let mut rng = SimRng::new(3);
        assert!(rng.chance(1.5));
        assert!(!rng.chance(-0.5));
    }

    #[test]
    fn choose_empty_is_none() {
        let mut rng = SimRng::new(0);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert_eq!(rng.choose(&[9]), Some(&9));
    }
}
