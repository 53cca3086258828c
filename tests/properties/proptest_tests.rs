//! Invariants of the reactive core checked with proptest

use modelcore_rs::constraints::Constraint;
use modelcore_rs::variables::ValueCell;
use modelcore_rs::Session;
use proptest::collection::vec;
use proptest::prelude::*;

use crate::test_helpers::{bounded, free};

proptest! {
    /// A write into a bounded parameter lands on the clamped candidate.
    #[test]
    fn write_is_clamped(min in -100.0f64..100.0, width in 0.0f64..100.0, x in -1000.0f64..1000.0) {
        let max = min + width;
        let mut session = Session::new();
        let p = bounded(&mut session, "p", min, min, max);

        session.set_value(p, x).unwrap();
        prop_assert_eq!(session.raw_value(p).unwrap(), x.clamp(min, max));
    }

    /// A plain cell stores whatever it is given.
    #[test]
    fn plain_cell_is_unconstrained(x in -1.0e12f64..1.0e12) {
        let mut session = Session::new();
        let c = session.add_cell(ValueCell::new("c", 0.0), None).unwrap();
        session.set_value(c, x).unwrap();
        prop_assert_eq!(session.raw_value(c).unwrap(), x);
    }

    /// Undoing every write restores the start; redoing them restores the end.
    #[test]
    fn undo_redo_round_trip(values in vec(-50i32..50, 1..30)) {
        let mut session = Session::new();
        let p = free(&mut session, "p", 0.0);
        for v in &values {
            session.set_value(p, f64::from(*v)).unwrap();
        }
        let last = session.raw_value(p).unwrap();

        while session.undo().unwrap() {}
        prop_assert_eq!(session.raw_value(p).unwrap(), 0.0);
        while session.redo().unwrap() {}
        prop_assert_eq!(session.raw_value(p).unwrap(), last);
    }

    /// Applying a relation a second time changes nothing.
    #[test]
    fn relation_is_idempotent(k in -10i32..10, b in -100i32..100) {
        let mut session = Session::new();
        let target = free(&mut session, "target", 0.0);
        let source = free(&mut session, "source", f64::from(b));
        let relation = Constraint::obj_ref(target, &format!("{k}*"), source).unwrap();

        let first = session.apply_constraint(&relation).unwrap();
        let recorded = session.stack().history_len();
        let second = session.apply_constraint(&relation).unwrap();

        prop_assert_eq!(first, second);
        prop_assert_eq!(first, f64::from(k) * f64::from(b));
        prop_assert_eq!(session.stack().history_len(), recorded);
    }

    /// Released handles disappear everywhere; the rest stay live.
    #[test]
    fn release_keeps_graph_consistent(count in 1usize..12, released in vec(any::<bool>(), 12)) {
        let mut session = Session::new();
        let ids: Vec<_> = (0..count)
            .map(|i| free(&mut session, &format!("p{i}"), i as f64))
            .collect();

        for (id, drop) in ids.iter().zip(&released) {
            if *drop {
                session.release(*id).unwrap();
            }
        }

        for (id, drop) in ids.iter().zip(&released) {
            prop_assert_eq!(session.contains(*id), !*drop);
        }
        prop_assert_eq!(session.graph().handles().len(), session.len());
    }
}
