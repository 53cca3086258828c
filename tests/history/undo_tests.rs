//! Integration tests for session history

use modelcore_rs::session::{Session, SessionConfig};
use modelcore_rs::undo::{Field, FieldValue, UndoError};
use modelcore_rs::CoreError;

use crate::test_helpers::{bounded, free};

#[test]
fn test_undo_redo_single_changes() {
    let mut session = Session::new();
    let p = bounded(&mut session, "p", 1.0, 0.0, 10.0);

    session.set_value(p, 2.0).unwrap();
    session.set_error(p, 0.3).unwrap();
    session.set_display_name(p, Some("P")).unwrap();
    assert_eq!(session.stack().history_len(), 3);
    assert_eq!(
        session.stack().undo_text().unwrap(),
        "p display_name changed from None to P"
    );

    assert!(session.undo().unwrap());
    assert!(session.undo().unwrap());
    assert_eq!(session.parameter(p).unwrap().error(), 0.0);
    assert!(session.stack().can_redo());

    assert!(session.redo().unwrap());
    assert_eq!(session.parameter(p).unwrap().error(), 0.3);
    assert_eq!(session.stack().future_len(), 1);

    // A fresh change drops the remaining redo future
    session.set_value(p, 3.0).unwrap();
    assert!(!session.stack().can_redo());
    assert!(!session.redo().unwrap());
}

#[test]
fn test_user_macro_is_one_unit() {
    let mut session = Session::new();
    let a = free(&mut session, "a", 1.0);

    session.stack_mut().begin_macro("L").unwrap();
    session.set_min(a, 0.0).unwrap();
    session.set_max(a, 2.0).unwrap();
    session.set_value(a, 1.5).unwrap();
    assert!(!session.stack().can_undo());
    session.stack_mut().end_macro().unwrap();

    assert_eq!(session.stack().history_len(), 1);
    assert_eq!(session.stack().undo_text().unwrap(), "L");

    session.undo().unwrap();
    let param = session.parameter(a).unwrap();
    assert_eq!(param.min(), f64::NEG_INFINITY);
    assert_eq!(param.max(), f64::INFINITY);
    assert_eq!(param.raw_value(), 1.0);

    session.redo().unwrap();
    let param = session.parameter(a).unwrap();
    assert_eq!((param.min(), param.max(), param.raw_value()), (0.0, 2.0, 1.5));
}

#[test]
fn test_set_bounds_inside_user_macro_joins_it() {
    let mut session = Session::new();
    let a = bounded(&mut session, "a", 1.0, 0.0, 5.0);

    session.stack_mut().begin_macro("outer").unwrap();
    session.set_value(a, 2.0).unwrap();
    session.set_bounds(a, Some(-1.0), Some(3.0)).unwrap();
    session.stack_mut().end_macro().unwrap();

    assert_eq!(session.stack().history_len(), 1);
    assert_eq!(session.stack().undo_text().unwrap(), "outer");
}

#[test]
fn test_nested_macro_is_an_error() {
    let mut session = Session::new();
    session.stack_mut().begin_macro("one").unwrap();
    let err: CoreError = session.stack_mut().begin_macro("two").unwrap_err().into();
    assert!(matches!(
        err,
        CoreError::Undo(UndoError::MacroAlreadyRunning { .. })
    ));
}

#[test]
fn test_constraint_side_effects_are_not_recorded_separately() {
    let mut session = Session::new();
    let a = free(&mut session, "a", 1.0);
    let b = free(&mut session, "b", 2.0);
    session
        .add_constraint(
            b,
            "a_from_b",
            modelcore_rs::Constraint::obj_ref(a, "2*", b).unwrap(),
        )
        .unwrap();

    session.set_value(b, 5.0).unwrap();
    assert_eq!(session.stack().history_len(), 1);

    let group_text = session.stack().undo_text().unwrap();
    assert_eq!(group_text, "b value changed from 2 to 5");

    session.undo().unwrap();
    assert_eq!(session.raw_value(a).unwrap(), 4.0);
}

#[test]
fn test_recording_can_be_switched_off() {
    let mut session = Session::with_config(SessionConfig {
        record_history: false,
        ..SessionConfig::default()
    });
    let p = free(&mut session, "p", 1.0);
    session.set_value(p, 2.0).unwrap();
    assert!(!session.stack().can_undo());

    session.stack_mut().set_enabled(true);
    session.set_value(p, 3.0).unwrap();
    assert!(session.stack().can_undo());
}

#[test]
fn test_history_limit() {
    let mut session = Session::with_config(SessionConfig {
        max_history: Some(3),
        ..SessionConfig::default()
    });
    let p = free(&mut session, "p", 0.0);
    for i in 1..=10 {
        session.set_value(p, i as f64).unwrap();
    }
    assert_eq!(session.stack().history_len(), 3);
    while session.undo().unwrap() {}
    assert_eq!(session.raw_value(p).unwrap(), 7.0);
}

#[test]
fn test_commands_are_inspectable() {
    let mut session = Session::new();
    let p = free(&mut session, "p", 0.0);
    session.set_fixed(p, true).unwrap();

    session.undo().unwrap();
    session.redo().unwrap();
    assert!(session.parameter(p).unwrap().fixed());

    let command = modelcore_rs::undo::UndoCommand::new(
        p,
        "p",
        Field::Fixed,
        FieldValue::Flag(false),
        FieldValue::Flag(true),
    );
    assert_eq!(command.inverse().new, FieldValue::Flag(false));
}
