//! Integration tests for constraint registration

use modelcore_rs::constraints::{Bucket, Constraint, ConstraintError};
use modelcore_rs::session::Session;
use modelcore_rs::variables::ValueCell;
use modelcore_rs::CoreError;

use crate::test_helpers::free;

#[test]
fn test_user_constraints_keep_insertion_order() {
    let mut session = Session::new();
    let p = free(&mut session, "p", 1.0);
    session
        .add_constraint(p, "upper", Constraint::numeric(p, "<=", 10.0).unwrap())
        .unwrap();
    session
        .add_constraint(p, "lower", Constraint::numeric(p, ">=", -10.0).unwrap())
        .unwrap();
    // Replacing a key keeps its position
    session
        .add_constraint(p, "upper", Constraint::numeric(p, "<=", 5.0).unwrap())
        .unwrap();

    let keys: Vec<String> = session
        .constraints(p, Bucket::User)
        .unwrap()
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(keys, vec!["upper", "lower"]);

    session.set_value(p, 7.0).unwrap();
    assert_eq!(session.raw_value(p).unwrap(), 5.0);
}

#[test]
fn test_operands_must_be_values() {
    let mut session = Session::new();
    let p = free(&mut session, "p", 1.0);
    let group = session.add_composite("group", &[("p", p)]).unwrap();

    let err = session
        .add_constraint(p, "bad", Constraint::obj_ref(group, "2*", p).unwrap())
        .unwrap_err();
    assert!(matches!(err, CoreError::WrongKind { .. }));
}

#[test]
fn test_cycles_are_rejected_transitively() {
    let mut session = Session::new();
    let a = free(&mut session, "a", 1.0);
    let b = free(&mut session, "b", 1.0);
    let c = free(&mut session, "c", 1.0);
    session
        .add_constraint(a, "b_from_a", Constraint::obj_ref(b, "", a).unwrap())
        .unwrap();
    session
        .add_constraint(b, "c_from_b", Constraint::obj_ref(c, "", b).unwrap())
        .unwrap();

    let err = session
        .add_constraint(c, "a_from_c", Constraint::obj_ref(a, "", c).unwrap())
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Constraint(ConstraintError::Cycle { .. })
    ));
}

#[test]
fn test_remove_keeps_target_disabled_while_still_driven() {
    let mut session = Session::new();
    let a = free(&mut session, "a", 0.0);
    let b = free(&mut session, "b", 0.2);
    let c = free(&mut session, "c", 0.3);
    let rest = Constraint::multi_obj(a, &[(b, 1.0), (c, 1.0)], 1.0).unwrap();
    session.add_constraint(b, "rest", rest.clone()).unwrap();
    session.add_constraint(c, "rest", rest).unwrap();

    session.remove_constraint(b, "rest").unwrap();
    assert!(!session.cell(a).unwrap().enabled());
    session.remove_constraint(c, "rest").unwrap();
    assert!(session.cell(a).unwrap().enabled());

    assert!(matches!(
        session.remove_constraint(c, "rest"),
        Err(CoreError::Constraint(ConstraintError::UnknownConstraint { .. }))
    ));
}

#[test]
fn test_plain_cells_can_own_constraints() {
    let mut session = Session::new();
    let x = session.add_cell(ValueCell::new("x", 1.0), None).unwrap();
    let y = session.add_cell(ValueCell::new("y", 0.0), None).unwrap();
    session
        .add_constraint(x, "y_from_x", Constraint::obj_ref(y, "-", x).unwrap())
        .unwrap();
    session.set_value(x, 3.0).unwrap();
    assert_eq!(session.raw_value(y).unwrap(), -3.0);
}
