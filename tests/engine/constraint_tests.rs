//! Integration tests for constraint evaluation inside a session

use modelcore_rs::constraints::{Comparison, Constraint, FieldRef, SimpleContext, Transform};
use modelcore_rs::session::Session;

use crate::test_helpers::{approx_eq, bounded, free};

#[test]
fn test_operator_parsing() {
    assert_eq!(Comparison::parse("<=").unwrap(), Comparison::LessThanOrEqual);
    assert_eq!(Comparison::parse("!=").unwrap(), Comparison::NotEqual);
    assert!(Comparison::parse("=<").is_err());

    assert_eq!(Transform::parse("").unwrap(), Transform::Identity);
    assert_eq!(Transform::parse("-").unwrap(), Transform::Negate);
    assert_eq!(Transform::parse("2.5*").unwrap(), Transform::Scale(2.5));
    assert_eq!(Transform::parse("1-").unwrap(), Transform::SubtractFrom(1.0));
    assert!(Transform::parse("2^").is_err());
}

#[test]
fn test_self_ref_against_context() {
    let mut session = Session::new();
    let p = bounded(&mut session, "p", 1.0, 0.0, 2.0);

    let mut ctx = SimpleContext::new();
    ctx.set_value(p, 5.0);
    ctx.set_field(p, FieldRef::Max, 2.0);
    let gate = Constraint::self_ref(p, "<=", FieldRef::Max).unwrap();
    assert_eq!(gate.evaluate(&ctx).unwrap(), 2.0);
}

#[test]
fn test_derived_value_follows_source() {
    let mut session = Session::new();
    let a = free(&mut session, "a", 0.0);
    let b = free(&mut session, "b", 1.0);
    session
        .add_constraint(b, "a_from_b", Constraint::obj_ref(a, "1-", b).unwrap())
        .unwrap();

    for x in [0.25, 0.5, 0.9] {
        session.set_value(b, x).unwrap();
        assert!(approx_eq(session.raw_value(a).unwrap(), 1.0 - x, 1e-12));
    }
}

#[test]
fn test_chain_propagates_transitively() {
    let mut session = Session::new();
    let a = free(&mut session, "a", 1.0);
    let b = free(&mut session, "b", 1.0);
    let c = free(&mut session, "c", 1.0);
    session
        .add_constraint(a, "b_from_a", Constraint::obj_ref(b, "2*", a).unwrap())
        .unwrap();
    session
        .add_constraint(b, "c_from_b", Constraint::obj_ref(c, "3+", b).unwrap())
        .unwrap();

    session.set_value(a, 2.0).unwrap();
    assert_eq!(session.raw_value(b).unwrap(), 4.0);
    assert_eq!(session.raw_value(c).unwrap(), 7.0);
}

#[test]
fn test_derived_value_respects_target_bounds() {
    let mut session = Session::new();
    let a = bounded(&mut session, "a", 1.0, 0.0, 5.0);
    let b = free(&mut session, "b", 1.0);
    session
        .add_constraint(b, "a_from_b", Constraint::obj_ref(a, "10*", b).unwrap())
        .unwrap();

    session.set_value(b, 2.0).unwrap();
    assert_eq!(session.raw_value(a).unwrap(), 5.0);
}

#[test]
fn test_apply_is_idempotent() {
    let mut session = Session::new();
    let a = free(&mut session, "a", 1.0);
    let b = free(&mut session, "b", 2.0);
    let link = Constraint::obj_ref(a, "2*", b).unwrap();
    session.add_constraint(b, "link", link.clone()).unwrap();

    let once = session.apply_constraint(&link).unwrap();
    let twice = session.apply_constraint(&link).unwrap();
    assert_eq!(once, twice);
    assert_eq!(session.raw_value(a).unwrap(), 4.0);
    // The second application changed nothing and recorded nothing
    assert_eq!(session.stack().history_len(), 1);
}

#[test]
fn test_division_by_zero_is_reported() {
    let mut session = Session::new();
    let a = free(&mut session, "a", 1.0);
    let b = free(&mut session, "b", 2.0);
    session
        .add_constraint(b, "inverse", Constraint::obj_ref(a, "1/", b).unwrap())
        .unwrap();

    assert!(session.set_value(b, 0.0).is_err());
    // The failed resolution committed nothing
    assert_eq!(session.raw_value(b).unwrap(), 2.0);
    assert_eq!(session.raw_value(a).unwrap(), 1.0);
    assert!(session.stack().is_recording());
}
