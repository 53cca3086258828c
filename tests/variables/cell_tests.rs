//! Integration tests for value cells

use std::cell::RefCell;
use std::rc::Rc;

use modelcore_rs::session::{DisabledWritePolicy, Session, SessionConfig};
use modelcore_rs::variables::{Callback, ValueCell};
use modelcore_rs::CoreError;

#[test]
fn test_cell_lifecycle() {
    let mut session = Session::new();
    let cell = ValueCell::new("temperature", 300.0)
        .with_unit("K")
        .unwrap()
        .with_description("sample temperature")
        .with_url("https://example.org/temperature");
    let t = session.add_cell(cell, None).unwrap();

    // Check initial state
    let cell = session.cell(t).unwrap();
    assert_eq!(cell.raw_value(), 300.0);
    assert_eq!(cell.display_name(), "temperature");
    assert!(cell.enabled());
    assert!(!cell.is_virtual());
    assert_eq!(session.value(t).unwrap().to_string(), "300 K");

    // Plain cells accept any value
    session.set_value(t, -12.5).unwrap();
    assert_eq!(session.raw_value(t).unwrap(), -12.5);

    // Disable and try again (lenient by default)
    session.set_enabled(t, false).unwrap();
    session.set_value(t, 1.0).unwrap();
    assert_eq!(session.raw_value(t).unwrap(), -12.5);
}

#[test]
fn test_strict_policy_from_json_config() {
    let config = SessionConfig::from_json(r#"{"on_disabled_write": "Strict"}"#).unwrap();
    assert_eq!(config.on_disabled_write, DisabledWritePolicy::Strict);

    let mut session = Session::with_config(config);
    let a = session
        .add_cell(ValueCell::new("a", 1.0).with_enabled(false), None)
        .unwrap();
    let err = session.set_value(a, 2.0).unwrap_err();
    assert!(matches!(err, CoreError::CoreSet { ref name, .. } if name == "a"));
}

#[test]
fn test_setter_callback_receives_committed_value() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let callback = Callback::new().with_setter(move |v| {
        sink.borrow_mut().push(v);
        Ok(())
    });

    let mut session = Session::new();
    let a = session
        .add_cell(ValueCell::new("a", 0.0).with_callback(callback), None)
        .unwrap();
    session.set_value(a, 1.0).unwrap();
    session.set_value(a, 2.0).unwrap();
    session.undo().unwrap();

    assert_eq!(*seen.borrow(), vec![1.0, 2.0, 1.0]);
}

#[test]
fn test_getter_failure_is_a_value_error() {
    let callback = Callback::new().with_getter(|| Err("sensor unplugged".into()));
    let mut session = Session::new();
    let a = session
        .add_cell(ValueCell::new("a", 0.0).with_callback(callback), None)
        .unwrap();
    assert!(matches!(session.value(a), Err(CoreError::ValueError(_))));
    assert_eq!(session.raw_value(a).unwrap(), 0.0);
}

#[test]
fn test_unknown_handle_is_a_lookup_error() {
    let mut session = Session::new();
    let a = session.add_cell(ValueCell::new("a", 0.0), None).unwrap();
    session.release(a).unwrap();
    let err = session.set_value(a, 1.0).unwrap_err();
    assert!(err.is_lookup());
}
