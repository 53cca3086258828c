//! Integration tests for virtual mirrors

use modelcore_rs::constraints::Bucket;
use modelcore_rs::graph::BASE_GRAPH;
use modelcore_rs::session::Session;
use modelcore_rs::variables::Parameter;
use modelcore_rs::CoreError;

use crate::test_helpers::{approx_eq, bounded, free};

#[test]
fn test_mirror_never_feeds_back() {
    let mut session = Session::new();
    let p = bounded(&mut session, "p", 1.0, 0.0, 10.0);
    let m = session.virtualize(p).unwrap();

    assert!(matches!(
        session.set_value(m, 5.0),
        Err(CoreError::VirtualImmutable { .. })
    ));
    assert!(session.set_bounds(m, Some(-1.0), None).is_err());
    assert!(session.set_enabled(m, true).is_err());
    assert_eq!(session.raw_value(p).unwrap(), 1.0);

    session.set_value(p, 6.0).unwrap();
    assert_eq!(session.raw_value(m).unwrap(), 6.0);
}

#[test]
fn test_mirror_follows_undo() {
    let mut session = Session::new();
    let p = free(&mut session, "p", 1.0);
    let m = session.virtualize(p).unwrap();

    session.set_value(p, 2.0).unwrap();
    session.undo().unwrap();
    assert_eq!(session.raw_value(m).unwrap(), 1.0);
    session.redo().unwrap();
    assert_eq!(session.raw_value(m).unwrap(), 2.0);
}

#[test]
fn test_nested_composite_mirror_and_realize() {
    let mut session = Session::new();
    let a = free(&mut session, "a", 1.0);
    let b = free(&mut session, "b", 2.0);
    let cell = session.add_composite("cell", &[("a", a), ("b", b)]).unwrap();
    let sample = session.add_composite("sample", &[("cell", cell)]).unwrap();

    let mirror = session.virtualize(sample).unwrap();
    let mirror_cell = session.field(mirror, "cell").unwrap();
    let mirror_a = session.field(mirror_cell, "a").unwrap();
    assert_eq!(session.route_name(mirror_a).unwrap(), "sample.cell.a");

    let real = session.realize(mirror).unwrap();
    assert!(!session.composite(real).unwrap().is_virtual());
    let real_a = session.field(session.field(real, "cell").unwrap(), "a").unwrap();
    session.set_value(real_a, 9.0).unwrap();
    assert_eq!(session.raw_value(a).unwrap(), 1.0);
    assert_eq!(session.raw_value(mirror_a).unwrap(), 1.0);
}

#[test]
fn test_release_mirror_unlinks_source() {
    let mut session = Session::new();
    let a = free(&mut session, "a", 1.0);
    let m = session.virtualize(a).unwrap();
    assert_eq!(session.constraints(a, Bucket::Virtual).unwrap().len(), 1);

    session.release(m).unwrap();
    assert!(session.constraints(a, Bucket::Virtual).unwrap().is_empty());
    assert!(session.graph().get_item_by_key(m).is_err());

    // Writes into the source keep working without the mirror
    session.set_value(a, 3.0).unwrap();
    assert_eq!(session.raw_value(a).unwrap(), 3.0);
}

#[test]
fn test_release_prunes_synced_graphs() {
    let mut session = Session::new();
    let a = free(&mut session, "a", 1.0);
    let group = session.add_composite("group", &[("a", a)]).unwrap();
    session.create_synced_graph("snapshot").unwrap();

    session.release(group).unwrap();
    assert!(!session.contains(a));
    for graph in [BASE_GRAPH, "snapshot"] {
        assert_eq!(session.graph().node_count(graph).unwrap(), 0);
        assert_eq!(session.graph().edge_count(graph).unwrap(), 0);
    }
}

#[test]
fn test_every_setter_refuses_mirrors() {
    let mut session = Session::new();
    let source = Parameter::with_bounds("p", 1.0, 0.0, 10.0)
        .unwrap()
        .with_unit("m")
        .unwrap();
    let p = session.add_parameter(source, None).unwrap();
    let m = session.virtualize(p).unwrap();
    let recorded = session.stack().history_len();

    let refused = [
        session.set_min(m, -5.0),
        session.set_max(m, 20.0),
        session.set_error(m, 0.1),
        session.set_display_name(m, Some("shadow")),
        session.convert_unit(m, "mm"),
        session.set_fixed(m, true),
        session.set_enabled(m, true),
        session.set_bounds(m, Some(-1.0), None),
    ];
    for result in refused {
        assert!(matches!(result, Err(CoreError::VirtualImmutable { .. })));
    }

    let mirror = session.parameter(m).unwrap();
    assert_eq!((mirror.min(), mirror.max()), (0.0, 10.0));
    assert_eq!(mirror.error(), 0.0);
    assert_eq!(mirror.cell().unit().symbol(), "m");
    assert_eq!(mirror.cell().display_name(), "p");
    assert_eq!(session.stack().history_len(), recorded);
}

#[test]
fn test_mirror_follows_unit_conversion() {
    let mut session = Session::new();
    let source = Parameter::with_bounds("a", 1.5, 0.0, 10.0)
        .unwrap()
        .with_unit("m")
        .unwrap();
    let a = session.add_parameter(source, None).unwrap();
    let m = session.virtualize(a).unwrap();
    let mm = session.virtualize(m).unwrap();

    session.convert_unit(a, "cm").unwrap();
    session.set_value(a, 200.0).unwrap();
    for mirror in [m, mm] {
        let shadow = session.parameter(mirror).unwrap();
        assert_eq!(shadow.cell().unit().symbol(), "cm");
        assert_eq!(shadow.raw_value(), 200.0);
        assert!(approx_eq(shadow.max(), 1000.0, 1e-9));
    }

    // Undoing the write and the conversion brings the mirrors back to metres
    session.undo().unwrap();
    session.undo().unwrap();
    let shadow = session.parameter(m).unwrap();
    assert_eq!(shadow.cell().unit().symbol(), "m");
    assert!(approx_eq(shadow.raw_value(), 1.5, 1e-12));
    assert!(approx_eq(session.raw_value(a).unwrap(), 1.5, 1e-12));

    session.redo().unwrap();
    assert_eq!(session.parameter(mm).unwrap().cell().unit().symbol(), "cm");
    assert!(approx_eq(session.raw_value(mm).unwrap(), 150.0, 1e-9));
}
