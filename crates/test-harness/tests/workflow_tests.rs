//! Tests for the LayoutBuilder itself.

use approx::assert_abs_diff_eq;
use optics_types::{Cardinal, Transform, Turn};
use test_harness::helpers::*;
use test_harness::{HarnessError, LayoutBuilder};

#[test]
fn builder_tracks_named_beams() {
    let mut m = LayoutBuilder::mock().unwrap();
    let id = m.beam("a", 0.0, 0.0, 0.0, Some(422.0)).unwrap();
    assert_eq!(m.beam_id("a").unwrap(), id);
    assert!(matches!(
        m.beam_id("b"),
        Err(HarnessError::BeamNotFound { .. })
    ));
}

#[test]
fn duplicate_beam_name_is_rejected() {
    let mut m = LayoutBuilder::mock().unwrap();
    m.beam("a", 0.0, 0.0, 0.0, None).unwrap();
    assert!(matches!(
        m.beam("a", 1.0, 0.0, 0.0, None),
        Err(HarnessError::DuplicateName { .. })
    ));
}

#[test]
fn along_resolves_positions_and_headings() {
    let mut m = LayoutBuilder::mock().unwrap();
    m.beam("b", 10.0, 10.0, 0.0, None).unwrap();
    m.along("b", "M", bare_mirror(), 0b1, 30.0, Turn::RightUp)
        .unwrap();
    m.along("b", "L", lens(50.0), 0b1, 25.0, Cardinal::Up).unwrap();
    let p = m.position("L").unwrap();
    assert_abs_diff_eq!(p[0], 40.0, epsilon = 1e-9);
    assert_abs_diff_eq!(p[1], 35.0, epsilon = 1e-9);
    assert_abs_diff_eq!(m.heading("b", 0b1).unwrap(), 90.0, epsilon = 1e-9);
}

#[test]
fn layout_errors_surface_unchanged() {
    let mut m = LayoutBuilder::mock().unwrap();
    m.place("X", block(3.0), 0.0, 0.0, 0.0).unwrap();
    let err = m.place("X", block(3.0), 5.0, 0.0, 0.0).unwrap_err();
    assert!(matches!(err, HarnessError::Layout(_)));
    assert!(err.to_string().contains("X"));
}

#[test]
fn child_follows_parent() {
    let mut m = LayoutBuilder::mock().unwrap();
    m.place("Base", block(5.0), 20.0, 20.0, 90.0).unwrap();
    m.child("Base", "Top", block(2.0), Transform::from_translation(10.0, 0.0, 0.0))
        .unwrap();
    let p = m.position("Top").unwrap();
    assert_abs_diff_eq!(p[0], 20.0, epsilon = 1e-9);
    assert_abs_diff_eq!(p[1], 30.0, epsilon = 1e-9);
}

#[test]
fn history_lists_operations_in_order() {
    let mut m = LayoutBuilder::mock().unwrap();
    m.beam("b", 0.0, 0.0, 0.0, None).unwrap();
    m.along("b", "L", lens(50.0), 0b1, 5.0, Cardinal::Right).unwrap();
    m.relative("L", "R", block(1.0), 1.0, 0.0, 0.0).unwrap();
    assert_eq!(m.history(), ["beam b", "along b L", "relative L R"]);
}

#[test]
fn oracles_pass_on_a_clean_layout() {
    let mut m = LayoutBuilder::mock().unwrap();
    m.beam("b", 5.0, 5.0, 0.0, None).unwrap();
    m.along("b", "PBS", splitter(true), 0b1, 20.0, Cardinal::Right)
        .unwrap();
    m.along("b", "L", lens(30.0), 0b10, 10.0, Cardinal::Right).unwrap();
    m.assert_oracles().unwrap();
}
