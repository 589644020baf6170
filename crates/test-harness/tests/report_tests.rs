//! Tests for the report module.

use composers::{isotope_separation, IsotopeSeparationConfig};
use geom_kernel::MockKernel;
use optics_types::{Cardinal, Turn};
use test_harness::helpers::*;
use test_harness::oracle::check_element_count;
use test_harness::{LayoutBuilder, LayoutReport};

#[test]
fn empty_plate_report() {
    let m = LayoutBuilder::mock().unwrap();
    let text = LayoutReport::from_baseplate(m.plate()).to_text();
    assert!(text.contains("=== Baseplate \"test\" ==="), "{text}");
    assert!(text.contains("Beams (0):"));
    assert!(text.contains("Elements (0 placed, 0 nested)"));
    assert!(text.contains("Errors: none"));
}

#[test]
fn report_lists_beams_with_wavelength() {
    let mut m = LayoutBuilder::mock().unwrap();
    m.beam("a", 0.0, 5.0, 0.0, Some(422.0)).unwrap();
    m.beam("b", 0.0, 15.0, 0.0, None).unwrap();
    let text = LayoutReport::from_baseplate(m.plate()).to_text();
    assert!(text.contains("Beams (2):"));
    assert!(text.contains("422.0 nm"), "{text}");
    assert!(text.contains("untagged"));
}

#[test]
fn report_nests_mount_children() {
    let mut m = LayoutBuilder::mock().unwrap();
    m.beam("a", 0.0, 5.0, 0.0, None).unwrap();
    m.along("a", "M1", mirror(), 0b1, 20.0, Turn::RightUp).unwrap();
    let report = LayoutReport::from_baseplate(m.plate());
    let nested: Vec<_> = report.elements.iter().filter(|e| e.depth > 0).collect();
    assert_eq!(nested.len(), 1);
    assert_eq!(nested[0].name, "M1/mount");
    assert_eq!(nested[0].kind, "mirror_mount_km05");

    let text = report.to_text();
    assert!(text.contains("Elements (1 placed, 1 nested)"), "{text}");
    assert!(text.contains("    M1/mount [mirror_mount_km05]"));
}

#[test]
fn report_counts_split_branches() {
    let mut m = LayoutBuilder::mock().unwrap();
    m.beam("a", 0.0, 5.0, 0.0, None).unwrap();
    m.along("a", "PBS", splitter(false), 0b1, 20.0, Cardinal::Right)
        .unwrap();
    let report = LayoutReport::from_baseplate(m.plate());
    assert_eq!(report.beams[0].branches, 3);
    assert_eq!(report.beams[0].open_branches, 2);
}

#[test]
fn oracle_section_shows_pass_and_fail() {
    let mut m = LayoutBuilder::mock().unwrap();
    m.place("X", block(3.0), 10.0, 10.0, 0.0).unwrap();
    let report = LayoutReport::from_baseplate(m.plate()).with_oracles(vec![
        check_element_count(m.plate(), 1),
        check_element_count(m.plate(), 2),
    ]);
    let text = report.to_text();
    assert!(text.contains("Oracle Results (2 checks):"));
    assert!(text.contains("[PASS]"));
    assert!(text.contains("[FAIL]"));
    assert!(!report.all_passed());
}

#[test]
fn assembly_failures_are_reported() {
    let mut k = MockKernel::new();
    let (bp, steps) = isotope_separation(&IsotopeSeparationConfig::default(), &mut k).unwrap();
    let report = LayoutReport::from_baseplate(&bp).with_assembly(&steps);
    assert!(report.all_passed(), "{report}");
    assert_eq!(report.label, "Isotope Separation");
}

#[test]
fn report_serializes_to_json() {
    let mut m = LayoutBuilder::mock().unwrap();
    m.beam("a", 0.0, 5.0, 0.0, Some(397.0)).unwrap();
    m.along("a", "L", lens(50.0), 0b1, 10.0, Cardinal::Right).unwrap();
    let json = LayoutReport::from_baseplate(m.plate()).to_json();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["label"], "test");
    assert_eq!(value["elements"][0]["name"], "L");
    assert_eq!(value["beams"][0]["wavelength"], 397.0);
}
