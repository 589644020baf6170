//! Tests for verification oracles.

use composers::{isotope_separation, IsotopeSeparationConfig};
use geom_kernel::MockKernel;
use layout_engine::{Baseplate, BaseplateSpec, CombinerOptions};
use optics_types::{Cardinal, Turn, INCH};
use test_harness::helpers::*;
use test_harness::oracle::*;
use test_harness::LayoutBuilder;

/// A short bench: mirror fold, splitter, lens on each output.
fn build_bench() -> LayoutBuilder {
    let mut m = LayoutBuilder::mock().unwrap();
    m.beam("main", 5.0, 10.0, 0.0, Some(397.0)).unwrap();
    m.along("main", "M1", mirror(), 0b1, 20.0, Turn::RightUp).unwrap();
    m.along("main", "PBS", splitter(false), 0b1, 20.0, Cardinal::Up)
        .unwrap();
    m.along("main", "L through", lens(50.0), 0b10, 15.0, Cardinal::Up)
        .unwrap();
    m.along("main", "L deflected", lens(50.0), 0b11, 15.0, Cardinal::Left)
        .unwrap();
    m
}

// ── Registry Oracles ────────────────────────────────────────────────────

#[test]
fn unique_names_passes_for_bench() {
    let m = build_bench();
    let v = check_unique_names(m.plate());
    assert!(v.passed, "{}", v.detail);
}

#[test]
fn element_count_reports_value() {
    let m = build_bench();
    let n = m.plate().len();
    let v = check_element_count(m.plate(), n);
    assert!(v.passed);
    assert_eq!(v.value, Some(n as f64));
    assert!(!check_element_count(m.plate(), n + 1).passed);
}

// ── Transform Oracles ───────────────────────────────────────────────────

#[test]
fn composition_holds_for_bench() {
    let m = build_bench();
    let v = check_transform_composition(m.plate(), 1e-9);
    assert!(v.passed, "{}", v.detail);
}

#[test]
fn composition_holds_down_a_long_chain() {
    let mut m = LayoutBuilder::mock().unwrap();
    m.place("B0", block(2.0), 10.0, 10.0, 7.0).unwrap();
    for i in 1..12 {
        m.relative(&format!("B{}", i - 1), &format!("B{i}"), block(2.0), 1.5, 0.5, 13.0)
            .unwrap();
    }
    let v = check_transform_composition(m.plate(), 1e-9);
    assert!(v.passed, "{}", v.detail);
}

#[test]
fn replay_is_bit_identical() {
    let mut m = build_bench();
    let (bp, k) = m.parts();
    let v = check_replay_determinism(bp, k);
    assert!(v.passed, "{}", v.detail);
}

#[test]
fn replay_is_bit_identical_for_assembly() {
    let mut k = MockKernel::new();
    let (bp, _) = isotope_separation(&IsotopeSeparationConfig::default(), &mut k).unwrap();
    let v = check_replay_determinism(&bp, &mut k);
    assert!(v.passed, "{}", v.detail);
}

// ── Beam Oracles ────────────────────────────────────────────────────────

#[test]
fn branch_prefixes_hold_after_split() {
    let m = build_bench();
    let v = check_branch_prefixes(m.plate());
    assert!(v.passed, "{}", v.detail);
}

#[test]
fn combined_wavelength_is_866() {
    let mut k = MockKernel::new();
    let mut bp = Baseplate::new(BaseplateSpec::new(6.0 * INCH, 6.0 * INCH, INCH)).unwrap();
    let pump = bp.add_beam_path(0.0, 10.0, 0.0, Some(850.0)).unwrap();
    let seed = bp.add_beam_path(0.0, 30.0, 0.0, Some(429.0)).unwrap();
    let out = bp
        .combine_beams(&[pump, seed], &CombinerOptions::default(), &mut k)
        .unwrap();
    let v = check_wavelength(&bp, out, 866.15, 0.01);
    assert!(v.passed, "{}", v.detail);
    assert!(!check_wavelength(&bp, pump, 866.0, 0.01).passed);
}

#[test]
fn untagged_beam_fails_wavelength_check() {
    let mut m = LayoutBuilder::mock().unwrap();
    let id = m.beam("plain", 0.0, 0.0, 0.0, None).unwrap();
    assert!(!check_wavelength(m.plate(), id, 397.0, 1.0).passed);
}

// ── Solid Oracles ───────────────────────────────────────────────────────

#[test]
fn finalize_is_idempotent() {
    let mut m = build_bench();
    let (bp, k) = m.parts();
    let v = check_finalize_idempotent(bp, k);
    assert!(v.passed, "{}", v.detail);
}

#[test]
fn mount_holes_show_up_as_drills() {
    let plain = BaseplateSpec::new(4.0 * INCH, 4.0 * INCH, INCH);
    let mut m = LayoutBuilder::with_spec(plain.clone()).unwrap();
    let solid = m.finalize().unwrap();
    assert!(check_drill_count(m.kernel(), &solid, 0).passed);

    let mut m = LayoutBuilder::with_spec(plain.with_mount_holes(vec![[0, 0]])).unwrap();
    let solid = m.finalize().unwrap();
    let v = check_drill_count(m.kernel(), &solid, 0);
    assert!(!v.passed);
    assert!(v.value.unwrap() >= 1.0);
}
