//! Verification oracles: pure functions returning pass/fail verdicts.
//!
//! Each oracle returns an `OracleVerdict` with diagnostic detail, not panics,
//! so a test can collect every failure in one pass.

use std::collections::{BTreeSet, HashSet};

use geom_kernel::{MockKernel, SolidHandle};
use layout_engine::{Baseplate, BeamId};
use serde::Serialize;

/// The result of a single oracle check.
#[derive(Debug, Clone, Serialize)]
pub struct OracleVerdict {
    pub oracle_name: String,
    pub passed: bool,
    pub detail: String,
    pub value: Option<f64>,
}

impl OracleVerdict {
    fn pass(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: None,
        }
    }

    fn pass_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: Some(value),
        }
    }

    fn fail(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: None,
        }
    }

    fn fail_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: Some(value),
        }
    }
}

// ── Registry Oracles ────────────────────────────────────────────────────────

/// Every registered element name is used once.
pub fn check_unique_names(bp: &Baseplate) -> OracleVerdict {
    let mut seen = HashSet::new();
    let mut dupes = Vec::new();
    for (_, element) in bp.elements() {
        if !seen.insert(element.name.as_str()) {
            dupes.push(element.name.clone());
        }
    }
    if dupes.is_empty() {
        OracleVerdict::pass("unique_names", format!("{} distinct names", seen.len()))
    } else {
        OracleVerdict::fail("unique_names", format!("repeated: {dupes:?}"))
    }
}

/// Element count matches.
pub fn check_element_count(bp: &Baseplate, expected: usize) -> OracleVerdict {
    let n = bp.len();
    if n == expected {
        OracleVerdict::pass_val("element_count", format!("{n} elements"), n as f64)
    } else {
        OracleVerdict::fail_val(
            "element_count",
            format!("{n} elements (expected {expected})"),
            n as f64,
        )
    }
}

// ── Transform Oracles ───────────────────────────────────────────────────────

/// Absolute pose equals parent pose composed with the stored offset.
pub fn check_transform_composition(bp: &Baseplate, eps: f64) -> OracleVerdict {
    let mut bad = Vec::new();
    let mut checked = 0;
    for (id, element) in bp.elements() {
        let (Some(parent), Some(relative), Some(absolute)) = (
            bp.parent_transform(id),
            bp.relative_transform(id),
            bp.transform(id),
        ) else {
            bad.push(format!("{}: unresolved", element.name));
            continue;
        };
        checked += 1;
        if !parent.compose(&relative).approx_eq(&absolute, eps) {
            bad.push(element.name.clone());
        }
    }
    if bad.is_empty() {
        OracleVerdict::pass(
            "transform_composition",
            format!("{checked} elements compose within {eps:e}"),
        )
    } else {
        OracleVerdict::fail(
            "transform_composition",
            format!("{} drifted: {:?}", bad.len(), &bad[..bad.len().min(5)]),
        )
    }
}

/// Replaying the journal on a fresh plate reproduces every transform bit for bit.
pub fn check_replay_determinism(bp: &Baseplate, kernel: &mut MockKernel) -> OracleVerdict {
    let replayed = match Baseplate::replay(bp.spec().clone(), bp.journal(), kernel) {
        Ok(p) => p,
        Err(e) => return OracleVerdict::fail("replay_determinism", format!("replay failed: {e}")),
    };
    let mut differing = Vec::new();
    for (id, element) in bp.elements() {
        let original = bp.plate_transform(id);
        let again = replayed
            .element_id(&element.name)
            .and_then(|r| replayed.plate_transform(r));
        if original != again {
            differing.push(element.name.clone());
        }
    }
    if differing.is_empty() && replayed.len() == bp.len() {
        OracleVerdict::pass(
            "replay_determinism",
            format!("{} elements identical after replay", bp.len()),
        )
    } else {
        OracleVerdict::fail(
            "replay_determinism",
            format!(
                "{} of {} differ, replay has {} elements: {:?}",
                differing.len(),
                bp.len(),
                replayed.len(),
                &differing[..differing.len().min(5)]
            ),
        )
    }
}

// ── Beam Oracles ────────────────────────────────────────────────────────────

/// Every produced branch hangs off a produced, split parent whose bits prefix it.
pub fn check_branch_prefixes(bp: &Baseplate) -> OracleVerdict {
    let mut bad = Vec::new();
    let mut total = 0;
    for id in bp.beams() {
        let Some(beam) = bp.beam(id) else { continue };
        let produced: BTreeSet<_> = beam.branches().collect();
        total += produced.len();
        for &b in &produced {
            let Some(parent) = b.parent() else { continue };
            let parent_split = beam.branch(parent).map(|s| s.split).unwrap_or(false);
            if !produced.contains(&parent) || !parent_split || !parent.is_prefix_of(b) {
                bad.push(format!("{}:{b}", beam.name()));
            }
        }
    }
    if bad.is_empty() {
        OracleVerdict::pass("branch_prefixes", format!("{total} branches consistent"))
    } else {
        OracleVerdict::fail("branch_prefixes", format!("orphaned branches: {bad:?}"))
    }
}

/// Wavelength tag of `beam` within `tol` nm.
pub fn check_wavelength(bp: &Baseplate, beam: BeamId, expected: f64, tol: f64) -> OracleVerdict {
    match bp.beam(beam).and_then(|b| b.wavelength()) {
        Some(w) if (w - expected).abs() <= tol => {
            OracleVerdict::pass_val("wavelength", format!("{w:.3} nm"), w)
        }
        Some(w) => OracleVerdict::fail_val(
            "wavelength",
            format!("{w:.3} nm (expected {expected} ± {tol})"),
            w,
        ),
        None => OracleVerdict::fail("wavelength", "beam is untagged or missing".into()),
    }
}

// ── Solid Oracles ───────────────────────────────────────────────────────────

/// Finalizing twice without changes gives the same solid content.
pub fn check_finalize_idempotent(bp: &mut Baseplate, kernel: &mut MockKernel) -> OracleVerdict {
    let first = match bp.finalize(kernel) {
        Ok(s) => s,
        Err(e) => return OracleVerdict::fail("finalize_idempotent", format!("finalize failed: {e}")),
    };
    let second = match bp.finalize(kernel) {
        Ok(s) => s,
        Err(e) => return OracleVerdict::fail("finalize_idempotent", format!("finalize failed: {e}")),
    };
    let same = first == second || kernel.canonical(&first) == kernel.canonical(&second);
    if same {
        OracleVerdict::pass("finalize_idempotent", "repeated finalize is stable".into())
    } else {
        OracleVerdict::fail("finalize_idempotent", "second finalize changed the solid".into())
    }
}

/// Number of primitives cut out of `solid`.
pub fn check_drill_count(kernel: &MockKernel, solid: &SolidHandle, expected: usize) -> OracleVerdict {
    let n = kernel
        .primitives(solid)
        .iter()
        .filter(|p| p.subtracted)
        .count();
    if n == expected {
        OracleVerdict::pass_val("drill_count", format!("{n} subtracted primitives"), n as f64)
    } else {
        OracleVerdict::fail_val(
            "drill_count",
            format!("{n} subtracted primitives (expected {expected})"),
            n as f64,
        )
    }
}
