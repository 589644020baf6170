//! Assertion helpers with diagnostic output.
//!
//! Failures carry the context string, expected and actual values, and the
//! plate label so a failing scenario points at the element that moved.

use composers::AssemblyReport;
use layout_engine::Baseplate;
use optics_types::{signed_delta_deg, BranchIndex};

use crate::helpers::HarnessError;
use crate::oracle::OracleVerdict;

fn fail(ctx: &str, detail: String) -> HarnessError {
    HarnessError::AssertionFailed {
        detail: format!("[{ctx}] {detail}"),
    }
}

/// Assert a named element sits at plate-frame `(x, y)` within `tol`.
pub fn assert_position(
    bp: &Baseplate,
    name: &str,
    x: f64,
    y: f64,
    tol: f64,
    ctx: &str,
) -> Result<(), HarnessError> {
    let [ax, ay, _] = bp
        .element_id(name)
        .and_then(|id| bp.plate_transform(id))
        .map(|t| t.translation())
        .ok_or_else(|| HarnessError::ElementNotFound { name: name.into() })?;
    if (ax - x).abs() > tol || (ay - y).abs() > tol {
        return Err(fail(
            ctx,
            format!(
                "{name} on {}: expected ({x:.3}, {y:.3}), got ({ax:.3}, {ay:.3}) (tol={tol})",
                bp.label()
            ),
        ));
    }
    Ok(())
}

/// Assert a named element's heading in the plate frame, modulo 360.
pub fn assert_element_heading(
    bp: &Baseplate,
    name: &str,
    expected: f64,
    tol: f64,
    ctx: &str,
) -> Result<(), HarnessError> {
    let heading = bp
        .element_id(name)
        .and_then(|id| bp.plate_transform(id))
        .map(|t| t.heading_deg())
        .ok_or_else(|| HarnessError::ElementNotFound { name: name.into() })?;
    if signed_delta_deg(expected, heading).abs() > tol {
        return Err(fail(
            ctx,
            format!("{name} heading: expected {expected:.3}, got {heading:.3}"),
        ));
    }
    Ok(())
}

/// Assert the current heading of branch `branch` of the `ordinal`-th beam.
pub fn assert_beam_heading(
    bp: &Baseplate,
    ordinal: usize,
    branch: BranchIndex,
    expected: f64,
    tol: f64,
    ctx: &str,
) -> Result<(), HarnessError> {
    let heading = bp
        .beam_at(ordinal)
        .and_then(|id| bp.beam(id))
        .and_then(|b| b.heading(branch))
        .ok_or_else(|| HarnessError::BeamNotFound {
            name: format!("#{ordinal} branch {branch}"),
        })?;
    if signed_delta_deg(expected, heading).abs() > tol {
        return Err(fail(
            ctx,
            format!("beam #{ordinal} branch {branch}: expected {expected:.3}, got {heading:.3}"),
        ));
    }
    Ok(())
}

/// Assert every named element exists.
pub fn assert_elements_exist(bp: &Baseplate, names: &[&str], ctx: &str) -> Result<(), HarnessError> {
    let missing: Vec<_> = names
        .iter()
        .filter(|n| bp.element_id(n).is_none())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(fail(ctx, format!("missing on {}: {missing:?}", bp.label())))
    }
}

/// Assert an assembly ran every step.
pub fn assert_assembly_complete(report: &AssemblyReport, ctx: &str) -> Result<(), HarnessError> {
    if report.is_complete() {
        return Ok(());
    }
    let failures: Vec<String> = report
        .failed
        .iter()
        .map(|f| format!("{}: {}", f.step, f.error))
        .collect();
    Err(fail(ctx, format!("failed steps: {}", failures.join("; "))))
}

/// Assert an oracle verdict passed.
pub fn assert_oracle(verdict: &OracleVerdict) -> Result<(), HarnessError> {
    if verdict.passed {
        Ok(())
    } else {
        Err(HarnessError::OracleFailure {
            oracle: verdict.oracle_name.clone(),
            detail: verdict.detail.clone(),
        })
    }
}
