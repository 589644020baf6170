//! Structured text reports of a baseplate layout.
//!
//! Text first: a failing scenario prints the report, and a person reads it
//! next to the bench drawing. `to_json` exists for diffing in CI logs.

use std::fmt;

use composers::AssemblyReport;
use layout_engine::Baseplate;
use serde::Serialize;

use crate::oracle::OracleVerdict;

/// A complete layout report with all sections.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutReport {
    pub label: String,
    /// `[dx, dy, dz]` of the plate.
    pub dimensions: [f64; 3],
    pub beams: Vec<BeamEntry>,
    pub elements: Vec<ElementEntry>,
    pub oracle_results: Vec<OracleVerdict>,
    pub errors: Vec<(String, String)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BeamEntry {
    pub name: String,
    pub wavelength: Option<f64>,
    pub branches: usize,
    pub open_branches: usize,
    pub elements: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElementEntry {
    pub name: String,
    pub kind: String,
    pub position: [f64; 3],
    pub heading: f64,
    /// Nesting depth; mounts and other children are 1 or more.
    pub depth: usize,
}

impl LayoutReport {
    /// Snapshot a baseplate.
    pub fn from_baseplate(bp: &Baseplate) -> Self {
        let spec = bp.spec();
        let beams = bp
            .beams()
            .into_iter()
            .filter_map(|id| bp.beam(id))
            .map(|b| BeamEntry {
                name: b.name().to_string(),
                wavelength: b.wavelength(),
                branches: b.branches().count(),
                open_branches: b.open_branches().len(),
                elements: b.elements().len(),
            })
            .collect();
        let elements = bp
            .elements()
            .filter_map(|(id, e)| {
                let t = bp.plate_transform(id)?;
                Some(ElementEntry {
                    name: e.name.clone(),
                    kind: e.part.kind.name().to_string(),
                    position: t.translation(),
                    heading: t.heading_deg(),
                    depth: e.name.matches('/').count(),
                })
            })
            .collect();
        Self {
            label: spec.label.clone(),
            dimensions: [spec.dx, spec.dy, spec.dz],
            beams,
            elements,
            oracle_results: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_oracles(mut self, verdicts: Vec<OracleVerdict>) -> Self {
        self.oracle_results.extend(verdicts);
        self
    }

    /// Record the failed steps of an assembly run.
    pub fn with_assembly(mut self, report: &AssemblyReport) -> Self {
        self.errors.extend(
            report
                .failed
                .iter()
                .map(|f| (f.step.clone(), f.error.clone())),
        );
        self
    }

    pub fn all_passed(&self) -> bool {
        self.errors.is_empty() && self.oracle_results.iter().all(|v| v.passed)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }

    /// Format the report as text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("=== Baseplate \"{}\" ===\n", self.label));
        let [dx, dy, dz] = self.dimensions;
        out.push_str(&format!("Size: {dx:.1} x {dy:.1} x {dz:.1} mm\n\n"));

        out.push_str(&format!("Beams ({}):\n", self.beams.len()));
        for b in &self.beams {
            let wl = match b.wavelength {
                Some(w) => format!("{w:.1} nm"),
                None => "untagged".to_string(),
            };
            out.push_str(&format!(
                "  \"{}\" {wl}: {} elements, {} branches ({} open)\n",
                b.name, b.elements, b.branches, b.open_branches,
            ));
        }

        let top = self.elements.iter().filter(|e| e.depth == 0).count();
        out.push_str(&format!(
            "\nElements ({} placed, {} nested):\n",
            top,
            self.elements.len() - top,
        ));
        for e in &self.elements {
            let indent = "  ".repeat(e.depth + 1);
            out.push_str(&format!(
                "{indent}{} [{}] at ({:.2}, {:.2}) heading {:.1}\n",
                e.name, e.kind, e.position[0], e.position[1], e.heading,
            ));
        }

        if !self.oracle_results.is_empty() {
            out.push_str(&format!(
                "\nOracle Results ({} checks):\n",
                self.oracle_results.len()
            ));
            for v in &self.oracle_results {
                let status = if v.passed { "PASS" } else { "FAIL" };
                out.push_str(&format!("  [{}] {}: {}\n", status, v.oracle_name, v.detail));
            }
        }

        if self.errors.is_empty() {
            out.push_str("\nErrors: none\n");
        } else {
            out.push_str(&format!("\nErrors ({}):\n", self.errors.len()));
            for (step, err) in &self.errors {
                out.push_str(&format!("  {step}: {err}\n"));
            }
        }
        out
    }
}

impl fmt::Display for LayoutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}
