//! LayoutBuilder: fluent API for scripting baseplate layouts in tests.
//!
//! Beams get string names so scenarios read like a bench description;
//! everything else goes straight through the `Baseplate` API.

use std::collections::HashMap;

use geom_kernel::{MockKernel, SolidHandle};
use layout_engine::{Baseplate, BaseplateSpec, BeamId, ElementId};
use optics_types::{Angle, BranchIndex, Transform, INCH};
use part_factory::PartDescriptor;

use crate::helpers::HarnessError;
use crate::oracle::{self, OracleVerdict};

/// A baseplate plus the mock kernel it builds against.
pub struct LayoutBuilder {
    plate: Baseplate,
    kernel: MockKernel,
    beams: HashMap<String, BeamId>,
    history: Vec<String>,
}

impl LayoutBuilder {
    /// A four-by-four inch plate labelled "test".
    pub fn mock() -> Result<Self, HarnessError> {
        Self::with_spec(BaseplateSpec::new(4.0 * INCH, 4.0 * INCH, INCH).with_label("test"))
    }

    pub fn with_spec(spec: BaseplateSpec) -> Result<Self, HarnessError> {
        Ok(Self {
            plate: Baseplate::new(spec)?,
            kernel: MockKernel::new(),
            beams: HashMap::new(),
            history: Vec::new(),
        })
    }

    // ── Operations ──────────────────────────────────────────────────────

    pub fn beam(
        &mut self,
        name: &str,
        x: f64,
        y: f64,
        angle: f64,
        wavelength: Option<f64>,
    ) -> Result<BeamId, HarnessError> {
        if self.beams.contains_key(name) {
            return Err(HarnessError::DuplicateName { name: name.into() });
        }
        let id = self.plate.add_beam_path(x, y, angle, wavelength)?;
        self.beams.insert(name.to_string(), id);
        self.history.push(format!("beam {name}"));
        Ok(id)
    }

    pub fn place(
        &mut self,
        name: &str,
        part: PartDescriptor,
        x: f64,
        y: f64,
        angle: f64,
    ) -> Result<ElementId, HarnessError> {
        let id = self
            .plate
            .place_element(name, part, x, y, angle, &mut self.kernel)?;
        self.history.push(format!("place {name}"));
        Ok(id)
    }

    /// Place on branch `branch` (raw bits, `0b1` is the root) of a named beam.
    #[allow(clippy::too_many_arguments)]
    pub fn along(
        &mut self,
        beam: &str,
        name: &str,
        part: PartDescriptor,
        branch: u64,
        distance: f64,
        angle: impl Into<Angle>,
    ) -> Result<ElementId, HarnessError> {
        let id = self.beam_id(beam)?;
        let placed = self.plate.place_element_along_beam(
            id,
            name,
            part,
            BranchIndex::from_bits(branch),
            distance,
            angle,
            &mut self.kernel,
        )?;
        self.history.push(format!("along {beam} {name}"));
        Ok(placed)
    }

    pub fn relative(
        &mut self,
        base: &str,
        name: &str,
        part: PartDescriptor,
        dx: f64,
        dy: f64,
        angle: f64,
    ) -> Result<ElementId, HarnessError> {
        let base_id = self.element_id(base)?;
        let id = self
            .plate
            .place_element_relative(base_id, name, part, dx, dy, angle, &mut self.kernel)?;
        self.history.push(format!("relative {base} {name}"));
        Ok(id)
    }

    pub fn child(
        &mut self,
        parent: &str,
        name: &str,
        part: PartDescriptor,
        offset: Transform,
    ) -> Result<ElementId, HarnessError> {
        let parent_id = self.element_id(parent)?;
        let id = self
            .plate
            .attach_child(parent_id, name, part, offset, &mut self.kernel)?;
        self.history.push(format!("child {parent} {name}"));
        Ok(id)
    }

    pub fn finalize(&mut self) -> Result<SolidHandle, HarnessError> {
        Ok(self.plate.finalize(&mut self.kernel)?)
    }

    // ── Access ──────────────────────────────────────────────────────────

    pub fn plate(&self) -> &Baseplate {
        &self.plate
    }

    /// Plate and kernel together, for calling composers directly.
    pub fn parts(&mut self) -> (&mut Baseplate, &mut MockKernel) {
        (&mut self.plate, &mut self.kernel)
    }

    pub fn kernel(&self) -> &MockKernel {
        &self.kernel
    }

    /// Operations performed so far, one line each.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn beam_id(&self, name: &str) -> Result<BeamId, HarnessError> {
        self.beams
            .get(name)
            .copied()
            .ok_or_else(|| HarnessError::BeamNotFound { name: name.into() })
    }

    pub fn element_id(&self, name: &str) -> Result<ElementId, HarnessError> {
        self.plate
            .element_id(name)
            .ok_or_else(|| HarnessError::ElementNotFound { name: name.into() })
    }

    /// Plate-frame `[x, y, z]` of a named element.
    pub fn position(&self, name: &str) -> Result<[f64; 3], HarnessError> {
        let id = self.element_id(name)?;
        self.plate
            .plate_transform(id)
            .map(|t| t.translation())
            .ok_or_else(|| HarnessError::ElementNotFound { name: name.into() })
    }

    /// Current heading of a beam branch.
    pub fn heading(&self, beam: &str, branch: u64) -> Result<f64, HarnessError> {
        let id = self.beam_id(beam)?;
        self.plate
            .beam(id)
            .and_then(|b| b.heading(BranchIndex::from_bits(branch)))
            .ok_or_else(|| HarnessError::AssertionFailed {
                detail: format!("beam {beam} has no branch {branch:#b}"),
            })
    }

    // ── Checks ──────────────────────────────────────────────────────────

    /// Run every layout oracle that needs no expected values.
    pub fn run_oracles(&mut self) -> Vec<OracleVerdict> {
        let mut verdicts = vec![
            oracle::check_unique_names(&self.plate),
            oracle::check_transform_composition(&self.plate, 1e-9),
            oracle::check_branch_prefixes(&self.plate),
            oracle::check_replay_determinism(&self.plate, &mut self.kernel),
        ];
        verdicts.push(oracle::check_finalize_idempotent(
            &mut self.plate,
            &mut self.kernel,
        ));
        verdicts
    }

    /// Fail with the first failing oracle.
    pub fn assert_oracles(&mut self) -> Result<(), HarnessError> {
        match self.run_oracles().into_iter().find(|v| !v.passed) {
            Some(v) => Err(HarnessError::OracleFailure {
                oracle: v.oracle_name,
                detail: v.detail,
            }),
            None => Ok(()),
        }
    }
}
