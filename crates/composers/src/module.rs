//! Shared placement plumbing for composers.

use layout_engine::{Baseplate, BaseplateSpec, BeamId, ElementId, LayoutError, Stop};
use optics_types::{littrow_angle, Angle, BranchIndex, Turn};
use part_factory::params::{
    AomParams, CylindricalLensParams, EcdlParams, FiberportParams, IsolatorParams, IsometParams,
    LensParams, MirrorParams, PinholeParams, SkateMountParams, SplitterParams, WaveplateParams,
};
use part_factory::{KernelBundle, PartDescriptor, PartKind};
use tracing::info;

use crate::types::{ComposeError, Composed, Frame};

/// Places a module's beams and elements through its frame and name prefix.
pub(crate) struct Module<'a> {
    bp: &'a mut Baseplate,
    kind: &'static str,
    frame: Frame,
    prefix: String,
    out: Composed,
}

impl<'a> Module<'a> {
    pub(crate) fn new(bp: &'a mut Baseplate, kind: &'static str, frame: Frame, prefix: &str) -> Self {
        info!(
            module = kind,
            label = %bp.label(),
            x = frame.x,
            y = frame.y,
            angle = frame.angle,
            "composing"
        );
        Self {
            bp,
            kind,
            frame,
            prefix: prefix.to_string(),
            out: Composed::default(),
        }
    }

    pub(crate) fn frame(&self) -> Frame {
        self.frame
    }

    pub(crate) fn plate(&mut self) -> &mut Baseplate {
        self.bp
    }

    /// Name prefix for a nested module.
    pub(crate) fn scope(&self, scope: &str) -> String {
        format!("{}{scope} ", self.prefix)
    }

    fn name(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }

    pub(crate) fn facing(&self, deg: f64) -> Angle {
        self.frame.facing(deg)
    }

    pub(crate) fn turn(&self, turn: Turn) -> Angle {
        self.frame.turn(turn)
    }

    pub(crate) fn beam(
        &mut self,
        x: f64,
        y: f64,
        heading: f64,
        wavelength: Option<f64>,
    ) -> Result<BeamId, LayoutError> {
        let (px, py) = self.frame.point(x, y);
        let id = self
            .bp
            .add_beam_path(px, py, self.frame.heading(heading), wavelength)?;
        self.out.beams.push(id);
        Ok(id)
    }

    /// A beam leaving from the plate position of `element`.
    pub(crate) fn beam_from(
        &mut self,
        element: ElementId,
        heading: f64,
        wavelength: Option<f64>,
    ) -> Result<BeamId, LayoutError> {
        let [px, py, _] = self
            .bp
            .plate_transform(element)
            .ok_or(LayoutError::UnattachedParent)?
            .translation();
        let id = self
            .bp
            .add_beam_path(px, py, self.frame.heading(heading), wavelength)?;
        self.out.beams.push(id);
        Ok(id)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn place(
        &mut self,
        name: &str,
        part: impl Into<PartDescriptor>,
        x: f64,
        y: f64,
        heading: f64,
        kb: &mut dyn KernelBundle,
    ) -> Result<ElementId, LayoutError> {
        let (px, py) = self.frame.point(x, y);
        let name = self.name(name);
        let id = self
            .bp
            .place_element(&name, part.into(), px, py, self.frame.heading(heading), kb)?;
        self.out.elements.push(id);
        Ok(id)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn along(
        &mut self,
        beam: BeamId,
        name: &str,
        part: impl Into<PartDescriptor>,
        branch: u64,
        stop: impl Into<Stop>,
        angle: Angle,
        kb: &mut dyn KernelBundle,
    ) -> Result<ElementId, LayoutError> {
        let name = self.name(name);
        let branch = BranchIndex::from_bits(branch);
        let stop = self.plate_stop(beam, &name, branch, stop.into())?;
        let id = self
            .bp
            .place_element_along_beam(beam, &name, part.into(), branch, stop, angle, kb)?;
        self.out.elements.push(id);
        Ok(id)
    }

    /// Rewrite a module-frame stop for the plate.
    ///
    /// Off a quarter turn, a coordinate stop becomes the travel from the
    /// branch cursor to the module line.
    fn plate_stop(
        &self,
        beam: BeamId,
        name: &str,
        branch: BranchIndex,
        stop: Stop,
    ) -> Result<Stop, LayoutError> {
        if let Some(stop) = self.frame.stop(stop) {
            return Ok(stop);
        }
        let (axis, target) = match stop {
            Stop::AtX(x) => (0, x),
            Stop::AtY(y) => (1, y),
            Stop::Distance(_) => return Ok(stop),
        };
        // unknown beams and branches are reported by the plate
        let (Some(path), Some(tf)) = (self.bp.beam(beam), self.bp.beam_transform(beam)) else {
            return Ok(stop);
        };
        let Some(state) = path.branch(branch) else {
            return Ok(stop);
        };
        let c = state.cursor;
        let (s, co) = c.heading.to_radians().sin_cos();
        let p = tf.transform_point([c.x, c.y, 0.0]);
        let d = tf.transform_vector([co, s, 0.0]);
        let p = self.frame.local_point(p[0], p[1]);
        let d = self.frame.local_vector(d[0], d[1]);
        let (from, dir) = if axis == 0 { (p.0, d.0) } else { (p.1, d.1) };
        let unreachable = |reason: &str| LayoutError::UnreachableStop {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        if dir.abs() < 1e-12 {
            return Err(unreachable("branch runs parallel to the stop line"));
        }
        let t = (target - from) / dir;
        if t < -1e-9 {
            return Err(unreachable("stop line lies behind the branch cursor"));
        }
        Ok(Stop::Distance(t.max(0.0)))
    }

    /// Place at a module-frame offset from `base`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn relative(
        &mut self,
        base: ElementId,
        name: &str,
        part: impl Into<PartDescriptor>,
        dx: f64,
        dy: f64,
        heading: f64,
        kb: &mut dyn KernelBundle,
    ) -> Result<ElementId, LayoutError> {
        let (ox, oy) = self.frame.vector(dx, dy);
        let name = self.name(name);
        let id = self.bp.place_element_relative(
            base,
            &name,
            part.into(),
            ox,
            oy,
            self.frame.heading(heading),
            kb,
        )?;
        self.out.elements.push(id);
        Ok(id)
    }

    pub(crate) fn absorb(&mut self, nested: Composed) {
        self.out.extend(nested);
    }

    pub(crate) fn finish(self) -> Composed {
        info!(
            module = self.kind,
            beams = self.out.beams.len(),
            elements = self.out.elements.len(),
            "composed"
        );
        self.out
    }
}

/// Build a fresh plate from `spec` and compose onto it at its origin.
pub fn on_own_plate<F>(
    spec: BaseplateSpec,
    kb: &mut dyn KernelBundle,
    compose: F,
) -> Result<(Baseplate, Composed), ComposeError>
where
    F: FnOnce(&mut Baseplate, &mut dyn KernelBundle) -> Result<Composed, ComposeError>,
{
    let mut bp = Baseplate::new(spec)?;
    let composed = compose(&mut bp, kb)?;
    Ok((bp, composed))
}

pub(crate) fn littrow(wavelength_nm: f64, lines_per_mm: f64) -> Result<f64, ComposeError> {
    littrow_angle(wavelength_nm, lines_per_mm).ok_or(ComposeError::NoLittrowAngle {
        wavelength_nm,
        lines_per_mm,
    })
}

/// Part descriptors the composers reach for.
pub(crate) mod parts {
    use super::*;

    pub fn mirror(mount: PartKind) -> PartKind {
        PartKind::CircularMirror(MirrorParams {
            mount: Some(Box::new(mount)),
            ..Default::default()
        })
    }

    pub fn lens(focal_length: f64, part_number: &str) -> PartKind {
        PartKind::CircularLens(LensParams {
            part_number: part_number.to_string(),
            ..LensParams::new(focal_length)
        })
    }

    pub fn cylindrical_lens(thickness: f64, width: f64, height: f64) -> PartKind {
        PartKind::CylindricalLens(CylindricalLensParams {
            slots: true,
            ..CylindricalLensParams::new(thickness, width, height)
        })
    }

    pub fn waveplate() -> PartKind {
        PartKind::Waveplate(WaveplateParams::default())
    }

    pub fn splitter(invert: bool, mount: PartKind) -> PartKind {
        PartKind::CubeSplitter(SplitterParams {
            invert,
            mount: Some(Box::new(mount)),
            ..Default::default()
        })
    }

    pub fn skate_mount() -> PartKind {
        PartKind::SkateMount(SkateMountParams::default())
    }

    pub fn skate_mount_crossholes() -> PartKind {
        PartKind::SkateMountCrossholes(SkateMountParams::default())
    }

    pub fn iris() -> PartKind {
        PartKind::PinholeIda12(PinholeParams::default())
    }

    pub fn isomet() -> PartKind {
        PartKind::Isomet1205cOnKm100pm(IsometParams::default())
    }

    pub fn aom() -> PartKind {
        PartKind::Aom(AomParams::default())
    }

    pub fn isolator() -> PartKind {
        PartKind::Isolator405(IsolatorParams::default())
    }

    pub fn fiberport_hca3() -> PartKind {
        PartKind::FiberportMountHca3(FiberportParams::default())
    }

    pub fn fiberport_ks1t() -> PartKind {
        PartKind::FiberportMountKs1t(FiberportParams::default())
    }

    pub fn ecdl(littrow_angle: f64) -> PartKind {
        PartKind::Ecdl(EcdlParams::new(littrow_angle))
    }
}
