use layout_engine::Baseplate;
use optics_types::INCH;
use part_factory::KernelBundle;
use serde::{Deserialize, Serialize};

use crate::module::{parts, Module};
use crate::types::{ComposeError, Composed, Frame, MirrorMount};

/// Picks off a little light and fibers it to the wavemeter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamPickoffConfig {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub mirror: MirrorMount,
    pub thumbscrews: bool,
    /// Mirror normals sit at `fold_angle ± 90`; the leg between them runs
    /// at twice this heading.
    pub fold_angle: f64,
    pub wavelength: Option<f64>,
    pub name_prefix: String,
}

impl Default for BeamPickoffConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: -0.5,
            angle: 0.0,
            mirror: MirrorMount::Km05,
            thumbscrews: true,
            fold_angle: 60.0,
            wavelength: None,
            name_prefix: String::new(),
        }
    }
}

impl BeamPickoffConfig {
    pub fn frame(&self) -> Frame {
        Frame::new(self.x, self.y, self.angle)
    }
}

pub fn beam_pickoff(
    bp: &mut Baseplate,
    cfg: &BeamPickoffConfig,
    kb: &mut dyn KernelBundle,
) -> Result<Composed, ComposeError> {
    let mut m = Module::new(bp, "beam_pickoff", cfg.frame(), &cfg.name_prefix);
    let mirror = || parts::mirror(cfg.mirror.part(cfg.thumbscrews));
    let beam = m.beam(0.0, INCH, 0.0, cfg.wavelength)?;
    // mirror normals straddle the fold so the beam leaves parallel to how it came
    let fold = cfg.fold_angle;
    m.along(beam, "Input Mirror 1", mirror(), 0b1, 2.0 * INCH + 5.0, m.facing(fold + 90.0), kb)?;
    m.along(beam, "Input Mirror 2", mirror(), 0b1, 2.0 * INCH - 5.0, m.facing(fold - 90.0), kb)?;
    m.along(beam, "Fiberport", parts::fiberport_ks1t(), 0b1, 53.0, m.facing(180.0), kb)?;
    Ok(m.finish())
}
