use layout_engine::{Baseplate, BaseplateSpec};
use optics_types::INCH;
use part_factory::KernelBundle;
use serde::{Deserialize, Serialize};

use crate::module::{on_own_plate, parts, Module};
use crate::types::{ComposeError, Composed, Frame};

const PLATE_D: f64 = 3.0 * INCH;
const GAP: f64 = INCH / 8.0;

/// Two-lens input telescope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelescopeConfig {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub focal_lengths: [f64; 2],
    /// Lens separation along the beam.
    pub spacing: f64,
    pub wavelength: Option<f64>,
    pub name_prefix: String,
}

impl Default for TelescopeConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            focal_lengths: [50.0, 50.0],
            spacing: 45.0,
            wavelength: None,
            name_prefix: String::new(),
        }
    }
}

impl TelescopeConfig {
    pub fn frame(&self) -> Frame {
        Frame::new(self.x, self.y, self.angle)
    }

    pub fn plate_spec(&self) -> BaseplateSpec {
        BaseplateSpec::new(PLATE_D, PLATE_D, INCH)
            .with_origin(self.x, self.y, self.angle)
            .with_gap(GAP)
            .with_mount_holes(vec![[0, 0], [0, 2], [2, 0], [2, 2]])
            .with_label("Telescope")
    }
}

/// Lens pair centred on the module's two-inch working span.
pub fn telescope(
    bp: &mut Baseplate,
    cfg: &TelescopeConfig,
    kb: &mut dyn KernelBundle,
) -> Result<Composed, ComposeError> {
    let mut m = Module::new(bp, "telescope", cfg.frame(), &cfg.name_prefix);
    let [f1, f2] = cfg.focal_lengths;
    let beam = m.beam(0.0, 1.5 * INCH, 0.0, cfg.wavelength)?;
    let offset = (2.0 * INCH - cfg.spacing) / 2.0 + 0.5 * INCH;
    m.along(beam, "Lens 1", parts::lens(f1, ""), 0b1, offset, m.facing(180.0), kb)?;
    m.along(beam, "Lens 2", parts::lens(f2, ""), 0b1, cfg.spacing, m.facing(0.0), kb)?;
    Ok(m.finish())
}

pub fn telescope_plate(
    cfg: &TelescopeConfig,
    kb: &mut dyn KernelBundle,
) -> Result<(Baseplate, Composed), ComposeError> {
    let local = TelescopeConfig {
        x: 0.0,
        y: 0.0,
        angle: 0.0,
        ..cfg.clone()
    };
    on_own_plate(cfg.plate_spec(), kb, |bp, kb| telescope(bp, &local, kb))
}
