use layout_engine::{Baseplate, BaseplateSpec, Stop};
use optics_types::{Turn, INCH};
use part_factory::KernelBundle;
use serde::{Deserialize, Serialize};

use crate::module::{on_own_plate, parts, Module};
use crate::types::{ComposeError, Composed, Frame, MirrorMount};

const PLATE_DX: f64 = 9.5 * INCH;
const PLATE_DY: f64 = 5.0 * INCH;
const GAP: f64 = INCH / 8.0;
const INPUT_X: f64 = 6.5 * INCH;

/// Double-pass AOM with an f = 50 mm cat's eye.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoublepassConfig {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub mirror: MirrorMount,
    pub thumbscrews: bool,
    /// Machining seams of the standalone plate.
    pub x_splits: Vec<f64>,
    pub wavelength: Option<f64>,
    pub name_prefix: String,
}

impl Default for DoublepassConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            mirror: MirrorMount::K05s2,
            thumbscrews: true,
            x_splits: Vec::new(),
            wavelength: None,
            name_prefix: String::new(),
        }
    }
}

impl DoublepassConfig {
    pub fn frame(&self) -> Frame {
        Frame::new(self.x, self.y, self.angle)
    }

    /// The module's own plate, placed at the configured pose.
    pub fn plate_spec(&self) -> BaseplateSpec {
        BaseplateSpec::new(PLATE_DX, PLATE_DY, INCH)
            .with_origin(self.x, self.y, self.angle)
            .with_gap(GAP)
            .with_mount_holes(vec![[0, 0], [8, 3], [2, 0], [1, 2], [4, 0], [4, 4], [6, 2]])
            .with_x_splits(self.x_splits.clone())
            .with_label("Doublepass")
    }
}

/// Compose the double pass onto an existing plate.
///
/// The retro-reflected pass leaves the splitter on a second beam, which is
/// where the output optics sit. Beams: `[input, output]`.
pub fn doublepass(
    bp: &mut Baseplate,
    cfg: &DoublepassConfig,
    kb: &mut dyn KernelBundle,
) -> Result<Composed, ComposeError> {
    let mut m = Module::new(bp, "doublepass", cfg.frame(), &cfg.name_prefix);
    let mirror = || parts::mirror(cfg.mirror.part(cfg.thumbscrews));

    let beam = m.beam(INPUT_X, GAP, 90.0, cfg.wavelength)?;
    m.place("Input Fiberport", parts::fiberport_hca3(), INPUT_X, 2.6, 90.0, kb)?;
    m.along(beam, "Input Mirror 1", mirror(), 0b1, 17.0, m.turn(Turn::UpRight), kb)?;
    m.along(beam, "Input Mirror 2", mirror(), 0b1, INCH, m.turn(Turn::RightUp), kb)?;
    m.along(beam, "Half waveplate", parts::waveplate(), 0b1, 55.0, m.facing(90.0), kb)?;
    let splitter = m.along(
        beam,
        "Beam Splitter",
        parts::splitter(false, parts::skate_mount()),
        0b1,
        28.0,
        m.facing(90.0),
        kb,
    )?;
    m.along(beam, "AOM", parts::isomet(), 0b11, 55.0, m.facing(180.0), kb)?;
    let lens = m.along(
        beam,
        "Lens f50mm AB coat",
        parts::lens(50.0, "LA1213-AB"),
        0b110,
        50.0,
        m.facing(0.0),
        kb,
    )?;
    m.along(beam, "Quarter waveplate", parts::waveplate(), 0b110, 24.0, m.facing(180.0), kb)?;
    m.along(beam, "Iris", parts::iris(), 0b111, 17.5, m.facing(0.0), kb)?;
    m.relative(lens, "Retro Mirror", mirror(), -50.0, 0.0, 0.0, kb)?;

    // second pass, leaving the splitter towards +x
    let out = m.beam_from(splitter, 0.0, cfg.wavelength)?;
    m.along(out, "Output Mirror 1", mirror(), 0b1, 30.0, m.turn(Turn::RightDown), kb)?;
    m.along(out, "Output Mirror 2", mirror(), 0b1, 39.3, m.turn(Turn::DownLeft), kb)?;
    m.along(out, "Half waveplate Out", parts::waveplate(), 0b1, 110.0, m.facing(180.0), kb)?;
    m.along(out, "Iris Out", parts::iris(), 0b1, 30.0, m.facing(0.0), kb)?;
    m.along(
        out,
        "Output Fiberport",
        parts::fiberport_hca3(),
        0b1,
        Stop::AtX(GAP - 1.0),
        m.facing(0.0),
        kb,
    )?;
    Ok(m.finish())
}

/// The double pass on its own plate.
pub fn doublepass_plate(
    cfg: &DoublepassConfig,
    kb: &mut dyn KernelBundle,
) -> Result<(Baseplate, Composed), ComposeError> {
    let local = DoublepassConfig {
        x: 0.0,
        y: 0.0,
        angle: 0.0,
        ..cfg.clone()
    };
    on_own_plate(cfg.plate_spec(), kb, |bp, kb| doublepass(bp, &local, kb))
}
