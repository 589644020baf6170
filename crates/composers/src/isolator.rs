use layout_engine::{Baseplate, BaseplateSpec, Stop};
use optics_types::{Turn, INCH};
use part_factory::KernelBundle;
use serde::{Deserialize, Serialize};

use crate::module::{on_own_plate, parts, Module};
use crate::types::{ComposeError, Composed, Frame, MirrorMount};

const PLATE_DX: f64 = 6.0 * INCH;
const PLATE_DY: f64 = 4.0 * INCH;
const GAP: f64 = INCH / 4.0;

/// Beam shaping and isolation after an ECDL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcdlIsolatorConfig {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub mirror: MirrorMount,
    pub thumbscrews: bool,
    /// Distance of the input beam below the module's top edge.
    pub input_y: f64,
    pub wavelength: Option<f64>,
    pub name_prefix: String,
}

impl Default for EcdlIsolatorConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            mirror: MirrorMount::Km05,
            thumbscrews: true,
            input_y: 0.5 * INCH,
            wavelength: Some(422.0),
            name_prefix: String::new(),
        }
    }
}

impl EcdlIsolatorConfig {
    pub fn frame(&self) -> Frame {
        Frame::new(self.x, self.y, self.angle)
    }

    pub fn plate_spec(&self) -> BaseplateSpec {
        let label = match self.wavelength {
            Some(w) => format!("{w}nm"),
            None => "ECDL Isolator".to_string(),
        };
        BaseplateSpec::new(PLATE_DX, PLATE_DY, INCH)
            .with_origin(self.x, self.y, self.angle)
            .with_gap(GAP)
            .with_mount_holes(vec![[1, 1], [5, 3], [0, 3], [4, 3], [4, 2]])
            .with_label(label)
    }
}

/// Two steering mirrors, an anamorphic cylindrical-lens pair and an
/// optical isolator.
pub fn ecdl_isolator(
    bp: &mut Baseplate,
    cfg: &EcdlIsolatorConfig,
    kb: &mut dyn KernelBundle,
) -> Result<Composed, ComposeError> {
    let mut m = Module::new(bp, "ecdl_isolator", cfg.frame(), &cfg.name_prefix);
    let mirror = || parts::mirror(cfg.mirror.part(cfg.thumbscrews));

    let beam = m.beam(0.0, PLATE_DY - cfg.input_y, 0.0, cfg.wavelength)?;
    m.along(beam, "Input_Mirror_1", mirror(), 0b1, INCH, m.turn(Turn::RightDown), kb)?;
    m.along(beam, "Input_Mirror_2", mirror(), 0b1, 2.0 * INCH, m.turn(Turn::DownRight), kb)?;
    m.along(
        beam,
        "Lens 1",
        parts::cylindrical_lens(4.0, 20.0, 22.0),
        0b1,
        Stop::AtX(2.5 * INCH),
        m.facing(0.0),
        kb,
    )?;
    m.along(
        beam,
        "Lens 2",
        parts::cylindrical_lens(5.1, 15.0, 17.0),
        0b1,
        35.0,
        m.facing(180.0),
        kb,
    )?;
    m.along(beam, "Optical_Isolator", parts::isolator(), 0b1, 40.0, m.facing(180.0), kb)?;
    Ok(m.finish())
}

pub fn ecdl_isolator_plate(
    cfg: &EcdlIsolatorConfig,
    kb: &mut dyn KernelBundle,
) -> Result<(Baseplate, Composed), ComposeError> {
    let local = EcdlIsolatorConfig {
        x: 0.0,
        y: 0.0,
        angle: 0.0,
        ..cfg.clone()
    };
    on_own_plate(cfg.plate_spec(), kb, |bp, kb| ecdl_isolator(bp, &local, kb))
}
