use layout_engine::Baseplate;
use optics_types::{Angle, Turn, INCH};
use part_factory::KernelBundle;
use serde::{Deserialize, Serialize};

use crate::module::{parts, Module};
use crate::types::{ComposeError, Composed, Frame, MirrorMount};

const PLATE_DX: f64 = 8.25 * INCH;
const PLATE_DY: f64 = 4.5 * INCH;
const GAP: f64 = INCH / 4.0;
const INPUT_X: f64 = 2.75 * INCH;

/// Single-pass AOM frequency shifter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinglepassConfig {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub mirror: MirrorMount,
    pub thumbscrews: bool,
    pub wavelength: Option<f64>,
    pub name_prefix: String,
}

impl Default for SinglepassConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            mirror: MirrorMount::Km05,
            thumbscrews: true,
            wavelength: None,
            name_prefix: String::new(),
        }
    }
}

impl SinglepassConfig {
    pub fn frame(&self) -> Frame {
        Frame::new(self.x, self.y, self.angle)
    }
}

/// The two singlepass layouts differ only in where the beam enters.
struct Variant {
    kind: &'static str,
    start_y: f64,
    heading: f64,
    input_turns: [Turn; 2],
    invert_splitter: bool,
    aom_distance: f64,
    aom_facing: f64,
    lens_distance: f64,
    output_turns: [Turn; 2],
}

const NORMAL: Variant = Variant {
    kind: "singlepass",
    start_y: 0.0,
    heading: 90.0,
    input_turns: [Turn::UpRight, Turn::RightUp],
    invert_splitter: true,
    aom_distance: 50.0,
    aom_facing: 180.0,
    lens_distance: 50.0,
    output_turns: [Turn::LeftDown, Turn::DownLeft],
};

const MIRRORED: Variant = Variant {
    kind: "singlepass_mirrored",
    start_y: PLATE_DY - GAP - 5.0,
    heading: 270.0,
    input_turns: [Turn::DownRight, Turn::RightDown],
    invert_splitter: false,
    aom_distance: 20.0,
    aom_facing: 0.0,
    lens_distance: 80.0,
    output_turns: [Turn::LeftUp, Turn::UpLeft],
};

/// Beam enters heading +y near the bottom edge.
pub fn singlepass(
    bp: &mut Baseplate,
    cfg: &SinglepassConfig,
    kb: &mut dyn KernelBundle,
) -> Result<Composed, ComposeError> {
    compose(bp, cfg, &NORMAL, kb)
}

/// Beam enters heading -y near the top edge.
pub fn singlepass_mirrored(
    bp: &mut Baseplate,
    cfg: &SinglepassConfig,
    kb: &mut dyn KernelBundle,
) -> Result<Composed, ComposeError> {
    compose(bp, cfg, &MIRRORED, kb)
}

fn compose(
    bp: &mut Baseplate,
    cfg: &SinglepassConfig,
    v: &Variant,
    kb: &mut dyn KernelBundle,
) -> Result<Composed, ComposeError> {
    let mut m = Module::new(bp, v.kind, cfg.frame(), &cfg.name_prefix);
    let mirror = || parts::mirror(cfg.mirror.part(cfg.thumbscrews));

    let beam = m.beam(PLATE_DX - INPUT_X, v.start_y, v.heading, cfg.wavelength)?;
    let [in1, in2] = v.input_turns;
    m.along(beam, "Input Mirror 1", mirror(), 0b1, INCH, m.turn(in1), kb)?;
    m.along(beam, "Input Mirror 2", mirror(), 0b1, INCH, m.turn(in2), kb)?;
    m.along(beam, "Half waveplate", parts::waveplate(), 0b1, 25.0, m.facing(90.0), kb)?;
    m.along(
        beam,
        "Beam Splitter",
        parts::splitter(v.invert_splitter, parts::skate_mount()),
        0b1,
        30.0,
        m.facing(180.0),
        kb,
    )?;
    m.along(
        beam,
        "Lens f45mm",
        parts::lens(45.0, "LA1213-AB"),
        0b11,
        25.0,
        m.facing(180.0),
        kb,
    )?;
    m.along(beam, "AOM", parts::isomet(), 0b11, v.aom_distance, m.facing(v.aom_facing), kb)?;

    // first order: follow the diffracted heading exactly
    let [out1, out2] = v.output_turns;
    m.along(
        beam,
        "Lens f50mm",
        parts::lens(50.0, "LA1213-AB"),
        0b111,
        v.lens_distance,
        Angle::Relative(0.0),
        kb,
    )?;
    m.along(beam, "Output Mirror 1", mirror(), 0b111, 15.0, m.turn(out1), kb)?;
    m.along(beam, "Iris", parts::iris(), 0b111, 19.0, m.facing(90.0), kb)?;
    m.along(beam, "Half waveplate Out", parts::waveplate(), 0b111, 14.0, m.facing(90.0), kb)?;
    m.along(beam, "Output Mirror 2", mirror(), 0b111, 21.5, m.turn(out2), kb)?;
    m.along(beam, "Fiberport", parts::fiberport_hca3(), 0b111, 19.0, m.facing(0.0), kb)?;
    Ok(m.finish())
}
