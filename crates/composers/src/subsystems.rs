//! Laser subsystems of the isotope-separation bench.
//!
//! Each subsystem wires several modules together around one wavelength
//! and returns the beam it delivers.

use layout_engine::{Baseplate, BeamId, CombinerOptions};
use optics_types::{Turn, DEFAULT_GRATING_LINES_PER_MM, INCH};
use part_factory::KernelBundle;
use serde::{Deserialize, Serialize};

use crate::doublepass::{doublepass, DoublepassConfig};
use crate::isolator::{ecdl_isolator, EcdlIsolatorConfig};
use crate::module::{littrow, parts, Module};
use crate::photoionization::{photoionization_ecdl, PhotoionizationConfig};
use crate::pickoff::{beam_pickoff, BeamPickoffConfig};
use crate::singlepass::{singlepass_mirrored, SinglepassConfig};
use crate::telescope::{telescope, TelescopeConfig};
use crate::types::{ComposeError, Frame, MirrorMount};

/// Coarser ruling used for the infrared lasers.
pub const IR_GRATING_LINES_PER_MM: f64 = 1800.0;

fn tag(wavelength: f64) -> String {
    format!("{wavelength:.0}nm")
}

// ── Difference frequency ──────────────────────────────────────────────

/// Difference-frequency generation of a pump and a doubled seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DfgConfig {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    /// Pump wavelength, nm.
    pub pump: f64,
    /// Seed wavelength before doubling, nm.
    pub seed: f64,
    pub grating_lines_per_mm: f64,
    pub thumbscrews: bool,
    pub name_prefix: String,
}

impl Default for DfgConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 1.5 * INCH,
            angle: 0.0,
            pump: 850.0,
            seed: 858.0,
            grating_lines_per_mm: IR_GRATING_LINES_PER_MM,
            thumbscrews: true,
            name_prefix: String::new(),
        }
    }
}

/// Mix the pump with the second harmonic of the seed; 850 nm against
/// 429 nm gives the 866 nm repump light.
pub fn difference_frequency(
    bp: &mut Baseplate,
    cfg: &DfgConfig,
    kb: &mut dyn KernelBundle,
) -> Result<BeamId, ComposeError> {
    let littrow_angle = littrow(cfg.seed, cfg.grating_lines_per_mm)?;
    let frame = Frame::new(cfg.x, cfg.y, cfg.angle);
    let mut m = Module::new(bp, "difference_frequency", frame, &cfg.name_prefix);
    let offset = 0.05 * INCH;
    let harmonic = cfg.seed / 2.0;

    let pump = m.beam(0.0, 0.0, 0.0, Some(cfg.pump))?;
    let seed = m.beam(0.0, offset, 0.0, Some(cfg.seed))?;
    m.place(
        &format!("ECDL_{}", tag(cfg.seed)),
        parts::ecdl(littrow_angle),
        0.0,
        offset,
        0.0,
        kb,
    )?;
    m.along(
        seed,
        &format!("SHG_{}_to_{}", tag(cfg.seed), tag(harmonic)),
        parts::splitter(false, parts::skate_mount_crossholes()),
        0b1,
        0.5 * INCH,
        m.facing(0.0),
        kb,
    )?;
    let doubled = m.beam(0.5 * INCH, offset, 0.0, Some(harmonic))?;

    let options = CombinerOptions {
        angle: frame.heading(0.0),
        thumbscrews: cfg.thumbscrews,
        name_prefix: cfg.name_prefix.clone(),
        ..Default::default()
    };
    let mixed = m.plate().combine_beams(&[pump, doubled], &options, kb)?;
    m.finish();
    Ok(mixed)
}

// ── Second harmonic ───────────────────────────────────────────────────

/// Tunable fundamental, its second harmonic and the photoionization
/// optics running on the harmonic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonicConfig {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    /// Reference pump sharing the row, nm.
    pub pump: f64,
    /// Fundamental wavelength, nm.
    pub fundamental: f64,
    pub grating_lines_per_mm: f64,
    /// Ruling of the photoionization laser's grating.
    pub harmonic_grating_lines_per_mm: f64,
    pub thumbscrews: bool,
    pub name_prefix: String,
}

impl Default for HarmonicConfig {
    fn default() -> Self {
        Self {
            x: INCH,
            y: 2.5 * INCH,
            angle: 0.0,
            pump: 850.0,
            fundamental: 844.0,
            grating_lines_per_mm: IR_GRATING_LINES_PER_MM,
            harmonic_grating_lines_per_mm: DEFAULT_GRATING_LINES_PER_MM,
            thumbscrews: true,
            name_prefix: String::new(),
        }
    }
}

/// 844 nm doubled to 422 nm for calcium photoionization.
pub fn tune_and_double(
    bp: &mut Baseplate,
    cfg: &HarmonicConfig,
    kb: &mut dyn KernelBundle,
) -> Result<BeamId, ComposeError> {
    let littrow_angle = littrow(cfg.fundamental, cfg.grating_lines_per_mm)?;
    let frame = Frame::new(cfg.x, cfg.y, cfg.angle);
    let mut m = Module::new(bp, "tune_and_double", frame, &cfg.name_prefix);
    let harmonic = cfg.fundamental / 2.0;

    m.beam(0.0, 0.0, 0.0, Some(cfg.pump))?;
    m.place(
        &format!("ECDL_{}", tag(cfg.fundamental)),
        parts::ecdl(littrow_angle),
        0.0,
        0.0,
        0.0,
        kb,
    )?;
    let fundamental = m.beam(0.0, 0.0, 0.0, Some(cfg.fundamental))?;
    m.along(
        fundamental,
        &format!("SHG_{}_to_{}", tag(cfg.fundamental), tag(harmonic)),
        parts::splitter(false, parts::skate_mount()),
        0b1,
        0.5 * INCH,
        m.facing(0.0),
        kb,
    )?;
    let doubled = m.beam(0.5 * INCH, 0.0, 0.0, Some(harmonic))?;

    let ionization = PhotoionizationConfig {
        x: frame.x,
        y: frame.y,
        angle: frame.angle,
        thumbscrews: cfg.thumbscrews,
        wavelength: harmonic,
        grating_lines_per_mm: cfg.harmonic_grating_lines_per_mm,
        name_prefix: m.scope(&format!("Photoionization {}", tag(harmonic))),
        ..Default::default()
    };
    let nested = photoionization_ecdl(m.plate(), &ionization, kb)?;
    m.absorb(nested);
    m.finish();
    Ok(doubled)
}

// ── Cooling ───────────────────────────────────────────────────────────

/// Doppler-cooling laser delivered to the ion trap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoolingConfig {
    pub ion_trap_x: f64,
    pub ion_trap_y: f64,
    pub angle: f64,
    pub thumbscrews: bool,
    /// Nanometres.
    pub wavelength: f64,
    pub grating_lines_per_mm: f64,
    pub doublepass_mirror: MirrorMount,
    pub name_prefix: String,
}

impl Default for CoolingConfig {
    fn default() -> Self {
        Self {
            ion_trap_x: 3.0 * INCH,
            ion_trap_y: 3.0 * INCH,
            angle: 0.0,
            thumbscrews: true,
            wavelength: 397.0,
            grating_lines_per_mm: DEFAULT_GRATING_LINES_PER_MM,
            doublepass_mirror: MirrorMount::K05s2,
            name_prefix: String::new(),
        }
    }
}

/// ECDL, isolator, telescope and double pass, folded onto the trap.
///
/// `feed` is the beam driving the subsystem; one is added at the trap
/// position when `None`. Returns the beam that reaches the trap.
pub fn laser_cooling(
    bp: &mut Baseplate,
    cfg: &CoolingConfig,
    feed: Option<BeamId>,
    kb: &mut dyn KernelBundle,
) -> Result<BeamId, ComposeError> {
    let littrow_angle = littrow(cfg.wavelength, cfg.grating_lines_per_mm)?;
    let frame = Frame::new(cfg.ion_trap_x, cfg.ion_trap_y, cfg.angle);
    let mut m = Module::new(bp, "laser_cooling", frame, &cfg.name_prefix);
    let label = tag(cfg.wavelength);
    let wavelength = Some(cfg.wavelength);

    if feed.is_none() {
        m.beam(0.0, 0.0, 90.0, wavelength)?;
    }
    m.place(&format!("ECDL {label}"), parts::ecdl(littrow_angle), -20.0, 0.0, 90.0, kb)?;

    let at = frame.child(0.0, INCH, 90.0);
    let isolator = EcdlIsolatorConfig {
        x: at.x,
        y: at.y,
        angle: at.angle,
        wavelength,
        name_prefix: m.scope(&format!("Isolator {label}")),
        ..Default::default()
    };
    let nested = ecdl_isolator(m.plate(), &isolator, kb)?;
    m.absorb(nested);

    let at = frame.child(0.0, 0.0, 90.0);
    let expander = TelescopeConfig {
        x: at.x,
        y: at.y,
        angle: at.angle,
        wavelength,
        name_prefix: m.scope(&format!("Telescope {label}")),
        ..Default::default()
    };
    let nested = telescope(m.plate(), &expander, kb)?;
    m.absorb(nested);

    let at = frame.child(0.0, 20.0, 90.0);
    let shifter = DoublepassConfig {
        x: at.x,
        y: at.y,
        angle: at.angle,
        mirror: cfg.doublepass_mirror,
        thumbscrews: cfg.thumbscrews,
        wavelength,
        name_prefix: m.scope(&format!("Doublepass {label}")),
        ..Default::default()
    };
    let nested = doublepass(m.plate(), &shifter, kb)?;
    m.absorb(nested);

    let trap = m.beam(0.0, 20.0, 270.0, wavelength)?;
    m.along(
        trap,
        &format!("Mirror {label} to Trap"),
        parts::mirror(MirrorMount::K05s1.part(cfg.thumbscrews)),
        0b1,
        INCH,
        m.turn(Turn::DownLeft),
        kb,
    )?;
    m.finish();
    Ok(trap)
}

// ── Repump ────────────────────────────────────────────────────────────

/// Repump laser with a mirrored single pass and a wavemeter pickoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepumpConfig {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub thumbscrews: bool,
    /// Nanometres.
    pub wavelength: f64,
    pub grating_lines_per_mm: f64,
    pub name_prefix: String,
}

impl Default for RepumpConfig {
    fn default() -> Self {
        Self {
            x: 4.0,
            y: 0.0,
            angle: 0.0,
            thumbscrews: true,
            wavelength: 866.0,
            grating_lines_per_mm: IR_GRATING_LINES_PER_MM,
            name_prefix: String::new(),
        }
    }
}

/// Returns `feed`, or the beam added for the subsystem's own ECDL.
pub fn repump(
    bp: &mut Baseplate,
    cfg: &RepumpConfig,
    feed: Option<BeamId>,
    kb: &mut dyn KernelBundle,
) -> Result<BeamId, ComposeError> {
    let littrow_angle = littrow(cfg.wavelength, cfg.grating_lines_per_mm)?;
    let frame = Frame::new(cfg.x, cfg.y, cfg.angle);
    let mut m = Module::new(bp, "repump", frame, &cfg.name_prefix);
    let label = tag(cfg.wavelength);
    let wavelength = Some(cfg.wavelength);

    let beam = match feed {
        Some(beam) => beam,
        None => m.beam(0.3, -4.0, 90.0, wavelength)?,
    };
    m.place(&format!("ECDL {label}"), parts::ecdl(littrow_angle), 0.3, -4.0, 90.0, kb)?;

    let at = frame.child(4.0, 1.0, 90.0);
    let isolator = EcdlIsolatorConfig {
        x: at.x,
        y: at.y,
        angle: at.angle,
        wavelength,
        name_prefix: m.scope(&format!("Isolator {label}")),
        ..Default::default()
    };
    let nested = ecdl_isolator(m.plate(), &isolator, kb)?;
    m.absorb(nested);

    let at = frame.child(7.0, 12.0, 180.0);
    let shifter = SinglepassConfig {
        x: at.x,
        y: at.y,
        angle: at.angle,
        thumbscrews: cfg.thumbscrews,
        wavelength,
        name_prefix: m.scope(&format!("Singlepass {label}")),
        ..Default::default()
    };
    let nested = singlepass_mirrored(m.plate(), &shifter, kb)?;
    m.absorb(nested);

    let at = frame.child(1.5, 12.0, 90.0);
    let pickoff = BeamPickoffConfig {
        x: at.x,
        y: at.y,
        angle: at.angle,
        thumbscrews: cfg.thumbscrews,
        wavelength,
        name_prefix: m.scope(&format!("Pickoff {label}")),
        ..Default::default()
    };
    let nested = beam_pickoff(m.plate(), &pickoff, kb)?;
    m.absorb(nested);
    m.finish();
    Ok(beam)
}
