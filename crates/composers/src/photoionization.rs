use layout_engine::Baseplate;
use optics_types::DEFAULT_GRATING_LINES_PER_MM;
use part_factory::params::PeriscopeParams;
use part_factory::{KernelBundle, PartKind};
use serde::{Deserialize, Serialize};

use crate::isolator::{ecdl_isolator, EcdlIsolatorConfig};
use crate::module::{littrow, parts, Module};
use crate::pickoff::{beam_pickoff, BeamPickoffConfig};
use crate::singlepass::{singlepass, singlepass_mirrored, SinglepassConfig};
use crate::sourcebox::{sourcebox, SourceboxConfig};
use crate::types::{ComposeError, Composed, Frame};

/// Where the photoionization light comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaserSource {
    /// Home-built external-cavity diode laser with its isolator plate.
    #[default]
    Ecdl,
    /// Boxed commercial laser feeding a periscope.
    Commercial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoionizationConfig {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub source: LaserSource,
    pub thumbscrews: bool,
    /// Nanometres.
    pub wavelength: f64,
    pub grating_lines_per_mm: f64,
    pub name_prefix: String,
}

impl Default for PhotoionizationConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            source: LaserSource::Ecdl,
            thumbscrews: true,
            wavelength: 405.0,
            grating_lines_per_mm: DEFAULT_GRATING_LINES_PER_MM,
            name_prefix: String::new(),
        }
    }
}

impl PhotoionizationConfig {
    pub fn frame(&self) -> Frame {
        Frame::new(self.x, self.y, self.angle)
    }
}

/// Laser, frequency shifter and wavemeter pickoff for photoionization.
pub fn photoionization(
    bp: &mut Baseplate,
    cfg: &PhotoionizationConfig,
    kb: &mut dyn KernelBundle,
) -> Result<Composed, ComposeError> {
    match cfg.source {
        LaserSource::Ecdl => photoionization_ecdl(bp, cfg, kb),
        LaserSource::Commercial => photoionization_commercial(bp, cfg, kb),
    }
}

pub fn photoionization_ecdl(
    bp: &mut Baseplate,
    cfg: &PhotoionizationConfig,
    kb: &mut dyn KernelBundle,
) -> Result<Composed, ComposeError> {
    let littrow_angle = littrow(cfg.wavelength, cfg.grating_lines_per_mm)?;
    let mut m = Module::new(bp, "photoionization_ecdl", cfg.frame(), &cfg.name_prefix);
    let frame = m.frame();
    let wavelength = Some(cfg.wavelength);

    m.place("ECDL", parts::ecdl(littrow_angle), 4.3, -4.0, 90.0, kb)?;

    let at = frame.child(7.0, 1.0, 90.0);
    let isolator = EcdlIsolatorConfig {
        x: at.x,
        y: at.y,
        angle: at.angle,
        wavelength,
        name_prefix: m.scope("Isolator"),
        ..Default::default()
    };
    let nested = ecdl_isolator(m.plate(), &isolator, kb)?;
    m.absorb(nested);

    let at = frame.child(0.0, 7.0, 0.0);
    let shifter = SinglepassConfig {
        x: at.x,
        y: at.y,
        angle: at.angle,
        thumbscrews: cfg.thumbscrews,
        wavelength,
        name_prefix: m.scope("Singlepass"),
        ..Default::default()
    };
    let nested = singlepass(m.plate(), &shifter, kb)?;
    m.absorb(nested);

    let at = frame.child(7.5, 12.0, 90.0);
    let pickoff = BeamPickoffConfig {
        x: at.x,
        y: at.y,
        angle: at.angle,
        thumbscrews: cfg.thumbscrews,
        wavelength,
        name_prefix: m.scope("Pickoff"),
        ..Default::default()
    };
    let nested = beam_pickoff(m.plate(), &pickoff, kb)?;
    m.absorb(nested);
    Ok(m.finish())
}

pub fn photoionization_commercial(
    bp: &mut Baseplate,
    cfg: &PhotoionizationConfig,
    kb: &mut dyn KernelBundle,
) -> Result<Composed, ComposeError> {
    let mut m = Module::new(bp, "photoionization_commercial", cfg.frame(), &cfg.name_prefix);
    let frame = m.frame();
    let wavelength = Some(cfg.wavelength);

    let at = frame.child(-1.0, -6.0, 0.0);
    let laser = SourceboxConfig {
        x: at.x,
        y: at.y,
        angle: at.angle,
        name_prefix: cfg.name_prefix.clone(),
        ..Default::default()
    };
    let nested = sourcebox(m.plate(), &laser, kb)?;
    m.absorb(nested);

    m.place(
        "Periscope",
        PartKind::Periscope(PeriscopeParams::default()),
        1.5,
        6.0,
        90.0,
        kb,
    )?;

    let at = frame.child(7.0, 12.0, 180.0);
    let shifter = SinglepassConfig {
        x: at.x,
        y: at.y,
        angle: at.angle,
        thumbscrews: cfg.thumbscrews,
        wavelength,
        name_prefix: m.scope("Singlepass"),
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
        name_prefix: m.scope("Pickoff"),
        ..Default::default()
    };
    let nested = beam_pickoff(m.plate(), &pickoff, kb)?;
    m.absorb(nested);
    Ok(m.finish())
}
