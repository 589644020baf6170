use layout_engine::Baseplate;
use optics_types::INCH;
use part_factory::params::BoxParams;
use part_factory::{KernelBundle, PartKind};
use serde::{Deserialize, Serialize};

use crate::module::Module;
use crate::types::{ComposeError, Composed, Frame};

/// Stand-in volume for a commercial laser or wavemeter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceboxConfig {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub name: String,
    pub name_prefix: String,
}

impl Default for SourceboxConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            dx: 5.0 * INCH,
            dy: 10.0 * INCH,
            dz: 4.0 * INCH,
            name: "Sourcebox".into(),
            name_prefix: String::new(),
        }
    }
}

impl SourceboxConfig {
    pub fn frame(&self) -> Frame {
        Frame::new(self.x, self.y, self.angle)
    }
}

pub fn sourcebox(
    bp: &mut Baseplate,
    cfg: &SourceboxConfig,
    kb: &mut dyn KernelBundle,
) -> Result<Composed, ComposeError> {
    let mut m = Module::new(bp, "sourcebox", cfg.frame(), &cfg.name_prefix);
    let body = PartKind::CustomBox(BoxParams::new(cfg.dx, cfg.dy, cfg.dz));
    m.place(&cfg.name, body, 0.0, 0.0, 0.0, kb)?;
    Ok(m.finish())
}
