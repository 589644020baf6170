use std::path::PathBuf;

use geom_kernel::{MeshCache, MeshPlacement, SolidHandle};
use optics_types::{Transform, DEFAULT_OPTICS_DZ, INCH};
use serde::{Deserialize, Serialize};

use crate::descriptor::{PartDescriptor, PartKind};
use crate::kernel_ext::KernelBundle;
use crate::primitives::{self, BlankSpec, BoxSpec, CylinderSpec};
use crate::types::{BuiltPart, ChildAttachment, FactoryError};
use crate::{fixtures, mounts, optics};

/// Per-baseplate settings for part generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Height of the beam plane above the plate top.
    pub optics_dz: f64,
    /// Plate thickness, for bolts driven up from underneath.
    pub plate_dz: f64,
    /// Directory holding mesh assets.
    pub stl_dir: PathBuf,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            optics_dz: DEFAULT_OPTICS_DZ,
            plate_dz: INCH,
            stl_dir: PathBuf::from("stl"),
        }
    }
}

/// Builds part geometry from descriptors.
///
/// Owns the mesh cache, so each mesh asset is read once per factory.
#[derive(Debug)]
pub struct Factory {
    config: FactoryConfig,
    meshes: MeshCache,
}

impl Factory {
    pub fn new(config: FactoryConfig) -> Self {
        let meshes = MeshCache::new(config.stl_dir.clone());
        Self { config, meshes }
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn mesh_cache(&self) -> &MeshCache {
        &self.meshes
    }

    /// Build `part` in its local frame: beam along +x through the origin,
    /// plate top at `z = -optics_dz`.
    pub fn build(
        &mut self,
        kb: &mut dyn KernelBundle,
        part: &PartDescriptor,
    ) -> Result<BuiltPart, FactoryError> {
        let mut ctx = BuildCtx {
            kb,
            cfg: &self.config,
            meshes: &mut self.meshes,
        };
        let geometry = match &part.kind {
            PartKind::CircularMirror(p) => optics::circular_mirror(&mut ctx, p),
            PartKind::CircularLens(p) => optics::circular_lens(&mut ctx, p),
            PartKind::CylindricalLens(p) => optics::cylindrical_lens(&mut ctx, p),
            PartKind::Waveplate(p) => optics::waveplate(&mut ctx, p),
            PartKind::CubeSplitter(p) => optics::cube_splitter(&mut ctx, p),
            PartKind::PinholeIda12(p) => optics::pinhole_ida12(&mut ctx, p),
            PartKind::Isolator405(p) => optics::isolator_405(&mut ctx, p),
            PartKind::Isomet1205cOnKm100pm(p) => optics::isomet_1205c(&mut ctx, p),
            PartKind::Aom(p) => optics::aom(&mut ctx, p),
            PartKind::FiberportMountHca3(p) => optics::fiberport(&mut ctx, p, [25.4, 25.4, 16.0]),
            PartKind::FiberportMountKs1t(p) => optics::fiberport(&mut ctx, p, [38.1, 38.1, 12.7]),
            PartKind::Ecdl(p) => optics::ecdl(&mut ctx, p),
            PartKind::MirrorMountK05s1(p) => mounts::mirror_mount(&mut ctx, p, 12.7, 6.0),
            PartKind::MirrorMountK05s2(p) => mounts::mirror_mount(&mut ctx, p, 12.7, 9.0),
            PartKind::MirrorMountKm05(p) => mounts::mirror_mount(&mut ctx, p, 25.4, 12.0),
            PartKind::LensHolderL05g(p) => mounts::lens_holder(&mut ctx, p),
            PartKind::RotationStageRsp05(p) => mounts::rotation_stage(&mut ctx, p),
            PartKind::SkateMount(p) => mounts::skate_mount(&mut ctx, p, false),
            PartKind::SkateMountCrossholes(p) => mounts::skate_mount(&mut ctx, p, true),
            PartKind::SurfaceAdapter(p) => mounts::surface_adapter(&mut ctx, p),
            PartKind::Periscope(p) => mounts::periscope(&mut ctx, p),
            PartKind::IonTrap(p) => fixtures::ion_trap(&mut ctx, p),
            PartKind::PmtArray(p) => fixtures::housing(&mut ctx, &p.housing(), fixtures::Face::Windows),
            PartKind::FpgaBoard(p) => fixtures::housing(&mut ctx, &p.housing(), fixtures::Face::Connector),
            PartKind::MassSelectiveAxialEjectionCavity(p) => {
                fixtures::housing(&mut ctx, &p.housing(), fixtures::Face::Quadrupole)
            }
            PartKind::StepperMotor(p) => fixtures::stepper_motor(&mut ctx, p),
            PartKind::IonInjectionPort(p) => fixtures::ion_injection_port(&mut ctx, p),
            PartKind::CustomBox(p) => fixtures::custom_box(&mut ctx, p),
        }?;

        tracing::debug!(
            kind = part.kind.name(),
            drill = part.drill && geometry.drill.is_some(),
            children = geometry.children.len(),
            "built part"
        );

        Ok(BuiltPart {
            display: geometry.display,
            drill: if part.drill { geometry.drill } else { None },
            children: geometry.children,
            optics: part.kind.optical_role(),
        })
    }
}

/// Solids and attachments produced by one kind builder.
pub(crate) struct Geometry {
    pub display: SolidHandle,
    pub drill: Option<SolidHandle>,
    pub children: Vec<ChildAttachment>,
}

impl Geometry {
    pub fn new(display: SolidHandle, drill: Option<SolidHandle>) -> Self {
        Self {
            display,
            drill,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, name: &str, kind: PartKind, offset: Transform) -> Self {
        self.children.push(ChildAttachment {
            name: name.to_string(),
            part: PartDescriptor::new(kind),
            offset,
        });
        self
    }
}

/// Kernel, settings and mesh cache threaded through the kind builders.
pub(crate) struct BuildCtx<'a> {
    pub kb: &'a mut dyn KernelBundle,
    pub cfg: &'a FactoryConfig,
    pub meshes: &'a mut MeshCache,
}

impl BuildCtx<'_> {
    /// Height of the plate top in the part frame.
    pub fn plate_top(&self) -> f64 {
        -self.cfg.optics_dz
    }

    pub fn plate_bottom(&self) -> f64 {
        -self.cfg.optics_dz - self.cfg.plate_dz
    }

    pub fn boxed(&mut self, spec: BoxSpec) -> Result<SolidHandle, FactoryError> {
        primitives::make_box(self.kb, &spec)
    }

    pub fn cylinder(&mut self, spec: CylinderSpec) -> Result<SolidHandle, FactoryError> {
        primitives::make_cylinder(self.kb, &spec)
    }

    pub fn blank(&mut self, solid: &SolidHandle, spec: BlankSpec) -> Result<SolidHandle, FactoryError> {
        primitives::drill_blank(self.kb, solid, &spec)
    }

    pub fn fuse(&mut self, solids: Vec<SolidHandle>) -> Result<SolidHandle, FactoryError> {
        primitives::fuse_all(self.kb, solids)?.ok_or(FactoryError::InvalidDimension {
            name: "solid count",
            value: 0.0,
        })
    }

    pub fn cut(&mut self, base: SolidHandle, tools: Vec<SolidHandle>) -> Result<SolidHandle, FactoryError> {
        primitives::cut_all(self.kb, base, tools)
    }

    pub fn place(&mut self, solid: &SolidHandle, at: Transform) -> Result<SolidHandle, FactoryError> {
        Ok(self.kb.transformed(solid, &at)?)
    }

    pub fn mesh(&mut self, file: &str, placement: MeshPlacement) -> Result<SolidHandle, FactoryError> {
        Ok(self.meshes.get(self.kb.as_kernel(), file, &placement)?)
    }
}
