//! Serializable part descriptors.
//!
//! A descriptor is the kind plus its parameter record. Geometry is always
//! rebuilt from it, so this is all that needs to persist.

use optics_types::{Bolt, INCH};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{FactoryError, OpticalRole};

/// Loose parameter map, as composer scripts pass it.
pub type Params = Map<String, Value>;

/// A part kind with its parameters and whether it drills the plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartDescriptor {
    pub kind: PartKind,
    #[serde(default = "yes")]
    pub drill: bool,
}

fn yes() -> bool {
    true
}

impl PartDescriptor {
    pub fn new(kind: PartKind) -> Self {
        Self { kind, drill: true }
    }

    pub fn without_drill(mut self) -> Self {
        self.drill = false;
        self
    }

    /// Parse a `(kind, params)` pair.
    ///
    /// `drill` is read from the map; `mount_type` / `mount_args` select a
    /// nested mount by kind name, `mount_type: null` removes it.
    pub fn from_params(kind: &str, params: &Params) -> Result<Self, FactoryError> {
        let required = required_params(kind).ok_or_else(|| FactoryError::UnknownPartKind {
            kind: kind.to_string(),
        })?;
        for name in required {
            if !params.contains_key(*name) {
                return Err(FactoryError::MissingParameter {
                    kind: kind.to_string(),
                    name: name.to_string(),
                });
            }
        }

        let invalid = |reason: String| FactoryError::InvalidParameter {
            kind: kind.to_string(),
            reason,
        };

        let mut fields = params.clone();
        let drill = match fields.remove("drill") {
            None => true,
            Some(Value::Bool(b)) => b,
            Some(other) => return Err(invalid(format!("drill must be a bool, got {other}"))),
        };

        let mount_args = match fields.remove("mount_args") {
            None => None,
            Some(Value::Object(args)) => Some(args),
            Some(other) => {
                return Err(invalid(format!("mount_args must be an object, got {other}")))
            }
        };
        match fields.remove("mount_type") {
            None if mount_args.is_some() => {
                return Err(invalid("mount_args given without mount_type".into()))
            }
            None => {}
            Some(Value::Null) => {
                fields.insert("mount".into(), Value::Null);
            }
            Some(Value::String(mount_kind)) => {
                let mount = PartDescriptor::from_params(&mount_kind, &mount_args.unwrap_or_default())?;
                let value = serde_json::to_value(&mount.kind).map_err(|e| invalid(e.to_string()))?;
                fields.insert("mount".into(), value);
            }
            Some(other) => {
                return Err(invalid(format!("mount_type must be a kind name, got {other}")))
            }
        }

        fields.insert("kind".into(), Value::String(kind.to_string()));
        let kind_value: PartKind =
            serde_json::from_value(Value::Object(fields)).map_err(|e| invalid(e.to_string()))?;
        Ok(Self {
            kind: kind_value,
            drill,
        })
    }
}

impl From<PartKind> for PartDescriptor {
    fn from(kind: PartKind) -> Self {
        Self::new(kind)
    }
}

/// Parameters a kind cannot be built without, or `None` for an unknown kind.
pub fn required_params(kind: &str) -> Option<&'static [&'static str]> {
    const NONE: &[&str] = &[];
    let required: &'static [&'static str] = match kind {
        "circular_lens" => &["focal_length"],
        "cylindrical_lens" => &["thickness", "width", "height"],
        "ecdl" => &["littrow_angle"],
        "box" => &["dx", "dy", "dz"],
        k if PartKind::KINDS.contains(&k) => NONE,
        _ => return None,
    };
    Some(required)
}

/// The closed catalog of buildable parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PartKind {
    // optics
    CircularMirror(MirrorParams),
    CircularLens(LensParams),
    CylindricalLens(CylindricalLensParams),
    Waveplate(WaveplateParams),
    CubeSplitter(SplitterParams),
    PinholeIda12(PinholeParams),
    #[serde(rename = "isolator_405")]
    Isolator405(IsolatorParams),
    #[serde(rename = "isomet_1205c_on_km100pm")]
    Isomet1205cOnKm100pm(IsometParams),
    Aom(AomParams),
    FiberportMountHca3(FiberportParams),
    FiberportMountKs1t(FiberportParams),
    Ecdl(EcdlParams),
    // mounts
    MirrorMountK05s1(MirrorMountParams),
    MirrorMountK05s2(MirrorMountParams),
    MirrorMountKm05(MirrorMountParams),
    LensHolderL05g(HolderParams),
    RotationStageRsp05(HolderParams),
    SkateMount(SkateMountParams),
    SkateMountCrossholes(SkateMountParams),
    SurfaceAdapter(SurfaceAdapterParams),
    Periscope(PeriscopeParams),
    // fixtures
    IonTrap(IonTrapParams),
    PmtArray(PmtArrayParams),
    FpgaBoard(FpgaBoardParams),
    MassSelectiveAxialEjectionCavity(CavityParams),
    StepperMotor(StepperMotorParams),
    IonInjectionPort(InjectionPortParams),
    #[serde(rename = "box")]
    CustomBox(BoxParams),
}

impl PartKind {
    pub const KINDS: [&'static str; 28] = [
        "circular_mirror",
        "circular_lens",
        "cylindrical_lens",
        "waveplate",
        "cube_splitter",
        "pinhole_ida12",
        "isolator_405",
        "isomet_1205c_on_km100pm",
        "aom",
        "fiberport_mount_hca3",
        "fiberport_mount_ks1t",
        "ecdl",
        "mirror_mount_k05s1",
        "mirror_mount_k05s2",
        "mirror_mount_km05",
        "lens_holder_l05g",
        "rotation_stage_rsp05",
        "skate_mount",
        "skate_mount_crossholes",
        "surface_adapter",
        "periscope",
        "ion_trap",
        "pmt_array",
        "fpga_board",
        "mass_selective_axial_ejection_cavity",
        "stepper_motor",
        "ion_injection_port",
        "box",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PartKind::CircularMirror(_) => "circular_mirror",
            PartKind::CircularLens(_) => "circular_lens",
            PartKind::CylindricalLens(_) => "cylindrical_lens",
            PartKind::Waveplate(_) => "waveplate",
            PartKind::CubeSplitter(_) => "cube_splitter",
            PartKind::PinholeIda12(_) => "pinhole_ida12",
            PartKind::Isolator405(_) => "isolator_405",
            PartKind::Isomet1205cOnKm100pm(_) => "isomet_1205c_on_km100pm",
            PartKind::Aom(_) => "aom",
            PartKind::FiberportMountHca3(_) => "fiberport_mount_hca3",
            PartKind::FiberportMountKs1t(_) => "fiberport_mount_ks1t",
            PartKind::Ecdl(_) => "ecdl",
            PartKind::MirrorMountK05s1(_) => "mirror_mount_k05s1",
            PartKind::MirrorMountK05s2(_) => "mirror_mount_k05s2",
            PartKind::MirrorMountKm05(_) => "mirror_mount_km05",
            PartKind::LensHolderL05g(_) => "lens_holder_l05g",
            PartKind::RotationStageRsp05(_) => "rotation_stage_rsp05",
            PartKind::SkateMount(_) => "skate_mount",
            PartKind::SkateMountCrossholes(_) => "skate_mount_crossholes",
            PartKind::SurfaceAdapter(_) => "surface_adapter",
            PartKind::Periscope(_) => "periscope",
            PartKind::IonTrap(_) => "ion_trap",
            PartKind::PmtArray(_) => "pmt_array",
            PartKind::FpgaBoard(_) => "fpga_board",
            PartKind::MassSelectiveAxialEjectionCavity(_) => {
                "mass_selective_axial_ejection_cavity"
            }
            PartKind::StepperMotor(_) => "stepper_motor",
            PartKind::IonInjectionPort(_) => "ion_injection_port",
            PartKind::CustomBox(_) => "box",
        }
    }

    /// How the part acts on a beam it is placed along.
    pub fn optical_role(&self) -> OpticalRole {
        match self {
            PartKind::CircularMirror(_) => OpticalRole::Reflect,
            PartKind::CircularLens(_)
            | PartKind::CylindricalLens(_)
            | PartKind::Waveplate(_)
            | PartKind::PinholeIda12(_)
            | PartKind::Isolator405(_)
            | PartKind::Ecdl(_) => OpticalRole::Transmit,
            PartKind::CubeSplitter(p) => OpticalRole::Split {
                diagonal_deg: if p.invert { 45.0 } else { -45.0 },
            },
            PartKind::Isomet1205cOnKm100pm(p) => OpticalRole::Diffract {
                angle_deg: p.diffraction_angle,
                direction: p.forward_direction,
            },
            PartKind::Aom(p) => OpticalRole::Diffract {
                angle_deg: p.diffraction_angle,
                direction: p.diffraction_dir,
            },
            _ => OpticalRole::Passive,
        }
    }
}

fn half_inch() -> f64 {
    INCH / 2.0
}

fn km05() -> Option<Box<PartKind>> {
    Some(Box::new(PartKind::MirrorMountKm05(MirrorMountParams::default())))
}

fn l05g() -> Option<Box<PartKind>> {
    Some(Box::new(PartKind::LensHolderL05g(HolderParams::default())))
}

fn lens_thickness() -> f64 {
    3.0
}

// ── Optics ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorParams {
    pub diameter: f64,
    pub thickness: f64,
    pub mount: Option<Box<PartKind>>,
}

impl Default for MirrorParams {
    fn default() -> Self {
        Self {
            diameter: INCH / 2.0,
            thickness: 6.0,
            mount: km05(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LensParams {
    pub focal_length: f64,
    #[serde(default = "half_inch")]
    pub diameter: f64,
    #[serde(default = "lens_thickness")]
    pub thickness: f64,
    #[serde(default)]
    pub part_number: String,
    #[serde(default = "l05g")]
    pub mount: Option<Box<PartKind>>,
}

impl LensParams {
    pub fn new(focal_length: f64) -> Self {
        Self {
            focal_length,
            diameter: half_inch(),
            thickness: lens_thickness(),
            part_number: String::new(),
            mount: l05g(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CylindricalLensParams {
    pub thickness: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub part_number: String,
    /// Slotted mounting holes instead of round ones.
    #[serde(default)]
    pub slots: bool,
}

impl CylindricalLensParams {
    pub fn new(thickness: f64, width: f64, height: f64) -> Self {
        Self {
            thickness,
            width,
            height,
            part_number: String::new(),
            slots: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaveplateParams {
    pub diameter: f64,
    pub thickness: f64,
    pub mount: Option<Box<PartKind>>,
}

impl Default for WaveplateParams {
    fn default() -> Self {
        Self {
            diameter: INCH / 2.0,
            thickness: 1.0,
            mount: Some(Box::new(PartKind::RotationStageRsp05(HolderParams::default()))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitterParams {
    pub cube_size: f64,
    /// Reflect clockwise instead of counter-clockwise.
    pub invert: bool,
    pub mount: Option<Box<PartKind>>,
}

impl Default for SplitterParams {
    fn default() -> Self {
        Self {
            cube_size: 10.0,
            invert: false,
            mount: Some(Box::new(PartKind::SkateMount(SkateMountParams::default()))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PinholeParams {
    /// Maximum aperture of the iris.
    pub aperture: f64,
    pub mount_bolt: Bolt,
}

impl Default for PinholeParams {
    fn default() -> Self {
        Self {
            aperture: 12.0,
            mount_bolt: Bolt::Bolt8_32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IsolatorParams {
    pub length: f64,
    pub diameter: f64,
    pub adapter: SurfaceAdapterParams,
}

impl Default for IsolatorParams {
    fn default() -> Self {
        Self {
            length: 40.0,
            diameter: 22.0,
            adapter: SurfaceAdapterParams {
                mount_hole_dy: 30.0,
                adapter_height: 1.5,
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IsometParams {
    /// Degrees.
    pub diffraction_angle: f64,
    pub forward_direction: f64,
    pub backward_direction: f64,
}

impl Default for IsometParams {
    fn default() -> Self {
        Self {
            diffraction_angle: 0.01,
            forward_direction: -1.0,
            backward_direction: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AomParams {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    /// Degrees.
    pub diffraction_angle: f64,
    pub diffraction_dir: f64,
    pub adapter: SurfaceAdapterParams,
}

impl Default for AomParams {
    fn default() -> Self {
        Self {
            length: 25.0,
            width: 15.0,
            height: 10.0,
            diffraction_angle: 0.01,
            diffraction_dir: 1.0,
            adapter: SurfaceAdapterParams {
                mount_hole_dy: 20.0,
                adapter_height: 5.0,
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FiberportParams {
    pub mount_bolt: Bolt,
}

impl Default for FiberportParams {
    fn default() -> Self {
        Self {
            mount_bolt: Bolt::Bolt8_32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EcdlParams {
    /// Grating angle in degrees, see [`optics_types::littrow_angle`].
    pub littrow_angle: f64,
    #[serde(default = "stage_length")]
    pub stage_length: f64,
    #[serde(default = "stage_thickness")]
    pub stage_thickness: f64,
}

fn stage_length() -> f64 {
    55.0
}

fn stage_thickness() -> f64 {
    6.0
}

impl EcdlParams {
    pub fn new(littrow_angle: f64) -> Self {
        Self {
            littrow_angle,
            stage_length: stage_length(),
            stage_thickness: stage_thickness(),
        }
    }
}

// ── Mounts ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorMountParams {
    /// Leave clearance in the plate for the adjuster thumbscrews.
    pub thumbscrews: bool,
    pub mount_bolt: Bolt,
}

impl Default for MirrorMountParams {
    fn default() -> Self {
        Self {
            thumbscrews: false,
            mount_bolt: Bolt::Bolt8_32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HolderParams {
    pub mount_bolt: Bolt,
}

impl Default for HolderParams {
    fn default() -> Self {
        Self {
            mount_bolt: Bolt::Bolt8_32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SkateMountParams {
    pub cube_size: f64,
    pub mount_bolt: Bolt,
    /// Put the bolt slot on the other side of the optic.
    pub invert: bool,
}

impl Default for SkateMountParams {
    fn default() -> Self {
        Self {
            cube_size: 10.0,
            mount_bolt: Bolt::Bolt8_32,
            invert: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurfaceAdapterParams {
    pub mount_hole_dy: f64,
    pub adapter_height: f64,
    pub outer_thickness: f64,
    pub fillet: f64,
    pub drill_tolerance: f64,
}

impl Default for SurfaceAdapterParams {
    fn default() -> Self {
        Self {
            mount_hole_dy: 20.0,
            adapter_height: 8.0,
            outer_thickness: 2.0,
            fillet: 5.0,
            drill_tolerance: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeriscopeParams {
    pub lower_dz: f64,
    pub upper_dz: f64,
    /// Mirror the body to the other side of the beam.
    pub invert: bool,
}

impl Default for PeriscopeParams {
    fn default() -> Self {
        Self {
            lower_dz: 1.5 * INCH,
            upper_dz: 3.0 * INCH,
            invert: true,
        }
    }
}

// ── Fixtures ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IonTrapParams {
    pub width: f64,
    pub height: f64,
    pub thickness: f64,
    pub adapter: SurfaceAdapterParams,
}

impl Default for IonTrapParams {
    fn default() -> Self {
        Self {
            width: 10.0,
            height: 10.0,
            thickness: 2.0,
            adapter: SurfaceAdapterParams {
                mount_hole_dy: 15.0,
                adapter_height: 5.0,
                ..Default::default()
            },
        }
    }
}

/// Box-shaped instrument housing on a surface adapter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Housing {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub adapter: SurfaceAdapterParams,
}

macro_rules! housing_params {
    ($name:ident, $length:expr, $width:expr, $height:expr, $hole_dy:expr) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(default, deny_unknown_fields)]
        pub struct $name {
            pub length: f64,
            pub width: f64,
            pub height: f64,
            pub adapter: SurfaceAdapterParams,
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    length: $length,
                    width: $width,
                    height: $height,
                    adapter: SurfaceAdapterParams {
                        mount_hole_dy: $hole_dy,
                        adapter_height: 8.0,
                        ..Default::default()
                    },
                }
            }
        }

        impl $name {
            pub fn housing(&self) -> Housing {
                Housing {
                    length: self.length,
                    width: self.width,
                    height: self.height,
                    adapter: self.adapter,
                }
            }
        }
    };
}

housing_params!(PmtArrayParams, 50.0, 20.0, 10.0, 40.0);
housing_params!(FpgaBoardParams, 60.0, 40.0, 5.0, 50.0);
housing_params!(CavityParams, 40.0, 20.0, 15.0, 30.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StepperMotorParams {
    pub width: f64,
    pub height: f64,
    pub length: f64,
}

impl Default for StepperMotorParams {
    fn default() -> Self {
        Self {
            width: 20.0,
            height: 20.0,
            length: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InjectionPortParams {
    pub width: f64,
    pub height: f64,
    pub length: f64,
    pub periscope: PeriscopeParams,
}

impl Default for InjectionPortParams {
    fn default() -> Self {
        Self {
            width: 15.0,
            height: 15.0,
            length: 20.0,
            periscope: PeriscopeParams {
                lower_dz: 10.0,
                upper_dz: 20.0,
                invert: true,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoxParams {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    #[serde(default)]
    pub fillet: f64,
}

impl BoxParams {
    pub fn new(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            dx,
            dy,
            dz,
            fillet: 0.0,
        }
    }
}
