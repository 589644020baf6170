//! Part catalog and geometry builders.
//!
//! Every part is described by a serializable [`PartKind`] and built into a
//! display solid, an optional drill solid and child attachments, all in the
//! part's local frame.

pub mod descriptor;
pub mod factory;
mod fixtures;
pub mod kernel_ext;
mod mounts;
mod optics;
pub mod primitives;
pub mod types;

pub use descriptor::{required_params, Params, PartDescriptor, PartKind};
pub use factory::{Factory, FactoryConfig};
pub use kernel_ext::KernelBundle;
pub use types::{BuiltPart, ChildAttachment, FactoryError, OpticalRole};

/// Parameter records for every kind.
pub mod params {
    pub use crate::descriptor::{
        AomParams, BoxParams, CavityParams, CylindricalLensParams, EcdlParams, FiberportParams,
        FpgaBoardParams, HolderParams, Housing, InjectionPortParams, IonTrapParams, IsolatorParams,
        IsometParams, LensParams, MirrorMountParams, MirrorParams, PeriscopeParams, PinholeParams,
        PmtArrayParams, SkateMountParams, SplitterParams, StepperMotorParams,
        SurfaceAdapterParams, WaveplateParams,
    };
}
