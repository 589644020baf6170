//! Reusable optical subsystems and the assemblies built from them.
//!
//! Every composer takes a pose and a name prefix, then places its beams and
//! elements onto an existing [`Baseplate`](layout_engine::Baseplate) in
//! module coordinates. Modules that ship as standalone plates also expose a
//! `*_plate` function that builds their own baseplate first.

pub mod assembly;
pub mod doublepass;
pub mod isolator;
mod module;
pub mod photoionization;
pub mod pickoff;
pub mod singlepass;
pub mod sourcebox;
pub mod subsystems;
pub mod telescope;
pub mod types;

pub use assembly::{
    isotope_separation, isotope_separation_steps, run_assembly, AssemblyReport, AssemblyStep,
    IsotopeSeparationConfig, StepFailure, StepFn,
};
pub use doublepass::{doublepass, doublepass_plate, DoublepassConfig};
pub use isolator::{ecdl_isolator, ecdl_isolator_plate, EcdlIsolatorConfig};
pub use module::on_own_plate;
pub use photoionization::{
    photoionization, photoionization_commercial, photoionization_ecdl, LaserSource,
    PhotoionizationConfig,
};
pub use pickoff::{beam_pickoff, BeamPickoffConfig};
pub use singlepass::{singlepass, singlepass_mirrored, SinglepassConfig};
pub use sourcebox::{sourcebox, SourceboxConfig};
pub use subsystems::{
    difference_frequency, laser_cooling, repump, tune_and_double, CoolingConfig, DfgConfig,
    HarmonicConfig, RepumpConfig, IR_GRATING_LINES_PER_MM,
};
pub use telescope::{telescope, telescope_plate, TelescopeConfig};
pub use types::{ComposeError, Composed, Frame, MirrorMount};
