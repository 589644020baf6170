//! Multi-subsystem assemblies that keep going past a failed step.

use layout_engine::{Baseplate, BaseplateSpec};
use optics_types::{Angle, BranchIndex, Turn, INCH};
use part_factory::params::{
    CavityParams, FpgaBoardParams, InjectionPortParams, PmtArrayParams, StepperMotorParams,
};
use part_factory::{KernelBundle, PartKind};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::module::parts;
use crate::subsystems::{
    difference_frequency, laser_cooling, repump, tune_and_double, CoolingConfig, DfgConfig,
    HarmonicConfig, RepumpConfig,
};
use crate::types::{ComposeError, MirrorMount};

pub type StepFn<C> = fn(&mut Baseplate, &C, &mut dyn KernelBundle) -> Result<(), ComposeError>;

/// One named unit of an assembly.
pub struct AssemblyStep<C> {
    pub name: &'static str,
    pub run: StepFn<C>,
}

impl<C> AssemblyStep<C> {
    pub fn new(name: &'static str, run: StepFn<C>) -> Self {
        Self { name, run }
    }
}

/// A step that did not finish, with the error it raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailure {
    pub step: String,
    pub error: String,
}

/// Outcome of [`run_assembly`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyReport {
    pub completed: Vec<String>,
    pub failed: Vec<StepFailure>,
}

impl AssemblyReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run every step against `bp` in order.
///
/// A failing step is logged and recorded; whatever it and earlier steps
/// placed stays on the plate.
pub fn run_assembly<C>(
    bp: &mut Baseplate,
    cfg: &C,
    steps: &[AssemblyStep<C>],
    kb: &mut dyn KernelBundle,
) -> AssemblyReport {
    let mut report = AssemblyReport::default();
    info!(label = %bp.label(), steps = steps.len(), "assembly started");
    for step in steps {
        match (step.run)(bp, cfg, kb) {
            Ok(()) => report.completed.push(step.name.to_string()),
            Err(e) => {
                warn!(step = step.name, error = %e, "assembly step failed");
                report.failed.push(StepFailure {
                    step: step.name.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }
    info!(
        label = %bp.label(),
        completed = report.completed.len(),
        failed = report.failed.len(),
        elements = bp.len(),
        "assembly finished"
    );
    report
}

// ── Isotope separation ────────────────────────────────────────────────

/// The isotope-separation bench: beam rows and the shared plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsotopeSeparationConfig {
    pub plate: BaseplateSpec,
    pub input_y_588: f64,
    pub input_y_405_1: f64,
    pub input_y_405_2: f64,
    pub input_y_850: f64,
    pub input_y_850_2: f64,
    pub thumbscrews: bool,
}

impl Default for IsotopeSeparationConfig {
    fn default() -> Self {
        Self {
            plate: BaseplateSpec::new(12.0 * INCH, 12.0 * INCH, INCH)
                .with_gap(INCH / 4.0)
                .with_mount_holes(vec![[0, 0], [0, 11], [11, 0], [11, 11]])
                .with_label("Isotope Separation"),
            input_y_588: 0.5 * INCH,
            input_y_405_1: INCH,
            input_y_405_2: 2.0 * INCH,
            input_y_850: 1.5 * INCH,
            input_y_850_2: 2.5 * INCH,
            thumbscrews: true,
        }
    }
}

type Cfg = IsotopeSeparationConfig;
type Kb<'a> = &'a mut dyn KernelBundle;

fn shg_588(bp: &mut Baseplate, cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    let beam = bp.add_beam_path(0.0, cfg.input_y_588, 0.0, Some(588.0))?;
    bp.place_element_along_beam(
        beam,
        "SHG 588nm to 294nm",
        parts::splitter(false, parts::skate_mount()).into(),
        BranchIndex::ROOT,
        0.5 * INCH,
        Angle::Heading(0.0),
        kb,
    )?;
    Ok(())
}

fn beam_294(bp: &mut Baseplate, cfg: &Cfg, _kb: Kb) -> Result<(), ComposeError> {
    bp.add_beam_path(0.5 * INCH, cfg.input_y_588, 0.0, Some(294.0))?;
    Ok(())
}

fn cooling_294(bp: &mut Baseplate, cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    let feed = bp.add_beam_path(0.5 * INCH, cfg.input_y_588, 0.0, Some(294.0))?;
    let cooling = CoolingConfig {
        wavelength: 294.0,
        thumbscrews: cfg.thumbscrews,
        ..Default::default()
    };
    laser_cooling(bp, &cooling, Some(feed), kb)?;
    Ok(())
}

fn photoionization_422(bp: &mut Baseplate, cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    let harmonic = HarmonicConfig {
        y: cfg.input_y_850_2,
        thumbscrews: cfg.thumbscrews,
        ..Default::default()
    };
    tune_and_double(bp, &harmonic, kb)?;
    Ok(())
}

fn repump_866(bp: &mut Baseplate, cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    let dfg = DfgConfig {
        y: cfg.input_y_850,
        thumbscrews: cfg.thumbscrews,
        name_prefix: "DFG ".into(),
        ..Default::default()
    };
    let beam = difference_frequency(bp, &dfg, kb)?;
    let repump_cfg = RepumpConfig {
        x: cfg.plate.gap + 0.5 * INCH,
        y: cfg.input_y_850,
        thumbscrews: cfg.thumbscrews,
        name_prefix: "Repump ".into(),
        ..Default::default()
    };
    repump(bp, &repump_cfg, Some(beam), kb)?;
    Ok(())
}

fn cooling_397(bp: &mut Baseplate, cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    let cooling = CoolingConfig {
        ion_trap_x: 4.0 * INCH,
        ion_trap_y: cfg.input_y_405_1,
        wavelength: 397.0,
        thumbscrews: cfg.thumbscrews,
        ..Default::default()
    };
    laser_cooling(bp, &cooling, None, kb)?;
    Ok(())
}

fn repump_403(bp: &mut Baseplate, cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    let repump_cfg = RepumpConfig {
        x: cfg.plate.gap + INCH,
        y: cfg.input_y_405_2,
        wavelength: 403.0,
        grating_lines_per_mm: optics_types::DEFAULT_GRATING_LINES_PER_MM,
        thumbscrews: cfg.thumbscrews,
        name_prefix: "Repump ".into(),
        ..Default::default()
    };
    repump(bp, &repump_cfg, None, kb)?;
    Ok(())
}

/// A short feed beam with one part half an inch along it.
fn feed_with(
    bp: &mut Baseplate,
    name: &str,
    part: PartKind,
    start: (f64, f64),
    wavelength: f64,
    distance: f64,
    angle: Angle,
    kb: Kb,
) -> Result<(), ComposeError> {
    let beam = bp.add_beam_path(start.0, start.1, 0.0, Some(wavelength))?;
    bp.place_element_along_beam(beam, name, part.into(), BranchIndex::ROOT, distance, angle, kb)?;
    Ok(())
}

fn aom_397(bp: &mut Baseplate, cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    let start = (4.0 * INCH, cfg.input_y_405_1);
    feed_with(bp, "AOM 397nm", parts::aom(), start, 397.0, 0.5 * INCH, Angle::Heading(0.0), kb)
}

fn aom_866(bp: &mut Baseplate, cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    let start = (cfg.plate.gap + 0.5 * INCH, cfg.input_y_850);
    feed_with(bp, "AOM 866nm", parts::aom(), start, 866.0, 0.5 * INCH, Angle::Heading(0.0), kb)
}

fn aom_403(bp: &mut Baseplate, cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    let start = (cfg.plate.gap + INCH, cfg.input_y_405_2);
    feed_with(bp, "AOM 403nm", parts::aom(), start, 403.0, 0.5 * INCH, Angle::Heading(0.0), kb)
}

fn aom_294(bp: &mut Baseplate, cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    let start = (0.5 * INCH, cfg.input_y_588);
    feed_with(bp, "AOM 294nm", parts::aom(), start, 294.0, 0.5 * INCH, Angle::Heading(0.0), kb)
}

fn pickup_mirror(thumbscrews: bool) -> PartKind {
    parts::mirror(MirrorMount::K05s1.part(thumbscrews))
}

fn mirror_866(bp: &mut Baseplate, cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    let start = (cfg.plate.gap + 0.5 * INCH, cfg.input_y_850);
    let part = pickup_mirror(cfg.thumbscrews);
    feed_with(bp, "Mirror 866nm", part, start, 866.0, INCH, Angle::Turn(Turn::RightUp), kb)
}

fn mirror_294(bp: &mut Baseplate, cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    let start = (0.5 * INCH, cfg.input_y_588);
    let part = pickup_mirror(cfg.thumbscrews);
    feed_with(bp, "Mirror 294nm", part, start, 294.0, INCH, Angle::Turn(Turn::RightUp), kb)
}

fn stepper(bp: &mut Baseplate, name: &str, y: f64, kb: Kb) -> Result<(), ComposeError> {
    let motor = PartKind::StepperMotor(StepperMotorParams::default());
    bp.place_element(name, motor.into(), 1.5 * INCH, y, 0.0, kb)?;
    Ok(())
}

fn step_motor_397(bp: &mut Baseplate, cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    stepper(bp, "Step Motor 397nm", cfg.input_y_405_1, kb)
}

fn step_motor_866(bp: &mut Baseplate, cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    stepper(bp, "Step Motor 866nm", cfg.input_y_850, kb)
}

fn step_motor_403(bp: &mut Baseplate, cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    stepper(bp, "Step Motor 403nm", cfg.input_y_405_2, kb)
}

fn step_motor_294(bp: &mut Baseplate, cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    stepper(bp, "Step Motor 294nm", cfg.input_y_588, kb)
}

fn pmt_array(bp: &mut Baseplate, cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    let part = PartKind::PmtArray(PmtArrayParams::default());
    bp.place_element("PMT Array", part.into(), cfg.plate.dx - cfg.plate.gap, 0.0, 180.0, kb)?;
    Ok(())
}

fn fpga(bp: &mut Baseplate, _cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    let part = PartKind::FpgaBoard(FpgaBoardParams::default());
    bp.place_element("FPGA", part.into(), 4.5 * INCH, 1.5 * INCH, 0.0, kb)?;
    Ok(())
}

fn msae_cavity(bp: &mut Baseplate, _cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    let part = PartKind::MassSelectiveAxialEjectionCavity(CavityParams::default());
    bp.place_element("MSAE Cavity", part.into(), 3.0 * INCH, 3.5 * INCH, 0.0, kb)?;
    Ok(())
}

fn icpms_port(bp: &mut Baseplate, _cfg: &Cfg, kb: Kb) -> Result<(), ComposeError> {
    let part = PartKind::IonInjectionPort(InjectionPortParams::default());
    bp.place_element("ICP-MS Port", part.into(), 2.5 * INCH, 3.0 * INCH, 0.0, kb)?;
    Ok(())
}

/// The bench's steps in build order.
pub fn isotope_separation_steps() -> Vec<AssemblyStep<IsotopeSeparationConfig>> {
    vec![
        AssemblyStep::new("SHG_588nm_to_294nm", shg_588),
        AssemblyStep::new("Beam_294nm", beam_294),
        AssemblyStep::new("Cooling_294nm", cooling_294),
        AssemblyStep::new("Photoionization_422nm", photoionization_422),
        AssemblyStep::new("Repumping_866nm", repump_866),
        AssemblyStep::new("Cooling_397nm", cooling_397),
        AssemblyStep::new("Repumping_403nm", repump_403),
        AssemblyStep::new("AOM_397nm", aom_397),
        AssemblyStep::new("AOM_866nm", aom_866),
        AssemblyStep::new("AOM_403nm", aom_403),
        AssemblyStep::new("AOM_294nm", aom_294),
        AssemblyStep::new("Mirror_866nm", mirror_866),
        AssemblyStep::new("Mirror_294nm", mirror_294),
        AssemblyStep::new("StepMotor_397nm", step_motor_397),
        AssemblyStep::new("StepMotor_866nm", step_motor_866),
        AssemblyStep::new("StepMotor_403nm", step_motor_403),
        AssemblyStep::new("StepMotor_294nm", step_motor_294),
        AssemblyStep::new("PMTArray", pmt_array),
        AssemblyStep::new("FPGA", fpga),
        AssemblyStep::new("MSAE_Cavity", msae_cavity),
        AssemblyStep::new("ICPMS_Port", icpms_port),
    ]
}

/// Build the bench on a fresh plate.
///
/// Only an invalid plate fails outright; step failures land in the report.
pub fn isotope_separation(
    cfg: &IsotopeSeparationConfig,
    kb: &mut dyn KernelBundle,
) -> Result<(Baseplate, AssemblyReport), ComposeError> {
    let mut bp = Baseplate::new(cfg.plate.clone())?;
    let report = run_assembly(&mut bp, cfg, &isotope_separation_steps(), kb);
    Ok((bp, report))
}
