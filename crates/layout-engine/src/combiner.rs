use optics_types::{Angle, BranchIndex, INCH};
use part_factory::params::{MirrorMountParams, MirrorParams, SkateMountParams, SplitterParams};
use part_factory::{KernelBundle, PartDescriptor, PartKind};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::baseplate::Baseplate;
use crate::beam::BeamPath;
use crate::types::{BeamId, LayoutError};

/// Most beams one combiner accepts.
pub const MAX_COMBINED_BEAMS: usize = 6;

/// Settings for [`Baseplate::combine_beams`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinerOptions {
    /// Heading shared by the inputs and the combined beam.
    pub angle: f64,
    pub thumbscrews: bool,
    /// Distance from an input's current end to its redirect mirror.
    pub mirror_distance: f64,
    /// Distance from the combined beam's start to the next combining cube.
    pub combiner_spacing: f64,
    /// Prepended to element names, so one plate can hold several combiners.
    pub name_prefix: String,
}

impl Default for CombinerOptions {
    fn default() -> Self {
        Self {
            angle: 0.0,
            thumbscrews: true,
            mirror_distance: 0.5 * INCH,
            combiner_spacing: 0.75 * INCH,
            name_prefix: String::new(),
        }
    }
}

/// Difference-frequency wavelength of two wavelengths in nm.
///
/// `None` when they are equal, since the difference frequency is zero.
pub fn difference_frequency(a: f64, b: f64) -> Option<f64> {
    let (short, long) = if a < b { (a, b) } else { (b, a) };
    let inverse = 1.0 / short - 1.0 / long;
    if inverse > 0.0 && inverse.is_finite() {
        Some(1.0 / inverse)
    } else {
        None
    }
}

fn mix(combined: Option<f64>, incoming: Option<f64>) -> Option<f64> {
    match (combined, incoming) {
        (Some(a), Some(b)) => {
            let mixed = difference_frequency(a, b);
            if mixed.is_none() {
                warn!(a, b, "equal wavelengths have no difference frequency");
            }
            mixed
        }
        _ => {
            warn!(?combined, ?incoming, "untagged beam in combiner");
            None
        }
    }
}

fn redirect_mirror(thumbscrews: bool) -> PartDescriptor {
    PartKind::CircularMirror(MirrorParams {
        mount: Some(Box::new(PartKind::MirrorMountK05s2(MirrorMountParams {
            thumbscrews,
            ..Default::default()
        }))),
        ..Default::default()
    })
    .into()
}

fn combining_cube() -> PartDescriptor {
    PartKind::CubeSplitter(SplitterParams {
        mount: Some(Box::new(PartKind::SkateMountCrossholes(
            SkateMountParams::default(),
        ))),
        ..Default::default()
    })
    .into()
}

impl Baseplate {
    /// Merge up to six parallel beams into one.
    ///
    /// The first input is the reference line. Every other input is folded
    /// onto it by a mirror and joined by a cube; the combined beam restarts
    /// at each cube and carries the pairwise difference-frequency tag. A
    /// single input is returned unchanged.
    pub fn combine_beams(
        &mut self,
        inputs: &[BeamId],
        options: &CombinerOptions,
        kb: &mut dyn KernelBundle,
    ) -> Result<BeamId, LayoutError> {
        if inputs.is_empty() || inputs.len() > MAX_COMBINED_BEAMS {
            return Err(LayoutError::InvalidBeamCount {
                count: inputs.len(),
            });
        }
        let mut starts = Vec::with_capacity(inputs.len());
        for &beam in inputs {
            let frame = self
                .beam_transform(beam)
                .ok_or_else(|| LayoutError::UnknownBeam {
                    beam: format!("{beam:?}"),
                })?;
            starts.push(frame.translation());
        }
        if inputs.len() == 1 {
            return Ok(inputs[0]);
        }

        info!(beams = inputs.len(), label = %self.label(), "combining beams");
        let angle = options.angle;
        let ref_y = starts[0][1];
        let prefix = &options.name_prefix;
        let mut combined = inputs[0];
        let mut wavelength = self.beam(combined).and_then(BeamPath::wavelength);

        for (i, (&beam, start)) in inputs.iter().zip(&starts).enumerate().skip(1) {
            // fold towards the reference line
            let turn = if start[1] > ref_y { -90.0 } else { 90.0 };
            let mirror = self.place_element_along_beam(
                beam,
                &format!("{prefix}Mirror_Beam_{}", i + 1),
                redirect_mirror(options.thumbscrews),
                BranchIndex::ROOT,
                options.mirror_distance,
                Angle::Heading(angle + 180.0 - turn / 2.0),
                kb,
            )?;
            let [mx, my, _] = self
                .plate_transform(mirror)
                .ok_or(LayoutError::UnattachedParent)?
                .translation();
            let incoming = self.beam(beam).and_then(BeamPath::wavelength);
            self.add_beam_path(mx, my, angle + turn, incoming)?;

            let cube = self.place_element_along_beam(
                combined,
                &format!("{prefix}Combiner_{i}"),
                combining_cube(),
                BranchIndex::ROOT,
                options.combiner_spacing,
                Angle::Heading(angle),
                kb,
            )?;
            let [cx, cy, _] = self
                .plate_transform(cube)
                .ok_or(LayoutError::UnattachedParent)?
                .translation();
            wavelength = mix(wavelength, incoming);
            combined = self.add_beam_path(cx, cy, angle, wavelength)?;
        }
        Ok(combined)
    }
}
