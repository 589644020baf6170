//! Beam paths and the branch state machine that resolves placements along them.
//!
//! A beam owns a frame on the plate. Inside that frame every open branch
//! carries a cursor: the point of the last element placed on it (or the
//! split that opened it) and the heading the light leaves in. Placing an
//! element advances the cursor; splitting elements close the branch and
//! open two children `(b << 1) | 0` and `(b << 1) | 1`.

use std::collections::BTreeMap;

use optics_types::{normalize_deg, signed_delta_deg, Angle, BranchIndex, BranchPort, Transform};
use part_factory::OpticalRole;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{ElementId, LayoutError};

/// Where along a branch an element goes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Stop {
    /// Distance from the branch's last element, or from the split that opened it.
    Distance(f64),
    /// Where the branch crosses this plate-frame x.
    AtX(f64),
    /// Where the branch crosses this plate-frame y.
    AtY(f64),
}

impl From<f64> for Stop {
    fn from(d: f64) -> Self {
        Stop::Distance(d)
    }
}

/// Start pose of a beam on the plate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BeamOrigin {
    /// In the beam plane at `(x, y)`, heading `angle` degrees.
    Planar { x: f64, y: f64, angle: f64 },
    /// Anywhere, with the beam plane tilted by `angle_x`/`angle_y`;
    /// `angle_z` is the heading inside that plane.
    General {
        x: f64,
        y: f64,
        z: f64,
        angle_x: f64,
        angle_y: f64,
        angle_z: f64,
    },
}

impl BeamOrigin {
    /// Beam frame in plate coordinates.
    pub fn transform(&self) -> Transform {
        match *self {
            BeamOrigin::Planar { x, y, angle } => Transform::planar(x, y, 0.0, angle),
            BeamOrigin::General {
                x,
                y,
                z,
                angle_x,
                angle_y,
                angle_z,
            } => Transform::from_euler_deg([x, y, z], angle_x, angle_y, angle_z),
        }
    }

    /// Plate heading of the beam frame's +x, used to read absolute headings.
    pub fn heading(&self) -> f64 {
        match *self {
            BeamOrigin::Planar { angle, .. } => angle,
            BeamOrigin::General { angle_z, .. } => angle_z,
        }
    }
}

/// Position and outgoing heading of a branch, in the beam frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl Cursor {
    fn direction(&self) -> [f64; 3] {
        let rad = self.heading.to_radians();
        [rad.cos(), rad.sin(), 0.0]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchState {
    pub cursor: Cursor,
    /// Closed by a splitting element; only its children can be extended.
    pub split: bool,
}

/// Outgoing headings of an element, in the beam frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Outputs {
    One(f64),
    Two { through: f64, deflected: f64 },
}

/// A resolved placement, not yet applied to the beam.
#[derive(Debug, Clone)]
pub(crate) struct Step {
    pub branch: BranchIndex,
    /// Element pose in the beam frame.
    pub pose: Transform,
    advance: Advance,
}

#[derive(Debug, Clone)]
enum Advance {
    Continue(Cursor),
    Split {
        through: (BranchIndex, Cursor),
        deflected: (BranchIndex, Cursor),
    },
}

/// A symbolic optical axis and its branch tree.
#[derive(Debug, Clone)]
pub struct BeamPath {
    name: String,
    origin: BeamOrigin,
    wavelength: Option<f64>,
    branches: BTreeMap<BranchIndex, BranchState>,
    elements: Vec<ElementId>,
}

/// Mirror `heading` about a surface with normal `normal`.
pub(crate) fn reflect(normal: f64, heading: f64) -> f64 {
    normalize_deg(2.0 * normal - heading + 180.0)
}

/// Element orientation and outgoing headings for an element acting as
/// `role`, met by a branch travelling at `h`. `offset` is the plate
/// heading of the beam frame.
pub(crate) fn orient(
    h: f64,
    offset: f64,
    angle: Angle,
    role: OpticalRole,
    name: &str,
) -> (f64, Outputs) {
    let theta = match angle {
        Angle::Heading(deg) => normalize_deg(deg - offset),
        Angle::Relative(deg) => normalize_deg(h + deg),
        Angle::Turn(turn) => {
            let arriving = normalize_deg(h + offset);
            if signed_delta_deg(turn.incoming().degrees(), arriving).abs() > 1e-6 {
                warn!(
                    element = name,
                    %turn,
                    heading = arriving,
                    "turn does not start from the arriving beam heading"
                );
            }
            let out = normalize_deg(h + turn.delta());
            if role == OpticalRole::Reflect {
                // normal on the bisector between the arriving and leaving rays
                return (normalize_deg(h + 180.0 - turn.delta() / 2.0), Outputs::One(out));
            }
            warn!(element = name, %turn, "turn given for a non-reflecting element");
            out
        }
    };
    let outputs = match role {
        OpticalRole::Passive | OpticalRole::Transmit => Outputs::One(h),
        OpticalRole::Reflect => Outputs::One(reflect(theta, h)),
        OpticalRole::Split { diagonal_deg } => Outputs::Two {
            through: h,
            deflected: reflect(theta + diagonal_deg, h),
        },
        OpticalRole::Diffract {
            angle_deg,
            direction,
        } => Outputs::Two {
            through: h,
            deflected: normalize_deg(h + direction * angle_deg),
        },
    };
    (theta, outputs)
}

impl BeamPath {
    pub(crate) fn new(name: String, origin: BeamOrigin, wavelength: Option<f64>) -> Self {
        let mut branches = BTreeMap::new();
        branches.insert(
            BranchIndex::ROOT,
            BranchState {
                cursor: Cursor {
                    x: 0.0,
                    y: 0.0,
                    heading: 0.0,
                },
                split: false,
            },
        );
        Self {
            name,
            origin,
            wavelength,
            branches,
            elements: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &BeamOrigin {
        &self.origin
    }

    /// Wavelength tag in nanometres.
    pub fn wavelength(&self) -> Option<f64> {
        self.wavelength
    }

    /// Every branch index this beam has produced, in index order.
    pub fn branches(&self) -> impl Iterator<Item = BranchIndex> + '_ {
        self.branches.keys().copied()
    }

    /// Branches that can still be extended.
    pub fn open_branches(&self) -> Vec<BranchIndex> {
        self.branches
            .iter()
            .filter(|(_, s)| !s.split)
            .map(|(b, _)| *b)
            .collect()
    }

    pub fn branch(&self, index: BranchIndex) -> Option<&BranchState> {
        self.branches.get(&index)
    }

    /// Plate heading of a branch, in degrees.
    pub fn heading(&self, index: BranchIndex) -> Option<f64> {
        self.branches
            .get(&index)
            .map(|s| normalize_deg(s.cursor.heading + self.origin.heading()))
    }

    /// Elements placed along this beam, in placement order.
    pub fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    /// Resolve a placement without changing the beam. `frame` is the beam
    /// frame in plate coordinates.
    pub(crate) fn plan(
        &self,
        frame: &Transform,
        name: &str,
        branch: BranchIndex,
        stop: Stop,
        angle: Angle,
        role: OpticalRole,
    ) -> Result<Step, LayoutError> {
        let state = self
            .branches
            .get(&branch)
            .ok_or_else(|| LayoutError::InvalidBranchIndex {
                beam: self.name.clone(),
                index: branch,
            })?;
        if state.split {
            return Err(LayoutError::BranchSplit {
                beam: self.name.clone(),
                index: branch,
            });
        }

        let cursor = state.cursor;
        let travel = match stop {
            Stop::Distance(d) => {
                if !d.is_finite() || d < 0.0 {
                    return Err(LayoutError::InvalidDimension {
                        name: "distance",
                        value: d,
                    });
                }
                d
            }
            Stop::AtX(x) => self.travel_to(frame, &cursor, 0, x, name)?,
            Stop::AtY(y) => self.travel_to(frame, &cursor, 1, y, name)?,
        };
        let dir = cursor.direction();
        let x = cursor.x + travel * dir[0];
        let y = cursor.y + travel * dir[1];

        let (theta, outputs) = orient(cursor.heading, self.origin.heading(), angle, role, name);
        let advance = match outputs {
            Outputs::One(heading) => Advance::Continue(Cursor { x, y, heading }),
            Outputs::Two { through, deflected } => {
                let child = |port| {
                    branch
                        .child(port)
                        .ok_or(LayoutError::BranchOverflow { index: branch })
                };
                Advance::Split {
                    through: (
                        child(BranchPort::Through)?,
                        Cursor {
                            x,
                            y,
                            heading: through,
                        },
                    ),
                    deflected: (
                        child(BranchPort::Deflected)?,
                        Cursor {
                            x,
                            y,
                            heading: deflected,
                        },
                    ),
                }
            }
        };

        Ok(Step {
            branch,
            pose: Transform::planar(x, y, 0.0, theta),
            advance,
        })
    }

    /// Parameter along the branch at which it crosses `target` on plate axis `axis`.
    fn travel_to(
        &self,
        frame: &Transform,
        cursor: &Cursor,
        axis: usize,
        target: f64,
        name: &str,
    ) -> Result<f64, LayoutError> {
        let label = if axis == 0 { "x" } else { "y" };
        let start = frame.transform_point([cursor.x, cursor.y, 0.0]);
        let dir = frame.transform_vector(cursor.direction());
        if dir[axis].abs() < 1e-12 {
            return Err(LayoutError::UnreachableStop {
                name: name.to_string(),
                reason: format!("beam {} runs parallel to {label} = {target}", self.name),
            });
        }
        let t = (target - start[axis]) / dir[axis];
        if t < -1e-9 {
            return Err(LayoutError::UnreachableStop {
                name: name.to_string(),
                reason: format!("{label} = {target} lies behind the end of beam {}", self.name),
            });
        }
        Ok(t.max(0.0))
    }

    /// Commit a planned step for the element that was built from it.
    pub(crate) fn apply(&mut self, step: &Step, element: ElementId) {
        match &step.advance {
            Advance::Continue(cursor) => {
                self.branches.insert(
                    step.branch,
                    BranchState {
                        cursor: *cursor,
                        split: false,
                    },
                );
            }
            Advance::Split { through, deflected } => {
                if let Some(state) = self.branches.get_mut(&step.branch) {
                    state.split = true;
                }
                for (index, cursor) in [through, deflected] {
                    self.branches.insert(
                        *index,
                        BranchState {
                            cursor: *cursor,
                            split: false,
                        },
                    );
                }
            }
        }
        self.elements.push(element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optics_types::{Cardinal, Turn};

    fn one(outputs: Outputs) -> f64 {
        match outputs {
            Outputs::One(h) => h,
            other => panic!("expected one output, got {other:?}"),
        }
    }

    #[test]
    fn mirror_heading_folds_beam() {
        // beam going right meets a mirror facing up-left
        let (theta, out) = orient(0.0, 0.0, Angle::Heading(135.0), OpticalRole::Reflect, "m");
        assert_eq!(theta, 135.0);
        assert!((one(out) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn mirror_turns_land_on_outgoing_cardinal() {
        for turn in Turn::ALL {
            let h = turn.incoming().degrees();
            let (theta, out) = orient(h, 0.0, turn.into(), OpticalRole::Reflect, "m");
            assert_eq!(one(out), turn.outgoing().degrees(), "{turn}");
            // reflecting about the chosen normal gives the same heading
            assert!(signed_delta_deg(reflect(theta, h), one(out)).abs() < 1e-9, "{turn}");
        }
    }

    #[test]
    fn splitter_reflects_counter_clockwise_by_default() {
        let split = OpticalRole::Split { diagonal_deg: -45.0 };
        let (_, out) = orient(0.0, 0.0, Cardinal::Right.into(), split, "pbs");
        match out {
            Outputs::Two { through, deflected } => {
                assert_eq!(through, 0.0);
                assert!((deflected - 90.0).abs() < 1e-9);
            }
            other => panic!("{other:?}"),
        }
        let (_, out) = orient(90.0, 0.0, Cardinal::Up.into(), split, "pbs");
        match out {
            Outputs::Two { deflected, .. } => assert!((deflected - 180.0).abs() < 1e-9),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn diffraction_bends_deflected_order() {
        let aom = OpticalRole::Diffract {
            angle_deg: 1.5,
            direction: -1.0,
        };
        let (_, out) = orient(180.0, 0.0, Angle::Relative(0.0), aom, "aom");
        assert_eq!(
            out,
            Outputs::Two {
                through: 180.0,
                deflected: 178.5
            }
        );
    }

    #[test]
    fn headings_are_read_in_the_beam_frame() {
        let (theta, out) = orient(0.0, 90.0, Cardinal::Up.into(), OpticalRole::Transmit, "lens");
        assert_eq!(theta, 0.0);
        assert_eq!(one(out), 0.0);
    }

    #[test]
    fn distance_accumulates_on_branch() {
        let beam = BeamPath::new("b".into(), BeamOrigin::Planar { x: 0.0, y: 0.0, angle: 0.0 }, None);
        let frame = beam.origin.transform();
        let step = beam
            .plan(&frame, "l", BranchIndex::ROOT, Stop::Distance(10.0), Angle::Relative(0.0), OpticalRole::Transmit)
            .unwrap();
        let mut beam = beam;
        beam.apply(&step, ElementId { plate: uuid::Uuid::nil(), node: Default::default() });
        let next = beam
            .plan(&frame, "l2", BranchIndex::ROOT, Stop::Distance(5.0), Angle::Relative(0.0), OpticalRole::Transmit)
            .unwrap();
        assert!((next.pose.translation()[0] - 15.0).abs() < 1e-12);
    }

    #[test]
    fn stop_behind_cursor_is_unreachable() {
        let beam = BeamPath::new("b".into(), BeamOrigin::Planar { x: 50.0, y: 0.0, angle: 0.0 }, None);
        let frame = beam.origin.transform();
        let err = beam
            .plan(&frame, "m", BranchIndex::ROOT, Stop::AtX(10.0), Angle::Relative(0.0), OpticalRole::Transmit)
            .unwrap_err();
        assert!(matches!(err, LayoutError::UnreachableStop { .. }));
        let err = beam
            .plan(&frame, "m", BranchIndex::ROOT, Stop::AtY(10.0), Angle::Relative(0.0), OpticalRole::Transmit)
            .unwrap_err();
        assert!(matches!(err, LayoutError::UnreachableStop { .. }));
    }
}
