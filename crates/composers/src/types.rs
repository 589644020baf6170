use layout_engine::{BeamId, ElementId, LayoutError, Stop};
use optics_types::{normalize_deg, signed_delta_deg, Angle, Turn};
use part_factory::params::MirrorMountParams;
use part_factory::PartKind;
use serde::{Deserialize, Serialize};

/// Errors raised while composing a module or subsystem.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ComposeError {
    #[error("no Littrow angle for {wavelength_nm} nm on a {lines_per_mm} lines/mm grating")]
    NoLittrowAngle {
        wavelength_nm: f64,
        lines_per_mm: f64,
    },
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
}

/// What a composer added to the baseplate.
#[derive(Debug, Clone, Default)]
pub struct Composed {
    /// Beams in creation order.
    pub beams: Vec<BeamId>,
    /// Top-level elements in placement order; mounts and other children
    /// hang off these.
    pub elements: Vec<ElementId>,
}

impl Composed {
    pub fn extend(&mut self, other: Composed) {
        self.beams.extend(other.beams);
        self.elements.extend(other.elements);
    }
}

/// Kinematic mirror mount used by a module's steering mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorMount {
    K05s1,
    K05s2,
    #[default]
    Km05,
}

impl MirrorMount {
    pub fn part(self, thumbscrews: bool) -> PartKind {
        let params = MirrorMountParams {
            thumbscrews,
            ..Default::default()
        };
        match self {
            MirrorMount::K05s1 => PartKind::MirrorMountK05s1(params),
            MirrorMount::K05s2 => PartKind::MirrorMountK05s2(params),
            MirrorMount::Km05 => PartKind::MirrorMountKm05(params),
        }
    }
}

/// Placement of a module on its host plate.
///
/// Module geometry is written in module coordinates, with the module's own
/// plate corner at the origin and the input beam along the cardinal
/// directions; the frame maps it onto the host plate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    /// Degrees.
    pub angle: f64,
}

impl Frame {
    pub fn new(x: f64, y: f64, angle: f64) -> Self {
        Self { x, y, angle }
    }

    /// Plate coordinates of a module point.
    pub fn point(&self, x: f64, y: f64) -> (f64, f64) {
        let (dx, dy) = self.vector(x, y);
        (self.x + dx, self.y + dy)
    }

    /// Plate-frame direction of a module vector.
    pub fn vector(&self, x: f64, y: f64) -> (f64, f64) {
        let (s, c) = self.angle.to_radians().sin_cos();
        (c * x - s * y, s * x + c * y)
    }

    /// Plate heading of a module heading.
    pub fn heading(&self, deg: f64) -> f64 {
        normalize_deg(self.angle + deg)
    }

    /// Absolute orientation for a module heading.
    pub fn facing(&self, deg: f64) -> Angle {
        Angle::Heading(self.heading(deg))
    }

    /// A quarter turn written in module directions.
    ///
    /// Turns name plate directions, so a rotated module expresses the same
    /// fold relative to the arriving beam instead.
    pub fn turn(&self, turn: Turn) -> Angle {
        if self.is_axis_aligned() {
            Angle::Turn(turn)
        } else {
            Angle::Relative(180.0 - turn.delta() / 2.0)
        }
    }

    /// Frame of a sub-module placed at module coordinates `(x, y)`.
    pub fn child(&self, x: f64, y: f64, angle: f64) -> Frame {
        let (px, py) = self.point(x, y);
        Frame::new(px, py, self.heading(angle))
    }

    /// Module coordinates of a plate point.
    pub fn local_point(&self, x: f64, y: f64) -> (f64, f64) {
        self.local_vector(x - self.x, y - self.y)
    }

    /// Module direction of a plate vector.
    pub fn local_vector(&self, x: f64, y: f64) -> (f64, f64) {
        let (s, c) = self.angle.to_radians().sin_cos();
        (c * x + s * y, c * y - s * x)
    }

    /// Plate stop for a stop written in module coordinates.
    ///
    /// A module coordinate line is a plate coordinate line only when the
    /// frame sits on a quarter turn; `None` otherwise.
    pub fn stop(&self, stop: Stop) -> Option<Stop> {
        if let Stop::Distance(d) = stop {
            return Some(Stop::Distance(d));
        }
        let quarter = normalize_deg(self.angle) / 90.0;
        if (quarter - quarter.round()).abs() > 1e-9 {
            return None;
        }
        Some(match (stop, quarter.round() as i64 % 4) {
            (Stop::AtX(x), 0) => Stop::AtX(self.x + x),
            (Stop::AtY(y), 0) => Stop::AtY(self.y + y),
            (Stop::AtX(x), 1) => Stop::AtY(self.y + x),
            (Stop::AtY(y), 1) => Stop::AtX(self.x - y),
            (Stop::AtX(x), 2) => Stop::AtX(self.x - x),
            (Stop::AtY(y), 2) => Stop::AtY(self.y - y),
            (Stop::AtX(x), _) => Stop::AtY(self.y - x),
            (Stop::AtY(y), _) => Stop::AtX(self.x + y),
            (Stop::Distance(d), _) => Stop::Distance(d),
        })
    }

    fn is_axis_aligned(&self) -> bool {
        signed_delta_deg(0.0, self.angle).abs() < 1e-9
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rotates_then_translates() {
        let f = Frame::new(10.0, 20.0, 90.0);
        let (x, y) = f.point(5.0, 0.0);
        assert!((x - 10.0).abs() < 1e-12);
        assert!((y - 25.0).abs() < 1e-12);
        assert_eq!(f.heading(270.0), 0.0);
    }

    #[test]
    fn coordinate_stops_follow_quarter_turns() {
        let f = Frame::new(100.0, 50.0, 90.0);
        assert_eq!(f.stop(Stop::AtX(10.0)), Some(Stop::AtY(60.0)));
        assert_eq!(f.stop(Stop::AtY(10.0)), Some(Stop::AtX(90.0)));
        let f = Frame::new(100.0, 50.0, 180.0);
        assert_eq!(f.stop(Stop::AtX(10.0)), Some(Stop::AtX(90.0)));
        assert_eq!(Frame::new(0.0, 0.0, 30.0).stop(Stop::AtX(1.0)), None);
        assert_eq!(
            Frame::new(0.0, 0.0, 30.0).stop(Stop::Distance(4.0)),
            Some(Stop::Distance(4.0))
        );
    }

    #[test]
    fn local_point_inverts_point() {
        let f = Frame::new(7.0, -3.0, 37.0);
        let (px, py) = f.point(12.0, 5.0);
        let (x, y) = f.local_point(px, py);
        assert!((x - 12.0).abs() < 1e-9);
        assert!((y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn child_frames_compose() {
        let f = Frame::new(1.0, 2.0, 90.0).child(3.0, 0.0, 90.0);
        assert!((f.x - 1.0).abs() < 1e-12);
        assert!((f.y - 5.0).abs() < 1e-12);
        assert_eq!(f.angle, 180.0);
    }

    #[test]
    fn rotated_turns_fold_relative_to_the_beam() {
        assert_eq!(Frame::default().turn(Turn::UpRight), Angle::Turn(Turn::UpRight));
        assert_eq!(Frame::new(0.0, 0.0, 360.0).turn(Turn::UpRight), Angle::Turn(Turn::UpRight));
        assert_eq!(
            Frame::new(0.0, 0.0, 90.0).turn(Turn::UpRight),
            Angle::Relative(225.0)
        );
    }
}
