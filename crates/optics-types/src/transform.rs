use std::ops::Mul;

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::angle::normalize_deg;

/// A rigid placement: rotation followed by translation.
///
/// `parent.compose(&relative)` is the pose of a child whose offset from
/// `parent` is `relative`. Composition is associative and every transform
/// has an exact inverse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transform {
    iso: Isometry3<f64>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            iso: Isometry3::identity(),
        }
    }

    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            iso: Isometry3::from_parts(Translation3::new(x, y, z), UnitQuaternion::identity()),
        }
    }

    /// Rotation about z by `deg` degrees, no translation.
    pub fn rotation_z_deg(deg: f64) -> Self {
        Self {
            iso: Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(&Vector3::z_axis(), deg.to_radians()),
            ),
        }
    }

    /// A pose in the xy plane at height `z`, facing `heading_deg`.
    pub fn planar(x: f64, y: f64, z: f64, heading_deg: f64) -> Self {
        Self::from_translation(x, y, z).compose(&Self::rotation_z_deg(heading_deg))
    }

    /// Position plus Euler rotation, applied as `Rz * Ry * Rx`.
    pub fn from_euler_deg(position: [f64; 3], rx: f64, ry: f64, rz: f64) -> Self {
        let rotation =
            UnitQuaternion::from_euler_angles(rx.to_radians(), ry.to_radians(), rz.to_radians());
        Self {
            iso: Isometry3::from_parts(
                Translation3::new(position[0], position[1], position[2]),
                rotation,
            ),
        }
    }

    /// `self ∘ relative`.
    pub fn compose(&self, relative: &Transform) -> Transform {
        Transform {
            iso: self.iso * relative.iso,
        }
    }

    pub fn inverse(&self) -> Transform {
        Transform {
            iso: self.iso.inverse(),
        }
    }

    /// The offset that takes `parent` to `self`.
    pub fn relative_to(&self, parent: &Transform) -> Transform {
        parent.inverse().compose(self)
    }

    pub fn translation(&self) -> [f64; 3] {
        let t = self.iso.translation.vector;
        [t.x, t.y, t.z]
    }

    /// Local +x axis expressed in the parent frame.
    pub fn forward(&self) -> [f64; 3] {
        self.transform_vector([1.0, 0.0, 0.0])
    }

    /// Heading of the local +x axis in the parent xy plane, in `[0, 360)`.
    pub fn heading_deg(&self) -> f64 {
        let f = self.forward();
        normalize_deg(f[1].atan2(f[0]).to_degrees())
    }

    pub fn transform_point(&self, p: [f64; 3]) -> [f64; 3] {
        let q = self.iso.transform_point(&Point3::new(p[0], p[1], p[2]));
        [q.x, q.y, q.z]
    }

    pub fn transform_vector(&self, v: [f64; 3]) -> [f64; 3] {
        let w = self.iso.transform_vector(&Vector3::new(v[0], v[1], v[2]));
        [w.x, w.y, w.z]
    }

    /// Equal within `eps` in both position and rotation angle (radians).
    pub fn approx_eq(&self, other: &Transform, eps: f64) -> bool {
        let dt = (self.iso.translation.vector - other.iso.translation.vector).norm();
        let dr = self.iso.rotation.angle_to(&other.iso.rotation);
        dt <= eps && dr <= eps
    }

    pub fn isometry(&self) -> &Isometry3<f64> {
        &self.iso
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Isometry3<f64>> for Transform {
    fn from(iso: Isometry3<f64>) -> Self {
        Self { iso }
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        self.compose(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const EPS: f64 = 1e-9;

    #[test]
    fn planar_pose_moves_origin() {
        let t = Transform::planar(10.0, 20.0, 0.0, 90.0);
        let p = t.transform_point([5.0, 0.0, 0.0]);
        assert_abs_diff_eq!(p[0], 10.0, epsilon = EPS);
        assert_abs_diff_eq!(p[1], 25.0, epsilon = EPS);
        assert_abs_diff_eq!(t.heading_deg(), 90.0, epsilon = EPS);
    }

    #[test]
    fn compose_then_relative_to_recovers_offset() {
        let parent = Transform::planar(3.0, -4.0, 1.0, 30.0);
        let rel = Transform::from_euler_deg([1.0, 2.0, 3.0], 10.0, 0.0, 45.0);
        let child = parent.compose(&rel);
        assert!(child.relative_to(&parent).approx_eq(&rel, EPS));
    }

    #[test]
    fn inverse_is_exact() {
        let t = Transform::from_euler_deg([7.0, 8.0, 9.0], 15.0, 25.0, 35.0);
        assert!(t.compose(&t.inverse()).approx_eq(&Transform::identity(), EPS));
    }

    #[test]
    fn euler_order_is_z_y_x() {
        let t = Transform::from_euler_deg([0.0, 0.0, 0.0], 90.0, 0.0, 90.0);
        // x rotation first keeps +x, then z rotation turns it to +y
        let f = t.forward();
        assert_abs_diff_eq!(f[1], 1.0, epsilon = EPS);
    }
}
