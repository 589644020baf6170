use std::path::Path;

use optics_types::Transform;

use crate::types::*;

/// The host geometry kernel.
///
/// Solid construction and booleans are delegated here; the layout code never
/// inspects geometry beyond what [`KernelIntrospect`] exposes.
pub trait Kernel {
    /// Box with one corner at the origin, extending to `(dx, dy, dz)`.
    fn make_box(&mut self, dx: f64, dy: f64, dz: f64) -> Result<SolidHandle, KernelError>;

    /// Cylinder with its base centre at the origin, extending `height` along `axis`.
    fn make_cylinder(
        &mut self,
        radius: f64,
        height: f64,
        axis: [f64; 3],
    ) -> Result<SolidHandle, KernelError>;

    /// Truncated cone from `radius_base` at the origin to `radius_top` at `height` along `axis`.
    fn make_cone(
        &mut self,
        radius_base: f64,
        radius_top: f64,
        height: f64,
        axis: [f64; 3],
    ) -> Result<SolidHandle, KernelError>;

    fn union(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError>;

    /// `a` minus `b`.
    fn cut(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError>;

    /// Round the given edges. Fails when the radius does not fit the adjacent faces.
    fn fillet_edges(
        &mut self,
        solid: &SolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<SolidHandle, KernelError>;

    /// A copy of `solid` moved by `placement`.
    fn transformed(
        &mut self,
        solid: &SolidHandle,
        placement: &Transform,
    ) -> Result<SolidHandle, KernelError>;

    /// A copy of `solid` scaled uniformly about the origin.
    fn scaled(&mut self, solid: &SolidHandle, factor: f64) -> Result<SolidHandle, KernelError>;

    /// Load a mesh asset as a solid-like object.
    fn import_mesh(&mut self, path: &Path) -> Result<SolidHandle, KernelError>;
}

/// Read-only queries on kernel solids.
pub trait KernelIntrospect {
    fn list_edges(&self, solid: &SolidHandle) -> Vec<EdgeInfo>;

    fn bounding_box(&self, solid: &SolidHandle) -> Option<BoundingBox>;
}
