//! Parametric solid builders shared by every part kind.
//!
//! All dimensions are millimetres. Zero, negative or non-finite sizes fail
//! with [`FactoryError::InvalidDimension`]. Fillets are best effort.

use geom_kernel::{KernelError, KernelId, SolidHandle};
use optics_types::{BoltSpec, Transform};
use serde::{Deserialize, Serialize};

use crate::kernel_ext::KernelBundle;
use crate::types::FactoryError;

pub const Z_UP: [f64; 3] = [0.0, 0.0, 1.0];
pub const Z_DOWN: [f64; 3] = [0.0, 0.0, -1.0];
pub const X_AXIS: [f64; 3] = [1.0, 0.0, 0.0];

/// Where a box sits relative to its anchor coordinate on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    /// Starts at the coordinate.
    #[default]
    Positive,
    Center,
    /// Ends at the coordinate.
    Negative,
}

impl Align {
    fn start(self, at: f64, size: f64) -> f64 {
        match self {
            Align::Positive => at,
            Align::Center => at - size / 2.0,
            Align::Negative => at - size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSpec {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub at: [f64; 3],
    pub align: [Align; 3],
    /// Radius applied to every edge parallel to `fillet_dir`; 0 disables.
    pub fillet: f64,
    pub fillet_dir: [f64; 3],
}

impl BoxSpec {
    pub fn new(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            dx,
            dy,
            dz,
            at: [0.0; 3],
            align: [Align::Positive; 3],
            fillet: 0.0,
            fillet_dir: Z_UP,
        }
    }

    pub fn at(mut self, x: f64, y: f64, z: f64) -> Self {
        self.at = [x, y, z];
        self
    }

    pub fn align(mut self, x: Align, y: Align, z: Align) -> Self {
        self.align = [x, y, z];
        self
    }

    /// Centred in x and y, with `z` alignment as given.
    pub fn centered_xy(self, z: Align) -> Self {
        self.align(Align::Center, Align::Center, z)
    }

    pub fn fillet(mut self, radius: f64, dir: [f64; 3]) -> Self {
        self.fillet = radius;
        self.fillet_dir = dir;
        self
    }
}

/// Optional bolt-head recess at the start of a cylinder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Head {
    pub dia: f64,
    pub dz: f64,
    /// Cone from `dia` down to the hole diameter instead of a flat counterbore.
    pub countersink: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderSpec {
    pub dia: f64,
    pub dz: f64,
    /// Centre of the starting face.
    pub at: [f64; 3],
    pub axis: [f64; 3],
    pub head: Option<Head>,
}

impl CylinderSpec {
    /// A cylinder going down from the origin.
    pub fn new(dia: f64, dz: f64) -> Self {
        Self {
            dia,
            dz,
            at: [0.0; 3],
            axis: Z_DOWN,
            head: None,
        }
    }

    pub fn at(mut self, x: f64, y: f64, z: f64) -> Self {
        self.at = [x, y, z];
        self
    }

    pub fn axis(mut self, axis: [f64; 3]) -> Self {
        self.axis = axis;
        self
    }

    pub fn counterbore(mut self, dia: f64, dz: f64) -> Self {
        self.head = Some(Head {
            dia,
            dz,
            countersink: false,
        });
        self
    }

    pub fn countersink(mut self, dia: f64, dz: f64) -> Self {
        self.head = Some(Head {
            dia,
            dz,
            countersink: true,
        });
        self
    }
}

/// Parameters of a bounding-box-derived drill blank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlankSpec {
    /// Growth in x and y on every side.
    pub tolerance: f64,
    /// Radius for the vertical edges of the blank.
    pub fillet: f64,
    pub min_offset: [f64; 3],
    pub max_offset: [f64; 3],
    /// The blank always reaches this height (the plate top) when set.
    pub floor: Option<f64>,
}

impl Default for BlankSpec {
    fn default() -> Self {
        Self {
            tolerance: 1.0,
            fillet: 0.0,
            min_offset: [0.0; 3],
            max_offset: [0.0; 3],
            floor: None,
        }
    }
}

fn check_dim(name: &'static str, value: f64) -> Result<(), FactoryError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(FactoryError::InvalidDimension { name, value })
    }
}

pub fn make_box(kb: &mut dyn KernelBundle, spec: &BoxSpec) -> Result<SolidHandle, FactoryError> {
    check_dim("dx", spec.dx)?;
    check_dim("dy", spec.dy)?;
    check_dim("dz", spec.dz)?;
    let mut solid = kb.make_box(spec.dx, spec.dy, spec.dz)?;
    if spec.fillet > 0.0 {
        solid = fillet_along(kb, solid, spec.fillet, spec.fillet_dir)?;
    }
    let origin = [
        spec.align[0].start(spec.at[0], spec.dx),
        spec.align[1].start(spec.at[1], spec.dy),
        spec.align[2].start(spec.at[2], spec.dz),
    ];
    let placed = kb.transformed(
        &solid,
        &Transform::from_translation(origin[0], origin[1], origin[2]),
    )?;
    Ok(placed)
}

/// Fillet every edge of `solid` parallel to `dir`.
///
/// Returns `solid` unchanged when no edge matches or the kernel rejects the
/// radius.
pub fn fillet_along(
    kb: &mut dyn KernelBundle,
    solid: SolidHandle,
    radius: f64,
    dir: [f64; 3],
) -> Result<SolidHandle, FactoryError> {
    let edges: Vec<KernelId> = kb
        .as_introspect()
        .list_edges(&solid)
        .iter()
        .filter(|e| e.is_parallel_to(dir))
        .map(|e| e.id)
        .collect();
    if edges.is_empty() {
        tracing::debug!(radius, ?dir, "no edges to fillet");
        return Ok(solid);
    }
    match kb.fillet_edges(&solid, &edges, radius) {
        Ok(filleted) => Ok(filleted),
        Err(KernelError::FilletFailed { reason }) => {
            tracing::debug!(radius, %reason, "fillet dropped");
            Ok(solid)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn make_cylinder(
    kb: &mut dyn KernelBundle,
    spec: &CylinderSpec,
) -> Result<SolidHandle, FactoryError> {
    check_dim("diameter", spec.dia)?;
    check_dim("height", spec.dz)?;
    let mut solid = kb.make_cylinder(spec.dia / 2.0, spec.dz, spec.axis)?;
    if let Some(head) = spec.head {
        check_dim("head diameter", head.dia)?;
        check_dim("head height", head.dz)?;
        let recess = if head.countersink {
            kb.make_cone(head.dia / 2.0, spec.dia / 2.0, head.dz, spec.axis)?
        } else {
            kb.make_cylinder(head.dia / 2.0, head.dz, spec.axis)?
        };
        solid = kb.union(&solid, &recess)?;
    }
    let [x, y, z] = spec.at;
    Ok(kb.transformed(&solid, &Transform::from_translation(x, y, z))?)
}

/// Box around `solid`'s bounds, grown by the tolerance in x and y.
pub fn drill_blank(
    kb: &mut dyn KernelBundle,
    solid: &SolidHandle,
    spec: &BlankSpec,
) -> Result<SolidHandle, FactoryError> {
    let bb = kb
        .as_introspect()
        .bounding_box(solid)
        .ok_or(KernelError::EntityNotFound { id: solid.raw() })?;
    let x_min = bb.min[0] - spec.tolerance + spec.min_offset[0];
    let x_max = bb.max[0] + spec.tolerance + spec.max_offset[0];
    let y_min = bb.min[1] - spec.tolerance + spec.min_offset[1];
    let y_max = bb.max[1] + spec.tolerance + spec.max_offset[1];
    let mut z_min = bb.min[2] + spec.min_offset[2];
    let mut z_max = bb.max[2] + spec.max_offset[2];
    if let Some(floor) = spec.floor {
        z_min = z_min.min(floor);
        z_max = z_max.max(floor);
    }
    make_box(
        kb,
        &BoxSpec::new(x_max - x_min, y_max - y_min, z_max - z_min)
            .at(x_min, y_min, z_min)
            .fillet(spec.fillet, Z_UP),
    )
}

/// Clearance hole bored up through a plate of thickness `plate_dz` from its
/// underside at `bottom`, counterbored for the bolt head.
pub fn plate_bolt(
    kb: &mut dyn KernelBundle,
    bolt: &BoltSpec,
    x: f64,
    y: f64,
    bottom: f64,
    plate_dz: f64,
) -> Result<SolidHandle, FactoryError> {
    make_cylinder(
        kb,
        &CylinderSpec::new(bolt.clear_dia, plate_dz)
            .at(x, y, bottom)
            .axis(Z_UP)
            .counterbore(bolt.head_dia, bolt.head_dz),
    )
}

/// Tapped hole going down `depth` from `z`.
pub fn tap_hole(
    kb: &mut dyn KernelBundle,
    bolt: &BoltSpec,
    x: f64,
    y: f64,
    z: f64,
    depth: f64,
) -> Result<SolidHandle, FactoryError> {
    make_cylinder(kb, &CylinderSpec::new(bolt.tap_dia, depth).at(x, y, z))
}

/// Union of all solids, or `None` for an empty list.
pub fn fuse_all(
    kb: &mut dyn KernelBundle,
    solids: Vec<SolidHandle>,
) -> Result<Option<SolidHandle>, FactoryError> {
    let mut iter = solids.into_iter();
    let Some(mut acc) = iter.next() else {
        return Ok(None);
    };
    for s in iter {
        acc = kb.union(&acc, &s)?;
    }
    Ok(Some(acc))
}

/// `base` minus every solid in `tools`.
pub fn cut_all(
    kb: &mut dyn KernelBundle,
    base: SolidHandle,
    tools: Vec<SolidHandle>,
) -> Result<SolidHandle, FactoryError> {
    match fuse_all(kb, tools)? {
        Some(tool) => Ok(kb.cut(&base, &tool)?),
        None => Ok(base),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use geom_kernel::{KernelIntrospect, MockKernel, MockPrimitive};

    #[test]
    fn box_alignment() {
        let mut k = MockKernel::new();
        let b = make_box(
            &mut k,
            &BoxSpec::new(10.0, 20.0, 4.0)
                .at(0.0, 0.0, -5.0)
                .centered_xy(Align::Negative),
        )
        .unwrap();
        let bb = k.bounding_box(&b).unwrap();
        assert_abs_diff_eq!(bb.min[0], -5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bb.max[1], 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bb.min[2], -9.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bb.max[2], -5.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let mut k = MockKernel::new();
        let err = make_box(&mut k, &BoxSpec::new(0.0, 1.0, 1.0)).unwrap_err();
        assert!(matches!(err, FactoryError::InvalidDimension { name: "dx", .. }));
        let err = make_cylinder(&mut k, &CylinderSpec::new(3.0, -1.0)).unwrap_err();
        assert!(matches!(err, FactoryError::InvalidDimension { name: "height", .. }));
    }

    #[test]
    fn oversized_fillet_returns_plain_box() {
        let mut k = MockKernel::new();
        let b = make_box(&mut k, &BoxSpec::new(4.0, 4.0, 4.0).fillet(10.0, Z_UP)).unwrap();
        assert_eq!(k.stats().fillets, 0);
        assert_eq!(k.list_edges(&b).len(), 12);
    }

    #[test]
    fn fitting_fillet_is_applied() {
        let mut k = MockKernel::new();
        make_box(&mut k, &BoxSpec::new(20.0, 20.0, 4.0).fillet(5.0, Z_UP)).unwrap();
        assert_eq!(k.stats().fillets, 1);
    }

    #[test]
    fn counterbored_cylinder_has_two_leaves() {
        let mut k = MockKernel::new();
        let c = make_cylinder(
            &mut k,
            &CylinderSpec::new(4.2, 10.0).at(1.0, 2.0, 0.0).counterbore(8.0, 3.0),
        )
        .unwrap();
        let leaves = k.primitives(&c);
        assert_eq!(leaves.len(), 2);
        assert!(leaves.iter().all(|l| l.placement.translation() == [1.0, 2.0, 0.0]));
        assert!(matches!(
            leaves[1].primitive,
            MockPrimitive::Cylinder { radius, height, .. } if radius == 4.0 && height == 3.0
        ));
    }

    #[test]
    fn countersink_uses_cone() {
        let mut k = MockKernel::new();
        let c = make_cylinder(&mut k, &CylinderSpec::new(3.0, 5.0).countersink(6.0, 1.5)).unwrap();
        assert!(k
            .primitives(&c)
            .iter()
            .any(|l| matches!(l.primitive, MockPrimitive::Cone { .. })));
    }

    #[test]
    fn blank_reaches_floor() {
        let mut k = MockKernel::new();
        let part = make_box(&mut k, &BoxSpec::new(10.0, 10.0, 5.0).at(0.0, 0.0, 2.0)).unwrap();
        let blank = drill_blank(
            &mut k,
            &part,
            &BlankSpec {
                tolerance: 1.0,
                floor: Some(-12.7),
                ..Default::default()
            },
        )
        .unwrap();
        let bb = k.bounding_box(&blank).unwrap();
        assert_abs_diff_eq!(bb.min[0], -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bb.max[0], 11.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bb.min[2], -12.7, epsilon = 1e-12);
        assert_abs_diff_eq!(bb.max[2], 7.0, epsilon = 1e-12);
    }

    #[test]
    fn fuse_all_of_nothing_is_none() {
        let mut k = MockKernel::new();
        assert!(fuse_all(&mut k, Vec::new()).unwrap().is_none());
    }
}
