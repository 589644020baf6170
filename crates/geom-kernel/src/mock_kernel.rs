//! MockKernel: deterministic test double implementing Kernel + KernelIntrospect.
//!
//! Records the construction history of every solid as a CSG tree instead of
//! evaluating boundaries. Bounding boxes and box edges are tracked exactly so
//! fillet selection and placement checks behave like a real kernel.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use optics_types::Transform;

use crate::traits::{Kernel, KernelIntrospect};
use crate::types::*;

/// Leaf shape of a mock solid, in its own local frame.
#[derive(Debug, Clone, PartialEq)]
pub enum MockPrimitive {
    Box {
        dx: f64,
        dy: f64,
        dz: f64,
    },
    Cylinder {
        radius: f64,
        height: f64,
        axis: [f64; 3],
    },
    Cone {
        radius_base: f64,
        radius_top: f64,
        height: f64,
        axis: [f64; 3],
    },
    Mesh {
        path: PathBuf,
    },
}

/// Construction history of a mock solid, with handles resolved away.
///
/// Two solids built by the same sequence of operations compare equal, which
/// is what the geometric equality checks in tests rely on.
#[derive(Debug, Clone, PartialEq)]
pub enum CsgTree {
    Primitive(MockPrimitive),
    Union(Box<CsgTree>, Box<CsgTree>),
    Cut(Box<CsgTree>, Box<CsgTree>),
    Fillet {
        source: Box<CsgTree>,
        edges: usize,
        radius: f64,
    },
    Placed {
        source: Box<CsgTree>,
        placement: Transform,
    },
    Scaled {
        source: Box<CsgTree>,
        factor: f64,
    },
}

/// A primitive leaf with its accumulated placement.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedPrimitive {
    pub primitive: MockPrimitive,
    pub placement: Transform,
    pub scale: f64,
    /// True when the leaf sits on the subtracted side of an odd number of cuts.
    pub subtracted: bool,
}

/// Operation counters, for asserting how much work a caller did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockStats {
    pub primitives: usize,
    pub unions: usize,
    pub cuts: usize,
    pub fillets: usize,
    pub transforms: usize,
    pub imports: usize,
}

#[derive(Debug, Clone)]
struct MockSolid {
    tree: CsgTree,
    bbox: BoundingBox,
    edges: Vec<EdgeInfo>,
}

/// Deterministic test double for the geometry kernel.
/// Implements both Kernel and KernelIntrospect.
pub struct MockKernel {
    next_id: u64,
    next_handle: u64,
    solids: HashMap<u64, MockSolid>,
    /// Mesh files that import successfully, with their bounds.
    meshes: HashMap<PathBuf, BoundingBox>,
    accept_any_mesh: bool,
    stats: MockStats,
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            next_handle: 1,
            solids: HashMap::new(),
            meshes: HashMap::new(),
            accept_any_mesh: true,
            stats: MockStats::default(),
        }
    }

    /// Only meshes registered with [`MockKernel::register_mesh`] import; others fail.
    pub fn strict_meshes(mut self) -> Self {
        self.accept_any_mesh = false;
        self
    }

    /// Make `path` importable with the given bounds.
    pub fn register_mesh(&mut self, path: impl Into<PathBuf>, bounds: BoundingBox) {
        self.meshes.insert(path.into(), bounds);
    }

    pub fn stats(&self) -> MockStats {
        self.stats
    }

    /// Number of mesh files actually read.
    pub fn import_count(&self) -> usize {
        self.stats.imports
    }

    pub fn solid_count(&self) -> usize {
        self.solids.len()
    }

    /// Construction history of `solid`.
    pub fn canonical(&self, solid: &SolidHandle) -> Option<&CsgTree> {
        self.solids.get(&solid.0).map(|s| &s.tree)
    }

    /// Flattened primitive leaves of `solid` in the solid's frame.
    pub fn primitives(&self, solid: &SolidHandle) -> Vec<PlacedPrimitive> {
        let mut out = Vec::new();
        if let Some(s) = self.solids.get(&solid.0) {
            collect_leaves(&s.tree, Transform::identity(), 1.0, false, &mut out);
        }
        out
    }

    fn alloc_id(&mut self) -> KernelId {
        let id = KernelId(self.next_id);
        self.next_id += 1;
        id
    }

    fn alloc_handle(&mut self) -> SolidHandle {
        let h = SolidHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn get(&self, h: &SolidHandle) -> Result<&MockSolid, KernelError> {
        self.solids
            .get(&h.0)
            .ok_or(KernelError::EntityNotFound { id: h.0 })
    }

    fn insert(&mut self, solid: MockSolid) -> SolidHandle {
        let h = self.alloc_handle();
        self.solids.insert(h.0, solid);
        h
    }

    /// Re-issue edge ids so every solid owns its own edge set.
    fn fresh_edges(&mut self, edges: &[EdgeInfo]) -> Vec<EdgeInfo> {
        edges
            .iter()
            .map(|e| EdgeInfo {
                id: self.alloc_id(),
                start: e.start,
                end: e.end,
            })
            .collect()
    }

    /// The 12 edges of a box: 4 bottom, 4 top, 4 vertical.
    fn box_edges(&mut self, dx: f64, dy: f64, dz: f64) -> Vec<EdgeInfo> {
        let p = [
            [0.0, 0.0, 0.0],
            [dx, 0.0, 0.0],
            [dx, dy, 0.0],
            [0.0, dy, 0.0],
            [0.0, 0.0, dz],
            [dx, 0.0, dz],
            [dx, dy, dz],
            [0.0, dy, dz],
        ];
        let pairs = [
            (0, 1),
            (1, 2),
            (2, 3),
            (3, 0),
            (4, 5),
            (5, 6),
            (6, 7),
            (7, 4),
            (0, 4),
            (1, 5),
            (2, 6),
            (3, 7),
        ];
        pairs
            .iter()
            .map(|&(s, e)| EdgeInfo {
                id: self.alloc_id(),
                start: p[s],
                end: p[e],
            })
            .collect()
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_leaves(
    tree: &CsgTree,
    placement: Transform,
    scale: f64,
    subtracted: bool,
    out: &mut Vec<PlacedPrimitive>,
) {
    match tree {
        CsgTree::Primitive(p) => out.push(PlacedPrimitive {
            primitive: p.clone(),
            placement,
            scale,
            subtracted,
        }),
        CsgTree::Union(a, b) => {
            collect_leaves(a, placement, scale, subtracted, out);
            collect_leaves(b, placement, scale, subtracted, out);
        }
        CsgTree::Cut(a, b) => {
            collect_leaves(a, placement, scale, subtracted, out);
            collect_leaves(b, placement, scale, !subtracted, out);
        }
        CsgTree::Fillet { source, .. } => {
            collect_leaves(source, placement, scale, subtracted, out)
        }
        CsgTree::Placed {
            source,
            placement: p,
        } => collect_leaves(source, placement.compose(p), scale, subtracted, out),
        CsgTree::Scaled { source, factor } => {
            collect_leaves(source, placement, scale * factor, subtracted, out)
        }
    }
}

fn normalized(axis: [f64; 3]) -> Result<[f64; 3], KernelError> {
    let n = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
    if n < 1e-12 {
        return Err(KernelError::InvalidGeometry {
            reason: "zero-length axis".into(),
        });
    }
    Ok([axis[0] / n, axis[1] / n, axis[2] / n])
}

/// Bounds of a round solid of `radius` swept `height` along a unit `axis`.
fn round_bounds(radius: f64, height: f64, axis: [f64; 3]) -> BoundingBox {
    let mut min = [0.0; 3];
    let mut max = [0.0; 3];
    for k in 0..3 {
        let end = axis[k] * height;
        let spread = radius * (1.0 - axis[k] * axis[k]).max(0.0).sqrt();
        min[k] = end.min(0.0) - spread;
        max[k] = end.max(0.0) + spread;
    }
    BoundingBox { min, max }
}

fn positive(name: &str, value: f64) -> Result<(), KernelError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(KernelError::InvalidGeometry {
            reason: format!("{name} must be positive, got {value}"),
        })
    }
}

impl Kernel for MockKernel {
    fn make_box(&mut self, dx: f64, dy: f64, dz: f64) -> Result<SolidHandle, KernelError> {
        positive("box dx", dx)?;
        positive("box dy", dy)?;
        positive("box dz", dz)?;
        self.stats.primitives += 1;
        let edges = self.box_edges(dx, dy, dz);
        Ok(self.insert(MockSolid {
            tree: CsgTree::Primitive(MockPrimitive::Box { dx, dy, dz }),
            bbox: BoundingBox::new([0.0; 3], [dx, dy, dz]),
            edges,
        }))
    }

    fn make_cylinder(
        &mut self,
        radius: f64,
        height: f64,
        axis: [f64; 3],
    ) -> Result<SolidHandle, KernelError> {
        positive("cylinder radius", radius)?;
        positive("cylinder height", height)?;
        let axis = normalized(axis)?;
        self.stats.primitives += 1;
        Ok(self.insert(MockSolid {
            tree: CsgTree::Primitive(MockPrimitive::Cylinder {
                radius,
                height,
                axis,
            }),
            bbox: round_bounds(radius, height, axis),
            edges: Vec::new(),
        }))
    }

    fn make_cone(
        &mut self,
        radius_base: f64,
        radius_top: f64,
        height: f64,
        axis: [f64; 3],
    ) -> Result<SolidHandle, KernelError> {
        positive("cone height", height)?;
        if radius_base < 0.0 || radius_top < 0.0 || radius_base + radius_top <= 0.0 {
            return Err(KernelError::InvalidGeometry {
                reason: format!("cone radii {radius_base}/{radius_top} are degenerate"),
            });
        }
        let axis = normalized(axis)?;
        self.stats.primitives += 1;
        Ok(self.insert(MockSolid {
            tree: CsgTree::Primitive(MockPrimitive::Cone {
                radius_base,
                radius_top,
                height,
                axis,
            }),
            bbox: round_bounds(radius_base.max(radius_top), height, axis),
            edges: Vec::new(),
        }))
    }

    fn union(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError> {
        let sa = self.get(a)?.clone();
        let sb = self.get(b)?.clone();
        self.stats.unions += 1;
        let mut edges = self.fresh_edges(&sa.edges);
        edges.extend(self.fresh_edges(&sb.edges));
        Ok(self.insert(MockSolid {
            tree: CsgTree::Union(Box::new(sa.tree), Box::new(sb.tree)),
            bbox: sa.bbox.union(&sb.bbox),
            edges,
        }))
    }

    fn cut(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelError> {
        let sa = self.get(a)?.clone();
        let sb = self.get(b)?.clone();
        self.stats.cuts += 1;
        let edges = self.fresh_edges(&sa.edges);
        Ok(self.insert(MockSolid {
            tree: CsgTree::Cut(Box::new(sa.tree), Box::new(sb.tree)),
            bbox: sa.bbox,
            edges,
        }))
    }

    fn fillet_edges(
        &mut self,
        solid: &SolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<SolidHandle, KernelError> {
        if radius <= 0.0 {
            return Err(KernelError::FilletFailed {
                reason: format!("radius must be positive, got {radius}"),
            });
        }
        let source = self.get(solid)?.clone();
        let size = source.bbox.size();
        for id in edges {
            let edge = source
                .edges
                .iter()
                .find(|e| e.id == *id)
                .ok_or_else(|| KernelError::FilletFailed {
                    reason: format!("edge {} not on solid", id.0),
                })?;
            // the two faces meeting at an edge span the directions across it
            let t = edge.tangent();
            let room = (0..3)
                .filter(|&k| t[k].abs() < 0.5)
                .map(|k| size[k])
                .fold(f64::INFINITY, f64::min);
            if 2.0 * radius > room {
                return Err(KernelError::FilletFailed {
                    reason: format!("radius {radius} exceeds adjacent face width {room}"),
                });
            }
        }
        self.stats.fillets += 1;
        let kept: Vec<EdgeInfo> = source
            .edges
            .iter()
            .filter(|e| !edges.contains(&e.id))
            .cloned()
            .collect();
        let kept = self.fresh_edges(&kept);
        Ok(self.insert(MockSolid {
            tree: CsgTree::Fillet {
                source: Box::new(source.tree),
                edges: edges.len(),
                radius,
            },
            bbox: source.bbox,
            edges: kept,
        }))
    }

    fn transformed(
        &mut self,
        solid: &SolidHandle,
        placement: &Transform,
    ) -> Result<SolidHandle, KernelError> {
        let source = self.get(solid)?.clone();
        self.stats.transforms += 1;
        let moved: Vec<EdgeInfo> = source
            .edges
            .iter()
            .map(|e| EdgeInfo {
                id: e.id,
                start: placement.transform_point(e.start),
                end: placement.transform_point(e.end),
            })
            .collect();
        let edges = self.fresh_edges(&moved);
        Ok(self.insert(MockSolid {
            tree: CsgTree::Placed {
                source: Box::new(source.tree),
                placement: *placement,
            },
            bbox: source.bbox.transformed(placement),
            edges,
        }))
    }

    fn scaled(&mut self, solid: &SolidHandle, factor: f64) -> Result<SolidHandle, KernelError> {
        positive("scale factor", factor)?;
        let source = self.get(solid)?.clone();
        self.stats.transforms += 1;
        let scale = |p: [f64; 3]| [p[0] * factor, p[1] * factor, p[2] * factor];
        let moved: Vec<EdgeInfo> = source
            .edges
            .iter()
            .map(|e| EdgeInfo {
                id: e.id,
                start: scale(e.start),
                end: scale(e.end),
            })
            .collect();
        let edges = self.fresh_edges(&moved);
        Ok(self.insert(MockSolid {
            tree: CsgTree::Scaled {
                source: Box::new(source.tree),
                factor,
            },
            bbox: BoundingBox::new(scale(source.bbox.min), scale(source.bbox.max)),
            edges,
        }))
    }

    fn import_mesh(&mut self, path: &Path) -> Result<SolidHandle, KernelError> {
        let bbox = match self.meshes.get(path) {
            Some(b) => *b,
            None if self.accept_any_mesh => BoundingBox::new([-5.0; 3], [5.0; 3]),
            None => {
                return Err(KernelError::MeshImportFailed {
                    path: path.to_path_buf(),
                    reason: "file not found".into(),
                })
            }
        };
        self.stats.imports += 1;
        Ok(self.insert(MockSolid {
            tree: CsgTree::Primitive(MockPrimitive::Mesh {
                path: path.to_path_buf(),
            }),
            bbox,
            edges: Vec::new(),
        }))
    }
}

impl KernelIntrospect for MockKernel {
    fn list_edges(&self, solid: &SolidHandle) -> Vec<EdgeInfo> {
        self.solids
            .get(&solid.0)
            .map(|s| s.edges.clone())
            .unwrap_or_default()
    }

    fn bounding_box(&self, solid: &SolidHandle) -> Option<BoundingBox> {
        self.solids.get(&solid.0).map(|s| s.bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_box_has_twelve_edges() {
        let mut k = MockKernel::new();
        let b = k.make_box(10.0, 20.0, 30.0).unwrap();
        assert_eq!(k.list_edges(&b).len(), 12);
        let bb = k.bounding_box(&b).unwrap();
        assert_eq!(bb.max, [10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_deterministic_trees() {
        let build = || {
            let mut k = MockKernel::new();
            let a = k.make_box(1.0, 2.0, 3.0).unwrap();
            let c = k.make_cylinder(0.5, 4.0, [0.0, 0.0, 1.0]).unwrap();
            let r = k.cut(&a, &c).unwrap();
            k.canonical(&r).cloned()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_cylinder_bounds_follow_axis() {
        let mut k = MockKernel::new();
        let c = k.make_cylinder(2.0, 10.0, [0.0, 0.0, -1.0]).unwrap();
        let bb = k.bounding_box(&c).unwrap();
        assert_abs_diff_eq!(bb.min[2], -10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bb.max[2], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bb.max[0], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transformed_moves_bounds_and_edges() {
        let mut k = MockKernel::new();
        let b = k.make_box(1.0, 1.0, 1.0).unwrap();
        let moved = k
            .transformed(&b, &Transform::from_translation(5.0, 0.0, 0.0))
            .unwrap();
        let bb = k.bounding_box(&moved).unwrap();
        assert_abs_diff_eq!(bb.min[0], 5.0, epsilon = 1e-12);
        assert!(k.list_edges(&moved).iter().all(|e| e.start[0] >= 5.0 - 1e-12));
    }

    #[test]
    fn test_fillet_single_edge() {
        let mut k = MockKernel::new();
        let b = k.make_box(10.0, 10.0, 10.0).unwrap();
        let vertical: Vec<KernelId> = k
            .list_edges(&b)
            .iter()
            .filter(|e| e.is_parallel_to([0.0, 0.0, 1.0]))
            .map(|e| e.id)
            .collect();
        assert_eq!(vertical.len(), 4);
        let f = k.fillet_edges(&b, &vertical[..1], 2.0).unwrap();
        assert_eq!(k.list_edges(&f).len(), 11);
        assert_eq!(k.stats().fillets, 1);
    }

    #[test]
    fn test_fillet_too_large_fails() {
        let mut k = MockKernel::new();
        let b = k.make_box(12.0, 4.0, 8.0).unwrap();
        let edge = k
            .list_edges(&b)
            .into_iter()
            .find(|e| e.is_parallel_to([0.0, 0.0, 1.0]))
            .unwrap();
        let err = k.fillet_edges(&b, &[edge.id], 3.0);
        assert!(matches!(err, Err(KernelError::FilletFailed { .. })));
    }

    #[test]
    fn test_fillet_invalid_edge() {
        let mut k = MockKernel::new();
        let b = k.make_box(10.0, 10.0, 10.0).unwrap();
        let err = k.fillet_edges(&b, &[KernelId(9999)], 1.0);
        assert!(matches!(err, Err(KernelError::FilletFailed { .. })));
    }

    #[test]
    fn test_primitives_track_cut_side() {
        let mut k = MockKernel::new();
        let stock = k.make_box(10.0, 10.0, 10.0).unwrap();
        let hole = k.make_cylinder(1.0, 10.0, [0.0, 0.0, 1.0]).unwrap();
        let hole = k
            .transformed(&hole, &Transform::from_translation(5.0, 5.0, 0.0))
            .unwrap();
        let r = k.cut(&stock, &hole).unwrap();
        let leaves = k.primitives(&r);
        assert_eq!(leaves.len(), 2);
        assert!(!leaves[0].subtracted);
        assert!(leaves[1].subtracted);
        assert_eq!(leaves[1].placement.translation(), [5.0, 5.0, 0.0]);
    }

    #[test]
    fn test_strict_mesh_import() {
        let mut k = MockKernel::new().strict_meshes();
        assert!(k.import_mesh(Path::new("missing.stl")).is_err());
        k.register_mesh("known.stl", BoundingBox::new([0.0; 3], [1.0; 3]));
        assert!(k.import_mesh(Path::new("known.stl")).is_ok());
        assert_eq!(k.import_count(), 1);
    }

    #[test]
    fn test_invalid_dimensions_rejected() {
        let mut k = MockKernel::new();
        assert!(k.make_box(0.0, 1.0, 1.0).is_err());
        assert!(k.make_cylinder(1.0, -2.0, [0.0, 0.0, 1.0]).is_err());
        assert!(k.make_cylinder(1.0, 2.0, [0.0, 0.0, 0.0]).is_err());
    }
}
