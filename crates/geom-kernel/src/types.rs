use std::path::PathBuf;

use optics_types::Transform;
use serde::{Deserialize, Serialize};

/// Opaque handle to a solid in the geometry kernel.
/// NEVER persisted. Valid only for the current kernel session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SolidHandle(pub(crate) u64);

impl SolidHandle {
    /// Wrap a kernel-issued identifier. Only kernel implementations call this.
    pub fn from_raw(raw: u64) -> Self {
        SolidHandle(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Transient kernel-internal entity identifier (edges).
/// Stable within a single kernel session but NOT across rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelId(pub u64);

/// A straight edge of a solid, used for fillet selection.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeInfo {
    pub id: KernelId,
    pub start: [f64; 3],
    pub end: [f64; 3],
}

impl EdgeInfo {
    pub fn length(&self) -> f64 {
        let d = [
            self.end[0] - self.start[0],
            self.end[1] - self.start[1],
            self.end[2] - self.start[2],
        ];
        (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
    }

    /// Unit tangent from start to end, or zero for a degenerate edge.
    pub fn tangent(&self) -> [f64; 3] {
        let len = self.length();
        if len < 1e-12 {
            return [0.0; 3];
        }
        [
            (self.end[0] - self.start[0]) / len,
            (self.end[1] - self.start[1]) / len,
            (self.end[2] - self.start[2]) / len,
        ]
    }

    /// True when the edge runs along `dir` in either sense.
    pub fn is_parallel_to(&self, dir: [f64; 3]) -> bool {
        let t = self.tangent();
        let n = (dir[0] * dir[0] + dir[1] * dir[1] + dir[2] * dir[2]).sqrt();
        if n < 1e-12 {
            return false;
        }
        let dot = (t[0] * dir[0] + t[1] * dir[1] + t[2] * dir[2]) / n;
        (dot.abs() - 1.0).abs() < 1e-9
    }
}

/// Axis-aligned bounds of a solid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    pub fn size(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        ]
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: [
                self.min[0].min(other.min[0]),
                self.min[1].min(other.min[1]),
                self.min[2].min(other.min[2]),
            ],
            max: [
                self.max[0].max(other.max[0]),
                self.max[1].max(other.max[1]),
                self.max[2].max(other.max[2]),
            ],
        }
    }

    /// Bounds of the eight corners after moving them by `placement`.
    pub fn transformed(&self, placement: &Transform) -> BoundingBox {
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        for i in 0..8 {
            let corner = [
                if i & 1 == 0 { self.min[0] } else { self.max[0] },
                if i & 2 == 0 { self.min[1] } else { self.max[1] },
                if i & 4 == 0 { self.min[2] } else { self.max[2] },
            ];
            let p = placement.transform_point(corner);
            for k in 0..3 {
                min[k] = min[k].min(p[k]);
                max[k] = max[k].max(p[k]);
            }
        }
        BoundingBox { min, max }
    }

    pub fn contains_point(&self, p: [f64; 3], tol: f64) -> bool {
        (0..3).all(|k| p[k] >= self.min[k] - tol && p[k] <= self.max[k] + tol)
    }
}

/// Errors from kernel operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KernelError {
    #[error("boolean operation failed: {reason}")]
    BooleanFailed { reason: String },

    #[error("fillet failed: {reason}")]
    FilletFailed { reason: String },

    #[error("mesh import failed for {path:?}: {reason}")]
    MeshImportFailed { path: PathBuf, reason: String },

    #[error("solid not found: {id}")]
    EntityNotFound { id: u64 },

    #[error("invalid geometry: {reason}")]
    InvalidGeometry { reason: String },
}
