use std::collections::HashMap;
use std::path::PathBuf;

use optics_types::Transform;
use serde::{Deserialize, Serialize};

use crate::traits::Kernel;
use crate::types::{KernelError, SolidHandle};

/// Scale, rotation and offset applied to an imported mesh, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshPlacement {
    pub scale: f64,
    /// Euler angles in degrees, applied as `Rz * Ry * Rx`.
    pub rotation_deg: [f64; 3],
    pub translation: [f64; 3],
}

impl Default for MeshPlacement {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation_deg: [0.0; 3],
            translation: [0.0; 3],
        }
    }
}

impl MeshPlacement {
    pub fn transform(&self) -> Transform {
        let [rx, ry, rz] = self.rotation_deg;
        Transform::from_euler_deg(self.translation, rx, ry, rz)
    }
}

/// Imported meshes keyed by file name.
///
/// Each file is read from disk once. The cached solid is the raw import;
/// every lookup applies its own placement to a fresh copy, so two callers
/// asking for the same file with different placements both get what they
/// asked for.
#[derive(Debug, Clone)]
pub struct MeshCache {
    root: PathBuf,
    meshes: HashMap<String, SolidHandle>,
}

impl MeshCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            meshes: HashMap::new(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Import `file` (relative to the cache root) and place it.
    pub fn get(
        &mut self,
        kernel: &mut dyn Kernel,
        file: &str,
        placement: &MeshPlacement,
    ) -> Result<SolidHandle, KernelError> {
        let raw = match self.meshes.get(file) {
            Some(h) => {
                tracing::trace!(file, "mesh cache hit");
                h.clone()
            }
            None => {
                let path = self.root.join(file);
                tracing::debug!(path = %path.display(), "importing mesh");
                let h = kernel.import_mesh(&path)?;
                self.meshes.insert(file.to_string(), h.clone());
                h
            }
        };
        let scaled = if (placement.scale - 1.0).abs() > f64::EPSILON {
            kernel.scaled(&raw, placement.scale)?
        } else {
            raw
        };
        kernel.transformed(&scaled, &placement.transform())
    }

    pub fn contains(&self, file: &str) -> bool {
        self.meshes.contains_key(file)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_kernel::MockKernel;
    use crate::traits::KernelIntrospect;
    use crate::types::BoundingBox;
    use approx::assert_abs_diff_eq;

    #[test]
    fn second_lookup_does_not_reimport() {
        let mut k = MockKernel::new();
        let mut cache = MeshCache::new("stl");
        cache.get(&mut k, "mount.stl", &MeshPlacement::default()).unwrap();
        cache.get(&mut k, "mount.stl", &MeshPlacement::default()).unwrap();
        assert_eq!(k.import_count(), 1);
        assert!(cache.contains("mount.stl"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn placement_is_per_call() {
        let mut k = MockKernel::new().strict_meshes();
        k.register_mesh("stl/part.stl", BoundingBox::new([0.0; 3], [1.0; 3]));
        let mut cache = MeshCache::new("stl");
        let first = MeshPlacement {
            translation: [10.0, 0.0, 0.0],
            ..Default::default()
        };
        let second = MeshPlacement {
            scale: 2.0,
            translation: [0.0, 20.0, 0.0],
            ..Default::default()
        };
        let a = cache.get(&mut k, "part.stl", &first).unwrap();
        let b = cache.get(&mut k, "part.stl", &second).unwrap();
        let ba = k.bounding_box(&a).unwrap();
        let bb = k.bounding_box(&b).unwrap();
        assert_abs_diff_eq!(ba.min[0], 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bb.min[1], 20.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bb.size()[0], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn failed_import_is_not_cached() {
        let mut k = MockKernel::new().strict_meshes();
        let mut cache = MeshCache::new("stl");
        assert!(cache.get(&mut k, "nope.stl", &MeshPlacement::default()).is_err());
        assert!(cache.is_empty());
    }
}
