pub mod mesh_cache;
pub mod mock_kernel;
pub mod traits;
pub mod types;

pub use mesh_cache::{MeshCache, MeshPlacement};
pub use mock_kernel::{CsgTree, MockKernel, MockPrimitive, MockStats, PlacedPrimitive};
pub use traits::*;
pub use types::*;
