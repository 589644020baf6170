//! Placement graph, beam router and baseplate aggregator.
//!
//! A [`Baseplate`] owns an arena of beams and placed elements. Elements are
//! placed directly, along a beam branch, relative to another element, or
//! as nested children; every pose is stored relative to its parent and
//! recomputed top-down when the plate moves.

pub mod baseplate;
pub mod beam;
pub mod combiner;
pub mod graph;
pub mod journal;
pub mod types;

pub use baseplate::{Baseplate, BaseplateSpec};
pub use beam::{BeamOrigin, BeamPath, BranchState, Cursor, Stop};
pub use combiner::{difference_frequency, CombinerOptions, MAX_COMBINED_BEAMS};
pub use graph::{Node, NodeId, PlacementGraph};
pub use journal::JournalEntry;
pub use types::{Anchor, BeamId, ElementId, LayoutError, PlacedElement};
