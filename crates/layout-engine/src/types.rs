use geom_kernel::{KernelError, SolidHandle};
use optics_types::BranchIndex;
use part_factory::{FactoryError, OpticalRole, PartDescriptor};
use uuid::Uuid;

use crate::graph::NodeId;

/// Handle to an element placed on a specific baseplate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId {
    pub(crate) plate: Uuid,
    pub(crate) node: NodeId,
}

/// Handle to a beam path on a specific baseplate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BeamId {
    pub(crate) plate: Uuid,
    pub(crate) node: NodeId,
}

/// How an element was anchored when it was placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Directly on the plate at a plate-frame pose.
    Plate,
    /// Along a beam; a sibling of every other element on that beam.
    Beam { beam: BeamId, branch: BranchIndex },
    /// At a fixed offset from another element.
    Relative { base: ElementId },
    /// A nested part reported by the factory for `parent`.
    Child { parent: ElementId },
}

/// A part placed on a baseplate, with its geometry in the part's local frame.
#[derive(Debug, Clone)]
pub struct PlacedElement {
    pub name: String,
    pub part: PartDescriptor,
    pub anchor: Anchor,
    pub display: SolidHandle,
    pub drill: Option<SolidHandle>,
    pub optics: OpticalRole,
}

/// Errors from the placement graph, the beam router and the aggregator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LayoutError {
    #[error("parent is not registered on this baseplate")]
    UnattachedParent,

    #[error("beam {beam} never produced branch {index}")]
    InvalidBranchIndex { beam: String, index: BranchIndex },

    #[error("branch {index} of beam {beam} was split; place along one of its outputs")]
    BranchSplit { beam: String, index: BranchIndex },

    #[error("branch {index} cannot be split any further")]
    BranchOverflow { index: BranchIndex },

    #[error("cannot place {name}: {reason}")]
    UnreachableStop { name: String, reason: String },

    #[error("beam combiner takes 1 to 6 beams, got {count}")]
    InvalidBeamCount { count: usize },

    #[error("element name already in use: {name}")]
    DuplicateElementName { name: String },

    #[error("no element named {name}")]
    UnknownElement { name: String },

    #[error("beam not found: {beam}")]
    UnknownBeam { beam: String },

    #[error("invalid dimension {name}: {value}")]
    InvalidDimension { name: &'static str, value: f64 },

    #[error("part factory error: {0}")]
    Factory(#[from] FactoryError),

    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),
}
