use geom_kernel::{KernelError, SolidHandle};
use optics_types::Transform;
use serde::{Deserialize, Serialize};

use crate::descriptor::PartDescriptor;

/// How a part acts on a beam it is placed along.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpticalRole {
    /// Not an optic; the beam is unaffected.
    Passive,
    /// The beam passes straight through.
    Transmit,
    /// The beam is folded about the element normal.
    Reflect,
    /// One input, a transmitted and a reflected output.
    Split {
        /// Normal of the reflecting diagonal relative to the element axis, in degrees.
        diagonal_deg: f64,
    },
    /// One input, an undiffracted and a diffracted output.
    Diffract {
        /// Deflection of the diffracted order, in degrees.
        angle_deg: f64,
        /// Sign of the deflection (+1 counter-clockwise, -1 clockwise).
        direction: f64,
    },
}

impl OpticalRole {
    /// Number of outputs the element opens on a beam.
    pub fn outputs(&self) -> usize {
        match self {
            OpticalRole::Split { .. } | OpticalRole::Diffract { .. } => 2,
            _ => 1,
        }
    }
}

/// A nested part the factory asks the caller to attach under the built one.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildAttachment {
    /// Local name; the aggregator qualifies it with the parent's name.
    pub name: String,
    pub part: PartDescriptor,
    /// Pose of the child in the parent's frame.
    pub offset: Transform,
}

/// Everything the factory produced for one part, in the part's local frame.
#[derive(Debug, Clone)]
pub struct BuiltPart {
    pub display: SolidHandle,
    /// Solid subtracted from the baseplate; `None` when drilling is disabled
    /// or the part has nothing to drill.
    pub drill: Option<SolidHandle>,
    pub children: Vec<ChildAttachment>,
    pub optics: OpticalRole,
}

/// Errors from primitives and the part factory.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FactoryError {
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("invalid dimension {name}: {value}")]
    InvalidDimension { name: &'static str, value: f64 },

    #[error("unknown part kind: {kind}")]
    UnknownPartKind { kind: String },

    #[error("{kind} requires parameter {name}")]
    MissingParameter { kind: String, name: String },

    #[error("invalid parameter for {kind}: {reason}")]
    InvalidParameter { kind: String, reason: String },
}
