use optics_types::{Angle, BranchIndex, Transform};
use part_factory::PartDescriptor;
use serde::{Deserialize, Serialize};

use crate::beam::{BeamOrigin, Stop};

/// One successful mutation of a baseplate, in a form that can be replayed.
///
/// Beams are referred to by creation order and elements by name, so a
/// journal is independent of the handles of the session that wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum JournalEntry {
    AddBeam {
        origin: BeamOrigin,
        wavelength: Option<f64>,
    },
    Place {
        name: String,
        part: PartDescriptor,
        x: f64,
        y: f64,
        angle: f64,
    },
    PlaceAlongBeam {
        name: String,
        part: PartDescriptor,
        beam: usize,
        branch: BranchIndex,
        stop: Stop,
        angle: Angle,
    },
    PlaceRelative {
        name: String,
        part: PartDescriptor,
        base: String,
        x_offset: f64,
        y_offset: f64,
        angle: f64,
    },
    AttachChild {
        name: String,
        part: PartDescriptor,
        parent: String,
        offset: Transform,
    },
    SetOrigin {
        x: f64,
        y: f64,
        angle: f64,
    },
}

impl JournalEntry {
    /// Name of the element this entry placed, if it placed one.
    pub fn element_name(&self) -> Option<&str> {
        match self {
            JournalEntry::Place { name, .. }
            | JournalEntry::PlaceAlongBeam { name, .. }
            | JournalEntry::PlaceRelative { name, .. }
            | JournalEntry::AttachChild { name, .. } => Some(name),
            JournalEntry::AddBeam { .. } | JournalEntry::SetOrigin { .. } => None,
        }
    }
}
