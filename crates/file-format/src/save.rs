use layout_engine::{Baseplate, BaseplateSpec, BeamOrigin, JournalEntry};
use optics_types::Transform;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::SaveError;
use crate::metadata::ProjectMetadata;

/// Format identifier written into every file.
pub const FORMAT_ID: &str = "optics-layout";

/// Current file format version.
pub const FORMAT_VERSION: u32 = 2;

/// The top-level file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutFile {
    /// Format identifier.
    pub format: String,
    /// Format version number.
    pub version: u32,
    /// Project metadata.
    pub project: ProjectMetadata,
    pub baseplates: Vec<BaseplateRecord>,
}

/// One beam as it was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamRecord {
    pub name: String,
    pub origin: BeamOrigin,
    pub wavelength: Option<f64>,
}

/// An element and where it ended up, in plate coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub name: String,
    pub transform: Transform,
}

/// Everything needed to rebuild one baseplate and check the rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseplateRecord {
    pub spec: BaseplateSpec,
    pub beams: Vec<BeamRecord>,
    /// The recipe: every successful operation in order.
    pub journal: Vec<JournalEntry>,
    /// Resolved transforms at save time, for verification only.
    pub elements: Vec<ElementRecord>,
}

impl BaseplateRecord {
    pub fn from_baseplate(bp: &Baseplate) -> Result<Self, SaveError> {
        let beams = bp
            .beams()
            .into_iter()
            .filter_map(|id| bp.beam(id))
            .map(|beam| BeamRecord {
                name: beam.name().to_string(),
                origin: *beam.origin(),
                wavelength: beam.wavelength(),
            })
            .collect();

        let mut elements = Vec::new();
        for (id, element) in bp.elements() {
            let Some(transform) = bp.plate_transform(id) else {
                continue;
            };
            let finite = transform.translation().iter().all(|v| v.is_finite())
                && transform.heading_deg().is_finite();
            if !finite {
                return Err(SaveError::NonFiniteTransform {
                    element: element.name.clone(),
                });
            }
            elements.push(ElementRecord {
                name: element.name.clone(),
                transform,
            });
        }

        Ok(Self {
            spec: bp.spec().clone(),
            beams,
            journal: bp.journal().to_vec(),
            elements,
        })
    }
}

/// Serialize baseplates to a pretty-printed JSON string.
pub fn save_project(plates: &[&Baseplate], metadata: &ProjectMetadata) -> Result<String, SaveError> {
    let baseplates = plates
        .iter()
        .map(|bp| BaseplateRecord::from_baseplate(bp))
        .collect::<Result<Vec<_>, _>>()?;
    let file = LayoutFile {
        format: FORMAT_ID.to_string(),
        version: FORMAT_VERSION,
        project: metadata.clone(),
        baseplates,
    };
    let json =
        serde_json::to_string_pretty(&file).map_err(|e| SaveError::Serialize(e.to_string()))?;
    info!(
        project = %metadata.name,
        baseplates = plates.len(),
        bytes = json.len(),
        "project saved"
    );
    Ok(json)
}
