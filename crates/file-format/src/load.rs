use layout_engine::Baseplate;
use part_factory::KernelBundle;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::LoadError;
use crate::metadata::ProjectMetadata;
use crate::migrate::migrate;
use crate::save::{BaseplateRecord, LayoutFile, FORMAT_ID, FORMAT_VERSION};

/// Largest drift between a stored and a replayed transform.
pub const TRANSFORM_TOLERANCE: f64 = 1e-9;

/// Deserialize a project from a JSON string.
///
/// Validates the format identifier and version and migrates older files.
/// Returns the baseplate records and project metadata without building
/// anything.
pub fn load_project(json: &str) -> Result<(Vec<BaseplateRecord>, ProjectMetadata), LoadError> {
    let raw: Value = serde_json::from_str(json).map_err(|e| LoadError::ParseError(e.to_string()))?;

    let format = raw.get("format").and_then(Value::as_str).unwrap_or_default();
    if format != FORMAT_ID {
        return Err(LoadError::UnknownFormat(format.to_string()));
    }

    let version = raw
        .get("version")
        .and_then(Value::as_u64)
        .ok_or_else(|| LoadError::ParseError("missing version".into()))?;
    let version = u32::try_from(version).map_err(|e| LoadError::ParseError(e.to_string()))?;
    if version > FORMAT_VERSION {
        return Err(LoadError::FutureVersion {
            file_version: version,
            supported_version: FORMAT_VERSION,
        });
    }

    let raw = if version < FORMAT_VERSION {
        debug!(from = version, to = FORMAT_VERSION, "migrating layout file");
        migrate(raw, version, FORMAT_VERSION)?
    } else {
        raw
    };

    let file: LayoutFile =
        serde_json::from_value(raw).map_err(|e| LoadError::ParseError(e.to_string()))?;
    Ok((file.baseplates, file.project))
}

/// Load a project and rebuild every baseplate by replay.
pub fn restore_project(
    json: &str,
    kb: &mut dyn KernelBundle,
) -> Result<(Vec<Baseplate>, ProjectMetadata), LoadError> {
    let (records, project) = load_project(json)?;
    let plates = records
        .iter()
        .map(|record| restore_baseplate(record, kb))
        .collect::<Result<Vec<_>, _>>()?;
    info!(project = %project.name, baseplates = plates.len(), "project restored");
    Ok((plates, project))
}

/// Replay one record and check the result against its stored transforms.
pub fn restore_baseplate(
    record: &BaseplateRecord,
    kb: &mut dyn KernelBundle,
) -> Result<Baseplate, LoadError> {
    let label = record.spec.label.clone();
    let bp = Baseplate::replay(record.spec.clone(), &record.journal, kb).map_err(|source| {
        LoadError::ReplayFailed {
            label: label.clone(),
            source,
        }
    })?;

    let found = bp.beams().len();
    if found != record.beams.len() {
        return Err(LoadError::BeamCountMismatch {
            label,
            expected: record.beams.len(),
            found,
        });
    }

    for stored in &record.elements {
        let replayed = bp
            .element_id(&stored.name)
            .and_then(|id| bp.plate_transform(id))
            .ok_or_else(|| LoadError::MissingElement {
                label: label.clone(),
                element: stored.name.clone(),
            })?;
        if !replayed.approx_eq(&stored.transform, TRANSFORM_TOLERANCE) {
            let [ax, ay, az] = replayed.translation();
            let [bx, by, bz] = stored.transform.translation();
            let deviation = ((ax - bx).powi(2) + (ay - by).powi(2) + (az - bz).powi(2)).sqrt();
            return Err(LoadError::TransformMismatch {
                element: stored.name.clone(),
                deviation,
            });
        }
    }
    debug!(label = %label, elements = record.elements.len(), "baseplate verified");
    Ok(bp)
}
