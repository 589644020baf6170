use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::errors::LoadError;

/// Apply format migrations from `from_version` to `to_version`.
///
/// Migrations run on the raw JSON, one version step at a time.
pub fn migrate(mut file: Value, from_version: u32, to_version: u32) -> Result<Value, LoadError> {
    let mut version = from_version;
    while version < to_version {
        file = match version {
            1 => migrate_v1_to_v2(file)?,
            _ => {
                return Err(LoadError::MigrationFailed {
                    from: from_version,
                    to: to_version,
                    reason: format!("no migration path from v{version}"),
                })
            }
        };
        version += 1;
    }
    if let Some(obj) = file.as_object_mut() {
        obj.insert("version".into(), json!(to_version));
    }
    Ok(file)
}

fn failed(reason: impl Into<String>) -> LoadError {
    LoadError::MigrationFailed {
        from: 1,
        to: 2,
        reason: reason.into(),
    }
}

/// v1 kept the journal under `placements`, had no beam list and no
/// project id.
fn migrate_v1_to_v2(mut file: Value) -> Result<Value, LoadError> {
    let root = file.as_object_mut().ok_or_else(|| failed("file is not an object"))?;

    if let Some(project) = root.get_mut("project").and_then(Value::as_object_mut) {
        project
            .entry("id")
            .or_insert_with(|| json!(Uuid::new_v4()));
    }

    let plates = root
        .get_mut("baseplates")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| failed("missing baseplates"))?;
    for plate in plates {
        let plate = plate
            .as_object_mut()
            .ok_or_else(|| failed("baseplate is not an object"))?;
        let journal = plate
            .remove("placements")
            .ok_or_else(|| failed("baseplate has no placements"))?;
        let beams = beams_from_journal(&journal)?;
        plate.insert("journal".into(), journal);
        plate.insert("beams".into(), Value::Array(beams));
    }
    Ok(file)
}

fn beams_from_journal(journal: &Value) -> Result<Vec<Value>, LoadError> {
    let entries = journal
        .as_array()
        .ok_or_else(|| failed("placements is not a list"))?;
    let beams = entries
        .iter()
        .filter(|e| e.get("op").and_then(Value::as_str) == Some("add_beam"))
        .enumerate()
        .map(|(i, e)| {
            let mut beam = Map::new();
            beam.insert("name".into(), json!(format!("Beam Path {}", i + 1)));
            beam.insert("origin".into(), e.get("origin").cloned().unwrap_or(Value::Null));
            beam.insert(
                "wavelength".into(),
                e.get("wavelength").cloned().unwrap_or(Value::Null),
            );
            Value::Object(beam)
        })
        .collect();
    Ok(beams)
}
