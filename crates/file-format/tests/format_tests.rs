use composers::{
    doublepass_plate, ecdl_isolator_plate, isotope_separation, DoublepassConfig,
    EcdlIsolatorConfig, IsotopeSeparationConfig,
};
use file_format::{
    load_project, restore_baseplate, restore_project, save_project, ElementRecord, LoadError,
    ProjectMetadata, FORMAT_ID, FORMAT_VERSION,
};
use geom_kernel::MockKernel;
use layout_engine::{Baseplate, JournalEntry};
use optics_types::Transform;
use part_factory::params::BoxParams;
use part_factory::PartKind;
use serde_json::Value;

// ── Helper Functions ─────────────────────────────────────────────────────

fn doublepass(k: &mut MockKernel) -> Baseplate {
    doublepass_plate(&DoublepassConfig::default(), k).unwrap().0
}

fn saved_doublepass(k: &mut MockKernel) -> String {
    let bp = doublepass(k);
    save_project(&[&bp], &ProjectMetadata::new("Bench")).unwrap()
}

/// Rewrite a current file into the version 1 layout.
fn downgrade_to_v1(json: &str) -> String {
    let mut v: Value = serde_json::from_str(json).unwrap();
    v["version"] = Value::from(1);
    v["project"].as_object_mut().unwrap().remove("id");
    for plate in v["baseplates"].as_array_mut().unwrap() {
        let plate = plate.as_object_mut().unwrap();
        plate.remove("beams");
        let journal = plate.remove("journal").unwrap();
        plate.insert("placements".into(), journal);
    }
    serde_json::to_string(&v).unwrap()
}

// ── Save ─────────────────────────────────────────────────────────────────

#[test]
fn save_writes_format_and_version() {
    let mut k = MockKernel::new();
    let json = saved_doublepass(&mut k);
    let v: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(v["format"], FORMAT_ID);
    assert_eq!(v["version"], FORMAT_VERSION);
}

#[test]
fn save_includes_project_metadata() {
    let mut k = MockKernel::new();
    let bp = doublepass(&mut k);
    let meta = ProjectMetadata::new("Bench").with_description("397 nm double pass");
    let json = save_project(&[&bp], &meta).unwrap();
    let v: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(v["project"]["name"], "Bench");
    assert_eq!(v["project"]["description"], "397 nm double pass");
    assert!(v["project"]["created"].is_string());
}

#[test]
fn save_records_beams_journal_and_elements() {
    let mut k = MockKernel::new();
    let bp = doublepass(&mut k);
    let json = save_project(&[&bp], &ProjectMetadata::new("Bench")).unwrap();
    let v: Value = serde_json::from_str(&json).unwrap();
    let plate = &v["baseplates"][0];
    assert_eq!(plate["spec"]["label"], "Doublepass");
    assert_eq!(plate["beams"].as_array().unwrap().len(), 2);
    assert_eq!(plate["journal"].as_array().unwrap().len(), bp.journal().len());
    assert_eq!(plate["elements"].as_array().unwrap().len(), bp.len());
    assert_eq!(plate["journal"][0]["op"], "add_beam");
}

#[test]
fn save_empty_project() {
    let json = save_project(&[], &ProjectMetadata::new("Empty")).unwrap();
    let (records, meta) = load_project(&json).unwrap();
    assert!(records.is_empty());
    assert_eq!(meta.name, "Empty");
}

// ── Load ─────────────────────────────────────────────────────────────────

#[test]
fn load_round_trip_preserves_records() {
    let mut k = MockKernel::new();
    let bp = doublepass(&mut k);
    let meta = ProjectMetadata::new("Bench");
    let json = save_project(&[&bp], &meta).unwrap();
    let (records, loaded) = load_project(&json).unwrap();
    assert_eq!(loaded, meta);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].journal.len(), bp.journal().len());
    assert_eq!(records[0].spec.label, bp.spec().label);
    assert_eq!(records[0].spec.mount_holes, bp.spec().mount_holes);
}

#[test]
fn load_rejects_unknown_format() {
    let err = load_project(r#"{"format": "cad-project", "version": 1}"#).unwrap_err();
    assert!(matches!(err, LoadError::UnknownFormat(f) if f == "cad-project"));
}

#[test]
fn load_rejects_future_version() {
    let json = format!(r#"{{"format": "{FORMAT_ID}", "version": 99}}"#);
    let err = load_project(&json).unwrap_err();
    assert!(matches!(
        err,
        LoadError::FutureVersion {
            file_version: 99,
            supported_version: FORMAT_VERSION
        }
    ));
}

#[test]
fn load_rejects_invalid_json() {
    let err = load_project("not json {").unwrap_err();
    assert!(matches!(err, LoadError::ParseError(_)));
}

#[test]
fn load_rejects_missing_version() {
    let json = format!(r#"{{"format": "{FORMAT_ID}"}}"#);
    assert!(matches!(
        load_project(&json).unwrap_err(),
        LoadError::ParseError(_)
    ));
}

// ── Migration ────────────────────────────────────────────────────────────

#[test]
fn version_one_files_migrate() {
    let mut k = MockKernel::new();
    let bp = doublepass(&mut k);
    let current = save_project(&[&bp], &ProjectMetadata::new("Bench")).unwrap();
    let old = downgrade_to_v1(&current);

    let (records, meta) = load_project(&old).unwrap();
    assert_eq!(meta.name, "Bench");
    assert_eq!(records[0].journal.len(), bp.journal().len());
    assert_eq!(records[0].beams.len(), 2);
    assert_eq!(records[0].beams[1].name, "Beam Path 2");
    assert_eq!(records[0].beams[0].wavelength, None);
}

#[test]
fn migration_needs_placements() {
    let json = format!(
        r#"{{"format": "{FORMAT_ID}", "version": 1,
            "project": {{"name": "x", "created": "2024-01-01T00:00:00Z",
                         "modified": "2024-01-01T00:00:00Z"}},
            "baseplates": [{{"spec": {{}}}}]}}"#
    );
    let err = load_project(&json).unwrap_err();
    assert!(matches!(err, LoadError::MigrationFailed { from: 1, to: 2, .. }));
}

// ── Restore ──────────────────────────────────────────────────────────────

#[test]
fn restore_rebuilds_identical_transforms() {
    let mut k = MockKernel::new();
    let bp = doublepass(&mut k);
    let json = save_project(&[&bp], &ProjectMetadata::new("Bench")).unwrap();
    let (plates, _) = restore_project(&json, &mut k).unwrap();
    assert_eq!(plates.len(), 1);
    let restored = &plates[0];
    assert_eq!(restored.len(), bp.len());
    for (id, element) in bp.elements() {
        let again = restored.element_id(&element.name).unwrap();
        let a = bp.plate_transform(id).unwrap();
        let b = restored.plate_transform(again).unwrap();
        assert!(a.approx_eq(&b, 1e-9), "{}", element.name);
    }
}

#[test]
fn restore_several_plates() {
    let mut k = MockKernel::new();
    let a = doublepass(&mut k);
    let (b, _) = ecdl_isolator_plate(&EcdlIsolatorConfig::default(), &mut k).unwrap();
    let json = save_project(&[&a, &b], &ProjectMetadata::new("Two")).unwrap();
    let (plates, _) = restore_project(&json, &mut k).unwrap();
    let labels: Vec<_> = plates.iter().map(|p| p.label().to_string()).collect();
    assert_eq!(labels, ["Doublepass", "422nm"]);
}

#[test]
fn restore_migrated_file() {
    let mut k = MockKernel::new();
    let old = downgrade_to_v1(&saved_doublepass(&mut k));
    let (plates, meta) = restore_project(&old, &mut k).unwrap();
    assert_eq!(plates[0].beams().len(), 2);
    assert_eq!(meta.name, "Bench");
}

#[test]
fn restore_full_assembly() {
    let mut k = MockKernel::new();
    let (bp, report) = isotope_separation(&IsotopeSeparationConfig::default(), &mut k).unwrap();
    assert!(report.is_complete());
    let json = save_project(&[&bp], &ProjectMetadata::new("Isotopes")).unwrap();
    let (plates, _) = restore_project(&json, &mut k).unwrap();
    assert_eq!(plates[0].len(), bp.len());
    assert_eq!(plates[0].beams().len(), bp.beams().len());
}

#[test]
fn moved_element_is_detected() {
    let mut k = MockKernel::new();
    let (mut records, _) = load_project(&saved_doublepass(&mut k)).unwrap();
    records[0].elements[0].transform = Transform::from_translation(1000.0, 0.0, 0.0);
    let err = restore_baseplate(&records[0], &mut k).unwrap_err();
    assert!(matches!(err, LoadError::TransformMismatch { deviation, .. } if deviation > 1.0));
}

#[test]
fn missing_element_is_detected() {
    let mut k = MockKernel::new();
    let (mut records, _) = load_project(&saved_doublepass(&mut k)).unwrap();
    records[0].elements.push(ElementRecord {
        name: "Ghost".into(),
        transform: Transform::identity(),
    });
    let err = restore_baseplate(&records[0], &mut k).unwrap_err();
    assert!(matches!(err, LoadError::MissingElement { element, .. } if element == "Ghost"));
}

#[test]
fn broken_journal_fails_replay() {
    let mut k = MockKernel::new();
    let (mut records, _) = load_project(&saved_doublepass(&mut k)).unwrap();
    records[0].journal.insert(
        0,
        JournalEntry::PlaceRelative {
            name: "Orphan".into(),
            part: PartKind::CustomBox(BoxParams::new(5.0, 5.0, 5.0)).into(),
            base: "Nobody".into(),
            x_offset: 0.0,
            y_offset: 0.0,
            angle: 0.0,
        },
    );
    let err = restore_baseplate(&records[0], &mut k).unwrap_err();
    assert!(matches!(err, LoadError::ReplayFailed { label, .. } if label == "Doublepass"));
}

#[test]
fn dropped_beam_is_detected() {
    let mut k = MockKernel::new();
    let (mut records, _) = load_project(&saved_doublepass(&mut k)).unwrap();
    records[0].beams.pop();
    let err = restore_baseplate(&records[0], &mut k).unwrap_err();
    assert!(matches!(
        err,
        LoadError::BeamCountMismatch {
            expected: 1,
            found: 2,
            ..
        }
    ));
}

// ── Metadata ─────────────────────────────────────────────────────────────

#[test]
fn touch_never_precedes_creation() {
    let mut meta = ProjectMetadata::new("Bench");
    meta.touch();
    assert!(meta.modified >= meta.created);
    assert!(!meta.id.is_nil());
}
