use approx::assert_abs_diff_eq;
use geom_kernel::{KernelIntrospect, MockKernel, MockPrimitive};
use optics_types::{DEFAULT_OPTICS_DZ, INCH};
use part_factory::params::*;
use part_factory::{
    Factory, FactoryConfig, FactoryError, OpticalRole, Params, PartDescriptor, PartKind,
};
use serde_json::json;

fn params(value: serde_json::Value) -> Params {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

fn factory() -> Factory {
    Factory::new(FactoryConfig::default())
}

/// Minimal parameters that satisfy each kind's required list.
fn minimal_params(kind: &str) -> Params {
    match kind {
        "circular_lens" => params(json!({ "focal_length": 50.0 })),
        "cylindrical_lens" => params(json!({ "thickness": 3.0, "width": 10.0, "height": 10.0 })),
        "ecdl" => params(json!({ "littrow_angle": 30.0 })),
        "box" => params(json!({ "dx": 10.0, "dy": 20.0, "dz": 5.0 })),
        _ => Params::new(),
    }
}

// ── Descriptor Parsing ─────────────────────────────────────────────────────

#[test]
fn unknown_kind_is_rejected() {
    let err = PartDescriptor::from_params("flux_capacitor", &Params::new()).unwrap_err();
    assert!(matches!(err, FactoryError::UnknownPartKind { kind } if kind == "flux_capacitor"));
}

#[test]
fn missing_required_parameter() {
    let err = PartDescriptor::from_params("circular_lens", &Params::new()).unwrap_err();
    match err {
        FactoryError::MissingParameter { kind, name } => {
            assert_eq!(kind, "circular_lens");
            assert_eq!(name, "focal_length");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_field_is_invalid() {
    let err = PartDescriptor::from_params("pinhole_ida12", &params(json!({ "focal_length": 3 })))
        .unwrap_err();
    assert!(matches!(err, FactoryError::InvalidParameter { .. }));
}

#[test]
fn drill_flag_must_be_bool() {
    let err =
        PartDescriptor::from_params("skate_mount", &params(json!({ "drill": "yes" }))).unwrap_err();
    assert!(matches!(err, FactoryError::InvalidParameter { .. }));
}

#[test]
fn every_kind_parses_with_minimal_params() {
    for kind in PartKind::KINDS {
        let d = PartDescriptor::from_params(kind, &minimal_params(kind))
            .unwrap_or_else(|e| panic!("{kind}: {e}"));
        assert_eq!(d.kind.name(), kind);
        assert!(d.drill);
    }
}

#[test]
fn mount_type_replaces_default_mount() {
    let d = PartDescriptor::from_params(
        "circular_mirror",
        &params(json!({
            "mount_type": "mirror_mount_k05s1",
            "mount_args": { "thumbscrews": true }
        })),
    )
    .unwrap();
    match d.kind {
        PartKind::CircularMirror(p) => assert_eq!(
            p.mount.as_deref(),
            Some(&PartKind::MirrorMountK05s1(MirrorMountParams {
                thumbscrews: true,
                ..Default::default()
            }))
        ),
        other => panic!("unexpected kind {other:?}"),
    }
}

#[test]
fn null_mount_type_removes_mount() {
    let d = PartDescriptor::from_params("circular_mirror", &params(json!({ "mount_type": null })))
        .unwrap();
    assert!(matches!(d.kind, PartKind::CircularMirror(MirrorParams { mount: None, .. })));
}

#[test]
fn mount_args_without_type_is_invalid() {
    let err = PartDescriptor::from_params(
        "circular_mirror",
        &params(json!({ "mount_args": { "thumbscrews": true } })),
    )
    .unwrap_err();
    assert!(matches!(err, FactoryError::InvalidParameter { .. }));
}

#[test]
fn descriptor_json_is_stable() {
    let d = PartDescriptor::new(PartKind::CircularLens(LensParams::new(100.0)));
    let text = serde_json::to_string(&d).unwrap();
    assert!(text.contains("\"kind\":\"circular_lens\""));
    let back: PartDescriptor = serde_json::from_str(&text).unwrap();
    assert_eq!(back, d);
}

// ── Building ───────────────────────────────────────────────────────────────

#[test]
fn every_kind_builds_with_defaults() {
    let mut kernel = MockKernel::new();
    let mut f = factory();
    for kind in PartKind::KINDS {
        let d = PartDescriptor::from_params(kind, &minimal_params(kind)).unwrap();
        let built = f
            .build(&mut kernel, &d)
            .unwrap_or_else(|e| panic!("{kind}: {e}"));
        assert!(kernel.bounding_box(&built.display).is_some(), "{kind}");
    }
}

#[test]
fn skate_mount_drills_8_32_bolt_from_below() {
    let mut kernel = MockKernel::new();
    let mut f = factory();
    let built = f
        .build(&mut kernel, &PartKind::SkateMount(SkateMountParams::default()).into())
        .unwrap();
    let drill = built.drill.expect("skate mount drills the plate");
    let leaves = kernel.primitives(&drill);

    let bore = leaves
        .iter()
        .find(|l| matches!(l.primitive, MockPrimitive::Cylinder { radius, .. } if radius == 2.1))
        .expect("8-32 clearance bore");
    match bore.primitive {
        MockPrimitive::Cylinder { height, axis, .. } => {
            assert_abs_diff_eq!(height, INCH, epsilon = 1e-9);
            assert_eq!(axis, [0.0, 0.0, 1.0]);
        }
        _ => unreachable!(),
    }
    let [x, y, z] = bore.placement.translation();
    assert_abs_diff_eq!(x, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(y, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(z, -DEFAULT_OPTICS_DZ - INCH, epsilon = 1e-9);

    assert!(leaves.iter().any(|l| matches!(
        l.primitive,
        MockPrimitive::Cylinder { radius, height, .. } if radius == 4.0 && height == 3.0
    )));
}

#[test]
fn drill_false_suppresses_drill() {
    let mut kernel = MockKernel::new();
    let mut f = factory();
    let d = PartDescriptor::from_params("skate_mount", &params(json!({ "drill": false }))).unwrap();
    let built = f.build(&mut kernel, &d).unwrap();
    assert!(built.drill.is_none());
}

#[test]
fn mirror_reports_mount_child_behind_face() {
    let mut kernel = MockKernel::new();
    let mut f = factory();
    let built = f
        .build(&mut kernel, &PartKind::CircularMirror(MirrorParams::default()).into())
        .unwrap();
    assert!(built.drill.is_none());
    assert_eq!(built.optics, OpticalRole::Reflect);
    assert_eq!(built.children.len(), 1);
    let child = &built.children[0];
    assert_eq!(child.name, "mount");
    assert!(matches!(child.part.kind, PartKind::MirrorMountKm05(_)));
    assert_eq!(child.offset.translation(), [-6.0, 0.0, 0.0]);
}

#[test]
fn fixtures_sit_on_surface_adapters() {
    let mut kernel = MockKernel::new();
    let mut f = factory();
    for kind in [
        PartKind::IonTrap(IonTrapParams::default()),
        PartKind::PmtArray(PmtArrayParams::default()),
        PartKind::FpgaBoard(FpgaBoardParams::default()),
        PartKind::MassSelectiveAxialEjectionCavity(CavityParams::default()),
    ] {
        let adapter_height = match &kind {
            PartKind::IonTrap(p) => p.adapter.adapter_height,
            PartKind::PmtArray(p) => p.adapter.adapter_height,
            PartKind::FpgaBoard(p) => p.adapter.adapter_height,
            PartKind::MassSelectiveAxialEjectionCavity(p) => p.adapter.adapter_height,
            _ => unreachable!(),
        };
        let built = f.build(&mut kernel, &kind.clone().into()).unwrap();
        assert_eq!(built.children.len(), 1);
        assert_eq!(built.children[0].name, "Surface Adapter");
        assert!(matches!(built.children[0].part.kind, PartKind::SurfaceAdapter(_)));
        let bb = kernel.bounding_box(&built.display).unwrap();
        assert_abs_diff_eq!(bb.min[2], -DEFAULT_OPTICS_DZ + adapter_height, epsilon = 1e-9);
    }
}

#[test]
fn optical_roles_follow_kind() {
    let splitter = PartKind::CubeSplitter(SplitterParams::default()).optical_role();
    assert_eq!(splitter, OpticalRole::Split { diagonal_deg: -45.0 });
    let inverted = PartKind::CubeSplitter(SplitterParams {
        invert: true,
        ..Default::default()
    })
    .optical_role();
    assert_eq!(inverted, OpticalRole::Split { diagonal_deg: 45.0 });
    assert_eq!(inverted.outputs(), 2);

    let aom = PartKind::Aom(AomParams::default()).optical_role();
    assert!(matches!(aom, OpticalRole::Diffract { direction, .. } if direction == 1.0));
    assert_eq!(
        PartKind::CircularLens(LensParams::new(50.0)).optical_role(),
        OpticalRole::Transmit
    );
    assert_eq!(
        PartKind::SurfaceAdapter(SurfaceAdapterParams::default()).optical_role(),
        OpticalRole::Passive
    );
}

#[test]
fn meshes_are_imported_once_per_factory() {
    let mut kernel = MockKernel::new();
    let mut f = factory();
    f.build(&mut kernel, &PartKind::Aom(AomParams::default()).into())
        .unwrap();
    f.build(&mut kernel, &PartKind::Aom(AomParams::default()).into())
        .unwrap();
    f.build(
        &mut kernel,
        &PartKind::Isomet1205cOnKm100pm(IsometParams::default()).into(),
    )
    .unwrap();
    assert_eq!(kernel.import_count(), 1);
    assert!(f.mesh_cache().contains("isomet_1205c.stl"));
}

#[test]
fn missing_mesh_propagates_kernel_error() {
    let mut kernel = MockKernel::new().strict_meshes();
    let mut f = factory();
    let err = f
        .build(&mut kernel, &PartKind::StepperMotor(StepperMotorParams::default()).into())
        .unwrap_err();
    assert!(matches!(err, FactoryError::Kernel(_)));
}

#[test]
fn ecdl_rejects_out_of_range_littrow() {
    let mut kernel = MockKernel::new();
    let mut f = factory();
    let err = f
        .build(&mut kernel, &PartKind::Ecdl(EcdlParams::new(95.0)).into())
        .unwrap_err();
    assert!(matches!(err, FactoryError::InvalidParameter { kind, .. } if kind == "ecdl"));
}

#[test]
fn periscope_needs_rising_levels() {
    let mut kernel = MockKernel::new();
    let mut f = factory();
    let err = f
        .build(
            &mut kernel,
            &PartKind::Periscope(PeriscopeParams {
                lower_dz: 50.0,
                upper_dz: 20.0,
                invert: false,
            })
            .into(),
        )
        .unwrap_err();
    assert!(matches!(err, FactoryError::InvalidParameter { .. }));
}

#[test]
fn zero_sized_box_is_invalid_dimension() {
    let mut kernel = MockKernel::new();
    let mut f = factory();
    let err = f
        .build(&mut kernel, &PartKind::CustomBox(BoxParams::new(0.0, 1.0, 1.0)).into())
        .unwrap_err();
    assert!(matches!(err, FactoryError::InvalidDimension { name: "dx", .. }));
}

#[test]
fn custom_box_never_drills() {
    let mut kernel = MockKernel::new();
    let mut f = factory();
    let built = f
        .build(&mut kernel, &PartKind::CustomBox(BoxParams::new(10.0, 10.0, 10.0)).into())
        .unwrap();
    assert!(built.drill.is_none());
    assert!(built.children.is_empty());
}
