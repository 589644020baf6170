//! Property-based tests for routing determinism, branch lineage and
//! transform composition.

use std::collections::BTreeSet;

use geom_kernel::MockKernel;
use layout_engine::*;
use optics_types::{Angle, BranchIndex, BranchPort, Transform, Turn, INCH};
use part_factory::params::*;
use part_factory::{PartDescriptor, PartKind};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Op {
    Lens(f64),
    Mirror(f64, usize),
    Split(f64, bool),
    Aom(f64, bool),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1.0f64..80.0).prop_map(Op::Lens),
        (1.0f64..80.0, 0usize..8).prop_map(|(d, t)| Op::Mirror(d, t)),
        (1.0f64..80.0, any::<bool>()).prop_map(|(d, p)| Op::Split(d, p)),
        (1.0f64..80.0, any::<bool>()).prop_map(|(d, p)| Op::Aom(d, p)),
    ]
}

fn arb_offset() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (-50.0f64..50.0, -50.0f64..50.0, -5.0f64..5.0, -180.0f64..180.0)
}

fn plate() -> Baseplate {
    Baseplate::new(BaseplateSpec::new(12.0 * INCH, 12.0 * INCH, INCH)).unwrap()
}

fn port(deflected: bool) -> BranchPort {
    if deflected {
        BranchPort::Deflected
    } else {
        BranchPort::Through
    }
}

/// Run `ops` along one beam, always continuing on the chosen output.
fn route(ops: &[Op], start: (f64, f64, f64)) -> (Baseplate, BeamId) {
    let mut k = MockKernel::new();
    let mut bp = plate();
    let beam = bp.add_beam_path(start.0, start.1, start.2, Some(780.0)).unwrap();
    let mut branch = BranchIndex::ROOT;
    for (i, op) in ops.iter().enumerate() {
        let name = format!("E{i}");
        let (part, distance, angle, next): (PartDescriptor, f64, Angle, Option<bool>) = match *op {
            Op::Lens(d) => (
                PartKind::CircularLens(LensParams::new(50.0)).into(),
                d,
                Angle::Relative(0.0),
                None,
            ),
            Op::Mirror(d, t) => (
                PartKind::CircularMirror(MirrorParams::default()).into(),
                d,
                Angle::Turn(Turn::ALL[t]),
                None,
            ),
            Op::Split(d, p) => (
                PartKind::CubeSplitter(SplitterParams::default()).into(),
                d,
                Angle::Relative(0.0),
                Some(p),
            ),
            Op::Aom(d, p) => (
                PartKind::Aom(AomParams {
                    diffraction_angle: 2.0,
                    ..Default::default()
                })
                .into(),
                d,
                Angle::Relative(0.0),
                Some(p),
            ),
        };
        bp.place_element_along_beam(beam, &name, part, branch, distance, angle, &mut k)
            .unwrap();
        if let Some(p) = next {
            branch = branch.child(port(p)).unwrap();
        }
    }
    (bp, beam)
}

// ── Replay Determinism ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn routing_is_deterministic(
        ops in prop::collection::vec(arb_op(), 1..16),
        x in 0.0f64..100.0,
        y in 0.0f64..100.0,
        angle in 0.0f64..360.0,
    ) {
        let (a, _) = route(&ops, (x, y, angle));
        let (b, _) = route(&ops, (x, y, angle));
        prop_assert_eq!(a.len(), b.len());
        for (id, element) in a.elements() {
            let other = b.element_id(&element.name).unwrap();
            prop_assert_eq!(a.transform(id), b.transform(other), "{}", element.name);
        }
    }
}

// ── Branch Prefixes ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn branch_indices_form_a_prefix_tree(
        ops in prop::collection::vec(arb_op(), 1..16),
        foreign in 2u64..4096,
    ) {
        let (mut bp, beam) = route(&ops, (0.0, 0.0, 0.0));
        let path = bp.beam(beam).unwrap();
        let produced: BTreeSet<BranchIndex> = path.branches().collect();

        for &b in &produced {
            if let Some(parent) = b.parent() {
                prop_assert!(produced.contains(&parent));
                prop_assert!(path.branch(parent).unwrap().split);
                prop_assert!(parent.is_prefix_of(b));
            }
        }
        // open branches never share a lineage
        let open = path.open_branches();
        for &b1 in &open {
            for &b2 in &open {
                if b1 != b2 {
                    prop_assert!(!b1.is_prefix_of(b2));
                }
            }
        }

        let index = BranchIndex::from_bits(foreign);
        if !produced.contains(&index) {
            let mut k = MockKernel::new();
            let before = bp.len();
            let err = bp
                .place_element_along_beam(
                    beam,
                    "Foreign",
                    PartKind::CircularLens(LensParams::new(50.0)).into(),
                    index,
                    10.0,
                    Angle::Relative(0.0),
                    &mut k,
                )
                .unwrap_err();
            let is_invalid = matches!(err, LayoutError::InvalidBranchIndex { .. });
            prop_assert!(is_invalid);
            prop_assert_eq!(bp.len(), before);
        }
    }
}

// ── Composition Drift ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn attachment_chains_compose_exactly(
        offsets in prop::collection::vec(arb_offset(), 10..20),
        origin in arb_offset(),
    ) {
        let mut k = MockKernel::new();
        let mut bp = plate();
        let block: PartDescriptor = PartKind::CustomBox(BoxParams::new(2.0, 2.0, 2.0)).into();
        let mut parent = bp.place_element("Link 0", block.clone(), 10.0, 10.0, 0.0, &mut k).unwrap();
        let mut expected = bp.transform(parent).unwrap();
        for (i, &(x, y, z, deg)) in offsets.iter().enumerate() {
            let offset = Transform::from_translation(x, y, z).compose(&Transform::rotation_z_deg(deg));
            let child = bp
                .attach_child(parent, &format!("Link {}", i + 1), block.clone(), offset, &mut k)
                .unwrap();
            expected = expected.compose(&offset);
            prop_assert_eq!(
                bp.transform(child).unwrap(),
                bp.transform(parent).unwrap().compose(&bp.relative_transform(child).unwrap())
            );
            prop_assert!(bp.transform(child).unwrap().approx_eq(&expected, 1e-9));
            parent = child;
        }

        // moving the plate re-walks the chain
        bp.set_origin(origin.0, origin.1, origin.3);
        let moved = Transform::planar(origin.0, origin.1, 0.0, origin.3);
        for (id, _) in bp.elements() {
            let local = bp.plate_transform(id).unwrap();
            prop_assert!(bp.transform(id).unwrap().approx_eq(&moved.compose(&local), 1e-9));
            prop_assert_eq!(
                bp.transform(id).unwrap(),
                bp.parent_transform(id).unwrap().compose(&bp.relative_transform(id).unwrap())
            );
        }
    }
}
