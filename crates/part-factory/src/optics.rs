//! Elements placed along a beam.
//!
//! Local frame: the beam travels along +x through the origin.

use geom_kernel::MeshPlacement;
use optics_types::{Bolt, Transform, DRILL_DEPTH, INCH};

use crate::descriptor::*;
use crate::factory::{BuildCtx, Geometry};
use crate::fixtures::km_pattern_drill;
use crate::primitives::{self, Align, BoxSpec, CylinderSpec, X_AXIS, Z_UP};
use crate::types::FactoryError;

fn with_mount(g: Geometry, mount: &Option<Box<PartKind>>, offset: Transform) -> Geometry {
    match mount {
        Some(kind) => g.with_child("mount", (**kind).clone(), offset),
        None => g,
    }
}

/// Height of a post from the plate top up to `z`, never less than 1 mm.
fn post_height(ctx: &BuildCtx<'_>, z: f64) -> f64 {
    (z - ctx.plate_top()).max(1.0)
}

pub(crate) fn circular_mirror(
    ctx: &mut BuildCtx<'_>,
    p: &MirrorParams,
) -> Result<Geometry, FactoryError> {
    // reflective face on the origin, substrate behind it
    let glass = ctx.cylinder(CylinderSpec::new(p.diameter, p.thickness).axis([-1.0, 0.0, 0.0]))?;
    let g = Geometry::new(glass, None);
    Ok(with_mount(
        g,
        &p.mount,
        Transform::from_translation(-p.thickness, 0.0, 0.0),
    ))
}

pub(crate) fn circular_lens(
    ctx: &mut BuildCtx<'_>,
    p: &LensParams,
) -> Result<Geometry, FactoryError> {
    if !(p.focal_length.is_finite() && p.focal_length != 0.0) {
        return Err(FactoryError::InvalidDimension {
            name: "focal_length",
            value: p.focal_length,
        });
    }
    let glass = ctx.cylinder(
        CylinderSpec::new(p.diameter, p.thickness)
            .at(-p.thickness / 2.0, 0.0, 0.0)
            .axis(X_AXIS),
    )?;
    Ok(with_mount(
        Geometry::new(glass, None),
        &p.mount,
        Transform::identity(),
    ))
}

pub(crate) fn cylindrical_lens(
    ctx: &mut BuildCtx<'_>,
    p: &CylindricalLensParams,
) -> Result<Geometry, FactoryError> {
    let glass = ctx.boxed(
        BoxSpec::new(p.thickness, p.width, p.height).align(Align::Center, Align::Center, Align::Center),
    )?;
    let holder_dz = post_height(ctx, -p.height / 2.0);
    let holder = ctx.boxed(
        BoxSpec::new(p.thickness + 4.0, p.width + 4.0, holder_dz)
            .at(0.0, 0.0, ctx.plate_top())
            .centered_xy(Align::Positive),
    )?;
    let display = ctx.fuse(vec![glass, holder])?;

    let bolt = Bolt::Bolt8_32.spec();
    let top = ctx.plate_top();
    let mut holes = Vec::new();
    for side in [-1.0, 1.0] {
        let y = side * (p.width / 2.0 + 4.0);
        let hole = if p.slots {
            ctx.boxed(
                BoxSpec::new(6.0, bolt.tap_dia, DRILL_DEPTH)
                    .at(0.0, y, top)
                    .centered_xy(Align::Negative),
            )?
        } else {
            primitives::tap_hole(ctx.kb, &bolt, 0.0, y, top, DRILL_DEPTH)?
        };
        holes.push(hole);
    }
    let drill = ctx.fuse(holes)?;
    Ok(Geometry::new(display, Some(drill)))
}

pub(crate) fn waveplate(
    ctx: &mut BuildCtx<'_>,
    p: &WaveplateParams,
) -> Result<Geometry, FactoryError> {
    let plate = ctx.cylinder(
        CylinderSpec::new(p.diameter, p.thickness)
            .at(-p.thickness / 2.0, 0.0, 0.0)
            .axis(X_AXIS),
    )?;
    Ok(with_mount(
        Geometry::new(plate, None),
        &p.mount,
        Transform::identity(),
    ))
}

pub(crate) fn cube_splitter(
    ctx: &mut BuildCtx<'_>,
    p: &SplitterParams,
) -> Result<Geometry, FactoryError> {
    let cube = ctx.boxed(
        BoxSpec::new(p.cube_size, p.cube_size, p.cube_size)
            .align(Align::Center, Align::Center, Align::Center),
    )?;
    Ok(with_mount(
        Geometry::new(cube, None),
        &p.mount,
        Transform::identity(),
    ))
}

pub(crate) fn pinhole_ida12(
    ctx: &mut BuildCtx<'_>,
    p: &PinholeParams,
) -> Result<Geometry, FactoryError> {
    let body_top = p.aperture + 1.0;
    let body = ctx.boxed(
        BoxSpec::new(2.5, p.aperture * 2.0, body_top - ctx.plate_top())
            .at(0.0, 0.0, ctx.plate_top())
            .centered_xy(Align::Positive),
    )?;
    let aperture = ctx.cylinder(
        CylinderSpec::new(p.aperture, 2.5)
            .at(-1.25, 0.0, 0.0)
            .axis(X_AXIS),
    )?;
    let display = ctx.cut(body, vec![aperture])?;
    let bolt = p.mount_bolt.spec();
    let top = ctx.plate_top();
    let drill = primitives::tap_hole(ctx.kb, &bolt, 0.0, 0.0, top, DRILL_DEPTH)?;
    Ok(Geometry::new(display, Some(drill)))
}

pub(crate) fn isolator_405(
    ctx: &mut BuildCtx<'_>,
    p: &IsolatorParams,
) -> Result<Geometry, FactoryError> {
    let body = ctx.cylinder(
        CylinderSpec::new(p.diameter, p.length)
            .at(-p.length / 2.0, 0.0, 0.0)
            .axis(X_AXIS),
    )?;
    Ok(Geometry::new(body, None).with_child(
        "Surface Adapter",
        PartKind::SurfaceAdapter(p.adapter),
        Transform::identity(),
    ))
}

pub(crate) fn isomet_1205c(
    ctx: &mut BuildCtx<'_>,
    _p: &IsometParams,
) -> Result<Geometry, FactoryError> {
    let crystal = ctx.mesh(
        "isomet_1205c.stl",
        MeshPlacement {
            rotation_deg: [0.0, 0.0, 90.0],
            ..Default::default()
        },
    )?;
    let base = ctx.boxed(
        BoxSpec::new(1.5 * INCH, 1.5 * INCH, 5.0)
            .at(0.0, 0.0, ctx.plate_top())
            .centered_xy(Align::Positive),
    )?;
    let display = ctx.fuse(vec![crystal, base])?;

    let bolt = Bolt::Bolt8_32.spec();
    let bottom = ctx.plate_bottom();
    let plate_dz = ctx.cfg.plate_dz;
    let mut holes = Vec::new();
    for x in [-INCH / 2.0, INCH / 2.0] {
        holes.push(primitives::plate_bolt(ctx.kb, &bolt, x, 0.0, bottom, plate_dz)?);
    }
    let drill = ctx.fuse(holes)?;
    Ok(Geometry::new(display, Some(drill)))
}

pub(crate) fn aom(ctx: &mut BuildCtx<'_>, p: &AomParams) -> Result<Geometry, FactoryError> {
    let crystal = ctx.mesh(
        "isomet_1205c.stl",
        MeshPlacement {
            rotation_deg: [0.0, 0.0, 90.0],
            ..Default::default()
        },
    )?;
    let drill = km_pattern_drill(ctx, p.length, p.width, p.height)?;
    Ok(Geometry::new(crystal, Some(drill)).with_child(
        "Surface Adapter",
        PartKind::SurfaceAdapter(p.adapter),
        Transform::identity(),
    ))
}

/// Fiber coupler on a square mount plate, fiber end behind the origin.
pub(crate) fn fiberport(
    ctx: &mut BuildCtx<'_>,
    p: &FiberportParams,
    size: [f64; 3],
) -> Result<Geometry, FactoryError> {
    let [dx, dy, dz] = size;
    let body = ctx.boxed(
        BoxSpec::new(dx, dy, dz).align(Align::Negative, Align::Center, Align::Center),
    )?;
    let post = ctx.boxed(
        BoxSpec::new(dx, dy, post_height(ctx, -dz / 2.0))
            .at(0.0, 0.0, ctx.plate_top())
            .align(Align::Negative, Align::Center, Align::Positive),
    )?;
    let display = ctx.fuse(vec![body, post])?;

    let bolt = p.mount_bolt.spec();
    let bottom = ctx.plate_bottom();
    let plate_dz = ctx.cfg.plate_dz;
    let mut holes = Vec::new();
    for y in [-dy / 4.0, dy / 4.0] {
        holes.push(primitives::plate_bolt(ctx.kb, &bolt, -dx / 2.0, y, bottom, plate_dz)?);
    }
    let drill = ctx.fuse(holes)?;
    Ok(Geometry::new(display, Some(drill)))
}

/// External-cavity diode laser: diode, grating at the Littrow angle, stage.
pub(crate) fn ecdl(ctx: &mut BuildCtx<'_>, p: &EcdlParams) -> Result<Geometry, FactoryError> {
    if !(0.0..90.0).contains(&p.littrow_angle) {
        return Err(FactoryError::InvalidParameter {
            kind: "ecdl".into(),
            reason: format!("littrow_angle must be in [0, 90), got {}", p.littrow_angle),
        });
    }
    let stage = ctx.boxed(
        BoxSpec::new(p.stage_length, 40.0, p.stage_thickness)
            .at(0.0, 0.0, ctx.plate_top())
            .centered_xy(Align::Positive),
    )?;
    let diode = ctx.cylinder(
        CylinderSpec::new(9.0, 12.0)
            .at(-p.stage_length / 2.0 + 2.0, 0.0, 0.0)
            .axis(X_AXIS),
    )?;
    let grating = ctx.boxed(
        BoxSpec::new(6.0, 12.7, 12.7).align(Align::Positive, Align::Center, Align::Center),
    )?;
    let grating = ctx.place(
        &grating,
        Transform::from_translation(p.stage_length / 4.0, 0.0, 0.0)
            .compose(&Transform::rotation_z_deg(p.littrow_angle)),
    )?;
    let display = ctx.fuse(vec![stage, diode, grating])?;

    let bolt = Bolt::Bolt8_32.spec();
    let bottom = ctx.plate_bottom();
    let plate_dz = ctx.cfg.plate_dz;
    let inset = p.stage_length / 2.0 - 5.0;
    let mut holes = Vec::new();
    for x in [-inset, inset] {
        holes.push(primitives::plate_bolt(ctx.kb, &bolt, x, 0.0, bottom, plate_dz)?);
    }
    let pocket = ctx.boxed(
        BoxSpec::new(p.stage_length + 2.0, 42.0, 2.0)
            .at(0.0, 0.0, ctx.plate_top())
            .centered_xy(Align::Negative)
            .fillet(2.0, Z_UP),
    )?;
    holes.push(pocket);
    let drill = ctx.fuse(holes)?;
    Ok(Geometry::new(display, Some(drill)))
}
