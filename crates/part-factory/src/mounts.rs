//! Mounts and adapters, usually attached under an optic or fixture.

use geom_kernel::{MeshPlacement, SolidHandle};
use optics_types::{BoltSpec, BOLT_14_20, BOLT_8_32, DRILL_DEPTH, INCH};

use crate::descriptor::*;
use crate::factory::{BuildCtx, Geometry};
use crate::primitives::{self, Align, BoxSpec, CylinderSpec, Z_UP};
use crate::types::FactoryError;

/// Bolt from under the plate plus two alignment pin holes, centred at `x`.
fn bolt_and_pins(
    ctx: &mut BuildCtx<'_>,
    bolt: &BoltSpec,
    x: f64,
) -> Result<Vec<SolidHandle>, FactoryError> {
    let bottom = ctx.plate_bottom();
    let top = ctx.plate_top();
    let plate_dz = ctx.cfg.plate_dz;
    let mut holes = vec![primitives::plate_bolt(ctx.kb, bolt, x, 0.0, bottom, plate_dz)?];
    for y in [-5.0, 5.0] {
        holes.push(ctx.cylinder(CylinderSpec::new(2.0, 2.2).at(x, y, top))?);
    }
    Ok(holes)
}

/// Kinematic mirror mount of a given face `size`, body extending `depth` behind the origin.
pub(crate) fn mirror_mount(
    ctx: &mut BuildCtx<'_>,
    p: &MirrorMountParams,
    size: f64,
    depth: f64,
) -> Result<Geometry, FactoryError> {
    let body = ctx.boxed(
        BoxSpec::new(depth, size, size).align(Align::Negative, Align::Center, Align::Center),
    )?;
    let post_dz = (-size / 2.0 - ctx.plate_top()).max(1.0);
    let top = ctx.plate_top();
    let post = ctx.boxed(
        BoxSpec::new(depth, 10.0, post_dz)
            .at(0.0, 0.0, top)
            .align(Align::Negative, Align::Center, Align::Positive),
    )?;
    let display = ctx.fuse(vec![body, post])?;

    let mut holes = bolt_and_pins(ctx, &p.mount_bolt.spec(), -depth / 2.0)?;
    if p.thumbscrews {
        // adjuster screws hang below the plate top behind the mount
        holes.push(ctx.boxed(
            BoxSpec::new(6.0, size, 4.0)
                .at(-depth, 0.0, top)
                .align(Align::Negative, Align::Center, Align::Negative),
        )?);
    }
    let drill = ctx.fuse(holes)?;
    Ok(Geometry::new(display, Some(drill)))
}

pub(crate) fn lens_holder(
    ctx: &mut BuildCtx<'_>,
    p: &HolderParams,
) -> Result<Geometry, FactoryError> {
    let ring = ctx.boxed(
        BoxSpec::new(6.0, 25.0, 25.0).align(Align::Center, Align::Center, Align::Center),
    )?;
    let aperture = ctx.cylinder(
        CylinderSpec::new(12.7, 6.0)
            .at(-3.0, 0.0, 0.0)
            .axis(primitives::X_AXIS),
    )?;
    let ring = ctx.cut(ring, vec![aperture])?;
    let top = ctx.plate_top();
    let post = ctx.boxed(
        BoxSpec::new(6.0, 10.0, (-12.5 - top).max(1.0))
            .at(0.0, 0.0, top)
            .centered_xy(Align::Positive),
    )?;
    let display = ctx.fuse(vec![ring, post])?;
    let holes = bolt_and_pins(ctx, &p.mount_bolt.spec(), 0.0)?;
    let drill = ctx.fuse(holes)?;
    Ok(Geometry::new(display, Some(drill)))
}

pub(crate) fn rotation_stage(
    ctx: &mut BuildCtx<'_>,
    p: &HolderParams,
) -> Result<Geometry, FactoryError> {
    let top = ctx.plate_top();
    let stage = ctx.mesh(
        "RSP05.stl",
        MeshPlacement {
            rotation_deg: [0.0, 90.0, 0.0],
            translation: [0.0, 0.0, top],
            ..Default::default()
        },
    )?;
    let mut holes = bolt_and_pins(ctx, &p.mount_bolt.spec(), 0.0)?;
    // square washer recess
    holes.push(ctx.boxed(
        BoxSpec::new(0.55 * INCH, 0.55 * INCH, 1.0)
            .at(0.0, 0.0, top)
            .centered_xy(Align::Negative),
    )?);
    let drill = ctx.fuse(holes)?;
    Ok(Geometry::new(stage, Some(drill)))
}

/// Pedestal under a cube optic, bolted from below the plate.
pub(crate) fn skate_mount(
    ctx: &mut BuildCtx<'_>,
    p: &SkateMountParams,
    crossholes: bool,
) -> Result<Geometry, FactoryError> {
    let top = ctx.plate_top();
    let side = p.cube_size + 2.0;
    let height = (-p.cube_size / 2.0 - top).max(1.0);
    let mut body = ctx.boxed(
        BoxSpec::new(side, side, height)
            .at(0.0, 0.0, top)
            .centered_xy(Align::Positive),
    )?;
    if crossholes {
        let mut cross = Vec::new();
        for axis in [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            let start = [-axis[0] * side / 2.0, -axis[1] * side / 2.0];
            cross.push(ctx.cylinder(
                CylinderSpec::new(2.0, side)
                    .at(start[0], start[1], top + height / 2.0)
                    .axis(axis),
            )?);
        }
        body = ctx.cut(body, cross)?;
    }

    let bolt = p.mount_bolt.spec();
    let bottom = ctx.plate_bottom();
    let plate_dz = ctx.cfg.plate_dz;
    let pin_x = if p.invert { -side / 2.0 } else { side / 2.0 };
    let holes = vec![
        primitives::plate_bolt(ctx.kb, &bolt, 0.0, 0.0, bottom, plate_dz)?,
        ctx.cylinder(CylinderSpec::new(2.0, 2.2).at(pin_x, 0.0, top))?,
    ];
    let drill = ctx.fuse(holes)?;
    Ok(Geometry::new(body, Some(drill)))
}

/// Riser plate with a central bolt for the fixture above and two mounting
/// holes into the plate.
pub(crate) fn surface_adapter(
    ctx: &mut BuildCtx<'_>,
    p: &SurfaceAdapterParams,
) -> Result<Geometry, FactoryError> {
    let bolt = BOLT_8_32;
    let dx = bolt.head_dia + p.outer_thickness * 2.0;
    let dy = dx + p.mount_hole_dy;
    let dz = p.adapter_height;
    let top = ctx.plate_top();

    let body = ctx.boxed(
        BoxSpec::new(dx, dy, dz)
            .at(0.0, 0.0, top)
            .centered_xy(Align::Positive)
            .fillet(p.fillet, Z_UP),
    )?;
    let mut holes = vec![ctx.cylinder(
        CylinderSpec::new(bolt.clear_dia, dz)
            .at(0.0, 0.0, top)
            .axis(Z_UP)
            .counterbore(bolt.head_dia, bolt.head_dz.min(dz)),
    )?];
    for side in [-1.0, 1.0] {
        holes.push(ctx.cylinder(
            CylinderSpec::new(bolt.clear_dia, dz)
                .at(0.0, side * p.mount_hole_dy / 2.0, top + dz)
                .counterbore(bolt.head_dia, bolt.head_dz.min(dz)),
        )?);
    }
    let display = ctx.cut(body, holes)?;

    let mut taps = Vec::new();
    for side in [-1.0, 1.0] {
        taps.push(primitives::tap_hole(
            ctx.kb,
            &bolt,
            0.0,
            side * p.mount_hole_dy / 2.0,
            top,
            DRILL_DEPTH,
        )?);
    }
    let clearance = ctx.boxed(
        BoxSpec::new(dx + 2.0 * p.drill_tolerance, dy + 2.0 * p.drill_tolerance, 0.5)
            .at(0.0, 0.0, top)
            .centered_xy(Align::Negative)
            .fillet(p.fillet + p.drill_tolerance, Z_UP),
    )?;
    taps.push(clearance);
    let drill = ctx.fuse(taps)?;
    Ok(Geometry::new(display, Some(drill)))
}

/// Two-level riser that lifts a beam between heights.
pub(crate) fn periscope(
    ctx: &mut BuildCtx<'_>,
    p: &PeriscopeParams,
) -> Result<Geometry, FactoryError> {
    if p.upper_dz <= p.lower_dz {
        return Err(FactoryError::InvalidParameter {
            kind: "periscope".into(),
            reason: format!(
                "upper_dz {} must exceed lower_dz {}",
                p.upper_dz, p.lower_dz
            ),
        });
    }
    let width = 2.0 * INCH;
    let top = ctx.plate_top();
    let sign = if p.invert { -1.0 } else { 1.0 };
    let shift = sign * (width / 2.0 + INCH / 2.0);
    let bolt = BOLT_14_20;

    let body = ctx.boxed(
        BoxSpec::new(70.0, width, p.upper_dz + 20.0)
            .at(0.0, shift, top)
            .centered_xy(Align::Positive),
    )?;
    let mut bores = Vec::new();
    let mut taps = Vec::new();
    for x in [-INCH, INCH] {
        for y in [-INCH / 2.0, INCH / 2.0] {
            bores.push(ctx.cylinder(
                CylinderSpec::new(bolt.clear_dia + 0.5, INCH + 5.0)
                    .at(x, shift + y, top + 25.0)
                    .counterbore(bolt.head_dia + 0.5, 10.0),
            )?);
            taps.push(primitives::tap_hole(ctx.kb, &bolt, x, shift + y, top, DRILL_DEPTH)?);
        }
    }
    // lower mirror shelf
    let shelf = ctx.boxed(
        BoxSpec::new(30.0, width, p.upper_dz - p.lower_dz)
            .at(0.0, shift, top + p.lower_dz + 20.0)
            .centered_xy(Align::Positive),
    )?;
    bores.push(shelf);
    let display = ctx.cut(body, bores)?;
    let drill = ctx.fuse(taps)?;
    Ok(Geometry::new(display, Some(drill)))
}
