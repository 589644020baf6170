//! Ion-trap experiment fixtures. Most sit on a surface adapter that is
//! reported as a child attachment.

use geom_kernel::{MeshPlacement, SolidHandle};
use optics_types::{Transform, BOLT_8_32, DRILL_DEPTH, INCH};

use crate::descriptor::*;
use crate::factory::{BuildCtx, Geometry};
use crate::primitives::{self, Align, BlankSpec, BoxSpec, CylinderSpec, X_AXIS, Z_UP};
use crate::types::FactoryError;

/// Feature cut into the top or sides of a housing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Face {
    /// 4x4 grid of detector windows.
    Windows,
    /// Connector slot on the +x end.
    Connector,
    /// Four rod electrodes and an axial ejection bore along x.
    Quadrupole,
}

/// Drill pattern for parts on a KM100-style kinematic base: recessed pad,
/// centre clearance, two pins, a square washer and four tapped holes.
pub(crate) fn km_pattern_drill(
    ctx: &mut BuildCtx<'_>,
    length: f64,
    width: f64,
    height: f64,
) -> Result<SolidHandle, FactoryError> {
    let bolt = BOLT_8_32;
    let top = ctx.plate_top();
    let mut parts = vec![
        ctx.boxed(
            BoxSpec::new(length, width, 5.0)
                .at(0.0, 0.0, top)
                .centered_xy(Align::Negative),
        )?,
        ctx.cylinder(
            CylinderSpec::new(bolt.clear_dia + 0.35, height + 5.0)
                .at(0.0, 0.0, top)
                .counterbore(bolt.clear_dia + 0.35, height / 2.0),
        )?,
    ];
    for x in [-5.0, 5.0] {
        parts.push(ctx.cylinder(CylinderSpec::new(2.0, 2.2).at(x, 0.0, top - 5.0))?);
    }
    parts.push(ctx.boxed(
        BoxSpec::new(0.55 * INCH, 0.55 * INCH, 5.0)
            .at(0.0, 0.0, top - 5.0)
            .centered_xy(Align::Negative),
    )?);
    for x in [-0.25 * INCH, 0.25 * INCH] {
        for y in [-0.25 * INCH, 0.25 * INCH] {
            parts.push(ctx.cylinder(
                CylinderSpec::new(bolt.tap_dia * 2.0, DRILL_DEPTH).at(x, y, top - 10.0),
            )?);
        }
    }
    ctx.fuse(parts)
}

/// Blank pocket around `display` plus four tapped holes at `(±hx, ±hy)`.
fn pocket_and_taps(
    ctx: &mut BuildCtx<'_>,
    display: &SolidHandle,
    hx: f64,
    hy: f64,
) -> Result<SolidHandle, FactoryError> {
    let top = ctx.plate_top();
    let mut parts = vec![ctx.blank(
        display,
        BlankSpec {
            tolerance: 2.0,
            fillet: 2.0,
            min_offset: [0.0, 0.0, -5.0],
            floor: Some(top),
            ..Default::default()
        },
    )?];
    for x in [-hx, hx] {
        for y in [-hy, hy] {
            parts.push(primitives::tap_hole(ctx.kb, &BOLT_8_32, x, y, top, DRILL_DEPTH)?);
        }
    }
    ctx.fuse(parts)
}

/// Counterbored clearance hole down through a body whose top is at `z_top`.
fn top_bolt(ctx: &mut BuildCtx<'_>, z_top: f64, depth: f64) -> Result<SolidHandle, FactoryError> {
    let bolt = BOLT_8_32;
    ctx.cylinder(
        CylinderSpec::new(bolt.clear_dia, depth)
            .at(0.0, 0.0, z_top)
            .counterbore(bolt.head_dia, bolt.head_dz.min(depth)),
    )
}

pub(crate) fn ion_trap(ctx: &mut BuildCtx<'_>, p: &IonTrapParams) -> Result<Geometry, FactoryError> {
    let base = ctx.plate_top() + p.adapter.adapter_height;
    let chip = ctx.boxed(
        BoxSpec::new(p.width, p.height, p.thickness)
            .at(0.0, 0.0, base)
            .centered_xy(Align::Positive),
    )?;
    // electrode region recessed into the top surface
    let electrodes = ctx.boxed(
        BoxSpec::new(p.width * 0.6, p.height * 0.6, p.thickness / 2.0)
            .at(0.0, 0.0, base + p.thickness)
            .centered_xy(Align::Negative),
    )?;
    let hole = top_bolt(ctx, base + p.thickness, p.thickness)?;
    let display = ctx.cut(chip, vec![electrodes, hole])?;
    let drill = pocket_and_taps(ctx, &display, p.width / 2.0 - 1.0, p.height / 2.0 - 1.0)?;
    Ok(Geometry::new(display, Some(drill)).with_child(
        "Surface Adapter",
        PartKind::SurfaceAdapter(p.adapter),
        Transform::identity(),
    ))
}

pub(crate) fn housing(
    ctx: &mut BuildCtx<'_>,
    h: &Housing,
    face: Face,
) -> Result<Geometry, FactoryError> {
    let base = ctx.plate_top() + h.adapter.adapter_height;
    let top = base + h.height;
    let body = ctx.boxed(
        BoxSpec::new(h.length, h.width, h.height)
            .at(0.0, 0.0, base)
            .centered_xy(Align::Positive),
    )?;

    let mut cuts = Vec::new();
    match face {
        Face::Windows => {
            let pitch = (h.length.min(h.width * 2.0)) / 5.0;
            for i in 0..4 {
                for j in 0..4 {
                    let x = (i as f64 - 1.5) * pitch;
                    let y = (j as f64 - 1.5) * pitch / 2.0;
                    cuts.push(ctx.boxed(
                        BoxSpec::new(pitch * 0.8, pitch * 0.4, h.height / 2.0)
                            .at(x, y, top)
                            .centered_xy(Align::Negative),
                    )?);
                }
            }
        }
        Face::Connector => {
            cuts.push(ctx.boxed(
                BoxSpec::new(5.0, h.width * 0.8, h.height / 2.0)
                    .at(h.length / 2.0, 0.0, top)
                    .align(Align::Negative, Align::Center, Align::Negative),
            )?);
        }
        Face::Quadrupole => {
            let rod = 5.0;
            let mid = base + h.height / 2.0;
            for y in [-1.0, 1.0] {
                for z in [-1.0, 1.0] {
                    cuts.push(ctx.cylinder(
                        CylinderSpec::new(rod, h.length)
                            .at(
                                -h.length / 2.0,
                                y * (h.width / 2.0 - rod),
                                mid + z * (h.height / 2.0 - rod),
                            )
                            .axis(X_AXIS),
                    )?);
                }
            }
            cuts.push(ctx.cylinder(
                CylinderSpec::new(rod / 2.0, h.length)
                    .at(-h.length / 2.0, 0.0, mid)
                    .axis(X_AXIS),
            )?);
        }
    }
    cuts.push(top_bolt(ctx, top, h.height)?);
    let display = ctx.cut(body, cuts)?;
    let drill = pocket_and_taps(ctx, &display, h.length / 2.0 - 5.0, h.width / 2.0 - 2.0)?;
    Ok(Geometry::new(display, Some(drill)).with_child(
        "Surface Adapter",
        PartKind::SurfaceAdapter(h.adapter),
        Transform::identity(),
    ))
}

pub(crate) fn stepper_motor(
    ctx: &mut BuildCtx<'_>,
    p: &StepperMotorParams,
) -> Result<Geometry, FactoryError> {
    let motor = ctx.mesh(
        "RSP05-Step.stl",
        MeshPlacement {
            rotation_deg: [90.0, 0.0, 90.0],
            translation: [2.084, -1.148, 0.498],
            ..Default::default()
        },
    )?;
    let drill = km_pattern_drill(ctx, p.width, p.height, p.length)?;
    Ok(Geometry::new(motor, Some(drill)))
}

pub(crate) fn ion_injection_port(
    ctx: &mut BuildCtx<'_>,
    p: &InjectionPortParams,
) -> Result<Geometry, FactoryError> {
    let base = ctx.plate_top() + p.periscope.lower_dz;
    let body = ctx.boxed(
        BoxSpec::new(p.length, p.width, p.height)
            .at(0.0, 0.0, base)
            .centered_xy(Align::Positive),
    )?;
    let bore = ctx.cylinder(
        CylinderSpec::new(5.0, p.length)
            .at(-p.length / 2.0, 0.0, base + p.height / 2.0)
            .axis(X_AXIS),
    )?;
    let hole = top_bolt(ctx, base + p.height, p.height)?;
    let display = ctx.cut(body, vec![bore, hole])?;
    let drill = pocket_and_taps(ctx, &display, p.width / 2.0 - 2.0, p.height / 2.0 - 2.0)?;
    Ok(Geometry::new(display, Some(drill)).with_child(
        "Periscope Mount",
        PartKind::Periscope(p.periscope),
        Transform::identity(),
    ))
}

/// Plain enclosure box with its corner at the origin. Never drills.
pub(crate) fn custom_box(ctx: &mut BuildCtx<'_>, p: &BoxParams) -> Result<Geometry, FactoryError> {
    let body = ctx.boxed(BoxSpec::new(p.dx, p.dy, p.dz).fillet(p.fillet, Z_UP))?;
    Ok(Geometry::new(body, None))
}
