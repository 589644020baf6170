//! Helper functions: error type, tracing setup, part shortcuts.

use layout_engine::LayoutError;
use part_factory::params::{
    BoxParams, LensParams, MirrorMountParams, MirrorParams, SkateMountParams, SplitterParams,
};
use part_factory::{PartDescriptor, PartKind};

// ── Error Type ──────────────────────────────────────────────────────────────

/// Unified error type for the test harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("element not found: {name}")]
    ElementNotFound { name: String },

    #[error("beam not found: {name}")]
    BeamNotFound { name: String },

    #[error("assertion failed: {detail}")]
    AssertionFailed { detail: String },

    #[error("oracle failure ({oracle}): {detail}")]
    OracleFailure { oracle: String, detail: String },

    #[error("duplicate name: {name}")]
    DuplicateName { name: String },

    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
}

// ── Tracing ─────────────────────────────────────────────────────────────────

/// Route `tracing` events to the test output.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .try_init();
}

// ── Part Shortcuts ──────────────────────────────────────────────────────────

/// Mirror on a KM05 mount.
pub fn mirror() -> PartDescriptor {
    PartKind::CircularMirror(MirrorParams {
        mount: Some(Box::new(PartKind::MirrorMountKm05(MirrorMountParams::default()))),
        ..Default::default()
    })
    .into()
}

/// Bare mirror, no mount children.
pub fn bare_mirror() -> PartDescriptor {
    PartKind::CircularMirror(MirrorParams::default()).into()
}

pub fn lens(focal_length: f64) -> PartDescriptor {
    PartKind::CircularLens(LensParams::new(focal_length)).into()
}

/// Polarizing cube on a skate mount.
pub fn splitter(invert: bool) -> PartDescriptor {
    PartKind::CubeSplitter(SplitterParams {
        invert,
        mount: Some(Box::new(PartKind::SkateMount(SkateMountParams::default()))),
        ..Default::default()
    })
    .into()
}

pub fn block(size: f64) -> PartDescriptor {
    PartKind::CustomBox(BoxParams::new(size, size, size)).into()
}
