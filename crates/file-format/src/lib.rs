//! Versioned JSON persistence for baseplate layouts.
//!
//! A file stores each baseplate's spec, its beams and the placement
//! journal. Loading replays the journal and checks the rebuilt transforms
//! against the ones saved next to it.

pub mod errors;
pub mod load;
pub mod metadata;
pub mod migrate;
pub mod save;

pub use errors::{LoadError, SaveError};
pub use load::{load_project, restore_baseplate, restore_project, TRANSFORM_TOLERANCE};
pub use metadata::ProjectMetadata;
pub use save::{
    save_project, BaseplateRecord, BeamRecord, ElementRecord, LayoutFile, FORMAT_ID,
    FORMAT_VERSION,
};
