use layout_engine::LayoutError;

/// Errors during layout file loading.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("failed to parse file: {0}")]
    ParseError(String),

    #[error("unknown file format: {0}")]
    UnknownFormat(String),

    #[error("file version {file_version} is newer than supported version {supported_version}")]
    FutureVersion {
        file_version: u32,
        supported_version: u32,
    },

    #[error("migration failed from version {from} to {to}: {reason}")]
    MigrationFailed { from: u32, to: u32, reason: String },

    #[error("replaying baseplate {label} failed: {source}")]
    ReplayFailed {
        label: String,
        #[source]
        source: LayoutError,
    },

    #[error("element {element} is missing after replaying baseplate {label}")]
    MissingElement { label: String, element: String },

    #[error("element {element} moved by {deviation} mm on replay")]
    TransformMismatch { element: String, deviation: f64 },

    #[error("baseplate {label} replayed {found} beams, file lists {expected}")]
    BeamCountMismatch {
        label: String,
        expected: usize,
        found: usize,
    },
}

/// Errors during layout file saving.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SaveError {
    #[error("element {element} has a non-finite transform")]
    NonFiniteTransform { element: String },

    #[error("serialization failed: {0}")]
    Serialize(String),
}
