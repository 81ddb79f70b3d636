use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing rack snapshot: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("rack {rack_id} must have a positive size (got {size_u}U)")]
    EmptyRack { rack_id: String, size_u: u32 },
    #[error("annotation {annotation_id} targets U{position_u} outside 1..={size_u}")]
    AnnotationOutOfRange {
        annotation_id: String,
        position_u: u32,
        size_u: u32,
    },
}
