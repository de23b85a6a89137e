use thiserror::Error;

use facekit_featmatch::MatchError;

/// Errors returned by facebase operations.
///
/// All variants are recoverable; none abort the process. Extraction and
/// matching failures are surfaced verbatim from the collaborators, never
/// retried.
#[derive(Debug, Error)]
pub enum FacebaseError {
    #[error("facebase: label already registered: {label}")]
    AlreadyRegistered { label: String },

    #[error("facebase: label not registered: {label}")]
    NotRegistered { label: String },

    #[error("facebase: no face recognized")]
    NoFaceFound,

    #[error("facebase: feature extraction failed: {0}")]
    Extraction(String),

    #[error(transparent)]
    Matcher(#[from] MatchError),
}
