use thiserror::Error;

/// Errors returned by descriptor matching.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("featmatch: reference descriptor set is empty")]
    EmptyReference,

    #[error("featmatch: k must be at least 1")]
    ZeroK,

    #[error("featmatch: backend error: {0}")]
    Backend(String),
}
