use thiserror::Error;

/// All failure modes surfaced across the `microgbt` crate boundary.
///
/// Numerical edge cases encountered *inside* split finding (a bin with
/// `H + lambda == 0`, a non-finite gain) are not represented here; they
/// are treated as "no valid split at this bin", not as errors.
#[derive(Debug, Error)]
pub enum GbtError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParam { name: String, reason: String },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("empty dataset: {0}")]
    EmptyDataset(String),

    #[error("invalid labels: {0}")]
    InvalidLabels(String),

    #[error("index out of range: requested tree index {index}, but only {available} trees have been built")]
    IndexOutOfRange { index: usize, available: usize },
}

pub type GbtResult<T> = Result<T, GbtError>;
