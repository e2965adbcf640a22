//! Error handling

use thiserror::Error;

pub type AttackResult<T> = Result<T, AttackError>;

#[derive(Debug, Error)]
pub enum AttackError {
    // Call-order errors
    #[error("perturbation method is not implemented")]
    NotImplemented,

    #[error("must call do_perturbation first")]
    NotPerturbed,

    #[error("must call do_eval first")]
    NotEvaluated,

    // Argument errors
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("filename must end with {expected}: {filename}")]
    InvalidExtension { filename: String, expected: &'static str },

    #[error("shape error: {0}")]
    Shape(String),

    #[error("unknown label: {0}")]
    UnknownLabel(String),

    // Model errors
    #[error("model error: {0}")]
    Model(String),

    #[error("model checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl From<ndarray::ShapeError> for AttackError {
    fn from(err: ndarray::ShapeError) -> Self {
        AttackError::Shape(err.to_string())
    }
}
