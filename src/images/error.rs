use thiserror::Error;

/// Errors on the image delivery path.
///
/// An absent image is not an error; the pipeline reports it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The stored bytes are not a decodable image. Indicates corrupt data at
    /// rest, so callers surface this as a server-side failure and log it.
    #[error("image decode failed: {0}")]
    DecodeFailed(String),

    #[error("image encode failed: {0}")]
    EncodeFailed(String),

    /// The blocking transform task was cancelled or panicked.
    #[error("transform task failed: {0}")]
    TaskFailed(String),

    /// The entity store could not be queried for original bytes.
    #[error("original bytes lookup failed: {0}")]
    Source(#[from] sqlx::Error),
}
