use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source document is missing, malformed or has no usable root.
    /// Fatal for the whole load; nothing of the model is usable.
    #[error("failed to import model at {}: {reason}", path.display())]
    Import { path: PathBuf, reason: String },

    /// A referenced image could not be decoded. Contained: the affected
    /// mesh keeps loading without this texture.
    #[error("failed to decode texture {key}: {reason}")]
    TextureDecode { key: String, reason: String },

    /// Buffer, texture or program creation failed. Rendering cannot
    /// proceed without it.
    #[error("gpu resource failure: {0}")]
    GpuResource(String),
}

pub type Result<T> = std::result::Result<T, Error>;
