//! Error kinds surfaced by the service. Callers distinguish transient
//! conditions (store, timeout) from permanent ones (invalid input, not found)
//! by variant.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no model artifact found; tried: {tried}")]
    ModelNotFound { tried: String },

    #[error("inference engine is closed")]
    EngineClosed,

    #[error("invalid window shape: expected {expected}x2, got {got}x2")]
    InvalidInput { expected: usize, got: usize },

    #[error("malformed stored point: {reason}")]
    Serialization { reason: String },

    #[error("trajectory store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("AOI not found: {id}")]
    AoiNotFound { id: String },

    #[error("inference failed: {reason}")]
    Inference { reason: String },

    #[error("inference timed out after {ms} ms")]
    InferenceTimeout { ms: u64 },
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::StoreUnavailable {
            reason: e.to_string(),
        }
    }
}
