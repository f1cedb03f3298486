/// Failures of the non-reporting surface (configuration and export).
///
/// Reporting itself never returns an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid collector config: {0}")]
    InvalidConfig(String),

    #[error("snapshot serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
