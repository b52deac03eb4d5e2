use crate::types::EpochMillis;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Invalid interval: time difference of {time_diff_ms} ms is not a usable interval")]
    InvalidInterval { time_diff_ms: EpochMillis },

    #[error("Validation failed: {0}")]
    Validation(String),
}
