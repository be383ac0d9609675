use thiserror::Error;

/// Everything that can sink a single row. None of these stop the run.
#[derive(Error, Debug)]
pub enum RowError {
    #[error("missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("missing date")]
    MissingDate,

    #[error("invalid date `{raw}` (expected DD/MM/YYYY)")]
    InvalidDate { raw: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}
