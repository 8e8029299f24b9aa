// Résumé scoring: declared response schemas, the model-backed scorer, the
// compensation-band policy and the band → job description table.

pub mod job_bands;
pub mod policy;
pub mod prompts;
pub mod schema;
pub mod scorer;

use thiserror::Error;

use crate::llm_client::LlmError;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Model call failed: {0}")]
    Model(#[from] LlmError),

    #[error("Model reply is not a JSON object")]
    NotAnObject,

    #[error("Model reply is missing '{0}'")]
    MissingField(&'static str),

    #[error("Model reply field '{field}' is not {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Model reply field '{field}' = {value} is outside 0..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        max: u32,
    },
}
