use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("invalid resource quantity for {field}: {value}")]
    InvalidQuantity { field: &'static str, value: String },

    #[error("InferenceService spec invalid: {0}")]
    InvalidSpec(String),
}
