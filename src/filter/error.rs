use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("Invalid field path: {0}")]
    InvalidField(String),

    #[error("Invalid operator data: {0}")]
    InvalidOperatorData(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}
