use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetentionError {
    #[error("Ledger is empty: no customer metrics can be derived")]
    EmptyInput,

    #[error("Estimated cost is zero for '{segment}': ROI undefined")]
    DivisionByZero { segment: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Invalid dataset: {reason}")]
    InvalidDataset { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type RetentionResult<T> = Result<T, RetentionError>;
