use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed solver response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("solver request failed: {0}")]
    Transport(String),

    #[error("no valid solution after {attempts} attempts")]
    NotAvailable { attempts: u32 },

    #[error("fetch cancelled")]
    Cancelled,
}

pub type IntakeResult<T> = Result<T, IntakeError>;
