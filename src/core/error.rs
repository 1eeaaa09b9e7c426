use std::env;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HermitError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] env::VarError),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    Permission(String),
    #[error("Approval required: {0}")]
    ApprovalRequired(String),
    #[error("No project context: {0}")]
    Precondition(String),
    #[error("Timed out: {0}")]
    Timeout(String),
    #[error("Tool failure: {0}")]
    Handler(String),
}

impl HermitError {
    /// Stable error-kind string surfaced in the response envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            HermitError::Io(e) => match e.kind() {
                io::ErrorKind::NotFound => "NotFoundError",
                io::ErrorKind::PermissionDenied => "PermissionError",
                _ => "StorageError",
            },
            HermitError::EnvVar(_) => "StorageError",
            HermitError::Validation(_) => "ValidationError",
            HermitError::NotFound(_) => "NotFoundError",
            HermitError::Permission(_) => "PermissionError",
            HermitError::ApprovalRequired(_) => "ApprovalRequired",
            HermitError::Precondition(_) => "PreconditionError",
            HermitError::Timeout(_) => "TimeoutError",
            HermitError::Handler(_) => "HandlerError",
        }
    }
}
