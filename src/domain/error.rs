use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("I/O error: {0}")]
    Io(String),
}
