use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to read container {container}: {reason}")]
    ReadError { container: String, reason: String },

    #[error("Failed to write container {container}: {reason}")]
    WriteError { container: String, reason: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Database worker is not running")]
    WorkerStopped,
}
