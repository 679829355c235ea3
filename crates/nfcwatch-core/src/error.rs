use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Logging boundary
    #[error("Diagnostic record is missing its {0}")]
    IncompleteRecord(&'static str),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Runtime errors
    #[error("Monitor task failed: {0}")]
    TaskFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
