use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("{0}")]
    MalformedInput(String),

    #[error("Import rejected: {errors} row error(s) found")]
    Rejected { errors: usize },

    #[error("There are no children to export")]
    EmptyExport,

    #[error("{0} timed out")]
    Timeout(String),

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PortalError>;
