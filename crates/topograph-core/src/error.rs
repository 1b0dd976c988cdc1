use thiserror::Error;

#[derive(Error, Debug)]
pub enum TopographError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Decode error in {file}: {reason}")]
    Decode { file: String, reason: String },

    #[error("Graph error: {0}")]
    Graph(String),

    #[error("Filter error: {0}")]
    Filter(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, TopographError>;
