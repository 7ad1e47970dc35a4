use thiserror::Error;

#[derive(Error, Debug)]
pub enum SrtError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid timepoint: {0}")]
    InvalidTimepoint(String),

    #[error("SrtTranslator::translate() called with no input file")]
    NoInput,

    #[error("SrtTranslator::write() no output for language \"{language}\"")]
    NoOutput { language: String },

    #[error("No quota.\n\tNeeded: {needed}\n\tAvailable: {available}")]
    OutOfQuota { needed: usize, available: usize },

    #[error("Translation provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, SrtError>;
