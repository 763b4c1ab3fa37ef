use thiserror::Error;

pub type Result<T> = std::result::Result<T, LintError>;

#[derive(Error, Debug)]
pub enum LintError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid pattern '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid syntax tree: {0}")]
    InvalidTree(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
