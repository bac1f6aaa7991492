// crates/legacy-clients-core/src/error.rs

use legacy_clients_parser::ParserError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input error: {0}")]
    Parser(#[from] ParserError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file could not be parsed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{sink} sink rejected batch: {message}")]
    Sink { sink: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, LoaderError>;
