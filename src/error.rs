use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no data to visualize, you must do a query first")]
    MissingData,
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Usage(String),
    #[error("invalid color `{value}` (expected #rrggbb)")]
    InvalidColor { value: String },
}

pub type Result<T> = std::result::Result<T, Error>;
