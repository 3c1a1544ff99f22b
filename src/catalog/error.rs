use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Unknown catalog domain '{0}'")]
    UnknownDomain(String),
    #[error("Malformed catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to read catalog {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
