use std::io;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("store I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("failed to serialize events: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to replace store file: {0}")]
    Persist(#[from] tempfile::PersistError),
}
