use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite store error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store connection poisoned")]
    Poisoned,
}
