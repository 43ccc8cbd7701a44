use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no worker sessions are attached")]
    NoWorkerAvailable,
    #[error("session I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed command: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("unexpected command on the wire: {0}")]
    UnexpectedCommand(String),
    #[error("session disconnected before the dispatch was acked")]
    Disconnected,
}
