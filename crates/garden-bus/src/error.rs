use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("receiver offers none of this source's message types")]
    NothingToOffer,
    #[error("receiver handler failed: {0}")]
    HandlerFailed(String),
}
