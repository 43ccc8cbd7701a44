use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Bus(#[from] garden_bus::BusError),
    #[error(transparent)]
    Store(#[from] garden_store::StoreError),
    #[error(transparent)]
    Transport(#[from] garden_transport::TransportError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid input endpoint address: {0}")]
    Addr(#[from] std::net::AddrParseError),
    #[error("worker listener task panicked: {0}")]
    ListenerTask(#[from] tokio::task::JoinError),
}
