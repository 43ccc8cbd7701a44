//! Round-robin session dispatch and the length-framed wire protocol
//! connecting a gardener to its pool of workers.

pub mod error;
pub mod gardener_transport;
pub mod round_robin;
pub mod wire;
pub mod worker_client;
pub mod worker_transport;

pub use error::TransportError;
pub use gardener_transport::GardenerTransport;
pub use round_robin::RoundRobin;
pub use wire::Command;
pub use worker_client::WorkerClient;
pub use worker_transport::WorkerTransport;
