//! The bus: a `Source`/`Receiver` typed pub/sub that composes garden
//! components without direct coupling.

pub mod error;
pub mod message;
pub mod receiver;
pub mod source;

pub use error::BusError;
pub use message::{GardenMessage, MessageKind};
pub use receiver::Receiver;
pub use source::Source;
