use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::BusError;
use crate::message::{GardenMessage, MessageKind};

/// A subscriber to a `Source`. `receiver_mapping` advertises which message
/// kinds it can handle; `receive` is invoked for each message of a kind the
/// subscription actually connected.
#[async_trait]
pub trait Receiver: Send + Sync {
    fn receiver_mapping(&self) -> HashSet<MessageKind>;

    async fn receive(&self, message: GardenMessage) -> Result<(), BusError>;
}
