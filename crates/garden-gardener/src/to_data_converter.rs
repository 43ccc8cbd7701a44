//! `ToDataConverter`: the first pipeline stage after validation. Turns raw
//! `Input` and validated `Result` into `Data`; `ResultError` is absorbed
//! here — a failed computation never becomes stored data.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use garden_bus::{BusError, GardenMessage, MessageKind, Receiver, Source};

pub struct ToDataConverter {
    source: Source,
}

impl ToDataConverter {
    pub fn new() -> Self {
        Self {
            source: Source::new([MessageKind::Data]),
        }
    }

    pub fn subscribe(&self, receiver: Arc<dyn Receiver>) -> Result<Vec<MessageKind>, BusError> {
        self.source.subscribe(receiver)
    }
}

impl Default for ToDataConverter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Receiver for ToDataConverter {
    fn receiver_mapping(&self) -> HashSet<MessageKind> {
        [MessageKind::Input, MessageKind::Result, MessageKind::ResultError]
            .into_iter()
            .collect()
    }

    async fn receive(&self, message: GardenMessage) -> Result<(), BusError> {
        match message {
            GardenMessage::Input(input) => self.source.emit(GardenMessage::Data(input.into_data())).await,
            GardenMessage::Result(result) => self.source.emit(GardenMessage::Data(result.into_data())).await,
            GardenMessage::ResultError(error) => {
                log::warn!(
                    "dropping a result error: entity={} name={} version={} lineage={} error={}",
                    error.entity,
                    error.name,
                    error.version,
                    error.lineage,
                    error.error
                );
                Ok(())
            }
            other => panic!(
                "to-data converter received a message kind it never subscribed to: {:?}",
                other.kind()
            ),
        }
    }
}
