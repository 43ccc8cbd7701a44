//! `InvalidResultFilter`: the gate a `Result`/`ResultError` must pass
//! before it is trusted. Two checks, both silent drops on failure (an
//! invalid result is not an error condition — it is stale or unsolicited
//! work whose answer nobody is waiting on any more):
//!
//! 1. Path validity — the result's declared inputs, by `(name, version)`
//!    only, must match one of the recipes the garden has on file for
//!    `(name, version)`.
//! 2. Freshness — every declared input must still be exactly the value on
//!    record at its `lineage`: looking it up in the store must return
//!    exactly one row, and that row's value must hash to the input's
//!    declared `hash`.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use garden_bus::{BusError, GardenMessage, MessageKind, Receiver, Source};
use garden_core::{hash_value, Garden, ResultInput};
use garden_store::{DataStore, GetQuery};

pub struct InvalidResultFilter {
    garden: Arc<Garden>,
    store: Arc<dyn DataStore>,
    source: Source,
}

impl InvalidResultFilter {
    pub fn new(garden: Arc<Garden>, store: Arc<dyn DataStore>) -> Self {
        Self {
            garden,
            store,
            source: Source::new([MessageKind::Result, MessageKind::ResultError]),
        }
    }

    pub fn subscribe(&self, receiver: Arc<dyn Receiver>) -> Result<Vec<MessageKind>, BusError> {
        self.source.subscribe(receiver)
    }

    async fn is_valid(&self, entity: &str, name: &str, version: &str, inputs: &[ResultInput]) -> Result<bool, BusError> {
        let declared: Vec<(String, String)> = inputs.iter().map(|i| (i.name.clone(), i.version.clone())).collect();
        if !self.garden.inputs_for(name, version).contains(&declared) {
            return Ok(false);
        }

        for input in inputs {
            let rows = self
                .store
                .get(
                    GetQuery::new(entity)
                        .name(&input.name)
                        .version(&input.version)
                        .lineage(&input.lineage),
                )
                .await
                .map_err(|err| BusError::HandlerFailed(err.to_string()))?;

            let [row] = rows.as_slice() else {
                return Ok(false);
            };
            if hash_value(&row.value) != input.hash {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl Receiver for InvalidResultFilter {
    fn receiver_mapping(&self) -> HashSet<MessageKind> {
        [MessageKind::Result, MessageKind::ResultError].into_iter().collect()
    }

    async fn receive(&self, message: GardenMessage) -> Result<(), BusError> {
        let (entity, name, version, inputs) = match &message {
            GardenMessage::Result(r) => (&r.entity, &r.name, &r.version, &r.inputs),
            GardenMessage::ResultError(e) => (&e.entity, &e.name, &e.version, &e.inputs),
            other => panic!(
                "invalid result filter received a message kind it never subscribed to: {:?}",
                other.kind()
            ),
        };

        if self.is_valid(entity, name, version, inputs).await? {
            self.source.emit(message).await
        } else {
            log::warn!("dropping an invalid or stale result for {name}/{version} on entity {entity}");
            Ok(())
        }
    }
}
