//! `WorkMaker`: watches new `Data` and constructs every `Work` that newly
//! becomes computable from it, via a cartesian product over fresh input
//! candidates at each declared recipe.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use garden_bus::{BusError, GardenMessage, MessageKind, Receiver, Source};
use garden_core::{Data, Garden, Work};
use garden_store::{DataStore, GetQuery};

pub struct WorkMaker {
    garden: Arc<Garden>,
    store: Arc<dyn DataStore>,
    source: Source,
}

impl WorkMaker {
    pub fn new(garden: Arc<Garden>, store: Arc<dyn DataStore>) -> Self {
        Self {
            garden,
            store,
            source: Source::new([MessageKind::Work]),
        }
    }

    pub fn subscribe(&self, receiver: Arc<dyn Receiver>) -> Result<Vec<MessageKind>, BusError> {
        self.source.subscribe(receiver)
    }

    /// For every recipe declared for `(name, version)`, fetches the
    /// current candidates for each of its inputs and emits one `Work` per
    /// combination in the cartesian product. A recipe with no candidates
    /// for one of its inputs yet contributes nothing.
    async fn try_compute(&self, entity: &str, name: &str, version: &str) -> Result<(), BusError> {
        for recipe in self.garden.inputs_for(name, version) {
            let mut candidate_lists: Vec<Vec<Data>> = Vec::with_capacity(recipe.len());
            let mut starved = false;
            for (input_name, input_version) in &recipe {
                let candidates = self
                    .store
                    .get(GetQuery::new(entity).name(input_name).version(input_version))
                    .await
                    .map_err(|err| BusError::HandlerFailed(err.to_string()))?;
                if candidates.is_empty() {
                    starved = true;
                    break;
                }
                candidate_lists.push(candidates);
            }
            if starved {
                continue;
            }

            for combination in cartesian_product(&candidate_lists) {
                let inputs: Vec<_> = combination.into_iter().map(Data::into_work_input).collect();
                let lineage = Work::lineage_for(name, version, &inputs);
                let work = Work::new(entity, name, version, lineage, inputs);
                self.source.emit(GardenMessage::Work(work)).await?;
            }
        }
        Ok(())
    }
}

fn cartesian_product(lists: &[Vec<Data>]) -> Vec<Vec<Data>> {
    lists.iter().fold(vec![Vec::new()], |partials, list| {
        partials
            .into_iter()
            .flat_map(|prefix| {
                list.iter().map(move |item| {
                    let mut next = prefix.clone();
                    next.push(item.clone());
                    next
                })
            })
            .collect()
    })
}

#[async_trait]
impl Receiver for WorkMaker {
    fn receiver_mapping(&self) -> HashSet<MessageKind> {
        [MessageKind::Data].into_iter().collect()
    }

    async fn receive(&self, message: GardenMessage) -> Result<(), BusError> {
        let data = match message {
            GardenMessage::Data(data) => data,
            other => panic!("work maker received a message kind it never subscribed to: {:?}", other.kind()),
        };

        for (name, version) in self.garden.paths_requiring(&data.name, &data.version) {
            self.try_compute(&data.entity, &name, &version).await?;
        }
        Ok(())
    }
}
