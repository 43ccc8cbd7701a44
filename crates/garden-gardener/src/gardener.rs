//! `Gardener`: wires `InvalidResultFilter -> ToDataConverter -> DataStorer
//! -> WorkMaker` into a single pipeline, and exposes the seams an external
//! transport or HTTP front end needs: ingress for `Input`/`Result`/
//! `ResultError`, a `Work` sink for transports to subscribe to, and a
//! `Data` feed for spectators.
//!
//! A `Gardener` is itself a bus [`Receiver`] for `Result`/`ResultError`, so
//! a transport can `subscribe(gardener)` the same way it subscribes any
//! other component — the gardener looks, from the transport's side, like
//! just another endpoint on the bus.
//!
//! This realizes the pipeline's state progression informally: a `Work`
//! handed to a subscribed transport is in flight; a `Result`/`ResultError`
//! arriving back is awaiting validation; passing the filter and reaching
//! the storer is a commit (or, for an unchanged value, a no-op); failing
//! the filter is a silent drop. There is no separate retry queue — a
//! dispatch failure propagates as an error up through the `Work` emit that
//! produced it, per the bus's fail-fast semantics.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use garden_bus::{BusError, GardenMessage, MessageKind, Receiver};
use garden_core::{Garden, Input, ResultError, WorkResult};
use garden_store::DataStore;

use crate::data_storer::DataStorer;
use crate::invalid_result_filter::InvalidResultFilter;
use crate::to_data_converter::ToDataConverter;
use crate::work_maker::WorkMaker;

pub struct Gardener {
    result_filter: Arc<InvalidResultFilter>,
    to_data: Arc<ToDataConverter>,
    storer: Arc<DataStorer>,
    work_maker: Arc<WorkMaker>,
}

impl Gardener {
    pub fn new(garden: Arc<Garden>, store: Arc<dyn DataStore>) -> Result<Arc<Self>, BusError> {
        let result_filter = Arc::new(InvalidResultFilter::new(garden.clone(), store.clone()));
        let to_data = Arc::new(ToDataConverter::new());
        let storer = Arc::new(DataStorer::new(store.clone()));
        let work_maker = Arc::new(WorkMaker::new(garden, store));

        result_filter.subscribe(to_data.clone())?;
        to_data.subscribe(storer.clone())?;
        storer.subscribe(work_maker.clone())?;

        Ok(Arc::new(Self {
            result_filter,
            to_data,
            storer,
            work_maker,
        }))
    }

    /// Ingress for a freshly supplied `Input` (an HTTP POST, typically).
    pub async fn input_received(&self, input: Input) -> Result<(), BusError> {
        self.to_data.receive(GardenMessage::Input(input)).await
    }

    /// Ingress for a worker's successful reply, arriving however the
    /// transport layer delivers it.
    pub async fn result_received(&self, result: WorkResult) -> Result<(), BusError> {
        self.result_filter.receive(GardenMessage::Result(result)).await
    }

    /// Ingress for a worker's failed reply.
    pub async fn error_received(&self, error: ResultError) -> Result<(), BusError> {
        self.result_filter.receive(GardenMessage::ResultError(error)).await
    }

    /// Connects `receiver` to receive every `Work` this gardener derives.
    /// A worker transport subscribes here to take dispatch responsibility.
    pub fn subscribe_work_sink(&self, receiver: Arc<dyn Receiver>) -> Result<Vec<MessageKind>, BusError> {
        self.work_maker.subscribe(receiver)
    }

    /// Connects `receiver` to observe every `Data` this gardener commits,
    /// whether sourced from an `Input` or a validated `Result`.
    pub fn subscribe_data_feed(&self, receiver: Arc<dyn Receiver>) -> Result<Vec<MessageKind>, BusError> {
        self.storer.subscribe(receiver)
    }
}

#[async_trait]
impl Receiver for Gardener {
    fn receiver_mapping(&self) -> HashSet<MessageKind> {
        [MessageKind::Result, MessageKind::ResultError].into_iter().collect()
    }

    async fn receive(&self, message: GardenMessage) -> Result<(), BusError> {
        self.result_filter.receive(message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_core::{hash_value, Data};
    use garden_store::InMemoryStore;
    use std::sync::Mutex;

    struct CollectingReceiver<T> {
        items: Arc<Mutex<Vec<T>>>,
        mapping: HashSet<MessageKind>,
        extract: fn(GardenMessage) -> Option<T>,
    }

    #[async_trait]
    impl<T: Send + Sync + 'static> Receiver for CollectingReceiver<T> {
        fn receiver_mapping(&self) -> HashSet<MessageKind> {
            self.mapping.clone()
        }

        async fn receive(&self, message: GardenMessage) -> Result<(), BusError> {
            if let Some(item) = (self.extract)(message) {
                self.items.lock().unwrap().push(item);
            }
            Ok(())
        }
    }

    fn work_sink() -> (Arc<CollectingReceiver<garden_core::Work>>, Arc<Mutex<Vec<garden_core::Work>>>) {
        let items = Arc::new(Mutex::new(Vec::new()));
        let receiver = Arc::new(CollectingReceiver {
            items: items.clone(),
            mapping: [MessageKind::Work].into_iter().collect(),
            extract: |m| match m {
                GardenMessage::Work(w) => Some(w),
                _ => None,
            },
        });
        (receiver, items)
    }

    fn data_feed() -> (Arc<CollectingReceiver<Data>>, Arc<Mutex<Vec<Data>>>) {
        let items = Arc::new(Mutex::new(Vec::new()));
        let receiver = Arc::new(CollectingReceiver {
            items: items.clone(),
            mapping: [MessageKind::Data].into_iter().collect(),
            extract: |m| match m {
                GardenMessage::Data(d) => Some(d),
                _ => None,
            },
        });
        (receiver, items)
    }

    #[tokio::test]
    async fn input_flows_through_to_storage_and_derives_no_work_without_a_recipe() {
        let garden = Arc::new(Garden::new());
        let store: Arc<dyn DataStore> = Arc::new(InMemoryStore::new());
        let gardener = Gardener::new(garden, store).unwrap();

        let (data_receiver, seen_data) = data_feed();
        gardener.subscribe_data_feed(data_receiver).unwrap();

        gardener
            .input_received(Input::new("joe", "flour", "1", "wheat"))
            .await
            .unwrap();
        assert_eq!(seen_data.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn input_satisfying_a_recipe_derives_work() {
        let mut garden = Garden::new();
        garden
            .add_path("cake", "1", vec![("flour".into(), "1".into())])
            .unwrap();
        let store: Arc<dyn DataStore> = Arc::new(InMemoryStore::new());
        let gardener = Gardener::new(Arc::new(garden), store).unwrap();

        let (work_receiver, seen_work) = work_sink();
        gardener.subscribe_work_sink(work_receiver).unwrap();

        gardener
            .input_received(Input::new("joe", "flour", "1", "wheat"))
            .await
            .unwrap();
        assert_eq!(seen_work.lock().unwrap().len(), 1);
        assert_eq!(seen_work.lock().unwrap()[0].name, "cake");
    }

    #[tokio::test]
    async fn valid_result_commits_and_invalid_result_is_dropped() {
        let mut garden = Garden::new();
        garden
            .add_path("cake", "1", vec![("flour".into(), "1".into())])
            .unwrap();
        let garden = Arc::new(garden);
        let store: Arc<dyn DataStore> = Arc::new(InMemoryStore::new());
        let gardener = Gardener::new(garden, store.clone()).unwrap();

        let (work_receiver, seen_work) = work_sink();
        gardener.subscribe_work_sink(work_receiver).unwrap();
        gardener
            .input_received(Input::new("joe", "flour", "1", "wheat"))
            .await
            .unwrap();
        let work = seen_work.lock().unwrap()[0].clone();

        let (data_receiver, seen_data) = data_feed();
        gardener.subscribe_data_feed(data_receiver).unwrap();

        let result = work.clone().into_result("baked:wheat");
        gardener.result_received(result).await.unwrap();
        assert_eq!(seen_data.lock().unwrap().len(), 1);
        assert_eq!(seen_data.lock().unwrap()[0].name, "cake");

        let stale_result = work.into_result("not-what-we-baked");
        let mut stale_result = stale_result;
        stale_result.inputs[0].hash = hash_value("a completely different flour");
        gardener.result_received(stale_result).await.unwrap();
        assert_eq!(seen_data.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn subscribing_as_a_receiver_routes_results_through_validation() {
        let mut garden = Garden::new();
        garden
            .add_path("cake", "1", vec![("flour".into(), "1".into())])
            .unwrap();
        let store: Arc<dyn DataStore> = Arc::new(InMemoryStore::new());
        let gardener = Gardener::new(Arc::new(garden), store).unwrap();

        let (work_receiver, seen_work) = work_sink();
        gardener.subscribe_work_sink(work_receiver).unwrap();
        gardener
            .input_received(Input::new("joe", "flour", "1", "wheat"))
            .await
            .unwrap();
        let work = seen_work.lock().unwrap()[0].clone();

        let gardener_as_receiver: Arc<dyn Receiver> = gardener.clone();
        assert!(gardener_as_receiver
            .receiver_mapping()
            .contains(&MessageKind::Result));
        gardener_as_receiver
            .receive(GardenMessage::Result(work.into_result("baked:wheat")))
            .await
            .unwrap();
    }
}
