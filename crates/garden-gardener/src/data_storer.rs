//! `DataStorer`: persists `Data`, emitting it onward only when the store
//! reports the value actually changed. Downstream stages (and any external
//! spectator) see a fact exactly once per distinct value at a key.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use garden_bus::{BusError, GardenMessage, MessageKind, Receiver, Source};
use garden_store::DataStore;

pub struct DataStorer {
    store: Arc<dyn DataStore>,
    source: Source,
}

impl DataStorer {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self {
            store,
            source: Source::new([MessageKind::Data]),
        }
    }

    pub fn subscribe(&self, receiver: Arc<dyn Receiver>) -> Result<Vec<MessageKind>, BusError> {
        self.source.subscribe(receiver)
    }
}

#[async_trait]
impl Receiver for DataStorer {
    fn receiver_mapping(&self) -> HashSet<MessageKind> {
        [MessageKind::Data].into_iter().collect()
    }

    async fn receive(&self, message: GardenMessage) -> Result<(), BusError> {
        let data = match message {
            GardenMessage::Data(data) => data,
            other => panic!("data storer received a message kind it never subscribed to: {:?}", other.kind()),
        };

        let outcome = self
            .store
            .put(data.clone())
            .await
            .map_err(|err| BusError::HandlerFailed(err.to_string()))?;

        if outcome.changed {
            self.source.emit(GardenMessage::Data(data)).await
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_core::Data;
    use garden_store::InMemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CollectingReceiver {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Receiver for CollectingReceiver {
        fn receiver_mapping(&self) -> HashSet<MessageKind> {
            [MessageKind::Data].into_iter().collect()
        }

        async fn receive(&self, _message: GardenMessage) -> Result<(), BusError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn data(value: &str) -> GardenMessage {
        GardenMessage::Data(Data {
            entity: "joe".into(),
            name: "flour".into(),
            version: "1".into(),
            lineage: "L".into(),
            value: value.into(),
        })
    }

    #[tokio::test]
    async fn first_write_emits_downstream() {
        let storer = DataStorer::new(Arc::new(InMemoryStore::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        storer.subscribe(Arc::new(CollectingReceiver { calls: calls.clone() })).unwrap();

        storer.receive(data("wheat")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unchanged_rewrite_does_not_emit() {
        let storer = DataStorer::new(Arc::new(InMemoryStore::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        storer.subscribe(Arc::new(CollectingReceiver { calls: calls.clone() })).unwrap();

        storer.receive(data("wheat")).await.unwrap();
        storer.receive(data("wheat")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn changed_rewrite_emits_again() {
        let storer = DataStorer::new(Arc::new(InMemoryStore::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        storer.subscribe(Arc::new(CollectingReceiver { calls: calls.clone() })).unwrap();

        storer.receive(data("wheat")).await.unwrap();
        storer.receive(data("rye")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
