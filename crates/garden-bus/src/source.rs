use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use futures_util::future::try_join_all;

use crate::error::BusError;
use crate::message::{GardenMessage, MessageKind};
use crate::receiver::Receiver;

/// A typed publisher: advertises the set of message kinds it may emit, and
/// fans emitted messages out to every subscriber that connected for that
/// kind.
///
/// `subscribe`/`emit` serialise against each other through the internal
/// lock; the lock is never held across an `.await`.
pub struct Source {
    provided: HashSet<MessageKind>,
    handlers: Mutex<HashMap<MessageKind, Vec<Arc<dyn Receiver>>>>,
}

impl Source {
    pub fn new(provided: impl IntoIterator<Item = MessageKind>) -> Self {
        Self {
            provided: provided.into_iter().collect(),
            handlers: Mutex::new(HashMap::new()),
        }
    }

    /// Connects `receiver` for every message kind in the intersection of
    /// this source's provided kinds and the receiver's mapping. Fails with
    /// [`BusError::NothingToOffer`] if the intersection is empty; this is a
    /// wiring error, fatal at subscription time.
    pub fn subscribe(&self, receiver: Arc<dyn Receiver>) -> Result<Vec<MessageKind>, BusError> {
        let mapping = receiver.receiver_mapping();
        let common: Vec<MessageKind> = self.provided.intersection(&mapping).copied().collect();
        if common.is_empty() {
            return Err(BusError::NothingToOffer);
        }

        let mut handlers = self.handlers.lock().expect("bus handler table poisoned");
        for kind in &common {
            handlers.entry(*kind).or_default().push(receiver.clone());
        }
        Ok(common)
    }

    /// Invokes every handler registered for `message`'s kind, concurrently,
    /// and awaits all of them. Fails fast: on the first handler error,
    /// `try_join_all` returns immediately and drops the remaining
    /// not-yet-resolved handler futures, matching the "first-error
    /// surfaced, remainder cancelled" alternative the design notes prefer.
    ///
    /// Emitting a kind this source never advertised is a programmer error.
    pub async fn emit(&self, message: GardenMessage) -> Result<(), BusError> {
        let kind = message.kind();
        assert!(
            self.provided.contains(&kind),
            "source emitted {kind:?}, which it never advertised providing"
        );

        let handlers = {
            let guard = self.handlers.lock().expect("bus handler table poisoned");
            guard.get(&kind).cloned().unwrap_or_default()
        };

        let futures = handlers.iter().map(|handler| handler.receive(message.clone()));
        try_join_all(futures).await?;
        Ok(())
    }
}
