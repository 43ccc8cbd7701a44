//! `GardenerTransport`: the gardener's pool of connected worker sessions,
//! dispatching `Work` round-robin and re-emitting inbound `Result`/
//! `ResultError` commands onto the bus.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use garden_bus::{BusError, GardenMessage, MessageKind, Receiver, Source};
use garden_core::{ResultError, Work, WorkResult};
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::{mpsc, Mutex};

use crate::error::TransportError;
use crate::round_robin::RoundRobin;
use crate::wire::Command;
use crate::worker_transport::WorkerTransport;

pub struct GardenerTransport {
    sessions: Mutex<RoundRobin<Arc<WorkerTransport>>>,
    source: Source,
    next_id: AtomicU64,
}

impl GardenerTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(RoundRobin::new()),
            source: Source::new([MessageKind::Result, MessageKind::ResultError]),
            next_id: AtomicU64::new(0),
        })
    }

    pub fn subscribe(&self, receiver: Arc<dyn Receiver>) -> Result<Vec<MessageKind>, BusError> {
        self.source.subscribe(receiver)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Binds `addr` and accepts worker connections until the listener
    /// errors. Each accepted connection attaches as a session joining the
    /// round-robin pool; a background task re-emits every inbound
    /// `Result`/`ResultError` onto this transport's bus source.
    pub async fn listen(self: &Arc<Self>, addr: impl ToSocketAddrs) -> Result<(), TransportError> {
        let listener = TcpListener::bind(addr).await?;
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let pump = self.clone();
        tokio::spawn(async move { pump.pump_inbound(inbound_rx).await });

        loop {
            let (stream, peer) = listener.accept().await?;
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            log::info!("worker session {id} connected from {peer}");
            let session = WorkerTransport::spawn(id, stream, inbound_tx.clone());
            self.sessions.lock().await.add(session);
        }
    }

    /// Picks the next live session via round robin and forwards `work` to
    /// it. Detaches the session from the pool if the dispatch fails.
    /// Fails with [`TransportError::NoWorkerAvailable`] if the pool is
    /// empty (after pruning dead sessions it finds along the way).
    pub async fn dispatch(&self, work: Work) -> Result<(), TransportError> {
        let session = self
            .next_alive_session()
            .await
            .ok_or(TransportError::NoWorkerAvailable)?;

        let result = session.dispatch(work).await;
        if result.is_err() {
            self.sessions.lock().await.remove(&session);
        }
        result
    }

    async fn next_alive_session(&self) -> Option<Arc<WorkerTransport>> {
        let mut sessions = self.sessions.lock().await;
        loop {
            let candidate = sessions.next()?.clone();
            if candidate.is_alive() {
                return Some(candidate);
            }
            sessions.remove(&candidate);
        }
    }

    async fn pump_inbound(&self, mut inbound: mpsc::UnboundedReceiver<(u64, Command)>) {
        while let Some((id, command)) = inbound.recv().await {
            let message = match command {
                Command::ReceiveResult {
                    entity,
                    name,
                    version,
                    lineage,
                    value,
                    inputs,
                } => GardenMessage::Result(WorkResult {
                    entity,
                    name,
                    version,
                    lineage,
                    value,
                    inputs,
                }),
                Command::ReceiveError {
                    entity,
                    name,
                    version,
                    lineage,
                    error,
                    inputs,
                } => GardenMessage::ResultError(ResultError {
                    entity,
                    name,
                    version,
                    lineage,
                    error,
                    inputs,
                }),
                other => {
                    log::warn!("worker session {id} sent an unexpected command: {other:?}");
                    continue;
                }
            };
            if let Err(err) = self.source.emit(message).await {
                log::warn!("failed to deliver a worker result from session {id}: {err}");
            }
        }
    }
}

#[async_trait]
impl Receiver for GardenerTransport {
    fn receiver_mapping(&self) -> HashSet<MessageKind> {
        [MessageKind::Work].into_iter().collect()
    }

    async fn receive(&self, message: GardenMessage) -> Result<(), BusError> {
        match message {
            GardenMessage::Work(work) => self
                .dispatch(work)
                .await
                .map_err(|err| BusError::HandlerFailed(err.to_string())),
            other => panic!(
                "gardener transport received a message kind it never subscribed to: {:?}",
                other.kind()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_core::WorkInput;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::mpsc;

    fn sample_work() -> Work {
        Work::new(
            "joe",
            "cake",
            "1",
            "L",
            vec![WorkInput::new("flour", "1", "Lf", "wheat")],
        )
    }

    #[tokio::test]
    async fn dispatch_with_no_sessions_fails_with_no_worker_available() {
        let transport = GardenerTransport::new();
        let err = transport.dispatch(sample_work()).await.unwrap_err();
        assert!(matches!(err, TransportError::NoWorkerAvailable));
    }

    /// Attaches one session over a real loopback TCP pair (mirroring what
    /// `listen` would do for an accepted connection) and checks that a
    /// dispatched `Work` reaches the other end and its ack unblocks the
    /// dispatching call.
    #[tokio::test]
    async fn dispatch_round_trips_through_a_loopback_session() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = TcpStream::connect(addr).await.unwrap();
        let (server_stream, _peer) = listener.accept().await.unwrap();

        let transport = GardenerTransport::new();
        let (inbound_tx, _inbound_rx) = mpsc::unbounded_channel();
        let session = WorkerTransport::spawn(0, server_stream, inbound_tx);
        transport.sessions.lock().await.add(session);
        assert_eq!(transport.session_count().await, 1);

        let mut client_connection = crate::wire::WireConnection::new(client);
        let echo_ack = tokio::spawn(async move {
            let received = client_connection.recv().await.unwrap().unwrap();
            client_connection.send(&Command::Ack).await.unwrap();
            received
        });

        transport.dispatch(sample_work()).await.unwrap();
        let received = echo_ack.await.unwrap();
        let rebuilt: Work = received.try_into().unwrap();
        assert_eq!(rebuilt, sample_work());
    }

    #[tokio::test]
    async fn dispatch_detaches_a_session_that_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = TcpStream::connect(addr).await.unwrap();
        let (server_stream, _peer) = listener.accept().await.unwrap();
        drop(client); // closes the session before it can ack

        let transport = GardenerTransport::new();
        let (inbound_tx, _inbound_rx) = mpsc::unbounded_channel();
        let session = WorkerTransport::spawn(0, server_stream, inbound_tx);
        transport.sessions.lock().await.add(session);

        let err = transport.dispatch(sample_work()).await.unwrap_err();
        assert!(matches!(err, TransportError::Disconnected));
        assert_eq!(transport.session_count().await, 0);
    }
}
