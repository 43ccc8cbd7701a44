//! The worker process's client loop: connects out to a gardener's
//! listening endpoint, executes inbound `DoWork`, and ships the resulting
//! `Result`/`ResultError` back. Reconnects with exponential backoff on
//! disconnect.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use garden_bus::{BusError, GardenMessage, MessageKind, Receiver};
use garden_core::Work;
use garden_worker::Worker;
use rand::Rng;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::error::TransportError;
use crate::wire::{Command, WireConnection, WireWriter};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);
const BACKOFF_FACTOR: u32 = 2;
const JITTER_FRACTION: f64 = 0.2;

/// Forwards a worker's emitted `Result`/`ResultError` onto whichever
/// connection is currently live. Failures are logged, not propagated: a
/// dropped connection loses the in-flight result the same way the spec's
/// at-least-once boundary already accepts a worker dying before emitting.
struct WireResultSink {
    writer: Arc<Mutex<Option<WireWriter<TcpStream>>>>,
}

#[async_trait]
impl Receiver for WireResultSink {
    fn receiver_mapping(&self) -> HashSet<MessageKind> {
        [MessageKind::Result, MessageKind::ResultError].into_iter().collect()
    }

    async fn receive(&self, message: GardenMessage) -> Result<(), BusError> {
        let command = match message {
            GardenMessage::Result(result) => Command::from(result),
            GardenMessage::ResultError(error) => Command::from(error),
            other => panic!("result sink received unexpected message kind: {:?}", other.kind()),
        };

        let mut slot = self.writer.lock().await;
        if let Some(writer) = slot.as_mut() {
            if let Err(err) = writer.send(&command).await {
                log::warn!("failed to ship a worker result to the gardener: {err}");
            }
        } else {
            log::warn!("dropping a worker result: no connection to the gardener is live");
        }
        Ok(())
    }
}

/// Connects to a gardener endpoint and runs `worker` against every `Work`
/// it receives, for as long as the process runs.
pub struct WorkerClient {
    endpoint: String,
    current_writer: Arc<Mutex<Option<WireWriter<TcpStream>>>>,
}

impl WorkerClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            current_writer: Arc::new(Mutex::new(None)),
        }
    }

    /// Runs the reconnect loop forever. `worker` is subscribed once, for
    /// the lifetime of the client, to ship its results back over whichever
    /// connection happens to be live.
    pub async fn run(&self, worker: Arc<Worker>) -> Result<(), BusError> {
        worker.subscribe(Arc::new(WireResultSink {
            writer: self.current_writer.clone(),
        }))?;

        let mut backoff = INITIAL_BACKOFF;
        loop {
            match self.run_once(&worker).await {
                Ok(()) => {
                    log::info!("connection to gardener at {} closed; reconnecting", self.endpoint);
                    backoff = INITIAL_BACKOFF;
                }
                Err(err) => {
                    log::warn!("connection to gardener at {} failed: {err}", self.endpoint);
                }
            }
            *self.current_writer.lock().await = None;
            tokio::time::sleep(jittered(backoff)).await;
            backoff = (backoff * BACKOFF_FACTOR).min(MAX_BACKOFF);
        }
    }

    async fn run_once(&self, worker: &Arc<Worker>) -> Result<(), TransportError> {
        let stream = TcpStream::connect(&self.endpoint).await?;
        log::info!("connected to gardener at {}", self.endpoint);
        let connection = WireConnection::new(stream);
        let (writer, mut reader) = connection.split();
        *self.current_writer.lock().await = Some(writer);

        loop {
            match reader.recv().await? {
                None => return Ok(()),
                Some(Command::DoWork {
                    entity,
                    name,
                    version,
                    lineage,
                    inputs,
                }) => {
                    self.ack().await?;
                    let work = Work::new(entity, name, version, lineage, inputs);
                    if let Err(err) = worker.receive_work(work).await {
                        log::warn!("worker failed to process dispatched work: {err}");
                    }
                }
                Some(other) => {
                    log::warn!("worker received an unexpected command: {other:?}");
                }
            }
        }
    }

    async fn ack(&self) -> Result<(), TransportError> {
        let mut slot = self.current_writer.lock().await;
        let writer = slot.as_mut().expect("connection established before acking");
        writer.send(&Command::Ack).await
    }
}

fn jittered(base: Duration) -> Duration {
    let jitter_range = base.as_secs_f64() * JITTER_FRACTION;
    let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
    Duration::from_secs_f64((base.as_secs_f64() + jitter).max(0.0))
}
