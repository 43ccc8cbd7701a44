//! `WorkerTransport`: the gardener-side handle for one connected worker
//! session — the remote worker, exposed locally as something the gardener
//! can dispatch `Work` to as if it were local.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use garden_core::Work;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::error::TransportError;
use crate::wire::{Command, WireConnection, WireWriter};

/// One duplex session to a connected worker. Sends `Work`, awaits the ack,
/// and forwards inbound `ReceiveResult`/`ReceiveError` commands onto
/// `inbound` for the owning `GardenerTransport` to pick up.
pub struct WorkerTransport {
    id: u64,
    writer: Mutex<WireWriter<TcpStream>>,
    pending_ack: Mutex<Option<oneshot::Sender<()>>>,
    alive: AtomicBool,
}

impl WorkerTransport {
    /// Splits `stream` into a writer kept on this handle and a reader
    /// pumped by a background task. `Ack` commands resolve the dispatch
    /// that is currently awaiting one; every other command is forwarded to
    /// `inbound`. Marks the session dead when the peer disconnects.
    pub fn spawn(id: u64, stream: TcpStream, inbound: mpsc::UnboundedSender<(u64, Command)>) -> Arc<Self> {
        let connection = WireConnection::new(stream);
        let (writer, mut reader) = connection.split();

        let transport = Arc::new(Self {
            id,
            writer: Mutex::new(writer),
            pending_ack: Mutex::new(None),
            alive: AtomicBool::new(true),
        });

        let pump_transport = transport.clone();
        tokio::spawn(async move {
            loop {
                match reader.recv().await {
                    Ok(Some(Command::Ack)) => {
                        if let Some(tx) = pump_transport.pending_ack.lock().await.take() {
                            let _ = tx.send(());
                        }
                    }
                    Ok(Some(command)) => {
                        if inbound.send((id, command)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        log::info!("worker session {id} disconnected");
                        break;
                    }
                    Err(err) => {
                        log::warn!("worker session {id} read error: {err}");
                        break;
                    }
                }
            }
            pump_transport.alive.store(false, Ordering::SeqCst);
        });

        transport
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Sends `work` as a `DoWork` command and awaits its ack. Does not wait
    /// for the eventual `Result`/`ResultError` — those arrive later over
    /// the background pump and are delivered via `inbound`.
    pub async fn dispatch(&self, work: Work) -> Result<(), TransportError> {
        let (tx, rx) = oneshot::channel();
        *self.pending_ack.lock().await = Some(tx);

        {
            let mut writer = self.writer.lock().await;
            writer.send(&Command::from(work)).await?;
        }

        rx.await.map_err(|_| TransportError::Disconnected)
    }
}

impl PartialEq for WorkerTransport {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
