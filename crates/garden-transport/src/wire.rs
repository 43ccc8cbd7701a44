//! The wire protocol between `GardenerTransport` and `WorkerTransport`:
//! length-framed `serde_json` command envelopes, each with an ack.

use futures_util::{SinkExt, StreamExt};
use garden_core::{ResultError, ResultInput, Work, WorkInput, WorkResult};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::error::TransportError;

/// One of the three typed wire commands, or the empty ack reply to any of
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum Command {
    DoWork {
        entity: String,
        name: String,
        version: String,
        lineage: String,
        inputs: Vec<WorkInput>,
    },
    ReceiveResult {
        entity: String,
        name: String,
        version: String,
        lineage: String,
        value: String,
        inputs: Vec<ResultInput>,
    },
    ReceiveError {
        entity: String,
        name: String,
        version: String,
        lineage: String,
        error: String,
        inputs: Vec<ResultInput>,
    },
    /// The empty-map ack for any of the three commands above.
    Ack,
}

impl From<Work> for Command {
    fn from(work: Work) -> Self {
        Command::DoWork {
            entity: work.entity,
            name: work.name,
            version: work.version,
            lineage: work.lineage,
            inputs: work.inputs,
        }
    }
}

impl From<WorkResult> for Command {
    fn from(result: WorkResult) -> Self {
        Command::ReceiveResult {
            entity: result.entity,
            name: result.name,
            version: result.version,
            lineage: result.lineage,
            value: result.value,
            inputs: result.inputs,
        }
    }
}

impl From<ResultError> for Command {
    fn from(error: ResultError) -> Self {
        Command::ReceiveError {
            entity: error.entity,
            name: error.name,
            version: error.version,
            lineage: error.lineage,
            error: error.error,
            inputs: error.inputs,
        }
    }
}

impl TryFrom<Command> for Work {
    type Error = TransportError;

    fn try_from(command: Command) -> Result<Self, Self::Error> {
        match command {
            Command::DoWork {
                entity,
                name,
                version,
                lineage,
                inputs,
            } => Ok(Work::new(entity, name, version, lineage, inputs)),
            other => Err(TransportError::UnexpectedCommand(format!("{other:?}"))),
        }
    }
}

/// One length-framed, `serde_json`-encoded connection carrying [`Command`]s
/// in both directions.
pub struct WireConnection<S> {
    framed: Framed<S, LengthDelimitedCodec>,
}

impl<S> WireConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            framed: Framed::new(stream, LengthDelimitedCodec::new()),
        }
    }

    pub async fn send(&mut self, command: &Command) -> Result<(), TransportError> {
        let bytes = serde_json::to_vec(command)?;
        self.framed.send(bytes.into()).await?;
        Ok(())
    }

    /// Reads the next command, or `None` if the peer closed the connection.
    pub async fn recv(&mut self) -> Result<Option<Command>, TransportError> {
        match self.framed.next().await {
            Some(frame) => {
                let frame = frame?;
                Ok(Some(serde_json::from_slice(&frame)?))
            }
            None => Ok(None),
        }
    }
}

impl<S> WireConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Splits the connection into an independent writer and reader, so a
    /// session can send `Work` while a background task concurrently pumps
    /// inbound `Result`/`ResultError` commands.
    pub fn split(self) -> (WireWriter<S>, WireReader<S>) {
        let (sink, stream) = self.framed.split();
        (WireWriter { sink }, WireReader { stream })
    }
}

pub struct WireWriter<S> {
    sink: futures_util::stream::SplitSink<Framed<S, LengthDelimitedCodec>, bytes::Bytes>,
}

impl<S> WireWriter<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub async fn send(&mut self, command: &Command) -> Result<(), TransportError> {
        let bytes = serde_json::to_vec(command)?;
        self.sink.send(bytes.into()).await?;
        Ok(())
    }
}

pub struct WireReader<S> {
    stream: futures_util::stream::SplitStream<Framed<S, LengthDelimitedCodec>>,
}

impl<S> WireReader<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub async fn recv(&mut self) -> Result<Option<Command>, TransportError> {
        match self.stream.next().await {
            Some(frame) => {
                let frame = frame?;
                Ok(Some(serde_json::from_slice(&frame)?))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_core::WorkInput;
    use tokio::io::duplex;

    #[tokio::test]
    async fn round_trips_do_work_over_a_duplex_stream() {
        let (client, server) = duplex(4096);
        let mut client = WireConnection::new(client);
        let mut server = WireConnection::new(server);

        let work = Work::new(
            "joe",
            "cake",
            "1",
            "L",
            vec![WorkInput::new("flour", "1", "Lf", "wheat")],
        );
        client.send(&Command::from(work.clone())).await.unwrap();
        let received = server.recv().await.unwrap().unwrap();
        let rebuilt: Work = received.try_into().unwrap();
        assert_eq!(rebuilt, work);

        server.send(&Command::Ack).await.unwrap();
        let ack = client.recv().await.unwrap().unwrap();
        assert!(matches!(ack, Command::Ack));
    }
}
