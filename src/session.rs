use std::{net::SocketAddr, sync::Arc};

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::{Instrument, Level, debug, error, info, span, warn};

use crate::{
    protocol::{Command, CommandError, CrlfCodec, INVALID_SENSOR_REPLY},
    record::{SensorId, TelemetryRecord},
    state::TelemetryState,
};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
    #[error("malformed command: {0}")]
    Command(#[from] CommandError),
}

/// One client connection.
///
/// Reads a frame, runs it to completion, writes the reply if there is one and
/// goes back to reading. Ends on EOF, on a transport error or on a malformed
/// `LOG`/`GET`.
pub struct Session<S> {
    framed: Framed<S, CrlfCodec>,
    state: Arc<TelemetryState>,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, state: Arc<TelemetryState>) -> Self {
        Self {
            framed: Framed::new(stream, CrlfCodec::new()),
            state,
        }
    }

    pub async fn run(mut self) -> Result<(), SessionError> {
        while let Some(frame) = self.framed.next().await {
            let frame = frame?;
            info!("received {}", String::from_utf8_lossy(&frame));

            if let Some(reply) = self.dispatch(&frame).await? {
                self.framed.send(reply).await?;
            }
        }
        Ok(())
    }

    async fn dispatch(&self, frame: &[u8]) -> Result<Option<Bytes>, CommandError> {
        match Command::parse(frame)? {
            Command::Log(record) => {
                self.ingest(record).await;
                Ok(None)
            }
            Command::Get { sensor_id, count } => Ok(Some(self.query(&sensor_id, count).await)),
            Command::Unknown => {
                debug!("ignoring unrecognized command");
                Ok(None)
            }
        }
    }

    /// Never answers, storage failures only reach the log
    async fn ingest(&self, record: TelemetryRecord) {
        if self.state.registry.register(record.sensor_id).await {
            debug!("new sensor {}", record.sensor_id);
        }

        if let Err(e) = self.state.store.append(&record).await {
            error!("saving record for {}: {e}", record.sensor_id);
        }
    }

    async fn query(&self, sensor_id: &SensorId, count: i64) -> Bytes {
        if !self.state.registry.contains(sensor_id).await {
            return Bytes::from_static(INVALID_SENSOR_REPLY);
        }

        // non-positive counts read nothing
        let Ok(limit) = usize::try_from(count) else {
            return Bytes::new();
        };

        match self.state.store.read(sensor_id, limit).await {
            Ok(records) => records
                .iter()
                .map(TelemetryRecord::to_line)
                .collect::<String>()
                .into(),
            Err(e) => {
                error!("reading records for {sensor_id}: {e}");
                Bytes::new()
            }
        }
    }
}

/// Runs a session to its end inside a span for the peer
pub async fn serve_connection<S>(stream: S, peer: SocketAddr, state: Arc<TelemetryState>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let span = span!(Level::INFO, "Session", %peer);

    async move {
        debug!("connected");
        match Session::new(stream, state).run().await {
            Ok(()) => debug!("disconnected"),
            Err(e) => warn!("closing: {e}"),
        }
    }
    .instrument(span)
    .await
}
