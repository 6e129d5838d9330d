use std::{io, net::SocketAddr, sync::Arc};

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::warn;

use crate::{session, state::TelemetryState};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },
}

/// Accepts connections forever, one session task each
pub struct Listener {
    listener: TcpListener,
    state: Arc<TelemetryState>,
}

impl Listener {
    pub async fn bind(addr: SocketAddr, state: Arc<TelemetryState>) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Never returns. A failed accept is logged and the next one starts right away.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    tokio::spawn(session::serve_connection(stream, peer, self.state.clone()));
                }
                Err(e) => warn!("accept failed: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpStream,
    };

    use super::*;
    use crate::{protocol::INVALID_SENSOR_REPLY, store::SensorLogStore};

    async fn start(dir: &tempfile::TempDir) -> SocketAddr {
        let state = TelemetryState::new(SensorLogStore::new(dir.path()));
        let listener = Listener::bind("127.0.0.1:0".parse().unwrap(), state)
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(listener.run());
        addr
    }

    async fn read_exactly(stream: &mut TcpStream, len: usize) -> String {
        let mut buf = vec![0u8; len];
        stream.read_exact(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_log_and_get_over_tcp() {
        let dir = tempfile::tempdir().unwrap();
        let addr = start(&dir).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"LOG|S1|2024-01-01T12:00:00|23.5\r\n")
            .await
            .unwrap();
        stream.write_all(b"GET|S1|1\r\n").await.unwrap();

        let expected = "Sensor: S1, Tempo: 2024-01-01T12:00:00, Valor: 23.5\n";
        assert_eq!(read_exactly(&mut stream, expected.len()).await, expected);

        stream.write_all(b"GET|UNKNOWN|5\r\n").await.unwrap();
        assert_eq!(
            read_exactly(&mut stream, INVALID_SENSOR_REPLY.len()).await.as_bytes(),
            INVALID_SENSOR_REPLY
        );
    }

    #[tokio::test]
    async fn test_registry_is_shared_between_connections() {
        let dir = tempfile::tempdir().unwrap();
        let addr = start(&dir).await;

        let mut writer = TcpStream::connect(addr).await.unwrap();
        writer
            .write_all(b"LOG|shared|2024-02-01T06:00:00|9.75\r\nGET|shared|1\r\n")
            .await
            .unwrap();
        let expected = "Sensor: shared, Tempo: 2024-02-01T06:00:00, Valor: 9.75\n";
        assert_eq!(read_exactly(&mut writer, expected.len()).await, expected);

        let mut reader = TcpStream::connect(addr).await.unwrap();
        reader.write_all(b"GET|shared|10\r\n").await.unwrap();
        assert_eq!(read_exactly(&mut reader, expected.len()).await, expected);
    }

    #[tokio::test]
    async fn test_malformed_command_only_closes_its_connection() {
        let dir = tempfile::tempdir().unwrap();
        let addr = start(&dir).await;

        let mut bad = TcpStream::connect(addr).await.unwrap();
        bad.write_all(b"GET|S1|lots\r\n").await.unwrap();
        let mut rest = Vec::new();
        bad.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());

        let mut good = TcpStream::connect(addr).await.unwrap();
        good.write_all(b"GET|S1|1\r\n").await.unwrap();
        assert_eq!(
            read_exactly(&mut good, INVALID_SENSOR_REPLY.len()).await.as_bytes(),
            INVALID_SENSOR_REPLY
        );
    }

    #[tokio::test]
    async fn test_bind_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = TelemetryState::new(SensorLogStore::new(dir.path()));
        let first = Listener::bind("127.0.0.1:0".parse().unwrap(), state.clone())
            .await
            .unwrap();
        let taken = first.local_addr().unwrap();

        let err = Listener::bind(taken, state).await.err().unwrap();
        assert!(matches!(err, ServerError::Bind { addr, .. } if addr == taken));
    }
}
