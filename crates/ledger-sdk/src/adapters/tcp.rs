//! # TCP Transport
//!
//! Length-prefixed frames over plain TCP.
//!
//! ## Wire format
//!
//! ```text
//! [4 bytes: payload length (u32-le)] [N bytes: payload]
//! ```
//!
//! A node channel writes one request frame and reads one response frame per
//! call. The connection is opened lazily and dropped after any I/O error, so
//! the next call reconnects.
//!
//! A mirror stream writes one bincode [`TopicQuery`] frame, then reads
//! bincode [`TopicMessage`] frames until the mirror closes the connection.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{NodeAddress, TlsSettings, TopicMessage, TopicQuery, TransportError};
use crate::ports::{Channel, ChannelFactory, MessageStream, MirrorConnector};

/// Write `payload` as one frame.
async fn write_frame(
    stream: &mut TcpStream,
    payload: &[u8],
    max_frame_size: usize,
) -> Result<(), TransportError> {
    if payload.len() > max_frame_size {
        return Err(TransportError::FrameTooLarge {
            size: payload.len(),
            limit: max_frame_size,
        });
    }
    let len = u32::try_from(payload.len()).map_err(|_| TransportError::FrameTooLarge {
        size: payload.len(),
        limit: u32::MAX as usize,
    })?;
    stream.write_all(&len.to_le_bytes()).await.map_err(io_error)?;
    stream.write_all(payload).await.map_err(io_error)?;
    stream.flush().await.map_err(io_error)
}

/// Read one frame. `Ok(None)` on a clean EOF before the header.
async fn read_frame(
    stream: &mut TcpStream,
    max_frame_size: usize,
) -> Result<Option<Vec<u8>>, TransportError> {
    let mut header = [0u8; 4];
    if let Err(e) = stream.read_exact(&mut header).await {
        return match e.kind() {
            std::io::ErrorKind::UnexpectedEof => Ok(None),
            _ => Err(io_error(e)),
        };
    }

    let len = u32::from_le_bytes(header) as usize;
    if len > max_frame_size {
        return Err(TransportError::FrameTooLarge {
            size: len,
            limit: max_frame_size,
        });
    }

    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await.map_err(io_error)?;
    Ok(Some(payload))
}

fn io_error(e: std::io::Error) -> TransportError {
    TransportError::Io(e.to_string())
}

async fn connect(endpoint: &str) -> Result<TcpStream, TransportError> {
    TcpStream::connect(endpoint)
        .await
        .map_err(|e| TransportError::Connect {
            address: endpoint.to_string(),
            reason: e.to_string(),
        })
}

// =============================================================================
// Node channels
// =============================================================================

/// Opens [`TcpChannel`]s. Plaintext only.
#[derive(Debug, Clone, Copy)]
pub struct TcpChannelFactory {
    max_frame_size: usize,
}

impl TcpChannelFactory {
    /// Factory whose channels reject frames above `max_frame_size`.
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }
}

#[async_trait]
impl ChannelFactory for TcpChannelFactory {
    async fn open(
        &self,
        address: &NodeAddress,
        tls: &TlsSettings,
    ) -> Result<Arc<dyn Channel>, TransportError> {
        if tls.enabled {
            return Err(TransportError::TlsUnsupported);
        }
        Ok(Arc::new(TcpChannel::new(
            address.endpoint(tls),
            self.max_frame_size,
        )))
    }
}

/// One request in flight at a time over a lazily opened connection.
pub struct TcpChannel {
    endpoint: String,
    max_frame_size: usize,
    stream: Mutex<Option<TcpStream>>,
}

impl TcpChannel {
    /// Channel to `endpoint` (`host:port`). Connects on first send.
    pub fn new(endpoint: String, max_frame_size: usize) -> Self {
        Self {
            endpoint,
            max_frame_size,
            stream: Mutex::new(None),
        }
    }

    /// Remote endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn round_trip(
        &self,
        stream: &mut TcpStream,
        request: &[u8],
    ) -> Result<Vec<u8>, TransportError> {
        write_frame(stream, request, self.max_frame_size).await?;
        read_frame(stream, self.max_frame_size)
            .await?
            .ok_or(TransportError::Closed)
    }
}

#[async_trait]
impl Channel for TcpChannel {
    async fn send(&self, request: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let mut guard = self.stream.lock().await;
        let mut stream = match guard.take() {
            Some(stream) => stream,
            None => {
                debug!(endpoint = %self.endpoint, "Connecting");
                connect(&self.endpoint).await?
            }
        };

        let result = self.round_trip(&mut stream, &request).await;
        match &result {
            Ok(_) => *guard = Some(stream),
            Err(e) => warn!(endpoint = %self.endpoint, error = %e, "Dropping connection"),
        }
        result
    }

    async fn close(&self) {
        if let Some(mut stream) = self.stream.lock().await.take() {
            let _ = stream.shutdown().await;
        }
    }
}

// =============================================================================
// Mirror streams
// =============================================================================

/// Opens topic streams on a mirror over TCP.
#[derive(Debug, Clone, Copy)]
pub struct TcpMirrorConnector {
    max_frame_size: usize,
}

impl TcpMirrorConnector {
    /// Connector whose streams reject frames above `max_frame_size`.
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }
}

#[async_trait]
impl MirrorConnector for TcpMirrorConnector {
    async fn subscribe(
        &self,
        address: &str,
        query: &TopicQuery,
    ) -> Result<Box<dyn MessageStream>, TransportError> {
        let mut stream = connect(address).await?;
        let request = bincode::serialize(query).map_err(|e| TransportError::Io(e.to_string()))?;
        write_frame(&mut stream, &request, self.max_frame_size).await?;
        debug!(mirror = %address, topic = %query.topic_id, "Topic stream opened");
        Ok(Box::new(TcpMessageStream {
            stream: Some(stream),
            max_frame_size: self.max_frame_size,
        }))
    }
}

struct TcpMessageStream {
    stream: Option<TcpStream>,
    max_frame_size: usize,
}

#[async_trait]
impl MessageStream for TcpMessageStream {
    async fn next_message(&mut self) -> Option<Result<TopicMessage, TransportError>> {
        let stream = self.stream.as_mut()?;
        let item = match read_frame(stream, self.max_frame_size).await {
            Ok(Some(frame)) => bincode::deserialize::<TopicMessage>(&frame)
                .map_err(|e| TransportError::Io(format!("undecodable topic message: {e}"))),
            Ok(None) => {
                self.stream = None;
                return None;
            }
            Err(e) => Err(e),
        };
        if item.is_err() {
            self.stream = None;
        }
        Some(item)
    }
}
