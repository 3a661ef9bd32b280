//! TCP request channel for the command and configuration ports

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};
use vision_shared::codec::{self, FrameDecoder};
use vision_shared::{defaults, Command, Response, TransportError};

use crate::transport::interrupt::Interrupts;
use crate::transport::traits::{RequestChannel, SendOptions};

/// An open connection and its partially decoded input
struct Connection {
    stream: TcpStream,
    decoder: FrameDecoder,
    last_used: Instant,
}

/// Request/response channel over a framed TCP connection
///
/// The connection is opened lazily on the first send and reused until it
/// fails, times out, or sits idle longer than the reuse timeout.
pub struct TcpRequestChannel {
    address: String,
    connect_timeout: Duration,
    reuse_timeout: Duration,
    interrupts: Interrupts,
    connection: Option<Connection>,
    waiting_reply: bool,
}

impl TcpRequestChannel {
    /// Create a channel for the given `host:port` address
    pub fn new(address: impl Into<String>, interrupts: Interrupts) -> Self {
        Self {
            address: address.into(),
            connect_timeout: defaults::CONNECT_TIMEOUT,
            reuse_timeout: defaults::RECONNECTION_TIMEOUT,
            interrupts,
            connection: None,
            waiting_reply: false,
        }
    }

    /// Override the connect and idle-reuse timeouts
    pub fn with_timeouts(mut self, connect_timeout: Duration, reuse_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.reuse_timeout = reuse_timeout;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Forget the connection so a late reply can never be read as the
    /// answer to a later command
    fn drop_connection(&mut self, reason: &str) {
        if self.connection.take().is_some() {
            warn!("Dropping connection to {}: {}", self.address, reason);
        }
        self.waiting_reply = false;
    }
}

#[async_trait]
impl RequestChannel for TcpRequestChannel {
    async fn send(&mut self, command: &Command, options: SendOptions) -> Result<(), TransportError> {
        if self.waiting_reply {
            return Err(TransportError::Busy(self.address.clone()));
        }

        let payload = command.to_vec().map_err(TransportError::Encode)?;
        let frame = codec::encode(&payload)?;

        if options.fire_and_forget {
            // Short-lived connection; whatever the peer answers is discarded
            let mut stream = connect(&self.address, self.connect_timeout).await?;
            self.interrupts
                .run(
                    async {
                        stream.write_all(&frame).await?;
                        Ok::<_, TransportError>(())
                    },
                    Some(options.timeout),
                    options.check_preempt,
                )
                .await?;
            if let Err(e) = stream.shutdown().await {
                debug!("Fire-and-forget connection to {} closed uncleanly: {}", self.address, e);
            }
            return Ok(());
        }

        if self
            .connection
            .as_ref()
            .is_some_and(|conn| conn.last_used.elapsed() > self.reuse_timeout)
        {
            debug!("Reopening idle connection to {}", self.address);
            self.connection = None;
        }

        if self.connection.is_none() {
            let stream = connect(&self.address, self.connect_timeout).await?;
            self.connection = Some(Connection {
                stream,
                decoder: FrameDecoder::new(),
                last_used: Instant::now(),
            });
        }

        let Some(conn) = self.connection.as_mut() else {
            return Err(TransportError::NotConnected(self.address.clone()));
        };

        let result = self
            .interrupts
            .run(
                async {
                    conn.stream.write_all(&frame).await?;
                    Ok::<_, TransportError>(())
                },
                Some(options.timeout),
                options.check_preempt,
            )
            .await;

        match result {
            Ok(()) => {
                conn.last_used = Instant::now();
                self.waiting_reply = true;
                Ok(())
            }
            Err(e) => {
                // A partially written frame leaves the stream unusable
                self.drop_connection(&e.to_string());
                Err(e)
            }
        }
    }

    async fn receive(
        &mut self,
        timeout: Duration,
        recv_json: bool,
        check_preempt: bool,
    ) -> Result<Response, TransportError> {
        if !self.waiting_reply {
            return Err(TransportError::NotWaiting);
        }

        let Some(conn) = self.connection.as_mut() else {
            self.waiting_reply = false;
            return Err(TransportError::NotConnected(self.address.clone()));
        };

        let result = self
            .interrupts
            .run(
                read_frame(&mut conn.stream, &mut conn.decoder),
                Some(timeout),
                check_preempt,
            )
            .await;

        match result {
            Ok(payload) => {
                conn.last_used = Instant::now();
                self.waiting_reply = false;
                if recv_json {
                    serde_json::from_slice(&payload)
                        .map(Response::Json)
                        .map_err(TransportError::MalformedReply)
                } else {
                    Ok(Response::Raw(payload))
                }
            }
            // The reply is still on its way; the caller may wait again
            Err(e @ (TransportError::Preempted(_) | TransportError::Destroyed)) => Err(e),
            Err(e) => {
                self.drop_connection(&e.to_string());
                Err(e)
            }
        }
    }

    fn is_waiting_reply(&self) -> bool {
        self.waiting_reply
    }

    fn endpoint(&self) -> &str {
        &self.address
    }

    async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.waiting_reply = false;
        if let Some(mut conn) = self.connection.take() {
            conn.stream.shutdown().await?;
        }
        Ok(())
    }
}

/// Open a TCP connection, bounded by `connect_timeout`
pub(crate) async fn connect(
    address: &str,
    connect_timeout: Duration,
) -> Result<TcpStream, TransportError> {
    match timeout(connect_timeout, TcpStream::connect(address)).await {
        Ok(Ok(stream)) => {
            stream.set_nodelay(true)?;
            Ok(stream)
        }
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(TransportError::Timeout(connect_timeout)),
    }
}

/// Read until one complete frame is available.
///
/// Cancel-safe: bytes already read stay in `decoder`.
pub(crate) async fn read_frame(
    stream: &mut TcpStream,
    decoder: &mut FrameDecoder,
) -> Result<Bytes, TransportError> {
    let mut read_buf = vec![0u8; 4096];

    loop {
        if let Some(frame) = decoder.decode_next()? {
            return Ok(frame);
        }

        let n = stream.read(&mut read_buf).await?;
        if n == 0 {
            return Err(TransportError::Closed);
        }
        decoder.extend(&read_buf[..n]);
    }
}
