//! TCP subscriber for the state the vision manager publishes

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use vision_shared::codec::FrameDecoder;
use vision_shared::{defaults, TransportError};

use crate::transport::interrupt::Interrupts;
use crate::transport::tcp::{connect, read_frame};
use crate::transport::traits::StateSubscriber;

/// Subscriber on the status port. Connects on the first spin.
pub struct TcpStateSubscriber {
    address: String,
    connect_timeout: Duration,
    interrupts: Interrupts,
    connection: Option<(TcpStream, FrameDecoder)>,
}

impl TcpStateSubscriber {
    pub fn new(address: impl Into<String>, interrupts: Interrupts) -> Self {
        Self {
            address: address.into(),
            connect_timeout: defaults::CONNECT_TIMEOUT,
            interrupts,
            connection: None,
        }
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    async fn spin(
        &mut self,
        timeout: Option<Duration>,
        check_preempt: bool,
    ) -> Result<Option<Bytes>, TransportError> {
        if self.connection.is_none() {
            let stream = connect(&self.address, self.connect_timeout).await?;
            self.connection = Some((stream, FrameDecoder::new()));
        }
        let Some((stream, decoder)) = self.connection.as_mut() else {
            return Err(TransportError::NotConnected(self.address.clone()));
        };

        let drained = drain_available(stream, decoder)?;
        if let Some(newest) = drained.newest {
            // A close seen in the same drain is reported by the next spin
            return Ok(Some(newest));
        }
        if drained.closed {
            return Err(TransportError::Closed);
        }

        let first = match self
            .interrupts
            .run(read_frame(stream, decoder), timeout, check_preempt)
            .await
        {
            Ok(frame) => frame,
            Err(TransportError::Timeout(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        // More messages may have arrived in the same read
        let drained = drain_available(stream, decoder)?;
        Ok(Some(drained.newest.unwrap_or(first)))
    }
}

#[async_trait]
impl StateSubscriber for TcpStateSubscriber {
    async fn spin_once(
        &mut self,
        timeout: Option<Duration>,
        check_preempt: bool,
    ) -> Result<Option<Bytes>, TransportError> {
        let result = self.spin(timeout, check_preempt).await;
        if let Err(TransportError::Io(_) | TransportError::Closed | TransportError::Codec(_)) =
            &result
        {
            self.connection = None;
        }
        result
    }

    fn endpoint(&self) -> &str {
        &self.address
    }

    async fn shutdown(&mut self) -> Result<(), TransportError> {
        if let Some((mut stream, _)) = self.connection.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }
}

/// Result of reading everything already buffered on the socket
struct Drained {
    newest: Option<Bytes>,
    /// The publisher closed the connection after the buffered bytes
    closed: bool,
}

/// Read whatever is already buffered without blocking and keep the newest
/// complete frame. Frames that arrived before a close are still returned.
fn drain_available(
    stream: &mut TcpStream,
    decoder: &mut FrameDecoder,
) -> Result<Drained, TransportError> {
    let mut read_buf = vec![0u8; 4096];
    let mut closed = false;

    loop {
        match stream.try_read(&mut read_buf) {
            Ok(0) => {
                closed = true;
                break;
            }
            Ok(n) => decoder.extend(&read_buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) => return Err(e.into()),
        }
    }

    let mut newest = None;
    while let Some(frame) = decoder.decode_next()? {
        newest = Some(frame);
    }
    Ok(Drained { newest, closed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use vision_shared::codec;

    #[tokio::test]
    async fn test_no_update_within_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut subscriber = TcpStateSubscriber::new(address, Interrupts::default());
        let state = subscriber
            .spin_once(Some(Duration::from_millis(100)), true)
            .await
            .unwrap();
        assert!(state.is_none());
    }

    #[tokio::test]
    async fn test_returns_newest_message() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut burst = Vec::new();
            for seq in 1..=3 {
                let payload = format!(r#"{{"seq":{seq}}}"#);
                burst.extend_from_slice(&codec::encode(payload.as_bytes()).unwrap());
            }
            socket.write_all(&burst).await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut subscriber = TcpStateSubscriber::new(address, Interrupts::default());
        let state = subscriber
            .spin_once(Some(Duration::from_secs(1)), true)
            .await
            .unwrap()
            .expect("state should be published");
        assert_eq!(&state[..], br#"{"seq":3}"#);
    }

    #[tokio::test]
    async fn test_closed_publisher_resets_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let mut subscriber = TcpStateSubscriber::new(address, Interrupts::default());
        let result = subscriber.spin_once(Some(Duration::from_secs(1)), true).await;
        assert!(matches!(result, Err(TransportError::Closed) | Err(TransportError::Io(_))));
        assert!(subscriber.connection.is_none());
    }

    #[tokio::test]
    async fn test_last_state_before_close_is_kept() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let publisher = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            for seq in 1..=2 {
                let payload = format!(r#"{{"seq":{seq}}}"#);
                socket
                    .write_all(&codec::encode(payload.as_bytes()).unwrap())
                    .await
                    .unwrap();
            }
        });

        let mut stream = TcpStream::connect(&address).await.unwrap();
        publisher.await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut decoder = FrameDecoder::new();
        let drained = drain_available(&mut stream, &mut decoder).unwrap();
        assert!(drained.closed);
        assert_eq!(drained.newest.as_deref(), Some(&br#"{"seq":2}"#[..]));
    }

    #[tokio::test]
    async fn test_close_reported_after_last_state() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket
                .write_all(&codec::encode(br#"{"seq":1}"#).unwrap())
                .await
                .unwrap();
        });

        let mut subscriber = TcpStateSubscriber::new(address, Interrupts::default());
        let state = subscriber
            .spin_once(Some(Duration::from_secs(1)), true)
            .await
            .unwrap();
        assert_eq!(state.as_deref(), Some(&br#"{"seq":1}"#[..]));

        let result = subscriber.spin_once(Some(Duration::from_secs(1)), true).await;
        assert!(matches!(result, Err(TransportError::Closed) | Err(TransportError::Io(_))));
        assert!(subscriber.connection.is_none());
    }
}
