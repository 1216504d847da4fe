//! Byte-stream channel to the game server

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, info};

use jumper_rl_core::{Channel, Observation, RLError, Result};

use crate::wire::parse_reply;

/// Channel over a TCP connection
pub type TcpChannel = StreamChannel<TcpStream>;

/// Channel speaking the game protocol over any async byte stream
///
/// Actions go out as raw UTF-8 without a terminator; replies are read until a
/// whole dictionary has arrived.
#[derive(Debug)]
pub struct StreamChannel<S> {
    stream: S,
    buffer: Vec<u8>,
}

impl<S> StreamChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already connected stream
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: Vec::with_capacity(1024),
        }
    }

    async fn read_reply(&mut self) -> Result<Observation> {
        let mut chunk = [0u8; 1024];
        loop {
            if let Some((observation, used)) = self.decode_buffered()? {
                self.buffer.drain(..used);
                return Ok(observation);
            }

            let read = self.stream.read(&mut chunk).await?;
            if read == 0 {
                return Err(RLError::Environment(
                    "environment closed the connection".to_owned(),
                ));
            }
            self.buffer.extend_from_slice(&chunk[..read]);
        }
    }

    fn decode_buffered(&self) -> Result<Option<(Observation, usize)>> {
        let text = match std::str::from_utf8(&self.buffer) {
            Ok(text) => text,
            // A multi-byte character may be split across reads
            Err(e) if e.error_len().is_none() => {
                std::str::from_utf8(&self.buffer[..e.valid_up_to()]).unwrap_or_default()
            }
            Err(e) => {
                return Err(RLError::Environment(format!("reply is not UTF-8: {e}")));
            }
        };
        parse_reply(text)
    }
}

impl TcpChannel {
    /// Connect to the game server at `addr`
    pub async fn connect(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        let target = addr.to_string();
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| RLError::Connection(format!("{target}: {e}")))?;
        stream.set_nodelay(true)?;
        info!(peer = ?stream.peer_addr().ok(), "connected to environment");
        Ok(Self::new(stream))
    }
}

#[async_trait]
impl<S> Channel for StreamChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn exchange(&mut self, action: &str) -> Result<Observation> {
        if !action.is_empty() {
            self.stream.write_all(action.as_bytes()).await?;
            self.stream.flush().await?;
        }
        let observation = self.read_reply().await?;
        debug!(action, state = %observation.state, reward = %observation.reward, "exchange");
        Ok(observation)
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jumper_rl_core::Reward;
    use tokio::net::TcpListener;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_exchange_writes_action_and_reads_reply() {
        let mock = Builder::new()
            .write(b"jump")
            .read(b"{'estado': '0b0000110', ")
            .read(b"'recompensa': -1}")
            .build();
        let mut channel = StreamChannel::new(mock);

        let observation = channel.exchange("jump").await.unwrap();
        assert_eq!(observation, Observation::new("0b0000110", -1.0));
    }

    #[tokio::test]
    async fn test_initial_request_sends_nothing() {
        let mock = Builder::new()
            .read(b"{'estado': '0b0000000', 'recompensa': 0}")
            .build();
        let mut channel = StreamChannel::new(mock);

        let observation = channel.initial().await.unwrap();
        assert_eq!(observation.reward, Reward(0.0));
    }

    #[tokio::test]
    async fn test_back_to_back_replies_are_split() {
        let mock = Builder::new()
            .write(b"left")
            .read(b"{'estado': '0b1', 'recompensa': 1}{'estado': '0b10', 'recompensa': 2}")
            .write(b"right")
            .build();
        let mut channel = StreamChannel::new(mock);

        assert_eq!(channel.exchange("left").await.unwrap().state.as_str(), "0b1");
        assert_eq!(channel.exchange("right").await.unwrap().state.as_str(), "0b10");
    }

    #[tokio::test]
    async fn test_closed_stream_is_an_environment_error() {
        let mock = Builder::new().write(b"left").read(b"{'estado'").build();
        let mut channel = StreamChannel::new(mock);
        assert!(matches!(
            channel.exchange("left").await,
            Err(RLError::Environment(_))
        ));
    }

    #[tokio::test]
    async fn test_tcp_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket
                .write_all(b"{'estado': '0b0000100', 'recompensa': -14}")
                .await
                .unwrap();
            let mut action = [0u8; 16];
            let n = socket.read(&mut action).await.unwrap();
            assert_eq!(&action[..n], b"right");
            socket
                .write_all(b"{\"estado\": \"0b0001000\", \"recompensa\": -1}")
                .await
                .unwrap();
        });

        let mut channel = TcpChannel::connect(addr).await.unwrap();
        let initial = channel.initial().await.unwrap();
        assert_eq!(initial, Observation::new("0b0000100", -14.0));
        let next = channel.exchange("right").await.unwrap();
        assert_eq!(next, Observation::new("0b0001000", -1.0));

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_failure_is_a_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        assert!(matches!(
            TcpChannel::connect(addr).await,
            Err(RLError::Connection(_))
        ));

        let target = addr.to_string();
        match TcpChannel::connect(target.as_str()).await {
            Err(RLError::Connection(message)) => {
                assert!(message.starts_with(&format!("{target}: ")), "{message}");
            }
            other => panic!("expected a connection error, got {other:?}"),
        }
    }
}
