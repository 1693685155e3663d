//! Telnet transport implementation over any tokio byte stream.

use std::time::Duration;

use log::debug;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufWriter, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::time::Instant;

use super::config::TelnetConfig;
use crate::channel::{ByteSource, IacFilter};
use crate::error::{Result, TransportError};

/// Outbound line terminator.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Connected Telnet stream with a filtered reader and a buffered writer.
///
/// The read deadline is armed once when the transport is created and is not
/// refreshed by individual reads; every read after it passes fails with
/// [`TransportError::Timeout`].
///
/// Unlike a plain buffered socket reader, bytes already buffered are not
/// handed out once the deadline has passed.
pub struct TelnetTransport<S> {
    /// Reader that strips IAC sequences.
    reader: IacFilter<ReadHalf<S>>,

    /// Writer for credentials and commands.
    writer: BufWriter<WriteHalf<S>>,

    /// Instant after which reads fail.
    deadline: Instant,

    /// Timeout the deadline was armed with.
    timeout: Duration,
}

impl TelnetTransport<TcpStream> {
    /// Open a TCP connection to the configured host.
    pub async fn connect(config: &TelnetConfig) -> Result<Self> {
        debug!("Trying connect to {}", config.socket_addr());

        let stream = tokio::time::timeout(
            config.timeout,
            TcpStream::connect((config.host.as_str(), config.port)),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(|source| TransportError::ConnectionFailed {
            host: config.host.clone(),
            port: config.port,
            source,
        })?;

        Ok(Self::new(stream, config.timeout))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> TelnetTransport<S> {
    /// Wrap an already connected stream and arm the read deadline.
    pub fn new(stream: S, timeout: Duration) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: IacFilter::new(read_half),
            writer: BufWriter::new(write_half),
            deadline: Instant::now() + timeout,
            timeout,
        }
    }

    /// Read the next application byte, bounded by the read deadline.
    pub async fn read_byte(&mut self) -> Result<u8> {
        let timeout = self.timeout;
        // Already-buffered data must not outlive the deadline either.
        if Instant::now() >= self.deadline {
            return Err(TransportError::Timeout(timeout).into());
        }
        let b = tokio::time::timeout_at(self.deadline, self.reader.read_byte())
            .await
            .map_err(|_| TransportError::Timeout(timeout))??;
        Ok(b)
    }

    /// Write raw bytes and flush them.
    pub async fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.writer.write_all(data).await?;
        self.writer.flush().await?;
        Ok(data.len())
    }

    /// Write `line` followed by the line terminator.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let mut data = Vec::with_capacity(line.len() + LINE_TERMINATOR.len());
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(LINE_TERMINATOR.as_bytes());
        self.write(&data).await?;
        Ok(())
    }

    /// Number of received bytes not yet consumed.
    pub fn buffered(&self) -> usize {
        self.reader.buffered()
    }

    /// Drop every received byte not yet consumed.
    pub fn discard_buffered(&mut self) -> usize {
        self.reader.discard_buffered()
    }

    /// Re-arm the read deadline to `timeout` from now.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
        self.deadline = Instant::now() + timeout;
    }

    /// Get the timeout the read deadline was armed with.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Flush and shut down the write side, then drop the stream.
    pub async fn close(mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> ByteSource for TelnetTransport<S> {
    async fn read_byte(&mut self) -> Result<u8> {
        TelnetTransport::read_byte(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::filter::{DO, IAC, SB, SE};
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_filtered_read_and_raw_write() {
        let (client, mut server) = tokio::io::duplex(256);
        let mut transport = TelnetTransport::new(client, Duration::from_secs(5));

        server.write_all(&[IAC, DO, 1, b'o', IAC, SB, 24, 1, IAC, SE, b'k']).await.unwrap();
        assert_eq!(transport.read_byte().await.unwrap(), b'o');
        assert_eq!(transport.read_byte().await.unwrap(), b'k');

        transport.send_line("whoami").await.unwrap();
        let mut buf = [0u8; 8];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"whoami\r\n");
    }

    #[tokio::test]
    async fn test_read_deadline() {
        let (client, _server) = tokio::io::duplex(64);
        let mut transport = TelnetTransport::new(client, Duration::from_millis(50));

        let err = transport.read_byte().await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_deadline_not_refreshed_by_reads() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut transport = TelnetTransport::new(client, Duration::from_millis(100));

        server.write_all(b"a").await.unwrap();
        assert_eq!(transport.read_byte().await.unwrap(), b'a');
        tokio::time::sleep(Duration::from_millis(150)).await;
        server.write_all(b"b").await.unwrap();
        // Data is available, but the deadline armed at creation has passed
        let err = transport.read_byte().await.unwrap_err();
        assert!(err.is_timeout());

        transport.set_timeout(Duration::from_secs(5));
        assert_eq!(transport.read_byte().await.unwrap(), b'b');
    }

    #[tokio::test]
    async fn test_timeout_inside_negotiation_then_rearm() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut transport = TelnetTransport::new(client, Duration::from_millis(50));

        server.write_all(&[IAC]).await.unwrap();
        let err = transport.read_byte().await.unwrap_err();
        assert!(err.is_timeout());

        transport.set_timeout(Duration::from_secs(5));
        server.write_all(&[DO, 1, b'x']).await.unwrap();
        assert_eq!(transport.read_byte().await.unwrap(), b'x');
    }

    #[tokio::test]
    async fn test_eof_is_io_error() {
        let (client, server) = tokio::io::duplex(64);
        let mut transport = TelnetTransport::new(client, Duration::from_secs(5));
        drop(server);

        let err = transport.read_byte().await.unwrap_err();
        assert!(err.is_eof());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut config = TelnetConfig::new("127.0.0.1");
        config.port = port;
        let err = TelnetTransport::connect(&config).await.err().unwrap();
        assert!(matches!(
            err,
            crate::Error::Transport(TransportError::ConnectionFailed { port: p, .. }) if p == port
        ));
    }
}
