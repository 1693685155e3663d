//! Telnet session driver: login handshake and command execution.

use std::fmt;
use std::time::{Duration, Instant};

use bytes::Bytes;
use log::log;
use secrecy::ExposeSecret;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use super::config::SessionConfig;
use super::login::{LoginAction, LoginHandshake};
use super::response::Response;
use super::Driver;
use crate::channel::{LineScanner, PromptPatterns, scan_until};
use crate::error::{DriverError, Error, Result, TransportError};
use crate::transport::TelnetTransport;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection yet, or the connection was lost to an error.
    Disconnected,

    /// Connected, running the login handshake.
    AwaitingPrompt,

    /// Logged in, ready for a command.
    Idle,

    /// A command is in flight.
    Executing,

    /// Closed by the caller.
    Closed,
}

impl SessionState {
    fn as_str(self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::AwaitingPrompt => "awaiting prompt",
            SessionState::Idle => "idle",
            SessionState::Executing => "executing",
            SessionState::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Telnet driver that logs in and executes commands on a remote shell.
///
/// Holds at most one connection and runs one operation at a time. Any
/// transport error drops the connection; the caller decides whether to
/// open a new one.
pub struct TelnetDriver<S = TcpStream> {
    /// Session configuration.
    config: SessionConfig,

    /// Compiled prompts.
    patterns: PromptPatterns,

    /// Telnet transport (None when disconnected).
    transport: Option<TelnetTransport<S>>,

    /// Current lifecycle state.
    state: SessionState,
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> TelnetDriver<S> {
    /// Create a disconnected driver, compiling the configured prompts.
    pub fn new(config: SessionConfig) -> Result<Self> {
        let patterns = config.prompts.compile()?;
        Ok(Self {
            config,
            patterns,
            transport: None,
            state: SessionState::Disconnected,
        })
    }

    /// Log in over an already connected stream.
    ///
    /// The read deadline is armed from the configured timeout as the stream
    /// is attached.
    pub async fn open_with(&mut self, stream: S) -> Result<()> {
        self.ensure_can_open()?;
        let transport = TelnetTransport::new(stream, self.config.transport.timeout);
        self.login(transport).await
    }

    /// Close the connection. Closing twice is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        self.state = SessionState::Closed;
        match self.transport.take() {
            Some(transport) => {
                log!(self.config.log_level(), "Closing connection");
                transport.close().await
            }
            None => Ok(()),
        }
    }

    /// Send a command and capture its output up to the next shell banner.
    ///
    /// The line sent is `command`, a space, then `args` joined by spaces.
    /// Bytes that arrived before the command was sent are discarded first.
    pub async fn execute(&mut self, command: &str, args: &[&str]) -> Result<Response> {
        self.expect_state(SessionState::Idle)?;

        let line = format!("{} {}", command, args.join(" "));
        let start = Instant::now();
        self.state = SessionState::Executing;

        match self.run_command(&line).await {
            Ok((raw_output, output)) => {
                self.state = SessionState::Idle;
                log!(
                    self.config.log_level(),
                    "Received data with size = {}",
                    output.len()
                );
                Ok(Response::new(line, output, raw_output, start.elapsed()))
            }
            Err(e) => Err(self.teardown(e)),
        }
    }

    /// Write raw bytes to the remote side.
    pub async fn write(&mut self, data: &[u8]) -> Result<usize> {
        let result = self.transport_mut()?.write(data).await;
        result.map_err(|e| self.teardown(e))
    }

    /// Read one application byte (Telnet commands filtered out).
    pub async fn read_byte(&mut self) -> Result<u8> {
        let result = self.transport_mut()?.read_byte().await;
        result.map_err(|e| self.teardown(e))
    }

    /// Read through the next `delimiter`, inclusive.
    pub async fn read_until(&mut self, delimiter: u8) -> Result<Bytes> {
        let transport = self.transport_mut()?;
        let mut scanner = LineScanner::with_capacity(delimiter, 256);
        let result = scanner.read_until(transport).await;
        result
            .map(|_| scanner.into_bytes())
            .map_err(|e| self.teardown(e))
    }

    /// Scan line fragments until `predicate` accepts one.
    ///
    /// Returns everything read, including the accepted fragment.
    pub async fn read_until_prompt<F>(&mut self, predicate: F) -> Result<Bytes>
    where
        F: FnMut(&[u8]) -> bool,
    {
        let delimiter = self.config.delimiter;
        let transport = self.transport_mut()?;
        let result = scan_until(transport, delimiter, predicate).await;
        result.map_err(|e| self.teardown(e))
    }

    /// Read until the shell banner and return the output before it, trimmed.
    pub async fn read_until_banner(&mut self) -> Result<Bytes> {
        self.transport_mut()?;
        let result = self.capture_banner().await;
        result.map(|(_, output)| output).map_err(|e| self.teardown(e))
    }

    /// Re-arm the read deadline to `timeout` from now.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.transport_mut()?.set_timeout(timeout);
        Ok(())
    }

    /// Received bytes not yet consumed by a read.
    pub fn buffered(&self) -> usize {
        self.transport.as_ref().map_or(0, |t| t.buffered())
    }

    /// Check if the driver holds a connection.
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Get the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the compiled prompts.
    pub fn patterns(&self) -> &PromptPatterns {
        &self.patterns
    }

    fn ensure_can_open(&self) -> Result<()> {
        if self.transport.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }
        Ok(())
    }

    async fn login(&mut self, transport: TelnetTransport<S>) -> Result<()> {
        self.transport = Some(transport);
        self.state = SessionState::AwaitingPrompt;

        log!(self.config.log_level(), "Waiting for the first banner");
        match self.wait_welcome().await {
            Ok(()) => {
                self.state = SessionState::Idle;
                Ok(())
            }
            Err(e) => Err(self.teardown(e)),
        }
    }

    /// Answer login prompts until the banner shows up.
    async fn wait_welcome(&mut self) -> Result<()> {
        let level = self.config.log_level();
        let transport = self.transport.as_mut().ok_or(DriverError::NotConnected)?;
        let mut handshake = LoginHandshake::new(&self.patterns, self.config.has_password());
        let mut scanner = LineScanner::new(self.config.delimiter);

        loop {
            let fragment = scanner.next_fragment(transport).await?;
            match handshake.advance(fragment) {
                LoginAction::SendUsername => {
                    log!(level, "Found username prompt");
                    transport.send_line(&self.config.username).await?;
                    scanner.consume_fragment();
                }
                LoginAction::SendPassword => {
                    log!(level, "Found password prompt");
                    let password = self
                        .config
                        .password
                        .as_ref()
                        .map(|p| p.expose_secret())
                        .unwrap_or_default();
                    transport.send_line(password).await?;
                    scanner.consume_fragment();
                }
                LoginAction::Done => {
                    log!(level, "Found banner, logged in");
                    return Ok(());
                }
                LoginAction::Continue => {}
            }
        }
    }

    async fn run_command(&mut self, line: &str) -> Result<(Bytes, Bytes)> {
        let level = self.config.log_level();
        let transport = self.transport.as_mut().ok_or(DriverError::NotConnected)?;

        let stale = transport.discard_buffered();
        if stale > 0 {
            log!(level, "Discarded {} stale bytes", stale);
        }

        log!(level, "Send command: {}", line);
        transport.send_line(line).await?;

        self.capture_banner().await
    }

    /// Returns the raw capture and the output with the banner stripped.
    async fn capture_banner(&mut self) -> Result<(Bytes, Bytes)> {
        let transport = self.transport.as_mut().ok_or(DriverError::NotConnected)?;
        let banner = &self.patterns.banner;
        let raw = scan_until(transport, self.config.delimiter, |fragment| {
            banner.is_match(fragment)
        })
        .await?;

        let output = Bytes::from(self.patterns.strip_banner(&raw).into_owned());
        Ok((raw, output))
    }

    fn transport_mut(&mut self) -> Result<&mut TelnetTransport<S>> {
        match self.transport.as_mut() {
            Some(transport) => Ok(transport),
            None if self.state == SessionState::Closed => Err(TransportError::Closed.into()),
            None => Err(DriverError::NotConnected.into()),
        }
    }

    fn expect_state(&mut self, expected: SessionState) -> Result<()> {
        self.transport_mut()?;
        if self.state != expected {
            return Err(DriverError::InvalidState {
                expected: expected.as_str(),
                actual: self.state.as_str(),
            }
            .into());
        }
        Ok(())
    }

    /// Drop the connection after a failed operation and hand the error back.
    fn teardown(&mut self, err: Error) -> Error {
        if self.transport.take().is_some() {
            log!(self.config.log_level(), "Connection dropped: {}", err);
            self.state = SessionState::Disconnected;
        }
        err
    }
}

impl Driver for TelnetDriver<TcpStream> {
    async fn open(&mut self) -> Result<()> {
        self.ensure_can_open()?;
        let transport = TelnetTransport::connect(&self.config.transport).await?;
        self.login(transport).await
    }

    async fn close(&mut self) -> Result<()> {
        TelnetDriver::close(self).await
    }

    async fn execute(&mut self, command: &str, args: &[&str]) -> Result<Response> {
        TelnetDriver::execute(self, command, args).await
    }

    fn is_open(&self) -> bool {
        TelnetDriver::is_open(self)
    }
}

impl<S> fmt::Debug for TelnetDriver<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelnetDriver")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("connected", &self.transport.is_some())
            .finish()
    }
}
