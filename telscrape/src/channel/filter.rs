//! Telnet control-sequence filter.
//!
//! Strips IAC command sequences from the inbound byte stream so the layers
//! above only ever see application bytes. The filter is a passive
//! non-negotiator: option offers are dropped and never answered.
//!
//! Known limitation: an IAC followed by a byte that is not a recognized
//! command only consumes the IAC. An escaped `IAC IAC` therefore disappears
//! entirely and a literal 0xFF payload byte is never produced.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Interpret as command.
pub const IAC: u8 = 255;
/// Subnegotiation of the indicated option follows.
pub const SB: u8 = 250;
/// End of subnegotiation parameters.
pub const SE: u8 = 240;
/// Desire to begin performing an option.
pub const WILL: u8 = 251;
/// Refusal to perform, or to continue performing, an option.
pub const WONT: u8 = 252;
/// Request that the other party perform an option.
pub const DO: u8 = 253;
/// Demand that the other party stop performing an option.
pub const DONT: u8 = 254;

/// Position inside the inbound command grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Plain application data.
    Data,

    /// IAC seen, command byte next.
    Command,

    /// WILL/WONT/DO/DONT seen, option code next.
    OptionCode,

    /// Inside IAC SB, waiting for IAC SE.
    Subnegotiation { prev_iac: bool },
}

/// Buffered reader that yields application bytes with Telnet commands removed.
///
/// The parse position lives on the filter, not in the read future, so a read
/// cancelled in the middle of a control sequence (e.g. by a timeout) resumes
/// it on the next call.
#[derive(Debug)]
pub struct IacFilter<R> {
    inner: BufReader<R>,
    state: State,
}

impl<R: AsyncRead + Unpin> IacFilter<R> {
    /// Wrap a raw reader.
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
            state: State::Data,
        }
    }

    /// Read the next application byte.
    ///
    /// End of stream is reported as `UnexpectedEof`, including when the
    /// stream ends in the middle of a control sequence.
    pub async fn read_byte(&mut self) -> io::Result<u8> {
        loop {
            let b = self.next_raw().await?;
            self.state = match (self.state, b) {
                (State::Data, IAC) => State::Command,
                (State::Data, _) => return Ok(b),
                (State::Command, WILL | WONT | DO | DONT) => State::OptionCode,
                (State::Command, SB) => State::Subnegotiation { prev_iac: false },
                (State::Command, IAC) => State::Command,
                // Not a command: only the IAC is dropped.
                (State::Command, _) => {
                    self.state = State::Data;
                    return Ok(b);
                }
                (State::OptionCode, _) => State::Data,
                (State::Subnegotiation { prev_iac: true }, SE) => State::Data,
                (State::Subnegotiation { .. }, _) => State::Subnegotiation { prev_iac: b == IAC },
            };
        }
    }

    /// Number of raw bytes buffered but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.inner.buffer().len()
    }

    /// Drop every raw byte currently buffered, returning how many were dropped.
    ///
    /// Only data already received is dropped; this never waits on the
    /// underlying reader.
    pub fn discard_buffered(&mut self) -> usize {
        let n = self.inner.buffer().len();
        self.inner.consume(n);
        n
    }

    /// Consumes nothing unless the whole future completes.
    async fn next_raw(&mut self) -> io::Result<u8> {
        let buf = self.inner.fill_buf().await?;
        let b = buf
            .first()
            .copied()
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        self.inner.consume(1);
        Ok(b)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::AsyncWriteExt;

    use super::*;

    async fn drain(input: &[u8]) -> (Vec<u8>, Option<io::Error>) {
        let mut filter = IacFilter::new(input);
        let mut out = Vec::new();
        loop {
            match filter.read_byte().await {
                Ok(b) => out.push(b),
                Err(e) => return (out, Some(e)),
            }
        }
    }

    #[tokio::test]
    async fn test_plain_data_passes_through() {
        let (out, err) = drain(b"login: ").await;
        assert_eq!(out, b"login: ");
        assert_eq!(err.unwrap().kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_negotiation_stripped() {
        let input = [
            IAC, DO, 1, b'A', IAC, WILL, 3, IAC, WONT, 31, b'B', IAC, DONT, 24, b'C',
        ];
        let (out, _) = drain(&input).await;
        assert_eq!(out, b"ABC");
    }

    #[tokio::test]
    async fn test_negotiation_with_any_option_code() {
        // Option code equal to IAC or SE must still be consumed as the option
        let input = [IAC, WILL, IAC, b'x', IAC, DO, SE, b'y'];
        let (out, _) = drain(&input).await;
        assert_eq!(out, b"xy");
    }

    #[tokio::test]
    async fn test_subnegotiation_stripped() {
        let input = [
            b'X', IAC, SB, 24, 0, b'V', b'T', b'1', b'0', b'0', IAC, SE, b'Y',
        ];
        let (out, _) = drain(&input).await;
        assert_eq!(out, b"XY");
    }

    #[tokio::test]
    async fn test_empty_subnegotiation() {
        let input = [IAC, SB, IAC, SE, b'Z'];
        let (out, _) = drain(&input).await;
        assert_eq!(out, b"Z");
    }

    #[tokio::test]
    async fn test_subnegotiation_payload_with_stray_se() {
        // SE not preceded by IAC is payload
        let input = [IAC, SB, 31, SE, 80, IAC, IAC, SE, b'k'];
        let (out, _) = drain(&input).await;
        assert_eq!(out, b"k");
    }

    #[tokio::test]
    async fn test_unknown_command_keeps_following_byte() {
        // IAC NOP (241): only the IAC is consumed
        let input = [b'a', IAC, 241, b'b'];
        let (out, _) = drain(&input).await;
        assert_eq!(out, [b'a', 241, b'b']);
    }

    #[tokio::test]
    async fn test_doubled_iac_is_swallowed() {
        // Known limitation: the escaped 0xFF data byte is lost
        let input = [b'a', IAC, IAC, b'b'];
        let (out, _) = drain(&input).await;
        assert_eq!(out, b"ab");
    }

    #[tokio::test]
    async fn test_doubled_iac_then_command_byte() {
        // After IAC IAC the next byte is inspected as a command
        let input = [IAC, IAC, WILL, 1, b'q'];
        let (out, _) = drain(&input).await;
        assert_eq!(out, b"q");
    }

    #[tokio::test]
    async fn test_eof_mid_sequence() {
        let (out, err) = drain(&[b'a', IAC, DO]).await;
        assert_eq!(out, b"a");
        assert_eq!(err.unwrap().kind(), io::ErrorKind::UnexpectedEof);

        let (out, err) = drain(&[IAC, SB, 24, 1, 2]).await;
        assert!(out.is_empty());
        assert_eq!(err.unwrap().kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_interleaved_sequences_are_transparent() {
        let payload = b"user@host:/root# ls -la\r\n";
        let mut wire = Vec::new();
        for (i, b) in payload.iter().enumerate() {
            match i % 3 {
                0 => wire.extend_from_slice(&[IAC, DO, i as u8]),
                1 => wire.extend_from_slice(&[IAC, SB, 24, i as u8, SE, 7, IAC, SE]),
                _ => {}
            }
            wire.push(*b);
        }
        let (out, _) = drain(&wire).await;
        assert_eq!(out, payload);
    }

    #[tokio::test]
    async fn test_discard_buffered() {
        let mut filter = IacFilter::new(&b"abc def"[..]);
        assert_eq!(filter.read_byte().await.unwrap(), b'a');
        assert_eq!(filter.buffered(), 6);
        assert_eq!(filter.discard_buffered(), 6);
        assert_eq!(filter.buffered(), 0);
        assert!(filter.read_byte().await.is_err());
    }

    #[tokio::test]
    async fn test_sequence_split_across_reads() {
        let stream = tokio_test::io::Builder::new()
            .read(&[b'a', IAC])
            .read(&[SB, 24, IAC])
            .read(&[SE, DO])
            .read(b"b")
            .build();
        let mut filter = IacFilter::new(stream);
        assert_eq!(filter.read_byte().await.unwrap(), b'a');
        assert_eq!(filter.read_byte().await.unwrap(), DO);
        assert_eq!(filter.read_byte().await.unwrap(), b'b');
    }

    #[tokio::test]
    async fn test_cancelled_read_resumes_sequence() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut filter = IacFilter::new(client);

        server.write_all(&[IAC, WILL]).await.unwrap();
        let pending = tokio::time::timeout(Duration::from_millis(20), filter.read_byte()).await;
        assert!(pending.is_err());

        server.write_all(&[3, b'x']).await.unwrap();
        assert_eq!(filter.read_byte().await.unwrap(), b'x');
    }
}
