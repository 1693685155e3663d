//! Line-fragment scanner for prompt detection over a growing buffer.
//!
//! Shell prompts rarely end with a newline, so output cannot be framed by
//! lines alone. The scanner reads up to each delimiter (a space by default)
//! and exposes the fragment from the start of the current line to that
//! delimiter. Callers only test the newest fragment instead of rescanning
//! the whole accumulated output.
//!
//! Lines are considered to start after the two-byte sequence LF CR, which is
//! the framing the target shells emit.

use std::future::Future;

use bytes::{BufMut, Bytes, BytesMut};
use memchr::memmem;
use tokio::io::AsyncRead;

use super::filter::IacFilter;
use crate::error::Result;

/// Default fragment delimiter.
pub const DEFAULT_DELIMITER: u8 = b' ';

/// Marks the start of a new line in the accumulated output.
const LINE_BOUNDARY: &[u8] = b"\n\r";

/// Initial accumulator capacity.
const INITIAL_CAPACITY: usize = 64 * 1024;

/// Source of application bytes, one at a time.
pub trait ByteSource: Send {
    /// Read the next application byte.
    fn read_byte(&mut self) -> impl Future<Output = Result<u8>> + Send;
}

impl<R: AsyncRead + Unpin + Send> ByteSource for IacFilter<R> {
    async fn read_byte(&mut self) -> Result<u8> {
        Ok(IacFilter::read_byte(self).await?)
    }
}

/// Output accumulator with a view on the line currently being assembled.
///
/// The accumulator only grows, and the line start only moves forward.
#[derive(Debug)]
pub struct LineScanner {
    output: BytesMut,
    line_start: usize,
    /// Length of the output already searched for line boundaries.
    searched: usize,
    delimiter: u8,
}

impl LineScanner {
    /// Create an empty scanner splitting fragments on `delimiter`.
    pub fn new(delimiter: u8) -> Self {
        Self::with_capacity(delimiter, INITIAL_CAPACITY)
    }

    /// Create an empty scanner with room for `capacity` bytes up front.
    pub fn with_capacity(delimiter: u8, capacity: usize) -> Self {
        Self {
            output: BytesMut::with_capacity(capacity),
            line_start: 0,
            searched: 0,
            delimiter,
        }
    }

    /// Append bytes from `source` through the next delimiter, inclusive.
    ///
    /// Returns the number of bytes appended.
    pub async fn read_until<S: ByteSource>(&mut self, source: &mut S) -> Result<usize> {
        let mut n = 0;
        loop {
            let b = source.read_byte().await?;
            self.output.put_u8(b);
            n += 1;
            if b == self.delimiter {
                return Ok(n);
            }
        }
    }

    /// Read through the next delimiter and return the new line fragment.
    pub async fn next_fragment<S: ByteSource>(&mut self, source: &mut S) -> Result<&[u8]> {
        self.read_until(source).await?;
        self.update_line_start();
        Ok(self.fragment())
    }

    /// Bytes from the current line start to the end of the output.
    pub fn fragment(&self) -> &[u8] {
        &self.output[self.line_start..]
    }

    /// Offset of the current line start within the output.
    pub fn line_start(&self) -> usize {
        self.line_start
    }

    /// Start the next fragment after everything read so far.
    ///
    /// Used once a prompt has been answered so the same prompt text is not
    /// matched again by the following fragments.
    pub fn consume_fragment(&mut self) {
        self.line_start = self.output.len();
    }

    /// Everything accumulated so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.output
    }

    /// Accumulated output length.
    pub fn len(&self) -> usize {
        self.output.len()
    }

    /// Check if nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    /// Take the accumulated output.
    pub fn into_bytes(self) -> Bytes {
        self.output.freeze()
    }

    fn update_line_start(&mut self) {
        // A boundary can straddle the previously searched region by one byte.
        let from = self.searched.saturating_sub(LINE_BOUNDARY.len() - 1);
        if let Some(pos) = memmem::rfind(&self.output[from..], LINE_BOUNDARY) {
            self.line_start = self.line_start.max(from + pos + LINE_BOUNDARY.len());
        }
        self.searched = self.output.len();
    }
}

/// Scan `source` fragment by fragment until `predicate` accepts one.
///
/// Returns the whole accumulated output, including the accepted fragment.
/// Blocks for as long as the source does; bound it with a read deadline.
pub async fn scan_until<S, F>(source: &mut S, delimiter: u8, mut predicate: F) -> Result<Bytes>
where
    S: ByteSource,
    F: FnMut(&[u8]) -> bool,
{
    let mut scanner = LineScanner::new(delimiter);
    loop {
        let fragment = scanner.next_fragment(source).await?;
        if predicate(fragment) {
            return Ok(scanner.into_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fragments(input: &[u8], delimiter: u8) -> Vec<(usize, Vec<u8>)> {
        let mut source = IacFilter::new(input);
        let mut scanner = LineScanner::new(delimiter);
        let mut out = Vec::new();
        while let Ok(fragment) = scanner.next_fragment(&mut source).await {
            let fragment = fragment.to_vec();
            out.push((scanner.line_start(), fragment));
        }
        out
    }

    #[tokio::test]
    async fn test_fragments_grow_until_line_boundary() {
        let got = fragments(b"abc def ", b' ').await;
        assert_eq!(got[0].1, b"abc ");
        assert_eq!(got[1].1, b"abc def ");
    }

    #[tokio::test]
    async fn test_lf_cr_starts_new_line() {
        let got = fragments(b"one\n\rtwo three ", b' ').await;
        assert_eq!(got[0], (5, b"two ".to_vec()));
        assert_eq!(got[1], (5, b"two three ".to_vec()));
    }

    #[tokio::test]
    async fn test_cr_lf_does_not_start_new_line() {
        let got = fragments(b"one\r\ntwo ", b' ').await;
        assert_eq!(got[0], (0, b"one\r\ntwo ".to_vec()));
    }

    #[tokio::test]
    async fn test_last_boundary_wins() {
        let got = fragments(b"a\n\rb\n\rc ", b' ').await;
        assert_eq!(got[0].1, b"c ");
    }

    #[tokio::test]
    async fn test_boundary_straddling_previous_fragment() {
        let got = fragments(b"ab\n\rcd\n", b'\n').await;
        assert_eq!(got[0], (0, b"ab\n".to_vec()));
        assert_eq!(got[1], (4, b"cd\n".to_vec()));
    }

    #[tokio::test]
    async fn test_line_start_monotonic_and_bounded() {
        let input = b"Last login: today\n\r\n\rhost username: x \n\rPassword: \n\r\n\ruser@host:~$ ";
        let mut source = IacFilter::new(&input[..]);
        let mut scanner = LineScanner::new(b' ');
        let mut last = 0;
        while scanner.next_fragment(&mut source).await.is_ok() {
            assert!(scanner.line_start() >= last);
            assert!(scanner.line_start() <= scanner.len());
            last = scanner.line_start();
        }
        assert_eq!(scanner.fragment(), b"user@host:~$ ");
    }

    #[tokio::test]
    async fn test_consume_fragment() {
        let mut source = IacFilter::new(&b"login: admin ok "[..]);
        let mut scanner = LineScanner::new(b' ');
        assert_eq!(scanner.next_fragment(&mut source).await.unwrap(), b"login: ");
        scanner.consume_fragment();
        assert_eq!(scanner.fragment(), b"");
        assert_eq!(scanner.next_fragment(&mut source).await.unwrap(), b"admin ");
        assert_eq!(scanner.next_fragment(&mut source).await.unwrap(), b"admin ok ");
        assert_eq!(scanner.as_slice(), b"login: admin ok ");
    }

    #[tokio::test]
    async fn test_small_scanner_grows_past_capacity() {
        let mut source = IacFilter::new(&b"a much longer line than four bytes\n"[..]);
        let mut scanner = LineScanner::with_capacity(b'\n', 4);
        assert_eq!(scanner.read_until(&mut source).await.unwrap(), 35);
        assert_eq!(scanner.as_slice(), b"a much longer line than four bytes\n");
    }

    #[tokio::test]
    async fn test_scan_until_returns_whole_output() {
        let mut source = IacFilter::new(&b"motd\n\rhost# trailing"[..]);
        let mut seen = Vec::new();
        let output = scan_until(&mut source, b' ', |fragment| {
            seen.push(fragment.to_vec());
            fragment.ends_with(b"# ")
        })
        .await
        .unwrap();
        assert_eq!(&output[..], b"motd\n\rhost# ");
        assert_eq!(seen, vec![b"host# ".to_vec()]);
    }

    #[tokio::test]
    async fn test_scan_until_propagates_eof() {
        let mut source = IacFilter::new(&b"no prompt here"[..]);
        let err = scan_until(&mut source, b' ', |_| false).await.unwrap_err();
        assert!(err.is_eof());
    }
}
