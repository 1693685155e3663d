//! Response type for command execution results.

use std::borrow::Cow;
use std::time::Duration;

use bytes::Bytes;
use memchr::memmem;

/// Response from a command execution.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command line that was sent, without the line terminator.
    pub command: String,

    /// The command output (banner removed, surrounding whitespace trimmed).
    pub output: Bytes,

    /// Everything captured up to and including the banner.
    pub raw_output: Bytes,

    /// Time taken to execute the command.
    pub elapsed: Duration,
}

impl Response {
    /// Create a new response.
    pub fn new(
        command: impl Into<String>,
        output: Bytes,
        raw_output: Bytes,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            output,
            raw_output,
            elapsed,
        }
    }

    /// Get the output as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }

    /// Iterate over output lines, without their CR/LF framing.
    pub fn lines(&self) -> impl Iterator<Item = &[u8]> {
        self.output
            .split(|&b| b == b'\n')
            .map(|line| line.strip_prefix(b"\r").unwrap_or(line))
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
    }

    /// Check if the output contains a byte string.
    pub fn contains(&self, needle: impl AsRef<[u8]>) -> bool {
        memmem::find(&self.output, needle.as_ref()).is_some()
    }

    /// Check if the command produced no output.
    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}
