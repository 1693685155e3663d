//! Telnet connection configuration.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Default Telnet port.
pub const DEFAULT_PORT: u16 = 23;

/// Default connect and read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Telnet connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelnetConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// Telnet port (default: 23).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Connection timeout, also the lifetime of the read deadline.
    /// Given in whole seconds when deserialized.
    #[serde(
        default = "default_timeout",
        rename = "timeout_secs",
        deserialize_with = "deserialize_secs"
    )]
    pub timeout: Duration,
}

impl TelnetConfig {
    /// Create a configuration for `host` with default port and timeout.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn deserialize_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}
