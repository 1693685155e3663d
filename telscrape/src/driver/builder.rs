//! Builder for creating Telnet drivers.

use std::time::Duration;

use secrecy::SecretString;

use super::config::SessionConfig;
use super::session::TelnetDriver;
use crate::error::{DriverError, Result};

/// Builder for constructing Telnet drivers.
///
/// Starts from the default [`SessionConfig`] and overrides one field per
/// setter.
///
/// # Example
///
/// ```rust,no_run
/// use telscrape::{Driver, DriverBuilder};
///
/// # async fn example() -> Result<(), telscrape::Error> {
/// let mut driver = DriverBuilder::new("192.168.1.1")
///     .username("admin")
///     .password("secret")
///     .build()?;
/// driver.open().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DriverBuilder {
    config: SessionConfig,
}

impl DriverBuilder {
    /// Create a new driver builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            config: SessionConfig::new(host),
        }
    }

    /// Start from a loaded configuration instead of the defaults.
    pub fn from_config(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Set the Telnet port (default: 23).
    pub fn port(mut self, port: u16) -> Self {
        self.config.transport.port = port;
        self
    }

    /// Set the connect timeout and read deadline (default: 10s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.transport.timeout = timeout;
        self
    }

    /// Set the username sent at the username prompt.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = username.into();
        self
    }

    /// Set the password sent at the password prompt.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(SecretString::from(password.into()));
        self
    }

    /// Log session progress at `info` level.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Set the username prompt regex.
    pub fn prompt_username(mut self, pattern: impl Into<String>) -> Self {
        self.config.prompts.username = pattern.into();
        self
    }

    /// Set the password prompt regex.
    pub fn prompt_password(mut self, pattern: impl Into<String>) -> Self {
        self.config.prompts.password = pattern.into();
        self
    }

    /// Set the shell prompt regex.
    pub fn prompt_banner(mut self, pattern: impl Into<String>) -> Self {
        self.config.prompts.banner = pattern.into();
        self
    }

    /// Set the byte that ends each scanned fragment (default: space).
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    /// Validate and return the merged configuration.
    pub fn config(self) -> Result<SessionConfig> {
        if self.config.transport.host.is_empty() {
            return Err(invalid("host must not be empty"));
        }
        if self.config.transport.port == 0 {
            return Err(invalid("port must not be 0"));
        }
        if self.config.transport.timeout.is_zero() {
            return Err(invalid("timeout must not be zero"));
        }
        Ok(self.config)
    }

    /// Build the driver.
    ///
    /// This compiles the prompts but does not connect. Call `open()` on the
    /// returned driver to establish the connection and log in.
    pub fn build(self) -> Result<TelnetDriver> {
        TelnetDriver::new(self.config()?)
    }
}

fn invalid(message: &str) -> crate::Error {
    DriverError::InvalidConfig {
        message: message.to_string(),
    }
    .into()
}
