//! Session configuration and its defaults.

use log::Level;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use crate::channel::{
    DEFAULT_BANNER_PROMPT, DEFAULT_DELIMITER, DEFAULT_PASSWORD_PROMPT, DEFAULT_USERNAME_PROMPT,
    PromptPatterns,
};
use crate::error::Result;
use crate::transport::TelnetConfig;

/// Prompt pattern sources, compiled into [`PromptPatterns`] when a driver is
/// built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Regex for the login name prompt.
    pub username: String,

    /// Regex for the password prompt.
    pub password: String,

    /// Regex for the idle shell prompt.
    pub banner: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME_PROMPT.to_string(),
            password: DEFAULT_PASSWORD_PROMPT.to_string(),
            banner: DEFAULT_BANNER_PROMPT.to_string(),
        }
    }
}

impl PromptConfig {
    /// Compile the three patterns.
    pub fn compile(&self) -> Result<PromptPatterns> {
        Ok(PromptPatterns::new(
            &self.username,
            &self.password,
            &self.banner,
        )?)
    }
}

/// Everything a session needs, fixed once the driver is built.
///
/// Can be deserialized with only `host` present; every other field falls
/// back to its default.
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    /// Where to connect.
    #[serde(flatten)]
    pub transport: TelnetConfig,

    /// Login name sent at the username prompt.
    #[serde(default)]
    pub username: String,

    /// Password sent at the password prompt. `None` or empty skips the
    /// password step entirely.
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub password: Option<SecretString>,

    /// Prompt patterns.
    #[serde(default)]
    pub prompts: PromptConfig,

    /// Log session progress at `info` instead of `debug`.
    #[serde(default)]
    pub verbose: bool,

    /// Byte that ends each scanned fragment.
    #[serde(default = "default_delimiter")]
    pub delimiter: u8,
}

impl SessionConfig {
    /// Default configuration for `host`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            transport: TelnetConfig::new(host),
            username: String::new(),
            password: None,
            prompts: PromptConfig::default(),
            verbose: false,
            delimiter: DEFAULT_DELIMITER,
        }
    }

    /// Whether the password step is part of the login.
    pub fn has_password(&self) -> bool {
        self.password
            .as_ref()
            .is_some_and(|p| !p.expose_secret().is_empty())
    }

    /// Level at which session progress is logged.
    pub fn log_level(&self) -> Level {
        if self.verbose { Level::Info } else { Level::Debug }
    }
}

fn default_delimiter() -> u8 {
    DEFAULT_DELIMITER
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}
