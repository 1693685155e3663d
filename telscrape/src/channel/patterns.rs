//! Pattern matching utilities for prompt detection.

use std::borrow::Cow;

use regex::bytes::Regex;

/// Default username prompt: a host word followed by `username:`.
pub const DEFAULT_USERNAME_PROMPT: &str = r"[\w-]+ username:";

/// Default password prompt.
pub const DEFAULT_PASSWORD_PROMPT: &str = r"Password:";

/// Default shell prompt: `user@host:path` followed by `$` or `#`.
pub const DEFAULT_BANNER_PROMPT: &str = r"[\w.-]+@[\w.-]+:[\w/~.-]+(\$|#)";

/// The three compiled prompts driving a session.
#[derive(Debug, Clone)]
pub struct PromptPatterns {
    /// Login name prompt.
    pub username: Regex,

    /// Password prompt.
    pub password: Regex,

    /// Idle shell prompt, marking both a completed login and the end of
    /// a command's output.
    pub banner: Regex,
}

impl PromptPatterns {
    /// Compile the three prompt patterns.
    pub fn new(username: &str, password: &str, banner: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            username: Regex::new(username)?,
            password: Regex::new(password)?,
            banner: Regex::new(banner)?,
        })
    }

    /// Remove the first banner occurrence and trim surrounding whitespace.
    pub fn strip_banner<'a>(&self, output: &'a [u8]) -> Cow<'a, [u8]> {
        match self.banner.replace(output, &b""[..]) {
            Cow::Borrowed(b) => Cow::Borrowed(b.trim_ascii()),
            Cow::Owned(b) => Cow::Owned(b.trim_ascii().to_vec()),
        }
    }
}

impl Default for PromptPatterns {
    fn default() -> Self {
        Self::new(
            DEFAULT_USERNAME_PROMPT,
            DEFAULT_PASSWORD_PROMPT,
            DEFAULT_BANNER_PROMPT,
        )
        .expect("default prompt patterns are valid")
    }
}
