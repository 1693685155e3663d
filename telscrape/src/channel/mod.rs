//! Channel layer: control-sequence filtering and prompt scanning.
//!
//! This module turns the raw Telnet byte stream into application bytes and
//! finds prompts in them as output arrives.

pub mod filter;
mod patterns;
mod scanner;

pub use filter::IacFilter;
pub use patterns::{
    DEFAULT_BANNER_PROMPT, DEFAULT_PASSWORD_PROMPT, DEFAULT_USERNAME_PROMPT, PromptPatterns,
};
pub use scanner::{ByteSource, DEFAULT_DELIMITER, LineScanner, scan_until};
