//! Telnet transport layer over tokio streams.
//!
//! This module provides the low-level connection management: opening the
//! TCP socket, arming the read deadline, filtered reads and raw writes.

pub mod config;
mod telnet;

pub use config::TelnetConfig;
pub use telnet::TelnetTransport;
