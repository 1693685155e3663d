//! # Telscrape
//!
//! Async Telnet CLI scraper for automated login and command capture.
//!
//! Telscrape connects to a Telnet server, answers the username and password
//! prompts, waits for the shell prompt and then runs commands, returning
//! each command's output with the trailing prompt removed.
//!
//! ## Features
//!
//! - Async Telnet sessions on tokio, over TCP or any byte stream
//! - Passive Telnet handling: option negotiation and subnegotiation are
//!   filtered out, never answered
//! - Prompt detection on line fragments as output arrives, so prompts that
//!   do not end with a newline are still found
//! - Regex-configurable username, password and shell prompts
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use telscrape::{Driver, DriverBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), telscrape::Error> {
//!     let mut driver = DriverBuilder::new("192.168.1.1")
//!         .username("admin")
//!         .password("secret")
//!         .build()?;
//!
//!     driver.open().await?;
//!
//!     let response = driver.execute("uname", &["-a"]).await?;
//!     println!("{}", response);
//!
//!     driver.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod transport;

// Re-export main types for convenience
pub use driver::{
    Driver, DriverBuilder, LoginHandshake, LoginState, PromptConfig, Response, SessionConfig,
    SessionState, TelnetDriver,
};
pub use error::Error;
pub use transport::{TelnetConfig, TelnetTransport};
