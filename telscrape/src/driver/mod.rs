//! High-level driver for Telnet shell sessions.
//!
//! The driver layer provides the main API: log in, execute commands and
//! collect their output.

mod builder;
mod config;
mod login;
mod response;
mod session;

pub use builder::DriverBuilder;
pub use config::{PromptConfig, SessionConfig};
pub use login::{LoginAction, LoginHandshake, LoginState};
pub use response::Response;
pub use session::{SessionState, TelnetDriver};

use std::future::Future;

use crate::error::Result;

/// Trait for device drivers.
pub trait Driver: Send {
    /// Open the connection to the device and log in.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Close the connection.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Send a command with its arguments and wait for the shell prompt.
    fn execute(
        &mut self,
        command: &str,
        args: &[&str],
    ) -> impl Future<Output = Result<Response>> + Send;

    /// Send multiple commands sequentially.
    fn send_commands(
        &mut self,
        commands: &[(&str, &[&str])],
    ) -> impl Future<Output = Result<Vec<Response>>> + Send {
        async move {
            let mut responses = Vec::with_capacity(commands.len());
            for (command, args) in commands {
                responses.push(self.execute(command, args).await?);
            }
            Ok(responses)
        }
    }

    /// Check if the driver is connected.
    fn is_open(&self) -> bool;
}
