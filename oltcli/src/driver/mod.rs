//! High-level session API for device interaction.
//!
//! The driver layer logs in, escalates to the privileged prompt and runs
//! commands, returning normalized output or a typed failure.

mod builder;
mod options;
pub(crate) mod response;
mod session;

pub use builder::SessionBuilder;
pub use options::{ReadEnd, RunOptions, SessionOptions};
pub use response::Response;
pub use session::Session;

use std::future::Future;

use crate::error::Result;

/// Trait for CLI sessions.
pub trait Driver: Send {
    /// Open the connection and complete the login handshake.
    ///
    /// An already open connection is closed first.
    fn connect(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Close the connection. Closing a closed session is a no-op.
    fn disconnect(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Send a command and wait for the prompt.
    fn run(&mut self, command: &str) -> impl Future<Output = Result<Response>> + Send;

    /// Send multiple commands sequentially, stopping at the first error.
    fn run_commands(
        &mut self,
        commands: &[&str],
    ) -> impl Future<Output = Result<Vec<Response>>> + Send {
        async move {
            let mut responses = Vec::with_capacity(commands.len());
            for cmd in commands {
                responses.push(self.run(cmd).await?);
            }
            Ok(responses)
        }
    }

    /// Check if the session is connected.
    fn is_connected(&self) -> bool;
}
