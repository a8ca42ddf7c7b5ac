//! Session and per-command options.

use std::time::Duration;

/// Timing options for a [`Session`](super::Session).
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Upper bound for a single chunk read. An empty read is a soft timeout.
    pub read_interval: Duration,

    /// Overall deadline for login and privilege escalation.
    pub handshake_timeout: Duration,

    /// Default deadline for one command reply.
    pub command_timeout: Duration,

    /// How far back from the buffer tail prompts are searched.
    pub search_depth: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            read_interval: Duration::from_secs(1),
            handshake_timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(60),
            search_depth: 1000,
        }
    }
}

/// How a command reply ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadEnd {
    /// A prompt signature at the buffer tail.
    #[default]
    Prompt,

    /// Two consecutive empty reads. For commands such as `pingonu` whose
    /// output does not end in a prompt.
    Quiet,
}

/// Options for a single [`Session::run_with`](super::Session::run_with) call.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Append the platform line ending to the command.
    pub append_line_ending: bool,

    /// Reply termination mode.
    pub end: ReadEnd,

    /// Overrides the session's command timeout.
    pub timeout: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            append_line_ending: true,
            end: ReadEnd::Prompt,
            timeout: None,
        }
    }
}

impl RunOptions {
    /// Options for a reply that ends when the line goes quiet.
    pub fn quiet() -> Self {
        Self {
            end: ReadEnd::Quiet,
            ..Self::default()
        }
    }

    /// Send the command as is.
    pub fn without_line_ending(mut self) -> Self {
        self.append_line_ending = false;
        self
    }

    /// Set the deadline for this command.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_options() {
        let options = RunOptions::default();
        assert!(options.append_line_ending);
        assert_eq!(options.end, ReadEnd::Prompt);

        let options = RunOptions::quiet()
            .without_line_ending()
            .with_timeout(Duration::from_secs(5));
        assert_eq!(options.end, ReadEnd::Quiet);
        assert!(!options.append_line_ending);
        assert_eq!(options.timeout, Some(Duration::from_secs(5)));
    }
}
