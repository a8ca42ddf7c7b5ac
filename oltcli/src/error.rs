//! Error types for oltcli.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for oltcli operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Telnet transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Prompt and timing errors on the interactive channel
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Platform/model errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Output parsing errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Device facade errors
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
}

/// Transport layer errors (TCP connection, telnet login).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// The device rejected the login credentials
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Connection was closed by the peer
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (prompt detection, deadlines).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// An expected prompt did not show up before the deadline
    #[error("Prompt '{expected}' not seen within {waited:?}")]
    PromptTimeout { expected: String, waited: Duration },

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Session errors (command execution, privilege escalation).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Session not connected
    #[error("Session not connected - call connect() first")]
    NotConnected,

    /// The device answered with one of the platform's failure markers
    #[error("Command '{command}' failed: {marker}")]
    CommandFailed {
        command: String,
        marker: String,
        output: String,
    },

    /// Failed to acquire target privilege level
    #[error("Failed to acquire privilege level '{target}'")]
    PrivilegeAcquisitionFailed { target: String },

    /// Invalid configuration in the session builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Platform/model definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Invalid platform definition
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },

    /// No platform registered under this model name
    #[error("Unsupported OLT model '{model}'")]
    UnknownModel { model: String },

    /// A platform with this name is already registered
    #[error("Platform '{name}' already registered")]
    AlreadyRegistered { name: String },
}

/// Output parsing errors.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The output did not contain the data the caller asked for
    #[error("No {what} found in device output")]
    DataNotFound { what: String },
}

/// Device facade errors.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// A post-write read-back did not show the expected state
    #[error("Verification of {operation} failed: {detail}")]
    Verification { operation: String, detail: String },

    /// A requested entity does not exist on the device
    #[error("{what} not found")]
    NotFound { what: String },

    /// An argument was rejected before any I/O
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// A polled condition never became true
    #[error("Condition not met within {waited:?}")]
    Timeout { waited: Duration },

    /// A batch unit panicked or was cancelled before finishing
    #[error("Batch unit {unit} did not complete: {reason}")]
    TaskAborted { unit: usize, reason: String },
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Protocol,
    NotConnected,
    CommandExecution,
    Privilege,
    Configuration,
    UnsupportedModel,
    DataNotFound,
    Verification,
    NotFound,
    Validation,
    Timeout,
    Internal,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) => ErrorKind::Transport,
            Error::Channel(_) => ErrorKind::Protocol,
            Error::Driver(DriverError::NotConnected) => ErrorKind::NotConnected,
            Error::Driver(DriverError::CommandFailed { .. }) => ErrorKind::CommandExecution,
            Error::Driver(DriverError::PrivilegeAcquisitionFailed { .. }) => ErrorKind::Privilege,
            Error::Driver(DriverError::InvalidConfig { .. }) => ErrorKind::Configuration,
            Error::Platform(PlatformError::UnknownModel { .. }) => ErrorKind::UnsupportedModel,
            Error::Platform(_) => ErrorKind::Configuration,
            Error::Parse(_) => ErrorKind::DataNotFound,
            Error::Device(DeviceError::Verification { .. }) => ErrorKind::Verification,
            Error::Device(DeviceError::NotFound { .. }) => ErrorKind::NotFound,
            Error::Device(DeviceError::Validation { .. }) => ErrorKind::Validation,
            Error::Device(DeviceError::Timeout { .. }) => ErrorKind::Timeout,
            Error::Device(DeviceError::TaskAborted { .. }) => ErrorKind::Internal,
        }
    }

    /// True when the device rejected a command.
    pub fn is_command_failure(&self) -> bool {
        self.kind() == ErrorKind::CommandExecution
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        DeviceError::NotFound { what: what.into() }.into()
    }

    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        DeviceError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
        .into()
    }

    pub(crate) fn verification(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        DeviceError::Verification {
            operation: operation.into(),
            detail: detail.into(),
        }
        .into()
    }

    pub(crate) fn data_not_found(what: impl Into<String>) -> Self {
        ParseError::DataNotFound { what: what.into() }.into()
    }
}

/// Result type alias using oltcli's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err: Error = DriverError::CommandFailed {
            command: "show time".into(),
            marker: "% Unknown command.".into(),
            output: String::new(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::CommandExecution);
        assert!(err.is_command_failure());

        let err: Error = ChannelError::PromptTimeout {
            expected: "Login:".into(),
            waited: Duration::from_secs(1),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Protocol);

        assert_eq!(Error::not_found("ONU FHTT00000001").kind(), ErrorKind::NotFound);
        assert_eq!(Error::validation("vlan", "out of range").kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_messages_carry_identifiers() {
        let err = Error::not_found("service vlan 'iptv'");
        assert_eq!(err.to_string(), "Device error: service vlan 'iptv' not found");

        let err: Error = PlatformError::UnknownModel {
            model: "AN5516-06".into(),
        }
        .into();
        assert!(err.to_string().contains("AN5516-06"));
    }
}
