//! Builder for creating sessions.

use std::time::Duration;

use super::options::SessionOptions;
use super::session::Session;
use crate::error::{DriverError, Result};
use crate::platform::{PlatformDefinition, PlatformRegistry, vendors};
use crate::transport::{Dialer, TcpDialer, TelnetConfig};

/// Builder for constructing sessions.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use oltcli::driver::SessionBuilder;
///
/// # fn example() -> Result<(), oltcli::Error> {
/// let session = SessionBuilder::new("10.0.0.1")
///     .username("admin")
///     .password("secret")
///     .model("AN6000-17")
///     .command_timeout(Duration::from_secs(120))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    password: String,
    model: String,
    custom_platform: Option<PlatformDefinition>,
    connect_timeout: Duration,
    options: SessionOptions,
}

impl SessionBuilder {
    /// Create a new session builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 23,
            username: None,
            password: String::new(),
            model: vendors::fiberhome::MODEL.to_string(),
            custom_platform: None,
            connect_timeout: Duration::from_secs(10),
            options: SessionOptions::default(),
        }
    }

    /// Set the telnet port (default: 23).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the login username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password used for login and `enable`.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the OLT model (default: "AN6000-17").
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom platform definition instead of a registered model.
    pub fn custom_platform(mut self, platform: PlatformDefinition) -> Self {
        self.custom_platform = Some(platform);
        self
    }

    /// Set the TCP connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the upper bound for a single chunk read.
    pub fn read_interval(mut self, interval: Duration) -> Self {
        self.options.read_interval = interval;
        self
    }

    /// Set the overall login and escalation deadline.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.options.handshake_timeout = timeout;
        self
    }

    /// Set the default deadline for a command reply.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.options.command_timeout = timeout;
        self
    }

    /// Set all session options at once.
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Build a session that dials plain TCP.
    ///
    /// This does not connect. Call [`connect`](super::Driver::connect) on
    /// the returned session.
    pub fn build(self) -> Result<Session> {
        self.build_with_dialer(TcpDialer)
    }

    /// Build a session over a custom dialer.
    pub fn build_with_dialer<D: Dialer>(self, dialer: D) -> Result<Session<D>> {
        let username = self.username.ok_or_else(|| DriverError::InvalidConfig {
            message: "Username is required".to_string(),
        })?;

        let platform = match self.custom_platform {
            Some(custom) => custom,
            None => PlatformRegistry::lookup(&self.model)?,
        };

        let mut config = TelnetConfig::new(self.host, username, self.password);
        config.port = self.port;
        config.connect_timeout = self.connect_timeout;

        Session::with_dialer(config, platform, self.options, dialer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind, PlatformError};

    #[test]
    fn test_build_defaults() {
        let session = SessionBuilder::new("10.0.0.1")
            .username("admin")
            .password("secret")
            .build()
            .unwrap();
        assert_eq!(session.config().port, 23);
        assert_eq!(session.platform().name, "AN6000-17");
        assert_eq!(session.options().command_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_build_overrides() {
        let session = SessionBuilder::new("10.0.0.1")
            .port(2323)
            .username("admin")
            .connect_timeout(Duration::from_secs(3))
            .read_interval(Duration::from_millis(200))
            .handshake_timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(session.config().socket_addr(), "10.0.0.1:2323");
        assert_eq!(session.config().connect_timeout, Duration::from_secs(3));
        assert_eq!(session.options().read_interval, Duration::from_millis(200));
        assert_eq!(session.options().handshake_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_username_required() {
        let err = SessionBuilder::new("10.0.0.1").build().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_unknown_model() {
        let err = SessionBuilder::new("10.0.0.1")
            .username("admin")
            .model("AN5516-06")
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::Platform(PlatformError::UnknownModel { .. })
        ));
    }
}
