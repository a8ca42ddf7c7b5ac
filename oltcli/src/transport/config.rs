//! Telnet connection configuration.

use std::time::Duration;

use secrecy::SecretString;

/// Telnet connection configuration.
#[derive(Debug, Clone)]
pub struct TelnetConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// Telnet port (default: 23).
    pub port: u16,

    /// Login name sent at the `Login:` prompt.
    pub username: String,

    /// Password for login and for privilege escalation.
    pub password: SecretString,

    /// TCP connect timeout.
    pub connect_timeout: Duration,
}

impl TelnetConfig {
    /// Create a configuration for `host:23` with a 10 second connect timeout.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: 23,
            username: username.into(),
            password: SecretString::from(password.into()),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TelnetConfig::new("10.0.0.1", "admin", "secret");
        assert_eq!(config.port, 23);
        assert_eq!(config.socket_addr(), "10.0.0.1:23");
        assert!(!format!("{:?}", config).contains("secret"));
    }
}
