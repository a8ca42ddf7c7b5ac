//! Telnet CLI session: login, privilege escalation and command execution.

use std::sync::Arc;

use log::{debug, info, trace, warn};
use regex::bytes::Regex;
use secrecy::ExposeSecret;
use tokio::time::Instant;

use super::Driver;
use super::options::{ReadEnd, RunOptions, SessionOptions};
use super::response::Response;
use crate::channel::{signature_pattern, ChannelConfig, TerminalChannel};
use crate::error::{ChannelError, DriverError, Result, TransportError};
use crate::platform::{DefaultBehavior, PlatformDefinition, VendorBehavior};
use crate::transport::{Dialer, TcpDialer, TelnetConfig, TelnetTransport};

/// One telnet CLI session to an OLT.
///
/// A session is `Disconnected` until [`Driver::connect`] completes the
/// login and escalation handshake, and goes back to `Disconnected` on
/// [`Driver::disconnect`] or when it is dropped.
///
/// # Example
///
/// ```rust,no_run
/// use oltcli::driver::{Driver, SessionBuilder};
///
/// # async fn example() -> Result<(), oltcli::Error> {
/// let mut session = SessionBuilder::new("10.0.0.1")
///     .username("admin")
///     .password("secret")
///     .build()?;
/// session.connect().await?;
/// let response = session.run("show time").await?;
/// println!("{}", response.result);
/// session.disconnect().await?;
/// # Ok(())
/// # }
/// ```
pub struct Session<D: Dialer = TcpDialer> {
    config: TelnetConfig,
    platform: PlatformDefinition,
    behavior: Arc<dyn VendorBehavior>,
    options: SessionOptions,
    dialer: D,
    prompt_pattern: Regex,
    channel: Option<TerminalChannel<D::Stream>>,
}

impl Session<TcpDialer> {
    /// Create a session that dials plain TCP.
    pub fn new(
        config: TelnetConfig,
        platform: PlatformDefinition,
        options: SessionOptions,
    ) -> Result<Self> {
        Self::with_dialer(config, platform, options, TcpDialer)
    }
}

impl<D: Dialer> Session<D> {
    /// Create a session over a custom dialer.
    pub fn with_dialer(
        config: TelnetConfig,
        platform: PlatformDefinition,
        options: SessionOptions,
        dialer: D,
    ) -> Result<Self> {
        if platform.prompt_signatures.is_empty() {
            return Err(DriverError::InvalidConfig {
                message: format!("platform '{}' has no prompt signatures", platform.name),
            }
            .into());
        }
        let prompt_pattern =
            signature_pattern(&platform.prompt_signatures).map_err(ChannelError::from)?;
        let behavior = platform
            .behavior
            .clone()
            .unwrap_or_else(|| Arc::new(DefaultBehavior));

        Ok(Self {
            config,
            platform,
            behavior,
            options,
            dialer,
            prompt_pattern,
            channel: None,
        })
    }

    /// Get the connection configuration.
    pub fn config(&self) -> &TelnetConfig {
        &self.config
    }

    /// Get the platform definition.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// Get the session options.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Get the combined prompt pattern.
    pub fn prompt_pattern(&self) -> &Regex {
        &self.prompt_pattern
    }

    /// Run one command with explicit options.
    ///
    /// Pending output is drained first. The reply is normalized by the
    /// platform behavior and checked against its failure markers.
    pub async fn run_with(&mut self, command: &str, options: &RunOptions) -> Result<Response> {
        let channel = self.channel.as_mut().ok_or(DriverError::NotConnected)?;
        let start = Instant::now();
        let line_ending = self.platform.line_ending.as_bytes();

        channel.drain(&self.prompt_pattern).await?;

        debug!("run '{}'", command);
        let mut line = command.as_bytes().to_vec();
        if options.append_line_ending {
            line.extend_from_slice(line_ending);
        }
        channel.send(&line).await?;

        let deadline = start + options.timeout.unwrap_or(self.options.command_timeout);
        let raw = match options.end {
            ReadEnd::Prompt => {
                channel
                    .read_until_prompt(&self.prompt_pattern, deadline, line_ending)
                    .await?
            }
            ReadEnd::Quiet => channel.read_until_quiet(deadline, line_ending).await?,
        };

        let raw_result = String::from_utf8_lossy(&raw).into_owned();
        trace!("raw reply to '{}': {:?}", command, raw_result);
        let prompt = raw_result
            .rsplit("\r\n")
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        let result = self.behavior.normalize_output(&raw_result, command);
        let marker = self
            .behavior
            .detect_failure(&result)
            .or_else(|| self.platform.failure_in(&result).map(str::to_string));
        if let Some(marker) = marker {
            warn!("command '{}' failed: {}", command, marker);
            return Err(DriverError::CommandFailed {
                command: command.to_string(),
                marker,
                output: raw_result,
            }
            .into());
        }

        Ok(Response::new(command, result, raw_result, prompt, start.elapsed()))
    }
}

impl<D: Dialer> Driver for Session<D> {
    async fn connect(&mut self) -> Result<()> {
        if self.channel.is_some() {
            debug!("reconnecting to {}", self.config.socket_addr());
            self.disconnect().await?;
        }

        let stream = self.dialer.dial(&self.config).await?;
        let mut channel = TerminalChannel::new(
            TelnetTransport::new(stream),
            ChannelConfig {
                read_interval: self.options.read_interval,
                search_depth: self.options.search_depth,
            },
        );
        handshake(&mut channel, &self.config, &self.platform, &self.options).await?;
        self.channel = Some(channel);

        for command in self.platform.on_open_commands.clone() {
            if let Err(e) = self.run(&command).await {
                self.channel = None;
                return Err(e);
            }
        }

        info!("connected to {} as {}", self.config.socket_addr(), self.config.username);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut channel) = self.channel.take() {
            debug!("disconnecting from {}", self.config.socket_addr());
            if let Err(e) = channel.close().await {
                debug!("error closing {}: {}", self.config.socket_addr(), e);
            }
        }
        Ok(())
    }

    async fn run(&mut self, command: &str) -> Result<Response> {
        self.run_with(command, &RunOptions::default()).await
    }

    fn is_connected(&self) -> bool {
        self.channel.is_some()
    }
}

impl<D: Dialer> Drop for Session<D> {
    fn drop(&mut self) {
        if self.channel.is_some() {
            debug!("dropping connected session to {}", self.config.socket_addr());
        }
    }
}

/// Log in and walk the privilege chain up to the default level.
///
/// Every wait shares one deadline.
async fn handshake<S>(
    channel: &mut TerminalChannel<S>,
    config: &TelnetConfig,
    platform: &PlatformDefinition,
    options: &SessionOptions,
) -> Result<()>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send,
{
    let deadline = Instant::now() + options.handshake_timeout;
    let ending = platform.login_line_ending.as_str();
    let password = config.password.expose_secret();

    channel
        .read_until(&[&platform.login_prompt], deadline, "Login:")
        .await?;
    channel
        .send(format!("{}{}", config.username, ending).as_bytes())
        .await?;
    channel
        .read_until(&[&platform.password_prompt], deadline, "Password:")
        .await?;
    channel
        .send(format!("{}{}", password, ending).as_bytes())
        .await?;

    let mut current = platform
        .login_privilege()
        .ok_or_else(|| DriverError::InvalidConfig {
            message: format!("platform '{}' has no privilege levels", platform.name),
        })?;
    let (index, _) = channel
        .read_until(
            &[&current.pattern, &platform.login_prompt],
            deadline,
            current.pattern.as_str(),
        )
        .await?;
    if index != 0 {
        return Err(TransportError::AuthenticationFailed {
            user: config.username.clone(),
        }
        .into());
    }

    for level in platform.escalation_path() {
        let Some(command) = &level.escalate_command else {
            return Err(DriverError::InvalidConfig {
                message: format!("privilege '{}' has no escalate command", level.name),
            }
            .into());
        };
        debug!("escalating to '{}'", level.name);
        channel
            .send(format!("{}{}", command, ending).as_bytes())
            .await?;
        if level.escalate_auth {
            let prompt = level
                .escalate_prompt
                .as_ref()
                .unwrap_or(&platform.password_prompt);
            channel.read_until(&[prompt], deadline, prompt.as_str()).await?;
            channel
                .send(format!("{}{}", password, ending).as_bytes())
                .await?;
        }

        let (index, _) = channel
            .read_until(
                &[&level.pattern, &platform.password_prompt, &current.pattern],
                deadline,
                level.pattern.as_str(),
            )
            .await?;
        if index != 0 {
            return Err(DriverError::PrivilegeAcquisitionFailed {
                target: level.name.clone(),
            }
            .into());
        }
        current = level;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use tokio_test::io::{Builder, Mock};

    use super::*;
    use crate::error::{Error, ErrorKind};
    use crate::platform::vendors::fiberhome;

    struct MockDialer(Mutex<Option<Mock>>);

    impl Dialer for MockDialer {
        type Stream = Mock;

        async fn dial(&self, _config: &TelnetConfig) -> Result<Mock> {
            self.0
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| TransportError::Disconnected.into())
        }
    }

    fn login(builder: &mut Builder) -> &mut Builder {
        builder
            .read(b"\r\nLogin: ")
            .write(b"admin\n")
            .read(b"Password: ")
            .write(b"secret\n")
            .read(b"\r\nUser> ")
            .write(b"enable\n")
            .read(b"Password: ")
            .write(b"secret\n")
            .read(b"\r\nAdmin# ")
            .write(b"terminal length 0\r\n")
            .read(b"terminal length 0\r\nAdmin# ")
    }

    fn session(mock: Mock) -> Session<MockDialer> {
        Session::with_dialer(
            TelnetConfig::new("10.0.0.1", "admin", "secret"),
            fiberhome::platform(),
            SessionOptions {
                read_interval: Duration::from_millis(20),
                handshake_timeout: Duration::from_secs(2),
                command_timeout: Duration::from_secs(2),
                search_depth: 1000,
            },
            MockDialer(Mutex::new(Some(mock))),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_connect_and_run() {
        let mock = login(&mut Builder::new())
            .write(b"show time\r\n")
            .read(b"show time\r\nline1\r\nline2\r\nAdmin# ")
            .build();
        let mut session = session(mock);
        session.connect().await.unwrap();
        assert!(session.is_connected());

        let response = session.run("show time").await.unwrap();
        assert_eq!(response.result, "line1\r\nline2");
        assert_eq!(response.prompt, "Admin#");

        session.disconnect().await.unwrap();
        assert!(!session.is_connected());
        session.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_run_without_connect() {
        let mut session = session(Builder::new().build());
        let err = session.run("show time").await.unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::NotConnected)));
    }

    #[tokio::test]
    async fn test_failure_marker_is_error() {
        let mock = login(&mut Builder::new())
            .write(b"no card auth 1/9\r\n")
            .read(b"no card auth 1/9\r\nCommand executes failed.\r\nAdmin(config)# ")
            .build();
        let mut session = session(mock);
        session.connect().await.unwrap();

        let err = session.run("no card auth 1/9").await.unwrap_err();
        assert!(err.is_command_failure());
        match err {
            Error::Driver(DriverError::CommandFailed {
                command,
                marker,
                output,
            }) => {
                assert_eq!(command, "no card auth 1/9");
                assert_eq!(marker, "Command executes failed.");
                assert!(output.ends_with("Admin(config)# "));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_login() {
        let mock = Builder::new()
            .read(b"\r\nLogin: ")
            .write(b"admin\n")
            .read(b"Password: ")
            .write(b"secret\n")
            .read(b"\r\nLogin incorrect\r\nLogin: ")
            .build();
        let mut session = session(mock);
        let err = session.connect().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::AuthenticationFailed { .. })
        ));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_rejected_enable() {
        let mock = Builder::new()
            .read(b"\r\nLogin: ")
            .write(b"admin\n")
            .read(b"Password: ")
            .write(b"secret\n")
            .read(b"\r\nUser> ")
            .write(b"enable\n")
            .read(b"Password: ")
            .write(b"secret\n")
            .read(b"\r\nBad password\r\nUser> ")
            .build();
        let mut session = session(mock);
        let err = session.connect().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Driver(DriverError::PrivilegeAcquisitionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_handshake_deadline() {
        let mock = Builder::new()
            .read(b"\r\nLogin: ")
            .write(b"admin\n")
            .wait(Duration::from_secs(3))
            .build();
        let mut session = session(mock);
        let err = session.connect().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[tokio::test]
    async fn test_quiet_read() {
        let mock = login(&mut Builder::new())
            .write(b"pingonu 1\r\n")
            .read(b"pingonu 1\r\nreply from onu\r\ndone\r\n")
            .wait(Duration::from_millis(200))
            .build();
        let mut session = session(mock);
        session.connect().await.unwrap();

        let response = session
            .run_with("pingonu 1", &RunOptions::quiet())
            .await
            .unwrap();
        assert_eq!(response.result, "reply from onu\r\ndone");
    }

    #[tokio::test]
    async fn test_run_commands_stops_at_first_error() {
        let mock = login(&mut Builder::new())
            .write(b"config\r\n")
            .read(b"config\r\nAdmin(config)# ")
            .write(b"bogus\r\n")
            .read(b"bogus\r\n% Unknown command.\r\nAdmin(config)# ")
            .build();
        let mut session = session(mock);
        session.connect().await.unwrap();

        let err = session
            .run_commands(&["config", "bogus", "never sent"])
            .await
            .unwrap_err();
        assert!(err.is_command_failure());
    }
}
