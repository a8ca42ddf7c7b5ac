//! Device facades.
//!
//! [`An6k17`] offers one async method per CLI feature of the AN6000-17.
//! Every method opens its own session, moves to the view the command
//! belongs to (see [`Scope`]), runs its commands and closes the session
//! again. Methods that change state re-read it afterwards where the device
//! offers a way to, and fail with a verification error if it did not
//! converge.
//!
//! Arguments are checked before anything is sent; a bad VLAN id or name is
//! a validation error, never a half-applied configuration.
//!
//! # Example
//!
//! ```rust,no_run
//! use oltcli::device::OltCli;
//! use oltcli::inventory::DeviceInfo;
//!
//! # async fn example() -> Result<(), oltcli::Error> {
//! let olt = OltCli::get(&DeviceInfo::new("10.0.0.1", "admin", "secret"))?;
//! println!("device time: {}", olt.system_time().await?);
//! for onu in olt.authorization().await? {
//!     println!("{} {}", onu["PhyId"], onu["OST"]);
//! }
//! # Ok(())
//! # }
//! ```

mod bandwidth;
mod command;
mod onu;
mod port;
mod qinq;
mod service_vlan;
mod system;
pub(crate) mod validate;
mod wan;
mod whitelist;

pub use bandwidth::{BandwidthLimits, PortPolicing, ProfileRef};
pub use command::CommandLine;
pub use port::UplinkPorts;
pub use onu::{Eth, OnuLocation, ServiceClassification, Translate, VlanRule, VlanTarget};
pub use qinq::{DomainRef, StreamRuleSpec, VlanLayerSpec};
pub use system::CapsProfile;
pub use wan::{static_dsp, WanBindings, WanConfig, WanVlanConfig};

use log::debug;

use crate::driver::{Driver, Session, SessionBuilder, SessionOptions};
use crate::error::{PlatformError, Result};
use crate::extract::Record;
use crate::inventory::DeviceInfo;
use crate::platform::vendors::fiberhome;
use secrecy::ExposeSecret;

/// The CLI view a command runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Global configuration.
    Config,
    /// `interface pon 1/<slot>/<pon>`.
    Pon { slot: u32, pon: u32 },
    /// The IGMP view under configuration.
    Igmp,
    /// The out-of-band management interface.
    Meth,
}

impl Scope {
    /// Commands that move a fresh session into this view.
    pub fn enter_commands(&self) -> Vec<String> {
        let mut commands = vec!["config".to_string()];
        match self {
            Scope::Config => {}
            Scope::Pon { slot, pon } => commands.push(format!("interface pon 1/{}/{}", slot, pon)),
            Scope::Igmp => commands.push("igmp".to_string()),
            Scope::Meth => commands.push("interface meth 1".to_string()),
        }
        commands
    }
}

/// Facade for the FiberHome AN6000-17.
#[derive(Debug, Clone)]
pub struct An6k17 {
    device: DeviceInfo,
    options: SessionOptions,
}

impl An6k17 {
    pub fn new(device: DeviceInfo) -> Self {
        Self {
            device,
            options: SessionOptions::default(),
        }
    }

    /// Use these timing options for every session this facade opens.
    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    /// Connect and enter `scope`.
    ///
    /// The caller owns the session. Dropping it closes the socket.
    pub async fn open(&self, scope: Scope) -> Result<Session> {
        let mut session = SessionBuilder::new(&self.device.host)
            .port(self.device.port)
            .username(&self.device.username)
            .password(self.device.password.expose_secret())
            .model(&self.device.model)
            .options(self.options.clone())
            .build()?;
        session.connect().await?;
        for command in scope.enter_commands() {
            session.run(&command).await?;
        }
        Ok(session)
    }

    /// Run one command in `scope` and return its output.
    pub async fn query(&self, scope: Scope, command: impl Into<String>) -> Result<String> {
        let command = command.into();
        let mut session = self.open(scope).await?;
        let response = session.run(&command).await?;
        session.disconnect().await?;
        Ok(response.result)
    }

    /// Run commands in order in one session, stopping at the first failure.
    pub async fn execute<I, C>(&self, scope: Scope, commands: I) -> Result<()>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let commands: Vec<String> = commands.into_iter().map(Into::into).collect();
        let mut session = self.open(scope).await?;
        for command in &commands {
            session.run(command).await?;
        }
        session.disconnect().await
    }
}

/// Picks the facade for a device's model.
pub struct OltCli;

impl OltCli {
    /// The facade for `device`, or an unsupported-model error.
    pub fn get(device: &DeviceInfo) -> Result<An6k17> {
        if device.model.eq_ignore_ascii_case(fiberhome::MODEL) {
            debug!("using AN6000-17 facade for {}", device.host);
            Ok(An6k17::new(device.clone()))
        } else {
            Err(PlatformError::UnknownModel {
                model: device.model.clone(),
            }
            .into())
        }
    }
}

/// Integer field of a record as a `u32`.
pub(crate) fn field_u32(record: &Record, key: &str) -> Option<u32> {
    record.int(key).and_then(|v| u32::try_from(v).ok())
}
