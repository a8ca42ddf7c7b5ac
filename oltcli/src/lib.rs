//! # oltcli
//!
//! Async telnet CLI automation for the FiberHome AN6000-17 OLT.
//!
//! oltcli logs in over telnet, climbs to the privileged prompt and drives
//! the device's command line: it frames each reply by the prompt that
//! follows it, turns the text tables the device prints into typed records
//! and offers one method per configuration feature on top of that.
//!
//! ## Layers
//!
//! - [`transport`]: TCP dialing and telnet option refusal
//! - [`channel`]: prompt detection at the tail of the read buffer
//! - [`driver`]: the login handshake and command turn-taking ([`Session`])
//! - [`extract`]: parsers for `show` output
//! - [`device`]: the [`An6k17`] facade, one session per call, with
//!   read-back verification of changes
//! - [`action`]: multi-step business verbs
//! - [`batch`]: bounded-concurrency fan-out over many facade calls
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oltcli::device::OltCli;
//! use oltcli::inventory::DeviceInfo;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), oltcli::Error> {
//!     let olt = OltCli::get(&DeviceInfo::new("192.168.1.100", "GEPON", "GEPON"))?;
//!
//!     for onu in olt.authorization().await? {
//!         println!("{} {} {}", onu["Onu"], onu["PhyId"], onu["OST"]);
//!     }
//!     olt.set_igmp_vlan(3000).await?;
//!     Ok(())
//! }
//! ```
//!
//! Lower-level use goes through a [`Session`]:
//!
//! ```rust,no_run
//! use oltcli::{Driver, SessionBuilder};
//!
//! # async fn example() -> Result<(), oltcli::Error> {
//! let mut session = SessionBuilder::new("192.168.1.100")
//!     .username("GEPON")
//!     .password("GEPON")
//!     .build()?;
//! session.connect().await?;
//! let response = session.run("show version").await?;
//! println!("{}", response.result);
//! session.disconnect().await?;
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod batch;
pub mod channel;
pub mod device;
pub mod driver;
pub mod error;
pub mod extract;
pub mod inventory;
pub mod platform;
pub mod transport;
pub mod types;
pub mod util;
pub mod value;
pub mod wait;

#[cfg(test)]
mod testing;

pub use batch::{BatchReport, TaskGroup};
pub use device::{An6k17, OltCli, Scope};
pub use driver::{Driver, Response, Session, SessionBuilder, SessionOptions};
pub use error::{Error, ErrorKind, Result};
pub use extract::Record;
pub use inventory::{DeviceInfo, Inventory};
pub use platform::{PlatformDefinition, PrivilegeLevel};
pub use transport::TelnetConfig;
pub use value::Value;
