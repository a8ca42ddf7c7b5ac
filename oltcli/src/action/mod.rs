//! Business verbs composed of facade calls.
//!
//! Each action is a short sequence of [`An6k17`](crate::device::An6k17)
//! calls. Sequences are not atomic: when a step fails, the steps before it
//! stay applied.
//!
//! ```rust,no_run
//! use oltcli::action;
//! use oltcli::device::OltCli;
//! use oltcli::inventory::DeviceInfo;
//!
//! # async fn example() -> Result<(), oltcli::Error> {
//! let olt = OltCli::get(&DeviceInfo::new("10.0.0.1", "admin", "secret"))?;
//! action::olt::add_port_vlan(&olt, "1/9/2", "1000-1010", false).await?;
//! let index = action::onu::add_port_service(&olt, "FHTT033178b0", 1, &Default::default()).await?;
//! println!("service {} added", index);
//! # Ok(())
//! # }
//! ```

pub mod olt;
pub mod onu;
