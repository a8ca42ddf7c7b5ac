//! Telnet transport layer.
//!
//! This module provides the low-level connection management: dialing the
//! device, refusing telnet option negotiation and escaping outgoing data.

pub mod config;
mod telnet;

pub use config::TelnetConfig;
pub use telnet::{escape_iac, Dialer, IacParser, TcpDialer, TelnetTransport};
