//! Parsers that turn AN6000 CLI output into typed data.
//!
//! Every extractor is a pure function of the cleaned command output. Text
//! that does not match yields an empty result; only extractors whose
//! caller needs a specific datum return [`ParseError::DataNotFound`].
//!
//! Tabular output is parsed with [`Table`]: a title line names the fields
//! and a [`RowLayout`] slices each subsequent row into fixed-width columns.
//! Key/value output is parsed line by line with a regular expression.
//!
//! [`ParseError::DataNotFound`]: crate::error::ParseError::DataNotFound
//!
//! # Example
//!
//! ```
//! use oltcli::extract;
//!
//! let text = "Current Date is 2020-11-23\nCurrent Time is 17:27:45";
//! let now = extract::system_time(text);
//! assert_eq!(now.date, "2020-11-23");
//! ```

mod layout;
mod onu;
mod port;
mod profile;
mod qinq;
mod record;
mod system;
mod wan;
mod whitelist;

use regex::Regex;

use crate::value::{coerce, Value};

pub use layout::{ColumnClass, RowLayout, Table};
pub use onu::{
    authorization, discovery, last_reg_status_change, onu_bandwidth, onu_port_status,
    onu_port_vlan, onu_statistics, Measurement, OnuPortStatus,
};
pub use port::{
    auto_discover, card_info, pon_auto_discover, pon_bandwidth, port_authentication_mode,
    port_vlan, AutoDiscover, PonAutoDiscover, PonBandwidth, VlanRange,
};
pub use profile::{bandwidth_profiles, layer3_rate_limits, service_vlans};
pub use qinq::{
    decode_olt_field_value, decode_onu_field_value, olt_qinq_domain,
    onu_qinq_classification_profiles, qinq_bound_info, ClassificationProfile, ClassificationRule,
    DomainService, QinqDomain, StreamRule, VlanLayer,
};
pub use record::Record;
pub use system::{
    acl, dhcp_state, igmp_mode, igmp_vlan, ip_address, manage_vlans, pppoe_plus, snmp_time,
    system_time, SnmpTime, SystemTime,
};
pub use wan::{wan_cfg, WanCfgReport, WanDsp, WanVlan};
pub use whitelist::whitelist;

/// Pairs of `(trimmed key, coerced value)` from lines matching a two-group
/// key/value pattern.
pub(crate) fn key_values<'a>(
    text: &'a str,
    pattern: &'a Regex,
) -> impl Iterator<Item = (String, Value)> + 'a {
    text.lines()
        .filter_map(move |line| pattern.captures(line))
        .map(|caps| (caps[1].trim().to_string(), coerce(&caps[2], None)))
}
