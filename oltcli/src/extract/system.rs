//! Extractors for system-wide settings: time, management addressing,
//! DHCP/PPPoE relay options and IGMP.

use std::net::Ipv4Addr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::key_values;
use super::record::Record;
use crate::error::{Error, Result};
use crate::value::coerce;

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Current\s+Date\s+is\s+(\d{4}-\d{2}-\d{2})").expect("valid date regex")
});
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Current\s+Time\s+is\s+(\d{2}:\d{2}:\d{2})").expect("valid time regex")
});

static IP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"debugip\s+(\d+\.\d+\.\d+\.\d+)").expect("valid debugip regex"));
static MASK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"mask\s+(\d+\.\d+\.\d+\.\d+)").expect("valid mask regex"));

static ACL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\s+(\d+\.\d+\.\d+\.\d+)\s+(\d+\.\d+\.\d+\.\d+)\s+(\w+)")
        .expect("valid acl regex")
});

static SNMP_INTERVAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"INTERVAL=(\d+)").expect("valid snmp interval regex"));
static SNMP_SERVER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Server\s+IP\s+:\s+(\d+\.\d+\.\d+\.\d+)").expect("valid snmp server regex")
});

static FIRST_COLON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^:]+):(.+)$").expect("valid key/value regex"));
static MANAGE_VLAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\w\s]+):\s(.+)$").expect("valid manage vlan regex"));

/// Clock reading from `show time`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemTime {
    /// `YYYY-MM-DD`, empty if not printed.
    pub date: String,
    /// `HH:MM:SS`, empty if not printed.
    pub time: String,
}

/// `show time`.
///
/// ```text
/// Now time is:
/// Current Date is 2020-11-23
/// Current Time is 17:27:45
/// ```
pub fn system_time(text: &str) -> SystemTime {
    let mut now = SystemTime::default();
    for line in text.lines() {
        if let Some(caps) = DATE_RE.captures(line) {
            now.date = caps[1].to_string();
        } else if let Some(caps) = TIME_RE.captures(line) {
            now.time = caps[1].to_string();
        }
    }
    now
}

/// `show ip address`: the in-band management address and mask.
pub fn ip_address(text: &str) -> Result<(Ipv4Addr, Ipv4Addr)> {
    let mut ip = None;
    let mut mask = None;
    for line in text.lines() {
        if let Some(caps) = IP_RE.captures(line) {
            ip = caps[1].parse().ok();
        }
        if let Some(caps) = MASK_RE.captures(line) {
            mask = caps[1].parse().ok();
        }
    }
    match (ip, mask) {
        (Some(ip), Some(mask)) => Ok((ip, mask)),
        _ => Err(Error::data_not_found("management ip/mask")),
    }
}

/// `show acl`: No IP Mask Status.
pub fn acl(text: &str) -> Vec<Record> {
    const FIELDS: [&str; 4] = ["No", "IP", "Mask", "Status"];
    text.lines()
        .filter_map(|line| ACL_RE.captures(line))
        .map(|caps| {
            FIELDS
                .iter()
                .enumerate()
                .map(|(i, field)| (*field, coerce(&caps[i + 1], None)))
                .collect()
        })
        .collect()
}

/// SNMP time synchronisation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SnmpTime {
    pub ip: Ipv4Addr,
    /// Polling interval in minutes.
    pub interval: u32,
}

/// `show snmp-time`.
pub fn snmp_time(text: &str) -> Result<SnmpTime> {
    let mut ip = None;
    let mut interval = None;
    for line in text.lines() {
        if let Some(caps) = SNMP_INTERVAL_RE.captures(line) {
            interval = caps[1].parse().ok();
        }
        if let Some(caps) = SNMP_SERVER_RE.captures(line) {
            ip = caps[1].parse().ok();
        }
    }
    match (ip, interval) {
        (Some(ip), Some(interval)) => Ok(SnmpTime { ip, interval }),
        _ => Err(Error::data_not_found("snmp-time server/interval")),
    }
}

/// `show dhcp state`, e.g. `DHCP option82  : disabled`.
pub fn dhcp_state(text: &str) -> Record {
    key_values(text, &FIRST_COLON_RE).collect()
}

/// `show pppoe-plus state`.
pub fn pppoe_plus(text: &str) -> Record {
    key_values(text, &FIRST_COLON_RE).collect()
}

/// `show igmp vlan`.
pub fn igmp_vlan(text: &str) -> Record {
    key_values(text, &FIRST_COLON_RE).collect()
}

/// `show igmp mode`. The active mode is under `IGMP/MLD Mode`.
pub fn igmp_mode(text: &str) -> Record {
    key_values(text, &FIRST_COLON_RE).collect()
}

/// `show manage-vlan all`: one record per `Manage name` block.
pub fn manage_vlans(text: &str) -> Vec<Record> {
    let mut records: Vec<Record> = Vec::new();
    for (key, value) in key_values(text, &MANAGE_VLAN_RE) {
        if key == "Manage name" {
            records.push(Record::new());
        }
        if let Some(record) = records.last_mut() {
            record.insert(key, value);
        }
    }
    records
}
