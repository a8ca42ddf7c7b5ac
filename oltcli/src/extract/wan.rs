//! Extractor for `show onu wan-cfg`.
//!
//! The device prints a WAN connection as one long line:
//!
//! ```text
//! show wancfg:slot 4 8 1 2 wan_name INTERNET_R_VID_2000 INTERNET route vlan 2000 cos 4 nat enable
//! qos disable upnp disable DSP pppoe 0 mode auto fiberhome fiberhome xxx transparent translate
//! disable tvlan 65535 tcos 65535 qinq disable 33024 65535 bind item 4 1   2   3   101
//! ```

use std::net::Ipv4Addr;

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::types::{DspMode, PppoeMode, VlanMode, WanMode, WanType};
use crate::value::{coerce, str_to_bool, Value, UNSET, UNSET_COS};

static NO_WANCFG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"slot_out \d+ \d+ \d+ index \d+ no wancfg").expect("valid no-wancfg regex")
});
static MANDATORY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"show wancfg:slot\s+(\d+)\s+(\d+)\s+(\d+)\s+(\d+)\s+wan_name\s+(\S+)\s+([\w-]+)\s+(\w+)\s+vlan\s+(\d+)\s+cos\s+(\d+)\s+nat\s+(\w+)\s+qos\s+(\w+)\s+upnp\s+(\w+)",
    )
    .expect("valid wan-cfg regex")
});
static PPPOE_DSP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"DSP\s+(pppoe)\s+(\d+)\s+mode\s+(\w+)\s+(\S+)\s+(\S+)\s+(\S+)")
        .expect("valid pppoe dsp regex")
});
static STATIC_DSP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"DSP\s+(static)\s+ip\s+(\d+\.\d+\.\d+\.\d+)\s+(\d+\.\d+\.\d+\.\d+)\s+(\d+\.\d+\.\d+\.\d+)\s+(\d+\.\d+\.\d+\.\d+)\s+(\d+\.\d+\.\d+\.\d+)",
    )
    .expect("valid static dsp regex")
});
static DSP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"DSP\s+([\w-]+)").expect("valid dsp regex"));
static VLAN_MODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\w+)\s+translate\s+(\w+)\s+tvlan\s+(\d+)\s+tcos\s+(\d+)\s+qinq\s+(\w+)\s+(\d+)\s+(\d+)(?:\s+(\d+))?",
    )
    .expect("valid vlan mode regex")
});
static BIND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"bind\s+item\s+(\d+)\s*([\d\s]*)").expect("valid bind regex"));

/// How the WAN connection gets its address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "dsp", rename_all = "kebab-case")]
pub enum WanDsp {
    Dhcp,
    DhcpRemoteId,
    Static {
        ip: Ipv4Addr,
        mask: Ipv4Addr,
        gateway: Ipv4Addr,
        dns_master: Ipv4Addr,
        dns_slave: Ipv4Addr,
    },
    Pppoe {
        proxy: bool,
        mode: PppoeMode,
        username: String,
        password: String,
        server_name: String,
    },
}

impl WanDsp {
    pub fn mode(&self) -> DspMode {
        match self {
            WanDsp::Dhcp => DspMode::Dhcp,
            WanDsp::DhcpRemoteId => DspMode::DhcpRemoteId,
            WanDsp::Static { .. } => DspMode::Static,
            WanDsp::Pppoe { .. } => DspMode::Pppoe,
        }
    }
}

/// VLAN handling of the WAN connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WanVlan {
    pub mode: VlanMode,
    pub translate: bool,
    pub tvid: Value,
    pub tcos: Value,
    pub qinq: bool,
    pub stpid: Value,
    pub svlan: Value,
    pub scos: Value,
}

/// Parsed `show onu wan-cfg` for one WAN index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WanCfgReport {
    pub slot: u32,
    pub pon: u32,
    pub onu: u32,
    pub index: u32,
    pub name: String,
    pub mode: WanMode,
    pub wan_type: WanType,
    pub vlan: u16,
    pub cos: u8,
    pub nat: bool,
    pub qos: bool,
    pub upnp: bool,
    pub vlan_mode: Option<WanVlan>,
    pub dsp: WanDsp,
    /// Bound Ethernet ports, 1-based.
    pub fe: Vec<u8>,
    /// Bound SSIDs, 1-based.
    pub ssid: Vec<u8>,
}

/// `show onu wan-cfg <index>`.
///
/// Returns `None` when the device reports `no wancfg` or prints nothing
/// recognizable.
pub fn wan_cfg(text: &str) -> Option<WanCfgReport> {
    if NO_WANCFG_RE.is_match(text) {
        return None;
    }
    let Some(caps) = MANDATORY_RE.captures(text) else {
        if !text.trim().is_empty() {
            warn!("unrecognized wan-cfg output: {}", text.trim());
        }
        return None;
    };

    let num = |i: usize| caps[i].parse::<u32>().ok();
    let mut report = WanCfgReport {
        slot: num(1)?,
        pon: num(2)?,
        onu: num(3)?,
        index: num(4)?,
        name: caps[5].to_string(),
        mode: caps[6].parse().ok()?,
        wan_type: caps[7].parse().ok()?,
        vlan: caps[8].parse().ok()?,
        cos: caps[9].parse().ok()?,
        nat: str_to_bool(&caps[10]).unwrap_or_default(),
        qos: str_to_bool(&caps[11]).unwrap_or_default(),
        upnp: str_to_bool(&caps[12]).unwrap_or_default(),
        vlan_mode: None,
        dsp: dsp(text),
        fe: Vec::new(),
        ssid: Vec::new(),
    };

    if let Some(caps) = VLAN_MODE_RE.captures(text) {
        report.vlan_mode = caps[1].parse().ok().map(|mode| WanVlan {
            mode,
            translate: str_to_bool(&caps[2]).unwrap_or_default(),
            tvid: coerce(&caps[3], Some(UNSET)),
            tcos: coerce(&caps[4], Some(UNSET)),
            qinq: str_to_bool(&caps[5]).unwrap_or_default(),
            stpid: coerce(&caps[6], None),
            svlan: coerce(&caps[7], Some(UNSET)),
            scos: caps
                .get(8)
                .map(|m| coerce(m.as_str(), Some(UNSET_COS)))
                .unwrap_or(Value::Null),
        });
    }

    if let Some(caps) = BIND_RE.captures(text) {
        for token in caps[2].split_whitespace() {
            match token.as_bytes() {
                [d @ b'0'..=b'9'] => report.fe.push(d - b'0'),
                [b'1', b'0', d @ b'0'..=b'9'] => report.ssid.push(d - b'0'),
                _ => warn!("unknown wan-cfg bind item '{}'", token),
            }
        }
    }
    Some(report)
}

fn dsp(text: &str) -> WanDsp {
    if let Some(caps) = PPPOE_DSP_RE.captures(text) {
        if let Ok(mode) = caps[3].parse() {
            return WanDsp::Pppoe {
                proxy: &caps[2] == "1",
                mode,
                username: caps[4].to_string(),
                password: caps[5].to_string(),
                server_name: caps[6].to_string(),
            };
        }
    }
    if let Some(caps) = STATIC_DSP_RE.captures(text) {
        let ip = |i: usize| caps[i].parse::<Ipv4Addr>().ok();
        if let (Some(ip_addr), Some(mask), Some(gateway), Some(dns_master), Some(dns_slave)) =
            (ip(2), ip(3), ip(4), ip(5), ip(6))
        {
            return WanDsp::Static {
                ip: ip_addr,
                mask,
                gateway,
                dns_master,
                dns_slave,
            };
        }
    }
    match DSP_RE.captures(text).map(|caps| caps[1].parse::<DspMode>()) {
        Some(Ok(DspMode::Dhcp)) => WanDsp::Dhcp,
        _ => WanDsp::DhcpRemoteId,
    }
}
