//! Extractors for PON and uplink port state.

use indexmap::IndexMap;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::record::Record;
use crate::error::{Error, Result};
use crate::types::{AuthMode, VlanTag};
use crate::value::{coerce, str_to_bool};

static AUTH_MODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^slot (\d+) pon (\d+) ,auth mode is (.+?)\.?\s*$").expect("valid auth mode regex")
});

static AUTO_DISCOVER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^slot\s*(\d+)\s*pon\s*(\d+)\s*:\s*(\w+)\s*,\s*agingtime:\s*(\d+)\s*s")
        .expect("valid auto-discover regex")
});

static PON_AUTO_DISCOVER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^auto-discover-onu:\s+(\w+),\s+agingtime:\s+(\d+)")
        .expect("valid pon auto-discover regex")
});

static PORT_VLAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)(?:\s?~\s?(\d+))?\s?\(([UT])\)").expect("valid port vlan regex")
});

static CARD_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(CARD)\s+(EXIST)\s+(CONFIG)\s+(DETECT)\s+(DETAIL)(?:\s+(BLOCK))?")
        .expect("valid card title regex")
});
static CARD_ROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\s+([\w-]+)\s+([\w-]+)\s+([\w-]+)\s+([\w/-]+)(?:\s+([\w-]+))?")
        .expect("valid card row regex")
});

static PON_BANDWIDTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"BANDWIDTH:\s*UP\s*(\d+)\s*DOWN\s*(\d+)").expect("valid pon bandwidth regex")
});

/// `show port authentication-mode`: mode per `(slot, pon)`.
///
/// Lines whose mode wording is not recognized are skipped with a warning.
pub fn port_authentication_mode(text: &str) -> IndexMap<(u32, u32), AuthMode> {
    let mut modes = IndexMap::new();
    for caps in text.lines().filter_map(|line| AUTH_MODE_RE.captures(line)) {
        let (Ok(slot), Ok(pon)) = (caps[1].parse(), caps[2].parse()) else {
            continue;
        };
        match AuthMode::from_description(&caps[3]) {
            Some(mode) => {
                modes.insert((slot, pon), mode);
            }
            None => warn!("unknown authentication mode '{}' on {}/{}", &caps[3], slot, pon),
        }
    }
    modes
}

/// One line of `show onu auto-discover 1/<slot>/<port>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoDiscover {
    pub slot: u32,
    pub pon: u32,
    pub enabled: bool,
    pub aging_time: u32,
}

/// `show onu auto-discover` at config level.
pub fn auto_discover(text: &str) -> Vec<AutoDiscover> {
    text.lines()
        .filter_map(|line| AUTO_DISCOVER_RE.captures(line))
        .filter_map(|caps| {
            Some(AutoDiscover {
                slot: caps[1].parse().ok()?,
                pon: caps[2].parse().ok()?,
                enabled: str_to_bool(&caps[3])?,
                aging_time: caps[4].parse().ok()?,
            })
        })
        .collect()
}

/// Auto-discover state of a single PON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PonAutoDiscover {
    pub enabled: bool,
    pub aging_time: u32,
}

/// `show onu auto-discover` inside a PON interface.
pub fn pon_auto_discover(text: &str) -> Result<PonAutoDiscover> {
    text.lines()
        .filter_map(|line| PON_AUTO_DISCOVER_RE.captures(line))
        .find_map(|caps| {
            Some(PonAutoDiscover {
                enabled: str_to_bool(&caps[1])?,
                aging_time: caps[2].parse().ok()?,
            })
        })
        .ok_or_else(|| Error::data_not_found("auto-discover state"))
}

/// A VLAN range on an uplink port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VlanRange {
    pub begin: u16,
    pub end: u16,
    pub tag: VlanTag,
}

impl VlanRange {
    /// True if `other` lies within this range with the same tagging.
    pub fn covers(&self, other: &VlanRange) -> bool {
        self.tag == other.tag && self.begin <= other.begin && other.end <= self.end
    }
}

/// `show port vlan 1/<slot>/<port>`.
///
/// ```text
/// port  9:2,
/// vlan(optin):
/// 1000(U) .
/// 1251 ~ 1254(T).
/// ```
pub fn port_vlan(text: &str) -> Vec<VlanRange> {
    text.lines()
        .filter_map(|line| PORT_VLAN_RE.captures(line))
        .filter_map(|caps| {
            let begin: u16 = caps[1].parse().ok()?;
            let end = match caps.get(2) {
                Some(end) => end.as_str().parse().ok()?,
                None => begin,
            };
            let tag = if &caps[3] == "T" {
                VlanTag::Tag
            } else {
                VlanTag::Untag
            };
            Some(VlanRange { begin, end, tag })
        })
        .collect()
}

/// `show card info`: CARD EXIST CONFIG DETECT DETAIL, plus BLOCK on newer
/// firmware. Empty slots show `---`.
pub fn card_info(text: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut titles: Option<Vec<String>> = None;
    for line in text.lines() {
        if let Some(caps) = CARD_TITLE_RE.captures(line) {
            titles = Some(
                caps.iter()
                    .skip(1)
                    .flatten()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            );
            continue;
        }
        let (Some(titles), Some(caps)) = (titles.as_deref(), CARD_ROW_RE.captures(line)) else {
            continue;
        };
        let record: Record = titles
            .iter()
            .zip(caps.iter().skip(1))
            .filter_map(|(title, m)| Some((title.clone(), coerce(m?.as_str(), None))))
            .collect();
        records.push(record);
    }
    records
}

/// Upstream and downstream bandwidth of a PON, in kbit/s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PonBandwidth {
    pub up: u64,
    pub down: u64,
}

/// `show bandwidth` inside a PON interface.
pub fn pon_bandwidth(text: &str) -> Option<PonBandwidth> {
    text.lines()
        .filter_map(|line| PON_BANDWIDTH_RE.captures(line))
        .find_map(|caps| {
            Some(PonBandwidth {
                up: caps[1].parse().ok()?,
                down: caps[2].parse().ok()?,
            })
        })
}
