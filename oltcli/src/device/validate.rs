//! Argument checks run before any command is sent.

use std::net::Ipv4Addr;

use crate::error::{Error, Result};
use crate::util::{mask_len, parse_ipv4};

pub(crate) fn vlan(field: &str, vid: u16) -> Result<u16> {
    if (1..=4094).contains(&vid) {
        Ok(vid)
    } else {
        Err(Error::validation(field, format!("VLAN {} is outside 1..=4094", vid)))
    }
}

pub(crate) fn aging_time(seconds: u32) -> Result<u32> {
    if seconds <= 3600 {
        Ok(seconds)
    } else {
        Err(Error::validation(
            "aging_time",
            format!("{} s is outside 0..=3600", seconds),
        ))
    }
}

/// Ethernet, service and WAN indexes count from 1.
pub(crate) fn index(field: &str, value: u32) -> Result<u32> {
    if value >= 1 {
        Ok(value)
    } else {
        Err(Error::validation(field, "index must be at least 1"))
    }
}

pub(crate) fn name<'a>(field: &str, name: &'a str) -> Result<&'a str> {
    if name.is_empty() {
        Err(Error::validation(field, "name is empty"))
    } else if name.chars().any(char::is_whitespace) {
        Err(Error::validation(field, format!("'{}' contains whitespace", name)))
    } else {
        Ok(name)
    }
}

pub(crate) fn ipv4(field: &str, text: &str) -> Result<Ipv4Addr> {
    parse_ipv4(field, text)
}

/// Prefix length of a mask given either as `24` or as `255.255.255.0`.
pub(crate) fn prefix_len(mask: &str) -> Result<u32> {
    match mask.trim().parse::<u32>() {
        Ok(len) if len <= 32 => Ok(len),
        Ok(len) => Err(Error::validation("mask", format!("prefix length {} exceeds 32", len))),
        Err(_) => mask_len(mask),
    }
}

/// A netmask given either way, rendered as a dotted quad.
pub(crate) fn dotted_mask(mask: &str) -> Result<Ipv4Addr> {
    let len = prefix_len(mask)?;
    let bits = u32::MAX.checked_shl(32 - len).unwrap_or(0);
    Ok(Ipv4Addr::from(bits))
}
