//! Small helpers for addresses and port notation.

use std::net::Ipv4Addr;

use crate::error::{Error, Result};

/// Parse a dotted-quad IPv4 address, rejecting anything else.
pub fn parse_ipv4(field: &str, text: &str) -> Result<Ipv4Addr> {
    text.trim()
        .parse::<Ipv4Addr>()
        .map_err(|_| Error::validation(field, format!("'{}' is not an IPv4 address", text)))
}

/// Prefix length of a contiguous netmask, e.g. `255.255.255.0` is 24.
pub fn mask_len(mask: &str) -> Result<u32> {
    let bits = u32::from(parse_ipv4("mask", mask)?);
    let len = bits.leading_ones();
    if bits.checked_shl(len).unwrap_or(0) != 0 {
        return Err(Error::validation(
            "mask",
            format!("'{}' is not a contiguous netmask", mask),
        ));
    }
    Ok(len)
}

/// Split `frame/slot/port` notation into its three numbers.
///
/// ```
/// assert_eq!(oltcli::util::split_frame_slot_port("1/9/2").unwrap(), (1, 9, 2));
/// ```
pub fn split_frame_slot_port(text: &str) -> Result<(u32, u32, u32)> {
    let parts: Vec<u32> = text
        .trim()
        .split('/')
        .map(|p| p.trim().parse::<u32>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| Error::validation("port", format!("'{}' is not frame/slot/port", text)))?;
    match parts.as_slice() {
        [frame, slot, port] => Ok((*frame, *slot, *port)),
        _ => Err(Error::validation(
            "port",
            format!("'{}' is not frame/slot/port", text),
        )),
    }
}
