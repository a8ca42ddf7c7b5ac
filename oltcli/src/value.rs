//! Typed values coerced from raw CLI tokens.
//!
//! Device output is all text. Every extractor funnels the tokens it pulls
//! out of a line through [`coerce`] so that numbers come back as numbers,
//! timestamps as [`NaiveDateTime`] and reserved "unset" markers as
//! [`Value::Null`].

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Sentinel used by the device for unset ids, VLANs and profile slots.
pub const UNSET: i64 = 65535;

/// Sentinel used by the device for unset CoS values.
pub const UNSET_COS: i64 = 255;

static INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").expect("valid int regex"));
static HEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?)0[xX]([0-9a-fA-F]+)$").expect("valid hex regex"));
static FLOAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+\.\d+$").expect("valid float regex"));
static DATETIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})\s(\d{1,2}):(\d{1,2}):(\d{1,2})$")
        .expect("valid datetime regex")
});

/// A single coerced field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Semantic null: a sentinel or the zero epoch.
    Null,
    Int(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S")),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

/// Coerce a raw token into a [`Value`].
///
/// The token is trimmed, then tried as an integer (decimal or `0x` hex),
/// a decimal float, and a `YYYY-MM-DD HH:MM:SS` timestamp, in that order.
/// Anything else is returned as text. When `null_sentinel` is given, an
/// integer equal to it becomes [`Value::Null`]; the all-zero timestamp is
/// always null.
///
/// # Example
///
/// ```
/// use oltcli::value::{coerce, Value, UNSET};
///
/// assert_eq!(coerce(" 42 ", None), Value::Int(42));
/// assert_eq!(coerce("0x11", None), Value::Int(17));
/// assert_eq!(coerce("65535", Some(UNSET)), Value::Null);
/// assert_eq!(coerce("up", None), Value::Text("up".into()));
/// ```
pub fn coerce(text: &str, null_sentinel: Option<i64>) -> Value {
    let text = text.trim();
    let value = coerce_trimmed(text);
    match (value, null_sentinel) {
        (Value::Int(v), Some(sentinel)) if v == sentinel => Value::Null,
        (value, _) => value,
    }
}

/// [`coerce`] over an optional token; `None` stays `None`.
pub fn coerce_opt(text: Option<&str>, null_sentinel: Option<i64>) -> Option<Value> {
    text.map(|t| coerce(t, null_sentinel))
}

fn coerce_trimmed(text: &str) -> Value {
    if INT_RE.is_match(text) {
        if let Ok(v) = text.parse::<i64>() {
            return Value::Int(v);
        }
    } else if let Some(caps) = HEX_RE.captures(text) {
        if let Ok(v) = i64::from_str_radix(&caps[2], 16) {
            return Value::Int(if caps[1].is_empty() { v } else { -v });
        }
    } else if FLOAT_RE.is_match(text) {
        if let Ok(v) = text.parse::<f64>() {
            return Value::Float(v);
        }
    } else if let Some(caps) = DATETIME_RE.captures(text) {
        let parts: Vec<u32> = (1..=6)
            .filter_map(|i| caps[i].parse::<u32>().ok())
            .collect();
        if parts.len() == 6 {
            if parts.iter().all(|p| *p == 0) {
                return Value::Null;
            }
            if let Some(ts) = NaiveDate::from_ymd_opt(parts[0] as i32, parts[1], parts[2])
                .and_then(|d| d.and_hms_opt(parts[3], parts[4], parts[5]))
            {
                return Value::Timestamp(ts);
            }
        }
    }
    Value::Text(text.to_string())
}

/// Decode a space separated hex byte dump into an integer.
///
/// Leading and trailing `00` bytes are padding and are stripped first; an
/// all-zero dump decodes to 0. Returns `None` if a token is not a hex byte
/// or the value does not fit in an `i64`.
///
/// ```
/// use oltcli::value::decode_hex_bytes;
///
/// assert_eq!(decode_hex_bytes("00 00 04 57 00 00"), Some(1111));
/// assert_eq!(decode_hex_bytes("00 00 00"), Some(0));
/// ```
pub fn decode_hex_bytes(text: &str) -> Option<i64> {
    let bytes: Vec<&str> = text.split_whitespace().collect();
    if bytes
        .iter()
        .any(|b| b.is_empty() || b.len() > 2 || !b.chars().all(|c| c.is_ascii_hexdigit()))
    {
        return None;
    }

    let is_zero = |b: &&str| b.chars().all(|c| c == '0');
    let start = bytes.iter().position(|b| !is_zero(b));
    let end = bytes.iter().rposition(|b| !is_zero(b));
    match (start, end) {
        (Some(start), Some(end)) => {
            let digits: String = bytes[start..=end]
                .iter()
                .map(|b| format!("{:0>2}", b))
                .collect();
            i64::from_str_radix(&digits, 16).ok()
        }
        _ => Some(0),
    }
}

/// Parse the device's enable/disable wording.
pub fn str_to_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "enable" | "enabled" => Some(true),
        "disable" | "disabled" => Some(false),
        _ => None,
    }
}

/// Render a flag the way commands expect it.
pub fn bool_to_str(flag: bool) -> &'static str {
    if flag { "enable" } else { "disable" }
}
