//! Extractors for ONU QinQ classification profiles and OLT QinQ domains.

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::types::{Direction, FieldType, Operator, QinqAction, QinqServiceType};
use crate::value::{coerce, decode_hex_bytes, Value, UNSET, UNSET_COS};

static BRACKETED_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-+.*\[(.+)\].*-+").expect("valid bracketed name regex"));

static PROFILE_INDEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Index:\s*(\d+)").expect("valid profile index regex"));
static PROFILE_RULE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Type:\s+(.+?)\s+Value:\s+(.+?)\s+Operator:\s+(.+?)\s*$")
        .expect("valid profile rule regex")
});

static DOMAIN_INDEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Domain index:\s*(\d+)\s*Service num:\s*(\d+)").expect("valid domain regex")
});
static SERVICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Service type:\s*(\d+)\s*Service ID:\s*(\d+)").expect("valid service regex")
});
static SERVICE_RULE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Service\[(\d+)\] (\w+) rule:").expect("valid service rule regex")
});
static STREAM_RULE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Type\[(\d+)\]\s+val\[(.+)\]\s+opt\[(\d+)\]").expect("valid stream rule regex")
});
static LAYER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^Layer\s*(\d+):\s*oldvlan\[(.+?)\]\s*oldcos\[(.+?)\]\s*action\[(.+?)\]\s*tpid\[(.+?)\]\s*cos\[(.+?)\]\s*newvlan\[(.+?)\]",
    )
    .expect("valid vlan layer regex")
});

static BOUND_INFO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Pon bound info: slot id: (\d+); pon id: (\d+)").expect("valid bound info regex")
});

/// One match rule of a classification profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationRule {
    pub field: FieldType,
    /// Integer for hex-dumped fields, otherwise the printed text with
    /// spaces removed.
    pub value: Value,
    pub operator: Operator,
}

/// An ONU QinQ classification profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationProfile {
    pub name: String,
    pub index: Option<i64>,
    pub rules: Vec<ClassificationRule>,
}

/// Decode a value printed by `show onuqinq-classification-profile`.
pub fn decode_onu_field_value(field: FieldType, text: &str) -> Value {
    if field.is_hex_encoded() {
        match decode_hex_bytes(text) {
            Some(n) => Value::Int(n),
            None => Value::Text(text.trim().to_string()),
        }
    } else {
        Value::Text(text.split_whitespace().collect())
    }
}

/// `show onuqinq-classification-profile`.
///
/// Rules with a type or operator label this crate does not know are
/// skipped with a warning.
pub fn onu_qinq_classification_profiles(text: &str) -> Vec<ClassificationProfile> {
    let mut profiles: Vec<ClassificationProfile> = Vec::new();
    for line in text.lines() {
        if let Some(caps) = BRACKETED_NAME_RE.captures(line) {
            profiles.push(ClassificationProfile {
                name: caps[1].trim().to_string(),
                index: None,
                rules: Vec::new(),
            });
            continue;
        }
        let Some(profile) = profiles.last_mut() else {
            continue;
        };
        if let Some(caps) = PROFILE_INDEX_RE.captures(line) {
            profile.index = caps[1].parse().ok();
        } else if let Some(caps) = PROFILE_RULE_RE.captures(line) {
            let (Some(field), Some(operator)) =
                (FieldType::from_label(&caps[1]), Operator::from_label(&caps[3]))
            else {
                warn!("skipping unrecognized classification rule '{}'", line.trim());
                continue;
            };
            profile.rules.push(ClassificationRule {
                field,
                value: decode_onu_field_value(field, &caps[2]),
                operator,
            });
        }
    }
    profiles
}

/// One stream match rule of an OLT QinQ domain service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamRule {
    /// OLT field id (1 = Dst Mac ... 27 = IPv6 Next Header).
    pub field: u8,
    pub value: Value,
    pub operator: u8,
}

/// Decode a `val[...]` printed by `show oltqinq-domain`, keyed by field id.
pub fn decode_olt_field_value(field: u8, text: &str) -> Value {
    match field {
        1 | 2 => {
            // The device pads MAC values with four trailing digits.
            let mac: Vec<char> = text.split_whitespace().flat_map(str::chars).collect();
            let keep = mac.len().saturating_sub(4);
            Value::Text(mac[..keep].iter().collect())
        }
        12..=15 | 22 | 23 => Value::Text(text.trim().to_string()),
        3..=8 | 10 | 11 | 16..=21 | 24..=27 => match decode_hex_bytes(text) {
            Some(n) => Value::Int(n),
            None => Value::Text(text.trim().to_string()),
        },
        _ => {
            warn!("unknown oltqinq field id {}", field);
            Value::Text(text.trim().to_string())
        }
    }
}

/// One VLAN layer of a domain service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VlanLayer {
    pub layer: i64,
    /// Null when unset (65535).
    pub old_vlan: Value,
    /// Null when unset (255).
    pub old_cos: Value,
    pub action: QinqAction,
    pub tpid: Value,
    pub cos: Value,
    pub new_vlan: Value,
}

/// One service of an OLT QinQ domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainService {
    pub no: i64,
    pub service_type: QinqServiceType,
    pub upstream: Vec<StreamRule>,
    pub downstream: Vec<StreamRule>,
    pub vlan: Vec<VlanLayer>,
}

impl DomainService {
    /// Rules for one direction.
    pub fn rules(&self, direction: Direction) -> &[StreamRule] {
        match direction {
            Direction::Upstream => &self.upstream,
            Direction::Downstream => &self.downstream,
        }
    }
}

/// Parsed `show oltqinq-domain <name>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QinqDomain {
    pub name: String,
    pub index: i64,
    /// Service count as configured.
    pub count: i64,
    pub services: Vec<DomainService>,
}

/// `show oltqinq-domain <name>` / `show oltqinq-domain index <n>`.
///
/// Returns `None` when the output holds no `Domain index` line.
pub fn olt_qinq_domain(text: &str) -> Option<QinqDomain> {
    let mut name = String::new();
    let mut domain: Option<QinqDomain> = None;
    let mut direction: Option<Direction> = None;

    for line in text.lines() {
        if let Some(caps) = BRACKETED_NAME_RE.captures(line) {
            name = caps[1].trim().to_string();
            continue;
        }
        if let Some(caps) = DOMAIN_INDEX_RE.captures(line) {
            domain = Some(QinqDomain {
                name: name.clone(),
                index: caps[1].parse().unwrap_or_default(),
                count: caps[2].parse().unwrap_or_default(),
                services: Vec::new(),
            });
            continue;
        }
        let Some(domain) = domain.as_mut() else {
            continue;
        };

        if let Some(caps) = SERVICE_RE.captures(line) {
            let service_type = if &caps[1] == "0" {
                QinqServiceType::Single
            } else {
                QinqServiceType::Share
            };
            domain.services.push(DomainService {
                no: caps[2].parse().unwrap_or_default(),
                service_type,
                upstream: Vec::new(),
                downstream: Vec::new(),
                vlan: Vec::new(),
            });
            direction = None;
            continue;
        }
        let Some(service) = domain.services.last_mut() else {
            continue;
        };

        if let Some(caps) = SERVICE_RULE_RE.captures(line) {
            direction = caps[2].parse().ok();
        } else if let Some(caps) = STREAM_RULE_RE.captures(line) {
            let (Ok(field), Ok(operator)) = (caps[1].parse::<u8>(), caps[3].parse::<u8>()) else {
                continue;
            };
            let rule = StreamRule {
                field,
                value: decode_olt_field_value(field, &caps[2]),
                operator,
            };
            match direction {
                Some(Direction::Upstream) => service.upstream.push(rule),
                Some(Direction::Downstream) => service.downstream.push(rule),
                None => warn!("stream rule outside of a rule block: '{}'", line.trim()),
            }
        } else if let Some(caps) = LAYER_RE.captures(line) {
            let Some(action) = caps[4].trim().parse().ok().and_then(QinqAction::from_code) else {
                warn!("unknown vlan layer action '{}'", &caps[4]);
                continue;
            };
            service.vlan.push(VlanLayer {
                layer: caps[1].parse().unwrap_or_default(),
                old_vlan: coerce(&caps[2], Some(UNSET)),
                old_cos: coerce(&caps[3], Some(UNSET_COS)),
                action,
                tpid: coerce(&caps[5], None),
                cos: coerce(&caps[6], Some(UNSET_COS)),
                new_vlan: coerce(&caps[7], Some(UNSET)),
            });
        }
    }
    domain
}

/// `show oltqinq-domain <name> bound-info`: the `(slot, pon)` it is bound to.
pub fn qinq_bound_info(text: &str) -> Option<(u32, u32)> {
    text.lines()
        .filter_map(|line| BOUND_INFO_RE.captures(line))
        .find_map(|caps| Some((caps[1].parse().ok()?, caps[2].parse().ok()?)))
}
