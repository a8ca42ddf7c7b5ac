//! Closed vocabularies used in AN6000 commands and output.
//!
//! Each enum maps to the exact token the CLI expects. Parsing is
//! case-insensitive because `show` commands print some of them in capitals.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The token used on the command line.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| {
                        Error::validation(stringify!($name), format!("unknown value '{}'", s))
                    })
            }
        }
    };
}

wire_enum! {
    /// IGMP operating modes.
    pub enum IgmpMode {
        Control => "control",
        ProxyProxy => "proxy-proxy",
        Snooping => "snooping",
        ProxySnooping => "proxy-snooping",
        Disable => "disable",
    }
}

wire_enum! {
    /// Switches for `dhcp <option> enable|disable`.
    pub enum DhcpOption {
        Option18 => "option18",
        Option37 => "option37",
        Option82 => "option82",
        Patch => "patch",
    }
}

wire_enum! {
    /// Whitelist authorization modes for `whitelist add`.
    pub enum WhitelistMode {
        PhyId => "phy-id",
        PhyIdPsw => "phy-id+psw",
        LogId => "log-id",
        LogIdPsw => "log-id+psw",
        Password => "password",
    }
}

impl WhitelistMode {
    /// Keyword used by `show whitelist` and `no whitelist` for this mode.
    pub fn query_str(&self) -> &'static str {
        match self {
            WhitelistMode::PhyId | WhitelistMode::PhyIdPsw => "phy-id",
            WhitelistMode::LogId | WhitelistMode::LogIdPsw => "logic-id",
            WhitelistMode::Password => "password",
        }
    }
}

wire_enum! {
    /// PON port authentication modes.
    pub enum AuthMode {
        LogId => "log-id",
        LogIdPsw => "log-id+psw",
        NoAuth => "no-auth",
        Password => "password",
        PhyIdPsw => "phy-id+psw",
        PhyIdOrLogIdPswOrPsw => "phy-id/log-id+psw/psw",
        PhyIdOrLogIdOrPsw => "phy-id/log-id/psw",
        PhyIdOrPsw => "phy-id/psw",
        PhyId => "phyid",
    }
}

impl AuthMode {
    /// Map the wording of `show port authentication-mode` to a mode.
    pub fn from_description(text: &str) -> Option<AuthMode> {
        let mode = match text.trim() {
            "logical id" => AuthMode::LogId,
            "logical id + password" => AuthMode::LogIdPsw,
            "no auth" => AuthMode::NoAuth,
            "physical password" => AuthMode::Password,
            "physical id + password" => AuthMode::PhyIdPsw,
            "physical id or logical id + password or physical password" => {
                AuthMode::PhyIdOrLogIdPswOrPsw
            }
            "physical id or logical id or physical password" => AuthMode::PhyIdOrLogIdOrPsw,
            "physical id or physical password" => AuthMode::PhyIdOrPsw,
            "physical id" => AuthMode::PhyId,
            _ => return None,
        };
        Some(mode)
    }
}

wire_enum! {
    /// WAN connection service modes.
    pub enum WanMode {
        Tr069 => "tr069",
        Internet => "internet",
        Tr069Internet => "tr069-internet",
        Other => "other",
        Multi => "multi",
        Voip => "voip",
        VoipInternet => "voip-internet",
        Iptv => "iptv",
        Radius => "radius",
        RadiusInternet => "radius-internet",
        UnicastIptv => "unicast-iptv",
        MulticastIptv => "multicast-iptv",
    }
}

wire_enum! {
    pub enum WanType {
        Bridge => "bridge",
        Route => "route",
    }
}

wire_enum! {
    /// How a WAN connection obtains its address.
    pub enum DspMode {
        Dhcp => "dhcp",
        DhcpRemoteId => "dhcp-remoteid",
        Static => "static",
        Pppoe => "pppoe",
    }
}

wire_enum! {
    /// PPPoE dial behavior.
    pub enum PppoeMode {
        Auto => "auto",
        Payload => "payload",
        Manual => "manual",
    }
}

wire_enum! {
    /// Traffic classification fields.
    pub enum FieldType {
        SourceMac => "sa",
        DestinationMac => "da",
        SourceIp => "sip",
        DestinationIp => "dip",
        VlanId => "vid",
        SourcePort => "sport",
        DestinationPort => "dport",
        IpProtocol => "iptype",
        EthernetType => "eth_type",
        Tos => "tos",
        Priority => "priority",
        DestinationIpv6Prefix => "daipv6pre",
        SourceIpv6Prefix => "saipv6pre",
        IpVersion => "ipver",
        Ipv6TrafficClass => "ipv6tra",
        Ipv6FlowLabel => "ipv6fl",
        Ipv6NextHeader => "ipv6nh",
    }
}

impl FieldType {
    /// Numeric field code used by the QinQ profile commands.
    pub fn code(&self) -> u8 {
        match self {
            FieldType::SourceMac => 0,
            FieldType::DestinationMac => 1,
            FieldType::SourceIp => 2,
            FieldType::DestinationIp => 3,
            FieldType::VlanId => 4,
            FieldType::EthernetType => 5,
            FieldType::IpProtocol => 6,
            FieldType::Priority => 7,
            FieldType::Tos => 8,
            FieldType::SourcePort => 9,
            FieldType::DestinationPort => 10,
            FieldType::DestinationIpv6Prefix => 11,
            FieldType::SourceIpv6Prefix => 12,
            FieldType::IpVersion => 13,
            FieldType::Ipv6TrafficClass => 14,
            FieldType::Ipv6FlowLabel => 15,
            FieldType::Ipv6NextHeader => 16,
        }
    }

    pub fn from_code(code: u8) -> Option<FieldType> {
        FieldType::ALL.iter().copied().find(|f| f.code() == code)
    }

    /// Map the label printed by `show onuqinq-classification-profile`.
    pub fn from_label(label: &str) -> Option<FieldType> {
        let field = match label.trim() {
            "Source MAC Address" => FieldType::SourceMac,
            "Destination MAC Address" => FieldType::DestinationMac,
            "Source IPV4 Address" => FieldType::SourceIp,
            "Destination IPV4 Address" => FieldType::DestinationIp,
            "VLAN ID" => FieldType::VlanId,
            "Ethernet TYPE" => FieldType::EthernetType,
            "IP Protocol Type" => FieldType::IpProtocol,
            "COS" => FieldType::Priority,
            "TOS" => FieldType::Tos,
            "L4 Source Port" => FieldType::SourcePort,
            "L4 Destination Port" => FieldType::DestinationPort,
            "Destination IPV6 Prefix" => FieldType::DestinationIpv6Prefix,
            "Source IPV6 Prefix" => FieldType::SourceIpv6Prefix,
            "IP Version" => FieldType::IpVersion,
            "IPV6 Traffic Class" => FieldType::Ipv6TrafficClass,
            "IPV6 Flow Label" => FieldType::Ipv6FlowLabel,
            "IPV6 Next Header" => FieldType::Ipv6NextHeader,
            _ => return None,
        };
        Some(field)
    }

    /// Fields whose value is printed as a hex byte dump.
    pub fn is_hex_encoded(&self) -> bool {
        matches!(self.code(), 6..=8 | 13..=16)
    }
}

/// Match operators for classification rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    Exist,
    NotExist,
    Always,
}

impl Operator {
    pub const ALL: &'static [Operator] = &[
        Operator::Equal,
        Operator::NotEqual,
        Operator::LessThan,
        Operator::GreaterThan,
        Operator::Exist,
        Operator::NotExist,
        Operator::Always,
    ];

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn from_code(code: u8) -> Option<Operator> {
        Operator::ALL.get(code as usize).copied()
    }

    /// Map the operator wording printed by the device.
    pub fn from_label(label: &str) -> Option<Operator> {
        let op = match label.trim() {
            "=" => Operator::Equal,
            "!=" => Operator::NotEqual,
            "<=" => Operator::LessThan,
            ">=" => Operator::GreaterThan,
            "Exist then match" => Operator::Exist,
            "No exist then match" => Operator::NotExist,
            "Always match" => Operator::Always,
            _ => return None,
        };
        Some(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

wire_enum! {
    pub enum Direction {
        Upstream => "upstream",
        Downstream => "downstream",
    }
}

wire_enum! {
    /// Service VLAN categories.
    pub enum ServiceVlanType {
        Cnc => "cnc",
        Data => "data",
        Iptv => "iptv",
        Ngn => "ngn",
        System => "system",
        UplinkSub => "uplinksub",
        Vod => "vod",
        Voip => "voip",
    }
}

wire_enum! {
    /// Whether an uplink VLAN is tagged on the port.
    pub enum VlanTag {
        Tag => "tag",
        Untag => "untag",
    }
}

wire_enum! {
    /// Clock source for `time mode`.
    pub enum TimeMode {
        Ne => "ne",
        Snmp => "snmp",
        Ntp => "ntp",
        Sntp => "sntp",
        Ptp => "ptp",
    }
}

wire_enum! {
    /// Traffic classes for `traffic-suppress`.
    pub enum SuppressType {
        Broadcast => "broadcast",
        Multicast => "multicast",
        Unknown => "unknown",
        All => "all",
    }
}

wire_enum! {
    /// ONU port service cast type.
    pub enum ServiceType {
        Unicast => "unicast",
        Multicast => "multicast",
    }
}

wire_enum! {
    pub enum IpVersion {
        V4 => "ipv4",
        V6 => "ipv6",
    }
}

wire_enum! {
    /// VLAN handling for an ONU port service or WAN connection.
    pub enum VlanMode {
        Tag => "tag",
        Transparent => "transparent",
    }
}

wire_enum! {
    /// Registration state filter for layer-3 rate limits.
    pub enum OnuState {
        Offline => "offline",
        Online => "online",
    }
}

wire_enum! {
    /// QinQ domain service sharing mode.
    pub enum QinqServiceType {
        Single => "single",
        Share => "share",
    }
}

wire_enum! {
    /// VLAN layer action in a QinQ domain service.
    pub enum QinqAction {
        Add => "add",
        Translation => "translation",
        Transparent => "transparent",
    }
}

impl QinqAction {
    pub fn from_code(code: i64) -> Option<QinqAction> {
        match code {
            1 => Some(QinqAction::Add),
            2 => Some(QinqAction::Translation),
            3 => Some(QinqAction::Transparent),
            _ => None,
        }
    }
}
