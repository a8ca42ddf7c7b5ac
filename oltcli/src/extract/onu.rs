//! Extractors for ONU inventory and per-ONU state.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::layout::{ColumnClass, RowLayout, Table};
use super::record::Record;
use crate::value::{coerce, Value, UNSET};

static AUTHORIZATION: Lazy<Table> = Lazy::new(|| {
    Table::new(
        Regex::new(
            r"^(Slot)\s+(Pon)\s+(Onu)\s+(OnuType)\s+(ST)\s+(Lic)\s+(OST)\s+(PhyId)\s+(PhyPwd)\s+(LogicId)\s+(LogicPwd)",
        )
        .expect("valid authorization title"),
        RowLayout::new()
            .column(ColumnClass::Digits, 4)
            .column(ColumnClass::Digits, 3)
            .column(ColumnClass::Digits, 3)
            .column(ColumnClass::Dashed, 14)
            .column(ColumnClass::Word, 2)
            .column(ColumnClass::Digits, 3)
            .column(ColumnClass::Word, 3)
            .column(ColumnClass::Word, 12)
            .column(ColumnClass::Any, 10)
            .column(ColumnClass::Any, 24)
            .column(ColumnClass::Any, 12),
    )
    .with_null_sentinel(UNSET)
});

static DISCOVERY: Lazy<Table> = Lazy::new(|| {
    Table::new(
        Regex::new(r"^(No)\s+(OnuType)\s+(PhyId)\s+(PhyPwd)\s+(LogicId)\s+(LogicPwd)\s+(Why)")
            .expect("valid discovery title"),
        RowLayout::new()
            .column(ColumnClass::Digits, 3)
            .column(ColumnClass::Dashed, 14)
            .column(ColumnClass::Word, 12)
            .column(ColumnClass::Any, 10)
            .column(ColumnClass::Any, 24)
            .column(ColumnClass::Any, 12)
            .column(ColumnClass::Digits, 3),
    )
});

static SLOT_PON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"SLOT = (\d+), PON = (\d+)").expect("valid slot/pon regex"));

static LAST_REG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d+)\s+(\d+)\s+(\d+)\s+Last Off Time = (\d{4}-\d{2}-\d{2}\s\d{2}:\d{2}:\d{2}),Last On Time = (\d{4}-\d{2}-\d{2}\s\d{2}:\d{2}:\d{2})\.",
    )
    .expect("valid last-reg regex")
});

const PORT_VLAN_FIELDS: [&str; 22] = [
    "NO", "SL", "LI", "ONU", "PORT", "ID", "TYPE", "MODE", "CVID", "CCOS", "CTPID", "TVID", "TCOS",
    "TTPID", "SVID", "SCOS", "STPID", "PVID", "PCOS", "SRVTYPE", "PRIQUE", "GEMPORT",
];

static PORT_VLAN_RE: Lazy<Regex> = Lazy::new(|| {
    let mut pattern = String::from(r"^(\w+)\s+(\w+)\s*/(\w+)\s*/(\w+)");
    for _ in 4..PORT_VLAN_FIELDS.len() {
        pattern.push_str(r"\s+(\w+)");
    }
    Regex::new(&pattern).expect("valid onu port vlan regex")
});

static PORT_STATUS_SUMMARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^SLOT:(\d+)\s*PON:(\d+)\s*ONU:(\d+)\s*,\s*ITEM=(\d+)")
        .expect("valid port status summary regex")
});
static PORT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^PORT\s+ID\s+=\s+(\d+)").expect("valid port id regex"));
static KEY_VALUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+):(.+)$").expect("valid key/value regex"));

static STATISTIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+):(.+)\((.+)\)").expect("valid statistic regex"));

static ONU_BANDWIDTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\w+)\s*:\s*(-?\d+)\s*\.").expect("valid onu bandwidth regex")
});

/// `show authorization`: one record per authorized ONU.
///
/// Fields: Slot Pon Onu OnuType ST Lic OST PhyId PhyPwd LogicId LogicPwd.
/// Integers equal to 65535 are null.
pub fn authorization(text: &str) -> Vec<Record> {
    AUTHORIZATION.parse(text)
}

/// `show discovery` / `show onu discovered`: unauthorized ONUs.
///
/// Each record also carries the SLOT and PON of the block it was listed in.
pub fn discovery(text: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut titles: Option<Vec<String>> = None;
    let mut position: Option<(Value, Value)> = None;

    for line in text.lines() {
        if let Some(caps) = SLOT_PON_RE.captures(line) {
            position = Some((coerce(&caps[1], None), coerce(&caps[2], None)));
        }
        if let Some(t) = DISCOVERY.titles(line) {
            titles = Some(t);
            continue;
        }
        let Some(titles) = titles.as_deref() else {
            continue;
        };
        if let Some(mut record) = DISCOVERY.row(titles, line) {
            let (slot, pon) = position.clone().unwrap_or((Value::Null, Value::Null));
            record.insert("SLOT", slot);
            record.insert("PON", pon);
            records.push(record);
        }
    }
    records
}

/// `show onu last-reg-status-change`.
///
/// Fields: SLOT PON ONU LAST_OFF_TIME LAST_ON_TIME. A zero timestamp is null.
pub fn last_reg_status_change(text: &str) -> Vec<Record> {
    const FIELDS: [&str; 5] = ["SLOT", "PON", "ONU", "LAST_OFF_TIME", "LAST_ON_TIME"];
    text.lines()
        .filter_map(|line| LAST_REG_RE.captures(line))
        .map(|caps| {
            FIELDS
                .iter()
                .enumerate()
                .map(|(i, field)| (*field, coerce(&caps[i + 1], None)))
                .collect()
        })
        .collect()
}

/// `show onu port vlan`: one record per configured port service.
pub fn onu_port_vlan(text: &str) -> Vec<Record> {
    text.lines()
        .filter_map(|line| PORT_VLAN_RE.captures(line))
        .map(|caps| {
            PORT_VLAN_FIELDS
                .iter()
                .enumerate()
                .map(|(i, field)| (*field, coerce(&caps[i + 1], None)))
                .collect()
        })
        .collect()
}

/// Parsed `show onu port status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnuPortStatus {
    pub slot: i64,
    pub pon: i64,
    pub onu: i64,
    pub item: i64,
    /// One record per Ethernet port, starting with `PORT ID`.
    pub ports: Vec<Record>,
}

/// `show onu port status`.
///
/// The device prints `PORT CONNECT` twice per port; the second one is the
/// duplex mode and is stored as `PORT MODE`.
pub fn onu_port_status(text: &str) -> Option<OnuPortStatus> {
    let mut status: Option<OnuPortStatus> = None;

    for line in text.lines() {
        if let Some(caps) = PORT_STATUS_SUMMARY_RE.captures(line) {
            let num = |i: usize| caps[i].parse::<i64>().unwrap_or_default();
            status = Some(OnuPortStatus {
                slot: num(1),
                pon: num(2),
                onu: num(3),
                item: num(4),
                ports: Vec::new(),
            });
            continue;
        }
        let Some(status) = status.as_mut() else {
            continue;
        };
        if let Some(caps) = PORT_ID_RE.captures(line) {
            let mut port = Record::new();
            port.insert("PORT ID", coerce(&caps[1], None));
            status.ports.push(port);
            continue;
        }
        if let (Some(caps), Some(port)) = (KEY_VALUE_RE.captures(line), status.ports.last_mut()) {
            let key = caps[1].trim();
            let value = coerce(&caps[2], None);
            if port.contains_key(key) {
                port.insert("PORT MODE", value);
            } else {
                port.insert(key, value);
            }
        }
    }
    status
}

/// A counter reading with its unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub value: Value,
    pub unit: String,
}

/// `show onu statistics`: counters keyed by name, e.g. `Rx_power`.
pub fn onu_statistics(text: &str) -> IndexMap<String, Measurement> {
    text.lines()
        .filter_map(|line| STATISTIC_RE.captures(line))
        .map(|caps| {
            (
                caps[1].trim().to_string(),
                Measurement {
                    value: coerce(&caps[2], None),
                    unit: caps[3].trim().to_string(),
                },
            )
        })
        .collect()
}

/// `show onu bandwidth`.
///
/// Keys: upMaxband downMaxband upAssureBand downAssureBand upFixband prfId.
pub fn onu_bandwidth(text: &str) -> Record {
    text.lines()
        .filter_map(|line| ONU_BANDWIDTH_RE.captures(line))
        .map(|caps| (caps[1].to_string(), coerce(&caps[2], None)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHORIZATION_OUTPUT: &str = "\
-----  ONU Auth Table, SLOT = 4, PON = 8, ITEM = 2 -----
Slot Pon Onu OnuType        ST Lic OST PhyId        PhyPwd     LogicId                  LogicPwd
---- --- --- -------------- -- --- --- ------------ ---------- ------------------------ ------------
4    8   1   5506-04-F1     A  0   up  FHTT033178b0
4    8   64  HG6243C        A  0   dn  FHTT92f445c8 fiberhome  fh_logic                 12345
";

    #[test]
    fn test_authorization() {
        let records = authorization(AUTHORIZATION_OUTPUT);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].int("Slot"), Some(4));
        assert_eq!(records[0].int("Pon"), Some(8));
        assert_eq!(records[0].int("Onu"), Some(1));
        assert_eq!(records[0].text("OnuType"), Some("5506-04-F1"));
        assert_eq!(records[0].text("OST"), Some("up"));
        assert_eq!(records[0].text("PhyId"), Some("FHTT033178b0"));

        assert_eq!(records[1].int("Onu"), Some(64));
        assert_eq!(records[1].text("OST"), Some("dn"));
        assert_eq!(records[1].text("PhyPwd"), Some("fiberhome"));
        assert_eq!(records[1].text("LogicId"), Some("fh_logic"));
        assert_eq!(records[1].int("LogicPwd"), Some(12345));
    }

    #[test]
    fn test_authorization_ignores_noise() {
        assert!(authorization("").is_empty());
        assert!(authorization("Command executes success.\n% Unknown command.").is_empty());
        // rows without a preceding title are not trusted
        assert!(authorization("4    8   1   5506-04-F1     A  0   up  FHTT033178b0").is_empty());
    }

    #[test]
    fn test_discovery() {
        let text = "\
----- ONU Unauth Table, SLOT = 4, PON = 8, ITEM = 2 -----
No  OnuType        PhyId        PhyPwd     LogicId                  LogicPwd     Why
--- -------------- ------------ ---------- ------------------------ ------------ ---
1   HG6243C        FHTT91fbc5e8 fiberhome  fiberhome                fiberhome    1
2   5506-10-A1     FHTT000aae64            fiberhome                fiberhome    1

Command executes success.
";
        let records = discovery(text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text("PhyId"), Some("FHTT91fbc5e8"));
        assert_eq!(records[0].int("SLOT"), Some(4));
        assert_eq!(records[0].int("PON"), Some(8));
        assert_eq!(records[1].text("PhyPwd"), Some(""));
        assert_eq!(records[1].int("Why"), Some(1));
    }

    #[test]
    fn test_last_reg_status_change() {
        let text = "\
SLOT PON ONU LAST_OFF_TIME LAST_ON_TIME
4    8   1   Last Off Time = 0000-00-00 00:00:00,Last On Time = 2020-09-22 14:09:29.
";
        let records = last_reg_status_change(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].int("ONU"), Some(1));
        assert!(records[0].is_null("LAST_OFF_TIME"));
        assert!(records[0]["LAST_ON_TIME"].as_timestamp().is_some());
    }

    #[test]
    fn test_onu_port_vlan() {
        let text = "\
NO.  SL/LI/ONU PORT ID TYPE  MODE CVID COS  TPID  TVID COS  TPID  SVID COS  TPID  PVID COS  SRVTYPE PRIQUE  GEMPORT
====================================================================================================================
1    4 /8 /1   1    1  unica tran null null 33024 null null null  null null null  null null default default default
";
        let records = onu_port_vlan(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].int("SL"), Some(4));
        assert_eq!(records[0].int("LI"), Some(8));
        assert_eq!(records[0].int("PORT"), Some(1));
        assert_eq!(records[0].text("MODE"), Some("tran"));
        assert_eq!(records[0].int("CTPID"), Some(33024));
        assert_eq!(records[0].text("GEMPORT"), Some("default"));
    }

    #[test]
    fn test_onu_port_status() {
        let text = "\
----- ONU FE PORT STATUS -----
SLOT:4 PON:8 ONU:1  ,  ITEM=2

PORT ID = 1
PORT CONNECT    : Linked
PORT RATE       : 1000M
PORT CONNECT    : full

PORT ID = 2
PORT CONNECT    : Not Linked
PORT CONNECT    : half
";
        let status = onu_port_status(text).unwrap();
        assert_eq!((status.slot, status.pon, status.onu, status.item), (4, 8, 1, 2));
        assert_eq!(status.ports.len(), 2);
        assert_eq!(status.ports[0].text("PORT CONNECT"), Some("Linked"));
        assert_eq!(status.ports[0].text("PORT MODE"), Some("full"));
        assert_eq!(status.ports[1].text("PORT CONNECT"), Some("Not Linked"));
        assert!(onu_port_status("PORT CONNECT : Linked").is_none());
    }

    #[test]
    fn test_onu_statistics() {
        let text = "\
From 2020-11-10 14:46:04 To 0000-00-00 00:00:00
DownTotalFrame                  :       572736211 (PKTs)
Power(Voltage)                  :            3.34 (V)
Rx_power                        :          -13.14 (dbm)
";
        let stats = onu_statistics(text);
        assert_eq!(stats.len(), 3);
        assert_eq!(stats["DownTotalFrame"].value, Value::Int(572736211));
        assert_eq!(stats["Power(Voltage)"].unit, "V");
        assert_eq!(stats["Rx_power"].value, Value::Float(-13.14));
    }

    #[test]
    fn test_onu_bandwidth() {
        let text = "onu: slot 4 pon 8 onu 1.\nupMaxband: 1250000.\nupFixband: 0.\nprfId: -1.\n";
        let record = onu_bandwidth(text);
        assert_eq!(record.int("upMaxband"), Some(1250000));
        assert_eq!(record.int("prfId"), Some(-1));
        assert!(!record.contains_key("onu"));
    }
}
