//! Extractors for bandwidth profiles, layer-3 rate limits and service VLANs.

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use super::key_values;
use super::record::Record;
use crate::value::coerce;

static BANDWIDTH_SUMMARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-+\s+onubandwidth\s+profile,\s+num\s+=\s+(\d+)\s+-+")
        .expect("valid bandwidth summary regex")
});
static BANDWIDTH_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Id)\s+(Name)\s+(upMin)\s+(upMax)\s+(downMin)\s+(downMax)\s+(upFix)")
        .expect("valid bandwidth title regex")
});
static BANDWIDTH_ROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\s+(\S+)\s+(\d+)\s+(\d+)\s+(\d+)\s+(\d+)\s+(\d+)")
        .expect("valid bandwidth row regex")
});

static RATE_LIMIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^:]+):\s*(.*?)\.?\s*$").expect("valid rate limit regex"));

static SERVICE_VLAN_INDEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^servicevlan\s+(\d+)\s+:").expect("valid service vlan regex"));
static SERVICE_VLAN_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^name\s+:\s+(.+),\s+type\s+:\s+(.+?)\s*$").expect("valid name/type regex")
});
static SERVICE_VLAN_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^vlan\s+range:\s+(\d+|\d+\s+~\s+\d+)\s+#####end").expect("valid range regex")
});

/// `show bandwidth-profile`: Id Name upMin upMax downMin downMax upFix.
///
/// The summary line announces how many profiles follow; a mismatch is
/// logged but the parsed rows are still returned.
pub fn bandwidth_profiles(text: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut titles: Option<Vec<String>> = None;
    let mut announced: Option<usize> = None;

    for line in text.lines() {
        if let Some(caps) = BANDWIDTH_SUMMARY_RE.captures(line) {
            announced = Some(announced.unwrap_or(0) + caps[1].parse::<usize>().unwrap_or(0));
            continue;
        }
        if let Some(caps) = BANDWIDTH_TITLE_RE.captures(line) {
            titles = Some(caps.iter().skip(1).flatten().map(|m| m.as_str().to_string()).collect());
            continue;
        }
        let (Some(titles), Some(caps)) = (titles.as_deref(), BANDWIDTH_ROW_RE.captures(line)) else {
            continue;
        };
        records.push(
            titles
                .iter()
                .zip(caps.iter().skip(1).flatten())
                .map(|(title, m)| (title.clone(), coerce(m.as_str(), None)))
                .collect(),
        );
    }

    if let Some(count) = announced {
        if count != records.len() {
            warn!(
                "bandwidth-profile listing announced {} profiles but {} were parsed",
                count,
                records.len()
            );
        }
    }
    records
}

/// `show onu layer3-ratelimit-profile`: one record per `Wan index` block.
///
/// Keys: Wan index, Wan name, Up bandwidth profile id, Down bandwidth
/// profile id. Unbound directions read 65535.
pub fn layer3_rate_limits(text: &str) -> Vec<Record> {
    let mut records: Vec<Record> = Vec::new();
    for (key, value) in key_values(text, &RATE_LIMIT_RE) {
        if key == "Wan index" {
            records.push(Record::new());
        }
        if let Some(record) = records.last_mut() {
            record.insert(key, value);
        }
    }
    records
}

/// `show service-vlan`.
///
/// Keys: servicevlan, name, type, vlan range. A range prints as `100 ~ 400`
/// and a single VLAN as an integer.
pub fn service_vlans(text: &str) -> Vec<Record> {
    let mut records: Vec<Record> = Vec::new();
    for line in text.lines() {
        if let Some(caps) = SERVICE_VLAN_INDEX_RE.captures(line) {
            let mut record = Record::new();
            record.insert("servicevlan", coerce(&caps[1], None));
            records.push(record);
            continue;
        }
        let Some(record) = records.last_mut() else {
            continue;
        };
        if let Some(caps) = SERVICE_VLAN_NAME_RE.captures(line) {
            record.insert("name", coerce(&caps[1], None));
            record.insert("type", coerce(&caps[2], None));
        } else if let Some(caps) = SERVICE_VLAN_RANGE_RE.captures(line) {
            record.insert("vlan range", coerce(&caps[1], None));
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    const PROFILES: &str = "\
-------- onubandwidth profile, num = 3 --------
Id   Name                 upMin  upMax  downMin downMax upFix
------------------------------------------------------------------
2    bwp2                 50000  100000 50000  100000 10000
3    bwp                  10000  10000  10000  10000  10000
8    b_prf_8              0      1000   0      2000   0
";

    #[test]
    fn test_bandwidth_profiles() {
        let profiles = bandwidth_profiles(PROFILES);
        assert_eq!(profiles.len(), 3);
        assert_eq!(profiles[0].int("Id"), Some(2));
        assert_eq!(profiles[0].text("Name"), Some("bwp2"));
        assert_eq!(profiles[0].int("upMax"), Some(100000));
        assert_eq!(profiles[2].int("downMax"), Some(2000));
        assert_eq!(profiles[2].keys().count(), 7);
    }

    #[test]
    fn test_bandwidth_profiles_count_mismatch_is_tolerated() {
        let text = PROFILES.replace("num = 3", "num = 10");
        assert_eq!(bandwidth_profiles(&text).len(), 3);
        assert!(bandwidth_profiles("").is_empty());
    }

    #[test]
    fn test_layer3_rate_limits() {
        let text = "\
------Offline onu layer3 rate-limiting info------
Wan index: 1.
Wan name: 1_INTERNET_B_VID_1000.
Up bandwidth profile id: 3.
Down bandwidth profile id: 3.

Wan index: 2.
Wan name: 2_INTERNET_B_VID_1000.
Up bandwidth profile id: 65535.
Down bandwidth profile id: 65535.
";
        let limits = layer3_rate_limits(text);
        assert_eq!(limits.len(), 2);
        assert_eq!(limits[0].int("Wan index"), Some(1));
        assert_eq!(limits[0].text("Wan name"), Some("1_INTERNET_B_VID_1000"));
        assert_eq!(limits[0].int("Up bandwidth profile id"), Some(3));
        assert_eq!(limits[1].int("Down bandwidth profile id"), Some(65535));
    }

    #[test]
    fn test_service_vlans() {
        let text = "\
servicevlan 101 :
name : test,   type : data
vlan range:  100 ~ 400 #####end.
servicevlan 102 :
name : sip,   type : voip
vlan range: 3990 #####end.
";
        let vlans = service_vlans(text);
        assert_eq!(vlans.len(), 2);
        assert_eq!(vlans[0].int("servicevlan"), Some(101));
        assert_eq!(vlans[0].text("name"), Some("test"));
        assert_eq!(vlans[0].text("type"), Some("data"));
        assert_eq!(vlans[0].text("vlan range"), Some("100 ~ 400"));
        assert_eq!(vlans[1].get("vlan range"), Some(&Value::Int(3990)));
    }
}
