//! OLT-wide actions: uplink VLANs, IGMP, service VLANs, routes and PON
//! authentication.

use log::info;

use crate::device::{An6k17, UplinkPorts};
use crate::error::Result;
use crate::types::{AuthMode, IgmpMode, ServiceVlanType, VlanTag};
use crate::util::split_frame_slot_port;

/// Put `vid` (`"1000"` or `"1000-2000"`) on the uplink `port`
/// (`frame/slot/port`), tagged unless `strip` is set.
///
/// Any existing rule for the range is removed first, so repeating the call
/// is harmless.
pub async fn add_port_vlan(olt: &An6k17, port: &str, vid: &str, strip: bool) -> Result<()> {
    let (_, slot, port) = split_frame_slot_port(port)?;
    let tag = if strip { VlanTag::Untag } else { VlanTag::Tag };
    let ports = UplinkPorts::new(tag, slot, port.to_string());

    olt.del_port_vlan(vid, slot, &ports.ports).await?;
    olt.set_port_vlan(vid, Some(&ports)).await?;
    info!("port vlan {} {} on 1/{}/{}", vid, tag, slot, port);
    Ok(())
}

pub async fn del_port_vlan(olt: &An6k17, port: &str, vid: &str) -> Result<()> {
    let (_, slot, port) = split_frame_slot_port(port)?;
    olt.del_port_vlan(vid, slot, &port.to_string()).await
}

pub async fn set_igmp_vlan(olt: &An6k17, vid: u16) -> Result<()> {
    olt.set_igmp_vlan(vid).await
}

pub async fn set_igmp_mode(olt: &An6k17, mode: IgmpMode) -> Result<()> {
    olt.set_igmp_mode(mode).await
}

/// Service VLAN over `begin..=end`.
pub async fn add_service_vlan(
    olt: &An6k17,
    name: &str,
    begin: u16,
    end: u16,
    vlan_type: ServiceVlanType,
) -> Result<()> {
    let range = if begin == end {
        begin.to_string()
    } else {
        format!("{}-{}", begin, end)
    };
    olt.set_service_vlan(name, &range, vlan_type).await
}

pub async fn del_service_vlan(olt: &An6k17, name: &str) -> Result<()> {
    olt.del_service_vlan(name).await
}

pub async fn add_static_route(olt: &An6k17, ip: &str, mask: &str, next_hop: &str, metric: u32) -> Result<()> {
    olt.set_static_route(next_hop, ip, mask, metric).await
}

pub async fn del_static_route(olt: &An6k17, ip: &str, mask: &str, next_hop: &str) -> Result<()> {
    olt.del_static_route(next_hop, ip, mask, None).await
}

pub async fn set_pon_auth_mode(olt: &An6k17, slot: u32, pon: u32, mode: AuthMode) -> Result<()> {
    olt.set_auth_mode(slot, pon, mode).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    use crate::error::ErrorKind;
    use crate::testing::FakeOlt;

    #[tokio::test]
    async fn test_add_port_vlan_replaces_rule() {
        let olt = FakeOlt::start(|cmd| {
            if cmd.starts_with("no port vlan") {
                "Command executes failed.".to_string()
            } else {
                String::new()
            }
        })
        .await;
        add_port_vlan(&olt.olt(), "1/9/2", "1000-1010", false).await.unwrap();
        add_port_vlan(&olt.olt(), "1/9/3", "2000", true).await.unwrap();
        assert_eq!(
            olt.changes(),
            [
                "no port vlan 1000 to 1010 1/9 2",
                "port vlan 1000 to 1010 tag 1/9 2",
                "no port vlan 2000 1/9 3",
                "port vlan 2000 untag 1/9 3",
            ]
        );
    }

    #[tokio::test]
    async fn test_add_port_vlan_twice_keeps_one_rule() {
        let rules = Arc::new(Mutex::new(HashSet::new()));
        let r = rules.clone();
        let olt = FakeOlt::start(move |cmd| {
            let mut rules = r.lock().unwrap();
            let applied = if let Some(rule) = cmd.strip_prefix("no port vlan ") {
                rules.remove(rule)
            } else if let Some(rule) = cmd.strip_prefix("port vlan ") {
                let rule = rule.replace(" untag ", " ").replace(" tag ", " ");
                rules.insert(rule)
            } else {
                true
            };
            if applied {
                String::new()
            } else {
                "Command executes failed.".to_string()
            }
        })
        .await;

        add_port_vlan(&olt.olt(), "1/9/2", "1000-1010", false).await.unwrap();
        add_port_vlan(&olt.olt(), "1/9/2", "1000-1010", false).await.unwrap();

        let rules = rules.lock().unwrap();
        assert_eq!(rules.len(), 1);
        assert!(rules.contains("1000 to 1010 1/9 2"));
        assert_eq!(
            olt.changes(),
            [
                "no port vlan 1000 to 1010 1/9 2",
                "port vlan 1000 to 1010 tag 1/9 2",
                "no port vlan 1000 to 1010 1/9 2",
                "port vlan 1000 to 1010 tag 1/9 2",
            ]
        );
    }

    #[tokio::test]
    async fn test_bad_port_notation() {
        let olt = FakeOlt::start(|_| String::new()).await;
        let err = add_port_vlan(&olt.olt(), "9/2", "1000", false).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = del_port_vlan(&olt.olt(), "x/9/2", "1000").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(olt.commands().is_empty());
    }

    #[tokio::test]
    async fn test_add_service_vlan() {
        let listed = Arc::new(Mutex::new(String::new()));
        let l = listed.clone();
        let olt = FakeOlt::start(move |cmd| {
            if cmd == "show service-vlan" {
                return l.lock().unwrap().clone();
            }
            if cmd == "service-vlan iptv 3000 to 3010 type iptv" {
                *l.lock().unwrap() =
                    "servicevlan 1 :\nname : iptv,   type : iptv\nvlan range:  3000 ~ 3010 #####end.\n"
                        .to_string();
            }
            String::new()
        })
        .await;
        add_service_vlan(&olt.olt(), "iptv", 3000, 3010, ServiceVlanType::Iptv)
            .await
            .unwrap();
        assert_eq!(olt.changes(), ["service-vlan iptv 3000 to 3010 type iptv"]);
    }

    #[tokio::test]
    async fn test_static_routes() {
        let olt = FakeOlt::start(|_| String::new()).await;
        let facade = olt.olt();
        add_static_route(&facade, "10.1.0.0", "255.255.0.0", "192.168.1.1", 5)
            .await
            .unwrap();
        del_static_route(&facade, "10.1.0.0", "16", "192.168.1.1").await.unwrap();
        let changes = olt.changes();
        assert_eq!(changes.len(), 2);
        assert!(changes[0].ends_with("metric 5"));
        assert!(changes[1].starts_with("no "));
    }
}
