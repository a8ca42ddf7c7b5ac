//! System-wide settings: clock, cards, ACL, routes, management VLANs and
//! relay options.

use std::net::Ipv4Addr;

use chrono::NaiveDateTime;
use log::debug;

use super::command::CommandLine;
use super::validate;
use super::{An6k17, Scope, field_u32};
use crate::error::{Error, Result};
use crate::extract::{self, Record, SnmpTime};
use crate::types::{DhcpOption, IpVersion, SuppressType, TimeMode};
use crate::value::{bool_to_str, str_to_bool};

/// Capabilities of an ONU caps profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapsProfile {
    pub name: String,
    pub onu_type: u32,
    pub pon_type: u32,
    pub onu_capability: u32,
    pub lan_1g: u32,
    pub lan_10g: u32,
    pub lan_25g: u32,
    pub lan_2_5g: u32,
    pub pots: u32,
}

impl An6k17 {
    /// Current device clock from `show time`.
    pub async fn system_time(&self) -> Result<NaiveDateTime> {
        let output = self.query(Scope::Config, "show time").await?;
        let now = extract::system_time(&output);
        NaiveDateTime::parse_from_str(&format!("{} {}", now.date, now.time), "%Y-%m-%d %H:%M:%S")
            .map_err(|_| Error::data_not_found("system time"))
    }

    pub async fn snmp_time(&self) -> Result<SnmpTime> {
        let output = self.query(Scope::Config, "show snmp-time").await?;
        extract::snmp_time(&output)
    }

    /// Synchronize the clock from an SNMP time server every `interval`
    /// seconds.
    pub async fn set_snmp_time(&self, interval: u32, version: IpVersion, server: &str) -> Result<()> {
        if version == IpVersion::V4 {
            validate::ipv4("server", server)?;
        }
        let cmd = CommandLine::new("snmp-time")
            .kv("interval", interval)
            .kv("servip", version)
            .arg(server);
        self.execute(Scope::Config, [cmd]).await
    }

    /// Select the clock source and the local and EMS time zone offsets.
    pub async fn set_time_mode(
        &self,
        mode: TimeMode,
        hour: i8,
        minute: u8,
        ems_hour: i8,
        ems_minute: u8,
    ) -> Result<()> {
        if minute >= 60 || ems_minute >= 60 {
            return Err(Error::validation("minute", "must be below 60"));
        }
        if !(-12..=14).contains(&hour) || !(-12..=14).contains(&ems_hour) {
            return Err(Error::validation("hour", "time zone offset outside -12..=14"));
        }
        let cmd = CommandLine::new("time")
            .arg(mode)
            .kv("hour", hour)
            .kv("min", minute)
            .kv("ems-hour", ems_hour)
            .kv("ems-min", ems_minute);
        self.execute(Scope::Config, [cmd]).await
    }

    /// Set the device clock.
    pub async fn set_time(&self, at: NaiveDateTime) -> Result<()> {
        let cmd = CommandLine::new("time")
            .arg(at.format("%Y"))
            .arg(at.format("%-m"))
            .arg(at.format("%-d"))
            .arg(at.format("%H:%M:%S"));
        self.execute(Scope::Config, [cmd]).await
    }

    /// Limit broadcast, multicast or unknown-unicast traffic on a card.
    pub async fn set_traffic_suppress(&self, slot: u32, rate: u32, kind: SuppressType) -> Result<()> {
        let cmd = CommandLine::new("traffic-suppress")
            .arg(format!("1/{}", slot))
            .arg(kind)
            .kv("value", rate);
        self.execute(Scope::Config, [cmd]).await
    }

    pub async fn card_info(&self) -> Result<Vec<Record>> {
        let output = self.query(Scope::Config, "show card info").await?;
        Ok(extract::card_info(&output))
    }

    /// Card type detected in `slot`.
    pub async fn card_type(&self, slot: u32) -> Result<String> {
        let cards = self.card_info().await?;
        cards
            .iter()
            .find(|card| field_u32(card, "CARD") == Some(slot))
            .and_then(|card| card.text("DETECT"))
            .filter(|detected| !detected.is_empty() && *detected != "---")
            .map(str::to_string)
            .ok_or_else(|| Error::not_found(format!("card in slot {}", slot)))
    }

    /// Authorize the card in `slot` as the type the device detected.
    pub async fn set_card_auth(&self, slot: u32) -> Result<()> {
        let card_type = self.card_type(slot).await?;
        debug!("authorizing slot {} as {}", slot, card_type);
        let cmd = CommandLine::new("card auth")
            .arg(format!("1/{}", slot))
            .arg(card_type);
        self.execute(Scope::Config, [cmd]).await
    }

    pub async fn set_card_auto_auth(&self) -> Result<()> {
        self.execute(Scope::Config, ["card auto-auth"]).await
    }

    pub async fn unset_card_auth(&self, slot: u32) -> Result<()> {
        let cmd = CommandLine::new("card unauth").arg(format!("1/{}", slot));
        self.execute(Scope::Config, [cmd]).await
    }

    /// All ACL entries: No, IP, Mask, Status.
    pub async fn acl(&self) -> Result<Vec<Record>> {
        let output = self.query(Scope::Config, "show acl").await?;
        Ok(extract::acl(&output))
    }

    pub async fn acl_entry(&self, id: u32) -> Result<Record> {
        self.acl()
            .await?
            .into_iter()
            .find(|entry| field_u32(entry, "No") == Some(id))
            .ok_or_else(|| Error::not_found(format!("acl entry {}", id)))
    }

    /// Store a permitted or denied network in the first free ACL entry.
    ///
    /// Returns the entry number used.
    pub async fn set_acl(&self, ip: &str, mask: &str, enable: bool) -> Result<u32> {
        let ip = validate::ipv4("ip", ip)?;
        let mask = validate::ipv4("mask", mask)?;
        let free = self
            .acl()
            .await?
            .into_iter()
            .find(|entry| {
                entry.text("IP") == Some("0.0.0.0")
                    && entry.text("Mask") == Some("0.0.0.0")
                    && entry.text("Status") == Some("disable")
            })
            .and_then(|entry| field_u32(&entry, "No"))
            .ok_or_else(|| Error::not_found("free acl entry"))?;

        let cmd = CommandLine::new("acl")
            .arg(free)
            .kv("ip", ip)
            .kv("mask", mask)
            .arg(if enable { "enable" } else { "disable" });
        self.execute(Scope::Config, [cmd]).await?;
        Ok(free)
    }

    /// Add a static route. `mask` may be dotted or a prefix length.
    pub async fn set_static_route(&self, next_hop: &str, ip: &str, mask: &str, metric: u32) -> Result<()> {
        let cmd = static_route(next_hop, ip, mask)?.kv("metric", metric);
        self.execute(Scope::Config, [cmd]).await
    }

    pub async fn del_static_route(
        &self,
        next_hop: &str,
        ip: &str,
        mask: &str,
        metric: Option<u32>,
    ) -> Result<()> {
        let cmd = CommandLine::new("no")
            .kw(&static_route(next_hop, ip, mask)?.to_string())
            .opt("metric", metric);
        self.execute(Scope::Config, [cmd]).await
    }

    /// Create an in-band management VLAN.
    pub async fn set_manage_vlan(&self, name: &str, svlan: u16, cvlan: u16) -> Result<()> {
        let name = validate::name("name", name)?;
        let cmd = CommandLine::new("manage-vlan")
            .arg(name)
            .kv("svlan", validate::vlan("svlan", svlan)?)
            .kv("cvlan", validate::vlan("cvlan", cvlan)?);
        self.execute(Scope::Config, [cmd]).await
    }

    /// Address a management VLAN. `mask` may be dotted or a prefix length.
    pub async fn set_manage_vlan_ip(
        &self,
        version: IpVersion,
        name: &str,
        ip: &str,
        mask: &str,
    ) -> Result<()> {
        let name = validate::name("name", name)?;
        if version == IpVersion::V4 {
            validate::ipv4("ip", ip)?;
        }
        let cmd = CommandLine::new("manage-vlan")
            .arg(version)
            .arg(name)
            .arg(format!("{}/{}", ip, validate::prefix_len(mask)?));
        self.execute(Scope::Config, [cmd]).await
    }

    pub async fn manage_vlans(&self) -> Result<Vec<Record>> {
        let output = self.query(Scope::Config, "show manage-vlan all").await?;
        Ok(extract::manage_vlans(&output))
    }

    pub async fn manage_vlan(&self, name: &str) -> Result<Record> {
        self.manage_vlans()
            .await?
            .into_iter()
            .find(|vlan| vlan.text("Manage name") == Some(name))
            .ok_or_else(|| Error::not_found(format!("manage vlan '{}'", name)))
    }

    /// Address and mask of the out-of-band management port.
    pub async fn ip_address(&self) -> Result<(Ipv4Addr, Ipv4Addr)> {
        let output = self.query(Scope::Meth, "show ip address").await?;
        extract::ip_address(&output)
    }

    pub async fn set_dhcp_option(&self, option: DhcpOption, enable: bool) -> Result<()> {
        let cmd = CommandLine::new("dhcp").arg(option).arg(bool_to_str(enable));
        self.execute(Scope::Config, [cmd]).await
    }

    /// `show dhcp state`, one field per relay option.
    pub async fn dhcp_state(&self) -> Result<Record> {
        let output = self.query(Scope::Config, "show dhcp state").await?;
        Ok(extract::dhcp_state(&output))
    }

    pub async fn set_pppoe_plus(&self, enable: bool) -> Result<()> {
        let cmd = CommandLine::new("pppoe-plus").arg(bool_to_str(enable));
        self.execute(Scope::Config, [cmd]).await
    }

    pub async fn pppoe_plus(&self) -> Result<bool> {
        let output = self.query(Scope::Config, "show pppoe-plus state").await?;
        extract::pppoe_plus(&output)
            .text("PPPoE+")
            .and_then(str_to_bool)
            .ok_or_else(|| Error::data_not_found("PPPoE+ state"))
    }

    pub async fn add_onu_caps_profile(&self, profile: &CapsProfile) -> Result<()> {
        let name = validate::name("name", &profile.name)?;
        let cmd = CommandLine::new("onu caps-profile add")
            .kv("name", name)
            .kv("onutype", profile.onu_type)
            .kv("pontype", profile.pon_type)
            .kv("onucapa", profile.onu_capability)
            .kv("lan1g", profile.lan_1g)
            .kv("lan10g", profile.lan_10g)
            .kv("lan25g", profile.lan_25g)
            .kv("lan2.5g", profile.lan_2_5g)
            .kv("pots", profile.pots)
            .kw("end");
        self.execute(Scope::Config, [cmd]).await
    }

    pub async fn del_onu_caps_profile(&self, name: &str) -> Result<()> {
        let cmd = CommandLine::new("no onu caps-profile").kv("name", validate::name("name", name)?);
        self.execute(Scope::Config, [cmd]).await
    }
}

fn static_route(next_hop: &str, ip: &str, mask: &str) -> Result<CommandLine> {
    Ok(CommandLine::new("static-route")
        .kv("destination-ip", validate::ipv4("ip", ip)?)
        .kv("mask", validate::dotted_mask(mask)?)
        .kv("nexthop", validate::ipv4("next_hop", next_hop)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::FakeOlt;
    use crate::value::Value;
    use chrono::NaiveDate;

    const ACL: &str = "\
No  IP              Mask            Status
1   192.168.1.0     255.255.255.0   enable
2   0.0.0.0         0.0.0.0         disable
3   0.0.0.0         0.0.0.0         disable
";

    fn responder(cmd: &str) -> String {
        match cmd {
            "show time" => "Current Date is 2020-11-23\nCurrent Time is 17:27:45".to_string(),
            "show acl" => ACL.to_string(),
            "show card info" => "\
CARD   EXIST   CONFIG   DETECT    DETAIL    BLOCK
1     ---      ---      ---         ---         ---
4     YES     GPOA     GPOA       MATCH         OFF
"
            .to_string(),
            "show pppoe-plus state" => "PPPoE+       : enable".to_string(),
            "show ip address" => "debugip 10.182.33.5 mask 255.255.255.0".to_string(),
            _ => String::new(),
        }
    }

    #[tokio::test]
    async fn test_system_time() {
        let olt = FakeOlt::start(responder).await;
        let now = olt.olt().system_time().await.unwrap();
        let expected = NaiveDate::from_ymd_opt(2020, 11, 23)
            .unwrap()
            .and_hms_opt(17, 27, 45)
            .unwrap();
        assert_eq!(now, expected);
    }

    #[tokio::test]
    async fn test_set_time() {
        let olt = FakeOlt::start(responder).await;
        let at = NaiveDate::from_ymd_opt(2021, 3, 7)
            .unwrap()
            .and_hms_opt(8, 5, 0)
            .unwrap();
        olt.olt().set_time(at).await.unwrap();
        assert_eq!(olt.changes(), ["time 2021 3 7 08:05:00"]);
    }

    #[tokio::test]
    async fn test_set_acl_uses_first_free_entry() {
        let olt = FakeOlt::start(responder).await;
        let id = olt
            .olt()
            .set_acl("10.0.0.0", "255.0.0.0", true)
            .await
            .unwrap();
        assert_eq!(id, 2);
        assert_eq!(olt.changes(), ["acl 2 ip 10.0.0.0 mask 255.0.0.0 enable"]);

        let entry = olt.olt().acl_entry(1).await.unwrap();
        assert_eq!(entry["IP"], Value::from("192.168.1.0"));
        let err = olt.olt().acl_entry(9).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_set_acl_without_free_entry() {
        let olt = FakeOlt::start(|cmd| match cmd {
            "show acl" => "No  IP              Mask            Status\n1   192.168.1.0     255.255.255.0   enable\n".to_string(),
            _ => String::new(),
        })
        .await;
        let err = olt.olt().set_acl("10.0.0.0", "255.0.0.0", true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(olt.changes().is_empty());
    }

    #[tokio::test]
    async fn test_card_auth_uses_detected_type() {
        let olt = FakeOlt::start(responder).await;
        olt.olt().set_card_auth(4).await.unwrap();
        assert_eq!(olt.changes(), ["card auth 1/4 GPOA"]);

        let err = olt.olt().card_type(1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_static_route_mask_forms() {
        let olt = FakeOlt::start(responder).await;
        let facade = olt.olt();
        facade.set_static_route("10.0.0.254", "0.0.0.0", "0", 0).await.unwrap();
        facade
            .del_static_route("10.0.0.254", "192.168.0.0", "255.255.0.0", None)
            .await
            .unwrap();
        assert_eq!(
            olt.changes(),
            [
                "static-route destination-ip 0.0.0.0 mask 0.0.0.0 nexthop 10.0.0.254 metric 0",
                "no static-route destination-ip 192.168.0.0 mask 255.255.0.0 nexthop 10.0.0.254",
            ]
        );

        let err = facade.set_static_route("10.0.0.254", "1.2.3", "24", 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_manage_vlan_validation() {
        let olt = FakeOlt::start(responder).await;
        let facade = olt.olt();
        facade
            .set_manage_vlan_ip(IpVersion::V4, "mgmt", "10.1.1.2", "255.255.255.0")
            .await
            .unwrap();
        assert_eq!(olt.changes(), ["manage-vlan ipv4 mgmt 10.1.1.2/24"]);

        let err = facade.set_manage_vlan("mgmt", 0, 100).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = facade.set_manage_vlan("two words", 10, 100).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(olt.changes().len(), 1);
    }

    #[tokio::test]
    async fn test_pppoe_plus_and_ip_address() {
        let olt = FakeOlt::start(responder).await;
        assert!(olt.olt().pppoe_plus().await.unwrap());
        let (ip, mask) = olt.olt().ip_address().await.unwrap();
        assert_eq!(ip, Ipv4Addr::new(10, 182, 33, 5));
        assert_eq!(mask, Ipv4Addr::new(255, 255, 255, 0));
        assert!(olt.commands().contains(&"interface meth 1".to_string()));
    }
}
