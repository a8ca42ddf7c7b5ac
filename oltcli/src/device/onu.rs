//! ONU identity, resets and per-port VLAN services.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use log::{info, warn};

use super::command::CommandLine;
use super::validate;
use super::{An6k17, Scope, field_u32};
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::extract::{self, Measurement, OnuPortStatus, Record};
use crate::types::{Direction, FieldType, Operator, ServiceType};
use crate::value::bool_to_str;
use crate::wait::wait_for_true;

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const OFFLINE_BUDGET: Duration = Duration::from_secs(30);
const ONLINE_BUDGET: Duration = Duration::from_secs(180);

/// Where an authorized ONU sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OnuLocation {
    pub slot: u32,
    pub pon: u32,
    pub onu: u32,
}

impl OnuLocation {
    /// The PON interface view of this ONU.
    pub fn scope(&self) -> Scope {
        Scope::Pon {
            slot: self.slot,
            pon: self.pon,
        }
    }
}

/// Ethernet port selector of an ONU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eth {
    All,
    Port(u32),
}

/// Priority, TPID and VLAN id of a VLAN operation. `None` is sent as
/// `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlanTarget {
    pub cos: Option<u8>,
    pub tpid: u16,
    pub vid: Option<u16>,
}

impl VlanTarget {
    pub fn new(cos: Option<u8>, tpid: u16, vid: Option<u16>) -> Self {
        Self { cos, tpid, vid }
    }

    fn append(&self, cmd: CommandLine) -> Result<CommandLine> {
        Ok(cmd
            .kv("priority", cos_word(self.cos)?)
            .kv("tpid", self.tpid)
            .kv("vid", vid_word(self.vid)?))
    }
}

/// Turns translation on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translate {
    Disable,
    Enable(VlanTarget),
}

/// VLAN handling of one ONU port service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VlanRule {
    Pvlan { cos: Option<u8>, vid: Option<u16> },
    Tag(VlanTarget),
    Transparent(VlanTarget),
    Translate(Translate),
    QinqDisable,
    QinqEnable {
        target: VlanTarget,
        classification_profile: String,
        service_vlan: String,
    },
}

impl VlanRule {
    /// The rule as it follows `service <index>` on the command line.
    fn append(&self, cmd: CommandLine) -> Result<CommandLine> {
        match self {
            VlanRule::Pvlan { cos, vid } => Ok(cmd
                .kw("pvlan")
                .kv("priority", cos_word(*cos)?)
                .kv("vid", vid_word(*vid)?)),
            VlanRule::Tag(target) => target.append(cmd.kw("tag")),
            VlanRule::Transparent(target) => target.append(cmd.kw("transparent")),
            VlanRule::Translate(Translate::Disable) => Ok(cmd.kw("translate disable")),
            VlanRule::Translate(Translate::Enable(target)) => {
                target.append(cmd.kw("translate enable"))
            }
            VlanRule::QinqDisable => Ok(cmd.kw("qinq disable")),
            VlanRule::QinqEnable {
                target,
                classification_profile,
                service_vlan,
            } => Ok(target
                .append(cmd.kw("qinq enable"))?
                .arg(validate::name("classification_profile", classification_profile)?)
                .arg(validate::name("service_vlan", service_vlan)?)),
        }
    }
}

/// One traffic classification rule of an ONU port service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceClassification {
    pub direction: Direction,
    pub field: FieldType,
    pub value: String,
    pub operator: Operator,
}

fn cos_word(cos: Option<u8>) -> Result<String> {
    match cos {
        None => Ok("null".to_string()),
        Some(c) if c <= 7 => Ok(c.to_string()),
        Some(c) => Err(Error::validation("cos", format!("{} is outside 0..=7", c))),
    }
}

fn vid_word(vid: Option<u16>) -> Result<String> {
    match vid {
        None => Ok("null".to_string()),
        Some(v) => validate::vlan("vid", v).map(|v| v.to_string()),
    }
}

fn offline(sn: &str) -> Error {
    Error::validation("sn", format!("ONU {} is offline", sn))
}

impl An6k17 {
    /// `show authorization`: one record per authorized ONU.
    pub async fn authorization(&self) -> Result<Vec<Record>> {
        let output = self.query(Scope::Config, "show authorization").await?;
        Ok(extract::authorization(&output))
    }

    /// `show discovery`: ONUs seen but not authorized, on every PON.
    pub async fn discovery(&self) -> Result<Vec<Record>> {
        let output = self.query(Scope::Config, "show discovery").await?;
        Ok(extract::discovery(&output))
    }

    /// Unauthorized ONUs on one PON.
    pub async fn pon_discovered(&self, slot: u32, pon: u32) -> Result<Vec<Record>> {
        let output = self.query(Scope::Pon { slot, pon }, "show onu discovered").await?;
        Ok(extract::discovery(&output))
    }

    /// Slot and PON of an ONU, authorized or merely discovered.
    pub async fn onu_position(&self, sn: &str) -> Result<(u32, u32)> {
        let authorized = self.authorization().await?;
        if let Some(pos) = authorized
            .iter()
            .find(|r| r.text("PhyId") == Some(sn))
            .and_then(|r| Some((field_u32(r, "Slot")?, field_u32(r, "Pon")?)))
        {
            return Ok(pos);
        }
        let discovered = self.discovery().await?;
        discovered
            .iter()
            .find(|r| r.text("PhyId") == Some(sn))
            .and_then(|r| Some((field_u32(r, "SLOT")?, field_u32(r, "PON")?)))
            .ok_or_else(|| {
                warn!("ONU {} is neither authorized nor discovered", sn);
                Error::not_found(format!("ONU {}", sn))
            })
    }

    /// ONU id of an authorized ONU, `None` if it is not authorized.
    pub async fn onu_id(&self, sn: &str) -> Result<Option<u32>> {
        Ok(find_authorized(&self.authorization().await?, sn).map(|at| at.onu))
    }

    /// Serial number of the ONU at a position, `None` if the slot is free.
    pub async fn onu_sn(&self, slot: u32, pon: u32, onu: u32) -> Result<Option<String>> {
        Ok(self
            .authorization()
            .await?
            .into_iter()
            .find(|r| {
                field_u32(r, "Slot") == Some(slot)
                    && field_u32(r, "Pon") == Some(pon)
                    && field_u32(r, "Onu") == Some(onu)
            })
            .and_then(|r| r.text("PhyId").map(str::to_string)))
    }

    /// Full position of an authorized ONU.
    pub async fn locate(&self, sn: &str) -> Result<OnuLocation> {
        find_authorized(&self.authorization().await?, sn)
            .ok_or_else(|| Error::not_found(format!("authorized ONU {}", sn)))
    }

    pub async fn is_onu_online(&self, sn: &str) -> Result<bool> {
        let authorized = self.authorization().await?;
        let state = authorized
            .iter()
            .find(|r| r.text("PhyId") == Some(sn))
            .and_then(|r| r.text("OST"));
        match state {
            Some("up") => Ok(true),
            Some("dn") => Ok(false),
            _ => Err(Error::not_found(format!("state of ONU {}", sn))),
        }
    }

    /// Last registration time; `None` if the ONU never came online.
    pub async fn onu_last_online_time(&self, sn: &str) -> Result<Option<NaiveDateTime>> {
        self.last_reg_status_change(sn, "LAST_ON_TIME").await
    }

    /// Last deregistration time; `None` if the ONU never went offline.
    pub async fn onu_last_offline_time(&self, sn: &str) -> Result<Option<NaiveDateTime>> {
        self.last_reg_status_change(sn, "LAST_OFF_TIME").await
    }

    async fn last_reg_status_change(&self, sn: &str, field: &str) -> Result<Option<NaiveDateTime>> {
        let at = self.locate(sn).await?;
        let cmd = CommandLine::new("show onu last-reg-status-change").arg(at.onu);
        let output = self.query(at.scope(), cmd).await?;
        let records = extract::last_reg_status_change(&output);
        let record = records
            .first()
            .ok_or_else(|| Error::data_not_found(format!("registration history of {}", sn)))?;
        Ok(record.get(field).and_then(|v| v.as_timestamp()))
    }

    /// Reboot an online ONU and wait until it drops off; with `wait`, also
    /// until it registers again.
    pub async fn reset_onu(&self, sn: &str, wait: bool) -> Result<()> {
        if !self.is_onu_online(sn).await? {
            return Err(offline(sn));
        }
        let at = self.locate(sn).await?;
        self.execute(at.scope(), [CommandLine::new("onu reset").arg(at.onu)])
            .await?;

        let this = self;
        wait_for_true(POLL_INTERVAL, OFFLINE_BUDGET, move || async move {
            this.is_onu_online(sn).await.map(|online| !online)
        })
        .await?;
        if wait {
            wait_for_true(POLL_INTERVAL, ONLINE_BUDGET, move || async move {
                this.is_onu_online(sn).await
            })
            .await?;
        }
        Ok(())
    }

    /// Reboot every online ONU, one session per PON.
    ///
    /// Only ONUs that were online beforehand are waited for.
    pub async fn reset_all_onu(&self, wait: bool) -> Result<()> {
        let mut online: BTreeMap<(u32, u32), Vec<(u32, String)>> = BTreeMap::new();
        for record in self.authorization().await? {
            let (Some(slot), Some(pon), Some(onu), Some(sn)) = (
                field_u32(&record, "Slot"),
                field_u32(&record, "Pon"),
                field_u32(&record, "Onu"),
                record.text("PhyId"),
            ) else {
                continue;
            };
            if record.text("OST") == Some("up") {
                online.entry((slot, pon)).or_default().push((onu, sn.to_string()));
            }
        }

        for ((slot, pon), onus) in &online {
            let commands = onus
                .iter()
                .map(|(onu, _)| CommandLine::new("onu reset").arg(onu));
            self.execute(Scope::Pon { slot: *slot, pon: *pon }, commands).await?;
        }
        info!("reset {} ONUs", online.values().map(Vec::len).sum::<usize>());

        let serials: Vec<String> = online.into_values().flatten().map(|(_, sn)| sn).collect();
        let serials = &serials;
        let this = self;
        wait_for_true(POLL_INTERVAL, OFFLINE_BUDGET, move || async move {
            this.all_in_state(serials, false).await
        })
        .await?;
        if wait {
            wait_for_true(POLL_INTERVAL, ONLINE_BUDGET, move || async move {
                this.all_in_state(serials, true).await
            })
            .await?;
        }
        Ok(())
    }

    /// True if every ONU in `serials` is authorized and online (or offline).
    async fn all_in_state(&self, serials: &[String], online: bool) -> Result<bool> {
        let authorized = self.authorization().await?;
        let want = if online { "up" } else { "dn" };
        Ok(serials.iter().all(|sn| {
            authorized
                .iter()
                .find(|r| r.text("PhyId") == Some(sn.as_str()))
                .and_then(|r| r.text("OST"))
                == Some(want)
        }))
    }

    /// `show onu port vlan`: one record per configured port service.
    pub async fn onu_port_vlan(&self, sn: &str) -> Result<Vec<Record>> {
        let at = self.locate(sn).await?;
        let output = self
            .query(at.scope(), CommandLine::new("show onu port vlan").arg(at.onu))
            .await?;
        Ok(extract::onu_port_vlan(&output))
    }

    /// Link state of every Ethernet port. The ONU must be online.
    pub async fn onu_port_status(&self, sn: &str) -> Result<OnuPortStatus> {
        if !self.is_onu_online(sn).await? {
            return Err(offline(sn));
        }
        let at = self.locate(sn).await?;
        let output = self
            .query(at.scope(), CommandLine::new("show onu port status").arg(at.onu))
            .await?;
        extract::onu_port_status(&output)
            .ok_or_else(|| Error::data_not_found(format!("port status of {}", sn)))
    }

    /// Remove every VLAN service from one port, or from all of them.
    ///
    /// [`Eth::All`] needs the port count, so the ONU must be online.
    pub async fn clear_onu_port_vlan(&self, sn: &str, eth: Eth) -> Result<()> {
        let ports = match eth {
            Eth::Port(port) => vec![validate::index("eth", port)?],
            Eth::All => {
                let count = self.onu_port_status(sn).await?.ports.len() as u32;
                (1..=count).collect()
            }
        };
        let at = self.locate(sn).await?;
        let mut session = self.open(at.scope()).await?;
        for port in ports {
            let cmd = CommandLine::new("no onu port vlan").arg(at.onu).kv("eth", port);
            session.run(&cmd.to_string()).await?;
        }
        session.disconnect().await
    }

    /// Number of services configured on one port.
    pub async fn onu_port_vlan_service_count(&self, sn: &str, eth: u32) -> Result<usize> {
        let eth = validate::index("eth", eth)?;
        Ok(self
            .onu_port_vlan(sn)
            .await?
            .iter()
            .filter(|r| field_u32(r, "PORT") == Some(eth))
            .count())
    }

    pub async fn set_onu_port_vlan_service_count(&self, sn: &str, eth: u32, count: u32) -> Result<()> {
        let eth = validate::index("eth", eth)?;
        self.onu_service(sn, |onu| {
            Ok(CommandLine::new("onu port vlan")
                .arg(onu)
                .kv("eth", eth)
                .kv("service count", count))
        })
        .await
    }

    pub async fn set_onu_port_vlan_tls(&self, sn: &str, eth: u32, index: u32, tls: bool) -> Result<()> {
        self.onu_service(sn, |onu| {
            Ok(service(onu, eth, index)?.kv("tls", bool_to_str(tls)))
        })
        .await
    }

    pub async fn set_onu_port_vlan_service_type(
        &self,
        sn: &str,
        eth: u32,
        index: u32,
        kind: ServiceType,
    ) -> Result<()> {
        self.onu_service(sn, |onu| Ok(service(onu, eth, index)?.kv("type", kind)))
            .await
    }

    pub async fn set_onu_port_vlan_service_vlan(
        &self,
        sn: &str,
        eth: u32,
        index: u32,
        rule: &VlanRule,
    ) -> Result<()> {
        self.onu_service(sn, |onu| rule.append(service(onu, eth, index)?))
            .await
    }

    pub async fn del_onu_port_vlan_service(&self, sn: &str, eth: u32, index: u32) -> Result<()> {
        self.onu_service(sn, |onu| Ok(CommandLine::new("no").kw(&service(onu, eth, index)?.to_string())))
            .await
    }

    /// Attach classification rules to a port service, one command per rule.
    pub async fn set_onu_port_vlan_service_classification(
        &self,
        sn: &str,
        eth: u32,
        index: u32,
        rules: &[ServiceClassification],
    ) -> Result<()> {
        validate::index("eth", eth)?;
        validate::index("service", index)?;
        let at = self.locate(sn).await?;
        let commands: Vec<CommandLine> = rules
            .iter()
            .map(|rule| {
                CommandLine::new("onu port vlan")
                    .arg(at.onu)
                    .kv("eth", eth)
                    .kv("service", index)
                    .arg(rule.direction)
                    .arg(rule.field)
                    .arg(&rule.value)
                    .arg(rule.operator)
            })
            .collect();
        self.execute(at.scope(), commands).await
    }

    /// `show onu statistics`: counter name to value and unit.
    pub async fn onu_statistics(&self, sn: &str) -> Result<IndexMap<String, Measurement>> {
        let at = self.locate(sn).await?;
        let output = self
            .query(at.scope(), CommandLine::new("show onu statistics").arg(at.onu))
            .await?;
        Ok(extract::onu_statistics(&output))
    }

    /// Build one command for an authorized ONU and run it in its PON view.
    ///
    /// `build` runs before any connection is made, so argument errors
    /// never reach the device.
    pub(crate) async fn onu_service<F>(&self, sn: &str, build: F) -> Result<()>
    where
        F: FnOnce(u32) -> Result<CommandLine>,
    {
        let at = self.locate(sn).await?;
        let cmd = build(at.onu)?;
        self.execute(at.scope(), [cmd]).await
    }
}

/// `onu port vlan <onu> eth <eth> service <index>`.
fn service(onu: u32, eth: u32, index: u32) -> Result<CommandLine> {
    Ok(CommandLine::new("onu port vlan")
        .arg(onu)
        .kv("eth", validate::index("eth", eth)?)
        .kv("service", validate::index("service", index)?))
}

fn find_authorized(records: &[Record], sn: &str) -> Option<OnuLocation> {
    records
        .iter()
        .find(|r| r.text("PhyId") == Some(sn))
        .and_then(|r| {
            Some(OnuLocation {
                slot: field_u32(r, "Slot")?,
                pon: field_u32(r, "Pon")?,
                onu: field_u32(r, "Onu")?,
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::error::ErrorKind;
    use crate::testing::{authorization_table, discovery_table, FakeOlt};

    const ONLINE: &str = "FHTT033178b0";
    const OFFLINE: &str = "FHTT92f445c8";
    const UNAUTHORIZED: &str = "FHTT91fbc5e8";

    const PORT_VLAN: &str = "\
NO.  SL/LI/ONU PORT ID TYPE  MODE CVID COS  TPID  TVID COS  TPID  SVID COS  TPID  PVID COS  SRVTYPE PRIQUE  GEMPORT
====================================================================================================================
1    4 /8 /1   1    1  unica tran null null 33024 null null null  null null null  null null default default default
2    4 /8 /1   1    2  unica tag  100  null 33024 null null null  null null null  null null default default default
3    4 /8 /1   2    1  unica tran null null 33024 null null null  null null null  null null default default default
";

    const PORT_STATUS: &str = "\
SLOT:4 PON:8 ONU:1  ,  ITEM=2

PORT ID = 1
PORT CONNECT    : Linked

PORT ID = 2
PORT CONNECT    : Not Linked
";

    fn responder(cmd: &str) -> String {
        match cmd {
            "show authorization" => {
                authorization_table(&[(4, 8, 1, "up", ONLINE), (4, 8, 64, "dn", OFFLINE)])
            }
            "show discovery" => discovery_table(&[(UNAUTHORIZED, "fiberhome", "fh", "fh")]),
            "show onu port vlan 1" => PORT_VLAN.to_string(),
            "show onu port status 1" => PORT_STATUS.to_string(),
            "show onu last-reg-status-change 1" => "\
SLOT PON ONU LAST_OFF_TIME LAST_ON_TIME
4    8   1   Last Off Time = 0000-00-00 00:00:00,Last On Time = 2020-09-22 14:09:29.
"
            .to_string(),
            _ => String::new(),
        }
    }

    #[tokio::test]
    async fn test_identity_lookups() {
        let olt = FakeOlt::start(responder).await;
        let facade = olt.olt();
        assert_eq!(facade.onu_position(ONLINE).await.unwrap(), (4, 8));
        assert_eq!(facade.onu_position(UNAUTHORIZED).await.unwrap(), (4, 8));
        assert_eq!(
            facade.onu_position("FHTTdeadbeef").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(facade.onu_id(OFFLINE).await.unwrap(), Some(64));
        assert_eq!(facade.onu_id(UNAUTHORIZED).await.unwrap(), None);
        assert_eq!(facade.onu_sn(4, 8, 1).await.unwrap().as_deref(), Some(ONLINE));
        assert_eq!(facade.onu_sn(4, 8, 2).await.unwrap(), None);
        assert!(facade.is_onu_online(ONLINE).await.unwrap());
        assert!(!facade.is_onu_online(OFFLINE).await.unwrap());
        assert_eq!(
            facade.is_onu_online(UNAUTHORIZED).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_last_online_time() {
        let olt = FakeOlt::start(responder).await;
        let facade = olt.olt();
        let on = facade.onu_last_online_time(ONLINE).await.unwrap().unwrap();
        assert_eq!(on.to_string(), "2020-09-22 14:09:29");
        assert_eq!(facade.onu_last_offline_time(ONLINE).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_port_service_count() {
        let olt = FakeOlt::start(responder).await;
        let facade = olt.olt();
        assert_eq!(facade.onu_port_vlan(ONLINE).await.unwrap().len(), 3);
        assert_eq!(facade.onu_port_vlan_service_count(ONLINE, 1).await.unwrap(), 2);
        assert_eq!(facade.onu_port_vlan_service_count(ONLINE, 3).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_port_status_requires_online() {
        let olt = FakeOlt::start(responder).await;
        let facade = olt.olt();
        assert_eq!(facade.onu_port_status(ONLINE).await.unwrap().ports.len(), 2);
        let err = facade.onu_port_status(OFFLINE).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_clear_all_ports() {
        let olt = FakeOlt::start(responder).await;
        olt.olt().clear_onu_port_vlan(ONLINE, Eth::All).await.unwrap();
        assert_eq!(
            olt.changes(),
            ["no onu port vlan 1 eth 1", "no onu port vlan 1 eth 2"]
        );
    }

    #[tokio::test]
    async fn test_vlan_rules() {
        let olt = FakeOlt::start(responder).await;
        let facade = olt.olt();
        let target = VlanTarget::new(Some(3), 33024, Some(1000));
        let rules = [
            VlanRule::Pvlan { cos: None, vid: Some(10) },
            VlanRule::Tag(target),
            VlanRule::Transparent(VlanTarget::new(None, 33024, None)),
            VlanRule::Translate(Translate::Enable(target)),
            VlanRule::Translate(Translate::Disable),
            VlanRule::QinqEnable {
                target,
                classification_profile: "cls".to_string(),
                service_vlan: "svc".to_string(),
            },
            VlanRule::QinqDisable,
        ];
        for rule in &rules {
            facade
                .set_onu_port_vlan_service_vlan(ONLINE, 1, 2, rule)
                .await
                .unwrap();
        }
        assert_eq!(
            olt.changes(),
            [
                "onu port vlan 1 eth 1 service 2 pvlan priority null vid 10",
                "onu port vlan 1 eth 1 service 2 tag priority 3 tpid 33024 vid 1000",
                "onu port vlan 1 eth 1 service 2 transparent priority null tpid 33024 vid null",
                "onu port vlan 1 eth 1 service 2 translate enable priority 3 tpid 33024 vid 1000",
                "onu port vlan 1 eth 1 service 2 translate disable",
                "onu port vlan 1 eth 1 service 2 qinq enable priority 3 tpid 33024 vid 1000 cls svc",
                "onu port vlan 1 eth 1 service 2 qinq disable",
            ]
        );
    }

    #[tokio::test]
    async fn test_service_arguments_checked_before_io() {
        let olt = FakeOlt::start(responder).await;
        let facade = olt.olt();
        let bad_vid = VlanRule::Tag(VlanTarget::new(None, 33024, Some(4095)));
        let err = facade
            .set_onu_port_vlan_service_vlan(ONLINE, 1, 1, &bad_vid)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = facade.set_onu_port_vlan_tls(ONLINE, 0, 1, true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(olt.changes().is_empty());
    }

    #[tokio::test]
    async fn test_service_settings() {
        let olt = FakeOlt::start(responder).await;
        let facade = olt.olt();
        facade.set_onu_port_vlan_service_count(ONLINE, 1, 3).await.unwrap();
        facade.set_onu_port_vlan_tls(ONLINE, 1, 3, false).await.unwrap();
        facade
            .set_onu_port_vlan_service_type(ONLINE, 1, 3, ServiceType::Multicast)
            .await
            .unwrap();
        facade.del_onu_port_vlan_service(ONLINE, 1, 3).await.unwrap();
        facade
            .set_onu_port_vlan_service_classification(
                ONLINE,
                1,
                3,
                &[ServiceClassification {
                    direction: Direction::Upstream,
                    field: FieldType::VlanId,
                    value: "100".to_string(),
                    operator: Operator::Equal,
                }],
            )
            .await
            .unwrap();
        assert_eq!(
            olt.changes(),
            [
                "onu port vlan 1 eth 1 service count 3",
                "onu port vlan 1 eth 1 service 3 tls disable",
                "onu port vlan 1 eth 1 service 3 type multicast",
                "no onu port vlan 1 eth 1 service 3",
                "onu port vlan 1 eth 1 service 3 upstream vid 100 0",
            ]
        );
    }

    #[tokio::test]
    async fn test_reset_onu_waits_for_reboot() {
        // Online until the reset, then one offline reading, then back.
        let resets = Arc::new(AtomicUsize::new(0));
        let polls = Arc::new(Mutex::new(0));
        let (r, p) = (resets.clone(), polls.clone());
        let olt = FakeOlt::start(move |cmd| match cmd {
            "onu reset 1" => {
                r.fetch_add(1, Ordering::SeqCst);
                String::new()
            }
            "show authorization" => {
                let state = if r.load(Ordering::SeqCst) == 0 {
                    "up"
                } else {
                    let mut polls = p.lock().unwrap();
                    *polls += 1;
                    if *polls == 1 { "dn" } else { "up" }
                };
                authorization_table(&[(4, 8, 1, state, ONLINE)])
            }
            _ => String::new(),
        })
        .await;
        olt.olt().reset_onu(ONLINE, true).await.unwrap();
        assert_eq!(resets.load(Ordering::SeqCst), 1);
        assert_eq!(*polls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reset_refuses_offline_onu() {
        let olt = FakeOlt::start(responder).await;
        let err = olt.olt().reset_onu(OFFLINE, false).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(olt.changes().is_empty());
    }

    #[tokio::test]
    async fn test_reset_all_groups_by_pon() {
        let resets = Arc::new(AtomicUsize::new(0));
        let r = resets.clone();
        let olt = FakeOlt::start(move |cmd| {
            if cmd.starts_with("onu reset") {
                r.fetch_add(1, Ordering::SeqCst);
                return String::new();
            }
            if cmd == "show authorization" {
                let state = if r.load(Ordering::SeqCst) < 3 { "up" } else { "dn" };
                return authorization_table(&[
                    (4, 8, 1, state, "FHTT00000001"),
                    (4, 8, 2, state, "FHTT00000002"),
                    (4, 9, 1, state, "FHTT00000003"),
                    (4, 9, 2, "dn", "FHTT00000004"),
                ]);
            }
            String::new()
        })
        .await;
        olt.olt().reset_all_onu(false).await.unwrap();

        let commands = olt.commands();
        let pons: Vec<&String> = commands.iter().filter(|c| c.starts_with("interface pon")).collect();
        assert_eq!(pons, ["interface pon 1/4/8", "interface pon 1/4/9"]);
        assert_eq!(
            olt.changes(),
            ["onu reset 1", "onu reset 2", "onu reset 1"]
        );
    }
}
