//! ONU port service actions.

use log::info;

use crate::device::{An6k17, ServiceClassification, Translate, VlanRule, VlanTarget};
use crate::error::{Error, Result};
use crate::types::{ServiceType, VlanMode};

/// TPID of an 802.1Q tag.
pub const DEFAULT_TPID: u16 = 0x8100;

/// QinQ settings of a port service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QinqService {
    pub svlan: VlanTarget,
    pub classification_profile: String,
    pub service_vlan: String,
}

/// What [`add_port_service`] configures beyond the service itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortServiceOptions {
    pub tls: Option<bool>,
    pub classification: Vec<ServiceClassification>,
    pub service_type: Option<ServiceType>,
    pub cvlan_mode: VlanMode,
    pub cvlan: VlanTarget,
    pub translate: Translate,
    pub qinq: Option<QinqService>,
}

impl Default for PortServiceOptions {
    fn default() -> Self {
        Self {
            tls: None,
            classification: Vec::new(),
            service_type: None,
            cvlan_mode: VlanMode::Transparent,
            cvlan: VlanTarget::new(None, DEFAULT_TPID, None),
            translate: Translate::Disable,
            qinq: None,
        }
    }
}

/// Remove every service of one ONU port.
pub async fn clear_port_service(olt: &An6k17, sn: &str, eth: u32) -> Result<()> {
    olt.set_onu_port_vlan_service_count(sn, eth, 0).await
}

/// Append a service to an ONU port and return its index.
pub async fn add_port_service(olt: &An6k17, sn: &str, eth: u32, options: &PortServiceOptions) -> Result<u32> {
    let count = olt.onu_port_vlan_service_count(sn, eth).await?;
    let index = u32::try_from(count + 1)
        .map_err(|_| Error::validation("eth", format!("{} services on port {}", count, eth)))?;
    olt.set_onu_port_vlan_service_count(sn, eth, index).await?;

    if let Some(tls) = options.tls {
        olt.set_onu_port_vlan_tls(sn, eth, index, tls).await?;
    }
    if !options.classification.is_empty() {
        olt.set_onu_port_vlan_service_classification(sn, eth, index, &options.classification)
            .await?;
    }
    if let Some(kind) = options.service_type {
        olt.set_onu_port_vlan_service_type(sn, eth, index, kind).await?;
    }

    let cvlan = match options.cvlan_mode {
        VlanMode::Transparent => VlanRule::Transparent(options.cvlan),
        VlanMode::Tag => VlanRule::Tag(options.cvlan),
    };
    olt.set_onu_port_vlan_service_vlan(sn, eth, index, &cvlan).await?;
    olt.set_onu_port_vlan_service_vlan(sn, eth, index, &VlanRule::Translate(options.translate))
        .await?;

    if let Some(qinq) = &options.qinq {
        let rule = VlanRule::QinqEnable {
            target: qinq.svlan,
            classification_profile: qinq.classification_profile.clone(),
            service_vlan: qinq.service_vlan.clone(),
        };
        olt.set_onu_port_vlan_service_vlan(sn, eth, index, &rule).await?;
    }

    info!("added service {} on eth {} of {}", index, eth, sn);
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::{authorization_table, FakeOlt};
    use crate::types::{Direction, FieldType, Operator};

    const SN: &str = "FHTT033178b0";

    const PORT_VLAN: &str = "\
NO.  SL/LI/ONU PORT ID TYPE  MODE CVID COS  TPID  TVID COS  TPID  SVID COS  TPID  PVID COS  SRVTYPE PRIQUE  GEMPORT
====================================================================================================================
1    4 /8 /1   1    1  unica tran null null 33024 null null null  null null null  null null default default default
2    4 /8 /1   2    1  unica tran null null 33024 null null null  null null null  null null default default default
";

    async fn fake() -> FakeOlt {
        FakeOlt::start(|cmd| match cmd {
            "show authorization" => authorization_table(&[(4, 8, 1, "up", SN)]),
            "show onu port vlan 1" => PORT_VLAN.to_string(),
            _ => String::new(),
        })
        .await
    }

    #[tokio::test]
    async fn test_add_port_service_defaults() {
        let olt = fake().await;
        let index = add_port_service(&olt.olt(), SN, 1, &PortServiceOptions::default())
            .await
            .unwrap();
        assert_eq!(index, 2);
        assert_eq!(
            olt.changes(),
            [
                "onu port vlan 1 eth 1 service count 2",
                "onu port vlan 1 eth 1 service 2 transparent priority null tpid 33024 vid null",
                "onu port vlan 1 eth 1 service 2 translate disable",
            ]
        );
    }

    #[tokio::test]
    async fn test_add_port_service_full() {
        let olt = fake().await;
        let options = PortServiceOptions {
            tls: Some(true),
            classification: vec![ServiceClassification {
                direction: Direction::Upstream,
                field: FieldType::VlanId,
                value: "100".to_string(),
                operator: Operator::Equal,
            }],
            service_type: Some(ServiceType::Multicast),
            cvlan_mode: VlanMode::Tag,
            cvlan: VlanTarget::new(Some(1), DEFAULT_TPID, Some(100)),
            translate: Translate::Enable(VlanTarget::new(None, DEFAULT_TPID, Some(200))),
            qinq: Some(QinqService {
                svlan: VlanTarget::new(Some(0), DEFAULT_TPID, Some(3000)),
                classification_profile: "p1".to_string(),
                service_vlan: "sv1".to_string(),
            }),
        };
        let index = add_port_service(&olt.olt(), SN, 2, &options).await.unwrap();
        assert_eq!(index, 2);

        let changes = olt.changes();
        assert_eq!(changes.len(), 7);
        assert_eq!(changes[0], "onu port vlan 1 eth 2 service count 2");
        assert_eq!(changes[1], "onu port vlan 1 eth 2 service 2 tls enable");
        assert_eq!(changes[3], "onu port vlan 1 eth 2 service 2 type multicast");
        assert_eq!(changes[4], "onu port vlan 1 eth 2 service 2 tag priority 1 tpid 33024 vid 100");
        assert_eq!(
            changes[5],
            "onu port vlan 1 eth 2 service 2 translate enable priority null tpid 33024 vid 200"
        );
        assert_eq!(
            changes[6],
            "onu port vlan 1 eth 2 service 2 qinq enable priority 0 tpid 33024 vid 3000 p1 sv1"
        );
    }

    #[tokio::test]
    async fn test_clear_port_service() {
        let olt = fake().await;
        clear_port_service(&olt.olt(), SN, 3).await.unwrap();
        assert_eq!(olt.changes(), ["onu port vlan 1 eth 3 service count 0"]);
    }
}
