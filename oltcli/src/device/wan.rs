//! ONU WAN connections (`onu wan-cfg`).

use log::{debug, info};

use super::command::CommandLine;
use super::validate;
use super::An6k17;
use crate::error::Result;
use crate::extract::{self, WanCfgReport, WanDsp};
use crate::types::{VlanMode, WanMode, WanType};
use crate::value::{bool_to_str, Value, UNSET};

/// VLAN treatment of a WAN connection. The device takes either VLAN-mode
/// settings or QinQ settings, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WanVlanConfig {
    Vlan {
        mode: VlanMode,
        translate: bool,
        tvid: Option<u16>,
        tcos: Option<u8>,
    },
    Qinq {
        enable: bool,
        stpid: u16,
        svlan: Option<u16>,
        scos: Option<u8>,
    },
}

/// Port and SSID bindings, 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WanBindings {
    pub fe: Vec<u8>,
    pub ssid: Vec<u8>,
}

/// One WAN connection of an ONU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WanConfig {
    pub index: u32,
    pub mode: WanMode,
    pub wan_type: WanType,
    pub vlan: u16,
    pub cos: u8,
    pub nat: bool,
    pub qos: bool,
    pub vlan_config: Option<WanVlanConfig>,
    pub dsp: WanDsp,
    /// Remote id sent with [`WanDsp::DhcpRemoteId`].
    pub remote_id: Option<String>,
    pub active: Option<bool>,
    pub service_type: Option<u32>,
    pub upnp: Option<bool>,
    /// `Some` rewrites the bindings; an empty set unbinds everything.
    pub bindings: Option<WanBindings>,
}

impl WanConfig {
    /// A DHCP connection with no optional settings.
    pub fn new(index: u32, mode: WanMode, wan_type: WanType, vlan: u16, cos: u8) -> Self {
        Self {
            index,
            mode,
            wan_type,
            vlan,
            cos,
            nat: false,
            qos: false,
            vlan_config: None,
            dsp: WanDsp::Dhcp,
            remote_id: None,
            active: None,
            service_type: None,
            upnp: None,
            bindings: None,
        }
    }

    /// The configuration a report describes. The device does not print
    /// the DHCP remote id, so it is left unset.
    pub fn from_report(report: &WanCfgReport) -> Self {
        let vlan_config = report.vlan_mode.as_ref().map(|v| {
            if v.qinq {
                WanVlanConfig::Qinq {
                    enable: true,
                    stpid: as_opt(&v.stpid).unwrap_or(0x8100),
                    svlan: as_opt(&v.svlan),
                    scos: as_opt(&v.scos),
                }
            } else {
                WanVlanConfig::Vlan {
                    mode: v.mode,
                    translate: v.translate,
                    tvid: as_opt(&v.tvid),
                    tcos: as_opt(&v.tcos),
                }
            }
        });
        Self {
            index: report.index,
            mode: report.mode,
            wan_type: report.wan_type,
            vlan: report.vlan,
            cos: report.cos,
            nat: report.nat,
            qos: report.qos,
            vlan_config,
            dsp: report.dsp.clone(),
            remote_id: None,
            active: None,
            service_type: None,
            upnp: Some(report.upnp),
            bindings: Some(WanBindings {
                fe: report.fe.clone(),
                ssid: report.ssid.clone(),
            }),
        }
    }

    /// The full `onu wan-cfg` command for ONU `onu`.
    pub(crate) fn command(&self, onu: u32) -> Result<CommandLine> {
        let mut cmd = CommandLine::new("onu wan-cfg")
            .arg(onu)
            .kv("index", validate::index("index", self.index)?)
            .kv("mode", self.mode)
            .kv("type", self.wan_type)
            .arg(validate::vlan("vlan", self.vlan)?)
            .arg(self.cos)
            .kv("nat", bool_to_str(self.nat))
            .kv("qos", bool_to_str(self.qos));

        cmd = match &self.vlan_config {
            None => cmd,
            Some(WanVlanConfig::Vlan {
                mode,
                translate,
                tvid,
                tcos,
            }) => cmd
                .kv("vlanmode", mode)
                .kv("tvlan", bool_to_str(*translate))
                .arg(unset_or(*tvid)?)
                .arg(cos_or_unset(*tcos)),
            Some(WanVlanConfig::Qinq {
                enable,
                stpid,
                svlan,
                scos,
            }) => cmd
                .kv("qinq", bool_to_str(*enable))
                .arg(stpid)
                .arg(unset_or(*svlan)?)
                .arg(cos_or_unset(*scos)),
        };

        cmd = match (&self.dsp, &self.remote_id) {
            (WanDsp::Dhcp, _) => cmd,
            (WanDsp::DhcpRemoteId, Some(remote_id)) => cmd
                .kv("dsp", "dhcp-remoteid")
                .arg(validate::name("remote_id", remote_id)?),
            (WanDsp::DhcpRemoteId, None) => {
                debug!("no remote id for WAN {}, leaving DSP unchanged", self.index);
                cmd
            }
            (
                WanDsp::Static {
                    ip,
                    mask,
                    gateway,
                    dns_master,
                    dns_slave,
                },
                _,
            ) => cmd
                .kv("dsp", "static")
                .kv("ip", ip)
                .kv("mask", mask)
                .kv("gate", gateway)
                .kv("master", dns_master)
                .kv("slave", dns_slave),
            (
                WanDsp::Pppoe {
                    proxy,
                    mode,
                    username,
                    password,
                    server_name,
                },
                _,
            ) => cmd
                .kv("dsp", "pppoe")
                .kv("proxy", bool_to_str(*proxy))
                .arg(validate::name("username", username)?)
                .arg(validate::name("password", password)?)
                .arg(validate::name("server_name", server_name)?)
                .arg(mode),
        };

        cmd = cmd
            .opt("active", self.active.map(bool_to_str))
            .opt("service-type", self.service_type)
            .opt("upnp_switch", self.upnp.map(bool_to_str));

        if let Some(bindings) = &self.bindings {
            cmd = cmd
                .kv("entries", bindings.fe.len() + bindings.ssid.len())
                .args(bindings.fe.iter().map(|n| format!("fe{}", n)))
                .args(bindings.ssid.iter().map(|n| format!("ssid{}", n)));
        }
        Ok(cmd)
    }
}

fn as_opt<T: TryFrom<i64>>(value: &Value) -> Option<T> {
    value.as_int().and_then(|v| T::try_from(v).ok())
}

fn unset_or(vid: Option<u16>) -> Result<i64> {
    match vid {
        Some(v) => Ok(validate::vlan("vid", v)? as i64),
        None => Ok(UNSET),
    }
}

fn cos_or_unset(cos: Option<u8>) -> i64 {
    cos.map(i64::from).unwrap_or(UNSET)
}

/// Static addressing for [`WanConfig::dsp`] from dotted-quad text.
pub fn static_dsp(ip: &str, mask: &str, gateway: &str, dns_master: &str, dns_slave: &str) -> Result<WanDsp> {
    Ok(WanDsp::Static {
        ip: validate::ipv4("ip", ip)?,
        mask: validate::dotted_mask(mask)?,
        gateway: validate::ipv4("gateway", gateway)?,
        dns_master: validate::ipv4("dns_master", dns_master)?,
        dns_slave: validate::ipv4("dns_slave", dns_slave)?,
    })
}

impl An6k17 {
    /// Create or replace a WAN connection on an authorized ONU.
    pub async fn set_onu_wan_cfg(&self, sn: &str, config: &WanConfig) -> Result<()> {
        self.onu_service(sn, |onu| config.command(onu)).await?;
        info!("WAN {} of {} set to {} {}", config.index, sn, config.mode, config.wan_type);
        Ok(())
    }

    /// WAN connection `index`, or `None` if it does not exist.
    pub async fn onu_wan_cfg(&self, sn: &str, index: u32) -> Result<Option<WanCfgReport>> {
        let at = self.locate(sn).await?;
        let cmd = CommandLine::new("show onu wan-cfg").arg(at.onu).kv("index", index);
        let output = self.query(at.scope(), cmd).await?;
        Ok(extract::wan_cfg(&output))
    }

    /// Unbind and delete WAN connection `index`. Absent connections are
    /// not an error.
    pub async fn del_onu_wan_cfg(&self, sn: &str, index: u32) -> Result<()> {
        let Some(report) = self.onu_wan_cfg(sn, index).await? else {
            debug!("{} has no WAN {}", sn, index);
            return Ok(());
        };
        let mut unbound = WanConfig::from_report(&report);
        unbound.bindings = Some(WanBindings::default());

        let at = self.locate(sn).await?;
        let delete = CommandLine::new("no onu wan-cfg").arg(at.onu).kv("index", index);
        self.execute(at.scope(), [unbound.command(at.onu)?, delete]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{authorization_table, FakeOlt};
    use crate::types::PppoeMode;

    const SN: &str = "FHTT033178b0";

    const PPPOE: &str = "show wancfg:slot 4 8 1 2 wan_name INTERNET_R_VID_2000 INTERNET route vlan 2000 cos 4 nat enable qos disable upnp disable DSP pppoe 0 mode auto fiberhome fiberhome xxx transparent translate disable tvlan 65535 tcos 65535 qinq disable 33024 65535 bind item 4 1   2   3   101";

    fn responder(cmd: &str) -> String {
        match cmd {
            "show authorization" => authorization_table(&[(4, 8, 1, "up", SN)]),
            "show onu wan-cfg 1 index 2" => PPPOE.to_string(),
            "show onu wan-cfg 1 index 3" => "slot_out 4 8 1 index 3 no wancfg,ret -1.".to_string(),
            _ => String::new(),
        }
    }

    #[test]
    fn test_command_forms() {
        let mut config = WanConfig::new(1, WanMode::Voip, WanType::Route, 300, 0);
        config.vlan_config = Some(WanVlanConfig::Qinq {
            enable: true,
            stpid: 33024,
            svlan: Some(400),
            scos: None,
        });
        config.dsp = static_dsp("10.0.0.2", "24", "10.0.0.1", "8.8.8.8", "8.8.4.4").unwrap();
        config.active = Some(true);
        config.service_type = Some(2);
        assert_eq!(
            config.command(7).unwrap().to_string(),
            "onu wan-cfg 7 index 1 mode voip type route 300 0 nat disable qos disable \
             qinq enable 33024 400 65535 dsp static ip 10.0.0.2 mask 255.255.255.0 \
             gate 10.0.0.1 master 8.8.8.8 slave 8.8.4.4 active enable service-type 2"
        );

        config.vlan_config = None;
        config.dsp = WanDsp::DhcpRemoteId;
        config.remote_id = Some("rid-1".to_string());
        config.bindings = Some(WanBindings {
            fe: vec![1, 2],
            ssid: vec![1],
        });
        assert_eq!(
            config.command(7).unwrap().to_string(),
            "onu wan-cfg 7 index 1 mode voip type route 300 0 nat disable qos disable \
             dsp dhcp-remoteid rid-1 active enable service-type 2 entries 3 fe1 fe2 ssid1"
        );

        config.vlan = 0;
        assert_eq!(config.command(7).unwrap_err().kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_set_onu_wan_cfg() {
        let olt = FakeOlt::start(responder).await;
        let mut config = WanConfig::new(2, WanMode::Internet, WanType::Route, 2000, 4);
        config.nat = true;
        config.vlan_config = Some(WanVlanConfig::Vlan {
            mode: VlanMode::Tag,
            translate: true,
            tvid: Some(2001),
            tcos: Some(1),
        });
        config.dsp = WanDsp::Pppoe {
            proxy: false,
            mode: PppoeMode::Auto,
            username: "user".to_string(),
            password: "pass".to_string(),
            server_name: "srv".to_string(),
        };
        config.upnp = Some(false);
        olt.olt().set_onu_wan_cfg(SN, &config).await.unwrap();
        assert_eq!(
            olt.changes(),
            ["onu wan-cfg 1 index 2 mode internet type route 2000 4 nat enable qos disable \
              vlanmode tag tvlan enable 2001 1 dsp pppoe proxy disable user pass srv auto \
              upnp_switch disable"]
        );
    }

    #[tokio::test]
    async fn test_del_onu_wan_cfg_unbinds_first() {
        let olt = FakeOlt::start(responder).await;
        let facade = olt.olt();
        assert_eq!(facade.onu_wan_cfg(SN, 2).await.unwrap().unwrap().fe, [1, 2, 3]);
        facade.del_onu_wan_cfg(SN, 2).await.unwrap();
        assert_eq!(
            olt.changes(),
            [
                "onu wan-cfg 1 index 2 mode internet type route 2000 4 nat enable qos disable \
                 vlanmode transparent tvlan disable 65535 65535 dsp pppoe proxy disable \
                 fiberhome fiberhome xxx auto upnp_switch disable entries 0",
                "no onu wan-cfg 1 index 2",
            ]
        );
    }

    #[tokio::test]
    async fn test_del_absent_wan_cfg() {
        let olt = FakeOlt::start(responder).await;
        olt.olt().del_onu_wan_cfg(SN, 3).await.unwrap();
        assert!(olt.changes().is_empty());
    }
}
