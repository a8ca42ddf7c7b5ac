//! PON port settings (auto-discovery, authentication), IGMP and uplink
//! port VLANs.

use indexmap::IndexMap;
use log::debug;

use super::command::CommandLine;
use super::validate;
use super::{An6k17, Scope};
use crate::error::{Error, Result};
use crate::extract::{self, AutoDiscover, PonAutoDiscover, Record, VlanRange};
use crate::types::{AuthMode, IgmpMode, VlanTag};
use crate::value::bool_to_str;

/// Uplink ports a VLAN range applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UplinkPorts {
    pub tag: VlanTag,
    pub slot: u32,
    /// One port (`"2"`) or a device port list (`"2,3"`). Spaces after
    /// the commas are dropped.
    pub ports: String,
}

impl UplinkPorts {
    pub fn new(tag: VlanTag, slot: u32, ports: impl Into<String>) -> Self {
        Self {
            tag,
            slot,
            ports: ports.into(),
        }
    }
}

/// Port list in the device form: `"2, 3"` becomes `"2,3"`.
fn port_list(ports: &str) -> Result<String> {
    let items: Vec<&str> = ports.split(',').map(str::trim).collect();
    if items.iter().any(|p| p.is_empty()) {
        return Err(Error::validation("ports", format!("'{}' is not a port list", ports)));
    }
    Ok(validate::name("ports", &items.join(","))?.to_string())
}

/// Normalize `"A"`, `"A-B"` or `"A to B"` to the device form.
pub(crate) fn vlan_range(text: &str) -> Result<String> {
    let bounds: Vec<&str> = if text.contains('-') {
        text.split('-').collect()
    } else {
        text.split(" to ").collect()
    };
    let parse = |s: &str| {
        s.trim()
            .parse::<u16>()
            .map_err(|_| Error::validation("vlan", format!("'{}' is not a VLAN range", text)))
            .and_then(|v| validate::vlan("vlan", v))
    };
    match bounds.as_slice() {
        [single] => Ok(parse(single)?.to_string()),
        [begin, end] => {
            let (begin, end) = (parse(begin)?, parse(end)?);
            if begin > end {
                return Err(Error::validation("vlan", format!("{} is above {}", begin, end)));
            }
            Ok(format!("{} to {}", begin, end))
        }
        _ => Err(Error::validation("vlan", format!("'{}' is not a VLAN range", text))),
    }
}

impl An6k17 {
    /// `show onu auto-discover 1/<slot>/<pon>` at config level.
    pub async fn auto_discover(&self, slot: u32, pon: u32) -> Result<Vec<AutoDiscover>> {
        let cmd = format!("show onu auto-discover 1/{}/{}", slot, pon);
        let output = self.query(Scope::Config, cmd).await?;
        Ok(extract::auto_discover(&output))
    }

    pub async fn pon_auto_discover(&self, slot: u32, pon: u32) -> Result<PonAutoDiscover> {
        let output = self
            .query(Scope::Pon { slot, pon }, "show onu auto-discover")
            .await?;
        extract::pon_auto_discover(&output)
    }

    /// `onu auto-discover <where> ...`, where `target` is `f/s/p` or `all`.
    pub async fn set_auto_discover(&self, target: &str, enable: bool, aging_time: u32) -> Result<()> {
        let aging_time = validate::aging_time(aging_time)?;
        let cmd = CommandLine::new("onu auto-discover")
            .arg(validate::name("target", target)?)
            .arg(bool_to_str(enable))
            .arg(aging_time);
        self.execute(Scope::Config, [cmd]).await
    }

    pub async fn set_pon_auto_discover(&self, slot: u32, pon: u32, enable: bool, aging_time: u32) -> Result<()> {
        let aging_time = validate::aging_time(aging_time)?;
        let cmd = CommandLine::new("onu auto-discover")
            .arg(bool_to_str(enable))
            .arg(aging_time);
        self.execute(Scope::Pon { slot, pon }, [cmd]).await
    }

    /// Set and read back the authentication mode of one PON.
    pub async fn set_auth_mode(&self, slot: u32, pon: u32, mode: AuthMode) -> Result<()> {
        let cmd = format!("port authentication-mode 1/{}/{} mode {}", slot, pon, mode);
        self.execute(Scope::Config, [cmd]).await?;
        let now = self.auth_mode(slot, pon).await?;
        if now != mode {
            return Err(Error::verification(
                "authentication mode",
                format!("1/{}/{} is {}, expected {}", slot, pon, now, mode),
            ));
        }
        Ok(())
    }

    /// Authentication mode of every PON.
    pub async fn auth_modes(&self) -> Result<IndexMap<(u32, u32), AuthMode>> {
        let output = self
            .query(Scope::Config, "show port authentication-mode all")
            .await?;
        Ok(extract::port_authentication_mode(&output))
    }

    pub async fn auth_mode(&self, slot: u32, pon: u32) -> Result<AuthMode> {
        let cmd = format!("show port authentication-mode select 1/{}/{}", slot, pon);
        let output = self.query(Scope::Config, cmd).await?;
        extract::port_authentication_mode(&output)
            .get(&(slot, pon))
            .copied()
            .ok_or_else(|| Error::not_found(format!("authentication mode of 1/{}/{}", slot, pon)))
    }

    pub async fn set_igmp_vlan(&self, vlan: u16) -> Result<()> {
        let vlan = validate::vlan("vlan", vlan)?;
        self.execute(Scope::Igmp, [CommandLine::new("igmp vlan").arg(vlan)])
            .await
    }

    pub async fn igmp_vlan(&self, vlan: u16) -> Result<Record> {
        let vlan = validate::vlan("vlan", vlan)?;
        let output = self
            .query(Scope::Igmp, CommandLine::new("show igmp vlan").arg(vlan))
            .await?;
        Ok(extract::igmp_vlan(&output))
    }

    /// Set the IGMP mode and confirm it through `show igmp mode`.
    pub async fn set_igmp_mode(&self, mode: IgmpMode) -> Result<()> {
        self.execute(Scope::Igmp, [CommandLine::new("igmp mode").arg(mode)])
            .await?;
        let info = self.igmp_mode().await?;
        match info.text("IGMP/MLD Mode") {
            Some(now) if now == mode.as_str() => Ok(()),
            Some(now) => Err(Error::verification(
                "igmp mode",
                format!("device reports {}, expected {}", now, mode),
            )),
            None => Err(Error::data_not_found("IGMP/MLD Mode")),
        }
    }

    pub async fn igmp_mode(&self) -> Result<Record> {
        let output = self.query(Scope::Igmp, "show igmp mode").await?;
        Ok(extract::igmp_mode(&output))
    }

    /// Add a VLAN range to uplink ports, or to every slot when `ports` is
    /// `None`. The device rejects a range that is already configured.
    pub async fn set_port_vlan(&self, vlan: &str, ports: Option<&UplinkPorts>) -> Result<()> {
        let range = vlan_range(vlan)?;
        let cmd = match ports {
            Some(p) => CommandLine::new("port vlan")
                .kw(&range)
                .arg(p.tag)
                .arg(format!("1/{}", p.slot))
                .kw(&port_list(&p.ports)?),
            None => CommandLine::new("port vlan").kw(&range).kw("allslot"),
        };
        self.execute(Scope::Config, [cmd]).await
    }

    /// `show port vlan 1/<slot>/<port>`.
    pub async fn port_vlan(&self, slot: u32, port: u32) -> Result<Vec<VlanRange>> {
        let output = self
            .query(Scope::Config, format!("show port vlan 1/{}/{}", slot, port))
            .await?;
        Ok(extract::port_vlan(&output))
    }

    /// Remove a VLAN range from uplink ports. A range that is not
    /// configured is not an error.
    pub async fn del_port_vlan(&self, vlan: &str, slot: u32, ports: &str) -> Result<()> {
        let cmd = CommandLine::new("no port vlan")
            .kw(&vlan_range(vlan)?)
            .arg(format!("1/{}", slot))
            .kw(&port_list(ports)?);
        match self.execute(Scope::Config, [cmd]).await {
            Err(e) if e.is_command_failure() => {
                debug!("port vlan {} not present on 1/{} {}: {}", vlan, slot, ports, e);
                Ok(())
            }
            other => other,
        }
    }
}
