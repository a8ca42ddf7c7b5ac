//! Bandwidth profiles, ONU and PON rate limits.

use std::fmt;

use log::{debug, info};

use super::command::CommandLine;
use super::validate;
use super::{An6k17, Scope, field_u32};
use crate::batch::TaskGroup;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::extract::{self, PonBandwidth, Record};
use crate::types::OnuState;
use crate::value::{bool_to_str, coerce, Value, UNSET};

/// A bandwidth profile, by id or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileRef {
    Id(u32),
    Name(String),
}

impl ProfileRef {
    pub fn name(name: impl Into<String>) -> Self {
        ProfileRef::Name(name.into())
    }

    fn matches(&self, record: &Record) -> bool {
        match self {
            ProfileRef::Id(id) => field_u32(record, "Id") == Some(*id),
            ProfileRef::Name(name) => record["Name"] == coerce(name, None),
        }
    }
}

/// `id <n>` or `name <name>`, as the profile commands take it.
impl fmt::Display for ProfileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileRef::Id(id) => write!(f, "id {}", id),
            ProfileRef::Name(name) => write!(f, "name {}", name),
        }
    }
}

/// Rates of a bandwidth profile, in kbit/s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BandwidthLimits {
    pub us_cir: u32,
    pub us_pir: u32,
    pub us_fir: u32,
    pub ds_cir: u32,
    pub ds_pir: u32,
}

impl BandwidthLimits {
    fn matches(&self, record: &Record) -> bool {
        field_u32(record, "upMin") == Some(self.us_cir)
            && field_u32(record, "upMax") == Some(self.us_pir)
            && field_u32(record, "upFix") == Some(self.us_fir)
            && field_u32(record, "downMin") == Some(self.ds_cir)
            && field_u32(record, "downMax") == Some(self.ds_pir)
    }
}

/// Port policing of an ONU Ethernet port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortPolicing {
    pub us_enable: bool,
    pub us_cir: u32,
    pub us_cbs: u32,
    pub us_ebs: u32,
    pub ds_enable: bool,
    pub ds_cir: u32,
    pub ds_pir: u32,
}

/// Profile id on the wire: `None` unbinds and is sent as -1.
fn wire_profile(id: Option<u32>) -> i64 {
    id.map(i64::from).unwrap_or(-1)
}

/// What the device reports for a wire profile id.
fn reported_profile(id: Option<u32>) -> Value {
    Value::Int(id.map(i64::from).unwrap_or(UNSET))
}

impl An6k17 {
    /// `show bandwidth-profile all`.
    pub async fn bandwidth_profiles(&self) -> Result<Vec<Record>> {
        let output = self
            .query(Scope::Config, "show bandwidth-profile all")
            .await?;
        Ok(extract::bandwidth_profiles(&output))
    }

    pub async fn bandwidth_profile_id(&self, name: &str) -> Result<Option<u32>> {
        let profile = ProfileRef::name(name);
        Ok(self
            .bandwidth_profiles()
            .await?
            .iter()
            .find(|r| profile.matches(r))
            .and_then(|r| field_u32(r, "Id")))
    }

    /// True if the profile exists and, when `limits` is given, carries
    /// exactly those rates.
    pub async fn exists_bandwidth_profile(
        &self,
        profile: &ProfileRef,
        limits: Option<&BandwidthLimits>,
    ) -> Result<bool> {
        Ok(self
            .bandwidth_profiles()
            .await?
            .iter()
            .any(|r| profile.matches(r) && limits.is_none_or(|l| l.matches(r))))
    }

    /// Create a profile under a new name.
    pub async fn add_bandwidth_profile(&self, name: &str, limits: &BandwidthLimits) -> Result<()> {
        let name = validate::name("name", name)?;
        if self.bandwidth_profile_id(name).await?.is_some() {
            return Err(Error::validation(
                "name",
                format!("bandwidth profile {} already exists", name),
            ));
        }
        let cmd = CommandLine::new("bandwidth-profile add")
            .arg(name)
            .kv("upstream-pir", limits.us_pir)
            .kv("downstream-pir", limits.ds_pir)
            .kv("upstream-cir", limits.us_cir)
            .kv("downstream-cir", limits.ds_cir)
            .kv("upstream-fir", limits.us_fir);
        self.execute(Scope::Config, [cmd]).await?;
        self.verify_profile("bandwidth-profile add", &ProfileRef::name(name), limits)
            .await
    }

    pub async fn modify_bandwidth_profile(&self, profile: &ProfileRef, limits: &BandwidthLimits) -> Result<()> {
        let cmd = CommandLine::new("bandwidth-profile modify")
            .kw(&profile.to_string())
            .kw("upstream")
            .kv("cir", limits.us_cir)
            .kv("pir", limits.us_pir)
            .kv("fir", limits.us_fir)
            .kw("downstream")
            .kv("cir", limits.ds_cir)
            .kv("pir", limits.ds_pir);
        self.execute(Scope::Config, [cmd]).await?;
        self.verify_profile("bandwidth-profile modify", profile, limits)
            .await
    }

    async fn verify_profile(&self, operation: &str, profile: &ProfileRef, limits: &BandwidthLimits) -> Result<()> {
        if self.exists_bandwidth_profile(profile, Some(limits)).await? {
            Ok(())
        } else {
            Err(Error::verification(
                operation,
                format!("profile {} does not show {:?}", profile, limits),
            ))
        }
    }

    /// Delete a profile after moving every ONU that uses it back to
    /// profile 0.
    pub async fn del_bandwidth_profile(&self, profile: &ProfileRef) -> Result<()> {
        let id = match profile {
            ProfileRef::Id(id) => *id,
            ProfileRef::Name(name) => self
                .bandwidth_profile_id(name)
                .await?
                .ok_or_else(|| Error::not_found(format!("bandwidth profile {}", name)))?,
        };

        for onu in self.authorization().await? {
            let Some(sn) = onu.text("PhyId") else {
                continue;
            };
            if field_u32(&self.onu_bandwidth_profile(sn).await?, "prfId") == Some(id) {
                debug!("detaching {} from bandwidth profile {}", sn, id);
                self.clear_onu_bandwidth_profile(sn).await?;
            }
        }

        let cmd = CommandLine::new("bandwidth-profile delete").kw(&profile.to_string());
        self.execute(Scope::Config, [cmd]).await?;
        if self.exists_bandwidth_profile(profile, None).await? {
            return Err(Error::verification(
                "bandwidth-profile delete",
                format!("profile {} still listed", profile),
            ));
        }
        info!("deleted bandwidth profile {}", profile);
        Ok(())
    }

    /// Delete every bandwidth profile, a few at a time.
    pub async fn clear_bandwidth_profiles(&self) -> Result<()> {
        let ids: Vec<u32> = self
            .bandwidth_profiles()
            .await?
            .iter()
            .filter_map(|r| field_u32(r, "Id"))
            .collect();
        TaskGroup::default()
            .run(ids, |id| {
                let olt = self.clone();
                async move { olt.del_bandwidth_profile(&ProfileRef::Id(id)).await }
            })
            .await
            .into_result()
            .map(|_| ())
    }

    /// Attach an ONU to a profile and confirm the binding.
    pub async fn set_onu_bandwidth_profile(&self, sn: &str, profile: &ProfileRef) -> Result<()> {
        let id = match profile {
            ProfileRef::Id(id) => *id,
            ProfileRef::Name(name) => self
                .bandwidth_profile_id(name)
                .await?
                .ok_or_else(|| Error::not_found(format!("bandwidth profile {}", name)))?,
        };
        self.onu_service(sn, |onu| {
            let cmd = CommandLine::new("onu bandwidth-profile").arg(onu);
            Ok(match profile {
                ProfileRef::Id(id) => cmd.kv("profile-id", id),
                ProfileRef::Name(name) => cmd.kv("profile-name", validate::name("profile", name)?),
            })
        })
        .await?;

        let bound = self.onu_bandwidth_profile(sn).await?;
        if field_u32(&bound, "prfId") != Some(id) {
            return Err(Error::verification(
                "onu bandwidth-profile",
                format!("{} reports profile {}, expected {}", sn, bound["prfId"], id),
            ));
        }
        Ok(())
    }

    pub async fn clear_onu_bandwidth_profile(&self, sn: &str) -> Result<()> {
        self.set_onu_bandwidth_profile(sn, &ProfileRef::Id(0)).await
    }

    /// `show onu bandwidth`, with `prfId` shifted to the profile id the
    /// profile commands use.
    pub async fn onu_bandwidth_profile(&self, sn: &str) -> Result<Record> {
        let at = self.locate(sn).await?;
        let output = self
            .query(at.scope(), CommandLine::new("show onu bandwidth").arg(at.onu))
            .await?;
        let mut record = extract::onu_bandwidth(&output);
        if let Some(id) = record.int("prfId") {
            record.insert("prfId", Value::Int(id + 1));
        }
        Ok(record)
    }

    /// Set the ONU's own rate limits and read them back.
    pub async fn set_onu_bandwidth(&self, sn: &str, us_cir: u32, us_pir: u32, us_fir: u32, ds_pir: u32) -> Result<()> {
        self.onu_service(sn, |onu| {
            Ok(CommandLine::new("onu bandwidth")
                .arg(onu)
                .kv("upstream-pir", us_pir)
                .kv("downstream-pir", ds_pir)
                .kv("upstream-cir", us_cir)
                .kv("upstream-fir", us_fir))
        })
        .await?;

        let now = self.onu_bandwidth_profile(sn).await?;
        let applied = field_u32(&now, "upAssureBand") == Some(us_cir)
            && field_u32(&now, "upMaxband") == Some(us_pir)
            && field_u32(&now, "upFixband") == Some(us_fir)
            && field_u32(&now, "downMaxband") == Some(ds_pir);
        if !applied {
            return Err(Error::verification(
                "onu bandwidth",
                format!("{} reports {:?}", sn, now),
            ));
        }
        Ok(())
    }

    /// Set PON bandwidth; equal rates use `bandwidth all`.
    pub async fn set_pon_bandwidth(&self, slot: u32, pon: u32, up: u64, down: u64) -> Result<()> {
        let commands = if up == down {
            vec![format!("bandwidth all {}", up)]
        } else {
            vec![format!("bandwidth upstream {}", up), format!("bandwidth downstream {}", down)]
        };
        self.execute(Scope::Pon { slot, pon }, commands).await?;

        let now = self.pon_bandwidth(slot, pon).await?;
        if now != (PonBandwidth { up, down }) {
            return Err(Error::verification(
                "pon bandwidth",
                format!("1/{}/{} reports up {} down {}", slot, pon, now.up, now.down),
            ));
        }
        Ok(())
    }

    pub async fn pon_bandwidth(&self, slot: u32, pon: u32) -> Result<PonBandwidth> {
        let output = self.query(Scope::Pon { slot, pon }, "show bandwidth").await?;
        extract::pon_bandwidth(&output)
            .ok_or_else(|| Error::data_not_found(format!("bandwidth of 1/{}/{}", slot, pon)))
    }

    /// Bind upstream and downstream profiles to one port service.
    pub async fn set_onu_port_service_bandwidth(
        &self,
        sn: &str,
        eth: u32,
        index: u32,
        us_profile: u32,
        ds_profile: u32,
    ) -> Result<()> {
        self.onu_service(sn, |onu| {
            // "bandwith" is the device's spelling.
            Ok(CommandLine::new("onu port service-bandwith")
                .arg(onu)
                .kv("eth", validate::index("eth", eth)?)
                .kv("service", validate::index("service", index)?)
                .kv("upstream-profile", us_profile)
                .kv("downstream-profile", ds_profile))
        })
        .await
    }

    pub async fn set_onu_port_policy(&self, sn: &str, eth: u32, policing: &PortPolicing) -> Result<()> {
        self.onu_service(sn, |onu| {
            Ok(CommandLine::new("onu port policing")
                .arg(onu)
                .kv("eth", validate::index("eth", eth)?)
                .kv("upstream", bool_to_str(policing.us_enable))
                .kv("cir", policing.us_cir)
                .kv("cbs", policing.us_cbs)
                .kv("ebs", policing.us_ebs)
                .kv("downstream", bool_to_str(policing.ds_enable))
                .kv("cir", policing.ds_cir)
                .kv("pir", policing.ds_pir))
        })
        .await
    }

    /// Bind rate-limit profiles to a WAN connection. `None` unbinds a
    /// direction.
    pub async fn set_onu_layer3_rate_limit(
        &self,
        sn: &str,
        wan_index: u32,
        us_profile: Option<u32>,
        ds_profile: Option<u32>,
    ) -> Result<()> {
        let wan_index = validate::index("wan_index", wan_index)?;
        self.onu_service(sn, |onu| {
            Ok(CommandLine::new("onu layer3-ratelimit-profile")
                .arg(onu)
                .arg(wan_index)
                .kv("upstream-profile-id", wire_profile(us_profile))
                .kv("downstream-profile-id", wire_profile(ds_profile)))
        })
        .await?;

        let limits = self.onu_layer3_rate_limits(sn, None).await?;
        let Some(limit) = limits
            .iter()
            .find(|r| field_u32(r, "Wan index") == Some(wan_index))
        else {
            return Err(Error::verification(
                "layer3 rate limit",
                format!("WAN {} of {} not listed", wan_index, sn),
            ));
        };
        if limit["Up bandwidth profile id"] != reported_profile(us_profile)
            || limit["Down bandwidth profile id"] != reported_profile(ds_profile)
        {
            return Err(Error::verification(
                "layer3 rate limit",
                format!("WAN {} of {} reports {:?}", wan_index, sn, limit),
            ));
        }
        Ok(())
    }

    /// Layer-3 rate limits for one registration state, or both.
    pub async fn onu_layer3_rate_limits(&self, sn: &str, state: Option<OnuState>) -> Result<Vec<Record>> {
        let at = self.locate(sn).await?;
        let states = match state {
            Some(state) => vec![state],
            None => vec![OnuState::Offline, OnuState::Online],
        };
        let mut session = self.open(at.scope()).await?;
        let mut records = Vec::new();
        for state in states {
            let cmd = CommandLine::new("show onu layer3-ratelimit-profile")
                .arg(at.onu)
                .arg(state);
            let response = session.run(&cmd.to_string()).await?;
            records.extend(extract::layer3_rate_limits(&response.result));
        }
        session.disconnect().await?;
        Ok(records)
    }

    pub async fn del_onu_layer3_rate_limit(&self, sn: &str, wan_index: u32) -> Result<()> {
        self.set_onu_layer3_rate_limit(sn, wan_index, None, None)
            .await
    }
}
