//! Service VLANs.

use log::info;

use super::command::CommandLine;
use super::port::vlan_range;
use super::validate;
use super::{An6k17, Scope};
use crate::batch::TaskGroup;
use crate::error::{Error, Result};
use crate::extract::{self, Record};
use crate::types::ServiceVlanType;
use crate::value::coerce;

/// VLAN numbers of a range however it is written: `100`, `100-400`,
/// `100 to 400` or `100 ~ 400`.
fn range_bounds(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .collect()
}

fn matches(record: &Record, name: &str, range: Option<&str>, vlan_type: Option<ServiceVlanType>) -> bool {
    if record["name"] != coerce(name, None) {
        return false;
    }
    if let Some(range) = range {
        let listed = record["vlan range"].to_string();
        if range_bounds(range) != range_bounds(&listed) {
            return false;
        }
    }
    vlan_type.is_none_or(|t| record.text("type") == Some(t.as_str()))
}

impl An6k17 {
    /// Create or redefine a service VLAN over `range` (`"A"` or `"A-B"`).
    pub async fn set_service_vlan(&self, name: &str, range: &str, vlan_type: ServiceVlanType) -> Result<()> {
        let name = validate::name("name", name)?;
        let cmd = CommandLine::new("service-vlan")
            .arg(name)
            .kw(&vlan_range(range)?)
            .kv("type", vlan_type);
        self.execute(Scope::Config, [cmd]).await?;

        if !self.exists_service_vlan(name, Some(range), Some(vlan_type)).await? {
            return Err(Error::verification(
                "service-vlan",
                format!("{} {} {} not listed", name, range, vlan_type),
            ));
        }
        Ok(())
    }

    /// `show service-vlan`.
    pub async fn service_vlans(&self) -> Result<Vec<Record>> {
        let output = self.query(Scope::Config, "show service-vlan").await?;
        Ok(extract::service_vlans(&output))
    }

    /// True if a service VLAN called `name` exists, and matches `range` and
    /// `vlan_type` when those are given.
    pub async fn exists_service_vlan(
        &self,
        name: &str,
        range: Option<&str>,
        vlan_type: Option<ServiceVlanType>,
    ) -> Result<bool> {
        Ok(self
            .service_vlans()
            .await?
            .iter()
            .any(|r| matches(r, name, range, vlan_type)))
    }

    pub async fn del_service_vlan(&self, name: &str) -> Result<()> {
        if !self.exists_service_vlan(name, None, None).await? {
            return Ok(());
        }
        self.execute(Scope::Config, [CommandLine::new("no service-vlan").arg(name)])
            .await?;
        if self.exists_service_vlan(name, None, None).await? {
            return Err(Error::verification(
                "no service-vlan",
                format!("{} still listed", name),
            ));
        }
        info!("deleted service vlan {}", name);
        Ok(())
    }

    pub async fn clear_service_vlans(&self) -> Result<()> {
        let names: Vec<String> = self
            .service_vlans()
            .await?
            .iter()
            .map(|r| r["name"].to_string())
            .collect();
        TaskGroup::default()
            .run(names, |name| {
                let olt = self.clone();
                async move { olt.del_service_vlan(&name).await }
            })
            .await
            .into_result()
            .map(|_| ())
    }
}
