//! ONU QinQ classification profiles and OLT QinQ domains.
//!
//! A domain holds numbered services. Each service has upstream and
//! downstream stream rules that pick traffic, and VLAN layers that say
//! what to do with the tags. Domains are bound to PON ports.

use std::fmt;

use log::{debug, info, warn};

use super::command::CommandLine;
use super::validate;
use super::{An6k17, Scope};
use crate::batch::TaskGroup;
use crate::error::{Error, Result};
use crate::extract::{
    self, ClassificationProfile, ClassificationRule, DomainService, QinqDomain, StreamRule, VlanLayer,
};
use crate::types::{Direction, QinqAction, QinqServiceType};
use crate::value::Value;

/// An OLT QinQ domain, by name or by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainRef {
    Name(String),
    Index(u32),
}

impl fmt::Display for DomainRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainRef::Name(name) => f.write_str(name),
            DomainRef::Index(index) => write!(f, "index {}", index),
        }
    }
}

/// A stream rule to configure: OLT field id, value and condition code.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRuleSpec {
    pub field: u8,
    /// Compared with what the device prints, decoded per field id.
    pub value: Value,
    pub operator: u8,
}

impl StreamRuleSpec {
    fn matches(&self, rule: &StreamRule) -> bool {
        self.field == rule.field && self.value == rule.value && self.operator == rule.operator
    }
}

/// A VLAN layer to configure. `None` is sent as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlanLayerSpec {
    pub layer: u8,
    pub user_vlan: Option<u16>,
    pub user_cos: Option<u8>,
    pub action: QinqAction,
    pub tpid: u16,
    pub cos: Option<u8>,
    pub vlan: Option<u16>,
}

/// `Int`, or `Null` which is also how the command line spells "unset".
fn or_null<T: Into<i64>>(v: Option<T>) -> Value {
    v.map(|v| Value::Int(v.into())).unwrap_or(Value::Null)
}

impl VlanLayerSpec {
    fn append(&self, cmd: CommandLine) -> CommandLine {
        cmd.kv("vlan", self.layer)
            .kv("user-vlanid", or_null(self.user_vlan))
            .kv("user-cos", or_null(self.user_cos))
            .arg(self.action)
            .kv("tpid", self.tpid)
            .kv("cos", or_null(self.cos))
            .kv("vlanid", or_null(self.vlan))
    }

    fn matches(&self, layer: &VlanLayer) -> bool {
        layer.layer == i64::from(self.layer)
            && layer.old_vlan == or_null(self.user_vlan)
            && layer.old_cos == or_null(self.user_cos)
            && layer.action == self.action
            && layer.tpid == Value::Int(i64::from(self.tpid))
            && layer.cos == or_null(self.cos)
            && layer.new_vlan == or_null(self.vlan)
    }
}

fn service(domain: &QinqDomain, index: u32) -> Option<&DomainService> {
    domain.services.iter().find(|s| s.no == i64::from(index))
}

impl An6k17 {
    // ONU classification profiles

    /// Create a classification profile. An existing one of the same name
    /// is overwritten.
    pub async fn add_onu_qinq_classification_profile(&self, name: &str, rules: &[ClassificationRule]) -> Result<()> {
        if self.exists_onu_qinq_classification_profile(name).await? {
            warn!("onuqinq-classification-profile {} exists and will be overwritten", name);
        }
        self.write_classification_profile("add", name, rules).await
    }

    pub async fn modify_onu_qinq_classification_profile(&self, name: &str, rules: &[ClassificationRule]) -> Result<()> {
        if !self.exists_onu_qinq_classification_profile(name).await? {
            return Err(Error::not_found(format!("onuqinq-classification-profile {}", name)));
        }
        self.write_classification_profile("modify", name, rules).await
    }

    async fn write_classification_profile(&self, op: &str, name: &str, rules: &[ClassificationRule]) -> Result<()> {
        let name = validate::name("name", name)?;
        let mut cmd = CommandLine::new("onuqinq-classification-profile").kw(op).arg(name);
        for rule in rules {
            cmd = cmd.arg(rule.field.code()).arg(&rule.value).arg(rule.operator);
        }
        self.execute(Scope::Config, [cmd]).await?;

        if !self.exists_onu_qinq_classification_profile(name).await? {
            return Err(Error::verification(
                "onuqinq-classification-profile",
                format!("{} not listed after {}", name, op),
            ));
        }
        Ok(())
    }

    /// One profile by name, or all of them.
    pub async fn onu_qinq_classification_profiles(&self, name: Option<&str>) -> Result<Vec<ClassificationProfile>> {
        let cmd = match name {
            Some(name) => CommandLine::new("show onuqinq-classification-profile").kv("name", name),
            None => CommandLine::new("show onuqinq-classification-profile all"),
        };
        let output = self.query(Scope::Config, cmd).await?;
        Ok(extract::onu_qinq_classification_profiles(&output))
    }

    pub async fn exists_onu_qinq_classification_profile(&self, name: &str) -> Result<bool> {
        Ok(self
            .onu_qinq_classification_profiles(None)
            .await?
            .iter()
            .any(|p| p.name == name))
    }

    pub async fn del_onu_qinq_classification_profile(&self, name: &str) -> Result<()> {
        if !self.exists_onu_qinq_classification_profile(name).await? {
            return Ok(());
        }
        let cmd = CommandLine::new("onuqinq-classification-profile delete").arg(name);
        self.execute(Scope::Config, [cmd]).await?;
        if self.exists_onu_qinq_classification_profile(name).await? {
            return Err(Error::verification(
                "onuqinq-classification-profile delete",
                format!("{} still listed", name),
            ));
        }
        Ok(())
    }

    // OLT domains

    pub async fn add_olt_qinq_domain(&self, name: &str) -> Result<()> {
        let name = validate::name("name", name)?;
        self.execute(Scope::Config, [CommandLine::new("oltqinq-domain add").arg(name)])
            .await?;
        if !self.exists_olt_qinq_domain(name).await? {
            return Err(Error::verification("oltqinq-domain add", format!("{} not listed", name)));
        }
        Ok(())
    }

    /// `show oltqinq-domain`. A domain the device does not know is `None`.
    pub async fn olt_qinq_domain(&self, domain: &DomainRef) -> Result<Option<QinqDomain>> {
        let cmd = CommandLine::new("show oltqinq-domain").kw(&domain.to_string());
        match self.query(Scope::Config, cmd).await {
            Ok(output) => Ok(extract::olt_qinq_domain(&output)),
            Err(e) if e.is_command_failure() => {
                debug!("oltqinq-domain {} not shown: {}", domain, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn exists_olt_qinq_domain(&self, name: &str) -> Result<bool> {
        Ok(self
            .olt_qinq_domain(&DomainRef::Name(name.to_string()))
            .await?
            .is_some())
    }

    async fn existing_domain(&self, name: &str) -> Result<QinqDomain> {
        self.olt_qinq_domain(&DomainRef::Name(name.to_string()))
            .await?
            .ok_or_else(|| Error::not_found(format!("oltqinq-domain {}", name)))
    }

    pub async fn set_olt_qinq_domain_service_count(&self, name: &str, count: u32) -> Result<()> {
        let cmd = CommandLine::new("oltqinq-domain modify")
            .arg(name)
            .kv("service-count", count);
        self.execute(Scope::Config, [cmd]).await?;

        let domain = self.existing_domain(name).await?;
        if domain.services.len() != count as usize {
            return Err(Error::verification(
                "oltqinq-domain service-count",
                format!("{} has {} services, expected {}", name, domain.services.len(), count),
            ));
        }
        Ok(())
    }

    pub async fn set_olt_qinq_domain_service_type(
        &self,
        name: &str,
        index: u32,
        service_type: QinqServiceType,
    ) -> Result<()> {
        let domain = self.existing_domain(name).await?;
        let index = validate::index("service", index)?;
        if i64::from(index) > domain.count {
            return Err(Error::validation(
                "service",
                format!("{} has only {} services", name, domain.count),
            ));
        }
        let cmd = CommandLine::new("oltqinq-domain modify")
            .arg(name)
            .kv("service", index)
            .kv("type", service_type);
        self.execute(Scope::Config, [cmd]).await?;

        let domain = self.existing_domain(name).await?;
        match service(&domain, index) {
            Some(s) if s.service_type == service_type => Ok(()),
            _ => Err(Error::verification(
                "oltqinq-domain service type",
                format!("service {} of {} is not {}", index, name, service_type),
            )),
        }
    }

    pub async fn del_olt_qinq_domain(&self, name: &str) -> Result<()> {
        if !self.exists_olt_qinq_domain(name).await? {
            return Ok(());
        }
        self.execute(Scope::Config, [CommandLine::new("oltqinq-domain delete").arg(name)])
            .await?;
        if self.exists_olt_qinq_domain(name).await? {
            return Err(Error::verification(
                "oltqinq-domain delete",
                format!("{} still listed", name),
            ));
        }
        info!("deleted oltqinq-domain {}", name);
        Ok(())
    }

    /// Set the stream rules of one direction of a domain service.
    pub async fn set_olt_qinq_domain_stream_rules(
        &self,
        name: &str,
        index: u32,
        direction: Direction,
        rules: &[StreamRuleSpec],
    ) -> Result<()> {
        let mut cmd = CommandLine::new("oltqinq-domain")
            .arg(name)
            .kv("service", index)
            .kv("classification", direction);
        for rule in rules {
            cmd = cmd
                .kv("field-id", rule.field)
                .kv("value", &rule.value)
                .kv("condition", rule.operator);
        }
        self.execute(Scope::Config, [cmd]).await?;

        let domain = self.existing_domain(name).await?;
        let listed = service(&domain, index).map(|s| s.rules(direction)).unwrap_or_default();
        let applied = listed.len() >= rules.len() && rules.iter().zip(listed).all(|(r, l)| r.matches(l));
        if !applied {
            return Err(Error::verification(
                "oltqinq-domain classification",
                format!("service {} of {} shows {:?}", index, name, listed),
            ));
        }
        Ok(())
    }

    /// Set the VLAN layers of a domain service.
    pub async fn set_olt_qinq_domain_stream_vlan(&self, name: &str, index: u32, layers: &[VlanLayerSpec]) -> Result<()> {
        let mut cmd = CommandLine::new("oltqinq-domain").arg(name).kv("service", index);
        for layer in layers {
            cmd = layer.append(cmd);
        }
        self.execute(Scope::Config, [cmd]).await?;

        let domain = self.existing_domain(name).await?;
        let listed = service(&domain, index).map(|s| s.vlan.as_slice()).unwrap_or_default();
        let applied = listed.len() >= layers.len() && layers.iter().zip(listed).all(|(s, l)| s.matches(l));
        if !applied {
            return Err(Error::verification(
                "oltqinq-domain vlan",
                format!("service {} of {} shows {:?}", index, name, listed),
            ));
        }
        Ok(())
    }

    /// Bind a domain to a PON port.
    pub async fn bind_olt_qinq_domain(&self, slot: u32, pon: u32, name: &str) -> Result<()> {
        self.execute(Scope::Pon { slot, pon }, [CommandLine::new("oltqinq-domain").arg(name)])
            .await
    }

    /// Unbind a domain from a PON port, if it is bound there.
    pub async fn unbind_olt_qinq_domain(&self, slot: u32, pon: u32, name: &str) -> Result<()> {
        if !self.is_olt_qinq_domain_bound(slot, pon, name).await? {
            return Ok(());
        }
        self.execute(Scope::Pon { slot, pon }, [CommandLine::new("no oltqinq-domain").arg(name)])
            .await
    }

    /// True if `name` is bound to this PON. A failed query counts as not
    /// bound.
    pub async fn is_olt_qinq_domain_bound(&self, slot: u32, pon: u32, name: &str) -> Result<bool> {
        let cmd = CommandLine::new("show oltqinq-domain bound-info").arg(name);
        match self.query(Scope::Pon { slot, pon }, cmd).await {
            Ok(output) => Ok(extract::qinq_bound_info(&output) == Some((slot, pon))),
            Err(e) if e.is_command_failure() => {
                debug!("bound-info of {} failed: {}", name, e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete the domains at `indexes`. Indexes with no domain are skipped.
    pub async fn clear_olt_qinq_domains(&self, indexes: impl IntoIterator<Item = u32>) -> Result<()> {
        TaskGroup::default()
            .run(indexes, |index| {
                let olt = self.clone();
                async move {
                    match olt.olt_qinq_domain(&DomainRef::Index(index)).await? {
                        Some(domain) => olt.del_olt_qinq_domain(&domain.name).await,
                        None => {
                            debug!("no oltqinq-domain at index {}", index);
                            Ok(())
                        }
                    }
                }
            })
            .await
            .into_result()
            .map(|_| ())
    }
}
