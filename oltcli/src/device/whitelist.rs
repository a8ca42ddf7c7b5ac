//! ONU whitelists.
//!
//! The device keeps three lists: physical id, logical id and password. The
//! `+psw` modes share the list of their id mode and add a check code.

use log::{debug, info};

use super::command::CommandLine;
use super::{An6k17, Scope};
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::extract::{self, Record};
use crate::types::WhitelistMode;
use crate::value::{coerce, Value};

/// One mode per distinct list.
const LISTS: [WhitelistMode; 3] = [
    WhitelistMode::PhyId,
    WhitelistMode::LogId,
    WhitelistMode::Password,
];

/// Column of the config-view table that identifies an entry.
fn id_field(mode: WhitelistMode) -> &'static str {
    match mode {
        WhitelistMode::PhyId | WhitelistMode::PhyIdPsw => "Phy-ID",
        WhitelistMode::LogId | WhitelistMode::LogIdPsw => "Logic-Id",
        WhitelistMode::Password => "Phy-Pwd",
    }
}

/// `no whitelist <kind> <slot> <pon> <id>` for a config-view entry.
fn removal(mode: WhitelistMode, entry: &Record) -> CommandLine {
    CommandLine::new("no whitelist")
        .arg(mode.query_str())
        .arg(&entry["Slot"])
        .arg(&entry["Pon"])
        .arg(&entry[id_field(mode)])
}

impl An6k17 {
    /// `show whitelist` at config level.
    pub async fn whitelist(&self, mode: WhitelistMode) -> Result<Vec<Record>> {
        let cmd = CommandLine::new("show whitelist").arg(mode.query_str());
        let output = self.query(Scope::Config, cmd).await?;
        Ok(extract::whitelist(&output))
    }

    /// `show whitelist` inside one PON. Field names are the upper-case ones
    /// of the PON view (`PHYID`, `LOGICId`, `PHYPWD`).
    pub async fn pon_whitelist(&self, slot: u32, pon: u32, mode: WhitelistMode) -> Result<Vec<Record>> {
        let cmd = CommandLine::new("show whitelist").arg(mode.query_str());
        let output = self.query(Scope::Pon { slot, pon }, cmd).await?;
        Ok(extract::whitelist(&output))
    }

    /// True if `id` (a physical id, logical id or password, depending on
    /// `mode`) is on the list.
    pub async fn is_in_whitelist(&self, mode: WhitelistMode, id: &str) -> Result<bool> {
        let wanted = coerce(id, None);
        Ok(contains(&self.whitelist(mode).await?, mode, &wanted))
    }

    /// True if `id` is on any list.
    pub async fn is_onu_in_whitelist(&self, id: &str) -> Result<bool> {
        for mode in LISTS {
            if self.is_in_whitelist(mode, id).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whitelist a discovered ONU.
    ///
    /// The identifiers and check codes are taken from `show discovery`, so
    /// the ONU must currently be reported there. Without `onu_id` the
    /// device picks the next free id.
    pub async fn add_whitelist(&self, mode: WhitelistMode, sn: &str, onu_id: Option<u32>) -> Result<()> {
        let discovered = self.discovery().await?;
        let details = discovered
            .iter()
            .find(|r| r.text("PhyId") == Some(sn))
            .ok_or_else(|| Error::not_found(format!("discovered ONU {}", sn)))?;

        let (cmd, id) = match mode {
            WhitelistMode::PhyId => (CommandLine::new("whitelist add phy-id").arg(&details["PhyId"]), "PhyId"),
            WhitelistMode::PhyIdPsw => (
                CommandLine::new("whitelist add phy-id")
                    .arg(&details["PhyId"])
                    .kv("checkcode", &details["PhyPwd"]),
                "PhyId",
            ),
            WhitelistMode::LogId => (
                CommandLine::new("whitelist add logic-id").arg(&details["LogicId"]),
                "LogicId",
            ),
            WhitelistMode::LogIdPsw => (
                CommandLine::new("whitelist add logic-id")
                    .arg(&details["LogicId"])
                    .kv("checkcode", &details["LogicPwd"]),
                "LogicId",
            ),
            WhitelistMode::Password => (
                CommandLine::new("whitelist add password").arg(&details["PhyPwd"]),
                "PhyPwd",
            ),
        };
        self.execute(Scope::Config, [cmd.opt("onuid", onu_id)]).await?;

        let id = details[id].to_string();
        if !self.is_in_whitelist(mode, &id).await? {
            return Err(Error::verification(
                "whitelist add",
                format!("{} not listed under {}", id, mode.query_str()),
            ));
        }
        info!("whitelisted {} by {}", sn, mode);
        Ok(())
    }

    /// Remove `id` from one list. Absent entries are not an error.
    pub async fn del_whitelist(&self, mode: WhitelistMode, id: &str) -> Result<()> {
        let wanted = coerce(id, None);
        let entries = self.whitelist(mode).await?;
        let matching: Vec<CommandLine> = entries
            .iter()
            .filter(|e| e[id_field(mode)] == wanted)
            .map(|e| removal(mode, e))
            .collect();
        if matching.is_empty() {
            debug!("{} is not in the {} whitelist", id, mode.query_str());
            return Ok(());
        }
        self.execute(Scope::Config, matching).await?;

        if self.is_in_whitelist(mode, id).await? {
            return Err(Error::verification(
                "whitelist delete",
                format!("{} still listed under {}", id, mode.query_str()),
            ));
        }
        Ok(())
    }

    /// Remove `id` from every list.
    pub async fn del_from_whitelist(&self, id: &str) -> Result<()> {
        for mode in LISTS {
            self.del_whitelist(mode, id).await?;
        }
        Ok(())
    }

    /// Empty all three lists on every PON.
    pub async fn clear_whitelist(&self) -> Result<()> {
        let mut removals = Vec::new();
        for mode in LISTS {
            removals.extend(self.whitelist(mode).await?.iter().map(|e| removal(mode, e)));
        }
        if !removals.is_empty() {
            let mut session = self.open(Scope::Config).await?;
            for cmd in &removals {
                session.run(&cmd.to_string()).await?;
            }
            session.disconnect().await?;
        }

        for mode in LISTS {
            let left = self.whitelist(mode).await?.len();
            if left != 0 {
                return Err(Error::verification(
                    "whitelist clear",
                    format!("{} entries left under {}", left, mode.query_str()),
                ));
            }
        }
        Ok(())
    }

    /// `no whitelist all` on one PON.
    pub async fn clear_pon_whitelist(&self, slot: u32, pon: u32) -> Result<()> {
        self.execute(Scope::Pon { slot, pon }, ["no whitelist all"]).await?;
        for mode in LISTS {
            let left = self.pon_whitelist(slot, pon, mode).await?.len();
            if left != 0 {
                return Err(Error::verification(
                    "pon whitelist clear",
                    format!("{} entries left under {} on 1/{}/{}", left, mode.query_str(), slot, pon),
                ));
            }
        }
        Ok(())
    }
}

fn contains(entries: &[Record], mode: WhitelistMode, wanted: &Value) -> bool {
    entries.iter().any(|e| &e[id_field(mode)] == wanted)
}
