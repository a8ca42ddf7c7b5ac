//! Device inventory records.
//!
//! A [`DeviceInfo`] is everything needed to reach one OLT: address,
//! credentials and model. An [`Inventory`] is a JSON array of them.
//!
//! ```
//! use oltcli::inventory::Inventory;
//!
//! let inventory = Inventory::from_json(r#"[
//!     {"host": "10.0.0.1", "username": "admin", "password": "secret"},
//!     {"host": "10.0.0.1", "username": "admin", "password": "secret"}
//! ]"#).unwrap();
//! assert_eq!(inventory.len(), 1);
//! assert_eq!(inventory.devices()[0].port, 23);
//! ```

use std::collections::HashSet;

use log::warn;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use crate::error::{DriverError, Result};
use crate::platform::vendors::fiberhome;

fn default_port() -> u16 {
    23
}

fn default_model() -> String {
    fiberhome::MODEL.to_string()
}

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

/// Address, credentials and model of one OLT.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceInfo {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    #[serde(deserialize_with = "secret")]
    pub password: SecretString,
    #[serde(default = "default_model")]
    pub model: String,
}

impl DeviceInfo {
    /// A device on the default port with the default model.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            username: username.into(),
            password: SecretString::from(password.into()),
            model: default_model(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn identity(&self) -> (String, u16, String, String, String) {
        (
            self.host.clone(),
            self.port,
            self.username.clone(),
            self.password.expose_secret().to_string(),
            self.model.clone(),
        )
    }
}

/// A deduplicated list of devices.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    devices: Vec<DeviceInfo>,
}

impl Inventory {
    /// Parse a JSON array of device records.
    ///
    /// Rows identical in every field are kept once, in first-seen order.
    pub fn from_json(json: &str) -> Result<Self> {
        let rows: Vec<DeviceInfo> =
            serde_json::from_str(json).map_err(|e| DriverError::InvalidConfig {
                message: format!("invalid inventory: {}", e),
            })?;
        Ok(rows.into_iter().collect())
    }

    pub fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    /// First device with the given host.
    pub fn find(&self, host: &str) -> Option<&DeviceInfo> {
        self.devices.iter().find(|d| d.host == host)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DeviceInfo> {
        self.devices.iter()
    }
}

impl FromIterator<DeviceInfo> for Inventory {
    fn from_iter<T: IntoIterator<Item = DeviceInfo>>(iter: T) -> Self {
        let mut seen = HashSet::new();
        let mut devices = Vec::new();
        for device in iter {
            if seen.insert(device.identity()) {
                devices.push(device);
            } else {
                warn!("dropping duplicate inventory row for {}:{}", device.host, device.port);
            }
        }
        Self { devices }
    }
}

impl IntoIterator for Inventory {
    type Item = DeviceInfo;
    type IntoIter = std::vec::IntoIter<DeviceInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.into_iter()
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a DeviceInfo;
    type IntoIter = std::slice::Iter<'a, DeviceInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}
