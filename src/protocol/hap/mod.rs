//! Transport-level model of the HAP accessory tree
//!
//! Accessories are fetched as JSON from `/accessories` and carry services,
//! which carry characteristics. Type identifiers arrive in several spellings
//! (full UUID, zero-padded hex, short hex); comparisons go through the
//! canonical short form.

mod consts;

#[cfg(test)]
mod tests;

pub use consts::{characteristic_name, characteristic_types, service_name, service_types};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A HAP service or characteristic type identifier.
///
/// Stored as received; [`HapType::to_short`] strips any `-suffix` and
/// leading zeros for comparison against the known type constants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HapType(pub String);

impl HapType {
    /// Canonical short form: everything after the first `-` dropped,
    /// leading zeros stripped. An all-zero identifier is returned as is.
    #[must_use]
    pub fn to_short(&self) -> HapType {
        let s = self.0.split('-').next().unwrap_or(&self.0);
        match s.find(|c| c != '0') {
            Some(i) => HapType(s[i..].to_string()),
            None => self.clone(),
        }
    }

    /// Compare against another identifier in short form
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.to_short().0 == HapType(other.to_string()).to_short().0
    }
}

impl std::fmt::Display for HapType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let short = self.to_short();
        match service_name(&short.0).or_else(|| characteristic_name(&short.0)) {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "{}", self.0),
        }
    }
}

impl From<&str> for HapType {
    fn from(s: &str) -> Self {
        HapType(s.to_string())
    }
}

/// Reply shape of `GET /accessories`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessoryList {
    #[serde(default)]
    pub accessories: Vec<Accessory>,
}

/// One physical accessory and its service tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Accessory {
    pub aid: u64,
    #[serde(default)]
    pub services: Vec<Service>,
}

impl Accessory {
    /// The mandatory `AccessoryInformation` service, if present
    #[must_use]
    pub fn accessory_info_service(&self) -> Option<&Service> {
        self.service(service_types::ACCESSORY_INFO)
    }

    /// First service matching the given type (short form)
    #[must_use]
    pub fn service(&self, service_type: &str) -> Option<&Service> {
        self.services
            .iter()
            .find(|s| s.service_type.matches(service_type))
    }
}

/// A functional unit grouping characteristics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub iid: u64,
    #[serde(rename = "type")]
    pub service_type: HapType,
    #[serde(default)]
    pub characteristics: Vec<Characteristic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked: Option<Vec<u64>>,
}

impl Service {
    /// First characteristic matching the given type (short form)
    #[must_use]
    pub fn characteristic(&self, characteristic_type: &str) -> Option<&Characteristic> {
        self.characteristics
            .iter()
            .find(|c| c.characteristic_type.matches(characteristic_type))
    }
}

/// A typed, permissioned value on a service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Characteristic {
    // absent inside /accessories replies, populated in /characteristics ones
    #[serde(default)]
    pub aid: u64,
    pub iid: u64,
    #[serde(rename = "type", default = "unknown_type")]
    pub characteristic_type: HapType,
    #[serde(default)]
    pub value: Value,
    #[serde(rename = "perms", default)]
    pub perms: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(rename = "ev", skip_serializing_if = "Option::is_none")]
    pub events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(rename = "minValue", skip_serializing_if = "Option::is_none")]
    pub min_value: Option<Value>,
    #[serde(rename = "maxValue", skip_serializing_if = "Option::is_none")]
    pub max_value: Option<Value>,
    #[serde(rename = "minStep", skip_serializing_if = "Option::is_none")]
    pub min_step: Option<Value>,
    #[serde(rename = "maxLen", skip_serializing_if = "Option::is_none")]
    pub max_len: Option<i64>,
    #[serde(rename = "valid-values", skip_serializing_if = "Option::is_none")]
    pub valid_values: Option<Vec<i64>>,
    #[serde(rename = "valid-values-range", skip_serializing_if = "Option::is_none")]
    pub valid_range: Option<Vec<i64>>,
}

fn unknown_type() -> HapType {
    HapType(String::new())
}

impl Characteristic {
    /// Whether the characteristic advertises event notifications (`ev` perm)
    #[must_use]
    pub fn supports_events(&self) -> bool {
        self.perms.iter().any(|p| p == "ev")
    }
}

/// One entry of a `PUT /characteristics` body: a value write or an event
/// subscription toggle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacteristicWrite {
    pub aid: u64,
    pub iid: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(rename = "ev", skip_serializing_if = "Option::is_none")]
    pub events: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<bool>,
    #[serde(rename = "r", skip_serializing_if = "Option::is_none")]
    pub response: Option<bool>,
}

impl CharacteristicWrite {
    /// A plain value write
    #[must_use]
    pub fn value(aid: u64, iid: u64, value: Value) -> Self {
        Self {
            aid,
            iid,
            value: Some(value),
            status: None,
            events: None,
            remote: None,
            response: None,
        }
    }

    /// An event subscription toggle
    #[must_use]
    pub fn events(aid: u64, iid: u64, enabled: bool) -> Self {
        Self {
            aid,
            iid,
            value: None,
            status: None,
            events: Some(enabled),
            remote: None,
            response: None,
        }
    }
}

/// Body wrapper shared by characteristic reads, writes and event frames
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacteristicsPayload<T> {
    #[serde(default)]
    pub characteristics: Vec<T>,
}

impl<T> CharacteristicsPayload<T> {
    /// Wrap a list of entries
    #[must_use]
    pub fn new(characteristics: Vec<T>) -> Self {
        Self { characteristics }
    }
}

/// Sort the tree for stable lookups: accessories by aid, services and
/// characteristics by type.
pub fn sort_tree(accessories: &mut [Accessory]) {
    accessories.sort_by_key(|a| a.aid);
    for accessory in accessories {
        accessory
            .services
            .sort_by(|a, b| a.service_type.0.cmp(&b.service_type.0));
        for service in &mut accessory.services {
            service
                .characteristics
                .sort_by(|a, b| a.characteristic_type.0.cmp(&b.characteristic_type.0));
        }
    }
}
