use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Capability name that marks a device as heating-capable.
pub const TARGET_TEMPERATURE: &str = "target_temperature";

/// Temperature value meaning "no scheduled change" in a daypart.
pub const NO_CHANGE: i32 = -1;

/// Id of the synthetic root zone the raw tree is wrapped under.
pub const ROOT_ZONE: &str = "0";

/// Opaque zone identifier. The hub serializes ids as numbers or strings
/// depending on firmware version, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneId(#[serde(deserialize_with = "de_id")] pub String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn root() -> Self {
        Self(ROOT_ZONE.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ZONE
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque device identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId(#[serde(deserialize_with = "de_id")] pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// A node of the raw zone tree as returned by the zone query.
#[derive(Debug, Clone, Deserialize)]
pub struct RawZone {
    pub id: ZoneId,
    #[serde(default)]
    pub parent: Option<ZoneId>,
    #[serde(default)]
    pub index: i64,
    #[serde(default)]
    pub children: BTreeMap<String, RawZone>,
}

impl RawZone {
    /// Wrap a fetched tree under the synthetic root zone.
    pub fn rooted(tree: RawZone) -> Self {
        let mut children = BTreeMap::new();
        children.insert(tree.id.to_string(), tree);
        RawZone {
            id: ZoneId::root(),
            parent: None,
            index: 0,
            children,
        }
    }
}

/// The zone reference a device carries: its containing zone and that
/// zone's parent, which seeds the ancestor walk.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneRef {
    pub id: ZoneId,
    #[serde(default)]
    pub parent: Option<ZoneId>,
}

/// A device as returned by the device query. Capability payloads are kept
/// opaque; only the capability names matter here.
#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub zone: ZoneRef,
    #[serde(default)]
    pub capabilities: BTreeMap<String, serde_json::Value>,
}

impl Device {
    pub fn is_heating_capable(&self) -> bool {
        self.capabilities.contains_key(TARGET_TEMPERATURE)
    }
}

/// Weekday keys as used in the schedule configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    #[serde(rename = "su")]
    Su,
    #[serde(rename = "mo")]
    Mo,
    #[serde(rename = "tu")]
    Tu,
    #[serde(rename = "we")]
    We,
    #[serde(rename = "th")]
    Th,
    #[serde(rename = "fr")]
    Fr,
    #[serde(rename = "sa")]
    Sa,
}

impl Weekday {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Su => "su",
            Weekday::Mo => "mo",
            Weekday::Tu => "tu",
            Weekday::We => "we",
            Weekday::Th => "th",
            Weekday::Fr => "fr",
            Weekday::Sa => "sa",
        }
    }

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Sun => Weekday::Su,
            chrono::Weekday::Mon => Weekday::Mo,
            chrono::Weekday::Tue => Weekday::Tu,
            chrono::Weekday::Wed => Weekday::We,
            chrono::Weekday::Thu => Weekday::Th,
            chrono::Weekday::Fri => Weekday::Fr,
            chrono::Weekday::Sat => Weekday::Sa,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named time-of-day slot of a zone's day plan. A daypart without an
/// `hour` is unset and skipped during compilation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Daypart {
    #[serde(default)]
    pub hour: Option<u8>,
    #[serde(default)]
    pub minute: u8,
    #[serde(default = "no_change")]
    pub temperature: i32,
}

fn no_change() -> i32 {
    NO_CHANGE
}

/// Per-zone entry of the raw schedule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZonePlan {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub plan: BTreeMap<Weekday, BTreeMap<String, Daypart>>,
}

/// The persisted schedule configuration, exactly as the settings UI writes
/// it: `{token, updated, schedule}`. `updated` is a write marker used for
/// change detection between polling ticks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub updated: Option<i64>,
    #[serde(default)]
    pub schedule: BTreeMap<ZoneId, ZonePlan>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zone_id_accepts_numbers_and_strings() {
        let z: RawZone = serde_json::from_value(json!({"id": 2, "parent": 1})).unwrap();
        assert_eq!(z.id, ZoneId::new("2"));
        assert_eq!(z.parent, Some(ZoneId::new("1")));

        let z: RawZone = serde_json::from_value(json!({"id": "2", "parent": null})).unwrap();
        assert_eq!(z.id, ZoneId::new("2"));
        assert!(z.parent.is_none());
    }

    #[test]
    fn device_heating_capability() {
        let d: Device = serde_json::from_value(json!({
            "id": "D1",
            "zone": {"id": 2, "parent": 1},
            "capabilities": {"target_temperature": {}, "onoff": {}}
        }))
        .unwrap();
        assert!(d.is_heating_capable());

        let d: Device = serde_json::from_value(json!({
            "id": "D2",
            "zone": {"id": 2, "parent": 1},
            "capabilities": {"onoff": {}}
        }))
        .unwrap();
        assert!(!d.is_heating_capable());
    }

    #[test]
    fn config_round_trips_persisted_layout() {
        let raw = json!({
            "token": "secret",
            "updated": 1700000000000i64,
            "schedule": {
                "2": {
                    "enabled": true,
                    "plan": {
                        "mo": {
                            "morning": {"hour": 6, "minute": 0, "temperature": 21},
                            "night": {"temperature": -1}
                        }
                    }
                }
            }
        });
        let cfg: ScheduleConfig = serde_json::from_value(raw).unwrap();
        assert_eq!(cfg.updated, Some(1700000000000));
        let zone = cfg.schedule.get(&ZoneId::new("2")).unwrap();
        assert!(zone.enabled);
        let morning = &zone.plan[&Weekday::Mo]["morning"];
        assert_eq!(morning.hour, Some(6));
        assert_eq!(morning.temperature, 21);
        let night = &zone.plan[&Weekday::Mo]["night"];
        assert!(night.hour.is_none());
        assert_eq!(night.temperature, NO_CHANGE);
    }

    #[test]
    fn rooted_wraps_tree_under_synthetic_root() {
        let tree: RawZone = serde_json::from_value(json!({"id": 1, "parent": null})).unwrap();
        let root = RawZone::rooted(tree);
        assert!(root.id.is_root());
        assert!(root.children.contains_key("1"));
    }
}
