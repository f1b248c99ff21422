use std::collections::BTreeMap;

use crate::index::HeatingIndex;
use crate::tree::ZoneNode;
use crate::types::{DeviceId, ScheduleConfig, Weekday};

type MinuteSlots = BTreeMap<u8, i32>;
type HourSlots = BTreeMap<u8, MinuteSlots>;
type DeviceSlots = BTreeMap<DeviceId, HourSlots>;

/// The compiled weekly schedule: weekday -> device -> hour -> minute ->
/// target temperature. Built fresh on every compilation and treated as an
/// immutable snapshot afterwards. Holds only positive temperatures and no
/// empty intermediate branches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleTable {
    days: BTreeMap<Weekday, DeviceSlots>,
}

impl ScheduleTable {
    /// Devices scheduled at exactly this day/hour/minute.
    pub fn at(&self, day: Weekday, hour: u8, minute: u8) -> Vec<(&DeviceId, i32)> {
        let Some(devices) = self.days.get(&day) else {
            return Vec::new();
        };
        devices
            .iter()
            .filter_map(|(device, hours)| {
                let temperature = hours.get(&hour)?.get(&minute)?;
                Some((device, *temperature))
            })
            .collect()
    }

    pub fn temperature(
        &self,
        day: Weekday,
        device: &DeviceId,
        hour: u8,
        minute: u8,
    ) -> Option<i32> {
        self.days.get(&day)?.get(device)?.get(&hour)?.get(&minute).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Count of (day, device, hour, minute) entries, mostly for logging.
    pub fn len(&self) -> usize {
        self.days
            .values()
            .flat_map(|devices| devices.values())
            .flat_map(|hours| hours.values())
            .map(|minutes| minutes.len())
            .sum()
    }

    fn prune_empty(&mut self) {
        for devices in self.days.values_mut() {
            for hours in devices.values_mut() {
                hours.retain(|_, minutes| !minutes.is_empty());
            }
            devices.retain(|_, hours| !hours.is_empty());
        }
        self.days.retain(|_, devices| !devices.is_empty());
    }

    #[cfg(test)]
    fn days(&self) -> &BTreeMap<Weekday, DeviceSlots> {
        &self.days
    }
}

/// Expand the per-zone weekly plans into the flattened lookup table.
///
/// Zones are visited top-down, parents before children in normalized sibling
/// order, and a zone's day plan replaces whatever an earlier zone wrote for
/// the same (day, device) branch. With schedules on both an ancestor and a
/// descendant zone the descendant therefore wins, consistently across
/// recompilations. Non-positive temperatures are the "no change" sentinel
/// and are never stored.
pub fn compile(tree: &ZoneNode, index: &HeatingIndex, config: &ScheduleConfig) -> ScheduleTable {
    let mut table = ScheduleTable::default();
    expand_zone(tree, index, config, &mut table);
    table.prune_empty();
    table
}

fn expand_zone(
    zone: &ZoneNode,
    index: &HeatingIndex,
    config: &ScheduleConfig,
    table: &mut ScheduleTable,
) {
    let devices = index.devices_in(&zone.id);
    if let Some(zone_plan) = config.schedule.get(&zone.id)
        && zone_plan.enabled
        && !devices.is_empty()
    {
        for (day, dayparts) in &zone_plan.plan {
            for device in devices {
                let hours = table
                    .days
                    .entry(*day)
                    .or_default()
                    .entry(device.clone())
                    .or_default();
                hours.clear();
                for part in dayparts.values() {
                    let Some(hour) = part.hour else { continue };
                    if part.temperature > 0 {
                        hours.entry(hour).or_default().insert(part.minute, part.temperature);
                    }
                }
            }
        }
    }

    // Children carry their own independent schedules; recurse regardless of
    // whether this zone had one.
    for child in &zone.children {
        expand_zone(child, index, config, table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::normalize;
    use crate::types::{Device, RawZone};
    use serde_json::json;

    // home (1) -> room A (2), room B (3); thermostat-1 in room A,
    // thermostat-2 in room B.
    fn discover() -> (ZoneNode, HeatingIndex) {
        let tree: RawZone = serde_json::from_value(json!({
            "id": 1, "parent": null, "index": 0,
            "children": {
                "2": {"id": 2, "parent": 1, "index": 0, "children": {}},
                "3": {"id": 3, "parent": 1, "index": 1, "children": {}}
            }
        }))
        .unwrap();
        let devices: Vec<Device> = serde_json::from_value(json!([
            {
                "id": "thermostat-1",
                "zone": {"id": 2, "parent": 1},
                "capabilities": {"target_temperature": {}}
            },
            {
                "id": "thermostat-2",
                "zone": {"id": 3, "parent": 1},
                "capabilities": {"target_temperature": {}}
            }
        ]))
        .unwrap();
        let root = RawZone::rooted(tree);
        let index = HeatingIndex::build(&root, &devices);
        let tree = normalize(&root, index.heating_zones());
        (tree, index)
    }

    fn config(raw: serde_json::Value) -> ScheduleConfig {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn monday_morning_slot_is_compiled() {
        let (tree, index) = discover();
        let cfg = config(json!({
            "schedule": {
                "2": {
                    "enabled": true,
                    "plan": {"mo": {"morning": {"hour": 6, "minute": 0, "temperature": 21}}}
                }
            }
        }));
        let table = compile(&tree, &index, &cfg);
        let d1 = DeviceId::new("thermostat-1");
        assert_eq!(table.temperature(Weekday::Mo, &d1, 6, 0), Some(21));
        assert_eq!(table.at(Weekday::Mo, 6, 0), vec![(&d1, 21)]);
        assert!(table.at(Weekday::Mo, 6, 1).is_empty());
    }

    #[test]
    fn sentinel_temperature_is_omitted() {
        let (tree, index) = discover();
        let cfg = config(json!({
            "schedule": {
                "2": {
                    "enabled": true,
                    "plan": {"mo": {"morning": {"hour": 6, "minute": 0, "temperature": -1}}}
                }
            }
        }));
        let table = compile(&tree, &index, &cfg);
        assert!(table.is_empty());
        assert!(table.at(Weekday::Mo, 6, 0).is_empty());
    }

    #[test]
    fn disabled_zone_is_skipped() {
        let (tree, index) = discover();
        let cfg = config(json!({
            "schedule": {
                "2": {
                    "enabled": false,
                    "plan": {"mo": {"morning": {"hour": 6, "minute": 0, "temperature": 21}}}
                }
            }
        }));
        let table = compile(&tree, &index, &cfg);
        assert!(table.is_empty());
    }

    #[test]
    fn daypart_without_hour_is_skipped() {
        let (tree, index) = discover();
        let cfg = config(json!({
            "schedule": {
                "2": {
                    "enabled": true,
                    "plan": {"mo": {
                        "morning": {"temperature": 21},
                        "evening": {"hour": 18, "minute": 30, "temperature": 19}
                    }}
                }
            }
        }));
        let table = compile(&tree, &index, &cfg);
        let d1 = DeviceId::new("thermostat-1");
        assert_eq!(table.temperature(Weekday::Mo, &d1, 18, 30), Some(19));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn no_empty_branches_survive() {
        let (tree, index) = discover();
        let cfg = config(json!({
            "schedule": {
                "2": {
                    "enabled": true,
                    "plan": {
                        "mo": {"morning": {"hour": 6, "minute": 0, "temperature": 21}},
                        "tu": {"morning": {"hour": 6, "minute": 0, "temperature": -1}}
                    }
                }
            }
        }));
        let table = compile(&tree, &index, &cfg);
        for (day, devices) in table.days() {
            assert!(!devices.is_empty(), "empty day {day}");
            for (device, hours) in devices {
                assert!(!hours.is_empty(), "empty device {device}");
                for minutes in hours.values() {
                    assert!(!minutes.is_empty());
                }
            }
        }
        assert!(!table.days().contains_key(&Weekday::Tu));
    }

    #[test]
    fn compilation_is_idempotent() {
        let (tree, index) = discover();
        let cfg = config(json!({
            "schedule": {
                "1": {
                    "enabled": true,
                    "plan": {"we": {"day": {"hour": 12, "minute": 15, "temperature": 20}}}
                },
                "2": {
                    "enabled": true,
                    "plan": {"mo": {"morning": {"hour": 6, "minute": 0, "temperature": 21}}}
                }
            }
        }));
        let first = compile(&tree, &index, &cfg);
        let second = compile(&tree, &index, &cfg);
        assert_eq!(first, second);
    }

    #[test]
    fn descendant_schedule_overrides_ancestor() {
        let (tree, index) = discover();
        // Both the whole home and room A target thermostat-1 at Monday
        // 06:00; the more specific zone must win.
        let cfg = config(json!({
            "schedule": {
                "1": {
                    "enabled": true,
                    "plan": {"mo": {"morning": {"hour": 6, "minute": 0, "temperature": 18}}}
                },
                "2": {
                    "enabled": true,
                    "plan": {"mo": {"morning": {"hour": 6, "minute": 0, "temperature": 22}}}
                }
            }
        }));
        let table = compile(&tree, &index, &cfg);
        let d1 = DeviceId::new("thermostat-1");
        let d2 = DeviceId::new("thermostat-2");
        assert_eq!(table.temperature(Weekday::Mo, &d1, 6, 0), Some(22));
        // Room B only gets the home-wide plan.
        assert_eq!(table.temperature(Weekday::Mo, &d2, 6, 0), Some(18));
    }

    #[test]
    fn descendant_day_plan_replaces_ancestor_day_plan() {
        let (tree, index) = discover();
        let cfg = config(json!({
            "schedule": {
                "1": {
                    "enabled": true,
                    "plan": {"mo": {"evening": {"hour": 18, "minute": 0, "temperature": 19}}}
                },
                "2": {
                    "enabled": true,
                    "plan": {"mo": {"morning": {"hour": 6, "minute": 0, "temperature": 22}}}
                }
            }
        }));
        let table = compile(&tree, &index, &cfg);
        let d1 = DeviceId::new("thermostat-1");
        // Room A's Monday plan supersedes the home-wide Monday plan for
        // its devices, including slots it does not re-declare.
        assert_eq!(table.temperature(Weekday::Mo, &d1, 6, 0), Some(22));
        assert_eq!(table.temperature(Weekday::Mo, &d1, 18, 0), None);
    }

    #[test]
    fn zone_without_devices_compiles_to_nothing() {
        let (tree, index) = discover();
        let cfg = config(json!({
            "schedule": {
                "99": {
                    "enabled": true,
                    "plan": {"mo": {"morning": {"hour": 6, "minute": 0, "temperature": 21}}}
                }
            }
        }));
        let table = compile(&tree, &index, &cfg);
        assert!(table.is_empty());
    }
}
