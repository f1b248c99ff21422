use std::collections::{BTreeMap, BTreeSet};

use crate::types::{Device, DeviceId, RawZone, ZoneId};

/// Topological index of heating-capable devices, rebuilt wholesale on every
/// discovery pass. A device is registered under its own zone and under every
/// ancestor zone, which is what lets a schedule set on a parent zone apply
/// to all descendant devices.
#[derive(Debug, Default)]
pub struct HeatingIndex {
    heating_zones: BTreeSet<ZoneId>,
    zone_devices: BTreeMap<ZoneId, Vec<DeviceId>>,
}

impl HeatingIndex {
    /// Scan the device list against the raw zone tree. Devices without the
    /// target-temperature capability never appear in the index.
    pub fn build(root: &RawZone, devices: &[Device]) -> Self {
        // One pass over the tree gives the zone-id -> parent map, so the
        // ancestor walk per device is a chain of map lookups.
        let mut parents = BTreeMap::new();
        collect_parents(root, &mut parents);

        let mut index = HeatingIndex::default();
        for device in devices {
            if !device.is_heating_capable() {
                continue;
            }
            index.register(&device.zone.id, &device.id);

            // The first hop uses the parent carried by the device's zone
            // reference; after that the tree's parent map takes over.
            let mut next = device.zone.parent.clone();
            let mut seen = BTreeSet::new();
            while let Some(zone_id) = next {
                if !seen.insert(zone_id.clone()) {
                    break;
                }
                index.register(&zone_id, &device.id);
                next = parents.get(&zone_id).cloned().flatten();
            }
        }

        for list in index.zone_devices.values_mut() {
            list.sort();
            list.dedup();
        }
        index
    }

    fn register(&mut self, zone: &ZoneId, device: &DeviceId) {
        self.heating_zones.insert(zone.clone());
        self.zone_devices
            .entry(zone.clone())
            .or_default()
            .push(device.clone());
    }

    /// Zones that directly or transitively contain a heating-capable device.
    pub fn heating_zones(&self) -> &BTreeSet<ZoneId> {
        &self.heating_zones
    }

    pub fn contains_zone(&self, zone: &ZoneId) -> bool {
        self.heating_zones.contains(zone)
    }

    pub fn devices_in(&self, zone: &ZoneId) -> &[DeviceId] {
        self.zone_devices
            .get(zone)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn collect_parents(zone: &RawZone, out: &mut BTreeMap<ZoneId, Option<ZoneId>>) {
    out.insert(zone.id.clone(), zone.parent.clone());
    for child in zone.children.values() {
        collect_parents(child, out);
    }
}
