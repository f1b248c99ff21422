use std::collections::BTreeSet;

use crate::types::{RawZone, ZoneId};

/// A zone of the normalized tree: only zones that transitively contain a
/// heating-capable device survive, and children are an ordered sequence
/// instead of a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneNode {
    pub id: ZoneId,
    pub index: i64,
    pub children: Vec<ZoneNode>,
}

/// Prune the raw tree down to the heating zone set. Pure: the input tree is
/// left untouched. The root is always retained regardless of membership; a
/// non-root zone outside the set is dropped with its whole subtree, which is
/// safe because set membership is transitively closed over descendants.
pub fn normalize(root: &RawZone, heating: &BTreeSet<ZoneId>) -> ZoneNode {
    let mut children: Vec<ZoneNode> = root
        .children
        .values()
        .filter(|child| heating.contains(&child.id))
        .map(|child| normalize(child, heating))
        .collect();
    // Sibling order follows the zone's index field; ties fall back to the
    // zone id so the order is stable across discovery passes.
    children.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.id.cmp(&b.id)));
    ZoneNode {
        id: root.id.clone(),
        index: root.index,
        children,
    }
}
