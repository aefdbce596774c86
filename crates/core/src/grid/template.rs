//! Shape-keyed occupancy templates and their per-grid cache.
//! A template is a pure function of its key: relative offsets only, never absolute positions.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::Size;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemplateKey {
    pub size: Size,
    /// Furthest threatened distance, in tiles.
    pub reach: u8,
    /// Threatens tiles within natural reach.
    pub near: bool,
    /// Threatens tiles beyond natural reach, up to `reach`.
    pub far: bool,
}

impl TemplateKey {
    pub fn footprint_only(size: Size) -> Self {
        Self { size, reach: size.natural_reach(), near: false, far: false }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Offset {
    pub dy: i32,
    pub dx: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancyTemplate {
    pub key: TemplateKey,
    pub occupied: Vec<Offset>,
    pub near: Vec<Offset>,
    pub far: Vec<Offset>,
}

impl OccupancyTemplate {
    pub fn build(key: TemplateKey) -> Self {
        let side = key.size.side();
        let natural = u32::from(key.size.natural_reach());
        let reach = i32::from(key.reach);
        let mut template = Self { key, occupied: Vec::new(), near: Vec::new(), far: Vec::new() };

        for dy in -reach..(side + reach) {
            for dx in -reach..(side + reach) {
                let offset = Offset { dy, dx };
                let distance = footprint_distance(side, dx, dy);
                if distance == 0 {
                    template.occupied.push(offset);
                } else if distance <= natural {
                    if key.near {
                        template.near.push(offset);
                    }
                } else if distance <= u32::from(key.reach) && key.far {
                    template.far.push(offset);
                }
            }
        }
        template
    }

    pub fn threatened(&self) -> impl Iterator<Item = &Offset> {
        self.near.iter().chain(self.far.iter())
    }
}

/// Reach distance from an offset to the nearest footprint cell, counting every second
/// diagonal step double.
fn footprint_distance(side: i32, dx: i32, dy: i32) -> u32 {
    let gap = |d: i32| -> u32 {
        if d < 0 {
            d.unsigned_abs()
        } else if d >= side {
            (d - side + 1) as u32
        } else {
            0
        }
    };
    let (gx, gy) = (gap(dx), gap(dy));
    gx.max(gy) + gx.min(gy) / 2
}

#[derive(Clone, Debug, Default)]
pub(crate) struct TemplateCache {
    entries: BTreeMap<TemplateKey, Arc<OccupancyTemplate>>,
}

impl TemplateCache {
    pub(crate) fn get_or_build(&mut self, key: TemplateKey) -> Arc<OccupancyTemplate> {
        Arc::clone(
            self.entries.entry(key).or_insert_with(|| Arc::new(OccupancyTemplate::build(key))),
        )
    }

    pub(crate) fn get(&self, key: TemplateKey) -> Option<Arc<OccupancyTemplate>> {
        self.entries.get(&key).map(Arc::clone)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medium_melee() -> TemplateKey {
        TemplateKey { size: Size::Medium, reach: 1, near: true, far: false }
    }

    #[test]
    fn medium_melee_threatens_the_eight_neighbours() {
        let template = OccupancyTemplate::build(medium_melee());
        assert_eq!(template.occupied, vec![Offset { dy: 0, dx: 0 }]);
        assert_eq!(template.near.len(), 8);
        assert!(template.far.is_empty());
        assert!(template.near.iter().all(|o| o.dx.abs() <= 1 && o.dy.abs() <= 1));
    }

    #[test]
    fn reach_weapon_skips_adjacent_ring_and_far_corners() {
        let key = TemplateKey { size: Size::Medium, reach: 2, near: false, far: true };
        let template = OccupancyTemplate::build(key);
        assert!(template.near.is_empty());
        assert!(template.far.contains(&Offset { dy: 0, dx: 2 }));
        assert!(template.far.contains(&Offset { dy: 1, dx: 2 }));
        assert!(!template.far.contains(&Offset { dy: 2, dx: 2 }), "corner costs three steps");
        assert!(!template.far.contains(&Offset { dy: 1, dx: 1 }));
        assert_eq!(template.far.len(), 12);
    }

    #[test]
    fn large_footprint_occupies_two_by_two() {
        let template = OccupancyTemplate::build(TemplateKey::footprint_only(Size::Large));
        assert_eq!(template.occupied.len(), 4);
        assert!(template.threatened().next().is_none());
    }

    #[test]
    fn cache_builds_each_key_once() {
        let mut cache = TemplateCache::default();
        let first = cache.get_or_build(medium_melee());
        let second = cache.get_or_build(medium_melee());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(medium_melee()).is_some_and(|hit| Arc::ptr_eq(&hit, &first)));
        assert!(cache.get(TemplateKey::footprint_only(Size::Huge)).is_none());
    }
}
