//! Tile grid with occupancy and threat projection.
//! This module exists so every spatial registration flows through one revisioned owner.
//! It does not decide movement legality beyond tile emptiness; that belongs to pathfinding.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::trace;

use crate::types::{CombatantId, Pos, Size, Terrain};

mod template;

pub use template::{OccupancyTemplate, Offset, TemplateKey};
use template::TemplateCache;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    pub pos: Pos,
    pub terrain: Terrain,
    occupation: BTreeSet<CombatantId>,
    threaten: BTreeSet<CombatantId>,
}

impl Tile {
    fn new(pos: Pos) -> Self {
        Self { pos, terrain: Terrain::Free, occupation: BTreeSet::new(), threaten: BTreeSet::new() }
    }

    pub fn occupation(&self) -> &BTreeSet<CombatantId> {
        &self.occupation
    }

    pub fn threaten(&self) -> &BTreeSet<CombatantId> {
        &self.threaten
    }

    /// No one stands here and the terrain is not a wall.
    pub fn is_empty(&self) -> bool {
        self.occupation.is_empty() && self.terrain != Terrain::Wall
    }
}

/// Where a combatant stands and which shape it projects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub anchor: Pos,
    pub key: TemplateKey,
}

/// Reverse mapping kept on the registered entity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Footprint {
    occupied: Vec<Pos>,
    threatened: Vec<Pos>,
}

impl Footprint {
    pub fn occupied(&self) -> &[Pos] {
        &self.occupied
    }

    pub fn threatened(&self) -> &[Pos] {
        &self.threatened
    }

    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty() && self.threatened.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
    revision: u64,
    templates: TemplateCache,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        let mut tiles = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile::new(Pos { y: y as i32, x: x as i32 }));
            }
        }
        Self { width, height, tiles, revision: 0, templates: TemplateCache::default() }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bumped on every terrain or registration change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && (pos.x as usize) < self.width
            && (pos.y as usize) < self.height
    }

    pub fn get_tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.tile(Pos { y, x })
    }

    pub fn tile(&self, pos: Pos) -> Option<&Tile> {
        if !self.in_bounds(pos) {
            return None;
        }
        self.tiles.get(self.index(pos))
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn terrain(&self, pos: Pos) -> Option<Terrain> {
        self.tile(pos).map(|tile| tile.terrain)
    }

    pub fn set_terrain(&mut self, pos: Pos, terrain: Terrain) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        let idx = self.index(pos);
        self.tiles[idx].terrain = terrain;
        self.revision += 1;
        true
    }

    pub fn is_empty(&self, pos: Pos) -> bool {
        self.tile(pos).is_some_and(Tile::is_empty)
    }

    /// True when every tile of a `size` footprint anchored at `anchor` is in bounds, not a
    /// wall, and occupied by nobody except `ignore`.
    pub fn footprint_clear(&self, anchor: Pos, size: Size, ignore: Option<CombatantId>) -> bool {
        let side = size.side();
        (0..side).all(|dy| {
            (0..side).all(|dx| {
                self.tile(anchor.offset(dx, dy)).is_some_and(|tile| {
                    tile.terrain != Terrain::Wall
                        && tile.occupation.iter().all(|id| Some(*id) == ignore)
                })
            })
        })
    }

    pub fn template(&mut self, key: TemplateKey) -> Arc<OccupancyTemplate> {
        self.templates.get_or_build(key)
    }

    /// Cached template for `key`, built on the spot when no registration has needed it yet.
    pub fn template_for(&self, key: TemplateKey) -> Arc<OccupancyTemplate> {
        self.templates.get(key).unwrap_or_else(|| Arc::new(OccupancyTemplate::build(key)))
    }

    pub fn cached_template_count(&self) -> usize {
        self.templates.len()
    }

    pub fn register(&mut self, id: CombatantId, placement: Placement, footprint: &mut Footprint) {
        if !footprint.is_empty() {
            self.unregister(id, footprint);
        }
        let template = self.templates.get_or_build(placement.key);
        trace!(?id, anchor = ?placement.anchor, key = ?placement.key, "registering footprint");
        for offset in &template.occupied {
            let pos = placement.anchor.offset(offset.dx, offset.dy);
            if !self.in_bounds(pos) {
                continue;
            }
            let idx = self.index(pos);
            if self.tiles[idx].occupation.insert(id) {
                footprint.occupied.push(pos);
            }
        }
        for offset in template.threatened() {
            let pos = placement.anchor.offset(offset.dx, offset.dy);
            if !self.in_bounds(pos) {
                continue;
            }
            let idx = self.index(pos);
            if self.tiles[idx].threaten.insert(id) {
                footprint.threatened.push(pos);
            }
        }
        self.revision += 1;
    }

    pub fn unregister(&mut self, id: CombatantId, footprint: &mut Footprint) {
        for pos in footprint.occupied.drain(..) {
            if let Some(idx) = self.checked_index(pos) {
                self.tiles[idx].occupation.remove(&id);
            }
        }
        for pos in footprint.threatened.drain(..) {
            if let Some(idx) = self.checked_index(pos) {
                self.tiles[idx].threaten.remove(&id);
            }
        }
        self.revision += 1;
    }

    pub fn occupants(&self, pos: Pos) -> impl Iterator<Item = CombatantId> + '_ {
        self.tile(pos).into_iter().flat_map(|tile| tile.occupation.iter().copied())
    }

    pub fn threatening(&self, pos: Pos) -> impl Iterator<Item = CombatantId> + '_ {
        self.tile(pos).into_iter().flat_map(|tile| tile.threaten.iter().copied())
    }

    fn checked_index(&self, pos: Pos) -> Option<usize> {
        self.in_bounds(pos).then(|| self.index(pos))
    }

    fn index(&self, pos: Pos) -> usize {
        (pos.y as usize) * self.width + (pos.x as usize)
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;

    fn ids(count: usize) -> Vec<CombatantId> {
        let mut arena: SlotMap<CombatantId, ()> = SlotMap::with_key();
        (0..count).map(|_| arena.insert(())).collect()
    }

    fn melee(anchor: Pos) -> Placement {
        Placement {
            anchor,
            key: TemplateKey { size: Size::Medium, reach: 1, near: true, far: false },
        }
    }

    #[test]
    fn template_lookups_reuse_registered_shapes() {
        let mut grid = Grid::new(6, 6);
        let id = ids(1)[0];
        let mut footprint = Footprint::default();
        let placement = melee(Pos { y: 2, x: 2 });
        grid.register(id, placement, &mut footprint);

        let cached = grid.template(placement.key);
        assert!(Arc::ptr_eq(&grid.template_for(placement.key), &cached));
        let huge = TemplateKey::footprint_only(Size::Huge);
        assert_eq!(grid.template_for(huge).occupied.len(), 9);
        assert_eq!(grid.cached_template_count(), 1, "lookups never grow the cache");
    }

    #[test]
    fn medium_registration_at_five_five_marks_centre_and_ring() {
        let mut grid = Grid::new(10, 10);
        let id = ids(1)[0];
        let mut footprint = Footprint::default();
        grid.register(id, melee(Pos { y: 5, x: 5 }), &mut footprint);

        assert_eq!(footprint.occupied(), &[Pos { y: 5, x: 5 }]);
        assert_eq!(footprint.threatened().len(), 8);
        for tile in grid.tiles() {
            let adjacent = tile.pos.chebyshev(Pos { y: 5, x: 5 }) == 1;
            assert_eq!(tile.threaten().contains(&id), adjacent, "tile {:?}", tile.pos);
            assert_eq!(tile.occupation().contains(&id), tile.pos == Pos { y: 5, x: 5 });
        }
    }

    #[test]
    fn unregister_reverses_register_exactly() {
        let mut grid = Grid::new(8, 8);
        let pair = ids(2);
        let (a, b) = (pair[0], pair[1]);
        let mut fa = Footprint::default();
        let mut fb = Footprint::default();
        grid.register(a, melee(Pos { y: 3, x: 3 }), &mut fa);
        let before: Vec<Tile> = grid.tiles().cloned().collect();

        grid.register(b, melee(Pos { y: 3, x: 4 }), &mut fb);
        grid.unregister(b, &mut fb);

        let after: Vec<Tile> = grid.tiles().cloned().collect();
        assert_eq!(before, after);
        assert!(fb.is_empty());
    }

    #[test]
    fn re_registering_never_duplicates_entries() {
        let mut grid = Grid::new(6, 6);
        let id = ids(1)[0];
        let mut footprint = Footprint::default();
        grid.register(id, melee(Pos { y: 2, x: 2 }), &mut footprint);
        grid.register(id, melee(Pos { y: 2, x: 3 }), &mut footprint);

        assert_eq!(footprint.occupied(), &[Pos { y: 2, x: 3 }]);
        assert!(!grid.tile(Pos { y: 2, x: 2 }).expect("tile").occupation().contains(&id));
        let threatened_tiles = grid.tiles().filter(|tile| tile.threaten().contains(&id)).count();
        assert_eq!(threatened_tiles, 8);
    }

    #[test]
    fn registration_bumps_revision() {
        let mut grid = Grid::new(4, 4);
        let id = ids(1)[0];
        let mut footprint = Footprint::default();
        let start = grid.revision();
        grid.register(id, melee(Pos { y: 1, x: 1 }), &mut footprint);
        assert!(grid.revision() > start);
        let mid = grid.revision();
        grid.unregister(id, &mut footprint);
        assert!(grid.revision() > mid);
    }

    #[test]
    fn out_of_bounds_tiles_are_absent() {
        let grid = Grid::new(3, 3);
        assert!(grid.get_tile(-1, 0).is_none());
        assert!(grid.get_tile(3, 1).is_none());
        assert!(grid.get_tile(2, 2).is_some());
        assert!(!grid.is_empty(Pos { y: 9, x: 9 }));
    }

    #[test]
    fn walls_are_never_empty() {
        let mut grid = Grid::new(3, 3);
        grid.set_terrain(Pos { y: 1, x: 1 }, Terrain::Wall);
        assert!(!grid.is_empty(Pos { y: 1, x: 1 }));
        assert!(grid.is_empty(Pos { y: 0, x: 1 }));
    }

    #[test]
    fn footprint_clear_ignores_the_mover_itself() {
        let mut grid = Grid::new(5, 5);
        let pair = ids(2);
        let (a, b) = (pair[0], pair[1]);
        let mut fa = Footprint::default();
        grid.register(a, melee(Pos { y: 2, x: 2 }), &mut fa);
        assert!(grid.footprint_clear(Pos { y: 2, x: 2 }, Size::Medium, Some(a)));
        assert!(!grid.footprint_clear(Pos { y: 2, x: 2 }, Size::Medium, Some(b)));
        assert!(!grid.footprint_clear(Pos { y: 4, x: 4 }, Size::Large, None), "spills off grid");
    }
}
