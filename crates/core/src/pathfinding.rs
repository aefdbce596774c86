//! Footprint-aware shortest paths over the battle grid.
//! This module exists so movement queries share one cached view of traversal costs.
//! It does not own tactical choices about where to go; strategies decide that.
//!
//! Step costs are Euclidean in hundredths of a tile (100 straight, 141 diagonal) and
//! doubled when the destination touches `Terrain::Other`. The open set is ordered by
//! `(f, h, y, x)`: among nodes of equal estimated total, the one closer to the goal
//! expands first, then the lowest row, then the lowest column.

use std::collections::BTreeSet;

use tracing::trace;

use crate::grid::Grid;
use crate::types::{CombatantId, Pos, Size, Terrain};

mod line;

pub use line::LineWalk;

pub const STRAIGHT_STEP_COST: u32 = 100;
pub const DIAGONAL_STEP_COST: u32 = 141;

/// Axis-aligned window of the grid a pathfinder searches within.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn full(grid: &Grid) -> Self {
        Self { x: 0, y: 0, width: grid.width(), height: grid.height() }
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.x >= self.x
            && pos.y >= self.y
            && ((pos.x - self.x) as usize) < self.width
            && ((pos.y - self.y) as usize) < self.height
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        self.contains(pos)
            .then(|| ((pos.y - self.y) as usize) * self.width + ((pos.x - self.x) as usize))
    }

    fn clamped_to(self, grid: &Grid) -> Self {
        let x0 = self.x.clamp(0, grid.width() as i32);
        let y0 = self.y.clamp(0, grid.height() as i32);
        let x1 = (self.x + self.width as i32).clamp(x0, grid.width() as i32);
        let y1 = (self.y + self.height as i32).clamp(y0, grid.height() as i32);
        Self { x: x0, y: y0, width: (x1 - x0) as usize, height: (y1 - y0) as usize }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mover {
    pub id: CombatantId,
    pub anchor: Pos,
    pub size: Size,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Goal {
    Tile(Pos),
    /// Any anchor whose Euclidean distance to `center` lies in `[min, max]` tiles.
    WithinRange { center: Pos, min: f32, max: f32 },
    /// Any of the listed anchors.
    AnyOf(Vec<Pos>),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path {
    /// Anchors visited after the start, in order.
    pub steps: Vec<Pos>,
    pub cost: u32,
}

impl Path {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn destination(&self) -> Option<Pos> {
        self.steps.last().copied()
    }
}

#[derive(Clone, Debug, Default)]
struct Cell {
    /// `None` for walls.
    terrain_cost: Option<u32>,
    occupants: Vec<CombatantId>,
    target_epoch: u32,
    seen_epoch: u32,
    g: u32,
    came_from: Option<Pos>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f: u32,
    h: u32,
    y: i32,
    x: i32,
}

#[derive(Clone, Debug, Default)]
pub struct Pathfinder {
    requested: Option<Viewport>,
    viewport: Option<Viewport>,
    synced_revision: Option<u64>,
    cells: Vec<Cell>,
    epoch: u32,
    four_connected: bool,
    resyncs: u64,
}

impl Pathfinder {
    pub fn new(diagonal_movement: bool) -> Self {
        Self { four_connected: !diagonal_movement, ..Self::default() }
    }

    /// Restricts future searches to `viewport`; a change forces a cache rebuild.
    pub fn attach(&mut self, viewport: Viewport) {
        if self.requested != Some(viewport) {
            self.requested = Some(viewport);
            self.synced_revision = None;
        }
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Number of times the per-cell cache has been rebuilt.
    pub fn resync_count(&self) -> u64 {
        self.resyncs
    }

    pub fn find_path(&mut self, grid: &Grid, mover: Mover, goal: Goal) -> Option<Path> {
        let viewport = self.sync(grid);
        if !self.can_stand(viewport, mover, mover.anchor) {
            return None;
        }

        let epoch = self.next_epoch();
        let target = match goal {
            Goal::Tile(pos) => {
                let idx = viewport.index(pos)?;
                self.cells[idx].target_epoch = epoch;
                Some(pos)
            }
            Goal::WithinRange { center, min, max } => {
                self.mark_range(viewport, center, min, max, epoch);
                None
            }
            Goal::AnyOf(anchors) => {
                for idx in anchors.iter().filter_map(|pos| viewport.index(*pos)) {
                    self.cells[idx].target_epoch = epoch;
                }
                None
            }
        };
        let heuristic = |pos: Pos| target.map_or(0, |goal| octile_distance(pos, goal));

        let start_idx = viewport.index(mover.anchor)?;
        {
            let start = &mut self.cells[start_idx];
            start.seen_epoch = epoch;
            start.g = 0;
            start.came_from = None;
        }

        let mut open_set = BTreeSet::new();
        let h = heuristic(mover.anchor);
        open_set.insert(OpenNode { f: h, h, y: mover.anchor.y, x: mover.anchor.x });

        while let Some(current) = open_set.pop_first() {
            let pos = Pos { y: current.y, x: current.x };
            let Some(idx) = viewport.index(pos) else {
                continue;
            };
            let cur_g = self.cells[idx].g;
            if current.f > cur_g + current.h {
                continue;
            }
            if self.cells[idx].target_epoch == epoch {
                return Some(self.reconstruct(viewport, mover.anchor, pos));
            }

            for next in self.neighbors(pos) {
                let Some(step) = self.edge_cost(viewport, mover, pos, next) else {
                    continue;
                };
                let Some(next_idx) = viewport.index(next) else {
                    continue;
                };
                let tentative = cur_g + step;
                let cell = &mut self.cells[next_idx];
                if cell.seen_epoch == epoch && tentative >= cell.g {
                    continue;
                }
                cell.seen_epoch = epoch;
                cell.g = tentative;
                cell.came_from = Some(pos);
                let h = heuristic(next);
                open_set.insert(OpenNode { f: tentative + h, h, y: next.y, x: next.x });
            }
        }
        None
    }

    /// Walks the discretized line toward `dest`, stopping before the first anchor the
    /// mover cannot stand on.
    pub fn straight_line(&mut self, grid: &Grid, mover: Mover, dest: Pos) -> LineWalk {
        let viewport = self.sync(grid);
        let mut walk = LineWalk::default();
        for pos in line::bresenham(mover.anchor, dest).into_iter().skip(1) {
            if !self.can_stand(viewport, mover, pos) {
                walk.blocked_at = Some(pos);
                break;
            }
            walk.steps.push(pos);
        }
        walk
    }

    /// Cost of moving `mover` one step from its anchor to `to` on the current grid, or `None`
    /// if the step is illegal.
    pub fn step_cost(&mut self, grid: &Grid, mover: Mover, to: Pos) -> Option<u32> {
        let viewport = self.sync(grid);
        self.edge_cost(viewport, mover, mover.anchor, to)
    }

    fn edge_cost(&self, viewport: Viewport, mover: Mover, from: Pos, to: Pos) -> Option<u32> {
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        if dx.abs() > 1 || dy.abs() > 1 || (dx == 0 && dy == 0) {
            return None;
        }
        if !self.can_stand(viewport, mover, to) {
            return None;
        }
        let base = if dx != 0 && dy != 0 {
            if self.four_connected {
                return None;
            }
            // No squeezing diagonally past wall corners.
            let side_a = Pos { y: from.y, x: to.x };
            let side_b = Pos { y: to.y, x: from.x };
            if !self.terrain_passable(viewport, mover.size, side_a)
                || !self.terrain_passable(viewport, mover.size, side_b)
            {
                return None;
            }
            DIAGONAL_STEP_COST
        } else {
            STRAIGHT_STEP_COST
        };
        Some(base * self.terrain_multiplier(viewport, mover.size, to))
    }

    fn sync(&mut self, grid: &Grid) -> Viewport {
        let viewport = self.requested.unwrap_or_else(|| Viewport::full(grid)).clamped_to(grid);
        if self.synced_revision == Some(grid.revision()) && self.viewport == Some(viewport) {
            return viewport;
        }
        trace!(
            revision = grid.revision(),
            ?viewport,
            previous = ?self.synced_revision,
            "pathfinder cache resync"
        );
        self.cells.clear();
        self.cells.resize(viewport.width * viewport.height, Cell::default());
        for y in 0..viewport.height {
            for x in 0..viewport.width {
                let pos = Pos { y: viewport.y + y as i32, x: viewport.x + x as i32 };
                let Some(tile) = grid.tile(pos) else {
                    continue;
                };
                let cell = &mut self.cells[y * viewport.width + x];
                cell.terrain_cost = match tile.terrain {
                    Terrain::Free => Some(1),
                    Terrain::Other => Some(2),
                    Terrain::Wall => None,
                };
                cell.occupants = tile.occupation().iter().copied().collect();
            }
        }
        self.epoch = 0;
        self.viewport = Some(viewport);
        self.synced_revision = Some(grid.revision());
        self.resyncs += 1;
        viewport
    }

    fn next_epoch(&mut self) -> u32 {
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            for cell in &mut self.cells {
                cell.target_epoch = 0;
                cell.seen_epoch = 0;
            }
            self.epoch = 1;
        }
        self.epoch
    }

    fn mark_range(&mut self, viewport: Viewport, center: Pos, min: f32, max: f32, epoch: u32) {
        let span = max.max(0.0).ceil() as i32;
        let (min_sq, max_sq) = (min.max(0.0).powi(2), max.max(0.0).powi(2));
        for dy in -span..=span {
            for dx in -span..=span {
                let dist_sq = (dx * dx + dy * dy) as f32;
                if dist_sq < min_sq || dist_sq > max_sq {
                    continue;
                }
                if let Some(idx) = viewport.index(center.offset(dx, dy)) {
                    self.cells[idx].target_epoch = epoch;
                }
            }
        }
    }

    fn neighbors(&self, pos: Pos) -> Vec<Pos> {
        let mut out = vec![
            Pos { y: pos.y - 1, x: pos.x },
            Pos { y: pos.y, x: pos.x + 1 },
            Pos { y: pos.y + 1, x: pos.x },
            Pos { y: pos.y, x: pos.x - 1 },
        ];
        if !self.four_connected {
            out.extend([
                Pos { y: pos.y - 1, x: pos.x - 1 },
                Pos { y: pos.y - 1, x: pos.x + 1 },
                Pos { y: pos.y + 1, x: pos.x + 1 },
                Pos { y: pos.y + 1, x: pos.x - 1 },
            ]);
        }
        out
    }

    fn footprint_cells(&self, viewport: Viewport, size: Size, anchor: Pos) -> Option<Vec<&Cell>> {
        let side = size.side();
        let mut cells = Vec::with_capacity((side * side) as usize);
        for dy in 0..side {
            for dx in 0..side {
                cells.push(&self.cells[viewport.index(anchor.offset(dx, dy))?]);
            }
        }
        Some(cells)
    }

    fn can_stand(&self, viewport: Viewport, mover: Mover, anchor: Pos) -> bool {
        self.footprint_cells(viewport, mover.size, anchor).is_some_and(|cells| {
            cells.iter().all(|cell| {
                cell.terrain_cost.is_some() && cell.occupants.iter().all(|id| *id == mover.id)
            })
        })
    }

    fn terrain_passable(&self, viewport: Viewport, size: Size, anchor: Pos) -> bool {
        self.footprint_cells(viewport, size, anchor)
            .is_some_and(|cells| cells.iter().all(|cell| cell.terrain_cost.is_some()))
    }

    fn terrain_multiplier(&self, viewport: Viewport, size: Size, anchor: Pos) -> u32 {
        self.footprint_cells(viewport, size, anchor)
            .and_then(|cells| cells.iter().filter_map(|cell| cell.terrain_cost).max())
            .unwrap_or(1)
    }

    fn reconstruct(&self, viewport: Viewport, start: Pos, goal: Pos) -> Path {
        let cost = viewport.index(goal).map_or(0, |idx| self.cells[idx].g);
        let mut steps = Vec::new();
        let mut cursor = goal;
        while cursor != start {
            steps.push(cursor);
            let Some(prev) = viewport.index(cursor).and_then(|idx| self.cells[idx].came_from)
            else {
                return Path::default();
            };
            cursor = prev;
        }
        steps.reverse();
        Path { steps, cost }
    }
}

/// Exact shortest cost between two tiles on an empty 8-connected grid.
pub fn octile_distance(a: Pos, b: Pos) -> u32 {
    let dx = a.x.abs_diff(b.x);
    let dy = a.y.abs_diff(b.y);
    STRAIGHT_STEP_COST * dx.max(dy) + (DIAGONAL_STEP_COST - STRAIGHT_STEP_COST) * dx.min(dy)
}
