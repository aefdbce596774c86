use super::*;

/// Result of walking a straight line until something blocks it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineWalk {
    /// Anchors reached after the start, in order.
    pub steps: Vec<Pos>,
    /// First anchor the mover could not stand on, if the walk stopped early.
    pub blocked_at: Option<Pos>,
}

impl LineWalk {
    pub fn reached(&self, dest: Pos) -> bool {
        self.blocked_at.is_none() && self.steps.last().is_none_or(|last| *last == dest)
    }
}

/// Tiles on the line from `from` to `to`, both ends included.
pub(super) fn bresenham(from: Pos, to: Pos) -> Vec<Pos> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let mut cursor = from;
    let mut out = vec![from];
    while cursor != to {
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            cursor.x += sx;
        }
        if doubled <= dx {
            err += dx;
            cursor.y += sy;
        }
        out.push(cursor);
    }
    out
}
