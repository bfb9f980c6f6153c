//! Placement of the two donor slots around a structure.
//!
//! Slots flank the structure on the side its interaction cell faces. The
//! result is deterministic for a given map state so repeated validation and
//! periodic re-issuing of slot jobs always target the same cells.

use crate::host::MapGrid;
use synthesis_data::{Cell, CellRect, MapId, Side};

/// Upper bound on the fallback search radius.
pub const MAX_SEARCH_RADIUS: i32 = 6;

/// Two donor positions, ordered left/right as seen facing out of `front`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPair {
    pub left: Cell,
    pub right: Cell,
    pub front: Side,
}

/// Which edge of `rect` the interaction cell sits against.
///
/// Exact adjacency wins; otherwise the edge the cell lies furthest beyond
/// is chosen (ties resolved North, East, South, West).
pub fn front_side(rect: &CellRect, interaction: Cell) -> Side {
    let along_x = interaction.x >= rect.min_x && interaction.x <= rect.max_x;
    let along_y = interaction.y >= rect.min_y && interaction.y <= rect.max_y;
    if along_x && interaction.y == rect.max_y + 1 {
        return Side::North;
    }
    if along_y && interaction.x == rect.max_x + 1 {
        return Side::East;
    }
    if along_x && interaction.y == rect.min_y - 1 {
        return Side::South;
    }
    if along_y && interaction.x == rect.min_x - 1 {
        return Side::West;
    }

    let mut best: Option<(Side, i32)> = None;
    for side in Side::ALL {
        let offset = rect.offset_beyond(side, interaction);
        if best.map_or(true, |(_, b)| offset > b) {
            best = Some((side, offset));
        }
    }
    best.map_or(Side::North, |(side, _)| side)
}

/// Position along the front edge, increasing from the left hand to the
/// right hand of someone facing out of `side`.
#[inline]
fn lateral(side: Side, cell: Cell) -> i32 {
    match side {
        Side::North => cell.x,
        Side::South => -cell.x,
        Side::East => -cell.y,
        Side::West => cell.y,
    }
}

/// Offsets within `radius`, nearest first, with a fixed tie order.
pub fn radial_offsets(radius: i32) -> Vec<(i32, i32)> {
    let radius = radius.clamp(0, MAX_SEARCH_RADIUS);
    let r2 = i64::from(radius * radius);
    let mut offsets: Vec<(i32, i32)> = (-radius..=radius)
        .flat_map(|dy| (-radius..=radius).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| i64::from(dx * dx + dy * dy) <= r2)
        .collect();
    offsets.sort_by_key(|&(dx, dy)| (dx * dx + dy * dy, dy, dx));
    offsets
}

struct SlotRules<'a, G: MapGrid + ?Sized> {
    grid: &'a G,
    map: MapId,
    rect: CellRect,
    interaction: Cell,
    front: Side,
}

impl<G: MapGrid + ?Sized> SlotRules<'_, G> {
    fn accepts(&self, cell: Cell) -> bool {
        self.grid.in_bounds(self.map, cell)
            && !self.rect.contains(cell)
            && cell != self.interaction
            && self.rect.is_beyond(self.front, cell)
            && self.grid.is_standable(self.map, cell)
            && !self.grid.has_filling_object(self.map, cell)
    }
}

/// Computes the two donor slots for a structure.
///
/// Returns `None` only when two distinct valid cells cannot be found within
/// `radius` of the interaction cell.
pub fn solve_slots<G: MapGrid + ?Sized>(
    grid: &G,
    map: MapId,
    rect: CellRect,
    interaction: Cell,
    radius: i32,
) -> Option<SlotPair> {
    let front = front_side(&rect, interaction);
    let rules = SlotRules {
        grid,
        map,
        rect,
        interaction,
        front,
    };

    let mut chosen: Vec<Cell> = rect
        .outer_corners(front)
        .into_iter()
        .filter(|&c| rules.accepts(c))
        .collect();

    if chosen.len() < 2 {
        tracing::debug!(
            ?front,
            preferred_ok = chosen.len(),
            "Preferred slot blocked, searching around interaction cell"
        );
        for (dx, dy) in radial_offsets(radius) {
            if chosen.len() == 2 {
                break;
            }
            let cell = interaction.offset(dx, dy);
            if !chosen.contains(&cell) && rules.accepts(cell) {
                chosen.push(cell);
            }
        }
    }

    if chosen.len() < 2 {
        return None;
    }

    chosen.sort_by_key(|&c| (lateral(front, c), c.dist_sq(interaction), c.y, c.x));
    Some(SlotPair {
        left: chosen[0],
        right: chosen[1],
        front,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::SandboxWorld;

    const MAP: MapId = SandboxWorld::MAP;

    fn station() -> (CellRect, Cell) {
        let rect = CellRect::centered(Cell::new(10, 10), 3, 3);
        (rect, Cell::new(10, 12))
    }

    #[test]
    fn test_front_side_exact_adjacency() {
        let (rect, _) = station();
        assert_eq!(front_side(&rect, Cell::new(10, 12)), Side::North);
        assert_eq!(front_side(&rect, Cell::new(10, 8)), Side::South);
        assert_eq!(front_side(&rect, Cell::new(12, 9)), Side::East);
        assert_eq!(front_side(&rect, Cell::new(8, 11)), Side::West);
    }

    #[test]
    fn test_front_side_fallback_uses_largest_offset() {
        let (rect, _) = station();
        // Diagonal and far away: 4 beyond east, 1 beyond north.
        assert_eq!(front_side(&rect, Cell::new(15, 12)), Side::East);
        // Inside the footprint: every offset is non-positive, north wins ties.
        assert_eq!(front_side(&rect, Cell::new(10, 10)), Side::North);
    }

    #[test]
    fn test_preferred_slots_north() {
        let world = SandboxWorld::new(30, 30);
        let (rect, interaction) = station();
        let pair = solve_slots(&world, MAP, rect, interaction, 6).unwrap();
        assert_eq!(pair.front, Side::North);
        assert_eq!(pair.left, Cell::new(8, 12));
        assert_eq!(pair.right, Cell::new(12, 12));
    }

    #[test]
    fn test_ordering_follows_facing() {
        let world = SandboxWorld::new(30, 30);
        let rect = CellRect::centered(Cell::new(10, 10), 3, 3);

        let south = solve_slots(&world, MAP, rect, Cell::new(10, 8), 6).unwrap();
        assert_eq!((south.left, south.right), (Cell::new(12, 8), Cell::new(8, 8)));

        let east = solve_slots(&world, MAP, rect, Cell::new(12, 10), 6).unwrap();
        assert_eq!((east.left, east.right), (Cell::new(12, 12), Cell::new(12, 8)));

        let west = solve_slots(&world, MAP, rect, Cell::new(8, 10), 6).unwrap();
        assert_eq!((west.left, west.right), (Cell::new(8, 8), Cell::new(8, 12)));
    }

    #[test]
    fn test_blocked_preferred_cell_substituted() {
        let mut world = SandboxWorld::new(30, 30);
        let (rect, interaction) = station();
        world.add_filling(Cell::new(8, 12));

        let pair = solve_slots(&world, MAP, rect, interaction, 6).unwrap();
        assert_ne!(pair.left, pair.right);
        for cell in [pair.left, pair.right] {
            assert!(!rect.contains(cell));
            assert_ne!(cell, interaction);
            assert!(rect.is_beyond(Side::North, cell));
            assert_ne!(cell, Cell::new(8, 12));
        }
        assert!(pair.left == Cell::new(12, 12) || pair.right == Cell::new(12, 12));
    }

    #[test]
    fn test_out_of_bounds_corner_substituted() {
        let world = SandboxWorld::new(12, 30);
        let rect = CellRect::centered(Cell::new(10, 10), 3, 3);
        // East corner x = 12 lies outside a 12-wide map.
        let pair = solve_slots(&world, MAP, rect, Cell::new(10, 12), 6).unwrap();
        assert!(pair.left.x < 12 && pair.right.x < 12);
        assert!(pair.left.x < pair.right.x);
    }

    #[test]
    fn test_no_room_returns_none() {
        let mut world = SandboxWorld::new(30, 30);
        let (rect, interaction) = station();
        for (dx, dy) in radial_offsets(6) {
            world.add_wall(interaction.offset(dx, dy));
        }
        assert!(solve_slots(&world, MAP, rect, interaction, 6).is_none());
    }

    #[test]
    fn test_solution_is_stable() {
        let mut world = SandboxWorld::new(30, 30);
        let (rect, interaction) = station();
        world.add_wall(Cell::new(12, 12));
        let first = solve_slots(&world, MAP, rect, interaction, 6);
        for _ in 0..5 {
            assert_eq!(solve_slots(&world, MAP, rect, interaction, 6), first);
        }
    }

    #[test]
    fn test_radial_offsets_nearest_first() {
        let offsets = radial_offsets(2);
        assert_eq!(offsets[0], (0, 0));
        let dists: Vec<i32> = offsets.iter().map(|(x, y)| x * x + y * y).collect();
        assert!(dists.windows(2).all(|w| w[0] <= w[1]));
        assert!(offsets.iter().all(|(x, y)| x * x + y * y <= 4));
    }

    proptest::proptest! {
        #[test]
        fn prop_radial_offsets_bounded_and_unique(radius in -3i32..12) {
            let offsets = radial_offsets(radius);
            let r = radius.clamp(0, MAX_SEARCH_RADIUS);
            let mut seen = std::collections::HashSet::new();
            for &(dx, dy) in &offsets {
                proptest::prop_assert!(dx * dx + dy * dy <= r * r);
                proptest::prop_assert!(seen.insert((dx, dy)));
            }
            proptest::prop_assert_eq!(offsets.first(), Some(&(0, 0)));
        }
    }
}
