//! Logical marble routing
//!
//! A headless stand-in for the physics layer: follows a marble down through
//! the cell graph using only connectivity. A marble entering a cell leaves
//! through the lowest edge joined to its entry (S before SE/SW, with SE/SW
//! ties broken by the caller's RNG). Upward exits are never taken. Every step
//! descends by at least one cell radius, so a route always terminates.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::cell::{CellId, HexEdge};
use super::entities::{BucketId, SpawnerId};
use super::layout::{BoardLayout, GridCoord, is_feeder_column, neighbour};

/// Where a marble ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteOutcome {
    /// Dropped out of a feeder column into its bucket
    Bucket(BucketId),
    /// Dropped out of a plain column onto the floor
    Floor { column: u32 },
    /// Came to rest on a cell with no way down
    Stuck(CellId),
}

/// Cells visited in order, and how the trip ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub path: Vec<CellId>,
    pub outcome: RouteOutcome,
}

/// Pick the exit a falling marble takes among the edges joined to its entry
fn pick_exit(exits: &[HexEdge], rng: &mut impl Rng) -> Option<HexEdge> {
    if exits.contains(&HexEdge::South) {
        return Some(HexEdge::South);
    }
    let se = exits.contains(&HexEdge::SouthEast);
    let sw = exits.contains(&HexEdge::SouthWest);
    match (se, sw) {
        (true, true) => Some(if rng.random_bool(0.5) {
            HexEdge::SouthEast
        } else {
            HexEdge::SouthWest
        }),
        (true, false) => Some(HexEdge::SouthEast),
        (false, true) => Some(HexEdge::SouthWest),
        (false, false) => None,
    }
}

/// Follow a marble entering `start` through `entry`
pub fn trace_from(layout: &BoardLayout, start: CellId, entry: HexEdge, rng: &mut impl Rng) -> Route {
    let mut path = Vec::new();
    let mut current = start;
    let mut entry = entry;

    loop {
        path.push(current);
        let Some(cell) = layout.cell(current) else {
            log::warn!("Route reached unknown cell {:?}", current);
            return Route { path, outcome: RouteOutcome::Stuck(current) };
        };

        let exits = cell.connections(entry);
        let Some(exit) = pick_exit(&exits, rng) else {
            return Route { path, outcome: RouteOutcome::Stuck(current) };
        };

        let here = GridCoord::new(cell.column as i32, cell.row);
        let next = neighbour(here, exit);
        if let Some(next_id) = layout.cell_id_at(next) {
            current = next_id;
            entry = exit.opposite();
            continue;
        }

        // Off the grid: sideways into a wall, or down into the basin
        if next.column < 0 || next.column >= layout.width as i32 {
            return Route { path, outcome: RouteOutcome::Stuck(current) };
        }
        // Only a straight drop out of a feeder column lands in its bucket
        let landed = next.column as u32;
        let outcome = if next.column == here.column && is_feeder_column(here.column) {
            match layout.bucket_in_column(landed) {
                Some(bucket) => RouteOutcome::Bucket(bucket),
                None => RouteOutcome::Floor { column: landed },
            }
        } else {
            RouteOutcome::Floor { column: landed }
        };
        return Route { path, outcome };
    }
}

/// Follow a marble dropped by `spawner` onto the top of its column
pub fn trace_from_spawner(layout: &BoardLayout, spawner: SpawnerId, rng: &mut impl Rng) -> Option<Route> {
    let top = layout.top_cell_below(spawner)?;
    Some(trace_from(layout, top, HexEdge::North, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::CellShape;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    /// Board with every cell replaced by `shape` at `steps`
    fn uniform_board(width: u32, height: u32, shape: CellShape, steps: u8) -> BoardLayout {
        let mut layout = BoardLayout::with_seed(width, height, 0.5, 0);
        for cell in &mut layout.cells {
            cell.init(shape);
            cell.set_rotation_steps(steps);
        }
        layout
    }

    #[test]
    fn test_straight_column_reaches_bucket() {
        let layout = uniform_board(3, 4, CellShape::Straight, 0);
        let mut rng = Pcg32::seed_from_u64(1);
        let route = trace_from_spawner(&layout, SpawnerId(1), &mut rng).unwrap();
        assert_eq!(route.outcome, RouteOutcome::Bucket(BucketId(1)));
        // Four rows plus the extra bottom cell
        assert_eq!(route.path.len(), 5);
        assert!(route.path.iter().all(|id| layout.cell(*id).unwrap().column == 2));
    }

    #[test]
    fn test_dead_end_blocks_entry() {
        let layout = uniform_board(2, 2, CellShape::DeadEnd, 0);
        let mut rng = Pcg32::seed_from_u64(1);
        let route = trace_from_spawner(&layout, SpawnerId(0), &mut rng).unwrap();
        let top = layout.top_cell_below(SpawnerId(0)).unwrap();
        assert_eq!(route.outcome, RouteOutcome::Stuck(top));
        assert_eq!(route.path, vec![top]);
    }

    #[test]
    fn test_closed_entry_is_stuck() {
        // Straight turned 60° opens NW/SE, the marble cannot enter from N
        let layout = uniform_board(2, 2, CellShape::Straight, 1);
        let mut rng = Pcg32::seed_from_u64(1);
        let route = trace_from_spawner(&layout, SpawnerId(0), &mut rng).unwrap();
        assert!(matches!(route.outcome, RouteOutcome::Stuck(_)));
    }

    #[test]
    fn test_l_turns_into_plain_column() {
        // L joins N and SE: from feeder column 0 the marble steps to column 1
        let layout = uniform_board(2, 1, CellShape::L, 0);
        let mut rng = Pcg32::seed_from_u64(1);
        let route = trace_from_spawner(&layout, SpawnerId(0), &mut rng).unwrap();
        let first = layout.cell(route.path[0]).unwrap();
        assert_eq!((first.column, first.row), (0, 0));
        let second = layout.cell(route.path[1]).unwrap();
        assert_eq!((second.column, second.row), (1, 0));
        // Entered through NW, which an unrotated L does not open
        assert_eq!(route.outcome, RouteOutcome::Stuck(second.id));
    }

    #[test]
    fn test_diagonal_exit_from_bottom_cell_lands_on_floor() {
        // The extra bottom cell of feeder column 0 turns the marble SE, past the bucket
        let mut layout = uniform_board(2, 2, CellShape::Straight, 0);
        let bottom = layout.cell_id_at(GridCoord::new(0, -1)).unwrap();
        layout.cell_mut(bottom).unwrap().init(CellShape::L);
        let mut rng = Pcg32::seed_from_u64(1);
        let route = trace_from_spawner(&layout, SpawnerId(0), &mut rng).unwrap();
        assert_eq!(route.outcome, RouteOutcome::Floor { column: 1 });
        assert_eq!(route.path.last(), Some(&bottom));
    }

    #[test]
    fn test_plain_column_drops_to_floor() {
        let layout = uniform_board(3, 2, CellShape::Straight, 0);
        let top = layout.cell_id_at(GridCoord::new(1, 1)).unwrap();
        let mut rng = Pcg32::seed_from_u64(1);
        let route = trace_from(&layout, top, HexEdge::North, &mut rng);
        assert_eq!(route.outcome, RouteOutcome::Floor { column: 1 });
        assert_eq!(route.path.len(), 2);
    }

    #[test]
    fn test_routes_always_descend() {
        let mut rng = Pcg32::seed_from_u64(77);
        for seed in 0..50 {
            let layout = BoardLayout::with_seed(10, 10, 0.5, seed);
            for spawner in &layout.spawners {
                let route = trace_from_spawner(&layout, spawner.id, &mut rng).unwrap();
                let ys: Vec<f32> = route.path.iter().map(|id| layout.cell(*id).unwrap().pos.y).collect();
                assert!(ys.windows(2).all(|w| w[1] < w[0]));
            }
        }
    }
}
