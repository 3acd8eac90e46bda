//! Procedural board generation
//!
//! The board is a column-major grid of flat-topped hex cells. Feeder columns
//! (the 1st, 3rd, 5th, ... column) are raised by one cell radius, carry one
//! extra cell below the bottom row, a spawner above the top row and a bucket
//! underneath. The plain columns between them get a floor piece below and a
//! ceiling piece above.
//!
//! Geometry, with `r` the cell radius:
//! - column spacing `sqrt(3)·r`
//! - row spacing `2·r`
//! - feeder columns shifted up by `r`

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::cell::{Cell, CellId, CellShape, HexEdge};
use super::entities::{Bucket, BucketId, Fixture, Spawner, SpawnerId, WallSide};
use crate::config::BoardConfig;
use crate::consts::*;

/// Grid coordinate, possibly outside the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCoord {
    pub column: i32,
    pub row: i32,
}

impl GridCoord {
    pub fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }
}

/// Feeder columns hold the spawner/bucket pairs
#[inline]
pub fn is_feeder_column(column: i32) -> bool {
    column.rem_euclid(2) == 0
}

/// Number of feeder columns (and so buckets and spawners) for a width
#[inline]
pub fn feeder_count(width: u32) -> u32 {
    width.div_ceil(2)
}

/// Coordinate across `edge` from `from`
pub fn neighbour(from: GridCoord, edge: HexEdge) -> GridCoord {
    let GridCoord { column: c, row: r } = from;
    // Raised columns reach one row higher on their diagonals
    let lift = if is_feeder_column(c) { 1 } else { 0 };
    match edge {
        HexEdge::North => GridCoord::new(c, r + 1),
        HexEdge::South => GridCoord::new(c, r - 1),
        HexEdge::NorthEast => GridCoord::new(c + 1, r + lift),
        HexEdge::SouthEast => GridCoord::new(c + 1, r + lift - 1),
        HexEdge::NorthWest => GridCoord::new(c - 1, r + lift),
        HexEdge::SouthWest => GridCoord::new(c - 1, r + lift - 1),
    }
}

/// Generation parameters beyond the board dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct BuildOptions {
    bucket_sprite_count: u32,
    center_camera: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            bucket_sprite_count: DEFAULT_BUCKET_SPRITES,
            center_camera: false,
        }
    }
}

/// A fully generated board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardLayout {
    pub width: u32,
    pub height: u32,
    pub radius: f32,
    /// Horizontal distance between column centers
    pub x_offset: f32,
    /// Vertical distance between row centers
    pub y_offset: f32,
    /// Cells in column order; `cells[i].id == CellId(i)`
    pub cells: Vec<Cell>,
    /// Buckets in column order; `buckets[i].id == BucketId(i)`
    pub buckets: Vec<Bucket>,
    /// Spawners in column order; `spawners[i].id == SpawnerId(i)`
    pub spawners: Vec<Spawner>,
    pub fixtures: Vec<Fixture>,
    /// Where the camera looks
    pub camera_focus: Vec2,
    #[serde(default)]
    options: BuildOptions,
}

impl BoardLayout {
    /// Generate a board, drawing cell shapes and orientations from `rng`
    pub fn generate(width: u32, height: u32, radius: f32, rng: &mut impl Rng) -> Self {
        Self::build(width, height, radius, BuildOptions::default(), rng)
    }

    /// Generate a reproducible board from a seed
    pub fn with_seed(width: u32, height: u32, radius: f32, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        Self::generate(width, height, radius, &mut rng)
    }

    /// Generate a board from a (validated) configuration
    pub fn from_config(config: &BoardConfig, rng: &mut impl Rng) -> Self {
        let options = BuildOptions {
            bucket_sprite_count: config.bucket_sprite_count,
            center_camera: config.center_camera,
        };
        Self::build(config.width, config.height, config.radius, options, rng)
    }

    /// Discard everything and build a fresh board with the same dimensions and options
    pub fn regenerate(&mut self, rng: &mut impl Rng) {
        *self = Self::build(self.width, self.height, self.radius, self.options, rng);
    }

    fn build(width: u32, height: u32, radius: f32, options: BuildOptions, rng: &mut impl Rng) -> Self {
        let y_offset = radius * 2.0;
        let x_offset = 3.0_f32.sqrt() * radius;
        let feeders = feeder_count(width) as usize;

        let mut layout = Self {
            width,
            height,
            radius,
            x_offset,
            y_offset,
            cells: Vec::with_capacity((width * height) as usize + feeders),
            buckets: Vec::with_capacity(feeders),
            spawners: Vec::with_capacity(feeders),
            fixtures: Vec::with_capacity(2 * (height as usize + 1) + width as usize),
            camera_focus: Vec2::new(CAMERA_FOCUS.0, CAMERA_FOCUS.1),
            options,
        };

        for x in 0..width {
            let column_x = x as f32 * x_offset;
            let feeder = is_feeder_column(x as i32);

            if feeder {
                // Extra bottom tile
                layout.put_cell(x, -1, rng);

                let spawner_id = SpawnerId(layout.spawners.len() as u32);
                let origin = Vec2::new(column_x, (height as f32 + SPAWNER_LIFT_ROWS) * y_offset);
                layout.spawners.push(Spawner::new(spawner_id, x, origin));

                let index = layout.buckets.len() as u32;
                let pos = Vec2::new(column_x, -y_offset * BUCKET_DEPTH_ROWS);
                let mut bucket = Bucket::new(BucketId(index), index, x, pos);
                bucket.init(index, options.bucket_sprite_count);
                layout.buckets.push(bucket);
            } else {
                layout.fixtures.push(Fixture::Floor {
                    column: x,
                    pos: Vec2::new(column_x, -y_offset),
                });
                layout.fixtures.push(Fixture::Ceiling {
                    column: x,
                    pos: Vec2::new(column_x, height as f32 * y_offset),
                });
            }

            for y in 0..height as i32 {
                layout.put_cell(x, y, rng);
            }
        }

        for side in [WallSide::Left, WallSide::Right] {
            let wall_x = match side {
                WallSide::Left => LEFT_WALL_X,
                WallSide::Right => width as f32 * x_offset - RIGHT_WALL_INSET,
            };
            for y in 0..=height {
                let pos = Vec2::new(wall_x, y as f32 * y_offset - WALL_DROP);
                layout.fixtures.push(Fixture::Wall { side, pos });
            }
        }

        if options.center_camera {
            layout.camera_focus = layout.bounds_center();
        }

        log::info!(
            "Generated {}x{} board: {} cells, {} buckets, {} spawners",
            width,
            height,
            layout.cells.len(),
            layout.buckets.len(),
            layout.spawners.len()
        );

        layout
    }

    fn put_cell(&mut self, column: u32, row: i32, rng: &mut impl Rng) {
        let steps = rng.random_range(0..HEX_EDGES);
        let shape = CellShape::from_index(rng.random_range(0..CellShape::COUNT));
        let id = CellId(self.cells.len() as u32);
        let pos = self.cell_position(column as i32, row);
        self.cells.push(Cell::new(id, column, row, pos, shape, steps));
    }

    /// World position of a grid coordinate
    pub fn cell_position(&self, column: i32, row: i32) -> Vec2 {
        let lift = if is_feeder_column(column) { self.radius } else { 0.0 };
        Vec2::new(column as f32 * self.x_offset, row as f32 * self.y_offset + lift)
    }

    /// Lowest row present in a column
    #[inline]
    pub fn min_row(column: i32) -> i32 {
        if is_feeder_column(column) { -1 } else { 0 }
    }

    /// Arena index of the cell at a coordinate
    pub fn cell_id_at(&self, coord: GridCoord) -> Option<CellId> {
        let GridCoord { column, row } = coord;
        if column < 0 || column >= self.width as i32 {
            return None;
        }
        if row < Self::min_row(column) || row >= self.height as i32 {
            return None;
        }
        // Every feeder column before this one holds one extra cell
        let before = column as u32 * self.height + (column as u32).div_ceil(2);
        let within = (row - Self::min_row(column)) as u32;
        Some(CellId(before + within))
    }

    pub fn cell_at(&self, coord: GridCoord) -> Option<&Cell> {
        self.cell_id_at(coord).and_then(|id| self.cell(id))
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.0 as usize)
    }

    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(id.0 as usize)
    }

    pub fn bucket(&self, id: BucketId) -> Option<&Bucket> {
        self.buckets.get(id.0 as usize)
    }

    pub fn bucket_mut(&mut self, id: BucketId) -> Option<&mut Bucket> {
        self.buckets.get_mut(id.0 as usize)
    }

    pub fn spawner(&self, id: SpawnerId) -> Option<&Spawner> {
        self.spawners.get(id.0 as usize)
    }

    /// Bucket under a feeder column
    pub fn bucket_in_column(&self, column: u32) -> Option<BucketId> {
        self.buckets.iter().find(|b| b.column == column).map(|b| b.id)
    }

    /// Cell a marble dropped by `spawner` lands on first
    pub fn top_cell_below(&self, spawner: SpawnerId) -> Option<CellId> {
        let spawner = self.spawner(spawner)?;
        let top = self.height as i32 - 1;
        self.cell_id_at(GridCoord::new(spawner.column as i32, top))
    }

    pub fn total_buckets(&self) -> usize {
        self.buckets.len()
    }

    pub fn caught_count(&self) -> usize {
        self.buckets.iter().filter(|b| b.has_caught()).count()
    }

    /// Center of the cell grid's extents
    pub fn bounds_center(&self) -> Vec2 {
        if self.cells.is_empty() {
            return Vec2::ZERO;
        }
        let (min, max) = self.cells.iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(min, max), c| (min.min(c.pos), max.max(c.pos)),
        );
        (min + max) * 0.5
    }
}
