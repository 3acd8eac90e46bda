//! Rotatable routing cells
//!
//! Cells are flat-topped hexagons. Edge `i` faces `30° + 60°·i`, so the six
//! edges run counter-clockwise NE, N, NW, SW, S, SE. A cell's shape is a
//! static set of channels; each channel is a bitmask of edges that are joined
//! to each other. Rotating a cell by one step counter-clockwise moves every
//! opening from edge `i` to edge `i + 1`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{HEX_EDGES, HEX_STEP_DEG};
use crate::{normalize_degrees, snap_to_hex_angle};

/// Stable cell identifier (index into the layout's cell arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u32);

/// One of the six edges of a flat-topped hex cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HexEdge {
    NorthEast,
    North,
    NorthWest,
    SouthWest,
    South,
    SouthEast,
}

impl HexEdge {
    pub const ALL: [HexEdge; 6] = [
        HexEdge::NorthEast,
        HexEdge::North,
        HexEdge::NorthWest,
        HexEdge::SouthWest,
        HexEdge::South,
        HexEdge::SouthEast,
    ];

    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Self {
        Self::ALL[(index % HEX_EDGES) as usize]
    }

    #[inline]
    pub fn bit(self) -> u8 {
        1 << self.index()
    }

    /// The edge on the neighbouring cell that touches this one
    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// Direction of the edge's outward normal, in degrees
    pub fn angle_deg(self) -> f32 {
        30.0 + HEX_STEP_DEG * self.index() as f32
    }

    /// Edges a falling marble can leave through
    pub fn is_downward(self) -> bool {
        matches!(self, HexEdge::SouthWest | HexEdge::South | HexEdge::SouthEast)
    }
}

/// Rotate an edge mask by `steps` counter-clockwise
#[inline]
pub fn rotate_mask(mask: u8, steps: u8) -> u8 {
    let steps = steps % HEX_EDGES;
    let mask = mask & 0x3F;
    ((mask << steps) | (mask >> (HEX_EDGES - steps))) & 0x3F
}

/// Connectivity shapes. Order matters: shapes are drawn by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellShape {
    L,
    X,
    Straight,
    YLeft,
    YRight,
    CrowFoot,
    ThreeWay,
    DeadEnd,
}

const NE: u8 = 1 << 0;
const N: u8 = 1 << 1;
const NW: u8 = 1 << 2;
const SW: u8 = 1 << 3;
const S: u8 = 1 << 4;
const SE: u8 = 1 << 5;

impl CellShape {
    pub const COUNT: usize = 8;

    pub const ALL: [CellShape; Self::COUNT] = [
        CellShape::L,
        CellShape::X,
        CellShape::Straight,
        CellShape::YLeft,
        CellShape::YRight,
        CellShape::CrowFoot,
        CellShape::ThreeWay,
        CellShape::DeadEnd,
    ];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::COUNT]
    }

    /// Channels in the unrotated orientation
    pub fn channels(self) -> &'static [u8] {
        match self {
            CellShape::L => &[N | SE],
            // Two independent crossing paths
            CellShape::X => &[N | S, NE | SW],
            CellShape::Straight => &[N | S],
            CellShape::YLeft => &[S | N | NW],
            CellShape::YRight => &[S | N | NE],
            CellShape::CrowFoot => &[N | SW | S | SE],
            CellShape::ThreeWay => &[N | SW | SE],
            CellShape::DeadEnd => &[N],
        }
    }

    /// All open edges in the unrotated orientation
    pub fn openings(self) -> u8 {
        self.channels().iter().fold(0, |acc, c| acc | c)
    }
}

/// Rotation state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationPhase {
    Idle,
    /// Rotation animation in flight
    Rotating { clockwise: bool },
}

/// A board tile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    /// Grid coordinates (column, row); row -1 is the extra bottom cell
    pub column: u32,
    pub row: i32,
    /// World position of the cell center
    pub pos: Vec2,
    pub shape: CellShape,
    /// Logical orientation in 60° counter-clockwise steps, always in [0, 5]
    rotation_steps: u8,
    /// Visual orientation in degrees, in [0, 360)
    angle_deg: f32,
    phase: RotationPhase,
}

impl Cell {
    pub fn new(id: CellId, column: u32, row: i32, pos: Vec2, shape: CellShape, steps: u8) -> Self {
        let mut cell = Self {
            id,
            column,
            row,
            pos,
            shape,
            rotation_steps: 0,
            angle_deg: 0.0,
            phase: RotationPhase::Idle,
        };
        cell.init(shape);
        cell.set_rotation_steps(steps);
        cell
    }

    /// Replace the shape; orientation and rotation state are reset
    pub fn init(&mut self, shape: CellShape) {
        self.shape = shape;
        self.rotation_steps = 0;
        self.angle_deg = 0.0;
        self.phase = RotationPhase::Idle;
    }

    pub fn set_rotation_steps(&mut self, steps: u8) {
        self.rotation_steps = steps % HEX_EDGES;
        self.angle_deg = self.rotation_steps as f32 * HEX_STEP_DEG;
    }

    #[inline]
    pub fn rotation_steps(&self) -> u8 {
        self.rotation_steps
    }

    #[inline]
    pub fn angle_deg(&self) -> f32 {
        self.angle_deg
    }

    #[inline]
    pub fn phase(&self) -> RotationPhase {
        self.phase
    }

    #[inline]
    pub fn is_rotating(&self) -> bool {
        matches!(self.phase, RotationPhase::Rotating { .. })
    }

    /// Begin a rotation. Returns false (and does nothing) if one is already
    /// in flight.
    pub fn rotate(&mut self, clockwise: bool) -> bool {
        if self.is_rotating() {
            log::debug!("Cell {:?} already rotating", self.id);
            return false;
        }
        log::debug!(
            "Cell {:?} starting {} rotation",
            self.id,
            if clockwise { "CW" } else { "CCW" }
        );
        self.phase = RotationPhase::Rotating { clockwise };
        true
    }

    /// Angle the in-flight animation is heading for
    pub fn rotation_target_deg(&self) -> Option<f32> {
        match self.phase {
            RotationPhase::Idle => None,
            RotationPhase::Rotating { clockwise } => {
                let delta = if clockwise { -HEX_STEP_DEG } else { HEX_STEP_DEG };
                Some(normalize_degrees(self.angle_deg + delta))
            }
        }
    }

    /// Rotation animation finished at `animated_angle` degrees. Snaps to the
    /// nearest 60° and returns the settled angle, or None if the cell was
    /// not rotating.
    pub fn on_rotation_finished(&mut self, animated_angle: f32) -> Option<f32> {
        if !self.is_rotating() {
            log::warn!("Cell {:?} finished a rotation it never started", self.id);
            return None;
        }
        let snapped = snap_to_hex_angle(animated_angle);
        self.angle_deg = snapped;
        self.rotation_steps = ((snapped / HEX_STEP_DEG).round() as u32 % HEX_EDGES as u32) as u8;
        self.phase = RotationPhase::Idle;
        log::debug!("Cell {:?} settled at {}°", self.id, snapped);
        Some(snapped)
    }

    /// Finish the in-flight rotation exactly on its target angle
    pub fn complete_rotation(&mut self) -> Option<f32> {
        let target = self.rotation_target_deg()?;
        self.on_rotation_finished(target)
    }

    /// Channels under the current rotation
    pub fn channels(&self) -> impl Iterator<Item = u8> + '_ {
        self.shape
            .channels()
            .iter()
            .map(move |&c| rotate_mask(c, self.rotation_steps))
    }

    /// Whether `edge` is open under the current rotation
    pub fn is_open(&self, edge: HexEdge) -> bool {
        self.channels().any(|c| c & edge.bit() != 0)
    }

    /// Edges joined to `entry` (excluding `entry` itself). Empty if the
    /// entry edge is closed.
    pub fn connections(&self, entry: HexEdge) -> Vec<HexEdge> {
        let Some(channel) = self.channels().find(|c| c & entry.bit() != 0) else {
            return Vec::new();
        };
        HexEdge::ALL
            .into_iter()
            .filter(|e| *e != entry && channel & e.bit() != 0)
            .collect()
    }
}
