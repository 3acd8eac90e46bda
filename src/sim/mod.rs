//! Deterministic board simulation
//!
//! All gameplay logic lives here. This module must stay host-agnostic:
//! - Seeded RNG only
//! - Entities addressed by stable ids
//! - No rendering, audio or physics dependencies

pub mod autoplay;
pub mod board;
pub mod cell;
pub mod entities;
pub mod layout;
pub mod route;

pub use autoplay::{AutoplayLimits, AutoplayOutcome, AutoplayReport};
pub use board::{GameBoard, GameSession};
pub use cell::{Cell, CellId, CellShape, HexEdge, RotationPhase};
pub use entities::{Bucket, BucketId, Fixture, Marble, MarbleId, Spawner, SpawnerId, WallSide};
pub use layout::{BoardLayout, GridCoord, feeder_count, is_feeder_column, neighbour};
pub use route::{Route, RouteOutcome, trace_from, trace_from_spawner};
