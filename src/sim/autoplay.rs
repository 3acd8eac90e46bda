//! Headless demo player
//!
//! Plays a session by acting as the host: it routes the marble through the
//! cell graph with [`route`](super::route), turns that into trigger and
//! animation events, and rotates whichever cell the marble gets stuck on.
//! Time advances by a fixed amount per cell crossed and per rotation.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::board::GameBoard;
use super::entities::BucketId;
use super::route::{RouteOutcome, trace_from_spawner};
use crate::events::{AnimationDone, BoardEvent, PointerButton, Region};

/// Simulated seconds for a marble to cross one cell
pub const CELL_TRAVERSAL_SECS: f32 = 0.2;
/// Simulated seconds for one rotation animation
pub const ROTATION_SECS: f32 = 0.35;
/// Simulated seconds for the catch animation
pub const CATCH_SECS: f32 = 0.6;

/// Limits for one autoplay session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoplayLimits {
    /// Drops (spawn to landing) before giving up
    pub max_drops: u32,
    /// Consecutive rotations while stuck before giving up
    pub max_stuck_rotations: u32,
}

impl Default for AutoplayLimits {
    fn default() -> Self {
        Self {
            max_drops: 500,
            max_stuck_rotations: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AutoplayOutcome {
    Won { elapsed: f32 },
    /// Too many drops without filling every bucket
    OutOfDrops,
    /// The marble stayed stuck through every rotation tried
    Jammed,
    /// The board was not in a playable state
    NotRunning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoplayReport {
    pub outcome: AutoplayOutcome,
    pub drops: u32,
    pub rotations: u32,
    pub bucket_landings: u32,
    pub floor_landings: u32,
}

/// Where a routed marble left the board
enum Landing {
    Bucket(BucketId),
    Floor { column: u32 },
}

/// Play the session already started on `board` until it ends or a limit hits
pub fn play(board: &mut GameBoard, limits: AutoplayLimits, rng: &mut impl Rng) -> AutoplayReport {
    let mut report = AutoplayReport {
        outcome: AutoplayOutcome::NotRunning,
        drops: 0,
        rotations: 0,
        bucket_landings: 0,
        floor_landings: 0,
    };

    while board.is_running() {
        if report.drops >= limits.max_drops {
            report.outcome = AutoplayOutcome::OutOfDrops;
            return report;
        }
        let (Some(marble), Some(spawner)) = (board.active_marble(), board.last_spawner()) else {
            log::warn!("Running board has no marble in play");
            return report;
        };
        board.handle(BoardEvent::AnimationComplete(AnimationDone::MarbleAppear(marble)));
        report.drops += 1;

        let mut stuck_rotations = 0;
        let landing = loop {
            let Some(route) = trace_from_spawner(board.layout(), spawner, rng) else {
                log::warn!("Spawner {:?} has no column below it", spawner);
                return report;
            };
            board.update(route.path.len() as f32 * CELL_TRAVERSAL_SECS);

            match route.outcome {
                RouteOutcome::Stuck(cell) => {
                    if stuck_rotations >= limits.max_stuck_rotations {
                        report.outcome = AutoplayOutcome::Jammed;
                        return report;
                    }
                    let button = if rng.random_bool(0.5) {
                        PointerButton::Right
                    } else {
                        PointerButton::Left
                    };
                    board.handle(BoardEvent::PointerClick { cell, button });
                    let Some(target) = board.layout().cell(cell).and_then(|c| c.rotation_target_deg()) else {
                        report.outcome = AutoplayOutcome::Jammed;
                        return report;
                    };
                    board.update(ROTATION_SECS);
                    board.handle(BoardEvent::AnimationComplete(AnimationDone::CellRotation {
                        cell,
                        angle_deg: target,
                    }));
                    stuck_rotations += 1;
                    report.rotations += 1;
                }
                RouteOutcome::Bucket(bucket) => break Landing::Bucket(bucket),
                RouteOutcome::Floor { column } => break Landing::Floor { column },
            }
        };

        match landing {
            Landing::Bucket(bucket) => {
                let full = board.layout().bucket(bucket).is_some_and(|b| b.has_caught());
                if full {
                    // A lowered bucket lets the marble drop through to the floor
                    let column = board.layout().bucket(bucket).map_or(0, |b| b.column);
                    report.floor_landings += 1;
                    board.handle(BoardEvent::TriggerEnter { region: Region::Floor { column }, marble });
                } else {
                    report.bucket_landings += 1;
                    board.handle(BoardEvent::TriggerEnter { region: Region::Bucket(bucket), marble });
                    board.update(CATCH_SECS);
                    board.handle(BoardEvent::AnimationComplete(AnimationDone::BucketCatch(bucket)));
                }
            }
            Landing::Floor { column } => {
                report.floor_landings += 1;
                board.handle(BoardEvent::TriggerEnter { region: Region::Floor { column }, marble });
            }
        }
    }

    if board.session().won {
        report.outcome = AutoplayOutcome::Won { elapsed: board.elapsed() };
    }
    report
}
