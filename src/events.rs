//! Host boundary
//!
//! The board never talks to a renderer, mixer or physics engine directly.
//! Hosts feed it [`BoardEvent`]s (collisions, finished animations, clicks)
//! and drain [`Command`]s telling them what to show and play.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::{BucketId, CellId, MarbleId};

/// A trigger volume a marble can enter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    Bucket(BucketId),
    /// The floor strip under a plain column
    Floor { column: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    Left,
    Right,
}

/// Animations whose completion the board waits for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AnimationDone {
    /// Cell rotation ended with the cell visually at `angle_deg`
    CellRotation { cell: CellId, angle_deg: f32 },
    /// Bucket finished lowering after a catch
    BucketCatch(BucketId),
    /// Marble finished its appear effect at a spawner
    MarbleAppear(MarbleId),
}

/// Inbound events from the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoardEvent {
    TriggerEnter { region: Region, marble: MarbleId },
    AnimationComplete(AnimationDone),
    PointerClick { cell: CellId, button: PointerButton },
}

/// Fire-and-forget effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    CellRotateSound,
    CellSettleParticles,
    BucketCatchSound,
    BucketParticles,
}

/// Animations the host should start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Animation {
    RotateCell { cell: CellId, clockwise: bool },
    BucketCatch(BucketId),
    MarbleAppear(MarbleId),
}

/// Text displays on the HUD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextDisplay {
    /// Running clock, `M:SS.ss`
    PlayTime,
    /// Filled buckets, `caught/total`
    CaughtCounter,
    /// Message on the game over screen
    WinTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Overlay {
    /// Dim layer behind the menus
    Backdrop,
    /// Title screen with the start button
    BeforePlaying,
    GameOver,
}

/// Outbound commands to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    PlayEffect { effect: Effect, pos: Vec2 },
    PlayAnimation(Animation),
    /// The layout was rebuilt; drop every board visual and recreate them
    RebuildBoard,
    SpawnMarbleVisual(MarbleId),
    DestroyMarbleVisual(MarbleId),
    SetMarbleVisible { marble: MarbleId, visible: bool },
    SetText { display: TextDisplay, text: String },
    SetOverlay { overlay: Overlay, visible: bool },
    SetVolume(f32),
    /// Start or stop the background music
    SetMusic(bool),
    OpenUrl(String),
}
