//! Hex Marbles - a hexagonal marble-routing puzzle
//!
//! Core modules:
//! - `sim`: Deterministic board model (cells, layout generation, buckets,
//!   spawners, marbles, routing, game controller)
//! - `events`: Inbound host events and outbound presentation commands
//! - `config`: Board configuration and validation
//! - `settings`: Player preferences (audio)

pub mod config;
pub mod events;
pub mod settings;
pub mod sim;

pub use config::{BoardConfig, ConfigError};
pub use events::{BoardEvent, Command};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Board dimension limits (inclusive)
    pub const MIN_BOARD_DIM: u32 = 1;
    pub const MAX_BOARD_DIM: u32 = 20;

    /// Cell radius limits (inclusive)
    pub const MIN_CELL_RADIUS: f32 = 0.1;
    pub const MAX_CELL_RADIUS: f32 = 2.0;

    /// Default board
    pub const DEFAULT_WIDTH: u32 = 10;
    pub const DEFAULT_HEIGHT: u32 = 10;
    pub const DEFAULT_RADIUS: f32 = 0.5;

    /// Number of bucket sprite variants the presentation layer ships
    pub const DEFAULT_BUCKET_SPRITES: u32 = 4;

    /// Hex edges per cell, and the angle between neighbouring edges
    pub const HEX_EDGES: u8 = 6;
    pub const HEX_STEP_DEG: f32 = 60.0;

    /// Fixed camera focal point (tuned for a 10x10 board at radius 0.5)
    pub const CAMERA_FOCUS: (f32, f32) = (3.015, 2.1);

    /// Wall segment x positions relative to the board edges
    pub const LEFT_WALL_X: f32 = -0.525;
    pub const RIGHT_WALL_INSET: f32 = 0.345;
    /// Wall segments sit this far below each row line
    pub const WALL_DROP: f32 = 0.5;

    /// Bucket depth below the board, in multiples of the row spacing
    pub const BUCKET_DEPTH_ROWS: f32 = 1.9;
    /// Spawners float half a row above the top row
    pub const SPAWNER_LIFT_ROWS: f32 = 0.5;

    /// Jam entry page opened from the title screen
    pub const EXTERNAL_PAGE_URL: &str =
        "http://ludumdare.com/compo/ludum-dare-36/?action=preview&uid=1049";
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

/// Snap an animated angle to the nearest hex orientation, in [0, 360)
#[inline]
pub fn snap_to_hex_angle(angle: f32) -> f32 {
    normalize_degrees((angle / consts::HEX_STEP_DEG).round() * consts::HEX_STEP_DEG)
}

/// Format elapsed play time as `M:SS.ss`
pub fn format_play_time(seconds: f32) -> String {
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor() as u32;
    let rest = seconds - minutes as f32 * 60.0;
    format!("{}:{:05.2}", minutes, rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_to_hex_angle() {
        assert_eq!(snap_to_hex_angle(47.0), 60.0);
        assert_eq!(snap_to_hex_angle(29.0), 0.0);
        assert_eq!(snap_to_hex_angle(359.0), 0.0);
        assert_eq!(snap_to_hex_angle(-61.0), 300.0);
        assert_eq!(snap_to_hex_angle(182.5), 180.0);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(420.0), 60.0);
        assert_eq!(normalize_degrees(-60.0), 300.0);
        assert_eq!(normalize_degrees(0.0), 0.0);
    }

    #[test]
    fn test_format_play_time() {
        assert_eq!(format_play_time(0.0), "0:00.00");
        assert_eq!(format_play_time(5.5), "0:05.50");
        assert_eq!(format_play_time(75.25), "1:15.25");
        assert_eq!(format_play_time(600.0), "10:00.00");
    }
}
