//! Game board controller
//!
//! Owns the layout, the marble pool, the session clock and the RNG. Every
//! host event goes through [`GameBoard::handle`]; every visible consequence
//! is queued as a [`Command`] for the host to drain.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::cell::CellId;
use super::entities::{BucketId, Marble, MarbleId, SpawnerId};
use super::layout::BoardLayout;
use crate::config::{BoardConfig, ConfigError};
use crate::consts::EXTERNAL_PAGE_URL;
use crate::events::{
    Animation, AnimationDone, BoardEvent, Command, Effect, Overlay, PointerButton, Region, TextDisplay,
};
use crate::format_play_time;
use crate::settings::Settings;

/// Play session bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    /// Seconds since `begin_game`
    pub elapsed: f32,
    pub running: bool,
    /// Set once every bucket has caught a marble
    pub won: bool,
}

/// The board controller
#[derive(Debug, Clone)]
pub struct GameBoard {
    config: BoardConfig,
    layout: BoardLayout,
    /// Marble pool, sorted by id
    marbles: Vec<Marble>,
    session: GameSession,
    settings: Settings,
    rng: Pcg32,
    /// Spawner that released the marble currently in play
    last_spawner: Option<SpawnerId>,
    next_marble_id: u32,
    /// Marbles allocated since the last `begin_game`
    marbles_created: u32,
    commands: Vec<Command>,
}

impl GameBoard {
    /// Build the board and show the title screen
    pub fn new(config: BoardConfig) -> Result<Self, ConfigError> {
        Self::with_settings(config, Settings::default())
    }

    pub fn with_settings(config: BoardConfig, settings: Settings) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        log::info!("Board seed: {}", seed);
        let mut rng = Pcg32::seed_from_u64(seed);
        let layout = BoardLayout::from_config(&config, &mut rng);

        let mut board = Self {
            config,
            layout,
            marbles: Vec::new(),
            session: GameSession::default(),
            settings,
            rng,
            last_spawner: None,
            next_marble_id: 1,
            marbles_created: 0,
            commands: Vec::new(),
        };
        board.commands.push(Command::RebuildBoard);
        board.commands.push(Command::SetVolume(board.settings.master_volume));
        board.commands.push(Command::SetMusic(board.settings.music_enabled));
        board.refresh_counter();
        board.refresh_timer();
        board.set_overlay(Overlay::Backdrop, true);
        board.set_overlay(Overlay::BeforePlaying, true);
        board.set_overlay(Overlay::GameOver, false);
        Ok(board)
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    /// Direct layout access for hosts that edit boards in place
    pub fn layout_mut(&mut self) -> &mut BoardLayout {
        &mut self.layout
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.session.running
    }

    pub fn elapsed(&self) -> f32 {
        self.session.elapsed
    }

    pub fn marbles(&self) -> &[Marble] {
        &self.marbles
    }

    pub fn marble(&self, id: MarbleId) -> Option<&Marble> {
        self.marbles.iter().find(|m| m.id == id)
    }

    fn marble_mut(&mut self, id: MarbleId) -> Option<&mut Marble> {
        self.marbles.iter_mut().find(|m| m.id == id)
    }

    /// The marble currently in play, if any
    pub fn active_marble(&self) -> Option<MarbleId> {
        self.marbles.iter().find(|m| m.is_active).map(|m| m.id)
    }

    pub fn last_spawner(&self) -> Option<SpawnerId> {
        self.last_spawner
    }

    pub fn marbles_created(&self) -> u32 {
        self.marbles_created
    }

    pub fn caught_count(&self) -> usize {
        self.layout.caught_count()
    }

    pub fn total_buckets(&self) -> usize {
        self.layout.total_buckets()
    }

    /// Queued commands, oldest first
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Take all queued commands
    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Destroy every marble and build a fresh layout
    pub fn regenerate(&mut self) {
        for marble in self.marbles.drain(..) {
            self.commands.push(Command::DestroyMarbleVisual(marble.id));
        }
        self.last_spawner = None;
        self.layout = BoardLayout::from_config(&self.config, &mut self.rng);
        self.commands.push(Command::RebuildBoard);
    }

    /// Start a new session on a fresh board with one marble in play
    pub fn begin_game(&mut self) {
        self.regenerate();
        self.session = GameSession::default();
        self.marbles_created = 0;

        self.spawn_from_random_spawner(None);
        self.session.running = true;
        log::info!("Game started with {} buckets", self.total_buckets());

        self.set_overlay(Overlay::Backdrop, false);
        self.refresh_counter();
        self.refresh_timer();
    }

    /// Advance the clock by one frame
    pub fn update(&mut self, dt: f32) {
        if !self.session.running {
            return;
        }
        self.session.elapsed += dt;
        self.refresh_timer();
    }

    /// Route a host event to its target
    pub fn handle(&mut self, event: BoardEvent) {
        match event {
            BoardEvent::TriggerEnter { region: Region::Bucket(bucket), marble } => {
                self.on_marble_enter_bucket(bucket, marble);
            }
            BoardEvent::TriggerEnter { region: Region::Floor { .. }, marble } => {
                self.on_ball_reached_bucket(marble);
            }
            BoardEvent::AnimationComplete(AnimationDone::CellRotation { cell, angle_deg }) => {
                self.on_rotation_finished(cell, angle_deg);
            }
            BoardEvent::AnimationComplete(AnimationDone::BucketCatch(bucket)) => {
                self.on_catch_animation_finished(bucket);
            }
            BoardEvent::AnimationComplete(AnimationDone::MarbleAppear(marble)) => {
                self.on_marble_appeared(marble);
            }
            BoardEvent::PointerClick { cell, button } => {
                self.rotate_cell(cell, button == PointerButton::Right);
            }
        }
    }

    /// Start rotating a cell. Returns false if it is already rotating.
    pub fn rotate_cell(&mut self, id: CellId, clockwise: bool) -> bool {
        let Some(cell) = self.layout.cell_mut(id) else {
            log::warn!("Rotate on unknown cell {:?}", id);
            return false;
        };
        if !cell.rotate(clockwise) {
            return false;
        }
        let pos = cell.pos;
        self.commands.push(Command::PlayEffect { effect: Effect::CellRotateSound, pos });
        self.commands
            .push(Command::PlayAnimation(Animation::RotateCell { cell: id, clockwise }));
        true
    }

    /// Rotation animation ended; returns the settled angle
    pub fn on_rotation_finished(&mut self, id: CellId, angle_deg: f32) -> Option<f32> {
        let Some(cell) = self.layout.cell_mut(id) else {
            log::warn!("Rotation finished on unknown cell {:?}", id);
            return None;
        };
        let settled = cell.on_rotation_finished(angle_deg)?;
        let pos = cell.pos;
        self.commands.push(Command::PlayEffect { effect: Effect::CellSettleParticles, pos });
        Some(settled)
    }

    /// A marble touched a bucket's trigger. Returns true if it was caught.
    pub fn on_marble_enter_bucket(&mut self, bucket_id: BucketId, marble_id: MarbleId) -> bool {
        if !self.marble(marble_id).is_some_and(|m| m.is_active) {
            log::warn!("Ignoring bucket {:?} trigger from parked marble {:?}", bucket_id, marble_id);
            return false;
        }
        let Some(bucket) = self.layout.bucket_mut(bucket_id) else {
            log::warn!("Marble entered unknown bucket {:?}", bucket_id);
            return false;
        };
        if !bucket.on_marble_enter(marble_id) {
            return false;
        }
        let pos = bucket.pos;

        // Parked before anyone hears about the catch, so it can be respawned
        if let Some(marble) = self.marble_mut(marble_id) {
            marble.deactivate();
        }
        self.commands.push(Command::SetMarbleVisible { marble: marble_id, visible: false });
        self.commands.push(Command::PlayEffect { effect: Effect::BucketCatchSound, pos });
        self.commands.push(Command::PlayAnimation(Animation::BucketCatch(bucket_id)));
        true
    }

    /// Bucket finished lowering; reports the catch to the board
    pub fn on_catch_animation_finished(&mut self, bucket_id: BucketId) {
        let Some(bucket) = self.layout.bucket_mut(bucket_id) else {
            log::warn!("Catch animation finished on unknown bucket {:?}", bucket_id);
            return;
        };
        let Some(marble) = bucket.on_catch_animation_finished() else {
            log::warn!("Bucket {} finished a catch it never made", bucket.index);
            return;
        };
        let pos = bucket.pos;
        self.commands.push(Command::PlayEffect { effect: Effect::BucketParticles, pos });
        self.on_ball_reached_bucket(marble);
    }

    /// A marble reached the bottom, in a bucket or on the floor
    pub fn on_ball_reached_bucket(&mut self, marble: MarbleId) {
        if !self.session.running {
            log::warn!("Marble {:?} arrived after the game ended", marble);
            return;
        }

        let caught = self.caught_count();
        let total = self.total_buckets();
        self.refresh_counter();

        if caught == total {
            self.session.running = false;
            self.session.won = true;
            log::info!("All {} buckets filled in {}", total, format_play_time(self.session.elapsed));
            self.commands.push(Command::SetText {
                display: TextDisplay::WinTime,
                text: format!("You have won in {}!", format_play_time(self.session.elapsed)),
            });
            self.set_overlay(Overlay::Backdrop, true);
            self.set_overlay(Overlay::BeforePlaying, false);
            self.set_overlay(Overlay::GameOver, true);
        } else {
            log::debug!("{}/{} buckets filled", caught, total);
            self.spawn_from_random_spawner(Some(marble));
        }
    }

    /// Appear effect done; let the marble fall
    pub fn on_marble_appeared(&mut self, id: MarbleId) {
        match self.marble_mut(id) {
            Some(marble) if marble.is_active => marble.make_kinematic(false),
            Some(_) => log::warn!("Marble {:?} appeared while inactive", id),
            None => log::warn!("Appear finished for unknown marble {:?}", id),
        }
    }

    pub fn toggle_audio(&mut self) {
        let volume = self.settings.toggle_audio();
        self.commands.push(Command::SetVolume(volume));
    }

    pub fn open_external_page(&mut self) {
        self.commands.push(Command::OpenUrl(EXTERNAL_PAGE_URL.to_string()));
    }

    /// Drop a marble from a uniformly random spawner, reusing `existing`
    fn spawn_from_random_spawner(&mut self, existing: Option<MarbleId>) -> Option<MarbleId> {
        if self.layout.spawners.is_empty() {
            log::warn!("Board has no spawners");
            return None;
        }
        let idx = self.rng.random_range(0..self.layout.spawners.len());
        let spawner = &self.layout.spawners[idx];
        let next_id = &mut self.next_marble_id;
        let (marble, created) = spawner.spawn_ball(&mut self.marbles, existing, || {
            let id = MarbleId(*next_id);
            *next_id += 1;
            id
        });
        let spawner_id = spawner.id;
        self.last_spawner = Some(spawner_id);

        if created {
            self.marbles_created += 1;
            self.commands.push(Command::SpawnMarbleVisual(marble));
        }
        self.commands.push(Command::SetMarbleVisible { marble, visible: true });
        self.commands.push(Command::PlayAnimation(Animation::MarbleAppear(marble)));
        log::debug!("Marble {:?} spawned at spawner {:?}", marble, spawner_id);
        Some(marble)
    }

    fn refresh_timer(&mut self) {
        self.commands.push(Command::SetText {
            display: TextDisplay::PlayTime,
            text: format_play_time(self.session.elapsed),
        });
    }

    fn refresh_counter(&mut self) {
        self.commands.push(Command::SetText {
            display: TextDisplay::CaughtCounter,
            text: format!("{}/{}", self.caught_count(), self.total_buckets()),
        });
    }

    fn set_overlay(&mut self, overlay: Overlay, visible: bool) {
        self.commands.push(Command::SetOverlay { overlay, visible });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(width: u32, height: u32) -> GameBoard {
        GameBoard::new(BoardConfig::new(width, height, 0.5).with_seed(1234)).unwrap()
    }

    /// Catch the active marble in `bucket` and finish the animation
    fn deliver(board: &mut GameBoard, bucket: BucketId) {
        let marble = board.active_marble().unwrap();
        board.handle(BoardEvent::TriggerEnter { region: Region::Bucket(bucket), marble });
        board.handle(BoardEvent::AnimationComplete(AnimationDone::BucketCatch(bucket)));
    }

    #[test]
    fn test_new_shows_title_screen() {
        let mut b = board(4, 4);
        assert!(!b.is_running());
        let commands = b.drain_commands();
        assert!(commands.contains(&Command::SetOverlay { overlay: Overlay::BeforePlaying, visible: true }));
        assert!(commands.contains(&Command::SetText {
            display: TextDisplay::CaughtCounter,
            text: "0/2".to_string()
        }));
        assert!(b.commands().is_empty());
    }

    #[test]
    fn test_settings_reach_the_host() {
        let settings = Settings {
            master_volume: 0.3,
            music_enabled: false,
        };
        let mut b = GameBoard::with_settings(BoardConfig::new(2, 2, 0.5).with_seed(1), settings).unwrap();
        let commands = b.drain_commands();
        assert!(commands.contains(&Command::SetVolume(0.3)));
        assert!(commands.contains(&Command::SetMusic(false)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(GameBoard::new(BoardConfig::new(0, 4, 0.5)).is_err());
    }

    #[test]
    fn test_begin_game_spawns_one_marble() {
        let mut b = board(2, 2);
        b.begin_game();
        assert!(b.is_running());
        assert_eq!(b.elapsed(), 0.0);
        assert_eq!(b.marbles().len(), 1);
        assert_eq!(b.marbles_created(), 1);

        let marble = &b.marbles()[0];
        assert!(marble.is_active);
        assert!(marble.is_kinematic);
        assert_eq!(marble.pos, b.layout().spawners[0].origin);
        assert_eq!(b.last_spawner(), Some(SpawnerId(0)));
    }

    #[test]
    fn test_appear_releases_marble() {
        let mut b = board(2, 2);
        b.begin_game();
        let m = b.active_marble().unwrap();
        b.handle(BoardEvent::AnimationComplete(AnimationDone::MarbleAppear(m)));
        assert!(b.marble(m).unwrap().is_falling());
    }

    #[test]
    fn test_single_bucket_wins() {
        let mut b = board(2, 2);
        b.begin_game();
        b.update(1.5);
        deliver(&mut b, BucketId(0));

        assert!(!b.is_running());
        assert!(b.session().won);
        let commands = b.drain_commands();
        assert!(commands.contains(&Command::SetText {
            display: TextDisplay::WinTime,
            text: "You have won in 0:01.50!".to_string()
        }));
        assert!(commands.contains(&Command::SetOverlay { overlay: Overlay::GameOver, visible: true }));
    }

    #[test]
    fn test_clock_only_runs_while_playing() {
        let mut b = board(2, 2);
        b.update(3.0);
        assert_eq!(b.elapsed(), 0.0);
        b.begin_game();
        b.update(0.25);
        b.update(0.25);
        assert!((b.elapsed() - 0.5).abs() < 1e-6);

        deliver(&mut b, BucketId(0));
        b.update(10.0);
        assert!((b.elapsed() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_first_catch_respawns_same_marble() {
        let mut b = board(4, 3);
        b.begin_game();
        let first = b.active_marble().unwrap();
        deliver(&mut b, BucketId(0));

        assert!(b.is_running());
        assert_eq!(b.caught_count(), 1);
        assert_eq!(b.active_marble(), Some(first));
        assert_eq!(b.marbles_created(), 1);
        let origin = b.marble(first).unwrap().pos;
        assert!(b.layout().spawners.iter().any(|s| s.origin == origin));
    }

    #[test]
    fn test_full_bucket_ignores_second_marble() {
        let mut b = board(4, 3);
        b.begin_game();
        let marble = b.active_marble().unwrap();
        assert!(b.on_marble_enter_bucket(BucketId(1), marble));
        assert!(!b.on_marble_enter_bucket(BucketId(1), marble));
        assert!(!b.marble(marble).unwrap().is_active);

        b.on_catch_animation_finished(BucketId(1));
        b.on_catch_animation_finished(BucketId(1));
        assert_eq!(b.caught_count(), 1);
        assert_eq!(b.marbles_created(), 1);
        assert!(b.is_running());
    }

    #[test]
    fn test_parked_or_unknown_marble_cannot_fill_bucket() {
        let mut b = board(4, 3);
        b.begin_game();
        let marble = b.active_marble().unwrap();
        b.marble_mut(marble).unwrap().deactivate();
        assert!(!b.on_marble_enter_bucket(BucketId(0), marble));
        assert!(!b.on_marble_enter_bucket(BucketId(0), MarbleId(999)));
        assert_eq!(b.caught_count(), 0);

        b.on_catch_animation_finished(BucketId(0));
        assert_eq!(b.marbles_created(), 1);
        assert_eq!(b.marbles().len(), 1);
    }

    #[test]
    fn test_floor_recycles_without_filling() {
        let mut b = board(4, 3);
        b.begin_game();
        let marble = b.active_marble().unwrap();
        b.handle(BoardEvent::TriggerEnter { region: Region::Floor { column: 1 }, marble });
        assert_eq!(b.caught_count(), 0);
        assert!(b.is_running());
        assert_eq!(b.active_marble(), Some(marble));
        assert_eq!(b.marbles_created(), 1);
    }

    #[test]
    fn test_click_rotates_cell() {
        let mut b = board(3, 3);
        let cell = CellId(4);
        let before = b.layout().cell(cell).unwrap().rotation_steps();

        b.handle(BoardEvent::PointerClick { cell, button: PointerButton::Right });
        b.handle(BoardEvent::PointerClick { cell, button: PointerButton::Left });
        assert!(b.layout().cell(cell).unwrap().is_rotating());

        let target = b.layout().cell(cell).unwrap().rotation_target_deg().unwrap();
        b.handle(BoardEvent::AnimationComplete(AnimationDone::CellRotation { cell, angle_deg: target + 3.0 }));
        let after = b.layout().cell(cell).unwrap();
        assert!(!after.is_rotating());
        assert_eq!(after.rotation_steps(), (before + 5) % 6);
    }

    #[test]
    fn test_begin_game_resets_everything() {
        let mut b = board(4, 3);
        b.begin_game();
        deliver(&mut b, BucketId(0));
        b.update(2.0);

        b.begin_game();
        assert_eq!(b.caught_count(), 0);
        assert_eq!(b.elapsed(), 0.0);
        assert_eq!(b.marbles().len(), 1);
        assert_eq!(b.marbles_created(), 1);
        assert!(b.is_running());
    }

    #[test]
    fn test_toggle_audio_and_external_page() {
        let mut b = board(2, 2);
        b.drain_commands();
        b.toggle_audio();
        b.open_external_page();
        assert_eq!(
            b.drain_commands(),
            vec![Command::SetVolume(0.0), Command::OpenUrl(EXTERNAL_PAGE_URL.to_string())]
        );
    }
}
