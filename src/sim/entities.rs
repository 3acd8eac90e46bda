//! Buckets, spawners, marbles and static boundary fixtures
//!
//! Entities never hold references to each other or to the board. They refer
//! to one another by id and return what happened so the controller can route
//! the consequences.

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpawnerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarbleId(pub u32);

/// Terminal receptacle at the bottom of a feeder column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub id: BucketId,
    /// Sequential index in column order
    pub index: u32,
    pub column: u32,
    pub pos: Vec2,
    /// Visual variant, purely cosmetic
    pub sprite: u32,
    has_caught: bool,
    /// Marble held between the catch and the end of the catch animation
    caught_marble: Option<MarbleId>,
}

impl Bucket {
    pub fn new(id: BucketId, index: u32, column: u32, pos: Vec2) -> Self {
        Self {
            id,
            index,
            column,
            pos,
            sprite: 0,
            has_caught: false,
            caught_marble: None,
        }
    }

    /// Assign the visual variant
    pub fn init(&mut self, sprite_index: u32, sprite_count: u32) {
        self.sprite = sprite_index % sprite_count.max(1);
    }

    #[inline]
    pub fn has_caught(&self) -> bool {
        self.has_caught
    }

    /// A marble entered the bucket's trigger. Returns true if this bucket
    /// caught it; the caller must deactivate the marble.
    pub fn on_marble_enter(&mut self, marble: MarbleId) -> bool {
        if self.has_caught {
            log::debug!("Bucket {} already full, ignoring {:?}", self.index, marble);
            return false;
        }
        self.has_caught = true;
        self.caught_marble = Some(marble);
        true
    }

    /// Catch animation finished. Yields the caught marble exactly once.
    pub fn on_catch_animation_finished(&mut self) -> Option<MarbleId> {
        self.caught_marble.take()
    }
}

/// Fixed marble injection point above a feeder column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spawner {
    pub id: SpawnerId,
    pub column: u32,
    pub origin: Vec2,
}

impl Spawner {
    pub fn new(id: SpawnerId, column: u32, origin: Vec2) -> Self {
        Self { id, column, origin }
    }

    /// Place a marble at the origin: reuse `existing` if given, otherwise
    /// allocate a new one with `next_id`. Returns the spawned marble and
    /// whether it was freshly created.
    pub fn spawn_ball(
        &self,
        marbles: &mut Vec<Marble>,
        existing: Option<MarbleId>,
        next_id: impl FnOnce() -> MarbleId,
    ) -> (MarbleId, bool) {
        let reused = existing.and_then(|id| marbles.iter().position(|m| m.id == id));
        let (idx, created) = match reused {
            Some(idx) => (idx, false),
            None => {
                if let Some(id) = existing {
                    log::warn!("Marble {:?} no longer exists, allocating a new one", id);
                }
                marbles.push(Marble::new(next_id()));
                (marbles.len() - 1, true)
            }
        };
        let marble = &mut marbles[idx];
        marble.appear_at(self.origin);
        (marble.id, created)
    }
}

/// A falling ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marble {
    pub id: MarbleId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// True while parked (no free motion)
    pub is_kinematic: bool,
    pub is_active: bool,
}

impl Marble {
    pub fn new(id: MarbleId) -> Self {
        Self {
            id,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            is_kinematic: true,
            is_active: false,
        }
    }

    /// Activate, park and move to `pos`. Free fall resumes once the appear
    /// animation completes.
    pub fn appear_at(&mut self, pos: Vec2) {
        self.is_active = true;
        self.is_kinematic = true;
        self.vel = Vec2::ZERO;
        self.pos = pos;
    }

    pub fn make_kinematic(&mut self, kinematic: bool) {
        self.is_kinematic = kinematic;
    }

    /// Remove from the active simulation, keeping the instance for reuse
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.is_kinematic = true;
        self.vel = Vec2::ZERO;
    }

    /// Active and released to physics
    pub fn is_falling(&self) -> bool {
        self.is_active && !self.is_kinematic
    }
}

/// Which side a wall segment bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallSide {
    Left,
    Right,
}

/// Stateless boundary pieces
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Fixture {
    Wall { side: WallSide, pos: Vec2 },
    Floor { column: u32, pos: Vec2 },
    Ceiling { column: u32, pos: Vec2 },
}

impl Fixture {
    pub fn pos(&self) -> Vec2 {
        match *self {
            Fixture::Wall { pos, .. } | Fixture::Floor { pos, .. } | Fixture::Ceiling { pos, .. } => pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_catches_once() {
        let mut bucket = Bucket::new(BucketId(0), 0, 0, Vec2::ZERO);
        assert!(bucket.on_marble_enter(MarbleId(1)));
        assert!(!bucket.on_marble_enter(MarbleId(1)));
        assert!(!bucket.on_marble_enter(MarbleId(2)));
        assert!(bucket.has_caught());

        assert_eq!(bucket.on_catch_animation_finished(), Some(MarbleId(1)));
        assert_eq!(bucket.on_catch_animation_finished(), None);
    }

    #[test]
    fn test_bucket_sprite_wraps() {
        let mut bucket = Bucket::new(BucketId(5), 5, 10, Vec2::ZERO);
        bucket.init(5, 4);
        assert_eq!(bucket.sprite, 1);
        bucket.init(3, 0);
        assert_eq!(bucket.sprite, 0);
    }

    #[test]
    fn test_spawn_reuses_existing_marble() {
        let spawner = Spawner::new(SpawnerId(0), 0, Vec2::new(1.0, 5.0));
        let mut marbles = vec![Marble::new(MarbleId(7))];
        marbles[0].pos = Vec2::new(3.0, -2.0);
        marbles[0].vel = Vec2::new(0.0, -4.0);
        marbles[0].deactivate();

        let (id, created) = spawner.spawn_ball(&mut marbles, Some(MarbleId(7)), || MarbleId(99));
        assert_eq!(id, MarbleId(7));
        assert!(!created);
        assert_eq!(marbles.len(), 1);
        assert!(marbles[0].is_active);
        assert!(marbles[0].is_kinematic);
        assert_eq!(marbles[0].pos, Vec2::new(1.0, 5.0));
        assert_eq!(marbles[0].vel, Vec2::ZERO);
    }

    #[test]
    fn test_spawn_allocates_when_none_given() {
        let spawner = Spawner::new(SpawnerId(0), 0, Vec2::new(1.0, 5.0));
        let mut marbles = Vec::new();
        let (id, created) = spawner.spawn_ball(&mut marbles, None, || MarbleId(3));
        assert_eq!(id, MarbleId(3));
        assert!(created);
        assert_eq!(marbles.len(), 1);
        assert!(!marbles[0].is_falling());

        marbles[0].make_kinematic(false);
        assert!(marbles[0].is_falling());
    }
}
