#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Shadow Defend simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing player intents and clock ticks, the world executes those
//! commands via its `apply` entry point, and then reports [`Event`] values
//! describing what changed. Presentation layers read immutable snapshots
//! ([`SlicerSnapshot`], [`DefenseSnapshot`], [`OrdnanceSnapshot`]) once per
//! frame and never mutate the simulation directly.

mod geometry;
mod kinds;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use geometry::{Point, Rect};
pub use kinds::{DefenseKind, DefenseProfile, SlicerKind, SlicerStats, UnknownKind};

/// Number of simulation ticks per second of schedule time.
pub const TICK_RATE: u32 = 60;

/// Distance between consecutive route samples.
pub const ROUTE_SAMPLE_SPACING: f64 = 0.25;

/// Route samples per unit of distance.
pub const SAMPLES_PER_UNIT: f64 = 1.0 / ROUTE_SAMPLE_SPACING;

/// Player-facing phase of the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Waiting for the player to start the next wave.
    AwaitingStart,
    /// A purchased defense is waiting to be positioned.
    Placing,
    /// Units of the current wave are on the field.
    WaveInProgress,
    /// Every wave of every level has been cleared.
    Winner,
    /// Lives ran out; the next start restores them.
    OutOfLives,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::AwaitingStart => "Awaiting Start",
            Self::Placing => "Placing",
            Self::WaveInProgress => "Wave In Progress",
            Self::Winner => "Winner",
            Self::OutOfLives => "Out Of Lives",
        };
        f.write_str(label)
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Advances the simulation by a single tick.
    Tick,
    /// Starts the current wave, or restarts the game once it has been won.
    StartWave,
    /// Requests entering placement mode for the provided defense kind.
    Purchase {
        /// Kind of defense the player intends to buy.
        kind: DefenseKind,
    },
    /// Places the pending defense at the provided point.
    ConfirmPlacement {
        /// Point selected by the player.
        point: Point,
    },
    /// Abandons the pending placement.
    CancelPlacement,
    /// Raises the time scale by one.
    IncreaseTimeScale,
    /// Lowers the time scale by one, never below one.
    DecreaseTimeScale,
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that the player-facing status changed.
    StatusChanged {
        /// Status visible after processing the command.
        status: Status,
    },
    /// Confirms that a wave started.
    WaveStarted {
        /// Level the wave belongs to.
        level: u32,
        /// One-based wave number.
        wave: u32,
    },
    /// Confirms that every unit of a wave was resolved with lives remaining.
    WaveCompleted {
        /// Level the wave belongs to.
        level: u32,
        /// One-based wave number.
        wave: u32,
    },
    /// Reports that lives ran out during a wave.
    WaveFailed {
        /// Level the wave belongs to.
        level: u32,
        /// One-based wave number.
        wave: u32,
    },
    /// Confirms that a level's route and schedule were loaded.
    LevelLoaded {
        /// Level that became active.
        level: u32,
        /// Number of waves scheduled for the level.
        waves: u32,
    },
    /// Reports that a level could not be loaded and is treated as absent.
    LevelUnavailable {
        /// Level that failed to load.
        level: u32,
    },
    /// Announces that the game was won.
    GameWon,
    /// Confirms that the game was reset to its initial level.
    GameReset,
    /// Reports that a unit reached the end of the route.
    SlicerEscaped {
        /// Unit that escaped.
        slicer: SlicerId,
        /// Lives deducted for the escape.
        penalty: u32,
    },
    /// Reports that a destroyed unit was resolved.
    SlicerDestroyed {
        /// Unit that was destroyed.
        slicer: SlicerId,
        /// Cash credited for the kill.
        reward: u32,
        /// Number of child units released onto the route.
        children: u32,
    },
    /// Confirms that a purchase entered placement mode.
    PurchaseStarted {
        /// Kind of defense awaiting placement.
        kind: DefenseKind,
    },
    /// Reports that a purchase request was rejected.
    PurchaseRejected {
        /// Kind of defense requested.
        kind: DefenseKind,
        /// Specific reason the request failed.
        reason: PurchaseError,
    },
    /// Confirms that a defense was placed into the world.
    DefensePlaced {
        /// Identifier assigned to the defense.
        defense: DefenseId,
        /// Kind of defense placed.
        kind: DefenseKind,
        /// Position the defense occupies after placement.
        position: Point,
    },
    /// Reports that a placement request was rejected.
    PlacementRejected {
        /// Point provided in the placement request.
        point: Point,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that the pending placement was abandoned.
    PlacementCancelled,
    /// Reports that a defense left the field and was removed.
    DefenseRetired {
        /// Defense that was removed.
        defense: DefenseId,
    },
    /// Announces a new time scale.
    TimeScaleChanged {
        /// Time scale in effect after the command.
        time_scale: TimeScale,
    },
    /// Reports that an active defense fired at a unit.
    ProjectileFired {
        /// Defense that fired.
        defense: DefenseId,
        /// Unit targeted by the projectile.
        target: SlicerId,
    },
    /// Reports that a passive defense dropped an area charge.
    ChargeDropped {
        /// Defense that dropped the charge.
        defense: DefenseId,
        /// Point where the charge rests.
        position: Point,
    },
    /// Reports that an area charge detonated.
    ChargeDetonated {
        /// Defense that owned the charge.
        defense: DefenseId,
        /// Number of units caught in the blast.
        hits: u32,
    },
}

/// Unique identifier assigned to a unit within a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlicerId(u32);

impl SlicerId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a defense.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DefenseId(u32);

impl DefenseId {
    /// Creates a new defense identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the defense identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Multiplier applied to per-tick displacement and countdowns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeScale(u32);

impl TimeScale {
    /// Normal speed.
    pub const NORMAL: TimeScale = TimeScale(1);

    /// Creates a time scale, clamping values below one.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        if value == 0 {
            Self::NORMAL
        } else {
            Self(value)
        }
    }

    /// Numeric multiplier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Next faster time scale.
    #[must_use]
    pub const fn faster(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Next slower time scale, never below one.
    #[must_use]
    pub const fn slower(self) -> Self {
        Self::new(self.0.saturating_sub(1))
    }
}

impl Default for TimeScale {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Single route sample: a point and the heading of the segment it lies on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteSample {
    /// Location of the sample.
    pub point: Point,
    /// Heading in radians, east-referenced, positive towards increasing y.
    pub heading: f64,
}

/// Dense, immutable sequence of samples that units follow.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Route {
    samples: Vec<RouteSample>,
}

impl Route {
    /// Wraps an already sampled sequence.
    #[must_use]
    pub fn from_samples(samples: Vec<RouteSample>) -> Self {
        Self { samples }
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Reports whether the route has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at the provided offset.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&RouteSample> {
        self.samples.get(index)
    }

    /// All samples in travel order.
    #[must_use]
    pub fn samples(&self) -> &[RouteSample] {
        &self.samples
    }
}

/// One line of a wave script.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnEvent {
    /// Releases `count` units of `kind`, `interval_ms` apart.
    Spawn {
        /// One-based wave number.
        wave: u32,
        /// Number of units released.
        count: u32,
        /// Kind of unit released.
        kind: SlicerKind,
        /// Milliseconds between consecutive releases.
        interval_ms: u32,
    },
    /// Pauses the wave's release schedule.
    Delay {
        /// One-based wave number.
        wave: u32,
        /// Length of the pause in milliseconds.
        ms: u32,
    },
}

impl SpawnEvent {
    /// Wave the event belongs to.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        match self {
            Self::Spawn { wave, .. } | Self::Delay { wave, .. } => *wave,
        }
    }
}

/// Unit queued for release at a fixed tick offset into its wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledSpawn {
    /// Kind of unit released.
    pub kind: SlicerKind,
    /// Ticks after the wave starts before the unit enters the route.
    pub delay_ticks: u32,
}

/// Ordered release plan for one wave.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WavePlan {
    spawns: Vec<ScheduledSpawn>,
}

impl WavePlan {
    /// Creates a plan from releases in schedule order.
    #[must_use]
    pub fn new(spawns: Vec<ScheduledSpawn>) -> Self {
        Self { spawns }
    }

    /// Releases in schedule order.
    #[must_use]
    pub fn spawns(&self) -> &[ScheduledSpawn] {
        &self.spawns
    }
}

/// Release plans for every wave of a level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schedule {
    waves: Vec<WavePlan>,
}

impl Schedule {
    /// Creates a schedule from wave plans ordered by wave number.
    #[must_use]
    pub fn new(waves: Vec<WavePlan>) -> Self {
        Self { waves }
    }

    /// Plan for the one-based wave number, if scheduled.
    #[must_use]
    pub fn wave(&self, wave: u32) -> Option<&WavePlan> {
        let index = usize::try_from(wave.checked_sub(1)?).ok()?;
        self.waves.get(index)
    }

    /// Number of scheduled waves.
    #[must_use]
    pub fn wave_count(&self) -> u32 {
        u32::try_from(self.waves.len()).unwrap_or(u32::MAX)
    }
}

/// Map collaborator supplying route geometry and placement constraints.
pub trait RouteSource: fmt::Debug {
    /// Vertices of the route in travel order.
    fn polyline(&self) -> &[Point];

    /// Reports whether defenses may not be placed at the point.
    fn is_blocked(&self, point: Point) -> bool;

    /// Region of the screen where the simulation takes place.
    fn playable_area(&self) -> Rect;
}

/// Everything required to play a level.
#[derive(Debug)]
pub struct LevelData {
    /// Route geometry and placement constraints.
    pub terrain: Box<dyn RouteSource>,
    /// Release plans for the level's waves.
    pub schedule: Schedule,
}

/// Source of levels addressed by one-based index.
pub trait LevelCatalog: fmt::Debug {
    /// Loads the level, failing when it is missing or malformed.
    fn load(&self, level: u32) -> Result<LevelData, LevelError>;
}

/// Errors raised while loading a level.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    /// No level exists at the requested index.
    #[error("level {0} does not exist")]
    NotFound(u32),
    /// The level's route could not be used.
    #[error("level {level} has an invalid route: {reason}")]
    InvalidRoute {
        /// Level that failed.
        level: u32,
        /// Description of the problem.
        reason: String,
    },
    /// The level's wave script could not be used.
    #[error("level {level} has an invalid schedule: {reason}")]
    InvalidSchedule {
        /// Level that failed.
        level: u32,
        /// Description of the problem.
        reason: String,
    },
}

/// Reasons a purchase request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PurchaseError {
    /// The player cannot afford the defense.
    InsufficientFunds,
    /// Another defense is already awaiting placement.
    AlreadyPlacing,
    /// The game has been won; purchases are closed.
    GameOver,
}

/// Reasons a placement request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// No purchase is awaiting placement.
    NotPlacing,
    /// The map forbids building at the point.
    Blocked,
    /// The point lies outside the playable area.
    OutOfBounds,
    /// An existing defense already covers the point.
    Occupied,
    /// The player can no longer afford the pending defense.
    InsufficientFunds,
}

/// Tunable starting conditions for a game session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Lives granted at the start of a game and after a restart.
    pub starting_lives: u32,
    /// Cash granted at the start of a game and after a reset.
    pub starting_cash: u32,
    /// Cash granted when a new level is loaded.
    pub level_cash: u32,
    /// Seed for the random drop intervals of passive defenses.
    pub rng_seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_lives: 25,
            starting_cash: 500,
            level_cash: 500,
            rng_seed: 0x5d0f_4c21_8e3b_a977,
        }
    }
}

/// Immutable representation of a unit on the route.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlicerSnapshot {
    /// Identifier of the unit.
    pub id: SlicerId,
    /// Kind of unit.
    pub kind: SlicerKind,
    /// Wave the unit belongs to.
    pub wave: u32,
    /// Current position.
    pub position: Point,
    /// Current heading in radians.
    pub heading: f64,
    /// Collision footprint.
    pub bounds: Rect,
    /// Remaining health.
    pub health: f64,
}

/// Immutable representation of a placed defense.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefenseSnapshot {
    /// Identifier of the defense.
    pub id: DefenseId,
    /// Kind of defense.
    pub kind: DefenseKind,
    /// Current position.
    pub position: Point,
    /// Facing angle in radians.
    pub heading: f64,
    /// Collision footprint, absent once the defense left the field.
    pub bounds: Option<Rect>,
}

/// Variants of ordnance a defense can own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrdnanceKind {
    /// Homing single-target shot.
    Projectile,
    /// Timed explosive damaging an area.
    AreaCharge,
}

/// Immutable representation of an ordnance item in flight or at rest.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrdnanceSnapshot {
    /// Defense that owns the ordnance.
    pub owner: DefenseId,
    /// Variant of ordnance.
    pub kind: OrdnanceKind,
    /// Current position.
    pub position: Point,
    /// Collision footprint.
    pub bounds: Rect,
}

#[cfg(test)]
mod tests {
    use super::{
        DefenseId, GameConfig, PlacementError, PurchaseError, Schedule, ScheduledSpawn,
        SlicerKind, SpawnEvent, TimeScale, WavePlan,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn defense_id_round_trips_through_bincode() {
        assert_round_trip(&DefenseId::new(42));
    }

    #[test]
    fn rejection_reasons_round_trip_through_bincode() {
        assert_round_trip(&PlacementError::Occupied);
        assert_round_trip(&PurchaseError::InsufficientFunds);
    }

    #[test]
    fn spawn_event_round_trips_through_bincode() {
        assert_round_trip(&SpawnEvent::Spawn {
            wave: 2,
            count: 5,
            kind: SlicerKind::MegaSlicer,
            interval_ms: 1500,
        });
    }

    #[test]
    fn game_config_round_trips_through_bincode() {
        assert_round_trip(&GameConfig::default());
    }

    #[test]
    fn time_scale_never_drops_below_one() {
        let scale = TimeScale::NORMAL.slower();
        assert_eq!(scale.get(), 1);
        assert_eq!(TimeScale::new(0), TimeScale::NORMAL);
        assert_eq!(scale.faster().faster().get(), 3);
        assert_eq!(TimeScale::new(3).slower().get(), 2);
    }

    #[test]
    fn schedule_waves_are_one_based() {
        let plan = WavePlan::new(vec![ScheduledSpawn {
            kind: SlicerKind::Slicer,
            delay_ticks: 0,
        }]);
        let schedule = Schedule::new(vec![plan.clone()]);
        assert_eq!(schedule.wave(1), Some(&plan));
        assert_eq!(schedule.wave(0), None);
        assert_eq!(schedule.wave(2), None);
        assert_eq!(schedule.wave_count(), 1);
    }
}
