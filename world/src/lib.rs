#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative game state for Shadow Defend.
//!
//! The world owns the loaded level, the unit roster, placed defenses and the
//! player's economy. It only changes through [`apply`], which reports every
//! observable outcome as an [`Event`]; callers read state through [`query`].

mod defenses;
mod level;
mod ordnance;
mod slicers;
mod waves;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use shadow_defend_core::{
    Command, DefenseId, DefenseKind, Event, GameConfig, LevelCatalog, PlacementError, Point,
    PurchaseError, Status, TimeScale,
};
use tracing::{debug, info, warn};

use crate::{
    defenses::{Axis, Defense},
    level::Stage,
    slicers::Roster,
    waves::{process_roster, Economy, WaveProgress},
};

/// Game phase underneath a pending placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    AwaitingStart,
    WaveInProgress,
    Winner,
    OutOfLives,
}

impl Phase {
    fn status(self) -> Status {
        match self {
            Self::AwaitingStart => Status::AwaitingStart,
            Self::WaveInProgress => Status::WaveInProgress,
            Self::Winner => Status::Winner,
            Self::OutOfLives => Status::OutOfLives,
        }
    }
}

/// Represents the authoritative Shadow Defend world state.
#[derive(Debug)]
pub struct World {
    config: GameConfig,
    catalog: Box<dyn LevelCatalog>,
    level: u32,
    stage: Option<Stage>,
    wave: u32,
    roster: Roster,
    defenses: Vec<Defense>,
    next_defense_id: u32,
    phase: Phase,
    placing: Option<DefenseKind>,
    economy: Economy,
    time_scale: TimeScale,
    frames: u64,
    next_axis: Axis,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a world with the first level of `catalog` loaded.
    ///
    /// When the first level cannot be loaded the world starts out won.
    #[must_use]
    pub fn new(config: GameConfig, catalog: Box<dyn LevelCatalog>) -> Self {
        let mut world = Self {
            economy: Economy {
                cash: config.starting_cash,
                lives: config.starting_lives,
            },
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
            catalog,
            level: 1,
            stage: None,
            wave: 1,
            roster: Roster::new(),
            defenses: Vec::new(),
            next_defense_id: 0,
            phase: Phase::AwaitingStart,
            placing: None,
            time_scale: TimeScale::NORMAL,
            frames: 0,
            next_axis: Axis::Horizontal,
        };
        let mut discarded = Vec::new();
        let _ = world.enter_level(1, &mut discarded);
        world
    }

    fn status(&self) -> Status {
        if self.placing.is_some() {
            Status::Placing
        } else {
            self.phase.status()
        }
    }

    /// Makes `level` current, clearing defenses and preparing its first wave.
    ///
    /// A level that fails to load ends the game as won.
    fn enter_level(&mut self, level: u32, out_events: &mut Vec<Event>) -> bool {
        self.placing = None;
        match Stage::load(self.catalog.as_ref(), level) {
            Ok(stage) => {
                let waves = stage.schedule().wave_count();
                info!(level, waves, "level loaded");
                out_events.push(Event::LevelLoaded { level, waves });
                self.level = level;
                self.wave = 1;
                self.stage = Some(stage);
                self.defenses.clear();
                self.prepare_wave();
                true
            }
            Err(error) => {
                warn!(level, %error, "level unavailable, game won");
                out_events.push(Event::LevelUnavailable { level });
                self.stage = None;
                self.roster = Roster::new();
                self.time_scale = TimeScale::NORMAL;
                self.frames = 0;
                self.phase = Phase::Winner;
                out_events.push(Event::GameWon);
                false
            }
        }
    }

    fn prepare_wave(&mut self) {
        self.roster = self
            .stage
            .as_ref()
            .and_then(|stage| stage.schedule().wave(self.wave))
            .map(|plan| Roster::from_plan(plan, self.wave))
            .unwrap_or_default();
        self.time_scale = TimeScale::NORMAL;
        self.frames = 0;
    }

    fn start_wave(&mut self, out_events: &mut Vec<Event>) {
        match self.phase {
            Phase::Winner => self.reset(out_events),
            Phase::WaveInProgress => {}
            Phase::AwaitingStart | Phase::OutOfLives => {
                if self.stage.is_none() {
                    return;
                }
                if self.economy.lives == 0 {
                    self.economy.lives = self.config.starting_lives;
                }
                self.phase = Phase::WaveInProgress;
                self.frames = 0;
                info!(level = self.level, wave = self.wave, "wave started");
                out_events.push(Event::WaveStarted {
                    level: self.level,
                    wave: self.wave,
                });
            }
        }
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) {
        info!("game reset");
        self.economy = Economy {
            cash: self.config.starting_cash,
            lives: self.config.starting_lives,
        };
        self.phase = Phase::AwaitingStart;
        self.next_axis = Axis::Horizontal;
        out_events.push(Event::GameReset);
        let _ = self.enter_level(1, out_events);
    }

    fn tick(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != Phase::WaveInProgress {
            return;
        }
        let Some(stage) = self.stage.as_ref() else {
            return;
        };

        let progress = process_roster(
            &mut self.roster,
            stage.route(),
            self.frames,
            self.time_scale,
            &mut self.economy,
            out_events,
        );
        self.frames += u64::from(self.time_scale.get());

        match progress {
            WaveProgress::Running => self.run_defenses(out_events),
            WaveProgress::Cleared => self.finish_wave(out_events),
            WaveProgress::LivesExhausted => self.fail_wave(out_events),
        }
    }

    fn run_defenses(&mut self, out_events: &mut Vec<Event>) {
        let Some(playable) = self.stage.as_ref().map(Stage::playable_area) else {
            return;
        };
        let roster = &mut self.roster;
        let rng = &mut self.rng;
        let time_scale = self.time_scale;

        self.defenses.retain_mut(|defense| {
            let on_field = defense
                .bounds()
                .is_some_and(|bounds| bounds.intersects(&playable));
            if !on_field {
                defense.retire();
                if !defense.has_ordnance() {
                    debug!(defense = defense.id().get(), "defense left the field");
                    out_events.push(Event::DefenseRetired {
                        defense: defense.id(),
                    });
                    return false;
                }
            }
            defense.attack(roster, time_scale, rng, out_events);
            true
        });
    }

    fn finish_wave(&mut self, out_events: &mut Vec<Event>) {
        info!(level = self.level, wave = self.wave, "wave completed");
        out_events.push(Event::WaveCompleted {
            level: self.level,
            wave: self.wave,
        });

        for defense in &mut self.defenses {
            defense.clear_ordnance();
            if defense.is_passive() {
                defense.retire();
            }
        }

        self.phase = Phase::AwaitingStart;
        self.wave += 1;
        let waves = self
            .stage
            .as_ref()
            .map_or(0, |stage| stage.schedule().wave_count());
        if self.wave > waves {
            if self.enter_level(self.level + 1, out_events) {
                self.economy.cash = self.config.level_cash;
            }
        } else {
            self.prepare_wave();
        }
    }

    fn fail_wave(&mut self, out_events: &mut Vec<Event>) {
        info!(level = self.level, wave = self.wave, "out of lives");
        out_events.push(Event::WaveFailed {
            level: self.level,
            wave: self.wave,
        });
        self.economy.lives = 0;
        self.phase = Phase::OutOfLives;
        if self.enter_level(1, out_events) {
            self.economy.cash = self.config.starting_cash;
        }
    }

    fn purchase(&mut self, kind: DefenseKind, out_events: &mut Vec<Event>) {
        let rejection = if self.phase == Phase::Winner {
            Some(PurchaseError::GameOver)
        } else if self.placing.is_some() {
            Some(PurchaseError::AlreadyPlacing)
        } else if self.economy.cash < kind.price() {
            Some(PurchaseError::InsufficientFunds)
        } else {
            None
        };

        match rejection {
            Some(reason) => {
                debug!(?kind, ?reason, "purchase rejected");
                out_events.push(Event::PurchaseRejected { kind, reason });
            }
            None => {
                debug!(?kind, "purchase started");
                self.placing = Some(kind);
                out_events.push(Event::PurchaseStarted { kind });
            }
        }
    }

    /// Resolves where a defense of `kind` requested at `point` would stand.
    fn placement_site(&self, kind: DefenseKind, point: Point) -> Result<Point, PlacementError> {
        let Some(stage) = self.stage.as_ref() else {
            return Err(PlacementError::OutOfBounds);
        };
        if stage.terrain().is_blocked(point) {
            return Err(PlacementError::Blocked);
        }
        let playable = stage.playable_area();
        if !playable.contains(point) {
            return Err(PlacementError::OutOfBounds);
        }

        let site = if kind.is_passive() {
            self.next_axis.entry_point(point, playable)
        } else {
            point
        };
        let occupied = self
            .defenses
            .iter()
            .any(|defense| defense.bounds().is_some_and(|bounds| bounds.contains(site)));
        if occupied {
            return Err(PlacementError::Occupied);
        }

        if self.economy.cash < kind.price() {
            return Err(PlacementError::InsufficientFunds);
        }
        Ok(site)
    }

    fn confirm_placement(&mut self, point: Point, out_events: &mut Vec<Event>) {
        let Some(kind) = self.placing else {
            out_events.push(Event::PlacementRejected {
                point,
                reason: PlacementError::NotPlacing,
            });
            return;
        };

        let site = match self.placement_site(kind, point) {
            Ok(site) => site,
            Err(reason) => {
                debug!(?kind, x = point.x, y = point.y, ?reason, "placement rejected");
                out_events.push(Event::PlacementRejected { point, reason });
                return;
            }
        };

        self.economy.cash -= kind.price();
        let id = DefenseId::new(self.next_defense_id);
        self.next_defense_id += 1;
        self.defenses
            .push(Defense::new(id, kind, site, self.next_axis, &mut self.rng));
        if kind.is_passive() {
            self.next_axis = self.next_axis.flipped();
        }
        self.placing = None;

        info!(defense = id.get(), ?kind, x = site.x, y = site.y, "defense placed");
        out_events.push(Event::DefensePlaced {
            defense: id,
            kind,
            position: site,
        });
    }

    fn cancel_placement(&mut self, out_events: &mut Vec<Event>) {
        if self.placing.take().is_some() {
            out_events.push(Event::PlacementCancelled);
        }
    }

    fn rescale(&mut self, change: fn(TimeScale) -> TimeScale, out_events: &mut Vec<Event>) {
        if self.phase != Phase::WaveInProgress {
            return;
        }
        let next = change(self.time_scale);
        if next != self.time_scale {
            self.time_scale = next;
            debug!(time_scale = next.get(), "time scale changed");
            out_events.push(Event::TimeScaleChanged { time_scale: next });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let before = world.status();

    match command {
        Command::Tick => world.tick(out_events),
        Command::StartWave => world.start_wave(out_events),
        Command::Purchase { kind } => world.purchase(kind, out_events),
        Command::ConfirmPlacement { point } => world.confirm_placement(point, out_events),
        Command::CancelPlacement => world.cancel_placement(out_events),
        Command::IncreaseTimeScale => world.rescale(TimeScale::faster, out_events),
        Command::DecreaseTimeScale => world.rescale(TimeScale::slower, out_events),
    }

    let after = world.status();
    if after != before {
        out_events.push(Event::StatusChanged { status: after });
    }
}

/// Read-only views over the world state.
pub mod query {
    use shadow_defend_core::{
        DefenseKind, DefenseSnapshot, OrdnanceSnapshot, Rect, Route, SlicerSnapshot, Status,
        TimeScale,
    };

    use super::{Phase, World};

    /// Status visible to the player, with a pending placement on top.
    #[must_use]
    pub fn status(world: &World) -> Status {
        world.status()
    }

    /// One-based index of the current level.
    #[must_use]
    pub fn level(world: &World) -> u32 {
        world.level
    }

    /// One-based wave number about to start or in progress, absent once won.
    #[must_use]
    pub fn wave(world: &World) -> Option<u32> {
        (world.phase != Phase::Winner).then_some(world.wave)
    }

    /// Number of waves scheduled for the current level.
    #[must_use]
    pub fn wave_count(world: &World) -> u32 {
        world
            .stage
            .as_ref()
            .map_or(0, |stage| stage.schedule().wave_count())
    }

    /// Cash available for purchases.
    #[must_use]
    pub fn cash(world: &World) -> u32 {
        world.economy.cash
    }

    /// Remaining lives.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.economy.lives
    }

    /// Current time scale.
    #[must_use]
    pub fn time_scale(world: &World) -> TimeScale {
        world.time_scale
    }

    /// Ticks elapsed in the current wave, scaled by the time scale.
    #[must_use]
    pub fn frames(world: &World) -> u64 {
        world.frames
    }

    /// Defense awaiting placement, if any.
    #[must_use]
    pub fn pending_purchase(world: &World) -> Option<DefenseKind> {
        world.placing
    }

    /// Sampled route of the current level.
    #[must_use]
    pub fn route(world: &World) -> Option<&Route> {
        world.stage.as_ref().map(|stage| stage.route())
    }

    /// Playable area of the current level.
    #[must_use]
    pub fn playable_area(world: &World) -> Option<Rect> {
        world.stage.as_ref().map(|stage| stage.playable_area())
    }

    /// Units currently on the route, in roster order.
    #[must_use]
    pub fn slicer_view(world: &World) -> Vec<SlicerSnapshot> {
        world.roster.snapshots()
    }

    /// Placed defenses in placement order.
    #[must_use]
    pub fn defense_view(world: &World) -> Vec<DefenseSnapshot> {
        world.defenses.iter().map(|defense| defense.snapshot()).collect()
    }

    /// Projectiles and charges of every defense.
    #[must_use]
    pub fn ordnance_view(world: &World) -> Vec<OrdnanceSnapshot> {
        world
            .defenses
            .iter()
            .flat_map(|defense| defense.ordnance_snapshots())
            .collect()
    }
}
