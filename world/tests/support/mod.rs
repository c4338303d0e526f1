#![allow(dead_code)]

use shadow_defend_core::{
    Command, Event, LevelCatalog, LevelData, LevelError, Point, Rect, RouteSource, Schedule,
    ScheduledSpawn, SlicerKind, WavePlan,
};
use shadow_defend_world::{apply, World};

pub const PLAYABLE: Rect = Rect::new(0.0, 100.0, 1024.0, 643.0);

#[derive(Clone, Debug)]
pub struct Field {
    polyline: Vec<Point>,
    blocked: Vec<Rect>,
}

impl RouteSource for Field {
    fn polyline(&self) -> &[Point] {
        &self.polyline
    }

    fn is_blocked(&self, point: Point) -> bool {
        self.blocked.iter().any(|rect| rect.contains(point))
    }

    fn playable_area(&self) -> Rect {
        PLAYABLE
    }
}

#[derive(Clone, Debug)]
pub struct LevelSpec {
    pub polyline: Vec<Point>,
    pub blocked: Vec<Rect>,
    pub waves: Vec<Vec<(SlicerKind, u32)>>,
}

impl LevelSpec {
    /// Horizontal strip along y = 300 from x = 0 to `length`.
    pub fn strip(length: f64, waves: Vec<Vec<(SlicerKind, u32)>>) -> Self {
        Self {
            polyline: vec![Point::new(0.0, 300.0), Point::new(length, 300.0)],
            blocked: Vec::new(),
            waves,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Catalog {
    levels: Vec<LevelSpec>,
}

impl Catalog {
    pub fn new(levels: Vec<LevelSpec>) -> Box<Self> {
        Box::new(Self { levels })
    }
}

impl LevelCatalog for Catalog {
    fn load(&self, level: u32) -> Result<LevelData, LevelError> {
        let spec = level
            .checked_sub(1)
            .and_then(|index| self.levels.get(index as usize))
            .ok_or(LevelError::NotFound(level))?;
        let waves = spec
            .waves
            .iter()
            .map(|wave| {
                WavePlan::new(
                    wave.iter()
                        .map(|(kind, delay_ticks)| ScheduledSpawn {
                            kind: *kind,
                            delay_ticks: *delay_ticks,
                        })
                        .collect(),
                )
            })
            .collect();
        Ok(LevelData {
            terrain: Box::new(Field {
                polyline: spec.polyline.clone(),
                blocked: spec.blocked.clone(),
            }),
            schedule: Schedule::new(waves),
        })
    }
}

/// Applies `command` and returns the events it produced.
pub fn step(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    apply(world, command, &mut events);
    events
}

/// Ticks until an event matching `done` appears, returning every event seen.
pub fn tick_until(world: &mut World, limit: usize, done: impl Fn(&Event) -> bool) -> Vec<Event> {
    let mut seen = Vec::new();
    for _ in 0..limit {
        let events = step(world, Command::Tick);
        let finished = events.iter().any(&done);
        seen.extend(events);
        if finished {
            return seen;
        }
    }
    panic!("condition not reached within {limit} ticks");
}
