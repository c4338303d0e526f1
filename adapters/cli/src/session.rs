//! Headless driver that feeds a scenario script into the world.

use serde::Serialize;
use shadow_defend_core::{Command, Event, Status};
use shadow_defend_world::{apply, query, World};

use crate::scenario::{Scenario, ScenarioCatalog};

/// Outcome of a scripted run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct Summary {
    pub(crate) ticks: u64,
    pub(crate) status: Option<Status>,
    pub(crate) level: u32,
    pub(crate) wave: Option<u32>,
    pub(crate) cash: u32,
    pub(crate) lives: u32,
    pub(crate) waves_completed: u32,
    pub(crate) waves_failed: u32,
    pub(crate) slicers_destroyed: u32,
    pub(crate) slicers_escaped: u32,
    pub(crate) defenses_placed: u32,
    pub(crate) rejections: u32,
}

impl Summary {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::WaveCompleted { .. } => self.waves_completed += 1,
                Event::WaveFailed { .. } => self.waves_failed += 1,
                Event::SlicerDestroyed { .. } => self.slicers_destroyed += 1,
                Event::SlicerEscaped { .. } => self.slicers_escaped += 1,
                Event::DefensePlaced { .. } => self.defenses_placed += 1,
                Event::PurchaseRejected { .. } | Event::PlacementRejected { .. } => {
                    self.rejections += 1;
                }
                _ => {}
            }
        }
    }
}

/// Runs `scenario` for at most `tick_limit` ticks.
///
/// Script commands stamped with tick `n` are applied before the `n`-th tick.
/// With `auto_start`, the next wave starts whenever the world is waiting for
/// one. The run ends early once the game is won and the script is exhausted.
pub(crate) fn run(scenario: Scenario, tick_limit: u64, auto_start: bool) -> Summary {
    let Scenario {
        game,
        levels,
        script,
    } = scenario;
    let mut world = World::new(game, Box::new(ScenarioCatalog::new(levels)));
    let mut script = script.into_iter().peekable();
    let mut events = Vec::new();
    let mut summary = Summary::default();

    while summary.ticks < tick_limit {
        let tick = summary.ticks;
        while let Some(step) = script.next_if(|step| step.tick <= tick) {
            apply(&mut world, step.command, &mut events);
        }
        if auto_start
            && matches!(
                query::status(&world),
                Status::AwaitingStart | Status::OutOfLives
            )
        {
            apply(&mut world, Command::StartWave, &mut events);
        }
        apply(&mut world, Command::Tick, &mut events);
        summary.record(&events);
        events.clear();
        summary.ticks += 1;

        if query::status(&world) == Status::Winner && script.peek().is_none() {
            break;
        }
    }

    summary.status = Some(query::status(&world));
    summary.level = query::level(&world);
    summary.wave = query::wave(&world);
    summary.cash = query::cash(&world);
    summary.lives = query::lives(&world);
    tracing::info!(
        ticks = summary.ticks,
        status = %query::status(&world),
        "session finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::scenario::{Scenario, BUILTIN_SCENARIO};
    use shadow_defend_core::Status;

    const ONE_SLICER: &str = r#"
        [game]
        starting_lives = 3

        [[levels]]
        polyline = [{ x = 0.0, y = 300.0 }, { x = 100.0, y = 300.0 }]
        waves = "1,spawn,1,slicer,0"

        [[script]]
        tick = 0
        command = "start_wave"
    "#;

    #[test]
    fn unopposed_slicer_escapes_and_game_is_won() {
        let scenario = Scenario::parse(ONE_SLICER).expect("scenario parses");
        let summary = run(scenario, 1_000, false);

        assert_eq!(summary.status, Some(Status::Winner));
        assert_eq!(summary.slicers_escaped, 1);
        assert_eq!(summary.waves_completed, 1);
        assert_eq!(summary.lives, 2);
        assert!(summary.ticks < 100, "run stops once won");
    }

    #[test]
    fn tick_limit_bounds_the_run() {
        let scenario = Scenario::parse(ONE_SLICER).expect("scenario parses");
        let summary = run(scenario, 10, false);
        assert_eq!(summary.ticks, 10);
        assert_eq!(summary.status, Some(Status::WaveInProgress));
    }

    #[test]
    fn builtin_scenario_runs_deterministically() {
        let first = run(
            Scenario::parse(BUILTIN_SCENARIO).expect("scenario parses"),
            20_000,
            true,
        );
        let second = run(
            Scenario::parse(BUILTIN_SCENARIO).expect("scenario parses"),
            20_000,
            true,
        );
        assert_eq!(first, second);
        assert!(first.defenses_placed > 0);
        assert!(first.slicers_destroyed > 0);
        assert!(first.waves_completed >= 3);
    }

    #[test]
    fn auto_start_does_not_restart_a_won_game() {
        let mut scenario = Scenario::parse(ONE_SLICER).expect("scenario parses");
        scenario.script.clear();
        let summary = run(scenario, 1_000, true);
        assert_eq!(summary.status, Some(Status::Winner));
        assert_eq!(summary.waves_completed, 1);
    }
}
