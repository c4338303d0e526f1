//! TOML scenario files: game configuration, levels and a command script.

use std::{fs, path::Path};

use serde::Deserialize;
use shadow_defend_core::{
    Command, GameConfig, LevelCatalog, LevelData, LevelError, Point, Rect, RouteSource,
};
use shadow_defend_system_schedule::load_schedule;
use thiserror::Error;

/// Screen region below the 100 unit status panel.
const DEFAULT_PLAYABLE: Rect = Rect::new(0.0, 100.0, 1024.0, 643.0);

/// Scenario bundled with the binary.
pub(crate) const BUILTIN_SCENARIO: &str = include_str!("../scenarios/default.toml");

/// Errors raised while loading a scenario.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// The scenario file could not be read.
    #[error("failed to read scenario {path}")]
    Read {
        /// Path that was requested.
        path: String,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The scenario was not valid TOML or did not match the expected shape.
    #[error("failed to parse scenario")]
    Parse(#[from] toml::de::Error),
    /// The scenario declares no levels.
    #[error("scenario declares no levels")]
    NoLevels,
    /// Script entries must be ordered by tick.
    #[error("script entry {position} at tick {tick} precedes tick {previous}")]
    ScriptOutOfOrder {
        /// Zero-based index of the offending entry.
        position: usize,
        /// Tick of the offending entry.
        tick: u64,
        /// Tick of the entry before it.
        previous: u64,
    },
}

/// Parsed scenario file.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Scenario {
    #[serde(default)]
    pub(crate) game: GameConfig,
    pub(crate) levels: Vec<LevelSpec>,
    #[serde(default)]
    pub(crate) script: Vec<ScriptStep>,
}

/// One level: route geometry, placement constraints and its wave script.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct LevelSpec {
    polyline: Vec<Point>,
    #[serde(default = "default_playable")]
    playable: Rect,
    #[serde(default)]
    blocked: Vec<Rect>,
    /// Wave script in `wave,spawn,count,kind,interval_ms` form.
    waves: String,
}

fn default_playable() -> Rect {
    DEFAULT_PLAYABLE
}

/// Command issued before the simulation tick with the same number.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct ScriptStep {
    pub(crate) tick: u64,
    #[serde(flatten)]
    pub(crate) command: Command,
}

impl Scenario {
    /// Reads the scenario at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parses and validates scenario text.
    pub(crate) fn parse(contents: &str) -> Result<Self, ConfigError> {
        let scenario: Self = toml::from_str(contents)?;
        if scenario.levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }

        for (position, pair) in scenario.script.windows(2).enumerate() {
            if pair[1].tick < pair[0].tick {
                return Err(ConfigError::ScriptOutOfOrder {
                    position: position + 1,
                    tick: pair[1].tick,
                    previous: pair[0].tick,
                });
            }
        }

        Ok(scenario)
    }
}

/// Level catalog backed by the levels of a scenario.
///
/// Wave scripts are parsed on demand, so a malformed script only surfaces
/// when its level is reached.
#[derive(Debug)]
pub(crate) struct ScenarioCatalog {
    levels: Vec<LevelSpec>,
}

impl ScenarioCatalog {
    pub(crate) fn new(levels: Vec<LevelSpec>) -> Self {
        Self { levels }
    }
}

impl LevelCatalog for ScenarioCatalog {
    fn load(&self, level: u32) -> Result<LevelData, LevelError> {
        let spec = level
            .checked_sub(1)
            .and_then(|index| self.levels.get(index as usize))
            .ok_or(LevelError::NotFound(level))?;

        let schedule =
            load_schedule(&spec.waves).map_err(|error| LevelError::InvalidSchedule {
                level,
                reason: error.to_string(),
            })?;

        Ok(LevelData {
            terrain: Box::new(ScenarioTerrain {
                polyline: spec.polyline.clone(),
                playable: spec.playable,
                blocked: spec.blocked.clone(),
            }),
            schedule,
        })
    }
}

#[derive(Debug)]
struct ScenarioTerrain {
    polyline: Vec<Point>,
    playable: Rect,
    blocked: Vec<Rect>,
}

impl RouteSource for ScenarioTerrain {
    fn polyline(&self) -> &[Point] {
        &self.polyline
    }

    fn is_blocked(&self, point: Point) -> bool {
        self.blocked.iter().any(|rect| rect.contains(point))
    }

    fn playable_area(&self) -> Rect {
        self.playable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadow_defend_core::{DefenseKind, LevelCatalog};

    const MINIMAL: &str = r#"
        [[levels]]
        polyline = [{ x = 0.0, y = 300.0 }, { x = 400.0, y = 300.0 }]
        waves = "1,spawn,2,slicer,500"
    "#;

    #[test]
    fn builtin_scenario_parses() {
        let scenario = Scenario::parse(BUILTIN_SCENARIO).expect("builtin scenario parses");
        assert!(!scenario.levels.is_empty());
        assert!(!scenario.script.is_empty());

        let catalog = ScenarioCatalog::new(scenario.levels);
        for level in 1..=catalog.levels.len() as u32 {
            let data = catalog.load(level).expect("builtin level loads");
            assert!(data.schedule.wave_count() > 0);
        }
    }

    #[test]
    fn omitted_sections_fall_back_to_defaults() {
        let scenario = Scenario::parse(MINIMAL).expect("minimal scenario parses");
        assert_eq!(scenario.game, GameConfig::default());
        assert!(scenario.script.is_empty());
        assert_eq!(scenario.levels[0].playable, DEFAULT_PLAYABLE);
    }

    #[test]
    fn script_steps_flatten_commands() {
        let contents = format!(
            r#"
            {MINIMAL}
            [[script]]
            tick = 0
            command = "purchase"
            kind = "supertank"

            [[script]]
            tick = 0
            command = "confirm_placement"
            point = {{ x = 200.0, y = 400.0 }}

            [[script]]
            tick = 5
            command = "start_wave"
            "#
        );
        let scenario = Scenario::parse(&contents).expect("scenario parses");
        let commands: Vec<Command> = scenario
            .script
            .into_iter()
            .map(|step| step.command)
            .collect();
        assert_eq!(
            commands,
            vec![
                Command::Purchase {
                    kind: DefenseKind::SuperTank
                },
                Command::ConfirmPlacement {
                    point: Point::new(200.0, 400.0)
                },
                Command::StartWave,
            ]
        );
    }

    #[test]
    fn unordered_script_is_rejected() {
        let contents = format!(
            r#"
            {MINIMAL}
            [[script]]
            tick = 10
            command = "start_wave"

            [[script]]
            tick = 3
            command = "tick"
            "#
        );
        assert!(matches!(
            Scenario::parse(&contents),
            Err(ConfigError::ScriptOutOfOrder {
                position: 1,
                tick: 3,
                previous: 10
            })
        ));
    }

    #[test]
    fn scenario_without_levels_is_rejected() {
        assert!(matches!(
            Scenario::parse("levels = []"),
            Err(ConfigError::NoLevels)
        ));
    }

    #[test]
    fn malformed_wave_script_surfaces_as_level_error() {
        let scenario = Scenario::parse(
            r#"
            [[levels]]
            polyline = [{ x = 0.0, y = 300.0 }, { x = 400.0, y = 300.0 }]
            waves = "1,spawn,two,slicer,500"
            "#,
        )
        .expect("scenario parses");
        let catalog = ScenarioCatalog::new(scenario.levels);
        assert!(matches!(
            catalog.load(1),
            Err(LevelError::InvalidSchedule { level: 1, .. })
        ));
        assert!(matches!(catalog.load(2), Err(LevelError::NotFound(2))));
    }

    #[test]
    fn blocked_rectangles_reject_points() {
        let terrain = ScenarioTerrain {
            polyline: Vec::new(),
            playable: DEFAULT_PLAYABLE,
            blocked: vec![Rect::new(0.0, 250.0, 500.0, 100.0)],
        };
        assert!(terrain.is_blocked(Point::new(10.0, 300.0)));
        assert!(!terrain.is_blocked(Point::new(600.0, 300.0)));
    }
}
