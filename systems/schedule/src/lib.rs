#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave script parsing and release-delay derivation.
//!
//! A wave script is a comma separated text file with one event per line:
//!
//! ```text
//! 1,spawn,5,slicer,1000
//! 1,delay,2000
//! 2,spawn,2,superslicer,1500
//! ```
//!
//! Events are consumed in file order. Each wave keeps a running delay in
//! ticks: a spawn event releases its units `interval` apart starting at the
//! running delay, then advances it to the last release; a delay event adds
//! its length.

use std::num::ParseIntError;

use shadow_defend_core::{
    Schedule, ScheduledSpawn, SlicerKind, SpawnEvent, UnknownKind, WavePlan, TICK_RATE,
};
use thiserror::Error;

/// Errors raised while reading a wave script.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// A line did not have the expected number of fields.
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        /// One-based line number.
        line: usize,
        /// Number of fields the event type requires.
        expected: usize,
        /// Number of fields present.
        found: usize,
    },
    /// A numeric field could not be parsed.
    #[error("line {line}: invalid number `{value}`: {source}")]
    InvalidNumber {
        /// One-based line number.
        line: usize,
        /// Offending text.
        value: String,
        /// Underlying parse failure.
        source: ParseIntError,
    },
    /// The event type was neither `spawn` nor `delay`.
    #[error("line {line}: unknown event `{event}`")]
    UnknownEvent {
        /// One-based line number.
        line: usize,
        /// Offending event name.
        event: String,
    },
    /// The unit kind was not recognised.
    #[error("line {line}: {source}")]
    UnknownKind {
        /// One-based line number.
        line: usize,
        /// Underlying lookup failure.
        source: UnknownKind,
    },
    /// Waves must start at one and never skip or revisit a number.
    #[error("wave {found} follows wave {previous}")]
    NonSequentialWave {
        /// Wave number of the previous event, zero before the first.
        previous: u32,
        /// Wave number of the offending event.
        found: u32,
    },
}

/// Parses a wave script into events, skipping blank lines.
pub fn parse_script(contents: &str) -> Result<Vec<SpawnEvent>, ScheduleError> {
    let mut events = Vec::new();
    for (index, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        events.push(parse_line(index + 1, line)?);
    }
    Ok(events)
}

fn parse_line(line: usize, text: &str) -> Result<SpawnEvent, ScheduleError> {
    let fields: Vec<&str> = text.split(',').map(str::trim).collect();
    let event = fields.get(1).copied().unwrap_or_default();
    match event {
        "spawn" => {
            expect_fields(line, &fields, 5)?;
            let kind = fields[3]
                .parse::<SlicerKind>()
                .map_err(|source| ScheduleError::UnknownKind { line, source })?;
            Ok(SpawnEvent::Spawn {
                wave: parse_number(line, fields[0])?,
                count: parse_number(line, fields[2])?,
                kind,
                interval_ms: parse_number(line, fields[4])?,
            })
        }
        "delay" => {
            expect_fields(line, &fields, 3)?;
            Ok(SpawnEvent::Delay {
                wave: parse_number(line, fields[0])?,
                ms: parse_number(line, fields[2])?,
            })
        }
        _ if fields.len() < 2 => Err(ScheduleError::FieldCount {
            line,
            expected: 3,
            found: fields.len(),
        }),
        other => Err(ScheduleError::UnknownEvent {
            line,
            event: other.to_owned(),
        }),
    }
}

fn expect_fields(line: usize, fields: &[&str], expected: usize) -> Result<(), ScheduleError> {
    if fields.len() == expected {
        Ok(())
    } else {
        Err(ScheduleError::FieldCount {
            line,
            expected,
            found: fields.len(),
        })
    }
}

fn parse_number(line: usize, value: &str) -> Result<u32, ScheduleError> {
    value
        .parse::<u32>()
        .map_err(|source| ScheduleError::InvalidNumber {
            line,
            value: value.to_owned(),
            source,
        })
}

/// Converts events into per-wave release plans with delays in ticks.
pub fn build_schedule(events: &[SpawnEvent]) -> Result<Schedule, ScheduleError> {
    let mut waves: Vec<WavePlan> = Vec::new();
    let mut spawns: Vec<ScheduledSpawn> = Vec::new();
    let mut current_wave = 0_u32;
    let mut delay = 0_u64;

    for event in events {
        let wave = event.wave();
        if wave != current_wave {
            if wave != current_wave + 1 {
                return Err(ScheduleError::NonSequentialWave {
                    previous: current_wave,
                    found: wave,
                });
            }
            if current_wave > 0 {
                waves.push(WavePlan::new(std::mem::take(&mut spawns)));
            }
            current_wave = wave;
            delay = 0;
        }

        match *event {
            SpawnEvent::Spawn {
                count,
                kind,
                interval_ms,
                ..
            } => {
                for index in 0..count {
                    spawns.push(ScheduledSpawn {
                        kind,
                        delay_ticks: clamp_ticks(delay + ms_to_ticks(index, interval_ms)),
                    });
                }
                delay += ms_to_ticks(count.saturating_sub(1), interval_ms);
            }
            SpawnEvent::Delay { ms, .. } => {
                delay += ms_to_ticks(1, ms);
            }
        }
    }

    if current_wave > 0 {
        waves.push(WavePlan::new(spawns));
    }

    Ok(Schedule::new(waves))
}

/// Parses and builds a schedule in one step.
pub fn load_schedule(contents: &str) -> Result<Schedule, ScheduleError> {
    build_schedule(&parse_script(contents)?)
}

/// Ticks covered by `multiple` intervals of `ms` milliseconds, truncated.
fn ms_to_ticks(multiple: u32, ms: u32) -> u64 {
    u64::from(TICK_RATE) * u64::from(multiple) * u64::from(ms) / 1000
}

fn clamp_ticks(ticks: u64) -> u32 {
    u32::try_from(ticks).unwrap_or(u32::MAX)
}
