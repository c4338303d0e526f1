//! Per-tick roster pass: releases, movement, rewards and penalties.

use shadow_defend_core::{Event, Route, SlicerId, TimeScale};
use tracing::debug;

use crate::slicers::{Roster, SlicerState};

/// Cash and lives held by the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Economy {
    pub(crate) cash: u32,
    pub(crate) lives: u32,
}

/// Outcome of a roster pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WaveProgress {
    /// At least one unit is still waiting, travelling or was just released.
    Running,
    /// Every unit of the wave is resolved.
    Cleared,
    /// An escape took the last life.
    LivesExhausted,
}

/// Scans the roster back to front, once per tick.
///
/// Released units move along the route, destroyed units pay out and queue
/// their children, escaped units cost lives. Every unit is rewarded or
/// penalised exactly once. Children are spliced in front of their parent
/// after the scan, so they first move on the following tick.
pub(crate) fn process_roster(
    roster: &mut Roster,
    route: &Route,
    frames: u64,
    time_scale: TimeScale,
    economy: &mut Economy,
    out_events: &mut Vec<Event>,
) -> WaveProgress {
    let mut cleared = true;
    let mut releases: Vec<(usize, Vec<SlicerId>)> = Vec::new();

    for position in (0..roster.order().len()).rev() {
        let id = roster.order()[position];
        let Some(slicer) = roster.get_mut(id) else {
            continue;
        };

        match slicer.state() {
            SlicerState::Alive => {
                // Units still waiting at index zero hold the wave open too.
                cleared = false;
                if slicer.route_index() > 0 || u64::from(slicer.spawn_delay()) <= frames {
                    slicer.advance(route, time_scale);
                }
            }
            SlicerState::PendingPenalty => {
                let penalty = slicer.penalty();
                slicer.mark_resolved();
                economy.lives = economy.lives.saturating_sub(penalty);
                debug!(slicer = id.get(), penalty, lives = economy.lives, "slicer escaped");
                out_events.push(Event::SlicerEscaped {
                    slicer: id,
                    penalty,
                });
                if economy.lives == 0 {
                    return WaveProgress::LivesExhausted;
                }
            }
            SlicerState::PendingReward => {
                let reward = slicer.reward();
                let children = slicer.children().to_vec();
                slicer.mark_resolved();
                economy.cash = economy.cash.saturating_add(reward);
                debug!(
                    slicer = id.get(),
                    reward,
                    children = children.len(),
                    "slicer destroyed"
                );
                out_events.push(Event::SlicerDestroyed {
                    slicer: id,
                    reward,
                    children: children.len() as u32,
                });
                if !children.is_empty() {
                    cleared = false;
                    releases.push((position, children));
                }
            }
            SlicerState::Resolved => {}
        }
    }

    // Positions were collected in descending order, so earlier splices never
    // shift later ones.
    for (position, children) in releases {
        roster.splice(position, &children);
    }

    if cleared {
        WaveProgress::Cleared
    } else {
        WaveProgress::Running
    }
}

#[cfg(test)]
mod tests {
    use super::{process_roster, Economy, WaveProgress};
    use crate::slicers::{Roster, SlicerState};
    use shadow_defend_core::{
        Event, Point, Route, RouteSample, ScheduledSpawn, SlicerKind, TimeScale, WavePlan,
    };

    fn route(samples: usize) -> Route {
        Route::from_samples(
            (0..samples)
                .map(|index| RouteSample {
                    point: Point::new(index as f64 * 0.25, 300.0),
                    heading: 0.0,
                })
                .collect(),
        )
    }

    fn plan(spawns: &[(SlicerKind, u32)]) -> WavePlan {
        WavePlan::new(
            spawns
                .iter()
                .map(|(kind, delay_ticks)| ScheduledSpawn {
                    kind: *kind,
                    delay_ticks: *delay_ticks,
                })
                .collect(),
        )
    }

    fn economy() -> Economy {
        Economy {
            cash: 500,
            lives: 25,
        }
    }

    #[test]
    fn destroyed_superslicer_pays_once_and_releases_two_children() {
        let route = route(1_000);
        let mut roster = Roster::from_plan(&plan(&[(SlicerKind::SuperSlicer, 0)]), 1);
        let parent = roster.order()[0];
        let mut economy = economy();
        let mut events = Vec::new();

        for frame in 0..10 {
            let progress = process_roster(
                &mut roster,
                &route,
                frame,
                TimeScale::NORMAL,
                &mut economy,
                &mut events,
            );
            assert_eq!(progress, WaveProgress::Running);
        }
        assert!(roster.deduct_health(parent, 1.0));

        let progress = process_roster(
            &mut roster,
            &route,
            10,
            TimeScale::NORMAL,
            &mut economy,
            &mut events,
        );
        assert_eq!(progress, WaveProgress::Running);
        assert_eq!(economy.cash, 515);
        assert_eq!(roster.order().len(), 3);
        assert_eq!(roster.order()[2], parent, "children precede the parent");

        for frame in 11..20 {
            let _ = process_roster(
                &mut roster,
                &route,
                frame,
                TimeScale::NORMAL,
                &mut economy,
                &mut events,
            );
        }
        assert_eq!(economy.cash, 515, "reward is paid exactly once");
        assert_eq!(roster.order().len(), 3, "children are spliced exactly once");
        let destroyed = events
            .iter()
            .filter(|event| matches!(event, Event::SlicerDestroyed { .. }))
            .count();
        assert_eq!(destroyed, 1);
    }

    #[test]
    fn escaped_slicer_costs_one_life_exactly_once() {
        let route = route(20);
        let mut roster = Roster::from_plan(&plan(&[(SlicerKind::Slicer, 0)]), 1);
        let mut economy = economy();
        let mut events = Vec::new();

        let mut progress = WaveProgress::Running;
        let mut frame = 0;
        while progress == WaveProgress::Running {
            progress = process_roster(
                &mut roster,
                &route,
                frame,
                TimeScale::NORMAL,
                &mut economy,
                &mut events,
            );
            frame += 1;
        }

        assert_eq!(progress, WaveProgress::Cleared);
        assert_eq!(economy, Economy { cash: 500, lives: 24 });
        let _ = process_roster(
            &mut roster,
            &route,
            frame,
            TimeScale::NORMAL,
            &mut economy,
            &mut events,
        );
        assert_eq!(economy.lives, 24);
        assert_eq!(
            events,
            vec![Event::SlicerEscaped {
                slicer: roster.order()[0],
                penalty: 1,
            }]
        );
    }

    #[test]
    fn delayed_release_holds_the_wave_open() {
        let route = route(100);
        let mut roster = Roster::from_plan(&plan(&[(SlicerKind::Slicer, 30)]), 1);
        let mut economy = economy();
        let mut events = Vec::new();

        for frame in 0..30 {
            let progress = process_roster(
                &mut roster,
                &route,
                frame,
                TimeScale::NORMAL,
                &mut economy,
                &mut events,
            );
            assert_eq!(progress, WaveProgress::Running);
            let waiting = roster.get(roster.order()[0]).expect("unit exists");
            assert_eq!(waiting.route_index(), 0);
            assert!(waiting.position().is_none());
        }

        let _ = process_roster(
            &mut roster,
            &route,
            30,
            TimeScale::NORMAL,
            &mut economy,
            &mut events,
        );
        let released = roster.get(roster.order()[0]).expect("unit exists");
        assert_eq!(released.route_index(), 8);
    }

    #[test]
    fn last_life_fails_the_wave_immediately() {
        let route = route(4);
        let mut roster = Roster::from_plan(
            &plan(&[(SlicerKind::Slicer, 0), (SlicerKind::Slicer, 0)]),
            1,
        );
        let mut economy = Economy { cash: 0, lives: 1 };
        let mut events = Vec::new();

        let first = process_roster(
            &mut roster,
            &route,
            0,
            TimeScale::NORMAL,
            &mut economy,
            &mut events,
        );
        assert_eq!(first, WaveProgress::Running);

        let second = process_roster(
            &mut roster,
            &route,
            1,
            TimeScale::NORMAL,
            &mut economy,
            &mut events,
        );
        assert_eq!(second, WaveProgress::LivesExhausted);
        assert_eq!(economy.lives, 0, "lives never underflow");
        // The scan stops at the first fatal escape.
        let untouched = roster.get(roster.order()[0]).expect("unit exists");
        assert_eq!(untouched.state(), SlicerState::PendingPenalty);
        assert_eq!(events.len(), 1);
    }
}
