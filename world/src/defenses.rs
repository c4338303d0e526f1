//! Player defenses and their per-tick attack behaviour.

use std::f64::consts::{FRAC_PI_2, PI};

use rand::Rng;
use shadow_defend_core::{
    DefenseId, DefenseKind, DefenseProfile, DefenseSnapshot, Event, OrdnanceSnapshot, Point,
    Rect, SlicerId, TimeScale,
};
use shadow_defend_system_targeting::nearest_in_range;
use tracing::debug;

use crate::{
    ordnance::{Ordnance, Resolution},
    slicers::Roster,
};

/// Direction a passive defense travels after entering the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Axis {
    /// Enters at the left edge and flies east.
    Horizontal,
    /// Enters at the top edge and flies south.
    Vertical,
}

impl Axis {
    pub(crate) fn flipped(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }

    /// Point where a passive defense requested at `point` enters the field.
    pub(crate) fn entry_point(self, point: Point, playable: Rect) -> Point {
        match self {
            Self::Horizontal => Point::new(playable.left(), point.y),
            Self::Vertical => Point::new(point.x, playable.top()),
        }
    }

    fn heading(self) -> f64 {
        match self {
            Self::Horizontal => FRAC_PI_2,
            Self::Vertical => PI,
        }
    }
}

#[derive(Clone, Debug)]
enum Behavior {
    Active {
        cooldown: i32,
        time_to_fire: i32,
        damage: u32,
        detection: Rect,
    },
    Passive {
        axis: Axis,
        speed: f64,
        max_drop_interval: u32,
        drop_countdown: u32,
    },
}

/// Defense placed on the field together with the ordnance it owns.
#[derive(Clone, Debug)]
pub(crate) struct Defense {
    id: DefenseId,
    kind: DefenseKind,
    position: Point,
    heading: f64,
    bounds: Option<Rect>,
    behavior: Behavior,
    ordnance: Vec<Ordnance>,
}

impl Defense {
    /// Builds a defense of `kind` at `position`.
    ///
    /// Active defenses start with a full cooldown. Passive defenses start at
    /// `position` and travel along `axis`; their first drop happens after a
    /// random interval.
    pub(crate) fn new<R: Rng + ?Sized>(
        id: DefenseId,
        kind: DefenseKind,
        position: Point,
        axis: Axis,
        rng: &mut R,
    ) -> Self {
        let (width, height) = kind.footprint();
        let (behavior, heading) = match kind.profile() {
            DefenseProfile::Active {
                radius,
                cooldown,
                damage,
            } => (
                Behavior::Active {
                    cooldown,
                    time_to_fire: cooldown,
                    damage,
                    detection: Rect::around(position, radius),
                },
                0.0,
            ),
            DefenseProfile::Passive {
                speed,
                max_drop_interval,
            } => (
                Behavior::Passive {
                    axis,
                    speed,
                    max_drop_interval,
                    drop_countdown: rng.gen_range(0..=max_drop_interval),
                },
                axis.heading(),
            ),
        };

        Self {
            id,
            kind,
            position,
            heading,
            bounds: Some(Rect::centered_at(position, width, height)),
            behavior,
            ordnance: Vec::new(),
        }
    }

    pub(crate) fn id(&self) -> DefenseId {
        self.id
    }

    pub(crate) fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    pub(crate) fn is_passive(&self) -> bool {
        matches!(self.behavior, Behavior::Passive { .. })
    }

    pub(crate) fn has_ordnance(&self) -> bool {
        !self.ordnance.is_empty()
    }

    /// Takes the defense off the field. Owned ordnance keeps resolving.
    pub(crate) fn retire(&mut self) {
        self.bounds = None;
    }

    pub(crate) fn clear_ordnance(&mut self) {
        self.ordnance.clear();
    }

    /// Runs one tick of targeting or dropping, then resolves owned ordnance.
    ///
    /// Retired defenses skip the first step.
    pub(crate) fn attack<R: Rng + ?Sized>(
        &mut self,
        roster: &mut Roster,
        time_scale: TimeScale,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) {
        let acquired = if self.bounds.is_some() {
            match &mut self.behavior {
                Behavior::Active {
                    cooldown,
                    time_to_fire,
                    damage,
                    detection,
                } => {
                    if *time_to_fire > 0 {
                        *time_to_fire -= time_scale.get() as i32;
                        None
                    } else if let Some(target) =
                        nearest_in_range(self.position, *detection, roster.candidates())
                    {
                        self.ordnance
                            .push(Ordnance::projectile(self.position, *damage, *detection));
                        *time_to_fire = *cooldown;
                        // Sprites point north at zero rotation.
                        self.heading = (target.position.y - self.position.y)
                            .atan2(target.position.x - self.position.x)
                            + FRAC_PI_2;
                        debug!(
                            defense = self.id.get(),
                            target = target.id.get(),
                            "projectile fired"
                        );
                        out_events.push(Event::ProjectileFired {
                            defense: self.id,
                            target: target.id,
                        });
                        Some(target.id)
                    } else {
                        None
                    }
                }
                Behavior::Passive {
                    axis,
                    speed,
                    max_drop_interval,
                    drop_countdown,
                } => {
                    if *drop_countdown == 0 {
                        *drop_countdown = rng.gen_range(0..=*max_drop_interval);
                        self.ordnance.push(Ordnance::area_charge(self.position));
                        out_events.push(Event::ChargeDropped {
                            defense: self.id,
                            position: self.position,
                        });
                    } else {
                        *drop_countdown = drop_countdown.saturating_sub(time_scale.get());
                    }

                    let step = *speed * f64::from(time_scale.get());
                    self.position = match axis {
                        Axis::Horizontal => self.position.offset(step, 0.0),
                        Axis::Vertical => self.position.offset(0.0, step),
                    };
                    let (width, height) = self.kind.footprint();
                    self.bounds = Some(Rect::centered_at(self.position, width, height));
                    None
                }
            }
        } else {
            None
        };

        self.resolve_ordnance(roster, time_scale, acquired, out_events);
    }

    fn resolve_ordnance(
        &mut self,
        roster: &mut Roster,
        time_scale: TimeScale,
        acquired: Option<SlicerId>,
        out_events: &mut Vec<Event>,
    ) {
        let owner = self.id;
        self.ordnance
            .retain_mut(|item| match item.resolve(roster, time_scale, acquired) {
                Resolution::Keep => true,
                Resolution::Spent => false,
                Resolution::Detonated { hits } => {
                    debug!(defense = owner.get(), hits, "charge detonated");
                    out_events.push(Event::ChargeDetonated {
                        defense: owner,
                        hits,
                    });
                    false
                }
            });
    }

    pub(crate) fn snapshot(&self) -> DefenseSnapshot {
        DefenseSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            heading: self.heading,
            bounds: self.bounds,
        }
    }

    pub(crate) fn ordnance_snapshots(&self) -> impl Iterator<Item = OrdnanceSnapshot> + '_ {
        self.ordnance.iter().map(|item| item.snapshot(self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::{Axis, Defense};
    use crate::slicers::Roster;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use shadow_defend_core::{
        DefenseId, DefenseKind, Event, Point, Rect, Route, RouteSample, SlicerId, SlicerKind,
        TimeScale,
    };

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn roster_at(kind: SlicerKind, point: Point) -> (Roster, SlicerId) {
        let mut roster = Roster::new();
        let id = roster.spawn(kind, 1, 0);
        let route = Route::from_samples(vec![
            RouteSample {
                point,
                heading: 0.0,
            };
            64
        ]);
        roster
            .get_mut(id)
            .expect("unit exists")
            .advance(&route, TimeScale::NORMAL);
        roster.splice(0, &[id]);
        (roster, id)
    }

    fn tank() -> Defense {
        Defense::new(
            DefenseId::new(0),
            DefenseKind::Tank,
            Point::new(200.0, 200.0),
            Axis::Horizontal,
            &mut rng(),
        )
    }

    #[test]
    fn tank_fires_at_unit_touching_detection_edge() {
        // Footprint spans 300..348, touching the detection edge at 300.
        let (mut roster, id) = roster_at(SlicerKind::Slicer, Point::new(324.0, 200.0));
        let mut defense = tank();
        let mut events = Vec::new();
        let mut rng = rng();

        for _ in 0..60 {
            defense.attack(&mut roster, TimeScale::NORMAL, &mut rng, &mut events);
        }
        assert!(events.is_empty(), "a fresh tank waits out its cooldown");

        defense.attack(&mut roster, TimeScale::NORMAL, &mut rng, &mut events);
        assert_eq!(
            events,
            vec![Event::ProjectileFired {
                defense: DefenseId::new(0),
                target: id,
            }]
        );
        assert!(defense.has_ordnance());
        assert!((defense.snapshot().heading - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn tank_ignores_unit_just_outside_detection() {
        let (mut roster, _) = roster_at(SlicerKind::Slicer, Point::new(325.0, 200.0));
        let mut defense = tank();
        let mut events = Vec::new();
        let mut rng = rng();

        for _ in 0..61 {
            defense.attack(&mut roster, TimeScale::NORMAL, &mut rng, &mut events);
        }

        assert!(events.is_empty());
        assert!(!defense.has_ordnance());
    }

    #[test]
    fn cooldown_delays_the_next_shot() {
        let (mut roster, _) = roster_at(SlicerKind::Slicer, Point::new(290.0, 200.0));
        let mut defense = tank();
        let mut events = Vec::new();
        let mut rng = rng();

        for _ in 0..122 {
            defense.attack(&mut roster, TimeScale::NORMAL, &mut rng, &mut events);
        }
        let fired = events
            .iter()
            .filter(|event| matches!(event, Event::ProjectileFired { .. }))
            .count();
        assert_eq!(fired, 1, "a slicer dies to the first shot");

        let mut fresh = tank();
        let mut events = Vec::new();
        let (mut tough, _) = roster_at(SlicerKind::ApexSlicer, Point::new(290.0, 200.0));
        for _ in 0..122 {
            fresh.attack(&mut tough, TimeScale::NORMAL, &mut rng, &mut events);
        }
        let fired = events
            .iter()
            .filter(|event| matches!(event, Event::ProjectileFired { .. }))
            .count();
        // Shots on ticks 60 and 121, the next one is due on tick 182.
        assert_eq!(fired, 2);
    }

    #[test]
    fn air_support_flies_along_its_axis_and_drops_charges() {
        let mut roster = Roster::new();
        let mut rng = rng();
        let mut defense = Defense::new(
            DefenseId::new(3),
            DefenseKind::AirSupport,
            Point::new(0.0, 300.0),
            Axis::Horizontal,
            &mut rng,
        );
        let mut events = Vec::new();

        for _ in 0..200 {
            defense.attack(&mut roster, TimeScale::NORMAL, &mut rng, &mut events);
        }

        let snapshot = defense.snapshot();
        assert_eq!(snapshot.position, Point::new(1_000.0, 300.0));
        assert_eq!(snapshot.heading, std::f64::consts::FRAC_PI_2);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::ChargeDropped { .. })));
    }

    #[test]
    fn retired_defense_only_resolves_ordnance() {
        let mut roster = Roster::new();
        let mut rng = rng();
        let mut defense = Defense::new(
            DefenseId::new(1),
            DefenseKind::AirSupport,
            Point::new(400.0, 100.0),
            Axis::Vertical,
            &mut rng,
        );
        let mut events = Vec::new();
        while !defense.has_ordnance() {
            defense.attack(&mut roster, TimeScale::NORMAL, &mut rng, &mut events);
        }
        let parked = defense.snapshot().position;

        defense.retire();
        for _ in 0..130 {
            defense.attack(&mut roster, TimeScale::NORMAL, &mut rng, &mut events);
        }

        assert_eq!(defense.snapshot().position, parked);
        assert!(!defense.has_ordnance(), "charge detonated after its fuse");
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::ChargeDetonated { hits: 0, .. })));
    }

    #[test]
    fn entry_points_hug_playable_edges() {
        let playable = Rect::new(0.0, 100.0, 1024.0, 643.0);
        let point = Point::new(512.0, 400.0);
        assert_eq!(
            Axis::Horizontal.entry_point(point, playable),
            Point::new(0.0, 400.0)
        );
        assert_eq!(
            Axis::Vertical.entry_point(point, playable),
            Point::new(512.0, 100.0)
        );
        assert_eq!(Axis::Horizontal.flipped(), Axis::Vertical);
    }
}
