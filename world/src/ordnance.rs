//! Projectiles and area charges owned by defenses.

use glam::DVec2;
use shadow_defend_core::{
    DefenseId, OrdnanceKind, OrdnanceSnapshot, Point, Rect, SlicerId, TimeScale,
};
use shadow_defend_system_targeting::overlapping;

use crate::slicers::Roster;

/// Distance a projectile covers per tick at a time scale of one.
const PROJECTILE_SPEED: f64 = 10.0;
const PROJECTILE_SIZE: f64 = 12.0;

/// Half-width of the square blast area of a charge.
const CHARGE_RADIUS: f64 = 200.0;
const CHARGE_DAMAGE: f64 = 500.0;
/// Ticks between a charge being dropped and detonating.
const CHARGE_FUSE: u32 = 120;

/// Outcome of resolving an ordnance item for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// The item stays in flight or at rest.
    Keep,
    /// The item hit, missed, or lost its target and is discarded.
    Spent,
    /// An area charge exploded and is discarded.
    Detonated {
        /// Units caught in the blast.
        hits: u32,
    },
}

#[derive(Clone, Debug)]
pub(crate) enum Ordnance {
    Projectile(Projectile),
    AreaCharge(AreaCharge),
}

impl Ordnance {
    pub(crate) fn projectile(origin: Point, damage: u32, range: Rect) -> Self {
        Self::Projectile(Projectile {
            position: origin,
            bounds: Rect::centered_at(origin, PROJECTILE_SIZE, PROJECTILE_SIZE),
            damage,
            range,
            target: None,
        })
    }

    pub(crate) fn area_charge(position: Point) -> Self {
        Self::AreaCharge(AreaCharge {
            bounds: Rect::around(position, CHARGE_RADIUS),
            position,
            countdown: CHARGE_FUSE,
        })
    }

    /// Advances the item by one tick.
    ///
    /// `in_range` is the unit the owner acquired this tick, if any. Unbound
    /// projectiles lock onto it.
    pub(crate) fn resolve(
        &mut self,
        roster: &mut Roster,
        time_scale: TimeScale,
        in_range: Option<SlicerId>,
    ) -> Resolution {
        match self {
            Self::Projectile(projectile) => projectile.resolve(roster, time_scale, in_range),
            Self::AreaCharge(charge) => charge.resolve(roster, time_scale),
        }
    }

    pub(crate) fn snapshot(&self, owner: DefenseId) -> OrdnanceSnapshot {
        match self {
            Self::Projectile(projectile) => OrdnanceSnapshot {
                owner,
                kind: OrdnanceKind::Projectile,
                position: projectile.position,
                bounds: projectile.bounds,
            },
            Self::AreaCharge(charge) => OrdnanceSnapshot {
                owner,
                kind: OrdnanceKind::AreaCharge,
                position: charge.position,
                bounds: charge.bounds,
            },
        }
    }
}

/// Homing shot that damages a single unit.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    position: Point,
    bounds: Rect,
    damage: u32,
    /// Detection area of the owner; leaving it discards the shot.
    range: Rect,
    target: Option<SlicerId>,
}

impl Projectile {
    fn resolve(
        &mut self,
        roster: &mut Roster,
        time_scale: TimeScale,
        in_range: Option<SlicerId>,
    ) -> Resolution {
        if self.target.is_none() {
            self.target = in_range;
        }

        if !self.range.intersects(&self.bounds) {
            return Resolution::Spent;
        }

        let Some(target) = self.target else {
            return Resolution::Spent;
        };
        let Some(slicer) = roster.get(target) else {
            return Resolution::Spent;
        };
        let (Some(target_position), Some(target_bounds)) = (slicer.position(), slicer.bounds())
        else {
            return Resolution::Spent;
        };
        let target_health = slicer.health();

        if target_bounds.intersects(&self.bounds) {
            if target_health > 0.0 {
                let _ = roster.deduct_health(target, f64::from(self.damage));
            }
            return Resolution::Spent;
        }

        let from = DVec2::new(self.position.x, self.position.y);
        let to = DVec2::new(target_position.x, target_position.y);
        let step = (to - from).normalize_or_zero() * PROJECTILE_SPEED * f64::from(time_scale.get());
        let next = from + step;
        self.position = Point::new(next.x, next.y);
        self.bounds = Rect::centered_at(self.position, PROJECTILE_SIZE, PROJECTILE_SIZE);
        Resolution::Keep
    }
}

/// Stationary explosive that damages every live unit in its blast area.
#[derive(Clone, Debug)]
pub(crate) struct AreaCharge {
    position: Point,
    bounds: Rect,
    countdown: u32,
}

impl AreaCharge {
    fn resolve(&mut self, roster: &mut Roster, time_scale: TimeScale) -> Resolution {
        if self.countdown > 0 {
            self.countdown = self.countdown.saturating_sub(time_scale.get());
            return Resolution::Keep;
        }

        let caught: Vec<SlicerId> = overlapping(self.bounds, roster.candidates())
            .map(|candidate| candidate.id)
            .collect();
        for id in &caught {
            let _ = roster.deduct_health(*id, CHARGE_DAMAGE);
        }
        Resolution::Detonated {
            hits: caught.len() as u32,
        }
    }
}
