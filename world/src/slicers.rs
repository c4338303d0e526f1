//! Arena of hostile units and their per-tick route movement.

use shadow_defend_core::{
    Point, Rect, Route, SlicerId, SlicerKind, SlicerSnapshot, TimeScale, WavePlan,
};
use shadow_defend_system_targeting::Candidate;

/// Route samples separating consecutive children released by a dying parent.
const CHILD_SPACING: usize = 100;

/// Resolution state of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SlicerState {
    /// Waiting for release or travelling the route.
    Alive,
    /// Destroyed; reward and children have not been handed out yet.
    PendingReward,
    /// Reached the end of the route; lives have not been charged yet.
    PendingPenalty,
    /// Fully accounted for.
    Resolved,
}

/// Where a unit was last drawn on the route.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Placement {
    position: Point,
    heading: f64,
    bounds: Rect,
}

/// Hostile unit stored in the [`Roster`] arena.
#[derive(Clone, Debug)]
pub(crate) struct Slicer {
    id: SlicerId,
    kind: SlicerKind,
    wave: u32,
    health: f64,
    penalty: u32,
    route_index: usize,
    spawn_delay: u32,
    state: SlicerState,
    placement: Option<Placement>,
    children: Vec<SlicerId>,
}

impl Slicer {
    fn new(id: SlicerId, kind: SlicerKind, wave: u32, spawn_delay: u32) -> Self {
        Self {
            id,
            kind,
            wave,
            health: kind.stats().health,
            penalty: 0,
            route_index: 0,
            spawn_delay,
            state: SlicerState::Alive,
            placement: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn state(&self) -> SlicerState {
        self.state
    }

    pub(crate) fn health(&self) -> f64 {
        self.health
    }

    pub(crate) fn penalty(&self) -> u32 {
        self.penalty
    }

    pub(crate) fn reward(&self) -> u32 {
        self.kind.stats().reward
    }

    pub(crate) fn route_index(&self) -> usize {
        self.route_index
    }

    pub(crate) fn spawn_delay(&self) -> u32 {
        self.spawn_delay
    }

    pub(crate) fn position(&self) -> Option<Point> {
        self.placement.map(|placement| placement.position)
    }

    pub(crate) fn bounds(&self) -> Option<Rect> {
        self.placement.map(|placement| placement.bounds)
    }

    pub(crate) fn children(&self) -> &[SlicerId] {
        &self.children
    }

    pub(crate) fn mark_resolved(&mut self) {
        debug_assert!(
            matches!(
                self.state,
                SlicerState::PendingReward | SlicerState::PendingPenalty
            ),
            "only pending units can be resolved"
        );
        self.state = SlicerState::Resolved;
    }

    /// Reports whether the unit can be targeted or damaged.
    pub(crate) fn is_live(&self) -> bool {
        self.state == SlicerState::Alive && self.placement.is_some() && self.health > 0.0
    }

    /// Moves the unit to its current route sample, then skips ahead
    /// `time_scale × floor(speed × 4)` samples.
    ///
    /// A unit whose index runs past the end of the route becomes
    /// [`SlicerState::PendingPenalty`].
    pub(crate) fn advance(&mut self, route: &Route, time_scale: TimeScale) {
        if self.state != SlicerState::Alive {
            return;
        }

        let Some(sample) = route.get(self.route_index) else {
            self.state = SlicerState::PendingPenalty;
            return;
        };

        let stats = self.kind.stats();
        self.placement = Some(Placement {
            position: sample.point,
            heading: sample.heading,
            bounds: Rect::centered_at(sample.point, stats.width, stats.height),
        });

        let stride = time_scale.get() as usize * self.kind.route_stride();
        self.route_index += stride;
        if self.route_index >= route.len() {
            self.state = SlicerState::PendingPenalty;
        }
    }

    fn snapshot(&self) -> Option<SlicerSnapshot> {
        if self.state != SlicerState::Alive {
            return None;
        }
        let placement = self.placement?;
        Some(SlicerSnapshot {
            id: self.id,
            kind: self.kind,
            wave: self.wave,
            position: placement.position,
            heading: placement.heading,
            bounds: placement.bounds,
            health: self.health,
        })
    }
}

/// Flat arena of units plus the release order of the current wave.
///
/// Children are allocated with their parent but stay latent until the parent
/// dies and they are spliced into `order`.
#[derive(Clone, Debug, Default)]
pub(crate) struct Roster {
    arena: Vec<Slicer>,
    order: Vec<SlicerId>,
}

impl Roster {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Builds the roster for a wave from its release plan.
    pub(crate) fn from_plan(plan: &WavePlan, wave: u32) -> Self {
        let mut roster = Self::new();
        for spawn in plan.spawns() {
            let id = roster.spawn(spawn.kind, wave, spawn.delay_ticks);
            roster.order.push(id);
        }
        roster
    }

    /// Allocates a unit and, depth first, all of its descendants.
    ///
    /// Descendants always receive larger identifiers than their ancestors, so
    /// penalties are folded bottom-up by walking the new range backwards.
    pub(crate) fn spawn(&mut self, kind: SlicerKind, wave: u32, spawn_delay: u32) -> SlicerId {
        let first = self.arena.len();
        let root = self.allocate(kind, wave, spawn_delay);

        let mut pending = vec![root];
        while let Some(parent) = pending.pop() {
            let parent_kind = self.arena[index_of(parent)].kind;
            for &child_kind in parent_kind.children() {
                let child = self.allocate(child_kind, wave, 0);
                self.arena[index_of(parent)].children.push(child);
                pending.push(child);
            }
        }

        for index in (first..self.arena.len()).rev() {
            let slicer = &self.arena[index];
            let penalty = if slicer.children.is_empty() {
                slicer.kind.penalty()
            } else {
                slicer
                    .children
                    .iter()
                    .map(|child| self.arena[index_of(*child)].penalty)
                    .sum()
            };
            self.arena[index].penalty = penalty;
        }

        root
    }

    fn allocate(&mut self, kind: SlicerKind, wave: u32, spawn_delay: u32) -> SlicerId {
        let id = SlicerId::new(self.arena.len() as u32);
        self.arena.push(Slicer::new(id, kind, wave, spawn_delay));
        id
    }

    pub(crate) fn get(&self, id: SlicerId) -> Option<&Slicer> {
        self.arena.get(index_of(id))
    }

    pub(crate) fn get_mut(&mut self, id: SlicerId) -> Option<&mut Slicer> {
        self.arena.get_mut(index_of(id))
    }

    /// Units participating in the wave, in scan order.
    pub(crate) fn order(&self) -> &[SlicerId] {
        &self.order
    }

    /// Inserts released children in front of the roster position `at`.
    pub(crate) fn splice(&mut self, at: usize, children: &[SlicerId]) {
        let at = at.min(self.order.len());
        let _ = self.order.splice(at..at, children.iter().copied());
    }

    /// Live units in scan order, as seen by targeting.
    pub(crate) fn candidates(&self) -> impl Iterator<Item = Candidate> + '_ {
        self.order.iter().filter_map(|id| {
            let slicer = self.get(*id)?;
            if !slicer.is_live() {
                return None;
            }
            let placement = slicer.placement?;
            Some(Candidate {
                id: slicer.id,
                position: placement.position,
                bounds: placement.bounds,
            })
        })
    }

    /// Subtracts `amount` from the unit's health.
    ///
    /// At zero health the unit becomes [`SlicerState::PendingReward`] and its
    /// children are positioned behind it, `CHILD_SPACING` samples apart.
    /// Returns `true` when this call destroyed the unit. Damage to units that
    /// are not alive is ignored.
    pub(crate) fn deduct_health(&mut self, id: SlicerId, amount: f64) -> bool {
        let Some(slicer) = self.arena.get_mut(index_of(id)) else {
            return false;
        };
        if slicer.state != SlicerState::Alive {
            return false;
        }

        slicer.health -= amount;
        if slicer.health > 0.0 {
            return false;
        }

        slicer.health = 0.0;
        slicer.state = SlicerState::PendingReward;
        let parent_index = slicer.route_index;
        let children = std::mem::take(&mut slicer.children);

        for (ordinal, child) in children.iter().enumerate() {
            if let Some(child) = self.arena.get_mut(index_of(*child)) {
                child.route_index = parent_index.saturating_sub(CHILD_SPACING * ordinal);
            }
        }

        self.arena[index_of(id)].children = children;
        true
    }

    /// Snapshots of units currently drawn on the route.
    pub(crate) fn snapshots(&self) -> Vec<SlicerSnapshot> {
        self.order
            .iter()
            .filter_map(|id| self.get(*id).and_then(Slicer::snapshot))
            .collect()
    }
}

fn index_of(id: SlicerId) -> usize {
    id.get() as usize
}
