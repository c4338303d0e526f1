#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure targeting and collision queries over live units.
//!
//! Every spatial test is an axis-aligned rectangle intersection. Sprites are
//! drawn rotated but collision footprints never are.

use shadow_defend_core::{Point, Rect, SlicerId};

/// Live unit considered by targeting and area damage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Identifier of the unit.
    pub id: SlicerId,
    /// Current position of the unit.
    pub position: Point,
    /// Current collision footprint of the unit.
    pub bounds: Rect,
}

/// Selects the candidate nearest to `origin` whose footprint intersects
/// `detection`.
///
/// Distances are exact Euclidean lengths. When several candidates are equally
/// near, the first one in iteration order wins.
#[must_use]
pub fn nearest_in_range<I>(origin: Point, detection: Rect, candidates: I) -> Option<Candidate>
where
    I: IntoIterator<Item = Candidate>,
{
    let mut best: Option<BestCandidate> = None;

    for candidate in candidates {
        if !candidate.bounds.intersects(&detection) {
            continue;
        }

        let current = BestCandidate {
            distance: origin.distance(candidate.position),
            candidate,
        };

        match &mut best {
            Some(existing) => {
                if current.precedes(existing) {
                    *existing = current;
                }
            }
            None => best = Some(current),
        }
    }

    best.map(|found| found.candidate)
}

/// Candidates whose footprints intersect `area`, in iteration order.
pub fn overlapping<I>(area: Rect, candidates: I) -> impl Iterator<Item = Candidate>
where
    I: IntoIterator<Item = Candidate>,
{
    candidates
        .into_iter()
        .filter(move |candidate| candidate.bounds.intersects(&area))
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BestCandidate {
    distance: f64,
    candidate: Candidate,
}

impl BestCandidate {
    fn precedes(&self, other: &Self) -> bool {
        self.distance < other.distance
    }
}
