#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that discretises a route polyline into dense samples.
//!
//! Units never interpolate between route samples. Instead every segment of
//! the polyline is walked in fixed quarter-unit increments so that any whole
//! number of samples skipped per tick lands exactly on a stored point.

use glam::DVec2;
use shadow_defend_core::{Point, Rect, Route, RouteSample, ROUTE_SAMPLE_SPACING};

/// Samples `polyline` into a [`Route`], dropping points outside `playable`.
///
/// Each segment contributes samples starting at its first vertex and stopping
/// once the remaining distance to its second vertex is at most one sample
/// spacing. Zero-length segments contribute nothing.
#[must_use]
pub fn sample_route(polyline: &[Point], playable: Rect) -> Route {
    let mut samples = Vec::new();

    for pair in polyline.windows(2) {
        let start = DVec2::new(pair[0].x, pair[0].y);
        let end = DVec2::new(pair[1].x, pair[1].y);
        let between = end - start;
        let length = between.length();
        if length <= f64::EPSILON {
            continue;
        }

        let direction = between / length;
        let heading = heading_of(direction);

        let mut step = 0_u32;
        let mut cursor = start;
        while cursor.distance(end) > ROUTE_SAMPLE_SPACING {
            let point = Point::new(cursor.x, cursor.y);
            if playable.contains(point) {
                samples.push(RouteSample { point, heading });
            }

            step += 1;
            cursor = start + direction * (ROUTE_SAMPLE_SPACING * f64::from(step));
        }
    }

    Route::from_samples(samples)
}

/// Angle between east and `direction`, negative when pointing towards -y.
fn heading_of(direction: DVec2) -> f64 {
    let angle = direction.x.clamp(-1.0, 1.0).acos();
    if direction.y < 0.0 {
        -angle
    } else {
        angle
    }
}
