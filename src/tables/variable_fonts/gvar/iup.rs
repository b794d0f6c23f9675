//! Inferred deltas for un-referenced point numbers.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/gvar#inferred-deltas-for-un-referenced-point-numbers>

use std::iter;

use itertools::Itertools;
use pathfinder_geometry::vector::{vec2f, Vector2F};

use super::Point;

/// Fill in the deltas of untouched points (`None`) from the touched points of the same contour.
///
/// Contours without any touched points are left untouched. Points after the last contour (the
/// phantom points) are never inferred.
pub(super) fn interpolate_untouched(
    points: &[Point],
    end_points: &[u16],
    deltas: &mut [Option<Vector2F>],
) {
    let contour_ends = end_points.iter().map(|&end| usize::from(end) + 1);
    for (start, end) in iter::once(0).chain(contour_ends).tuple_windows() {
        if start >= end || end > points.len() || end > deltas.len() {
            // Malformed contour
            continue;
        }
        interpolate_contour(&points[start..end], &mut deltas[start..end]);
    }
}

fn interpolate_contour(points: &[Point], deltas: &mut [Option<Vector2F>]) {
    let touched = deltas.iter().positions(Option::is_some).collect::<Vec<_>>();
    match touched.as_slice() {
        [] => {}
        &[reference] => {
            // If exactly one point from the contour is referenced then every point in that
            // contour uses the same delta as that point.
            let shift = deltas[reference];
            deltas.iter_mut().for_each(|delta| *delta = shift);
        }
        _ => {
            let len = points.len();
            for (&prev, &next) in touched.iter().circular_tuple_windows() {
                let mut target = (prev + 1) % len;
                while target != next {
                    deltas[target] = infer_delta(points, deltas, target, prev, next);
                    target = (target + 1) % len;
                }
            }
        }
    }
}

fn infer_delta(
    points: &[Point],
    deltas: &[Option<Vector2F>],
    target: usize,
    prev: usize,
    next: usize,
) -> Option<Vector2F> {
    let prev_delta = deltas[prev]?;
    let next_delta = deltas[next]?;
    let (prev_coord, target_coord, next_coord) = (points[prev], points[target], points[next]);

    Some(vec2f(
        do_infer(
            prev_coord.0,
            target_coord.0,
            next_coord.0,
            prev_delta.x(),
            next_delta.x(),
        ),
        do_infer(
            prev_coord.1,
            target_coord.1,
            next_coord.1,
            prev_delta.y(),
            next_delta.y(),
        ),
    ))
}

fn do_infer(
    prev_coord: i16,
    target_coord: i16,
    next_coord: i16,
    prev_delta: f32,
    next_delta: f32,
) -> f32 {
    if prev_coord == next_coord {
        if prev_delta == next_delta {
            prev_delta
        } else {
            0.
        }
    } else if target_coord <= prev_coord.min(next_coord) {
        // Not between the adjacent points: use the delta of the closer one.
        if prev_coord < next_coord {
            prev_delta
        } else {
            next_delta
        }
    } else if target_coord >= prev_coord.max(next_coord) {
        if prev_coord > next_coord {
            prev_delta
        } else {
            next_delta
        }
    } else {
        let proportion = (f32::from(target_coord) - f32::from(prev_coord))
            / (f32::from(next_coord) - f32::from(prev_coord));
        (1. - proportion) * prev_delta + proportion * next_delta
    }
}
