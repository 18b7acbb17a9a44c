use glam::{Vec2, Vec3};

use crate::common::geometry::{WorldVecExt, closest_point_on_segment};

/// Drop points that add little to the shape of the path.
///
/// A radial-distance pass removes points closer than `tolerance` to the previous
/// kept point, then Ramer-Douglas-Peucker removes points closer than `tolerance`
/// to the simplified line. Distances are planar. The first and last points always
/// survive.
pub fn simplify(points: &[Vec3], tolerance: f32) -> Vec<Vec3> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let sq_tolerance = tolerance * tolerance;
    let radial = simplify_radial(points, sq_tolerance);
    simplify_douglas_peucker(&radial, sq_tolerance)
}

fn simplify_radial(points: &[Vec3], sq_tolerance: f32) -> Vec<Vec3> {
    let Some((&first, rest)) = points.split_first() else {
        return Vec::new();
    };

    let mut kept = vec![first];
    let mut previous = first;
    for &point in rest {
        if point.as_vec2().distance_squared(previous.as_vec2()) > sq_tolerance {
            kept.push(point);
            previous = point;
        }
    }

    if let Some(&last) = points.last() {
        if previous != last {
            kept.push(last);
        }
    }
    kept
}

fn simplify_douglas_peucker(points: &[Vec3], sq_tolerance: f32) -> Vec<Vec3> {
    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    // explicit stack instead of recursion, long pathed routes have thousands of points
    let mut ranges = vec![(0, last)];
    while let Some((first, last)) = ranges.pop() {
        let (a, b) = (points[first].as_vec2(), points[last].as_vec2());
        let mut max_sq = sq_tolerance;
        let mut index = None;

        for (i, point) in points.iter().enumerate().take(last).skip(first + 1) {
            let sq = sq_segment_distance(point.as_vec2(), a, b);
            if sq > max_sq {
                max_sq = sq;
                index = Some(i);
            }
        }

        if let Some(i) = index {
            keep[i] = true;
            if i - first > 1 {
                ranges.push((first, i));
            }
            if last - i > 1 {
                ranges.push((i, last));
            }
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(point, keep)| keep.then_some(*point))
        .collect()
}

fn sq_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    p.distance_squared(closest_point_on_segment(a, b, p))
}
