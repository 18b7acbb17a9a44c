use glam::Vec3;

use crate::common::WorldVecExt;

/// Order a map route into the waypoints to walk from `player`.
///
/// The route is oriented so that its endpoint nearest the player comes first.
/// With `only_closest` only the nearest point is returned. Otherwise the walk starts
/// at the nearest point and runs to the end of the oriented route, then back again
/// when `there_and_back` is set.
pub fn plan_waypoints(route: &[Vec3], player: Vec3, only_closest: bool, there_and_back: bool) -> Vec<Vec3> {
    let (Some(first), Some(last)) = (route.first(), route.last()) else {
        return Vec::new();
    };

    let mut oriented = route.to_vec();
    if player.distance_xy(*last) < player.distance_xy(*first) {
        oriented.reverse();
    }

    let closest = closest_index(&oriented, player);
    if only_closest {
        return vec![oriented[closest]];
    }

    let mut waypoints = oriented[closest..].to_vec();
    if there_and_back && waypoints.len() > 1 {
        let back: Vec<Vec3> = waypoints.iter().rev().skip(1).copied().collect();
        waypoints.extend(back);
    }
    waypoints
}

fn closest_index(points: &[Vec3], player: Vec3) -> usize {
    points
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| player.distance_xy(**a).total_cmp(&player.distance_xy(**b)))
        .map_or(0, |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    const P1: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    const P2: Vec3 = Vec3::new(50.0, 0.0, 0.0);
    const P3: Vec3 = Vec3::new(100.0, 0.0, 0.0);

    #[test]
    fn empty_route_has_no_waypoints() {
        assert!(plan_waypoints(&[], P1, false, false).is_empty());
    }

    #[test]
    fn player_near_the_end_walks_the_route_reversed() {
        let player = Vec3::new(105.0, 3.0, 0.0);
        assert_eq!(plan_waypoints(&[P1, P2, P3], player, false, false), vec![P3, P2, P1]);
    }

    #[test]
    fn there_and_back_returns_to_the_start() {
        let player = Vec3::new(105.0, 3.0, 0.0);
        assert_eq!(
            plan_waypoints(&[P1, P2, P3], player, false, true),
            vec![P3, P2, P1, P2, P3]
        );
    }

    #[test]
    fn player_near_the_start_walks_forward() {
        let player = Vec3::new(-4.0, 0.0, 0.0);
        assert_eq!(plan_waypoints(&[P1, P2, P3], player, false, false), vec![P1, P2, P3]);
    }

    #[test]
    fn player_in_the_middle_walks_on_from_the_closest_point() {
        let p4 = Vec3::new(150.0, 0.0, 0.0);
        let player = Vec3::new(55.0, 0.0, 0.0);
        assert_eq!(plan_waypoints(&[P1, P2, P3, p4], player, false, false), vec![P2, P3, p4]);
    }

    #[test]
    fn only_closest_yields_a_single_point() {
        let player = Vec3::new(48.0, 10.0, 0.0);
        assert_eq!(plan_waypoints(&[P1, P2, P3], player, true, false), vec![P2]);
    }
}
