use std::collections::VecDeque;
use std::sync::Arc;

use glam::Vec3;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tower::{Service, ServiceExt};
use tracing::{debug, info, warn};

use super::input::{MovementInput, PlayerTelemetry};
use super::path_simplify::simplify;
use super::pather::{Pather, PatherKind};
use super::pather_service::{BoxPathService, PathRequest, PatherServiceBuilder, into_pathing_error};
use super::stuck_detector::{ProgressStuckDetector, StuckDetector};
use crate::common::WorldVecExt;
use crate::common::geometry::{closest_point_on_segment, heading_difference, heading_to, route_length_xy};
use crate::config::{NavigationConfig, StuckConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationState {
    NoRoute,
    FollowingDirect,
    FollowingPathed,
    Arrived,
    Stuck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationEvent {
    WaypointReached,
    DestinationReached,
    PathCalculated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickResult {
    Continue,
    WaypointReached,
    DestinationReached,
    Cancelled,
}

pub struct NavigatorBuilder {
    config: NavigationConfig,
    stuck_config: StuckConfig,
    input: Arc<dyn MovementInput>,
    pather: Arc<dyn Pather>,
    stuck_detector: Option<Box<dyn StuckDetector>>,
}

impl NavigatorBuilder {
    pub fn new(config: NavigationConfig, input: Arc<dyn MovementInput>, pather: Arc<dyn Pather>) -> Self {
        Self {
            config,
            stuck_config: StuckConfig::default(),
            input,
            pather,
            stuck_detector: None,
        }
    }

    pub fn stuck_config(mut self, stuck_config: StuckConfig) -> Self {
        self.stuck_config = stuck_config;
        self
    }

    pub fn stuck_detector(mut self, stuck_detector: Box<dyn StuckDetector>) -> Self {
        self.stuck_detector = Some(stuck_detector);
        self
    }

    pub fn build(self) -> Navigator {
        let service = PatherServiceBuilder::new(self.pather).timeout(self.config.pathing_timeout());
        let pather_kind = service.kind();

        let input = self.input;
        let stuck = self.stuck_detector.unwrap_or_else(|| {
            Box::new(ProgressStuckDetector::new(self.stuck_config, input.clone()))
        });

        Navigator {
            avg_distance: self.config.min_distance,
            config: self.config,
            input,
            stuck,
            pather: service.build(),
            pather_kind,
            waypoints: VecDeque::new(),
            route: Vec::new(),
            last_distance: f32::MAX,
            last_active: None,
            state: NavigationState::NoRoute,
            following: NavigationState::FollowingDirect,
            events: VecDeque::new(),
        }
    }
}

/// Walks the player through a list of waypoints, one control tick at a time.
///
/// `route` is a stack of intermediate points towards the next waypoint; its last
/// element is the point currently walked at.
pub struct Navigator {
    config: NavigationConfig,
    input: Arc<dyn MovementInput>,
    stuck: Box<dyn StuckDetector>,
    pather: BoxPathService,
    pather_kind: PatherKind,

    waypoints: VecDeque<Vec3>,
    route: Vec<Vec3>,
    avg_distance: f32,
    last_distance: f32,
    last_active: Option<Instant>,
    state: NavigationState,
    following: NavigationState,
    events: VecDeque<NavigationEvent>,
}

impl Navigator {
    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn avg_distance(&self) -> f32 {
        self.avg_distance
    }

    pub fn has_waypoint(&self) -> bool {
        !self.waypoints.is_empty()
    }

    pub fn next_map_point(&self) -> Option<Vec3> {
        self.waypoints.front().copied()
    }

    /// Intermediate points towards the next waypoint, next point first.
    pub fn route_to_waypoint(&self) -> Vec<Vec3> {
        self.route.iter().rev().copied().collect()
    }

    /// Route points followed by the remaining waypoints, in walking order.
    pub fn total_route(&self) -> Vec<Vec3> {
        self.route
            .iter()
            .rev()
            .chain(self.waypoints.iter())
            .copied()
            .collect()
    }

    pub fn drain_events(&mut self) -> Vec<NavigationEvent> {
        self.events.drain(..).collect()
    }

    pub fn reached_distance(&self, mounted: bool) -> f32 {
        if mounted {
            self.config.min_distance_mount
        } else {
            self.config.min_distance
        }
    }

    /// Replace the waypoint list and restart from `NoRoute`.
    pub fn set_waypoints(&mut self, points: Vec<Vec3>) {
        self.route.clear();
        self.avg_distance = if points.len() > 1 {
            route_length_xy(&points) / points.len() as f32
        } else {
            self.config.min_distance
        };
        self.waypoints = points.into();
        self.last_distance = f32::MAX;
        self.state = NavigationState::NoRoute;

        debug!(
            "[Navigator] set waypoints: {} - avg distance: {}",
            self.waypoints.len(),
            self.avg_distance
        );
    }

    /// Continue after an external pause, dropping route state that can't be trusted.
    pub fn resume(&mut self, position: Vec3) {
        if self.pather_kind != PatherKind::Remote && !self.route.is_empty() {
            self.keep_route_if_trusted(position);
        }

        let mut removed = 0;
        while removed < self.config.max_resume_adjustments
            && self.adjust_next_waypoint_to_closest(position)
        {
            removed += 1;
        }
        if removed > 0 {
            debug!("[Navigator] resume: removed {} waypoint", removed);
        }
    }

    pub fn stop(&mut self) {
        if self.pather_kind == PatherKind::Remote {
            self.route.clear();
        }
        self.reset_stuck_parameters();
    }

    pub fn stop_movement(&self) {
        self.input.stop();
    }

    pub fn reset_stuck_parameters(&mut self) {
        self.stuck.reset_stuck_parameters();
    }

    /// One control tick.
    pub async fn update(&mut self, telemetry: &PlayerTelemetry, cancel: &CancellationToken) -> TickResult {
        if cancel.is_cancelled() {
            return TickResult::Cancelled;
        }

        let now = Instant::now();
        let active_recently = self
            .last_active
            .is_some_and(|last| now.duration_since(last) < self.config.activity_window());
        self.last_active = Some(now);

        let position = telemetry.position;
        let reach = self.reached_distance(telemetry.mounted);

        if self.route.is_empty()
            && !self.waypoints.is_empty()
            && !self.refill_route(position, reach, false, cancel).await
        {
            return TickResult::Cancelled;
        }

        let Some(&top) = self.route.last() else {
            return self.destination_reached();
        };

        let mut distance = position.distance_xy(top);
        if distance < reach {
            if self.config.simplify_route {
                self.reduce_by_distance(position, reach);
            } else {
                self.route.pop();
            }
            self.last_distance = f32::MAX;

            let Some(&next) = self.route.last() else {
                self.waypoints.pop_front();
                debug!(
                    "[Navigator] move to next waypoint! remains: {} -- distance: {}",
                    self.waypoints.len(),
                    distance
                );
                self.events.push_back(NavigationEvent::WaypointReached);
                return TickResult::WaypointReached;
            };

            self.stuck.set_target_location(next);
            self.correct_heading(telemetry, next);
            return TickResult::Continue;
        }

        if !self.stuck.is_getting_closer(position) {
            if self.last_distance < distance {
                self.adjust_next_waypoint_to_closest(position);
                if self.route.is_empty() {
                    // refilled towards the new next waypoint on the next tick
                    return TickResult::Continue;
                }
            }

            if active_recently {
                self.state = NavigationState::Stuck;
                warn!("[Navigator] not getting closer to {} - distance {}", top, distance);

                let recovered = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => false,
                    _ = self.stuck.unstick() => true,
                };
                if !recovered {
                    return TickResult::Cancelled;
                }

                self.state = self.following;
                distance = position.distance_xy(top);
            } else {
                info!("[Navigator] resume from stuck");
            }
        }

        self.correct_heading(telemetry, top);
        self.last_distance = distance;
        TickResult::Continue
    }

    /// Rebuild the route to the next waypoint now, asking the pather even for short
    /// hops when `force_pathing` is set. Returns `false` when cancelled.
    pub async fn refill_route_to_next_waypoint(
        &mut self,
        telemetry: &PlayerTelemetry,
        force_pathing: bool,
        cancel: &CancellationToken,
    ) -> bool {
        let reach = self.reached_distance(telemetry.mounted);
        self.refill_route(telemetry.position, reach, force_pathing, cancel).await
    }

    fn destination_reached(&mut self) -> TickResult {
        if self.state == NavigationState::NoRoute {
            return TickResult::Continue;
        }
        self.state = NavigationState::Arrived;
        self.events.push_back(NavigationEvent::DestinationReached);
        TickResult::DestinationReached
    }

    /// Build the route to the next waypoint. Returns `false` when cancelled.
    async fn refill_route(
        &mut self,
        position: Vec3,
        reach: f32,
        force_pathing: bool,
        cancel: &CancellationToken,
    ) -> bool {
        self.route.clear();
        self.state = NavigationState::FollowingDirect;

        while self
            .waypoints
            .front()
            .is_some_and(|w| position.distance_xy(*w) < reach)
        {
            self.waypoints.pop_front();
        }
        let Some(&target) = self.waypoints.front() else {
            return true;
        };

        let distance = position.distance_xy(target);
        let threshold = (self.avg_distance + self.config.min_distance).min(self.config.max_distance);
        if force_pathing || distance > threshold {
            info!(
                "[Navigator] refill route - {} - ask pathfinder {} -> {}",
                distance, position, target
            );
            self.input.stop();

            let Some(path) = self.find_route(position, target, cancel).await else {
                return false;
            };
            if path.is_empty() {
                warn!(
                    "[Navigator] unable to find path from {} -> {}. Character may become stuck!",
                    position, target
                );
            }

            let path = if self.config.simplify_route {
                simplify(&path, self.simplify_tolerance())
            } else {
                path
            };
            self.route = path.into_iter().rev().collect();

            if self.route.is_empty() {
                self.route.push(target);
            } else {
                self.state = NavigationState::FollowingPathed;
                self.events.push_back(NavigationEvent::PathCalculated);
            }
        } else {
            self.route.push(target);
        }

        self.following = self.state;
        if let Some(&top) = self.route.last() {
            self.stuck.set_target_location(top);
        }
        true
    }

    /// `None` when cancelled. Pathing failures come back as an empty path.
    async fn find_route(&mut self, from: Vec3, to: Vec3, cancel: &CancellationToken) -> Option<Vec<Vec3>> {
        let request = PathRequest { from, to };
        let pather = &mut self.pather;
        let call = async move { pather.ready().await?.call(request).await };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            result = call => result,
        };

        Some(result.unwrap_or_else(|err| {
            warn!("[Navigator] pathing failed: {}", into_pathing_error(err));
            Vec::new()
        }))
    }

    fn simplify_tolerance(&self) -> f32 {
        match self.pather_kind {
            PatherKind::Remote => self.config.remote_simplify_tolerance,
            PatherKind::Local => self.config.simplify_tolerance,
        }
    }

    fn reduce_by_distance(&mut self, position: Vec3, reach: f32) {
        while self
            .route
            .last()
            .is_some_and(|p| position.distance_xy(*p) < reach)
        {
            self.route.pop();
        }
    }

    fn correct_heading(&self, telemetry: &PlayerTelemetry, target: Vec3) {
        let heading = heading_to(telemetry.position, target);
        let diff = heading_difference(telemetry.heading, heading);

        if diff > self.config.stop_angle_radians {
            self.input.stop();
            self.input.turn_towards(heading, target);
            return;
        }
        if diff > self.config.dead_band_radians {
            self.input.turn_towards(heading, target);
        }
        self.input.set_forward(true);
    }

    /// Replace the next waypoint with the closest point on its segment to the one
    /// after. Returns `true` when the next waypoint was dropped instead.
    ///
    /// Either way the route towards the old waypoint is cleared.
    fn adjust_next_waypoint_to_closest(&mut self, position: Vec3) -> bool {
        if self.waypoints.len() < 2 {
            return false;
        }
        let Some(a) = self.waypoints.pop_front() else {
            return false;
        };
        let Some(&b) = self.waypoints.front() else {
            return false;
        };
        self.route.clear();
        self.last_distance = f32::MAX;

        let closest = closest_point_on_segment(a.as_vec2(), b.as_vec2(), position.as_vec2());
        let anchor = Vec3::new(closest.x, closest.y, a.z);
        if anchor.distance_xy(b) > self.config.min_distance {
            self.waypoints.push_front(anchor);
            debug!("[Navigator] adjusted resume point");
            return false;
        }

        debug!("[Navigator] skipped next point in path");
        true
    }

    fn keep_route_if_trusted(&mut self, position: Vec3) {
        let total = route_length_xy(&self.total_route());
        let half_max = self.config.max_distance / 2.0;
        let Some(&top) = self.route.last() else {
            return;
        };

        if total <= half_max {
            info!(
                "[Navigator] total distance {} <= {}. Have to clear route.",
                total, half_max
            );
            self.route.clear();
            return;
        }

        let distance = position.distance_xy(top);
        if distance > 2.0 * self.config.min_distance_mount {
            info!(
                "[Navigator] distance from nearest point is {}. Have to clear route.",
                distance
            );
            self.route.clear();
        } else {
            info!("[Navigator] distance is close {}. Keep route.", distance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PathingError;
    use crate::navigation::StraightLinePather;
    use crate::navigation::test_support::{MoveCommand, RecordingInput};
    use async_trait::async_trait;
    use std::f32::consts::PI;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    const TICK: Duration = Duration::from_millis(50);

    #[derive(Clone, Default)]
    struct ScriptedStuck {
        stuck: Arc<AtomicBool>,
        unsticks: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl StuckDetector for ScriptedStuck {
        fn set_target_location(&mut self, _target: Vec3) {}

        fn is_getting_closer(&mut self, _position: Vec3) -> bool {
            !self.stuck.load(Ordering::SeqCst)
        }

        async fn unstick(&mut self) {
            self.unsticks.fetch_add(1, Ordering::SeqCst);
        }

        fn reset_stuck_parameters(&mut self) {}
    }

    struct FixedPather {
        route: Vec<Vec3>,
        kind: PatherKind,
    }

    #[async_trait]
    impl Pather for FixedPather {
        async fn find_route(&self, _from: Vec3, _to: Vec3) -> Result<Vec<Vec3>, PathingError> {
            Ok(self.route.clone())
        }

        fn kind(&self) -> PatherKind {
            self.kind
        }
    }

    struct FailingPather;

    #[async_trait]
    impl Pather for FailingPather {
        async fn find_route(&self, _from: Vec3, _to: Vec3) -> Result<Vec<Vec3>, PathingError> {
            Err(PathingError::Unavailable("no mesh".to_string()))
        }
    }

    /// Cancels the tick while the request is in flight.
    struct CancellingPather {
        cancel: CancellationToken,
    }

    #[async_trait]
    impl Pather for CancellingPather {
        async fn find_route(&self, _from: Vec3, _to: Vec3) -> Result<Vec<Vec3>, PathingError> {
            self.cancel.cancel();
            futures::future::pending().await
        }
    }

    fn v(x: f32, y: f32) -> Vec3 {
        Vec3::new(x, y, 0.0)
    }

    fn navigator(
        pather: Arc<dyn Pather>,
        input: Arc<RecordingInput>,
        stuck: ScriptedStuck,
    ) -> Navigator {
        NavigatorBuilder::new(NavigationConfig::default(), input, pather)
            .stuck_detector(Box::new(stuck))
            .build()
    }

    fn at(position: Vec3, heading: f32) -> PlayerTelemetry {
        PlayerTelemetry {
            position,
            heading,
            ..Default::default()
        }
    }

    /// Moves a player according to the commands a tick issued.
    struct SimPlayer {
        telemetry: PlayerTelemetry,
        moving: bool,
        speed: f32,
    }

    impl SimPlayer {
        fn apply(&mut self, commands: &[MoveCommand]) {
            for command in commands {
                match command {
                    MoveCommand::Turn(h) => self.telemetry.heading = *h,
                    MoveCommand::Forward(pressed) => self.moving = *pressed,
                    MoveCommand::Stop => self.moving = false,
                    _ => {}
                }
            }
            if self.moving {
                let h = self.telemetry.heading;
                self.telemetry.position += Vec3::new(h.cos(), h.sin(), 0.0) * self.speed;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn walks_to_the_waypoint_after_turning_around() {
        let input = Arc::new(RecordingInput::default());
        let mut nav = navigator(Arc::new(StraightLinePather), input.clone(), ScriptedStuck::default());
        let cancel = CancellationToken::new();
        nav.set_waypoints(vec![v(0.0, 0.0), v(100.0, 0.0)]);

        let mut player = SimPlayer {
            telemetry: at(Vec3::ZERO, PI),
            moving: false,
            speed: 5.0,
        };

        assert_eq!(nav.update(&player.telemetry, &cancel).await, TickResult::Continue);
        let first = input.take();
        assert!(first.iter().any(|c| matches!(c, MoveCommand::Turn(h) if h.abs() < 1e-6)));
        assert!(!first.contains(&MoveCommand::Forward(true)));
        player.apply(&first);

        let mut reached = 0;
        let mut saw_forward = false;
        for _ in 0..40 {
            tokio::time::advance(TICK).await;
            let result = nav.update(&player.telemetry, &cancel).await;
            let commands = input.take();
            saw_forward |= commands.contains(&MoveCommand::Forward(true));
            player.apply(&commands);

            if result == TickResult::WaypointReached {
                reached += 1;
                assert!(player.telemetry.position.distance_xy(v(100.0, 0.0)) < 10.0);
            }
            if result == TickResult::DestinationReached {
                break;
            }
        }

        assert!(saw_forward);
        assert_eq!(reached, 1);
        assert_eq!(nav.state(), NavigationState::Arrived);
        let events = nav.drain_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| **e == NavigationEvent::WaypointReached)
                .count(),
            1
        );
        assert_eq!(events.last(), Some(&NavigationEvent::DestinationReached));
        assert!(events.contains(&NavigationEvent::PathCalculated));
    }

    #[tokio::test(start_paused = true)]
    async fn mounted_players_arrive_from_further_away() {
        let cancel = CancellationToken::new();
        let player = at(v(0.0, 0.0), 0.0);
        let mounted = PlayerTelemetry {
            mounted: true,
            ..player
        };

        for (second_tick, expected) in [
            (player, TickResult::Continue),
            (mounted, TickResult::WaypointReached),
        ] {
            let input = Arc::new(RecordingInput::default());
            let mut nav = navigator(Arc::new(StraightLinePather), input, ScriptedStuck::default());
            nav.set_waypoints(vec![v(12.0, 0.0)]);
            assert!(nav.reached_distance(true) > nav.reached_distance(false));

            assert_eq!(nav.update(&player, &cancel).await, TickResult::Continue);
            tokio::time::advance(TICK).await;
            assert_eq!(nav.update(&second_tick, &cancel).await, expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unstick_only_when_recently_active() {
        let input = Arc::new(RecordingInput::default());
        let stuck = ScriptedStuck::default();
        stuck.stuck.store(true, Ordering::SeqCst);
        let mut nav = navigator(Arc::new(StraightLinePather), input, stuck.clone());
        let cancel = CancellationToken::new();
        nav.set_waypoints(vec![v(15.0, 0.0)]);
        let player = at(Vec3::ZERO, 0.0);

        // first tick after a long pause
        nav.update(&player, &cancel).await;
        assert_eq!(stuck.unsticks.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_millis(500)).await;
        nav.update(&player, &cancel).await;
        assert_eq!(stuck.unsticks.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(3)).await;
        nav.update(&player, &cancel).await;
        assert_eq!(stuck.unsticks.load(Ordering::SeqCst), 1);

        stuck.stuck.store(false, Ordering::SeqCst);
        tokio::time::advance(TICK).await;
        nav.update(&player, &cancel).await;
        assert_eq!(stuck.unsticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_pathing_falls_back_to_a_straight_line() {
        let input = Arc::new(RecordingInput::default());
        let mut nav = navigator(Arc::new(FailingPather), input, ScriptedStuck::default());
        let cancel = CancellationToken::new();
        nav.set_waypoints(vec![v(300.0, 0.0)]);

        let result = nav.update(&at(Vec3::ZERO, 0.0), &cancel).await;
        assert_eq!(result, TickResult::Continue);
        assert_eq!(nav.route_to_waypoint(), vec![v(300.0, 0.0)]);
        assert_eq!(nav.state(), NavigationState::FollowingDirect);
        assert!(!nav.drain_events().contains(&NavigationEvent::PathCalculated));
    }

    #[tokio::test]
    async fn cancelled_tick_issues_no_commands() {
        let input = Arc::new(RecordingInput::default());
        let mut nav = navigator(Arc::new(StraightLinePather), input.clone(), ScriptedStuck::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        nav.set_waypoints(vec![v(5.0, 50.0)]);

        assert_eq!(nav.update(&at(Vec3::ZERO, 0.0), &cancel).await, TickResult::Cancelled);
        assert!(input.commands().is_empty());
    }

    #[tokio::test]
    async fn cancellation_during_pathing_stops_the_tick() {
        let input = Arc::new(RecordingInput::default());
        let cancel = CancellationToken::new();
        let pather = Arc::new(CancellingPather {
            cancel: cancel.clone(),
        });
        let mut nav = navigator(pather, input.clone(), ScriptedStuck::default());
        nav.set_waypoints(vec![v(300.0, 0.0)]);

        assert_eq!(nav.update(&at(Vec3::ZERO, PI), &cancel).await, TickResult::Cancelled);
        assert_eq!(input.commands(), vec![MoveCommand::Stop]);
    }

    #[tokio::test]
    async fn empty_waypoints_stay_idle() {
        let input = Arc::new(RecordingInput::default());
        let mut nav = navigator(Arc::new(StraightLinePather), input, ScriptedStuck::default());
        nav.set_waypoints(Vec::new());
        let result = nav.update(&at(Vec3::ZERO, 0.0), &CancellationToken::new()).await;
        assert_eq!(result, TickResult::Continue);
        assert_eq!(nav.state(), NavigationState::NoRoute);
    }

    #[tokio::test]
    async fn reached_leading_waypoints_are_skipped_silently() {
        let input = Arc::new(RecordingInput::default());
        let mut nav = navigator(Arc::new(StraightLinePather), input, ScriptedStuck::default());
        nav.set_waypoints(vec![v(1.0, 0.0), v(2.0, 0.0), v(30.0, 0.0)]);

        nav.update(&at(Vec3::ZERO, 0.0), &CancellationToken::new()).await;
        assert_eq!(nav.next_map_point(), Some(v(30.0, 0.0)));
        assert!(!nav.drain_events().contains(&NavigationEvent::WaypointReached));
    }

    #[tokio::test]
    async fn forced_refill_asks_the_pather_for_short_hops() {
        let mut nav = pathed_navigator(PatherKind::Local);
        nav.set_waypoints(vec![v(15.0, 0.0)]);
        let cancel = CancellationToken::new();

        assert!(nav.refill_route_to_next_waypoint(&at(Vec3::ZERO, 0.0), false, &cancel).await);
        assert_eq!(nav.state(), NavigationState::FollowingDirect);

        assert!(nav.refill_route_to_next_waypoint(&at(Vec3::ZERO, 0.0), true, &cancel).await);
        assert_eq!(nav.state(), NavigationState::FollowingPathed);
        assert_eq!(nav.drain_events(), vec![NavigationEvent::PathCalculated]);
    }

    #[test]
    fn average_spacing_uses_the_point_count() {
        let input = Arc::new(RecordingInput::default());
        let mut nav = navigator(Arc::new(StraightLinePather), input, ScriptedStuck::default());
        nav.set_waypoints(vec![v(0.0, 0.0), v(30.0, 0.0), v(60.0, 0.0)]);
        assert!((nav.avg_distance() - 20.0).abs() < 1e-5);
        nav.set_waypoints(vec![v(0.0, 0.0)]);
        assert_eq!(nav.avg_distance(), 10.0);
    }

    fn pathed_navigator(kind: PatherKind) -> Navigator {
        let pather = Arc::new(FixedPather {
            route: vec![v(0.0, 0.0), v(100.0, 50.0), v(200.0, 0.0), v(300.0, 0.0)],
            kind,
        });
        navigator(pather, Arc::new(RecordingInput::default()), ScriptedStuck::default())
    }

    #[tokio::test]
    async fn pathed_route_is_followed_point_by_point() {
        let mut nav = pathed_navigator(PatherKind::Local);
        nav.set_waypoints(vec![v(300.0, 0.0)]);
        nav.update(&at(Vec3::ZERO, 0.0), &CancellationToken::new()).await;

        assert_eq!(nav.state(), NavigationState::FollowingPathed);
        assert_eq!(
            nav.route_to_waypoint(),
            vec![v(100.0, 50.0), v(200.0, 0.0), v(300.0, 0.0)]
        );
        assert_eq!(nav.total_route().len(), 4);
    }

    #[tokio::test]
    async fn resume_keeps_a_long_route_when_close_to_it() {
        let mut nav = pathed_navigator(PatherKind::Local);
        nav.set_waypoints(vec![v(300.0, 0.0)]);
        nav.update(&at(Vec3::ZERO, 0.0), &CancellationToken::new()).await;

        nav.resume(v(90.0, 45.0));
        assert_eq!(nav.route_to_waypoint().len(), 3);

        nav.resume(v(0.0, -100.0));
        assert!(nav.route_to_waypoint().is_empty());
    }

    #[tokio::test]
    async fn resume_clears_short_routes() {
        let pather = Arc::new(FixedPather {
            route: vec![v(0.0, 0.0), v(20.0, 10.0), v(40.0, 0.0)],
            kind: PatherKind::Local,
        });
        let mut nav = navigator(pather, Arc::new(RecordingInput::default()), ScriptedStuck::default());
        nav.set_waypoints(vec![v(40.0, 0.0)]);
        nav.update(&at(Vec3::ZERO, 0.0), &CancellationToken::new()).await;
        assert!(!nav.route_to_waypoint().is_empty());

        nav.resume(v(15.0, 8.0));
        assert!(nav.route_to_waypoint().is_empty());
    }

    #[tokio::test]
    async fn remote_routes_are_dropped_on_stop_not_on_resume() {
        let mut nav = pathed_navigator(PatherKind::Remote);
        nav.set_waypoints(vec![v(300.0, 0.0)]);
        nav.update(&at(Vec3::ZERO, 0.0), &CancellationToken::new()).await;

        nav.resume(v(0.0, -100.0));
        assert_eq!(nav.route_to_waypoint().len(), 3);

        nav.stop();
        assert!(nav.route_to_waypoint().is_empty());
    }

    /// Two ticks drifting away from the first waypoint, with the detector reporting stuck.
    async fn drift_away(nav: &mut Navigator, from: Vec3, cancel: &CancellationToken) {
        nav.update(&at(from, 0.0), cancel).await;
        tokio::time::advance(TICK).await;
        nav.update(&at(from + v(1.0, 1.0), 0.0), cancel).await;
        tokio::time::advance(TICK).await;
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_waypoint_is_not_walked_to() {
        let input = Arc::new(RecordingInput::default());
        let stuck = ScriptedStuck::default();
        stuck.stuck.store(true, Ordering::SeqCst);
        let mut nav = navigator(Arc::new(StraightLinePather), input, stuck);
        let cancel = CancellationToken::new();
        let (a, b, c) = (v(0.0, 0.0), v(100.0, 0.0), v(1000.0, 0.0));
        nav.set_waypoints(vec![a, b, c]);

        drift_away(&mut nav, v(95.0, 30.0), &cancel).await;
        assert_eq!(nav.next_map_point(), Some(b));
        assert!(!nav.route_to_waypoint().contains(&a));

        let player = at(v(96.0, 31.0), 0.0);
        nav.update(&player, &cancel).await;
        assert_eq!(nav.route_to_waypoint(), vec![b]);

        tokio::time::advance(TICK).await;
        let result = nav.update(&at(b, 0.0), &cancel).await;
        assert_eq!(result, TickResult::WaypointReached);
        assert_eq!(nav.next_map_point(), Some(c));
    }

    #[tokio::test(start_paused = true)]
    async fn replaced_waypoint_is_walked_to_before_the_next() {
        let input = Arc::new(RecordingInput::default());
        let stuck = ScriptedStuck::default();
        stuck.stuck.store(true, Ordering::SeqCst);
        let mut nav = navigator(Arc::new(StraightLinePather), input, stuck);
        let cancel = CancellationToken::new();
        let (a, b, c) = (v(0.0, 0.0), v(100.0, 0.0), v(1000.0, 0.0));
        nav.set_waypoints(vec![a, b, c]);

        drift_away(&mut nav, v(50.0, 30.0), &cancel).await;
        let anchor = v(51.0, 0.0);
        assert_eq!(nav.next_map_point(), Some(anchor));
        assert!(nav.route_to_waypoint().is_empty());

        nav.update(&at(v(51.0, 31.0), 0.0), &cancel).await;
        assert_eq!(nav.route_to_waypoint(), vec![anchor]);

        tokio::time::advance(TICK).await;
        let result = nav.update(&at(anchor, 0.0), &cancel).await;
        assert_eq!(result, TickResult::WaypointReached);
        assert_eq!(nav.next_map_point(), Some(b));
    }

    #[test]
    fn resume_reanchors_the_next_waypoint() {
        let mut nav = pathed_navigator(PatherKind::Local);
        nav.set_waypoints(vec![v(0.0, 0.0), v(100.0, 0.0), v(200.0, 0.0)]);

        nav.resume(v(50.0, 30.0));
        assert_eq!(nav.next_map_point(), Some(v(50.0, 0.0)));

        nav.set_waypoints(vec![v(0.0, 0.0), v(100.0, 0.0), v(200.0, 0.0)]);
        nav.resume(v(95.0, 5.0));
        assert_eq!(nav.next_map_point(), Some(v(100.0, 0.0)));
        assert_eq!(nav.total_route(), vec![v(100.0, 0.0), v(200.0, 0.0)]);
    }
}
