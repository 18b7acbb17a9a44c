use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::input::{MovementInput, PlayerTelemetry};
use super::navigator::{NavigationEvent, Navigator, TickResult};
use super::route_planner::plan_waypoints;
use crate::config::RouteConfig;

/// Patrols a map route: feeds the navigator waypoints and refills them on arrival.
pub struct FollowRoute {
    config: RouteConfig,
    map_route: Vec<Vec3>,
    navigator: Navigator,
    input: Arc<dyn MovementInput>,
    rng: StdRng,

    entered_at: Instant,
    last_jump: Instant,
    next_jump_after: Duration,
}

impl FollowRoute {
    pub fn new(
        config: RouteConfig,
        map_route: Vec<Vec3>,
        navigator: Navigator,
        input: Arc<dyn MovementInput>,
    ) -> Self {
        Self::with_rng(config, map_route, navigator, input, StdRng::from_os_rng())
    }

    pub fn with_rng(
        config: RouteConfig,
        map_route: Vec<Vec3>,
        navigator: Navigator,
        input: Arc<dyn MovementInput>,
        mut rng: StdRng,
    ) -> Self {
        let next_jump_after = Self::roll_jump_interval(&config, &mut rng);
        let now = Instant::now();
        Self {
            config,
            map_route,
            navigator,
            input,
            rng,
            entered_at: now,
            last_jump: now,
            next_jump_after,
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    pub fn map_route(&self) -> &[Vec3] {
        &self.map_route
    }

    /// Swap the patrolled route. Takes effect on the next refill.
    pub fn receive_route(&mut self, route: Vec<Vec3>) {
        info!("[FollowRoute] received route with {} points", route.len());
        self.map_route = route;
    }

    pub fn refill_waypoints(&mut self, player: Vec3, only_closest: bool) {
        info!(
            "[FollowRoute] refill waypoints - closest only: {} - there and back: {}",
            only_closest, self.config.there_and_back
        );
        let waypoints = plan_waypoints(&self.map_route, player, only_closest, self.config.there_and_back);
        self.navigator.set_waypoints(waypoints);
    }

    pub fn resume(&mut self, player: Vec3) {
        self.entered_at = Instant::now();
        self.last_jump = self.entered_at;

        if self.navigator.has_waypoint() {
            self.navigator.resume(player);
        } else {
            self.refill_waypoints(player, true);
        }
    }

    pub fn abort(&mut self) {
        self.navigator.stop_movement();
        self.navigator.stop();
    }

    /// Drive one navigation tick. Returns the events the navigator raised.
    pub async fn update(
        &mut self,
        telemetry: &PlayerTelemetry,
        cancel: &CancellationToken,
    ) -> Vec<NavigationEvent> {
        if self.navigator.update(telemetry, cancel).await == TickResult::Cancelled {
            return Vec::new();
        }

        let events = self.navigator.drain_events();
        if events.contains(&NavigationEvent::DestinationReached) {
            debug!("[FollowRoute] destination reached");
            self.refill_waypoints(telemetry.position, false);
        }

        self.random_jump();
        events
    }

    fn random_jump(&mut self) {
        if !self.config.random_jump {
            return;
        }

        let grace = Duration::from_millis(self.config.jump_grace_ms);
        if self.entered_at.elapsed() > grace && self.last_jump.elapsed() > self.next_jump_after {
            info!("[FollowRoute] random jump");
            self.input.jump();
            self.last_jump = Instant::now();
            self.next_jump_after = Self::roll_jump_interval(&self.config, &mut self.rng);
        }
    }

    fn roll_jump_interval(config: &RouteConfig, rng: &mut StdRng) -> Duration {
        let min = config.jump_min_interval_ms;
        let max = config.jump_max_interval_ms.max(min);
        Duration::from_millis(rng.random_range(min..=max))
    }
}
