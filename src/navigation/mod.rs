pub mod follow_route;
pub mod input;
pub mod navigator;
pub mod path_simplify;
pub mod pather;
pub mod pather_service;
pub mod route_planner;
pub mod stuck_detector;

#[cfg(test)]
pub(crate) mod test_support;

pub use follow_route::FollowRoute;
pub use input::{MovementInput, PlayerTelemetry, StrafeDirection, TelemetryReader};
pub use navigator::{NavigationEvent, NavigationState, Navigator, NavigatorBuilder, TickResult};
pub use pather::{Pather, PatherKind, StraightLinePather};
pub use pather_service::{PathRequest, PatherService, PatherServiceBuilder};
pub use route_planner::plan_waypoints;
pub use stuck_detector::{ProgressStuckDetector, StuckDetector};
