pub mod common;
pub mod config;
pub mod coordinator;
pub mod detection;
pub mod error;
pub mod navigation;
pub mod targeting;

pub use config::Configuration;
pub use coordinator::{Coordinator, CoordinatorBuilder, FrameSource, ScannerState};
pub use detection::{NpcNameFinder, NpcNames, NpcSnapshot};
pub use error::{AppError, PathingError};
pub use navigation::{FollowRoute, Navigator, NavigatorBuilder};
pub use targeting::{MouseOverBlacklist, NpcNameTargeting};
