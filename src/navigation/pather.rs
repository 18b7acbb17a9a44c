use async_trait::async_trait;
use glam::Vec3;

use crate::error::PathingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatherKind {
    /// Runs in-process against local map data.
    Local,
    /// Queries an external pathing server, which keeps no route between pauses.
    Remote,
}

/// Pathing oracle: an ordered list of world points from `from` to `to`.
///
/// An empty list means no path was found.
#[async_trait]
pub trait Pather: Send + Sync {
    async fn find_route(&self, from: Vec3, to: Vec3) -> Result<Vec<Vec3>, PathingError>;

    fn kind(&self) -> PatherKind {
        PatherKind::Local
    }
}

/// Walks straight at the target.
#[derive(Debug, Default, Clone, Copy)]
pub struct StraightLinePather;

#[async_trait]
impl Pather for StraightLinePather {
    async fn find_route(&self, from: Vec3, to: Vec3) -> Result<Vec<Vec3>, PathingError> {
        Ok(vec![from, to])
    }
}
