pub mod frame;
pub mod geometry;

pub use frame::{Frame, PixelBuffer};
pub use geometry::{Point, Rect, WorldVecExt};
