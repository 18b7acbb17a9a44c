use crate::common::{Point, Rect};

/// Horizontal bands around the screen center, derived from the capture width.
///
/// `screen_target_buffer < screen_mid_buffer < screen_add_buffer` for any
/// reasonable width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    pub screen_mid: i32,
    pub screen_mid_buffer: i32,
    pub screen_target_buffer: i32,
    pub screen_add_buffer: i32,
}

impl ScreenGeometry {
    pub fn from_width(width: u32) -> Self {
        let width = width as i32;
        let screen_mid_buffer = width / 15;
        Self {
            screen_mid: width / 2,
            screen_mid_buffer,
            screen_target_buffer: screen_mid_buffer / 2,
            screen_add_buffer: screen_mid_buffer * 3,
        }
    }

    pub fn offset_from_mid(&self, x: i32) -> i32 {
        (x - self.screen_mid).abs()
    }

    /// Inside the narrow band in front of the player.
    pub fn in_target_zone(&self, x: i32) -> bool {
        self.offset_from_mid(x) < self.screen_target_buffer
    }

    /// Beside the target band but still close enough to join a fight.
    pub fn in_add_zone(&self, x: i32) -> bool {
        let offset = self.offset_from_mid(x);
        offset > self.screen_target_buffer && offset < self.screen_add_buffer
    }
}

/// One name plate found on screen in the current detection pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NpcPosition {
    pub rect: Rect,
    pub click_point: Point,
    pub is_add: bool,
    pub is_target: bool,
}

impl NpcPosition {
    /// Build the position for a bounding box in scan-area coordinates.
    ///
    /// The click point sits below the top of the box by
    /// `y_offset + height_mul * area_height / top`, so boxes high on screen get a
    /// larger push down than boxes near the bottom.
    pub fn new(
        rect: Rect,
        geometry: &ScreenGeometry,
        area_height: i32,
        y_offset: f32,
        height_mul: f32,
    ) -> Self {
        let top = rect.top().max(1);
        let push_down = y_offset + height_mul * (area_height as f32 / top as f32);
        let click_point = Point::new(
            rect.left() + rect.width / 2,
            rect.top() + push_down as i32,
        );

        let is_add = geometry.in_add_zone(click_point.x);
        let is_target = !is_add && geometry.in_target_zone(click_point.x);

        Self {
            rect,
            click_point,
            is_add,
            is_target,
        }
    }

    pub fn width(&self) -> i32 {
        self.rect.width
    }

    pub fn height(&self) -> i32 {
        self.rect.height
    }
}
