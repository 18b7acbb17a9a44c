use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::blacklist::{Blacklist, MouseOverContext};
use crate::common::Point;
use crate::config::TargetingConfig;
use crate::detection::{NpcNameFinder, NpcPosition, NpcSnapshot};

/// Shape of the mouse cursor, which tells what a click would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorType {
    None,
    Kill,
    Loot,
    Skin,
    Mine,
    Herb,
    Vendor,
    Repair,
    Speak,
    Quest,
}

pub trait MouseInput: Send + Sync {
    fn set_cursor_position(&self, position: Point);
    fn interact_mouse_over(&self);
}

pub trait CursorClassifier: Send + Sync {
    fn classify(&self) -> CursorType;
}

pub trait MouseOverReader: Send + Sync {
    fn mouse_over(&self) -> MouseOverContext;
}

const TARGETING_OFFSETS: [(i32, i32); 3] = [(0, 0), (-10, 5), (10, 5)];
const FIND_BY_DEPTHS: [i32; 5] = [50, 100, 150, 200, 0];

/// Hovers the cursor around detected name plates to pick a unit.
pub struct NpcNameTargeting {
    config: TargetingConfig,
    input: Arc<dyn MouseInput>,
    classifier: Arc<dyn CursorClassifier>,
    reader: Arc<dyn MouseOverReader>,
    blacklist: Box<dyn Blacklist>,

    screen_origin: Point,
    scale_x: f32,
    scale_y: f32,
    loc_targeting: Vec<Point>,
    loc_find_by: Vec<Point>,

    index: usize,
    npc_count: Option<usize>,
}

impl NpcNameTargeting {
    pub fn new(
        config: TargetingConfig,
        finder: &NpcNameFinder,
        input: Arc<dyn MouseInput>,
        classifier: Arc<dyn CursorClassifier>,
        reader: Arc<dyn MouseOverReader>,
        blacklist: Box<dyn Blacklist>,
    ) -> Self {
        let scale_x = finder.scale_to_ref_width();
        let scale_y = finder.scale_to_ref_height();

        let loc_targeting = TARGETING_OFFSETS
            .iter()
            .map(|&(x, y)| Point::new(x, y).scale(scale_x, scale_y))
            .collect();

        let mut loc_find_by = vec![Point::new(0, 0), Point::new(0, 15).scale(scale_x, scale_y)];
        for depth in &FIND_BY_DEPTHS[..4] {
            for dx in [0, -15, 15] {
                loc_find_by.push(Point::new(dx, *depth).scale(scale_x, scale_y));
            }
        }

        Self {
            config,
            input,
            classifier,
            reader,
            blacklist,
            screen_origin: finder.to_screen_coordinates(Point::default()),
            scale_x,
            scale_y,
            loc_targeting,
            loc_find_by,
            index: 0,
            npc_count: None,
        }
    }

    pub fn loc_targeting(&self) -> &[Point] {
        &self.loc_targeting
    }

    pub fn loc_find_by(&self) -> &[Point] {
        &self.loc_find_by
    }

    pub fn update_blacklist(&mut self, blacklist: Box<dyn Blacklist>) {
        self.blacklist = blacklist;
        info!("[NpcNameTargeting] blacklist replaced");
    }

    fn to_screen(&self, npc: &NpcPosition, offset: Point) -> Point {
        offset.offset(npc.click_point).offset(self.screen_origin)
    }

    /// Try to target the current candidate NPC. Blacklisted units advance the
    /// candidate index so the next call probes the following one.
    pub async fn acquire_non_blacklisted(
        &mut self,
        snapshot: &NpcSnapshot,
        cancel: &CancellationToken,
    ) -> bool {
        let count = snapshot.npc_count();
        if self.npc_count != Some(count) {
            self.npc_count = Some(count);
            self.index = 0;
        }

        let Some(npc) = snapshot.npcs.get(self.index).copied() else {
            return false;
        };

        let fast_delay = Duration::from_millis(self.config.fast_delay_ms);
        for offset in self.loc_targeting.clone() {
            if cancel.is_cancelled() {
                return false;
            }

            self.input.set_cursor_position(self.to_screen(&npc, offset));
            if self.classifier.classify() == CursorType::Kill {
                let mouse_over = self.reader.mouse_over();
                if mouse_over.id == 0 {
                    return false;
                }
                if self.blacklist.is_blacklisted(&mouse_over) {
                    debug!("[NpcNameTargeting] skip npc {} {:?}", self.index, npc.rect);
                    self.index += 1;
                    return false;
                }

                info!("> mouseover NPC found: {} - {:?}", mouse_over.id, npc.rect);
                self.input.interact_mouse_over();
                return true;
            }

            if !pause(fast_delay, cancel).await {
                return false;
            }
        }
        false
    }

    /// Probe every NPC for a cursor of one of `cursors` and interact with the first hit.
    pub async fn find_by(
        &self,
        snapshot: &NpcSnapshot,
        cursors: &[CursorType],
        cancel: &CancellationToken,
    ) -> bool {
        let interact_delay = Duration::from_millis(self.config.interact_delay_ms);

        for npc in &snapshot.npcs {
            for offset in self.find_by_points(npc) {
                if cancel.is_cancelled() {
                    return false;
                }

                self.input.set_cursor_position(self.to_screen(npc, offset));
                if !pause(interact_delay, cancel).await {
                    return false;
                }

                let cursor = self.classifier.classify();
                if cursors.contains(&cursor) {
                    self.input.interact_mouse_over();
                    info!("> NPCs found: {:?} {:?}", cursor, npc.rect);
                    return true;
                }
            }
        }
        false
    }

    /// The fixed probe grid followed by the plate's edges at each depth.
    fn find_by_points(&self, npc: &NpcPosition) -> Vec<Point> {
        let half = npc.width() / 2;
        let mut points = self.loc_find_by.clone();
        for depth in FIND_BY_DEPTHS {
            points.push(Point::new(half, depth).scale(self.scale_x, self.scale_y));
            points.push(Point::new(-half, depth).scale(self.scale_x, self.scale_y));
        }
        points
    }
}

/// Sleep unless cancelled first. Returns `false` on cancellation.
async fn pause(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
