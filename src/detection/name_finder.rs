use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::color_matcher::ColorMatcher;
use super::line_scanner::NameLineScanner;
use super::name_grouper::NameGrouper;
use super::npc_names::NpcNames;
use super::npc_position::{NpcPosition, ScreenGeometry};
use crate::common::{PixelBuffer, Point, Rect};
use crate::config::NpcFinderConfig;

const REF_WIDTH: f32 = 1920.0;
const REF_HEIGHT: f32 = 1080.0;

/// How long the "potential adds" latch survives once adds stop being seen.
const POTENTIAL_ADDS_HOLD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionOutcome {
    Updated,
    Cancelled,
}

/// Read-only copy of the last detection pass handed to targeting logic.
#[derive(Debug, Clone, Default)]
pub struct NpcSnapshot {
    pub names: NpcNames,
    pub npcs: Vec<NpcPosition>,
    pub add_count: usize,
    pub target_count: usize,
    pub potential_adds_exist: bool,
    pub last_potential_adds_seen: Option<Instant>,
}

impl NpcSnapshot {
    pub fn npc_count(&self) -> usize {
        self.npcs.len()
    }

    pub fn mobs_visible(&self) -> bool {
        !self.npcs.is_empty()
    }
}

/// Finds colored unit name plates on screen and classifies them as targets or adds.
pub struct NpcNameFinder {
    config: NpcFinderConfig,
    names: NpcNames,
    matcher: ColorMatcher,
    capture: Rect,
    scale_x: f32,
    scale_y: f32,
    area: Rect,
    geometry: ScreenGeometry,
    scanner: NameLineScanner,
    grouper: NameGrouper,
    y_offset: f32,
    height_mul: f32,

    npcs: Vec<NpcPosition>,
    add_count: usize,
    target_count: usize,
    potential_adds_exist: bool,
    last_potential_adds_seen: Option<Instant>,
}

impl NpcNameFinder {
    /// `capture` is the captured window in screen coordinates.
    pub fn new(config: NpcFinderConfig, capture: Rect, names: NpcNames) -> Self {
        let scale_x = capture.width as f32 / REF_WIDTH;
        let scale_y = capture.height as f32 / REF_HEIGHT;

        let area = Rect::new(
            0,
            (config.top_offset as f32 * scale_y) as i32,
            (capture.width as f32 * config.area_width_fraction) as i32,
            (capture.height as f32 * config.area_height_fraction) as i32,
        );

        let min_length = config.lines_of_npc_min_length as f32 * scale_x;
        let scanner = NameLineScanner::new(
            area,
            min_length,
            config.lines_of_npc_length_diff as f32 * scale_x,
            config.inc_x,
            config.inc_y,
        );

        let offset1 = config.height_offset1 as f32 * scale_y;
        let grouper = NameGrouper::new(
            offset1,
            config.height_offset2 as f32 * scale_y,
            config.npc_name_max_width as f32 * scale_x,
            min_length * config.merge_factor,
            offset1,
        );

        info!(
            "[NpcNameFinder] searchMode = {:?}, capture = {}x{}",
            config.search_mode, capture.width, capture.height
        );

        let mut finder = Self {
            matcher: ColorMatcher::from_config(names, &config),
            names,
            capture,
            scale_x,
            scale_y,
            area,
            geometry: ScreenGeometry::from_width(capture.width.max(0) as u32),
            scanner,
            grouper,
            y_offset: config.npc_pos_y_offset as f32 * scale_y,
            height_mul: 0.0,
            npcs: Vec::new(),
            add_count: 0,
            target_count: 0,
            potential_adds_exist: false,
            last_potential_adds_seen: None,
            config,
        };
        finder.height_mul = finder.height_mul_for(names);
        finder
    }

    fn height_mul_for(&self, names: NpcNames) -> f32 {
        let mul = if names.contains(NpcNames::CORPSE) {
            self.config.corpse_pos_y_height_mul
        } else {
            self.config.npc_pos_y_height_mul
        };
        mul as f32 * self.scale_y
    }

    pub fn names(&self) -> NpcNames {
        self.names
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn geometry(&self) -> ScreenGeometry {
        self.geometry
    }

    pub fn scale_to_ref_width(&self) -> f32 {
        self.scale_x
    }

    pub fn scale_to_ref_height(&self) -> f32 {
        self.scale_y
    }

    pub fn npcs(&self) -> &[NpcPosition] {
        &self.npcs
    }

    pub fn npc_count(&self) -> usize {
        self.npcs.len()
    }

    pub fn add_count(&self) -> usize {
        self.add_count
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }

    pub fn mobs_visible(&self) -> bool {
        !self.npcs.is_empty()
    }

    pub fn potential_adds_exist(&self) -> bool {
        self.potential_adds_exist
    }

    /// Switch the searched names. Returns `false` when nothing changed.
    pub fn change_npc_type(&mut self, names: NpcNames) -> bool {
        if self.names == names {
            return false;
        }

        self.names = names;
        self.npcs.clear();
        self.add_count = 0;
        self.target_count = 0;
        self.height_mul = self.height_mul_for(names);
        self.matcher = ColorMatcher::from_config(names, &self.config);

        info!("[NpcNameFinder] type = {}", names);
        true
    }

    /// Run one detection pass over `buffer`, replacing the NPC set.
    pub fn update(&mut self, buffer: &PixelBuffer<'_>, cancel: &CancellationToken) -> DetectionOutcome {
        self.update_at(buffer, cancel, Instant::now())
    }

    pub fn update_at(
        &mut self,
        buffer: &PixelBuffer<'_>,
        cancel: &CancellationToken,
        now: Instant,
    ) -> DetectionOutcome {
        let Some(mut lines) = self.scanner.scan(buffer, &self.matcher, cancel) else {
            debug!("[NpcNameFinder] scan cancelled");
            return DetectionOutcome::Cancelled;
        };

        let boxes = self.grouper.group(&mut lines);
        if cancel.is_cancelled() {
            return DetectionOutcome::Cancelled;
        }

        let bottom_centre = self.area.bottom_centre();
        let mut npcs: Vec<NpcPosition> = boxes
            .into_iter()
            .map(|rect| {
                NpcPosition::new(
                    rect,
                    &self.geometry,
                    self.area.height,
                    self.y_offset,
                    self.height_mul,
                )
            })
            .collect();
        npcs.sort_by(|a, b| {
            a.click_point
                .sqr_distance(bottom_centre)
                .total_cmp(&b.click_point.sqr_distance(bottom_centre))
        });

        self.target_count = npcs.iter().filter(|n| n.is_target).count();
        self.add_count = npcs.iter().filter(|n| n.is_add).count();
        self.npcs = npcs;

        self.update_potential_adds(now);
        DetectionOutcome::Updated
    }

    fn update_potential_adds(&mut self, now: Instant) {
        if self.add_count > 0 && self.target_count >= 1 {
            self.potential_adds_exist = true;
            self.last_potential_adds_seen = Some(now);
            return;
        }

        let expired = self
            .last_potential_adds_seen
            .is_none_or(|seen| now.saturating_duration_since(seen) > POTENTIAL_ADDS_HOLD);
        if self.potential_adds_exist && expired {
            self.potential_adds_exist = false;
            self.add_count = 0;
        }
    }

    pub fn snapshot(&self) -> NpcSnapshot {
        NpcSnapshot {
            names: self.names,
            npcs: self.npcs.clone(),
            add_count: self.add_count,
            target_count: self.target_count,
            potential_adds_exist: self.potential_adds_exist,
            last_potential_adds_seen: self.last_potential_adds_seen,
        }
    }

    /// Translate a capture-relative point to screen coordinates.
    pub fn to_screen_coordinates(&self, point: Point) -> Point {
        point.offset(self.capture.min())
    }
}
