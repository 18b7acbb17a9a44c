use std::f32::consts::PI;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::detection::{ColorThresholds, FuzzyMetric, SearchMode};
use crate::error::AppError;
use crate::targeting::UnitClassification;

/// Root configuration, layered as defaults -> optional file -> `WOWBOT__*` environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub log_level: String,
    pub npc_finder: NpcFinderConfig,
    pub navigation: NavigationConfig,
    pub stuck: StuckConfig,
    pub route: RouteConfig,
    pub targeting: TargetingConfig,
    pub blacklist: BlacklistConfig,
    pub coordinator: CoordinatorConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            npc_finder: NpcFinderConfig::default(),
            navigation: NavigationConfig::default(),
            stuck: StuckConfig::default(),
            route: RouteConfig::default(),
            targeting: TargetingConfig::default(),
            blacklist: BlacklistConfig::default(),
            coordinator: CoordinatorConfig::default(),
        }
    }
}

impl Configuration {
    /// Load the configuration, optionally from a file (TOML, JSON, ... by extension).
    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        builder = builder.add_source(
            Environment::with_prefix("WOWBOT")
                .prefix_separator("__")
                .separator("__"),
        );

        let configuration: Configuration = builder.build()?.try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    /// Validate cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        self.npc_finder.validate()?;
        self.navigation.validate()?;
        self.route.validate()?;

        if self.coordinator.tick_interval_ms == 0 {
            return Err(AppError::InvalidConfig(
                "Tick interval must be greater than 0".to_string(),
            ));
        }
        if self.coordinator.event_buffer_size == 0 {
            return Err(AppError::InvalidConfig(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Tunables of the name scanner, grouper and classifier.
///
/// Every pixel length is expressed at the 1920x1080 reference resolution and is
/// scaled to the capture size at runtime.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NpcFinderConfig {
    pub search_mode: SearchMode,
    pub fuzzy_metric: FuzzyMetric,
    pub color_fuzziness: f32,
    pub colors: ColorThresholds,
    pub top_offset: u32,
    pub area_width_fraction: f32,
    pub area_height_fraction: f32,
    pub npc_pos_y_offset: i32,
    pub npc_pos_y_height_mul: i32,
    pub corpse_pos_y_height_mul: i32,
    pub npc_name_max_width: u32,
    pub lines_of_npc_min_length: u32,
    pub lines_of_npc_length_diff: u32,
    pub height_offset1: u32,
    pub height_offset2: u32,
    pub merge_factor: f32,
    pub inc_x: u32,
    pub inc_y: u32,
}

impl Default for NpcFinderConfig {
    fn default() -> Self {
        Self {
            search_mode: SearchMode::Simple,
            fuzzy_metric: FuzzyMetric::Legacy,
            color_fuzziness: 15.0,
            colors: ColorThresholds::default(),
            top_offset: 110,
            area_width_fraction: 0.87,
            area_height_fraction: 0.6,
            npc_pos_y_offset: 0,
            npc_pos_y_height_mul: 10,
            corpse_pos_y_height_mul: 15,
            npc_name_max_width: 250,
            lines_of_npc_min_length: 22,
            lines_of_npc_length_diff: 4,
            height_offset1: 10,
            height_offset2: 2,
            merge_factor: 1.0,
            inc_x: 1,
            inc_y: 1,
        }
    }
}

impl NpcFinderConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.inc_x == 0 || self.inc_y == 0 {
            return Err(AppError::InvalidConfig(
                "Scan increments must be greater than 0".to_string(),
            ));
        }
        if self.lines_of_npc_length_diff >= self.lines_of_npc_min_length {
            return Err(AppError::InvalidConfig(
                "Line length tolerance must be smaller than the minimum line length".to_string(),
            ));
        }
        let fraction_ok = |f: f32| f > 0.0 && f <= 1.0;
        if !fraction_ok(self.area_width_fraction) || !fraction_ok(self.area_height_fraction) {
            return Err(AppError::InvalidConfig(
                "Scan area fractions must be within (0, 1]".to_string(),
            ));
        }
        if self.height_offset2 > self.height_offset1 {
            return Err(AppError::InvalidConfig(
                "Second grouping offset must not exceed the first".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub min_distance: f32,
    pub min_distance_mount: f32,
    pub max_distance: f32,
    pub dead_band_radians: f32,
    pub stop_angle_radians: f32,
    pub activity_window_ms: u64,
    pub simplify_route: bool,
    pub simplify_tolerance: f32,
    pub remote_simplify_tolerance: f32,
    pub pathing_timeout_ms: Option<u64>,
    pub max_resume_adjustments: usize,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            min_distance: 10.0,
            min_distance_mount: 15.0,
            max_distance: 200.0,
            dead_band_radians: PI / 20.0,
            stop_angle_radians: PI / 3.0,
            activity_window_ms: 2000,
            simplify_route: true,
            simplify_tolerance: 0.1,
            remote_simplify_tolerance: 0.05,
            pathing_timeout_ms: Some(5000),
            max_resume_adjustments: 5,
        }
    }
}

impl NavigationConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.dead_band_radians >= self.stop_angle_radians {
            return Err(AppError::InvalidConfig(
                "Heading dead-band must be smaller than the stop angle".to_string(),
            ));
        }
        if self.min_distance <= 0.0 || self.min_distance_mount < self.min_distance {
            return Err(AppError::InvalidConfig(
                "Mounted reach distance must be at least the walking reach distance".to_string(),
            ));
        }
        if self.max_distance <= self.min_distance {
            return Err(AppError::InvalidConfig(
                "Max distance must exceed the reach distance".to_string(),
            ));
        }
        Ok(())
    }

    pub fn activity_window(&self) -> Duration {
        Duration::from_millis(self.activity_window_ms)
    }

    pub fn pathing_timeout(&self) -> Option<Duration> {
        self.pathing_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StuckConfig {
    pub progress_window_ms: u64,
    pub progress_epsilon: f32,
    pub jump_settle_ms: u64,
    pub strafe_base_ms: u64,
    pub strafe_step_ms: u64,
    pub max_strafe_ms: u64,
}

impl Default for StuckConfig {
    fn default() -> Self {
        Self {
            progress_window_ms: 1500,
            progress_epsilon: 0.5,
            jump_settle_ms: 200,
            strafe_base_ms: 400,
            strafe_step_ms: 200,
            max_strafe_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub there_and_back: bool,
    pub random_jump: bool,
    pub jump_grace_ms: u64,
    pub jump_min_interval_ms: u64,
    pub jump_max_interval_ms: u64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            there_and_back: false,
            random_jump: true,
            jump_grace_ms: 5_000,
            jump_min_interval_ms: 10_000,
            jump_max_interval_ms: 25_000,
        }
    }
}

impl RouteConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.jump_min_interval_ms > self.jump_max_interval_ms {
            return Err(AppError::InvalidConfig(
                "Random jump interval bounds are inverted".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TargetingConfig {
    pub fast_delay_ms: u64,
    pub interact_delay_ms: u64,
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            fast_delay_ms: 5,
            interact_delay_ms: 25,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BlacklistConfig {
    pub levels_above: i32,
    pub levels_below: i32,
    pub check_target_gives_exp: bool,
    pub target_mask: Vec<UnitClassification>,
    pub names: Vec<String>,
    pub allow_pvp: bool,
}

impl Default for BlacklistConfig {
    fn default() -> Self {
        Self {
            levels_above: 1,
            levels_below: 7,
            check_target_gives_exp: false,
            target_mask: vec![
                UnitClassification::Normal,
                UnitClassification::Trivial,
                UnitClassification::Rare,
            ],
            names: Vec::new(),
            allow_pvp: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub tick_interval_ms: u64,
    pub scan_interval_ms: u64,
    pub event_buffer_size: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            scan_interval_ms: 30,
            event_buffer_size: 32,
        }
    }
}
