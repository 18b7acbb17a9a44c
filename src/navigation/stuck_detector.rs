use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::input::{MovementInput, StrafeDirection};
use crate::common::WorldVecExt;
use crate::config::StuckConfig;

/// Tracks whether the player converges on a target and gets it moving again if not.
#[async_trait]
pub trait StuckDetector: Send {
    fn set_target_location(&mut self, target: Vec3);

    fn is_getting_closer(&mut self, position: Vec3) -> bool;

    /// Recovery manoeuvre. Completes once movement has been handed back.
    async fn unstick(&mut self);

    fn reset_stuck_parameters(&mut self);
}

/// Progress based detector: the player must cut the distance to the target by at
/// least `progress_epsilon` within every `progress_window`.
pub struct ProgressStuckDetector {
    config: StuckConfig,
    input: Arc<dyn MovementInput>,
    rng: StdRng,

    target: Option<Vec3>,
    best_distance: f32,
    last_progress: Instant,
    attempts: u32,
}

impl ProgressStuckDetector {
    pub fn new(config: StuckConfig, input: Arc<dyn MovementInput>) -> Self {
        Self::with_rng(config, input, StdRng::from_os_rng())
    }

    pub fn with_rng(config: StuckConfig, input: Arc<dyn MovementInput>, rng: StdRng) -> Self {
        Self {
            config,
            input,
            rng,
            target: None,
            best_distance: f32::MAX,
            last_progress: Instant::now(),
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn progress_window(&self) -> Duration {
        Duration::from_millis(self.config.progress_window_ms)
    }

    fn strafe_duration(&self) -> Duration {
        let grow = self.config.strafe_step_ms * u64::from(self.attempts.saturating_sub(1));
        let ms = (self.config.strafe_base_ms + grow).min(self.config.max_strafe_ms);
        Duration::from_millis(ms)
    }

    fn restart_progress(&mut self) {
        self.best_distance = f32::MAX;
        self.last_progress = Instant::now();
    }
}

#[async_trait]
impl StuckDetector for ProgressStuckDetector {
    fn set_target_location(&mut self, target: Vec3) {
        if self.target == Some(target) {
            return;
        }
        self.target = Some(target);
        self.restart_progress();
    }

    fn is_getting_closer(&mut self, position: Vec3) -> bool {
        let Some(target) = self.target else {
            return true;
        };

        let distance = position.distance_xy(target);
        if distance + self.config.progress_epsilon < self.best_distance {
            self.best_distance = distance;
            self.last_progress = Instant::now();
            return true;
        }

        self.last_progress.elapsed() < self.progress_window()
    }

    async fn unstick(&mut self) {
        self.attempts += 1;
        let side = if self.rng.random_bool(0.5) {
            StrafeDirection::Left
        } else {
            StrafeDirection::Right
        };
        let strafe = self.strafe_duration();
        warn!(
            "[StuckDetector] unstick attempt {} strafe {:?} for {:?}",
            self.attempts, side, strafe
        );

        self.input.stop();
        self.input.jump();
        tokio::time::sleep(Duration::from_millis(self.config.jump_settle_ms)).await;

        self.input.set_strafe(side, true);
        tokio::time::sleep(strafe).await;
        self.input.set_strafe(side, false);

        self.input.set_forward(true);
        self.restart_progress();
    }

    fn reset_stuck_parameters(&mut self) {
        debug!("[StuckDetector] reset");
        self.attempts = 0;
        self.restart_progress();
    }
}
