use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::common::{Frame, Rect};
use crate::config::Configuration;
use crate::detection::{DetectionOutcome, NpcNameFinder, NpcNames, NpcSnapshot};
use crate::error::AppError;
use crate::navigation::{
    FollowRoute, MovementInput, NavigationEvent, NavigatorBuilder, Pather, StraightLinePather,
    TelemetryReader,
};

/// Supplies captured frames of the game window.
pub trait FrameSource: Send {
    /// Latest frame, or `None` when nothing new was captured.
    fn capture(&mut self) -> Option<Frame>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    Paused,
    Running,
}

/// Runs the navigation control loop and the name plate scanner side by side.
pub struct Coordinator {
    control_task: JoinHandle<()>,
    scanner_task: JoinHandle<()>,
    cancel_token: CancellationToken,
    scanner_state: watch::Sender<ScannerState>,
    snapshots: watch::Receiver<Arc<NpcSnapshot>>,
    events: Option<mpsc::Receiver<NavigationEvent>>,
}

impl Coordinator {
    fn new(
        configuration: Configuration,
        route: FollowRoute,
        telemetry: Arc<dyn TelemetryReader>,
        finder: NpcNameFinder,
        frame_source: Box<dyn FrameSource>,
        initial_state: ScannerState,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let coordinator = &configuration.coordinator;

        let (event_tx, event_rx) = mpsc::channel(coordinator.event_buffer_size.max(1));
        let (state_tx, state_rx) = watch::channel(initial_state);
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(NpcSnapshot::default()));

        let control_task = tokio::spawn(run_control_loop(
            route,
            telemetry,
            event_tx,
            Duration::from_millis(coordinator.tick_interval_ms.max(1)),
            cancel_token.clone(),
        ));
        let scanner_task = tokio::spawn(run_scanner(
            finder,
            frame_source,
            state_rx,
            snapshot_tx,
            Duration::from_millis(coordinator.scan_interval_ms),
            cancel_token.clone(),
        ));

        Self {
            control_task,
            scanner_task,
            cancel_token,
            scanner_state: state_tx,
            snapshots: snapshot_rx,
            events: Some(event_rx),
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn snapshots(&self) -> watch::Receiver<Arc<NpcSnapshot>> {
        self.snapshots.clone()
    }

    /// Navigation events. Can be taken once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<NavigationEvent>> {
        self.events.take()
    }

    pub fn scanner_state(&self) -> ScannerState {
        *self.scanner_state.borrow()
    }

    pub fn pause_scanner(&self) {
        self.scanner_state.send_replace(ScannerState::Paused);
    }

    pub fn resume_scanner(&self) {
        self.scanner_state.send_replace(ScannerState::Running);
    }

    /// Cancel both tasks and wait for them to finish.
    pub async fn stop(mut self) {
        self.cancel_token.cancel();
        if let Err(e) = (&mut self.control_task).await {
            tracing::error!("Control loop task failed: {}", e);
        }
        if let Err(e) = (&mut self.scanner_task).await {
            tracing::error!("Scanner task failed: {}", e);
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn run_control_loop(
    mut route: FollowRoute,
    telemetry: Arc<dyn TelemetryReader>,
    event_tx: mpsc::Sender<NavigationEvent>,
    tick: Duration,
    cancel_token: CancellationToken,
) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    route.resume(telemetry.read().position);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            _ = interval.tick() => {}
        }

        let player = telemetry.read();
        for event in route.update(&player, &cancel_token).await {
            match event_tx.try_send(event) {
                Ok(()) | Err(TrySendError::Closed(_)) => {}
                Err(TrySendError::Full(event)) => {
                    tracing::warn!("Event buffer full, dropped {:?}", event);
                }
            }
        }
    }

    route.abort();
    tracing::info!("Control loop stopped.");
}

async fn run_scanner(
    mut finder: NpcNameFinder,
    mut frame_source: Box<dyn FrameSource>,
    mut state_rx: watch::Receiver<ScannerState>,
    snapshot_tx: watch::Sender<Arc<NpcSnapshot>>,
    scan_interval: Duration,
    cancel_token: CancellationToken,
) {
    loop {
        while *state_rx.borrow_and_update() == ScannerState::Paused {
            tokio::select! {
                _ = cancel_token.cancelled() => return,
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }

        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            _ = tokio::time::sleep(scan_interval) => {}
        }

        let Some(frame) = frame_source.capture() else {
            continue;
        };

        let scan_cancel = cancel_token.clone();
        let scanned = tokio::task::spawn_blocking(move || {
            let outcome = match frame.view() {
                Ok(view) => finder.update(&view, &scan_cancel),
                Err(e) => {
                    tracing::warn!("Skipping frame: {}", e);
                    DetectionOutcome::Cancelled
                }
            };
            (finder, outcome)
        })
        .await;

        let outcome = match scanned {
            Ok((returned, outcome)) => {
                finder = returned;
                outcome
            }
            Err(e) => {
                tracing::error!("Scanner failed: {}", e);
                break;
            }
        };

        if outcome == DetectionOutcome::Updated {
            snapshot_tx.send_replace(Arc::new(finder.snapshot()));
        }
    }

    tracing::info!("Scanner stopped.");
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    route: Vec<Vec3>,
    capture: Rect,
    npc_names: NpcNames,
    initial_state: ScannerState,
    input: Option<Arc<dyn MovementInput>>,
    telemetry: Option<Arc<dyn TelemetryReader>>,
    pather: Option<Arc<dyn Pather>>,
    frame_source: Option<Box<dyn FrameSource>>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            route: Vec::new(),
            capture: Rect::new(0, 0, 1920, 1080),
            npc_names: NpcNames::ENEMY | NpcNames::NEUTRAL,
            initial_state: ScannerState::Running,
            input: None,
            telemetry: None,
            pather: None,
            frame_source: None,
        }
    }

    pub fn route(mut self, route: Vec<Vec3>) -> Self {
        self.route = route;
        self
    }

    // Screen rectangle of the captured game window.
    pub fn capture_rect(mut self, capture: Rect) -> Self {
        self.capture = capture;
        self
    }

    pub fn npc_names(mut self, npc_names: NpcNames) -> Self {
        self.npc_names = npc_names;
        self
    }

    pub fn initial_scanner_state(mut self, state: ScannerState) -> Self {
        self.initial_state = state;
        self
    }

    // Overrides the control tick interval of the configuration.
    pub fn tick_interval_ms(mut self, tick_interval_ms: u64) -> Self {
        self.configuration.coordinator.tick_interval_ms = tick_interval_ms;
        self
    }

    // Overrides the scan interval of the configuration.
    pub fn scan_interval_ms(mut self, scan_interval_ms: u64) -> Self {
        self.configuration.coordinator.scan_interval_ms = scan_interval_ms;
        self
    }

    pub fn movement_input(mut self, input: Arc<dyn MovementInput>) -> Self {
        self.input = Some(input);
        self
    }

    pub fn telemetry(mut self, telemetry: Arc<dyn TelemetryReader>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    // Straight line walking is used when no pather is set.
    pub fn pather(mut self, pather: Arc<dyn Pather>) -> Self {
        self.pather = Some(pather);
        self
    }

    pub fn frame_source(mut self, frame_source: Box<dyn FrameSource>) -> Self {
        self.frame_source = Some(frame_source);
        self
    }

    /// Spawns the tasks, so it must run inside a tokio runtime.
    pub fn build(self) -> Result<Coordinator, AppError> {
        let input = self
            .input
            .ok_or_else(|| AppError::InvalidConfig("Movement input not set".to_string()))?;
        let telemetry = self
            .telemetry
            .ok_or_else(|| AppError::InvalidConfig("Telemetry reader not set".to_string()))?;
        let frame_source = self
            .frame_source
            .ok_or_else(|| AppError::InvalidConfig("Frame source not set".to_string()))?;
        let pather = self.pather.unwrap_or_else(|| Arc::new(StraightLinePather));

        let configuration = self.configuration;
        configuration.validate()?;

        let navigator = NavigatorBuilder::new(configuration.navigation.clone(), input.clone(), pather)
            .stuck_config(configuration.stuck.clone())
            .build();
        let route = FollowRoute::new(configuration.route.clone(), self.route, navigator, input);
        let finder = NpcNameFinder::new(configuration.npc_finder.clone(), self.capture, self.npc_names);

        Ok(Coordinator::new(
            configuration,
            route,
            telemetry,
            finder,
            frame_source,
            self.initial_state,
        ))
    }
}
