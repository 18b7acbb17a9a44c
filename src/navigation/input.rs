use glam::Vec3;

/// Player state read once per control tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerTelemetry {
    pub position: Vec3,
    /// Radians, see [`crate::common::geometry::heading_to`].
    pub heading: f32,
    pub mounted: bool,
    pub casting: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrafeDirection {
    Left,
    Right,
}

/// Fire-and-forget movement commands sent to the game client.
pub trait MovementInput: Send + Sync {
    fn set_forward(&self, pressed: bool);
    fn turn_towards(&self, heading: f32, target: Vec3);
    fn stop(&self);
    fn jump(&self);
    fn set_strafe(&self, direction: StrafeDirection, pressed: bool);
}

/// Source of player telemetry.
pub trait TelemetryReader: Send + Sync {
    fn read(&self) -> PlayerTelemetry;
}
