use std::sync::Mutex;

use glam::Vec3;

use super::input::{MovementInput, StrafeDirection};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveCommand {
    Forward(bool),
    Turn(f32),
    Stop,
    Jump,
    Strafe(StrafeDirection, bool),
}

/// Records every command it receives.
#[derive(Default)]
pub struct RecordingInput {
    commands: Mutex<Vec<MoveCommand>>,
}

impl RecordingInput {
    pub fn take(&self) -> Vec<MoveCommand> {
        std::mem::take(&mut *self.commands.lock().unwrap())
    }

    pub fn commands(&self) -> Vec<MoveCommand> {
        self.commands.lock().unwrap().clone()
    }

    fn push(&self, command: MoveCommand) {
        self.commands.lock().unwrap().push(command);
    }
}

impl MovementInput for RecordingInput {
    fn set_forward(&self, pressed: bool) {
        self.push(MoveCommand::Forward(pressed));
    }

    fn turn_towards(&self, heading: f32, _target: Vec3) {
        self.push(MoveCommand::Turn(heading));
    }

    fn stop(&self) {
        self.push(MoveCommand::Stop);
    }

    fn jump(&self) {
        self.push(MoveCommand::Jump);
    }

    fn set_strafe(&self, direction: StrafeDirection, pressed: bool) {
        self.push(MoveCommand::Strafe(direction, pressed));
    }
}
