//! Player input handling.
//!
//! Device events (keys, mouse, on-screen joysticks, taps) are folded into an
//! [`InputState`], which is drained once per frame into a [`PlayerCommand`]
//! for the controller.

use boxroom_physics::PlayerCommand;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Right-joystick deflection is scaled to feel like this many pixels of
/// mouse motion per frame.
pub const JOYSTICK_LOOK_SCALE: f32 = 25.0;

/// Joystick deflection (squared) below which the keyboard takes over.
const STICK_EPSILON_SQ: f32 = 1e-4;

/// Movement key states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementInput {
    /// Key axes as (strafe, forward), each in [-1, 1].
    pub fn axis(&self) -> Vec2 {
        let axis = |positive: bool, negative: bool| (positive as i8 - negative as i8) as f32;
        Vec2::new(axis(self.right, self.left), axis(self.forward, self.backward))
    }

    pub fn any(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }
}

/// Accumulated input between two frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    /// Movement keys held.
    pub movement: MovementInput,

    /// Whether mouse motion currently turns the view (look button held).
    look_engaged: bool,

    /// Mouse motion since the last read (pixels).
    mouse_delta: Vec2,

    /// Movement joystick, each axis in [-1, 1], up positive.
    left_stick: Vec2,

    /// Look joystick, each axis in [-1, 1], up positive.
    right_stick: Vec2,

    /// Last pointer position in normalized device coordinates.
    pointer: Vec2,

    interact_queued: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Press or release the look button.
    pub fn set_look_engaged(&mut self, engaged: bool) {
        self.look_engaged = engaged;
    }

    pub fn look_engaged(&self) -> bool {
        self.look_engaged
    }

    /// Record mouse motion. Ignored unless look is engaged.
    pub fn add_mouse_motion(&mut self, delta: Vec2) {
        if self.look_engaged {
            self.mouse_delta += delta;
        }
    }

    pub fn set_left_stick(&mut self, value: Vec2) {
        self.left_stick = value.clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    pub fn set_right_stick(&mut self, value: Vec2) {
        self.right_stick = value.clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    /// Record the pointer position (normalized device coordinates).
    pub fn set_pointer(&mut self, ndc: Vec2) {
        self.pointer = ndc;
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Queue an interact request (tap, click or key).
    pub fn request_interact(&mut self) {
        self.interact_queued = true;
    }

    /// Movement axes: the joystick when deflected, otherwise the keys.
    pub fn movement_axis(&self) -> Vec2 {
        if self.left_stick.length_squared() > STICK_EPSILON_SQ {
            self.left_stick
        } else {
            self.movement.axis()
        }
    }

    /// Drain the look delta accumulated since the last call.
    ///
    /// The look joystick is level-triggered and adds its scaled deflection
    /// on every read.
    pub fn take_look_delta(&mut self) -> Vec2 {
        let mut delta = std::mem::take(&mut self.mouse_delta);
        if self.right_stick != Vec2::ZERO {
            delta.x += self.right_stick.x * JOYSTICK_LOOK_SCALE;
            delta.y -= self.right_stick.y * JOYSTICK_LOOK_SCALE;
        }
        delta
    }

    /// Consume a queued interact request.
    pub fn take_interact(&mut self) -> bool {
        std::mem::take(&mut self.interact_queued)
    }

    /// Build this frame's command, draining look delta and interact.
    pub fn to_command(&mut self) -> PlayerCommand {
        PlayerCommand {
            move_axis: self.movement_axis(),
            look_delta: self.take_look_delta(),
            interact: self.take_interact(),
        }
    }

    /// Drop held keys and pending deltas, e.g. on level reset.
    pub fn clear(&mut self) {
        self.movement = MovementInput::default();
        self.mouse_delta = Vec2::ZERO;
        self.interact_queued = false;
    }
}
