//! Player movement controller.
//!
//! Bridges a kinematic first-person control scheme onto a dynamic body:
//! each frame the controller turns the view, then overwrites the body's
//! horizontal velocity from input while leaving the vertical component to
//! the simulation.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::error::PhysicsError;
use crate::world::{BodyHandle, PhysicsEngine, ScenePhysics};

use super::config::{ControllerConfig, LookMode};
use super::state::{PlayerCommand, ViewState};

/// Drives the player body from per-frame input.
///
/// # Example
///
/// ```ignore
/// let mut controller = PlayerController::new(ControllerConfig::desktop(), body, &mut physics)?;
///
/// // Each frame:
/// controller.apply_command(&mut physics, &command);
/// physics.step(frame_delta);
/// physics.sync_visuals(&mut scene);
/// let eye = controller.eye_position(&physics);
/// ```
#[derive(Debug, Clone)]
pub struct PlayerController {
    config: ControllerConfig,
    body: BodyHandle,
    view: ViewState,
}

impl PlayerController {
    /// Wrap an existing player body.
    ///
    /// The config must pass [`ControllerConfig::validate`], and the body
    /// must exist, be registered with the world and be dynamic.
    /// Its rotation is locked according to `config.rotation_lock`.
    pub fn new<E: PhysicsEngine>(
        config: ControllerConfig,
        body: BodyHandle,
        physics: &mut ScenePhysics<E>,
    ) -> Result<Self, PhysicsError> {
        config.validate()?;
        if !physics.contains(body) {
            return Err(PhysicsError::UnknownBody(body));
        }
        if !physics.is_registered(body) {
            return Err(PhysicsError::BodyNotInWorld(body));
        }
        if physics.mass(body).map_or(true, |mass| mass <= 0.0) {
            return Err(PhysicsError::StaticPlayerBody(body));
        }

        physics.set_angular_factor(body, config.rotation_lock.angular_factor());
        physics.set_angular_velocity(body, Vec3::ZERO);

        let view = ViewState::new(config.eye_offset);
        log::debug!("player controller on {:?}, look mode {:?}", body, config.look_mode);

        Ok(Self { config, body, view })
    }

    /// Apply one frame of input. Call before stepping the world.
    pub fn apply_command<E: PhysicsEngine>(&mut self, physics: &mut ScenePhysics<E>, command: &PlayerCommand) {
        self.update_view(command);
        self.update_velocity(physics, command);

        // A sleeping body ignores velocity writes
        physics.wake(self.body);
    }

    // ========================================================================
    // View
    // ========================================================================

    fn update_view(&mut self, command: &PlayerCommand) {
        if !command.has_look() {
            return;
        }
        let delta = command.look_delta * self.config.look_sensitivity;

        self.view.yaw -= delta.x;
        if self.view.yaw > PI {
            self.view.yaw -= TAU;
        } else if self.view.yaw < -PI {
            self.view.yaw += TAU;
        }

        match self.config.look_mode {
            LookMode::Pitch => {
                let limit = self.config.pitch_limit;
                self.view.pitch = (self.view.pitch - delta.y).clamp(-limit, limit);
            }
            LookMode::HeightPan {
                speed,
                min_offset,
                max_offset,
            } => {
                // Swipe up raises the eye
                let pan = command.look_delta.y * speed;
                self.view.eye_offset = (self.view.eye_offset - pan).clamp(min_offset, max_offset);
            }
        }
    }

    // ========================================================================
    // Movement
    // ========================================================================

    fn update_velocity<E: PhysicsEngine>(&self, physics: &mut ScenePhysics<E>, command: &PlayerCommand) {
        let Some(velocity) = physics.linear_velocity(self.body) else {
            log::warn!("player body {:?} is gone", self.body);
            return;
        };

        let magnitude = command.move_magnitude();
        if magnitude < self.config.deadzone {
            let damping = self.config.idle_damping;
            let damped = Vec3::new(velocity.x * damping, velocity.y, velocity.z * damping);
            physics.set_linear_velocity(self.body, damped);
            return;
        }

        let target = self.wish_velocity(command) * magnitude;
        physics.set_linear_velocity(self.body, Vec3::new(target.x, velocity.y, target.z));
    }

    /// Full-speed horizontal velocity in the direction the input points.
    fn wish_velocity(&self, command: &PlayerCommand) -> Vec3 {
        let forward = self.view.forward_direction();
        let right = self.view.right_direction();

        let direction = forward * command.move_axis.y + right * command.move_axis.x;
        direction.normalize_or_zero() * self.config.move_speed
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Camera position: body origin raised by the eye offset.
    ///
    /// Call after the world has stepped so the camera shows this frame.
    pub fn eye_position<E: PhysicsEngine>(&self, physics: &ScenePhysics<E>) -> Option<Vec3> {
        let transform = physics.transform(self.body)?;
        Some(transform.position + Vec3::new(0.0, self.view.eye_offset, 0.0))
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Replace the view, e.g. when loading a save.
    pub fn set_view(&mut self, view: ViewState) {
        self.view = view;
    }

    /// View angles as (pitch, yaw, roll).
    pub fn view_angles(&self) -> Vec3 {
        self.view.angles()
    }
}

#[cfg(test)]
mod tests {
    use boxroom_renderer::{Color, MeshScene};
    use glam::Vec2;

    use super::*;
    use crate::config::PhysicsConfig;
    use crate::world::BoxSpec;
    use std::f32::consts::FRAC_PI_2;

    const PLAYER_START: Vec3 = Vec3::new(0.0, 0.9, 5.0);

    fn create_test_scene(config: ControllerConfig) -> (ScenePhysics, MeshScene, PlayerController) {
        let mut physics = ScenePhysics::new(PhysicsConfig::default());
        let mut scene = MeshScene::new();

        // Floor top at y=0
        physics
            .create_body(
                &mut scene,
                &BoxSpec::fixed(Vec3::new(40.0, 1.0, 40.0), Vec3::new(0.0, -0.5, 0.0), Color::GRAY),
            )
            .unwrap();
        let player = physics
            .create_body(
                &mut scene,
                &BoxSpec::new(Vec3::new(1.0, 1.8, 1.0), 50.0, PLAYER_START, Color::WHITE).hidden(),
            )
            .unwrap();
        physics.activate().unwrap();

        let body = physics.body_of(player).unwrap();
        let controller = PlayerController::new(config, body, &mut physics).unwrap();
        (physics, scene, controller)
    }

    fn idle() -> PlayerCommand {
        PlayerCommand::default()
    }

    fn moving(x: f32, y: f32) -> PlayerCommand {
        PlayerCommand {
            move_axis: Vec2::new(x, y),
            ..Default::default()
        }
    }

    fn horizontal_speed(velocity: Vec3) -> f32 {
        Vec3::new(velocity.x, 0.0, velocity.z).length()
    }

    #[test]
    fn test_damping_preserves_vertical_velocity() {
        let (mut physics, _scene, mut controller) = create_test_scene(ControllerConfig::desktop());
        let body = controller.body();
        physics.set_linear_velocity(body, Vec3::new(3.0, -2.0, 3.0));

        controller.apply_command(&mut physics, &idle());

        let velocity = physics.linear_velocity(body).unwrap();
        assert_eq!(velocity.y, -2.0);
        assert!((velocity.x - 0.3).abs() < 1e-5);
        assert!((velocity.z - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_stop_on_idle() {
        let (mut physics, mut scene, mut controller) = create_test_scene(ControllerConfig::desktop());
        let body = controller.body();

        // Let the player settle on the floor first
        for _ in 0..30 {
            controller.apply_command(&mut physics, &idle());
            physics.step(1.0 / 60.0);
        }
        physics.set_linear_velocity(body, Vec3::new(3.0, 0.0, 3.0));

        let mut previous = horizontal_speed(physics.linear_velocity(body).unwrap());
        for _ in 0..10 {
            controller.apply_command(&mut physics, &idle());
            physics.step(1.0 / 60.0);
            physics.sync_visuals(&mut scene);

            let speed = horizontal_speed(physics.linear_velocity(body).unwrap());
            assert!(speed <= previous + 1e-4, "speed rose from {} to {}", previous, speed);
            previous = speed;
        }

        assert!(previous < 0.01, "final speed {}", previous);
    }

    #[test]
    fn test_idle_in_air_keeps_falling() {
        let (mut physics, mut scene, mut controller) = create_test_scene(ControllerConfig::desktop());
        let body = controller.body();
        physics.teleport(&mut scene, body, Vec3::new(0.0, 20.0, 0.0));

        for _ in 0..10 {
            controller.apply_command(&mut physics, &idle());
            physics.step(1.0 / 60.0);
        }

        // Gravity kept acting: roughly g * t after 10 frames
        let vy = physics.linear_velocity(body).unwrap().y;
        assert!(vy < -1.0, "vertical velocity {}", vy);
    }

    #[test]
    fn test_forward_movement() {
        let (mut physics, _scene, mut controller) = create_test_scene(ControllerConfig::desktop());
        let body = controller.body();
        physics.set_linear_velocity(body, Vec3::new(0.0, -0.5, 0.0));

        controller.apply_command(&mut physics, &moving(0.0, 1.0));

        // Facing -Z at yaw zero
        let velocity = physics.linear_velocity(body).unwrap();
        assert!(velocity.x.abs() < 1e-5);
        assert!((velocity.z + 5.0).abs() < 1e-5);
        assert_eq!(velocity.y, -0.5);
    }

    #[test]
    fn test_strafe_and_partial_deflection() {
        let (mut physics, _scene, mut controller) = create_test_scene(ControllerConfig::desktop());
        let body = controller.body();

        controller.apply_command(&mut physics, &moving(0.5, 0.0));
        let velocity = physics.linear_velocity(body).unwrap();
        assert!((velocity.x - 2.5).abs() < 1e-5);
        assert!(velocity.z.abs() < 1e-5);

        controller.apply_command(&mut physics, &moving(1.0, 1.0));
        let speed = horizontal_speed(physics.linear_velocity(body).unwrap());
        assert!((speed - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_walks_across_floor() {
        let (mut physics, mut scene, mut controller) = create_test_scene(ControllerConfig::desktop());

        for _ in 0..60 {
            controller.apply_command(&mut physics, &moving(0.0, 1.0));
            physics.step(1.0 / 60.0);
            physics.sync_visuals(&mut scene);
        }

        let eye = controller.eye_position(&physics).unwrap();
        assert!(eye.z < PLAYER_START.z - 3.0, "eye at {:?}", eye);
        assert!((eye.y - (PLAYER_START.y + 0.5)).abs() < 0.1, "eye at {:?}", eye);
    }

    #[test]
    fn test_movement_follows_yaw() {
        let (mut physics, _scene, mut controller) = create_test_scene(ControllerConfig::desktop());
        let body = controller.body();

        // Turn left a quarter turn: 0.002 rad/px
        let turn = PlayerCommand {
            look_delta: Vec2::new(-FRAC_PI_2 / 0.002, 0.0),
            ..Default::default()
        };
        controller.apply_command(&mut physics, &turn);
        assert!((controller.view().yaw - FRAC_PI_2).abs() < 1e-4);

        controller.apply_command(&mut physics, &moving(0.0, 1.0));
        let velocity = physics.linear_velocity(body).unwrap();
        assert!((velocity.x + 5.0).abs() < 1e-3);
        assert!(velocity.z.abs() < 1e-3);
    }

    #[test]
    fn test_pitch_clamped() {
        let (mut physics, _scene, mut controller) = create_test_scene(ControllerConfig::desktop());

        let look_up = PlayerCommand {
            look_delta: Vec2::new(0.0, -10_000.0),
            ..Default::default()
        };
        controller.apply_command(&mut physics, &look_up);
        assert_eq!(controller.view().pitch, FRAC_PI_2);

        let look_down = PlayerCommand {
            look_delta: Vec2::new(0.0, 50_000.0),
            ..Default::default()
        };
        controller.apply_command(&mut physics, &look_down);
        assert_eq!(controller.view().pitch, -FRAC_PI_2);
    }

    #[test]
    fn test_height_pan() {
        let (mut physics, _scene, mut controller) = create_test_scene(ControllerConfig::touch());

        let swipe_up = PlayerCommand {
            look_delta: Vec2::new(0.0, -50.0),
            ..Default::default()
        };
        controller.apply_command(&mut physics, &swipe_up);
        assert_eq!(controller.view().pitch, 0.0);
        assert!((controller.view().eye_offset - 1.0).abs() < 1e-5);

        let big_swipe = PlayerCommand {
            look_delta: Vec2::new(0.0, -1_000.0),
            ..Default::default()
        };
        controller.apply_command(&mut physics, &big_swipe);
        assert_eq!(controller.view().eye_offset, 1.5);

        let eye = controller.eye_position(&physics).unwrap();
        assert!((eye.y - (PLAYER_START.y + 1.5)).abs() < 1e-5);
    }

    #[test]
    fn test_body_kept_awake() {
        let (mut physics, _scene, mut controller) = create_test_scene(ControllerConfig::desktop());
        let body = controller.body();

        for _ in 0..240 {
            controller.apply_command(&mut physics, &idle());
            physics.step(1.0 / 60.0);
        }
        controller.apply_command(&mut physics, &idle());

        assert!(physics.is_awake(body));
    }

    #[test]
    fn test_construction_preconditions() {
        let mut physics = ScenePhysics::new(PhysicsConfig::default());
        let mut scene = MeshScene::new();
        let wall = physics
            .create_body(&mut scene, &BoxSpec::fixed(Vec3::ONE, Vec3::ZERO, Color::GRAY))
            .unwrap();
        let parked = physics
            .create_body(&mut scene, &BoxSpec::cube(1.0, 50.0, Vec3::ONE, Color::WHITE))
            .unwrap();
        physics.set_body_in_world(&mut scene, parked, false);

        let wall_body = physics.body_of(wall).unwrap();
        let parked_body = physics.body_of(parked).unwrap();
        let config = ControllerConfig::desktop();

        assert_eq!(
            PlayerController::new(config.clone(), wall_body, &mut physics).unwrap_err(),
            PhysicsError::StaticPlayerBody(wall_body)
        );
        assert_eq!(
            PlayerController::new(config.clone(), parked_body, &mut physics).unwrap_err(),
            PhysicsError::BodyNotInWorld(parked_body)
        );

        physics.remove_body(&mut scene, parked);
        assert_eq!(
            PlayerController::new(config, parked_body, &mut physics).unwrap_err(),
            PhysicsError::UnknownBody(parked_body)
        );
    }

    #[test]
    fn test_inverted_height_pan_rejected_at_construction() {
        let mut physics = ScenePhysics::new(PhysicsConfig::default());
        let mut scene = MeshScene::new();
        let player = physics
            .create_body(
                &mut scene,
                &BoxSpec::new(Vec3::new(1.0, 1.8, 1.0), 50.0, PLAYER_START, Color::WHITE).hidden(),
            )
            .unwrap();
        let body = physics.body_of(player).unwrap();
        let config = ControllerConfig {
            look_mode: LookMode::HeightPan {
                speed: 0.01,
                min_offset: 1.5,
                max_offset: 0.2,
            },
            ..ControllerConfig::touch()
        };

        assert!(matches!(
            PlayerController::new(config, body, &mut physics),
            Err(PhysicsError::InvalidControllerConfig(_))
        ));
    }
}
