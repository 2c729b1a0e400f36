//! The per-frame driver.
//!
//! [`Simulation`] owns one scene: its physics lifecycle, meshes, level,
//! player and camera. Each call to [`Simulation::frame`] runs the fixed
//! frame order (input, controller, step, sync, camera, level).

use boxroom_physics::{
    BodyHandle, BoxSpec, ControllerConfig, LifecycleState, PhysicsConfig, PlayerController, ScenePhysics,
    TrackedId, ViewState,
};
use boxroom_renderer::{Color, FirstPersonCamera, MeshScene};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::input::InputState;
use crate::level::{AimRay, Level, LevelContext, LevelEvent, LevelFrame};
use crate::save::GameSave;

/// Simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub physics: PhysicsConfig,
    pub controller: ControllerConfig,

    /// Player collision box (meters).
    pub player_size: Vec3,
    pub player_mass: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            controller: ControllerConfig::default(),
            player_size: Vec3::new(1.0, 1.8, 1.0),
            player_mass: 50.0,
        }
    }
}

/// One running scene.
pub struct Simulation {
    /// Current frame number.
    pub frame: u64,

    /// Input gathered since the last frame.
    pub input: InputState,

    config: SimulationConfig,
    physics: ScenePhysics,
    scene: MeshScene,
    level: Box<dyn Level>,
    controller: PlayerController,
    player: TrackedId,
    camera: FirstPersonCamera,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("frame", &self.frame)
            .field("level", &self.level.name())
            .field("state", &self.physics.state())
            .field("player", &self.player)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Build the level, add the player and activate the scene.
    pub fn new(config: SimulationConfig, mut level: Box<dyn Level>) -> Result<Self, GameError> {
        let mut physics = ScenePhysics::new(config.physics.clone());
        let mut scene = MeshScene::new();

        level.setup(&mut LevelContext::new(&mut physics, &mut scene))?;

        // The player is never drawn; the camera sits inside it.
        let spec = BoxSpec::new(config.player_size, config.player_mass, level.player_start(), Color::WHITE).hidden();
        let player = physics.create_body(&mut scene, &spec)?;
        physics.activate()?;

        let body = physics.body_of(player).ok_or(GameError::PlayerMissing)?;
        let controller = PlayerController::new(config.controller.clone(), body, &mut physics)?;

        log::info!(
            "{} ready: {} bodies, {} meshes",
            level.name(),
            physics.world_body_count(),
            scene.len()
        );

        let level_start = level.player_start();
        let mut simulation = Self {
            frame: 0,
            input: InputState::new(),
            config,
            physics,
            scene,
            level,
            controller,
            player,
            camera: FirstPersonCamera::new(level_start),
        };
        simulation.update_camera();
        Ok(simulation)
    }

    /// Advance one frame by `delta` wall-clock seconds.
    pub fn frame(&mut self, delta: f32) -> Vec<LevelEvent> {
        if self.physics.state() != LifecycleState::Active {
            return Vec::new();
        }

        let command = self.input.to_command();
        self.controller.apply_command(&mut self.physics, &command);

        self.physics.step(delta);
        let sync = self.physics.sync_visuals(&mut self.scene);
        if sync.failed > 0 {
            log::warn!("frame {}: {} meshes kept stale transforms", self.frame, sync.failed);
        }

        self.update_camera();

        let frame = LevelFrame {
            delta,
            interact: command.interact,
            aim: self.aim(),
        };
        let events = self
            .level
            .update(&mut LevelContext::new(&mut self.physics, &mut self.scene), &frame);

        if events.contains(&LevelEvent::Reset) {
            self.reset_player();
        }
        for event in &events {
            log::debug!("frame {}: {:?}", self.frame, event);
        }

        self.frame += 1;
        events
    }

    /// Ray from the eye through the pointer. The pointer rests at the
    /// screen center, which aims along the view.
    pub fn aim(&self) -> AimRay {
        AimRay {
            origin: self.camera.position,
            direction: self.camera.screen_direction(self.input.pointer()),
        }
    }

    /// Match the camera to the viewport so pointer aiming lines up.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.camera.resize(width, height);
    }

    // ========================================================================
    // Save / load / reset
    // ========================================================================

    pub fn save_state(&self) -> Result<GameSave, GameError> {
        let player = self.physics.snapshot(self.player_body()).ok_or(GameError::PlayerMissing)?;
        Ok(GameSave::new(
            self.level.name(),
            player,
            *self.controller.view(),
            self.level.save_state(),
        ))
    }

    pub fn load_state(&mut self, save: &GameSave) -> Result<(), GameError> {
        if save.level_name != self.level.name() {
            return Err(GameError::WrongLevel {
                found: save.level_name.clone(),
                expected: self.level.name().to_string(),
            });
        }
        let body = self.player_body();
        if !self.physics.contains(body) {
            return Err(GameError::PlayerMissing);
        }

        self.physics.restore(&mut self.scene, body, &save.player);
        self.controller.set_view(save.view);
        self.level
            .load_state(&mut LevelContext::new(&mut self.physics, &mut self.scene), &save.level);
        self.input.clear();
        self.update_camera();

        log::info!("loaded save for {}", save.level_name);
        Ok(())
    }

    /// Put the level and player back to their starting state.
    pub fn reset(&mut self) {
        self.level
            .reset_to_initial_state(&mut LevelContext::new(&mut self.physics, &mut self.scene));
        self.reset_player();
    }

    fn reset_player(&mut self) {
        let start = self.level.player_start();
        let body = self.player_body();
        self.physics.teleport(&mut self.scene, body, start);
        self.controller.set_view(ViewState::new(self.config.controller.eye_offset));
        self.input.clear();
        self.update_camera();
    }

    /// Tear the scene down. Returns how many bodies were removed; zero on
    /// repeat calls.
    pub fn dispose(&mut self) -> usize {
        if matches!(self.physics.state(), LifecycleState::Disposing | LifecycleState::Disposed) {
            return 0;
        }
        self.level
            .dispose(&mut LevelContext::new(&mut self.physics, &mut self.scene));
        self.physics.dispose(&mut self.scene)
    }

    fn update_camera(&mut self) {
        if let Some(eye) = self.controller.eye_position(&self.physics) {
            self.camera.update_from_player(eye, self.controller.view_angles());
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn physics(&self) -> &ScenePhysics {
        &self.physics
    }

    pub fn scene(&self) -> &MeshScene {
        &self.scene
    }

    pub fn camera(&self) -> &FirstPersonCamera {
        &self.camera
    }

    pub fn controller(&self) -> &PlayerController {
        &self.controller
    }

    pub fn level(&self) -> &dyn Level {
        self.level.as_ref()
    }

    pub fn player(&self) -> TrackedId {
        self.player
    }

    pub fn player_body(&self) -> BodyHandle {
        self.controller.body()
    }

    /// Player body origin, if it still exists.
    pub fn player_position(&self) -> Option<Vec3> {
        self.physics.transform(self.player_body()).map(|t| t.position)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::levels::{ButtonDropConfig, ButtonDropLevel};

    const DT: f32 = 1.0 / 60.0;

    fn create_test_simulation() -> Simulation {
        let level = ButtonDropLevel::new(ButtonDropConfig {
            color_seed: Some(3),
            ..Default::default()
        });
        Simulation::new(SimulationConfig::default(), Box::new(level)).unwrap()
    }

    fn run(sim: &mut Simulation, frames: usize) -> Vec<LevelEvent> {
        (0..frames).flat_map(|_| sim.frame(DT)).collect()
    }

    #[test]
    fn test_player_rests_on_floor() {
        let mut sim = create_test_simulation();
        run(&mut sim, 90);

        let pos = sim.player_position().unwrap();
        assert!((pos.y - 0.9).abs() < 0.05, "player at {:?}", pos);
        assert!((pos.z - 5.0).abs() < 0.05);
        assert_eq!(sim.frame, 90);
    }

    #[test]
    fn test_walk_forward() {
        let mut sim = create_test_simulation();
        run(&mut sim, 30);

        sim.input.movement.forward = true;
        run(&mut sim, 30);

        let pos = sim.player_position().unwrap();
        // Default view looks down -Z.
        assert!(pos.z < 4.0, "player at {:?}", pos);
        assert!(pos.x.abs() < 0.1);
    }

    #[test]
    fn test_camera_follows_eye() {
        let mut sim = create_test_simulation();
        sim.input.movement.right = true;
        run(&mut sim, 20);

        let eye = sim.controller().eye_position(sim.physics()).unwrap();
        assert_eq!(sim.camera().position, eye);
        assert_eq!(sim.camera().angles, sim.controller().view_angles());
    }

    #[test]
    fn test_interact_spawns_block() {
        let mut sim = create_test_simulation();
        sim.input.request_interact();

        let events = sim.frame(DT);
        assert!(events
            .iter()
            .any(|e| matches!(e, LevelEvent::BlockSpawned { .. })));

        // Interact is consumed.
        let events = sim.frame(DT);
        assert!(!events
            .iter()
            .any(|e| matches!(e, LevelEvent::BlockSpawned { .. })));
    }

    #[test]
    fn test_centered_pointer_aims_along_view() {
        let sim = create_test_simulation();
        let aim = sim.aim();
        assert!((aim.direction - sim.controller().view().look_direction()).length() < 1e-4);
    }

    #[test]
    fn test_tap_near_bottom_drops_block_at_feet() {
        let level = ButtonDropLevel::new(ButtonDropConfig {
            color_seed: Some(3),
            ..Default::default()
        });
        let config = SimulationConfig {
            controller: ControllerConfig::touch(),
            ..Default::default()
        };
        let mut sim = Simulation::new(config, Box::new(level)).unwrap();
        run(&mut sim, 30);

        sim.input.set_pointer(Vec2::new(0.0, -0.9));
        sim.input.request_interact();
        let events = sim.frame(DT);

        let spawned = events
            .iter()
            .find_map(|e| match e {
                LevelEvent::BlockSpawned { position } => Some(*position),
                _ => None,
            })
            .unwrap();
        // The player stands at z = 5; straight ahead would be z = -1.
        assert!(spawned.x.abs() < 1e-3, "spawned at {:?}", spawned);
        assert!(spawned.z > 2.5 && spawned.z < 5.0, "spawned at {:?}", spawned);
    }

    #[test]
    fn test_save_and_load_player() {
        let mut sim = create_test_simulation();
        run(&mut sim, 60);
        let save = sim.save_state().unwrap();
        let saved = save.player.position;

        sim.input.movement.forward = true;
        run(&mut sim, 30);
        assert!((sim.player_position().unwrap() - saved).length() > 1.0);

        let bytes = save.encode().unwrap();
        sim.load_state(&GameSave::decode(&bytes).unwrap()).unwrap();

        assert!((sim.player_position().unwrap() - saved).length() < 1e-4);
        assert!((sim.camera().position - (saved + Vec3::new(0.0, 0.5, 0.0))).length() < 1e-4);
    }

    #[test]
    fn test_load_rejects_other_level() {
        let mut sim = create_test_simulation();
        let mut save = sim.save_state().unwrap();
        save.level_name = "Elsewhere".to_string();

        assert!(matches!(sim.load_state(&save), Err(GameError::WrongLevel { .. })));
    }

    #[test]
    fn test_reset_returns_player() {
        let mut sim = create_test_simulation();
        sim.input.movement.backward = true;
        run(&mut sim, 30);

        sim.reset();
        let pos = sim.player_position().unwrap();
        assert!((pos - Vec3::new(0.0, 0.9, 5.0)).length() < 1e-4);
        assert_eq!(sim.controller().view().yaw, 0.0);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut sim = create_test_simulation();
        run(&mut sim, 5);

        // Floor, four walls, button, door, 20 pooled blocks and the player.
        assert_eq!(sim.dispose(), 28);
        assert_eq!(sim.dispose(), 0);
        assert_eq!(sim.physics().state(), LifecycleState::Disposed);
        assert!(sim.frame(DT).is_empty());
    }
}
