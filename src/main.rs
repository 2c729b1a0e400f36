//! Boxroom - Main Entry Point
//!
//! Runs the button room headless with a scripted player: aim at the
//! button, drop a block, walk to the door, then save and tear down.

use boxroom_game::{ButtonDropConfig, ButtonDropLevel, FrameClock, GameSave, LevelEvent, Simulation, SimulationConfig};
use std::time::Duration;

use glam::Vec2;

/// Target frame pacing for the headless run.
const FRAME_TIME: Duration = Duration::from_micros(16_667);

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let level_config = ButtonDropConfig::default();
    let button = level_config.button_position;
    let block_center = level_config.block_size * 0.5;

    let config = SimulationConfig::default();
    let sensitivity = config.controller.look_sensitivity;
    let mut simulation = Simulation::new(config, Box::new(ButtonDropLevel::new(level_config)))?;
    simulation.resize(1280.0, 720.0);
    let mut clock = FrameClock::new();
    clock.tick();

    // Let the player settle onto the floor.
    step(&mut simulation, &mut clock, 30);

    // Pitch down until the aim ray meets the button at block height.
    let eye = simulation.camera().position;
    let pitch = (eye.y - block_center).atan2(eye.z - button.z);
    simulation.input.set_look_engaged(true);
    simulation.input.add_mouse_motion(Vec2::new(0.0, pitch / sensitivity));
    simulation.input.set_look_engaged(false);
    step(&mut simulation, &mut clock, 1);

    simulation.input.request_interact();
    let mut opened = false;
    for _ in 0..600 {
        if step(&mut simulation, &mut clock, 1).contains(&LevelEvent::DoorOpened) {
            opened = true;
            break;
        }
    }
    if !opened {
        log::warn!("door did not open");
    }

    // Walk up to the doorway.
    simulation.input.movement.forward = true;
    step(&mut simulation, &mut clock, 120);
    simulation.input.movement.forward = false;

    let save = simulation.save_state()?;
    let bytes = save.encode()?;
    let restored = GameSave::decode(&bytes)?;
    log::info!(
        "saved {} at {:?} ({} bytes)",
        restored.level_name,
        restored.player.position,
        bytes.len()
    );

    let removed = simulation.dispose();
    log::info!(
        "{} frames in {:.3}s, {} bodies removed",
        simulation.frame,
        clock.elapsed().as_secs_f32(),
        removed
    );
    Ok(())
}

/// Run `frames` real-time frames, logging any on-screen messages.
fn step(simulation: &mut Simulation, clock: &mut FrameClock, frames: usize) -> Vec<LevelEvent> {
    let mut events = Vec::new();
    for _ in 0..frames {
        std::thread::sleep(FRAME_TIME);
        let frame_events = simulation.frame(clock.tick());
        for event in &frame_events {
            if let Some((text, _)) = event.message() {
                log::info!("{}", text);
            }
        }
        events.extend(frame_events);
    }
    events
}
