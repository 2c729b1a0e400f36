//! Drop a block on the button to open the door.
//!
//! The player aims at the floor and asks for a block; one is taken from the
//! pool and dropped from above the aimed point. The first block that comes
//! to rest on the button slides the door open. Each block that settles
//! anywhere else while the door is shut counts as a wrong landing, and
//! reaching the limit schedules a full reset. Blocks vanish a fixed time
//! after spawning whatever they are doing.

use boxroom_physics::{BoxSpec, PoolId, PoolSpec, PooledHandle, TrackedId};
use boxroom_renderer::Color;
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::level::{Level, LevelContext, LevelEvent, LevelFrame, LevelSnapshot};
use crate::mover::KinematicMover;
use crate::puzzle::{DespawnTimers, LandingTracker, SettleRule};

const WALL_COLOR: Color = Color::from_hex(0x666666);
const DOOR_COLOR: Color = Color::from_hex(0x552200);
const BUTTON_COLOR: Color = Color::from_hex(0xff4444);

/// Layout and tuning for one [`ButtonDropLevel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonDropConfig {
    /// Interior footprint (x, z) of the room.
    pub room_extent: Vec2,
    pub wall_height: f32,
    pub wall_thickness: f32,
    pub floor_thickness: f32,

    pub player_start: Vec3,

    /// Edge length of the dropped cubes.
    pub block_size: f32,
    pub block_mass: f32,
    /// Height above the aimed point a block is released from.
    pub drop_height: f32,
    pub pool_capacity: usize,
    /// Seconds from spawn until a block is returned to the pool.
    pub despawn_delay: f32,
    /// Where the block goes when the aim ray misses the floor plane.
    pub aim_fallback_distance: f32,

    pub button_size: Vec3,
    pub button_position: Vec3,

    pub door_size: Vec3,
    pub door_position: Vec3,
    /// Door slide speed (m/s).
    pub door_speed: f32,

    pub max_wrong_landings: u32,
    /// Seconds between failing and the reset.
    pub reset_delay: f32,

    pub settle: SettleRule,

    /// Fixed seed for block colors; random when `None`.
    pub color_seed: Option<u64>,
}

impl Default for ButtonDropConfig {
    fn default() -> Self {
        Self {
            room_extent: Vec2::new(20.0, 20.0),
            wall_height: 6.0,
            wall_thickness: 0.5,
            floor_thickness: 0.5,
            player_start: Vec3::new(0.0, 0.9, 5.0),
            block_size: 1.0,
            block_mass: 1.0,
            drop_height: 5.0,
            pool_capacity: 20,
            despawn_delay: 6.0,
            aim_fallback_distance: 6.0,
            button_size: Vec3::new(1.0, 0.2, 1.0),
            button_position: Vec3::new(0.0, 0.1, -6.0),
            door_size: Vec3::new(2.0, 3.0, 0.2),
            door_position: Vec3::new(0.0, 1.5, -9.0),
            door_speed: 2.4,
            max_wrong_landings: 3,
            reset_delay: 3.0,
            settle: SettleRule::default(),
            color_seed: None,
        }
    }
}

impl ButtonDropConfig {
    /// Where the door rests once fully open: slid aside by its width.
    pub fn door_open_position(&self) -> Vec3 {
        self.door_position + Vec3::new(self.door_size.x, 0.0, 0.0)
    }

    /// Whether a block centered at `position` counts as on the button.
    ///
    /// A block may overhang the button by up to 10% of its half-width.
    pub fn is_on_button(&self, position: Vec3) -> bool {
        let reach = self.block_size * 0.5 * 0.9;
        let half_x = self.button_size.x * 0.5 + reach;
        let half_z = self.button_size.z * 0.5 + reach;

        (position.x - self.button_position.x).abs() <= half_x
            && (position.z - self.button_position.z).abs() <= half_z
    }
}

/// The button-and-door puzzle room.
#[derive(Debug)]
pub struct ButtonDropLevel {
    config: ButtonDropConfig,
    rng: StdRng,

    pool: Option<PoolId>,
    door: Option<KinematicMover>,
    button: Option<TrackedId>,

    /// Live blocks, oldest first.
    blocks: Vec<PooledHandle>,
    landings: LandingTracker<PooledHandle>,
    despawn: DespawnTimers<PooledHandle>,
    /// Aimed floor point, at block-center height.
    marker: Vec3,

    door_opened: bool,
    wrong_landings: u32,
    spawning_enabled: bool,
    reset_timer: Option<f32>,
}

impl ButtonDropLevel {
    pub fn new(config: ButtonDropConfig) -> Self {
        let rng = match config.color_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let landings = LandingTracker::new(config.settle);
        let marker = Vec3::new(0.0, config.block_size * 0.5, 0.0);

        Self {
            config,
            rng,
            pool: None,
            door: None,
            button: None,
            blocks: Vec::new(),
            landings,
            despawn: DespawnTimers::new(),
            marker,
            door_opened: false,
            wrong_landings: 0,
            spawning_enabled: true,
            reset_timer: None,
        }
    }

    pub fn config(&self) -> &ButtonDropConfig {
        &self.config
    }

    pub fn door_opened(&self) -> bool {
        self.door_opened
    }

    pub fn wrong_landings(&self) -> u32 {
        self.wrong_landings
    }

    pub fn marker(&self) -> Vec3 {
        self.marker
    }

    pub fn live_blocks(&self) -> &[PooledHandle] {
        &self.blocks
    }

    pub fn pool(&self) -> Option<PoolId> {
        self.pool
    }

    pub fn door(&self) -> Option<TrackedId> {
        self.door.as_ref().map(KinematicMover::body)
    }

    pub fn button(&self) -> Option<TrackedId> {
        self.button
    }

    pub fn reset_pending(&self) -> bool {
        self.reset_timer.is_some()
    }

    // ========================================================================
    // Setup
    // ========================================================================

    fn build_room(&mut self, ctx: &mut LevelContext<'_>) -> Result<(), GameError> {
        let c = &self.config;
        let half_x = c.room_extent.x * 0.5;
        let half_z = c.room_extent.y * 0.5;
        let wall_y = c.wall_height * 0.5;
        let inset = c.wall_thickness * 0.5;

        let statics = [
            // Floor, top face at y = 0
            BoxSpec::fixed(
                Vec3::new(c.room_extent.x, c.floor_thickness, c.room_extent.y),
                Vec3::new(0.0, -c.floor_thickness * 0.5, 0.0),
                Color::GRAY,
            ),
            // Back, left, right and front walls
            BoxSpec::fixed(
                Vec3::new(c.room_extent.x, c.wall_height, c.wall_thickness),
                Vec3::new(0.0, wall_y, -half_z + inset),
                WALL_COLOR,
            ),
            BoxSpec::fixed(
                Vec3::new(c.wall_thickness, c.wall_height, c.room_extent.y),
                Vec3::new(-half_x + inset, wall_y, 0.0),
                WALL_COLOR,
            ),
            BoxSpec::fixed(
                Vec3::new(c.wall_thickness, c.wall_height, c.room_extent.y),
                Vec3::new(half_x - inset, wall_y, 0.0),
                WALL_COLOR,
            ),
            BoxSpec::fixed(
                Vec3::new(c.room_extent.x, c.wall_height, c.wall_thickness),
                Vec3::new(0.0, wall_y, half_z - inset),
                WALL_COLOR,
            ),
        ];
        let button = BoxSpec::fixed(c.button_size, c.button_position, BUTTON_COLOR);
        let door = BoxSpec::fixed(c.door_size, c.door_position, DOOR_COLOR);
        let door_position = c.door_position;
        let door_speed = c.door_speed;
        let pool = PoolSpec {
            capacity: c.pool_capacity,
            size: Vec3::splat(c.block_size),
            mass: c.block_mass,
        };

        for spec in &statics {
            ctx.physics.create_body(ctx.scene, spec)?;
        }
        self.button = Some(ctx.physics.create_body(ctx.scene, &button)?);

        let door = ctx.physics.create_body(ctx.scene, &door)?;
        self.door = Some(KinematicMover::new(door, door_position, door_speed));

        self.pool = Some(ctx.physics.create_pool(ctx.scene, pool)?);
        Ok(())
    }

    // ========================================================================
    // Per-frame
    // ========================================================================

    fn update_marker(&mut self, frame: &LevelFrame) {
        let height = self.config.block_size * 0.5;
        let point = frame
            .aim
            .intersect_horizontal(height)
            .unwrap_or_else(|| frame.aim.point_at(self.config.aim_fallback_distance));
        self.marker = Vec3::new(point.x, height, point.z);
    }

    fn spawn_block(&mut self, ctx: &mut LevelContext<'_>, events: &mut Vec<LevelEvent>) {
        let Some(pool) = self.pool else {
            return;
        };

        let position = self.marker + Vec3::new(0.0, self.config.drop_height, 0.0);
        let color = Color(self.rng.gen_range(0..=0xff_ffff));

        match ctx.physics.acquire(ctx.scene, pool, position, color) {
            Some(handle) => {
                self.blocks.push(handle);
                self.landings.track(handle);
                self.despawn.schedule(handle, self.config.despawn_delay);
                log::debug!("block spawned at {:?}", position);
                events.push(LevelEvent::BlockSpawned { position });
            }
            None => events.push(LevelEvent::PoolExhausted),
        }
    }

    fn check_landings(&mut self, ctx: &mut LevelContext<'_>, events: &mut Vec<LevelEvent>) {
        for index in 0..self.blocks.len() {
            let handle = self.blocks[index];
            let Some(body) = ctx.physics.pooled(handle).map(|slot| slot.body) else {
                continue;
            };
            let (Some(transform), Some(velocity)) =
                (ctx.physics.transform(body), ctx.physics.linear_velocity(body))
            else {
                continue;
            };

            if !self.landings.observe(handle, transform.position, velocity) {
                continue;
            }
            if self.door_opened || self.reset_timer.is_some() {
                continue;
            }

            if self.config.is_on_button(transform.position) {
                self.open_door(events);
            } else {
                self.wrong_landing(events);
            }
        }
    }

    fn open_door(&mut self, events: &mut Vec<LevelEvent>) {
        self.door_opened = true;
        let target = self.config.door_open_position();
        if let Some(door) = self.door.as_mut() {
            door.move_to(target);
        }
        log::info!("button pressed, door opening");
        events.push(LevelEvent::ButtonPressed);
    }

    fn wrong_landing(&mut self, events: &mut Vec<LevelEvent>) {
        self.wrong_landings += 1;
        let limit = self.config.max_wrong_landings;
        events.push(LevelEvent::WrongLanding {
            count: self.wrong_landings,
            limit,
        });

        if self.wrong_landings >= limit {
            log::info!("{} wrong landings, resetting in {}s", limit, self.config.reset_delay);
            self.spawning_enabled = false;
            self.reset_timer = Some(self.config.reset_delay);
            events.push(LevelEvent::Failed {
                reset_in: self.config.reset_delay,
            });
        }
    }

    fn expire_blocks(&mut self, ctx: &mut LevelContext<'_>, delta: f32, events: &mut Vec<LevelEvent>) {
        for handle in self.despawn.advance(delta) {
            self.forget_block(handle);
            if ctx.physics.release(ctx.scene, handle) {
                events.push(LevelEvent::BlockDespawned);
            }
        }
    }

    fn forget_block(&mut self, handle: PooledHandle) {
        self.blocks.retain(|h| *h != handle);
        self.landings.forget(handle);
        self.despawn.cancel(handle);
    }

    fn release_all_blocks(&mut self, ctx: &mut LevelContext<'_>) {
        for handle in self.blocks.drain(..) {
            ctx.physics.release(ctx.scene, handle);
        }
        self.landings.clear();
        self.despawn.clear();
    }

    /// Put the door back in the world at `open` or closed position.
    fn place_door(&mut self, ctx: &mut LevelContext<'_>, open: bool) {
        let position = if open {
            self.config.door_open_position()
        } else {
            self.config.door_position
        };
        if let Some(door) = self.door.as_mut() {
            door.snap_to(ctx.physics, ctx.scene, position);
            // An opened door from a save is gone entirely
            ctx.physics.set_body_in_world(ctx.scene, door.body(), !open);
        }
    }

    fn reset(&mut self, ctx: &mut LevelContext<'_>) {
        self.release_all_blocks(ctx);
        self.place_door(ctx, false);
        self.door_opened = false;
        self.wrong_landings = 0;
        self.spawning_enabled = true;
        self.reset_timer = None;
    }
}

impl Level for ButtonDropLevel {
    fn name(&self) -> &str {
        "Button Drop"
    }

    fn player_start(&self) -> Vec3 {
        self.config.player_start
    }

    fn setup(&mut self, ctx: &mut LevelContext<'_>) -> Result<(), GameError> {
        self.build_room(ctx)?;
        log::debug!("{} set up", self.name());
        Ok(())
    }

    fn update(&mut self, ctx: &mut LevelContext<'_>, frame: &LevelFrame) -> Vec<LevelEvent> {
        let mut events = Vec::new();

        if let Some(remaining) = self.reset_timer.as_mut() {
            *remaining -= frame.delta.max(0.0);
            if *remaining <= 0.0 {
                self.reset(ctx);
                events.push(LevelEvent::Reset);
                return events;
            }
        }

        self.update_marker(frame);
        if frame.interact && self.spawning_enabled {
            self.spawn_block(ctx, &mut events);
        }

        self.check_landings(ctx, &mut events);
        self.expire_blocks(ctx, frame.delta, &mut events);

        if let Some(door) = self.door.as_mut() {
            if door.update(ctx.physics, ctx.scene, frame.delta) && self.door_opened {
                log::info!("door open");
                events.push(LevelEvent::DoorOpened);
            }
        }

        events
    }

    fn save_state(&self) -> LevelSnapshot {
        LevelSnapshot {
            door_opened: self.door_opened,
            wrong_landings: self.wrong_landings,
            block_spawning_enabled: self.spawning_enabled,
        }
    }

    fn load_state(&mut self, ctx: &mut LevelContext<'_>, snapshot: &LevelSnapshot) {
        self.release_all_blocks(ctx);
        self.place_door(ctx, snapshot.door_opened);
        self.door_opened = snapshot.door_opened;
        self.wrong_landings = snapshot.wrong_landings;
        self.spawning_enabled = snapshot.block_spawning_enabled;
        self.reset_timer = None;
    }

    fn reset_to_initial_state(&mut self, ctx: &mut LevelContext<'_>) {
        self.reset(ctx);
    }

    fn dispose(&mut self, ctx: &mut LevelContext<'_>) {
        self.release_all_blocks(ctx);
        self.pool = None;
        self.door = None;
        self.button = None;
    }
}
