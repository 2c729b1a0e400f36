//! The simulated world of one scene: engine, transform bridge, body
//! factory, pools and the lifecycle that owns them.

mod bridge;
mod engine;
mod factory;
mod pool;
mod rapier;
mod scene;

pub use bridge::{read_transform, snapshot, sync_mesh, teleport, BodyTransform, MotionSnapshot};
pub use engine::{BodyHandle, PhysicsEngine};
pub use factory::{BoxSpec, BuiltBody};
pub use pool::{BodyPool, PoolId, PoolSpec, PooledBody, PooledHandle};
pub use rapier::RapierEngine;
pub use scene::{LifecycleState, ScenePhysics, StepReport, SyncReport, TrackedBody, TrackedId};
