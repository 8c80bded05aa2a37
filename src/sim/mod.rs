//! Behaviour layer
//!
//! All gameplay logic lives here. The module is deterministic:
//! - Every controller is a state machine driven by events or the frame tick
//! - Randomness comes from the simulation's seeded RNG only
//! - Dispatch is synchronous and depth-first on a single thread
//! - No rendering or platform dependencies (the host is behind [`World`])

pub mod backdrop;
pub mod bus;
pub mod character;
pub mod event;
pub mod field;
pub mod machine;
pub mod runtime;
pub mod sentinel;
pub mod session;
pub mod state;
pub mod tick;
pub mod world;

pub use backdrop::BackdropController;
pub use bus::{EventBus, SubscriptionHandle};
pub use character::{AnimationIntent, CharacterController, CharacterPhase};
pub use event::{EntityId, Event, EventName, ItemType, Payload, Platform, Target, TargetColor};
pub use field::{
    FieldPool, GroundController, Migration, ObstacleController, pool_size_for_level, scroll_x,
};
pub use machine::{Behavior, Command, Component, Context, Machine, Rule, Scope};
pub use runtime::Simulation;
pub use sentinel::{DropSentinel, FloorCollider, GameOverCollider};
pub use session::{SessionController, SessionPhase};
pub use state::{CharacterState, RngState, SessionState, height_for_level};
pub use tick::{Game, SceneHandles, TickInput, tick};
pub use world::{
    AnimationSpec, ColliderShape, ColliderSpec, ColliderTag, HeadlessWorld, ModelSpec, World,
};
