//! Per-robot controllers: capability interfaces for the robot body, steering
//! policies, the selectable behaviors and the per-tick control loop.

pub mod behavior;
mod controller;
pub mod devices;
pub mod steering;

pub use behavior::{Behavior, BehaviorCtx, BehaviorKind};
pub use controller::*;
pub use devices::*;
pub use steering::WheelSpeeds;
