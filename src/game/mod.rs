//! Arena simulation modules

pub mod combat;
pub mod controller;
pub mod dispatch;
pub mod geometry;
pub mod physics;
pub mod registry;
pub mod world;

pub use registry::{PlayerState, SessionRegistry};
pub use world::{GameWorld, WorldEvent, WorldHandle};
