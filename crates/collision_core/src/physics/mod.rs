//! Physics module
//!
//! Collision geometry, the query engine built on it, and the kinematic
//! character controller that consumes the queries each fixed step.

pub mod collision;
pub mod query;
pub mod character;

pub use character::{move_and_slide, MoveAndSlideSystem, MoveReport};
pub use query::{CollisionQuery, SweepMode};
