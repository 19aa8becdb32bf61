//! System trait

use crate::ecs::World;

/// System trait for processing entities and components once per fixed step
pub trait System {
    /// Advance the system by one fixed step of `dt` seconds
    fn fixed_update(&mut self, world: &mut World, dt: f32);
}
