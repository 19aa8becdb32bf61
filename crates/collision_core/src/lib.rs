//! # Collision Core
//!
//! Spatial queries and kinematic character movement over triangle soup.
//!
//! ## Features
//!
//! - **Triangle Sets**: Many transformed entity meshes flattened into static
//!   and dynamic world-space sets, with incremental per-entity updates
//! - **BVH**: Flat-array bounding volume hierarchy with bottom-up refit
//! - **Queries**: Raycast, capsule sweep (any, blocking, ground) and capsule
//!   overlap against both sets
//! - **Character Controller**: Move-and-slide with ground snapping, driven
//!   by a fixed-step system
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use collision_core::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PhysicsConfig::default();
//!     config.init_logging();
//!     let mut world = World::new();
//!
//!     let floor = world.create_entity();
//!     world.add_component(floor, TransformComponent::identity());
//!     world.add_component(
//!         floor,
//!         CollisionMeshComponent::new(
//!             vec![
//!                 Vec3::new(-5.0, 0.0, -5.0),
//!                 Vec3::new(-5.0, 0.0, 5.0),
//!                 Vec3::new(5.0, 0.0, 5.0),
//!                 Vec3::new(5.0, 0.0, -5.0),
//!             ],
//!             vec![0, 1, 2, 0, 2, 3],
//!             MeshMaterials::default(),
//!         )?,
//!     );
//!
//!     let player = world.create_entity();
//!     world.add_component(player, PhysicsBodyComponent::dynamic(Vec3::new(0.0, 1.0, 0.0)));
//!     world.add_component(player, CharacterControllerComponent::from_config(&config.controller));
//!     world.add_component(player, MovementIntentComponent::walk(Vec3::new(2.0, 0.0, 0.0)));
//!
//!     let mut system = MoveAndSlideSystem::new(&config)?;
//!     system.update(&mut world, 1.0 / 30.0);
//!
//!     let hit = system.query().raycast(&Vec3::new(0.0, 5.0, 0.0), &Vec3::new(0.0, -1.0, 0.0), 10.0);
//!     assert!(hit.is_some());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;
pub mod config;
pub mod foundation;
pub mod ecs;
pub mod spatial;
pub mod physics;

#[cfg(test)]
pub(crate) mod test_scenes;

/// Common imports for users of the collision core
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        core::config::{ControllerConfig, PhysicsConfig, QueryConfig},
        ecs::components::{
            CharacterControllerComponent, CollisionMeshComponent, ControllerState,
            MeshError, MeshMaterials, MovementIntentComponent, PhysicsBodyComponent,
            TransformComponent,
        },
        ecs::{Component, Entity, System, World},
        foundation::math::{Mat4, Quat, Transform, Vec3},
        physics::collision::{MaterialFlags, SurfaceMaterial},
        physics::query::{CapsuleCastHit, CapsuleOverlapHit, CollisionQuery, RaycastHit, SweepMode},
        physics::{move_and_slide, MoveAndSlideSystem, MoveReport},
        spatial::{Bvh, AABB},
    };
}
