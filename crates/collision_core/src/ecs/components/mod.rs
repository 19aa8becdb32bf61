//! Components read and written by the collision core

pub mod transform;
pub mod physics_body;
pub mod collision_mesh;
pub mod character;

pub use transform::TransformComponent;
pub use physics_body::PhysicsBodyComponent;
pub use collision_mesh::{CollisionMeshComponent, MeshError, MeshMaterials};
pub use character::{
    CharacterControllerComponent, ControllerState, GroundState, MovementIntentComponent,
};
