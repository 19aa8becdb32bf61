//! Collision geometry
//!
//! Primitive shapes and distance routines, surface materials, and the flat
//! world-space triangle sets the query engine searches.

pub mod primitives;
pub mod material;
pub mod mesh_set;

pub use primitives::{Capsule, Ray, Triangle};
pub use material::{MaterialFlags, SurfaceMaterial};
pub use mesh_set::{MeshSlice, MeshSource, TriangleMeshSet};
