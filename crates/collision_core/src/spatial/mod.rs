//! Spatial partitioning data structures
//!
//! Provides bounding boxes and the bounding volume hierarchy used to prune
//! ray and capsule queries against triangle sets.

pub mod aabb;
pub mod bvh;

pub use aabb::AABB;
pub use bvh::{Bvh, BvhNode, LEAF_SIZE};
