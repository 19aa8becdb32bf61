//! Entity-Component-System storage
//!
//! Entities are plain integer handles; components live in dense per-type
//! tables owned by the [`World`]. The collision core only reads these tables
//! while rebuilding or updating its triangle sets.

pub mod world;
pub mod entity;
pub mod component;
pub mod storage;
pub mod system;
pub mod components;

pub use world::World;
pub use entity::Entity;
pub use component::Component;
pub use storage::ComponentStorage;
pub use system::System;
