//! Core module - Crate-wide settings
//!
//! Holds the unified physics configuration consumed by the query engine and
//! the character controller.

pub mod config;

pub use config::{ControllerConfig, PhysicsConfig, QueryConfig};
