//! Surface materials attached to collision triangles

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Per-surface behavior flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct MaterialFlags: u32 {
        /// Steep contacts push the character horizontally only, so it
        /// cannot be lifted or pressed down by non-walkable geometry.
        const FLATTEN = 1 << 0;
    }
}

/// Friction pair and flags for a triangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMaterial {
    /// Friction coefficient while at rest
    pub static_friction: f32,
    /// Friction coefficient while sliding
    pub dynamic_friction: f32,
    /// Behavior flags
    pub flags: MaterialFlags,
}

impl SurfaceMaterial {
    /// Create a material with the given friction pair and no flags
    pub const fn new(static_friction: f32, dynamic_friction: f32) -> Self {
        Self {
            static_friction,
            dynamic_friction,
            flags: MaterialFlags::empty(),
        }
    }

    /// Builder pattern: Set flags
    pub fn with_flags(mut self, flags: MaterialFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Does this surface flatten steep contacts
    pub fn flattens(&self) -> bool {
        self.flags.contains(MaterialFlags::FLATTEN)
    }
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self::new(0.6, 0.5)
    }
}
