//! Kinematic body state

use crate::ecs::Component;
use crate::foundation::math::Vec3;

/// Position and velocity of a moving body
///
/// Mesh entities use `is_static` to choose between the static and dynamic
/// triangle sets; mesh entities with no body at all are treated as static.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsBodyComponent {
    /// World space position. For characters this is the capsule center.
    pub position: Vec3,
    /// Linear velocity in units per second
    pub velocity: Vec3,
    /// Body never moves
    pub is_static: bool,
}

impl Component for PhysicsBodyComponent {}

impl PhysicsBodyComponent {
    /// Create a moving body at `position`
    pub fn dynamic(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::zeros(),
            is_static: false,
        }
    }

    /// Create a body that never moves
    pub fn fixed(position: Vec3) -> Self {
        Self {
            is_static: true,
            ..Self::dynamic(position)
        }
    }

    /// Builder pattern: Set velocity
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }
}

impl Default for PhysicsBodyComponent {
    fn default() -> Self {
        Self::dynamic(Vec3::zeros())
    }
}
