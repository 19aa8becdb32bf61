//! Query result types

use crate::foundation::math::Vec3;
use crate::physics::collision::SurfaceMaterial;

/// Nearest triangle hit by a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Distance from the ray origin
    pub distance: f32,
    /// Hit point in world space
    pub position: Vec3,
    /// Triangle normal facing against the ray
    pub normal: Vec3,
    /// Triangle index; dynamic triangles follow all static ones
    pub triangle_index: u32,
    /// Surface material of the triangle
    pub material: SurfaceMaterial,
}

/// First contact of a swept capsule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleCastHit {
    /// Distance travelled along the sweep direction before contact
    pub time_of_impact: f32,
    /// Contact point on the triangle
    pub position: Vec3,
    /// Contact normal pointing from the triangle towards the capsule
    pub normal: Vec3,
    /// Winding normal of the triangle
    pub triangle_normal: Vec3,
    /// Triangle index; dynamic triangles follow all static ones
    pub triangle_index: u32,
    /// Surface material of the triangle
    pub material: SurfaceMaterial,
}

/// Triangle penetrating a capsule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleOverlapHit {
    /// How far the triangle reaches inside the capsule radius
    pub depth: f32,
    /// Closest point on the triangle
    pub position: Vec3,
    /// Direction to push the capsule out
    pub normal: Vec3,
    /// Triangle normal oriented towards the capsule
    pub triangle_normal: Vec3,
    /// Triangle index; dynamic triangles follow all static ones
    pub triangle_index: u32,
    /// Surface material of the triangle
    pub material: SurfaceMaterial,
}

/// Contact filter for capsule sweeps
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SweepMode {
    /// First contact with anything
    #[default]
    Any,
    /// Only contacts facing against the motion, ignoring back faces and grazes
    Blocking,
    /// Only triangles whose normal y reaches `min_normal_y`
    Ground {
        /// Minimum triangle normal y
        min_normal_y: f32,
    },
}
