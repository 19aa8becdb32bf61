//! Axis-aligned bounding box

use crate::foundation::math::Vec3;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Inverted box that any union or grow replaces
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::INFINITY),
            max: Vec3::repeat(f32::NEG_INFINITY),
        }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest box containing all `points`
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        points.into_iter().fold(Self::empty(), |mut bounds, p| {
            bounds.grow(p);
            bounds
        })
    }

    /// Has this box been grown to contain anything
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Index (0 = x, 1 = y, 2 = z) of the widest axis
    pub fn longest_axis(&self) -> usize {
        let size = self.max - self.min;
        if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        }
    }

    /// Expand to contain `point`
    pub fn grow(&mut self, point: &Vec3) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Union of two boxes
    pub fn union(&self, other: &AABB) -> AABB {
        AABB {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Box expanded by `amount` on every side
    pub fn inflate(&self, amount: f32) -> AABB {
        let pad = Vec3::repeat(amount);
        AABB {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    /// Check if this AABB fully contains another, with `tolerance` slack
    pub fn contains(&self, other: &AABB, tolerance: f32) -> bool {
        other.min.x >= self.min.x - tolerance && other.max.x <= self.max.x + tolerance &&
        other.min.y >= self.min.y - tolerance && other.max.y <= self.max.y + tolerance &&
        other.min.z >= self.min.z - tolerance && other.max.z <= self.max.z + tolerance
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Test ray intersection with this AABB using the slab method
    ///
    /// Returns the distance to the entry point (0 when the origin is inside)
    /// if the ray intersects, `None` otherwise.
    pub fn intersect_ray(&self, ray_origin: &Vec3, ray_dir: &Vec3) -> Option<f32> {
        self.intersect_ray_inv(ray_origin, &inverse_direction(ray_dir))
    }

    /// Slab test with a precomputed reciprocal direction
    ///
    /// Infinite components of `inv_dir` mark axes the ray runs parallel to;
    /// those only require the origin to lie within the slab.
    pub fn intersect_ray_inv(&self, ray_origin: &Vec3, inv_dir: &Vec3) -> Option<f32> {
        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;

        for axis in 0..3 {
            let (lo, hi, o) = (self.min[axis], self.max[axis], ray_origin[axis]);
            if inv_dir[axis].is_infinite() {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let t1 = (lo - o) * inv_dir[axis];
            let t2 = (hi - o) * inv_dir[axis];
            tmin = tmin.max(t1.min(t2));
            tmax = tmax.min(t1.max(t2));
        }

        if tmax >= tmin && tmax >= 0.0 {
            Some(tmin.max(0.0))
        } else {
            None
        }
    }
}

/// Component-wise reciprocal with infinities for zero components
pub fn inverse_direction(dir: &Vec3) -> Vec3 {
    dir.map(|c| if c != 0.0 { 1.0 / c } else { f32::INFINITY })
}

impl Default for AABB {
    fn default() -> Self {
        Self::empty()
    }
}
