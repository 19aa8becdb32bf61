//! Primitive collision shapes and distance routines
//!
//! Rays, triangles and vertical capsules, plus the closed-form closest-point
//! and intersection tests the query engine is built from.

use crate::foundation::math::{utils, Vec3};
use crate::spatial::AABB;

/// Determinant threshold below which a ray is treated as parallel
pub const PARALLEL_EPSILON: f32 = 1e-6;

/// Squared edge cross length below which a triangle is degenerate
pub const DEGENERATE_EPSILON: f32 = 1e-10;

const SEGMENT_EPSILON: f32 = 1e-12;

/// A ray for ray casting
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, or `None` for a zero direction
    pub fn try_new(origin: Vec3, direction: Vec3) -> Option<Self> {
        utils::try_normalize(&direction, 1e-12).map(|direction| Self { origin, direction })
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A triangle for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Unnormalized winding normal (right-hand rule)
    pub fn cross(&self) -> Vec3 {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Unit winding normal, zero for a degenerate triangle
    pub fn normal(&self) -> Vec3 {
        utils::try_normalize(&self.cross(), 1e-12).unwrap_or_else(Vec3::zeros)
    }

    /// Too thin to take part in queries
    pub fn is_degenerate(&self) -> bool {
        self.cross().norm_squared() < DEGENERATE_EPSILON
    }

    /// Calculates the centroid (center point) of the triangle
    pub fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Bounding box of the three vertices
    pub fn aabb(&self) -> AABB {
        AABB::new(
            self.v0.inf(&self.v1).inf(&self.v2),
            self.v0.sup(&self.v1).sup(&self.v2),
        )
    }

    /// The three edges as segment endpoint pairs
    pub fn edges(&self) -> [(Vec3, Vec3); 3] {
        [(self.v0, self.v1), (self.v1, self.v2), (self.v2, self.v0)]
    }
}

/// Vertical capsule centered on `center`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    /// Midpoint of the inner segment
    pub center: Vec3,
    /// Half length of the inner segment
    pub half_height: f32,
    /// Radius around the segment
    pub radius: f32,
}

impl Capsule {
    /// Create a capsule
    pub fn new(center: Vec3, half_height: f32, radius: f32) -> Self {
        Self {
            center,
            half_height,
            radius,
        }
    }

    /// Inner segment endpoints, bottom first
    pub fn segment(&self) -> (Vec3, Vec3) {
        segment_endpoints(&self.center, self.half_height)
    }

    /// Bounding box at the current pose
    pub fn aabb(&self) -> AABB {
        let (a, b) = self.segment();
        AABB::new(a.inf(&b), a.sup(&b)).inflate(self.radius)
    }

    /// Bounding box over the pose moved by `delta`, inflated by `margin`
    pub fn swept_aabb(&self, delta: &Vec3, margin: f32) -> AABB {
        let (a, b) = self.segment();
        AABB::from_points([a, b, a + delta, b + delta].iter()).inflate(self.radius + margin)
    }
}

/// Inner segment of a vertical capsule, bottom endpoint first
pub fn segment_endpoints(center: &Vec3, half_height: f32) -> (Vec3, Vec3) {
    let offset = Vec3::new(0.0, half_height, 0.0);
    (center - offset, center + offset)
}

/// Closest point on `tri` to `point`
///
/// Classifies the point against the three vertex regions, three edge
/// regions and the face. Returns the squared distance and the point.
pub fn closest_point_on_triangle(point: &Vec3, tri: &Triangle) -> (f32, Vec3) {
    let closest = closest_point_unchecked(point, tri);
    ((point - closest).norm_squared(), closest)
}

fn closest_point_unchecked(point: &Vec3, tri: &Triangle) -> Vec3 {
    let edge1 = tri.v1 - tri.v0;
    let edge2 = tri.v2 - tri.v0;

    // Vertex region outside v0
    let v0_to_point = point - tri.v0;
    let d1 = edge1.dot(&v0_to_point);
    let d2 = edge2.dot(&v0_to_point);
    if d1 <= 0.0 && d2 <= 0.0 {
        return tri.v0;
    }

    // Vertex region outside v1
    let v1_to_point = point - tri.v1;
    let d3 = edge1.dot(&v1_to_point);
    let d4 = edge2.dot(&v1_to_point);
    if d3 >= 0.0 && d4 <= d3 {
        return tri.v1;
    }

    // Edge v0-v1
    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return tri.v0 + edge1 * v;
    }

    // Vertex region outside v2
    let v2_to_point = point - tri.v2;
    let d5 = edge1.dot(&v2_to_point);
    let d6 = edge2.dot(&v2_to_point);
    if d6 >= 0.0 && d5 <= d6 {
        return tri.v2;
    }

    // Edge v0-v2
    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return tri.v0 + edge2 * w;
    }

    // Edge v1-v2
    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return tri.v1 + (tri.v2 - tri.v1) * w;
    }

    // Face interior
    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    tri.v0 + edge1 * v + edge2 * w
}

/// Closest points between two segments
#[derive(Debug, Clone, Copy)]
pub struct SegmentClosest {
    /// Squared distance between the two points
    pub distance_sq: f32,
    /// Parameter on the first segment, `0..=1`
    pub s: f32,
    /// Parameter on the second segment, `0..=1`
    pub t: f32,
    /// Point on the first segment
    pub on_first: Vec3,
    /// Point on the second segment
    pub on_second: Vec3,
}

/// Closest points between segments `p1..q1` and `p2..q2`
///
/// Zero-length segments and parallel segments are handled without dividing
/// by zero; for parallel segments the first parameter is pinned to 0.
pub fn closest_points_segment_segment(p1: &Vec3, q1: &Vec3, p2: &Vec3, q2: &Vec3) -> SegmentClosest {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    let (s, t) = if a <= SEGMENT_EPSILON && e <= SEGMENT_EPSILON {
        (0.0, 0.0)
    } else if a <= SEGMENT_EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e <= SEGMENT_EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let s = if denom > SEGMENT_EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let t = (b * s + f) / e;
            if t < 0.0 {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else if t > 1.0 {
                (((b - c) / a).clamp(0.0, 1.0), 1.0)
            } else {
                (s, t)
            }
        }
    };

    let on_first = p1 + d1 * s;
    let on_second = p2 + d2 * t;
    SegmentClosest {
        distance_sq: (on_first - on_second).norm_squared(),
        s,
        t,
        on_first,
        on_second,
    }
}

/// Möller–Trumbore: parameter `t` along `dir` where the line hits `tri`
fn line_triangle(origin: &Vec3, dir: &Vec3, tri: &Triangle) -> Option<f32> {
    let edge1 = tri.v1 - tri.v0;
    let edge2 = tri.v2 - tri.v0;

    let h = dir.cross(&edge2);
    let det = edge1.dot(&h);
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }

    let f = 1.0 / det;
    let s = origin - tri.v0;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * dir.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    Some(f * edge2.dot(&q))
}

/// Distance along a unit-direction ray to `tri`, within `0..=max_distance`
pub fn ray_triangle(origin: &Vec3, dir: &Vec3, max_distance: f32, tri: &Triangle) -> Option<f32> {
    line_triangle(origin, dir, tri).filter(|&t| (0.0..=max_distance).contains(&t))
}

/// Parameter in `0..=1` where segment `p..q` crosses `tri`
pub fn segment_triangle(p: &Vec3, q: &Vec3, tri: &Triangle) -> Option<f32> {
    line_triangle(p, &(q - p), tri).filter(|&t| (0.0..=1.0).contains(&t))
}

/// Distance between a vertical capsule's inner segment and a triangle
///
/// Returns `(distance, point_on_segment, point_on_triangle)`. Subtract the
/// radius for the surface gap. A segment that pierces the triangle reports
/// distance zero at the crossing point.
pub fn capsule_triangle_distance(center: &Vec3, half_height: f32, tri: &Triangle) -> (f32, Vec3, Vec3) {
    let (a, b) = segment_endpoints(center, half_height);

    if let Some(t) = segment_triangle(&a, &b, tri) {
        let crossing = a + (b - a) * t;
        return (0.0, crossing, crossing);
    }

    let (dist_a, on_tri_a) = closest_point_on_triangle(&a, tri);
    let (dist_b, on_tri_b) = closest_point_on_triangle(&b, tri);
    let (mut best_sq, mut on_segment, mut on_triangle) = if dist_a <= dist_b {
        (dist_a, a, on_tri_a)
    } else {
        (dist_b, b, on_tri_b)
    };

    for (e0, e1) in tri.edges() {
        let closest = closest_points_segment_segment(&a, &b, &e0, &e1);
        if closest.distance_sq < best_sq {
            best_sq = closest.distance_sq;
            on_segment = closest.on_first;
            on_triangle = closest.on_second;
        }
    }

    (best_sq.sqrt(), on_segment, on_triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_tri() -> Triangle {
        Triangle::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0))
    }

    #[test]
    fn test_closest_point_voronoi_regions() {
        let tri = unit_tri();
        let cases = [
            // Vertex regions
            (Vec3::new(-1.0, 1.0, -1.0), Vec3::new(0.0, 0.0, 0.0)),
            (Vec3::new(2.0, 0.5, -0.5), Vec3::new(1.0, 0.0, 0.0)),
            (Vec3::new(-0.5, -2.0, 2.0), Vec3::new(0.0, 0.0, 1.0)),
            // Edge regions
            (Vec3::new(0.5, 1.0, -1.0), Vec3::new(0.5, 0.0, 0.0)),
            (Vec3::new(-1.0, 0.0, 0.5), Vec3::new(0.0, 0.0, 0.5)),
            (Vec3::new(1.0, 3.0, 1.0), Vec3::new(0.5, 0.0, 0.5)),
            // Face
            (Vec3::new(0.25, 2.0, 0.25), Vec3::new(0.25, 0.0, 0.25)),
        ];

        for (point, expected) in cases {
            let (dist_sq, closest) = closest_point_on_triangle(&point, &tri);
            assert_relative_eq!(closest, expected, epsilon = 1e-6);
            assert_relative_eq!(dist_sq, (point - expected).norm_squared(), epsilon = 1e-5);
        }
    }

    #[test]
    fn test_segment_segment_general_and_parallel() {
        let crossing = closest_points_segment_segment(
            &Vec3::new(-1.0, 0.0, 0.0),
            &Vec3::new(1.0, 0.0, 0.0),
            &Vec3::new(0.0, 1.0, -1.0),
            &Vec3::new(0.0, 1.0, 1.0),
        );
        assert_relative_eq!(crossing.distance_sq, 1.0, epsilon = 1e-6);
        assert_relative_eq!(crossing.s, 0.5, epsilon = 1e-6);
        assert_relative_eq!(crossing.t, 0.5, epsilon = 1e-6);

        let parallel = closest_points_segment_segment(
            &Vec3::new(0.0, 0.0, 0.0),
            &Vec3::new(2.0, 0.0, 0.0),
            &Vec3::new(1.0, 2.0, 0.0),
            &Vec3::new(3.0, 2.0, 0.0),
        );
        assert_relative_eq!(parallel.distance_sq, 4.0, epsilon = 1e-5);
        assert!(parallel.distance_sq.is_finite());
    }

    #[test]
    fn test_segment_segment_degenerate_cases() {
        let p = Vec3::new(0.0, 1.0, 0.0);
        let both = closest_points_segment_segment(&p, &p, &Vec3::zeros(), &Vec3::zeros());
        assert_relative_eq!(both.distance_sq, 1.0);
        assert_eq!((both.s, both.t), (0.0, 0.0));

        let first = closest_points_segment_segment(
            &p,
            &p,
            &Vec3::new(-1.0, 0.0, 0.0),
            &Vec3::new(1.0, 0.0, 0.0),
        );
        assert_relative_eq!(first.t, 0.5, epsilon = 1e-6);
        assert_relative_eq!(first.on_second, Vec3::zeros(), epsilon = 1e-6);

        let second = closest_points_segment_segment(
            &Vec3::new(0.0, -1.0, 3.0),
            &Vec3::new(0.0, 1.0, 3.0),
            &Vec3::zeros(),
            &Vec3::zeros(),
        );
        assert_relative_eq!(second.s, 0.5, epsilon = 1e-6);
        assert_relative_eq!(second.distance_sq, 9.0, epsilon = 1e-5);
    }

    #[test]
    fn test_ray_triangle_range_and_parallel() {
        let tri = unit_tri();
        let origin = Vec3::new(0.2, 3.0, 0.2);
        let down = Vec3::new(0.0, -1.0, 0.0);

        assert_relative_eq!(ray_triangle(&origin, &down, 10.0, &tri).unwrap(), 3.0, epsilon = 1e-6);
        assert!(ray_triangle(&origin, &down, 2.0, &tri).is_none());
        assert!(ray_triangle(&origin, &-down, 10.0, &tri).is_none());
        assert!(ray_triangle(&origin, &Vec3::new(1.0, 0.0, 0.0), 10.0, &tri).is_none());
    }

    #[test]
    fn test_segment_triangle_parameter() {
        let tri = unit_tri();
        let t = segment_triangle(&Vec3::new(0.1, 1.0, 0.1), &Vec3::new(0.1, -3.0, 0.1), &tri);
        assert_relative_eq!(t.unwrap(), 0.25, epsilon = 1e-6);
        assert!(segment_triangle(&Vec3::new(0.1, 1.0, 0.1), &Vec3::new(0.1, 0.5, 0.1), &tri).is_none());
    }

    #[test]
    fn test_capsule_triangle_distance() {
        let tri = Triangle::new(
            Vec3::new(-5.0, 0.0, -5.0),
            Vec3::new(-5.0, 0.0, 5.0),
            Vec3::new(5.0, 0.0, 5.0),
        );

        // Bottom endpoint closest
        let (dist, on_seg, on_tri) = capsule_triangle_distance(&Vec3::new(0.0, 2.0, 1.0), 1.0, &tri);
        assert_relative_eq!(dist, 1.0, epsilon = 1e-6);
        assert_relative_eq!(on_seg, Vec3::new(0.0, 1.0, 1.0), epsilon = 1e-6);
        assert_relative_eq!(on_tri, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-6);

        // Piercing segment
        let (dist, on_seg, _) = capsule_triangle_distance(&Vec3::new(0.0, 0.5, 1.0), 1.0, &tri);
        assert_eq!(dist, 0.0);
        assert_relative_eq!(on_seg, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-6);

        // Segment beside the hypotenuse edge picks the edge pair
        let (dist, _, on_tri) = capsule_triangle_distance(&Vec3::new(2.0, 0.0, -2.0), 1.0, &tri);
        assert_relative_eq!(dist, 8.0_f32.sqrt(), epsilon = 1e-5);
        assert_relative_eq!(on_tri, Vec3::new(0.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_degenerate_triangle() {
        let sliver = Triangle::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        assert!(sliver.is_degenerate());
        assert_eq!(sliver.normal(), Vec3::zeros());
        assert!(!unit_tri().is_degenerate());
    }

    #[test]
    fn test_capsule_swept_bounds() {
        let capsule = Capsule::new(Vec3::new(0.0, 1.0, 0.0), 1.0, 0.5);
        let bounds = capsule.swept_aabb(&Vec3::new(10.0, 0.0, 0.0), 0.0);
        assert_relative_eq!(bounds.min, Vec3::new(-0.5, -0.5, -0.5));
        assert_relative_eq!(bounds.max, Vec3::new(10.5, 2.5, 0.5));
    }
}
