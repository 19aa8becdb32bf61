//! Capsule overlap queries

use std::cmp::Ordering;

use super::{CapsuleOverlapHit, CollisionQuery};
use crate::foundation::math::Vec3;
use crate::physics::collision::primitives::{capsule_triangle_distance, Capsule};
use crate::physics::collision::TriangleMeshSet;

/// Separation below which the triangle normal is used as push-out direction
const DEEP_CONTACT: f32 = 1e-6;

fn by_depth_descending(a: &CapsuleOverlapHit, b: &CapsuleOverlapHit) -> Ordering {
    b.depth.total_cmp(&a.depth)
}

impl CollisionQuery {
    /// Deepest triangle penetrating the capsule
    pub fn overlap_capsule(&self, center: &Vec3, radius: f32, half_height: f32) -> Option<CapsuleOverlapHit> {
        let capsule = Capsule::new(*center, half_height, radius);
        let mut hits = Vec::new();
        for (set, offset) in self.sets() {
            self.collect_overlaps(set, offset, &capsule, &mut hits);
        }
        hits.into_iter().max_by(|a, b| a.depth.total_cmp(&b.depth))
    }

    /// Up to `max_hits` penetrating triangles, deepest first
    ///
    /// Each set contributes at most `max_hits` of its deepest contacts before
    /// the combined list is sorted and truncated.
    pub fn overlap_capsule_all(
        &self,
        center: &Vec3,
        radius: f32,
        half_height: f32,
        max_hits: usize,
    ) -> Vec<CapsuleOverlapHit> {
        if max_hits == 0 {
            return Vec::new();
        }
        let capsule = Capsule::new(*center, half_height, radius);

        let mut combined = Vec::new();
        let mut per_set = Vec::new();
        for (set, offset) in self.sets() {
            per_set.clear();
            self.collect_overlaps(set, offset, &capsule, &mut per_set);
            per_set.sort_by(by_depth_descending);
            per_set.truncate(max_hits);
            combined.append(&mut per_set);
        }

        combined.sort_by(by_depth_descending);
        combined.truncate(max_hits);
        combined
    }

    fn collect_overlaps(
        &self,
        set: &TriangleMeshSet,
        offset: u32,
        capsule: &Capsule,
        out: &mut Vec<CapsuleOverlapHit>,
    ) {
        let bounds = capsule.swept_aabb(&Vec3::zeros(), self.config.contact_epsilon);
        self.counters.set_bounds(bounds);

        let mut candidates = Vec::new();
        self.counters.add_nodes(set.candidates(&bounds, &mut candidates));
        self.counters.add_candidates(candidates.len());

        for tri in candidates {
            let triangle = set.triangle(tri as usize);
            let (distance, on_segment, on_triangle) =
                capsule_triangle_distance(&capsule.center, capsule.half_height, &triangle);
            if distance >= capsule.radius {
                continue;
            }

            let mut triangle_normal = triangle.normal();
            let normal = if distance < DEEP_CONTACT {
                if triangle_normal.dot(&(capsule.center - on_triangle)) < 0.0 {
                    -triangle_normal
                } else {
                    triangle_normal
                }
            } else {
                (on_segment - on_triangle) / distance
            };
            if triangle_normal.dot(&normal) < 0.0 {
                triangle_normal = -triangle_normal;
            }

            out.push(CapsuleOverlapHit {
                depth: capsule.radius - distance,
                position: on_triangle,
                normal,
                triangle_normal,
                triangle_index: tri + offset,
                material: set.material(tri as usize),
            });
        }
    }
}
