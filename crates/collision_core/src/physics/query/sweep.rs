//! Capsule sweeps by conservative advancement
//!
//! Per candidate triangle, the capsule is marched along the sweep direction.
//! Each step advances by the current surface gap, never less than the
//! minimum step, so the capsule cannot pass through the triangle between two
//! samples. The first sample in contact is then bisected against the last
//! safe one. Time of impact is measured as distance along the normalized
//! direction, from 0 to the sweep length.

use super::{CapsuleCastHit, CollisionQuery, SweepMode};
use crate::foundation::math::{utils, Vec3};
use crate::physics::collision::primitives::{capsule_triangle_distance, Capsule, Triangle};

const MIN_SWEEP_LENGTH: f32 = 1e-6;

impl CollisionQuery {
    /// First contact of a vertical capsule moved by `delta`
    ///
    /// Returns `None` for a zero-length delta or when nothing accepted by
    /// `mode` is touched along the way.
    pub fn sweep_capsule(
        &self,
        from: &Vec3,
        delta: &Vec3,
        radius: f32,
        half_height: f32,
        mode: SweepMode,
    ) -> Option<CapsuleCastHit> {
        let length = delta.norm();
        if !(length > MIN_SWEEP_LENGTH) {
            return None;
        }
        let direction = delta / length;

        let capsule = Capsule::new(*from, half_height, radius);
        let bounds = capsule.swept_aabb(delta, self.config.contact_epsilon);
        self.counters.set_bounds(bounds);

        let mut best: Option<CapsuleCastHit> = None;
        let mut candidates = Vec::new();
        for (set, offset) in self.sets() {
            candidates.clear();
            self.counters.add_nodes(set.candidates(&bounds, &mut candidates));
            self.counters.add_candidates(candidates.len());

            for &tri in &candidates {
                let triangle = set.triangle(tri as usize);
                let triangle_normal = triangle.normal();
                match mode {
                    SweepMode::Ground { min_normal_y } if triangle_normal.y < min_normal_y => continue,
                    SweepMode::Blocking if triangle_normal.dot(&direction) >= 0.0 => continue,
                    _ => {}
                }

                let limit = best.map_or(length, |hit| hit.time_of_impact);
                let Some(toi) = self.advance(&capsule, &direction, limit, &triangle) else {
                    continue;
                };
                if best.is_some_and(|hit| toi >= hit.time_of_impact) {
                    continue;
                }

                let center = from + direction * toi;
                let (_, on_segment, on_triangle) = capsule_triangle_distance(&center, half_height, &triangle);
                let facing = if triangle_normal.dot(&direction) > 0.0 {
                    -triangle_normal
                } else {
                    triangle_normal
                };
                let normal = utils::try_normalize(&(on_segment - on_triangle), 1e-6).unwrap_or(facing);
                if mode == SweepMode::Blocking && normal.dot(&direction) >= 0.0 {
                    continue;
                }

                best = Some(CapsuleCastHit {
                    time_of_impact: toi,
                    position: on_triangle,
                    normal,
                    triangle_normal,
                    triangle_index: tri + offset,
                    material: set.material(tri as usize),
                });
            }
        }
        best
    }

    /// Sweep that only reports contacts facing against the motion
    pub fn sweep_capsule_blocking(
        &self,
        from: &Vec3,
        delta: &Vec3,
        radius: f32,
        half_height: f32,
    ) -> Option<CapsuleCastHit> {
        self.sweep_capsule(from, delta, radius, half_height, SweepMode::Blocking)
    }

    /// Sweep that only reports triangles with normal y of at least `min_normal_y`
    pub fn sweep_capsule_ground(
        &self,
        from: &Vec3,
        delta: &Vec3,
        radius: f32,
        half_height: f32,
        min_normal_y: f32,
    ) -> Option<CapsuleCastHit> {
        self.sweep_capsule(from, delta, radius, half_height, SweepMode::Ground { min_normal_y })
    }

    /// March `capsule` along `direction` up to `length` against one triangle
    fn advance(&self, capsule: &Capsule, direction: &Vec3, length: f32, triangle: &Triangle) -> Option<f32> {
        self.counters.add_sweep_test();

        let contact = capsule.radius + self.config.contact_epsilon;
        let min_step = self.config.min_step(capsule.radius);
        let max_iterations = ((length / min_step).ceil() as u32)
            .saturating_add(1)
            .min(self.config.max_sweep_iterations);
        let distance_at = |t: f32| {
            capsule_triangle_distance(&(capsule.center + direction * t), capsule.half_height, triangle).0
        };

        let mut safe = 0.0;
        let mut t = 0.0;
        let mut iterations = 0;
        let result = loop {
            if iterations >= max_iterations {
                break None;
            }
            iterations += 1;

            let distance = distance_at(t);
            if distance <= contact {
                if t <= 0.0 {
                    break Some(0.0);
                }
                let (mut lo, mut hi) = (safe, t);
                for _ in 0..self.config.bisection_iterations {
                    let mid = 0.5 * (lo + hi);
                    if distance_at(mid) <= contact {
                        hi = mid;
                    } else {
                        lo = mid;
                    }
                }
                iterations += self.config.bisection_iterations;
                break Some(hi);
            }
            if t >= length {
                break None;
            }
            safe = t;
            t = (t + (distance - capsule.radius).max(min_step)).min(length);
        };

        self.counters.add_sweep_iterations(iterations as usize);
        result
    }
}
