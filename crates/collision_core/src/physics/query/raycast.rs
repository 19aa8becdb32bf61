//! Nearest-hit raycasts against both triangle sets

use super::{CollisionQuery, RaycastHit};
use crate::foundation::math::Vec3;
use crate::physics::collision::primitives::{ray_triangle, Ray};

impl CollisionQuery {
    /// Nearest triangle along a ray within `max_distance`
    ///
    /// `direction` need not be normalized; a zero direction hits nothing.
    /// The returned normal faces against the ray.
    pub fn raycast(&self, origin: &Vec3, direction: &Vec3, max_distance: f32) -> Option<RaycastHit> {
        let ray = Ray::try_new(*origin, *direction)?;
        if !(max_distance >= 0.0) {
            return None;
        }

        let mut best: Option<RaycastHit> = None;
        for (set, offset) in self.sets() {
            let Some(bvh) = set.bvh() else {
                continue;
            };
            let limit = best.map_or(max_distance, |hit| hit.distance);

            let (hit, visited) = bvh.traverse_ray(&ray.origin, &ray.direction, limit, |tri, nearest| {
                self.counters.add_candidates(1);
                ray_triangle(&ray.origin, &ray.direction, nearest, &set.triangle(tri as usize))
            });
            self.counters.add_nodes(visited);

            let Some((tri, distance)) = hit else {
                continue;
            };
            if best.is_some_and(|b| distance >= b.distance) {
                continue;
            }

            let mut normal = set.triangle(tri as usize).normal();
            if normal.dot(&ray.direction) > 0.0 {
                normal = -normal;
            }
            best = Some(RaycastHit {
                distance,
                position: ray.point_at(distance),
                normal,
                triangle_index: tri + offset,
                material: set.material(tri as usize),
            });
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use crate::core::config::QueryConfig;
    use crate::ecs::World;
    use crate::foundation::math::Vec3;
    use crate::physics::query::CollisionQuery;
    use crate::test_scenes;
    use approx::assert_relative_eq;

    #[test]
    fn test_raycast_down_onto_floor() {
        let mut world = World::new();
        test_scenes::spawn_static(&mut world, test_scenes::floor_mesh(5.0, 0.0));
        let query = CollisionQuery::from_world(&world, QueryConfig::default());

        let hit = query
            .raycast(&Vec3::new(0.0, 5.0, 0.0), &Vec3::new(0.0, -1.0, 0.0), 100.0)
            .unwrap();
        assert_relative_eq!(hit.distance, 5.0, epsilon = 1e-4);
        assert_relative_eq!(hit.normal, Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(hit.position, Vec3::zeros(), epsilon = 1e-4);
        assert!(query.stats().nodes_visited > 0);
    }

    #[test]
    fn test_raycast_from_below_flips_normal() {
        let mut world = World::new();
        test_scenes::spawn_static(&mut world, test_scenes::floor_mesh(5.0, 0.0));
        let query = CollisionQuery::from_world(&world, QueryConfig::default());

        let hit = query
            .raycast(&Vec3::new(1.0, -2.0, 0.5), &Vec3::new(0.0, 3.0, 0.0), 100.0)
            .unwrap();
        assert_relative_eq!(hit.distance, 2.0, epsilon = 1e-4);
        assert_relative_eq!(hit.normal, Vec3::new(0.0, -1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_raycast_misses() {
        let mut world = World::new();
        test_scenes::spawn_static(&mut world, test_scenes::floor_mesh(5.0, 0.0));
        let query = CollisionQuery::from_world(&world, QueryConfig::default());
        let down = Vec3::new(0.0, -1.0, 0.0);

        assert!(query.raycast(&Vec3::new(0.0, 5.0, 0.0), &down, 4.0).is_none());
        assert!(query.raycast(&Vec3::new(8.0, 5.0, 0.0), &down, 100.0).is_none());
        assert!(query.raycast(&Vec3::new(0.0, 5.0, 0.0), &Vec3::zeros(), 100.0).is_none());
        assert!(CollisionQuery::default().raycast(&Vec3::zeros(), &down, 100.0).is_none());
    }

    #[test]
    fn test_raycast_down_onto_tile_seam() {
        let mut world = World::new();
        test_scenes::spawn_static(&mut world, test_scenes::tiled_floor_mesh(4, 2.0, 0.0));
        let query = CollisionQuery::from_world(&world, QueryConfig::default());
        let down = Vec3::new(0.0, -1.0, 0.0);

        // On the x = 0 seam between the two BVH halves, then on a tile edge
        for origin in [Vec3::new(0.0, 5.0, 1.0), Vec3::new(1.0, 5.0, 0.5), Vec3::new(0.5, 5.0, 1.0)] {
            let hit = query.raycast(&origin, &down, 100.0);
            assert!(hit.is_some(), "ray from {origin:?} missed the floor");
            assert_relative_eq!(hit.unwrap().distance, 5.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_raycast_picks_nearest_across_sets() {
        let mut world = World::new();
        test_scenes::spawn_static(&mut world, test_scenes::floor_mesh(5.0, 0.0));
        test_scenes::spawn_dynamic(&mut world, test_scenes::floor_mesh(1.0, 0.0), Vec3::new(0.0, 2.0, 0.0));
        let query = CollisionQuery::from_world(&world, QueryConfig::default());

        let hit = query
            .raycast(&Vec3::new(0.0, 5.0, 0.0), &Vec3::new(0.0, -1.0, 0.0), 100.0)
            .unwrap();
        assert_relative_eq!(hit.distance, 3.0, epsilon = 1e-4);
        assert!(hit.triangle_index >= 2);

        let below = query
            .raycast(&Vec3::new(0.0, 1.0, 0.0), &Vec3::new(0.0, -1.0, 0.0), 100.0)
            .unwrap();
        assert!(below.triangle_index < 2);
    }
}
