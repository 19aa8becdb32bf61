//! Kinematic move-and-slide character controller
//!
//! Each fixed step a character's capsule is swept along its velocity. On a
//! blocking contact it stops `skin_width` short, the rest of the motion is
//! projected onto the contact plane and the into-surface velocity removed.
//! After sliding, a short downward probe snaps the capsule onto walkable
//! ground. Motion left over when the slide budget runs out is dropped.

use crate::core::config::{ConfigError, PhysicsConfig};
use crate::ecs::components::{
    CharacterControllerComponent, ControllerState, MovementIntentComponent, PhysicsBodyComponent,
    TransformComponent,
};
use crate::ecs::{Entity, System, World};
use crate::foundation::math::{utils, Vec3};
use crate::foundation::time::FixedTimestep;
use crate::physics::query::CollisionQuery;

/// Squared displacement below which motion is ignored
const MIN_MOVE_SQ: f32 = 1e-8;

/// Outcome of one [`move_and_slide`] call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveReport {
    /// `Free` when nothing was touched while sliding, else `Sliding`
    pub slide: ControllerState,
    /// `Grounded` or `Airborne` after the ground probe
    pub state: ControllerState,
    /// Blocking contacts resolved
    pub contacts: u32,
    /// Slide passes used
    pub iterations: u32,
    /// Total position change, including snapping
    pub displacement: Vec3,
}

/// Move a character through `query` for one fixed step of `dt` seconds
///
/// Reads and writes `body` position and velocity, and updates the ground
/// state stored in `controller`.
pub fn move_and_slide(
    query: &CollisionQuery,
    controller: &mut CharacterControllerComponent,
    body: &mut PhysicsBodyComponent,
    dt: f32,
) -> MoveReport {
    let start = body.position;
    let mut remaining = body.velocity * dt;

    if remaining.norm_squared() <= MIN_MOVE_SQ {
        let grounded = controller.ground.grounded;
        let normal = controller.ground.normal;
        controller.ground.advance(grounded);
        if grounded {
            controller.ground.normal = normal;
        }
        controller.ground.contacts = 0;
        return MoveReport {
            slide: ControllerState::Free,
            state: controller.ground.state,
            contacts: 0,
            iterations: 0,
            displacement: Vec3::zeros(),
        };
    }

    let (radius, half_height, skin) = (controller.radius, controller.half_height, controller.skin_width);
    let mut contacts = 0;
    let mut iterations = 0;

    while iterations < controller.max_slide_iterations {
        if remaining.norm_squared() <= MIN_MOVE_SQ {
            break;
        }
        iterations += 1;

        let Some(hit) = query.sweep_capsule_blocking(&body.position, &remaining, radius, half_height) else {
            body.position += remaining;
            remaining = Vec3::zeros();
            break;
        };

        let length = remaining.norm();
        let direction = remaining / length;
        let advance = (hit.time_of_impact - skin).max(0.0);
        body.position += direction * advance;
        contacts += 1;

        let mut normal = hit.normal;
        if hit.material.flattens() && !controller.is_walkable(&normal) {
            if let Some(flat) = utils::try_normalize(&Vec3::new(normal.x, 0.0, normal.z), 1e-6) {
                normal = flat;
            }
        }

        let leftover = direction * (length - advance);
        remaining = leftover - normal * leftover.dot(&normal);

        let into_surface = body.velocity.dot(&normal);
        if into_surface < 0.0 {
            body.velocity -= normal * into_surface;
        }
    }

    let slide = if contacts > 0 {
        ControllerState::Sliding
    } else {
        ControllerState::Free
    };

    let ground_hit = if body.velocity.y > controller.max_snap_rise_speed {
        None
    } else {
        query
            .sweep_capsule_ground(
                &body.position,
                &Vec3::new(0.0, -controller.snap_distance, 0.0),
                radius,
                half_height,
                controller.min_ground_dot,
            )
            .filter(|hit| controller.is_walkable(&hit.normal))
    };

    let state = if let Some(hit) = ground_hit {
        body.position.y -= (hit.time_of_impact - skin).max(0.0);
        if body.velocity.y < 0.0 {
            body.velocity.y = 0.0;
        }
        controller.ground.advance(true);
        controller.ground.normal = hit.normal;
        ControllerState::Grounded
    } else {
        controller.ground.advance(false);
        ControllerState::Airborne
    };
    controller.ground.state = state;
    controller.ground.contacts = contacts;

    MoveReport {
        slide,
        state,
        contacts,
        iterations,
        displacement: body.position - start,
    }
}

/// Runs [`move_and_slide`] for every character in the world
///
/// Owns the collision snapshot and keeps it in sync with the world at the
/// start of every fixed step.
#[derive(Debug)]
pub struct MoveAndSlideSystem {
    query: CollisionQuery,
    timestep: FixedTimestep,
}

impl MoveAndSlideSystem {
    /// Create a system from physics configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `config` fails validation.
    pub fn new(config: &PhysicsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    fn from_validated(config: &PhysicsConfig) -> Self {
        Self {
            query: CollisionQuery::new(config.query.clone()),
            timestep: FixedTimestep::new(config.fixed_timestep, config.max_substeps),
        }
    }

    /// Collision snapshot as of the last fixed step
    pub fn query(&self) -> &CollisionQuery {
        &self.query
    }

    /// Accumulate frame time and run the fixed steps it covers.
    /// Returns the number of steps run.
    pub fn update(&mut self, world: &mut World, frame_dt: f32) -> u32 {
        let steps = self.timestep.accumulate(frame_dt);
        let dt = self.timestep.step();
        for _ in 0..steps {
            self.fixed_update(world, dt);
        }
        steps
    }

    fn step_character(&self, world: &mut World, entity: Entity, dt: f32) -> Option<MoveReport> {
        let mut controller = world.get_component::<CharacterControllerComponent>(entity)?.clone();
        let mut body = world.get_component::<PhysicsBodyComponent>(entity)?.clone();
        if let Some(intent) = world.get_component::<MovementIntentComponent>(entity) {
            body.velocity = intent.apply(&body.velocity);
        }

        let report = move_and_slide(&self.query, &mut controller, &mut body, dt);

        if let Some(transform) = world.get_component_mut::<TransformComponent>(entity) {
            transform.position = body.position;
        }
        if let Some(stored) = world.get_component_mut::<PhysicsBodyComponent>(entity) {
            *stored = body;
        }
        if let Some(stored) = world.get_component_mut::<CharacterControllerComponent>(entity) {
            *stored = controller;
        }
        Some(report)
    }
}

impl Default for MoveAndSlideSystem {
    fn default() -> Self {
        Self::from_validated(&PhysicsConfig::default())
    }
}

impl System for MoveAndSlideSystem {
    fn fixed_update(&mut self, world: &mut World, dt: f32) {
        let sync = self.query.sync(world);
        if sync.static_rebuilt || sync.dynamic_rebuilt {
            log::debug!("Collision snapshot rebuilt: {sync:?}");
        }

        let characters: Vec<Entity> = world.entities_with::<CharacterControllerComponent>().collect();
        for entity in characters {
            if let Some(report) = self.step_character(world, entity, dt) {
                log::trace!(
                    "Character {}: {:?}/{:?}, {} contacts in {} passes, moved {:?}",
                    entity.id(),
                    report.slide,
                    report.state,
                    report.contacts,
                    report.iterations,
                    report.displacement
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::QueryConfig;
    use crate::physics::collision::{MaterialFlags, SurfaceMaterial};
    use crate::test_scenes;
    use approx::assert_relative_eq;

    fn query_for(world: &World) -> CollisionQuery {
        CollisionQuery::from_world(world, QueryConfig::default())
    }

    #[test]
    fn test_slide_stops_at_wall() {
        let mut world = World::new();
        test_scenes::spawn_static(&mut world, test_scenes::wall_mesh(3.0));
        let query = query_for(&world);

        let mut controller = CharacterControllerComponent::new(0.5, 1.0);
        let mut body = PhysicsBodyComponent::dynamic(Vec3::new(2.45, 0.0, 0.0))
            .with_velocity(Vec3::new(5.0, 0.0, 1.5));

        let report = move_and_slide(&query, &mut controller, &mut body, 1.0 / 60.0);

        let gap = 3.0 - (body.position.x + controller.radius);
        assert!(gap >= 0.0 && gap <= controller.skin_width + 1e-3, "gap {gap}");
        assert_relative_eq!(body.velocity.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(body.velocity.y, 0.0);
        assert_relative_eq!(body.velocity.z, 1.5, epsilon = 1e-5);
        assert_eq!(report.slide, ControllerState::Sliding);
        assert!(report.contacts >= 1);
        // No floor in this scene
        assert_eq!(report.state, ControllerState::Airborne);
        // Sliding carried the z motion along the wall
        assert!(body.position.z > 0.0);
    }

    #[test]
    fn test_slide_budget_drops_residual_motion() {
        let mut world = World::new();
        test_scenes::spawn_static(&mut world, test_scenes::wall_mesh(3.0));
        test_scenes::spawn_static(&mut world, test_scenes::wall_mesh_z(3.0));
        let query = query_for(&world);

        let start = Vec3::new(2.0, 0.0, 2.0);
        let velocity = Vec3::new(60.0, 0.0, 30.0);
        let run = |max_slide_iterations| {
            let mut controller = CharacterControllerComponent::new(0.5, 0.0).with_snap_distance(0.0);
            controller.max_slide_iterations = max_slide_iterations;
            let mut body = PhysicsBodyComponent::dynamic(start).with_velocity(velocity);
            let report = move_and_slide(&query, &mut controller, &mut body, 1.0 / 60.0);
            (report, body)
        };

        let (report, body) = run(1);
        assert_eq!(report.iterations, 1);
        assert_eq!(report.contacts, 1);
        // Stopped short of the x wall along the original motion, nothing slid
        let gap = 3.0 - (body.position.x + 0.5);
        assert!(gap >= 0.0 && gap <= 0.02 + 1e-3, "gap {gap}");
        assert_relative_eq!(
            report.displacement.normalize(),
            velocity.normalize(),
            epsilon = 1e-4
        );
        assert!(body.position.z + 0.5 < 3.0 - 0.1);

        // With a larger budget the leftover slides on into the corner
        let (full, full_body) = run(4);
        assert!(full.iterations > 1);
        assert!(full_body.position.z > body.position.z + 0.1);
        assert!(full_body.position.z + 0.5 <= 3.0);
    }

    #[test]
    fn test_free_motion_and_ground_snap() {
        let mut world = World::new();
        test_scenes::spawn_static(&mut world, test_scenes::floor_mesh(5.0, 0.0));
        let query = query_for(&world);

        let mut controller = CharacterControllerComponent::new(0.5, 0.5);
        // Bottom of the capsule 0.1 above the floor
        let mut body = PhysicsBodyComponent::dynamic(Vec3::new(0.0, 1.1, 0.0))
            .with_velocity(Vec3::new(1.0, -0.5, 0.0));

        let report = move_and_slide(&query, &mut controller, &mut body, 1.0 / 60.0);
        assert_eq!(report.slide, ControllerState::Free);
        assert_eq!(report.state, ControllerState::Grounded);
        assert!(controller.ground.grounded && controller.ground.landed());
        assert_relative_eq!(body.position.y, 1.0 + controller.skin_width, epsilon = 1e-3);
        assert_eq!(body.velocity.y, 0.0);
        assert_relative_eq!(controller.ground.normal, Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-4);
    }

    #[test]
    fn test_rising_character_skips_snap() {
        let mut world = World::new();
        test_scenes::spawn_static(&mut world, test_scenes::floor_mesh(5.0, 0.0));
        let query = query_for(&world);

        let mut controller = CharacterControllerComponent::new(0.5, 0.5);
        let mut body = PhysicsBodyComponent::dynamic(Vec3::new(0.0, 1.05, 0.0))
            .with_velocity(Vec3::new(0.0, 6.0, 0.0));

        let report = move_and_slide(&query, &mut controller, &mut body, 1.0 / 60.0);
        assert_eq!(report.state, ControllerState::Airborne);
        assert_relative_eq!(body.position.y, 1.15, epsilon = 1e-4);
    }

    #[test]
    fn test_zero_motion_keeps_ground_state() {
        let query = CollisionQuery::default();
        let mut controller = CharacterControllerComponent::new(0.5, 0.5);
        controller.ground.advance(true);
        controller.ground.state = ControllerState::Grounded;
        let mut body = PhysicsBodyComponent::dynamic(Vec3::new(0.0, 1.0, 0.0));

        let report = move_and_slide(&query, &mut controller, &mut body, 1.0 / 60.0);
        assert_eq!(report.contacts, 0);
        assert_eq!(report.state, ControllerState::Grounded);
        assert!(controller.ground.grounded);
        assert_eq!(controller.ground.frames_grounded, 2);
        assert_eq!(body.position, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_flatten_material_keeps_slide_horizontal() {
        let mut world = World::new();
        let slippery = SurfaceMaterial::new(0.1, 0.05).with_flags(MaterialFlags::FLATTEN);
        test_scenes::spawn_static(&mut world, test_scenes::ramp_mesh(3.0, slippery));
        let query = query_for(&world);

        let mut controller = CharacterControllerComponent::new(0.5, 0.0).with_snap_distance(0.0);
        let mut body = PhysicsBodyComponent::dynamic(Vec3::new(2.2, 0.0, 0.0))
            .with_velocity(Vec3::new(12.0, 0.0, 0.0));

        move_and_slide(&query, &mut controller, &mut body, 1.0 / 60.0);
        // A steep ramp would normally push the sphere upward along its face
        assert_relative_eq!(body.position.y, 0.0, epsilon = 1e-5);
        assert!(body.position.x < 3.0);
    }

    #[test]
    fn test_system_moves_characters_with_intent() {
        crate::foundation::logging::init_for_tests();
        let mut world = World::new();
        test_scenes::spawn_static(&mut world, test_scenes::floor_mesh(10.0, 0.0));
        test_scenes::spawn_static(&mut world, test_scenes::wall_mesh(3.0));
        let character = test_scenes::spawn_character(&mut world, Vec3::new(0.0, 1.02, 0.0), 0.5, 0.5);
        world.add_component(character, MovementIntentComponent::walk(Vec3::new(4.0, 0.0, 0.0)));

        let mut system = MoveAndSlideSystem::new(&PhysicsConfig::default()).unwrap();
        let mut steps = 0;
        for _ in 0..120 {
            steps += system.update(&mut world, 1.0 / 60.0);
        }
        assert!(steps >= 119);

        let body = world.get_component::<PhysicsBodyComponent>(character).unwrap();
        let controller = world.get_component::<CharacterControllerComponent>(character).unwrap();
        let transform = world.get_component::<TransformComponent>(character).unwrap();

        assert!(body.position.x + controller.radius <= 3.0);
        assert!(body.position.x + controller.radius >= 3.0 - controller.skin_width - 1e-3);
        assert!(controller.ground.grounded);
        assert_eq!(transform.position, body.position);
        assert!(system.query().static_set().triangle_count() == 4);
    }

    #[test]
    fn test_system_rejects_invalid_config() {
        let config = PhysicsConfig::new().with_fixed_timestep(0.0);
        assert!(matches!(MoveAndSlideSystem::new(&config), Err(ConfigError::Invalid(_))));
    }
}
