//! Scene builders shared by unit tests

use crate::ecs::components::{
    CharacterControllerComponent, CollisionMeshComponent, MeshMaterials, PhysicsBodyComponent,
    TransformComponent,
};
use crate::ecs::{Entity, World};
use crate::foundation::math::Vec3;
use crate::physics::collision::SurfaceMaterial;

fn mesh(vertices: Vec<Vec3>, indices: Vec<u32>, material: SurfaceMaterial) -> CollisionMeshComponent {
    match CollisionMeshComponent::new(vertices, indices, MeshMaterials::Uniform(material)) {
        Ok(mesh) => mesh,
        Err(err) => panic!("invalid test mesh: {err}"),
    }
}

/// Square in the plane `y`, spanning `±half_extent` on x and z, facing +Y
pub(crate) fn floor_mesh(half_extent: f32, y: f32) -> CollisionMeshComponent {
    let e = half_extent;
    mesh(
        vec![
            Vec3::new(-e, y, -e),
            Vec3::new(-e, y, e),
            Vec3::new(e, y, e),
            Vec3::new(e, y, -e),
        ],
        vec![0, 1, 2, 0, 2, 3],
        SurfaceMaterial::default(),
    )
}

/// 10x10 wall in the plane `x`, facing -X
pub(crate) fn wall_mesh(x: f32) -> CollisionMeshComponent {
    mesh(
        vec![
            Vec3::new(x, -5.0, -5.0),
            Vec3::new(x, 5.0, 5.0),
            Vec3::new(x, 5.0, -5.0),
            Vec3::new(x, -5.0, 5.0),
        ],
        vec![0, 1, 2, 0, 3, 1],
        SurfaceMaterial::default(),
    )
}

/// 10x10 wall in the plane `z`, facing -Z
pub(crate) fn wall_mesh_z(z: f32) -> CollisionMeshComponent {
    mesh(
        vec![
            Vec3::new(-5.0, -5.0, z),
            Vec3::new(5.0, 5.0, z),
            Vec3::new(-5.0, 5.0, z),
            Vec3::new(5.0, -5.0, z),
        ],
        vec![0, 2, 1, 0, 1, 3],
        SurfaceMaterial::default(),
    )
}

/// Row of `tiles` unit-wide floor strips at height `y`, centered on x = 0,
/// spanning `±half_depth` on z and facing +Y
pub(crate) fn tiled_floor_mesh(tiles: u32, half_depth: f32, y: f32) -> CollisionMeshComponent {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let start = -(tiles as f32) * 0.5;
    for tile in 0..tiles {
        let (x0, x1) = (start + tile as f32, start + tile as f32 + 1.0);
        let base = vertices.len() as u32;
        vertices.extend([
            Vec3::new(x0, y, -half_depth),
            Vec3::new(x0, y, half_depth),
            Vec3::new(x1, y, half_depth),
            Vec3::new(x1, y, -half_depth),
        ]);
        indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh(vertices, indices, SurfaceMaterial::default())
}

/// Steep slope crossing y = 0 at `x`, normal (-0.8, 0.6, 0)
pub(crate) fn ramp_mesh(x: f32, material: SurfaceMaterial) -> CollisionMeshComponent {
    mesh(
        vec![
            Vec3::new(x - 3.0, -4.0, -5.0),
            Vec3::new(x + 3.0, 4.0, -5.0),
            Vec3::new(x + 3.0, 4.0, 5.0),
            Vec3::new(x - 3.0, -4.0, 5.0),
        ],
        vec![0, 3, 2, 0, 2, 1],
        material,
    )
}

/// `count` horizontal triangles around the origin, `spacing` apart upwards
pub(crate) fn stacked_triangles(count: u32, spacing: f32) -> CollisionMeshComponent {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for layer in 0..count {
        let y = layer as f32 * spacing;
        let base = vertices.len() as u32;
        vertices.extend([
            Vec3::new(-1.0, y, -1.0),
            Vec3::new(0.0, y, 2.0),
            Vec3::new(1.0, y, -1.0),
        ]);
        indices.extend([base, base + 1, base + 2]);
    }
    mesh(vertices, indices, SurfaceMaterial::default())
}

/// Mesh entity with no physics body
pub(crate) fn spawn_static(world: &mut World, mesh: CollisionMeshComponent) -> Entity {
    let entity = world.create_entity();
    world.add_component(entity, TransformComponent::identity());
    world.add_component(entity, mesh);
    entity
}

/// Mesh entity with a moving body placed at `position`
pub(crate) fn spawn_dynamic(world: &mut World, mesh: CollisionMeshComponent, position: Vec3) -> Entity {
    let entity = world.create_entity();
    world.add_component(entity, TransformComponent::from_position(position));
    world.add_component(entity, PhysicsBodyComponent::dynamic(position));
    world.add_component(entity, mesh);
    entity
}

/// Character capsule centered at `position`
pub(crate) fn spawn_character(world: &mut World, position: Vec3, radius: f32, half_height: f32) -> Entity {
    let entity = world.create_entity();
    world.add_component(entity, TransformComponent::from_position(position));
    world.add_component(entity, PhysicsBodyComponent::dynamic(position));
    world.add_component(entity, CharacterControllerComponent::new(radius, half_height));
    entity
}
