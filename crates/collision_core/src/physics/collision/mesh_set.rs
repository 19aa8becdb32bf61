//! World-space triangle soup built from many entity meshes
//!
//! Each entity's local vertex stream is transformed by its model matrix and
//! appended to flat arrays. Index ranges per entity are recorded as a
//! [`MeshSlice`] so an entity that only moved can be re-transformed in place
//! and its triangles refit in the BVH without a full rebuild.

use std::collections::HashMap;

use super::material::SurfaceMaterial;
use super::primitives::Triangle;
use crate::ecs::components::CollisionMeshComponent;
use crate::ecs::Entity;
use crate::foundation::math::{transform_point, Mat4, Vec3};
use crate::spatial::{Bvh, AABB};

/// One entity's mesh and placement, as read from the world
#[derive(Debug, Clone, Copy)]
pub struct MeshSource<'a> {
    /// Owning entity
    pub entity: Entity,
    /// Local-to-world matrix
    pub model: Mat4,
    /// Local-space mesh
    pub mesh: &'a CollisionMeshComponent,
}

/// Ranges an entity occupies in the flat arrays
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSlice {
    /// First world vertex
    pub vertex_start: u32,
    /// Number of vertices, equal to the local vertex count
    pub vertex_count: u32,
    /// First index
    pub index_start: u32,
    /// Number of indices after culling
    pub index_count: u32,
    /// First triangle
    pub triangle_start: u32,
    /// Number of triangles after culling
    pub triangle_count: u32,
    /// Model matrix the vertices were last transformed with
    pub model: Mat4,
}

/// Flat world-space triangle set with an optional BVH
#[derive(Debug, Clone, Default)]
pub struct TriangleMeshSet {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
    triangle_bounds: Vec<AABB>,
    materials: Vec<SurfaceMaterial>,
    slices: HashMap<Entity, MeshSlice>,
    bvh: Option<Bvh>,
}

impl TriangleMeshSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear and regenerate everything from `sources`
    pub fn rebuild(&mut self, sources: &[MeshSource<'_>]) {
        self.vertices.clear();
        self.indices.clear();
        self.triangle_bounds.clear();
        self.materials.clear();
        self.slices.clear();
        self.bvh = None;

        let mut culled = 0_usize;
        for source in sources {
            let vertex_base = self.vertices.len() as u32;
            let index_start = self.indices.len() as u32;
            let triangle_start = self.triangle_bounds.len() as u32;

            self.vertices.extend(
                source
                    .mesh
                    .vertices()
                    .iter()
                    .map(|v| transform_point(&source.model, v)),
            );

            let materials = source.mesh.materials();
            for (local_triangle, corners) in source.mesh.indices().chunks_exact(3).enumerate() {
                let remapped = [
                    corners[0] + vertex_base,
                    corners[1] + vertex_base,
                    corners[2] + vertex_base,
                ];
                let tri = self.triangle_from(remapped);
                if tri.is_degenerate() {
                    culled += 1;
                    continue;
                }
                self.indices.extend_from_slice(&remapped);
                self.triangle_bounds.push(tri.aabb());
                self.materials.push(materials.for_triangle(local_triangle));
            }

            self.slices.insert(
                source.entity,
                MeshSlice {
                    vertex_start: vertex_base,
                    vertex_count: source.mesh.vertices().len() as u32,
                    index_start,
                    index_count: self.indices.len() as u32 - index_start,
                    triangle_start,
                    triangle_count: self.triangle_bounds.len() as u32 - triangle_start,
                    model: source.model,
                },
            );
        }

        self.bvh = Bvh::build(&self.triangle_bounds);

        log::debug!(
            "Triangle set rebuilt: {} entities, {} vertices, {} triangles kept, {} culled",
            self.slices.len(),
            self.vertices.len(),
            self.triangle_bounds.len(),
            culled
        );
    }

    /// Re-transform entities that only moved. Returns the triangles whose
    /// bounds changed, ready for [`TriangleMeshSet::refit`].
    ///
    /// Entities with no slice, or whose vertex count no longer matches their
    /// slice, are skipped; they need a full rebuild.
    pub fn update_transforms(&mut self, sources: &[MeshSource<'_>]) -> Vec<u32> {
        let mut changed = Vec::new();
        let mut skipped = 0_usize;

        for source in sources {
            let Some(slice) = self.slices.get_mut(&source.entity) else {
                log::warn!("Entity {} has no mesh slice; rebuild required", source.entity.id());
                skipped += 1;
                continue;
            };
            let local = source.mesh.vertices();
            if local.len() != slice.vertex_count as usize {
                log::warn!(
                    "Entity {} vertex count changed ({} -> {}); rebuild required",
                    source.entity.id(),
                    slice.vertex_count,
                    local.len()
                );
                skipped += 1;
                continue;
            }

            let start = slice.vertex_start as usize;
            for (world, local) in self.vertices[start..start + local.len()].iter_mut().zip(local) {
                *world = transform_point(&source.model, local);
            }
            slice.model = source.model;

            let first = slice.triangle_start;
            let range = first..first + slice.triangle_count;
            changed.extend(range);
        }

        for &tri in &changed {
            let bounds = self.triangle(tri as usize).aabb();
            self.triangle_bounds[tri as usize] = bounds;
        }

        log::debug!(
            "Triangle set updated: {} entities moved, {} triangles changed, {} skipped",
            sources.len() - skipped,
            changed.len(),
            skipped
        );
        changed
    }

    /// Refit the BVH after [`TriangleMeshSet::update_transforms`]
    pub fn refit(&mut self, changed: &[u32]) -> usize {
        match self.bvh.as_mut() {
            Some(bvh) if !changed.is_empty() => bvh.refit(changed, &self.triangle_bounds),
            _ => 0,
        }
    }

    fn triangle_from(&self, corners: [u32; 3]) -> Triangle {
        Triangle::new(
            self.vertices[corners[0] as usize],
            self.vertices[corners[1] as usize],
            self.vertices[corners[2] as usize],
        )
    }

    /// World-space triangle `index`
    pub fn triangle(&self, index: usize) -> Triangle {
        let i = index * 3;
        self.triangle_from([self.indices[i], self.indices[i + 1], self.indices[i + 2]])
    }

    /// Material of triangle `index`
    pub fn material(&self, index: usize) -> SurfaceMaterial {
        self.materials[index]
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.triangle_bounds.len()
    }

    /// Has no triangles
    pub fn is_empty(&self) -> bool {
        self.triangle_bounds.is_empty()
    }

    /// World-space vertices
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Triangle indices, three per triangle
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Per-triangle bounds
    pub fn triangle_bounds(&self) -> &[AABB] {
        &self.triangle_bounds
    }

    /// Hierarchy over the triangle bounds, absent for an empty set
    pub fn bvh(&self) -> Option<&Bvh> {
        self.bvh.as_ref()
    }

    /// Slice recorded for `entity`
    pub fn slice(&self, entity: Entity) -> Option<&MeshSlice> {
        self.slices.get(&entity)
    }

    /// Number of member entities
    pub fn entity_count(&self) -> usize {
        self.slices.len()
    }

    /// Members are exactly `sources`, each with an unchanged vertex count
    pub fn same_members(&self, sources: &[MeshSource<'_>]) -> bool {
        sources.len() == self.slices.len()
            && sources.iter().all(|source| {
                self.slices
                    .get(&source.entity)
                    .is_some_and(|slice| slice.vertex_count as usize == source.mesh.vertices().len())
            })
    }

    /// Triangles whose bounds overlap `query`. Returns the BVH nodes visited.
    pub fn candidates(&self, query: &AABB, out: &mut Vec<u32>) -> usize {
        self.bvh
            .as_ref()
            .map_or(0, |bvh| bvh.query_aabb(query, &self.triangle_bounds, out))
    }
}
