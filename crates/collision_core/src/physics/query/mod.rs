//! Collision query engine
//!
//! [`CollisionQuery`] owns a static and a dynamic [`TriangleMeshSet`] built
//! from the world and answers ray, capsule sweep and capsule overlap queries
//! against both. Triangle indices in results count static triangles first,
//! so a dynamic triangle's index is offset by the static triangle count.
//!
//! Mutation happens once per fixed step, before any queries for that step.
//! Queries take `&self`; diagnostics counters use interior mutability.

pub mod hits;
pub mod stats;
mod raycast;
mod sweep;
mod overlap;

pub use hits::{CapsuleCastHit, CapsuleOverlapHit, RaycastHit, SweepMode};
pub use stats::QueryStats;

use stats::StatsCounters;

use crate::core::config::QueryConfig;
use crate::ecs::components::{
    CharacterControllerComponent, CollisionMeshComponent, PhysicsBodyComponent, TransformComponent,
};
use crate::ecs::{Entity, World};
use crate::foundation::math::Mat4;
use crate::physics::collision::{MeshSource, TriangleMeshSet};

/// Which triangle set an entity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetKind {
    /// No physics body, or a body flagged static
    Static,
    /// Any other physics body
    Dynamic,
}

impl SetKind {
    /// Classify a mesh entity, `None` for entities that never contribute
    /// triangles (characters)
    pub fn of(world: &World, entity: Entity) -> Option<Self> {
        if world.has_component::<CharacterControllerComponent>(entity) {
            return None;
        }
        match world.get_component::<PhysicsBodyComponent>(entity) {
            Some(body) if !body.is_static => Some(Self::Dynamic),
            _ => Some(Self::Static),
        }
    }
}

/// What [`CollisionQuery::sync`] did for each set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    /// Static set was rebuilt from scratch
    pub static_rebuilt: bool,
    /// Dynamic set was rebuilt from scratch
    pub dynamic_rebuilt: bool,
    /// Static entities re-transformed in place
    pub static_moved: usize,
    /// Dynamic entities re-transformed in place
    pub dynamic_moved: usize,
}

/// Snapshot of the world's collision geometry plus query entry points
#[derive(Debug, Default)]
pub struct CollisionQuery {
    static_set: TriangleMeshSet,
    dynamic_set: TriangleMeshSet,
    config: QueryConfig,
    counters: StatsCounters,
}

fn model_of(world: &World, entity: Entity) -> Mat4 {
    world
        .get_component::<TransformComponent>(entity)
        .map_or_else(Mat4::identity, TransformComponent::to_matrix)
}

fn source_of(world: &World, entity: Entity) -> Option<MeshSource<'_>> {
    world
        .get_component::<CollisionMeshComponent>(entity)
        .map(|mesh| MeshSource {
            entity,
            model: model_of(world, entity),
            mesh,
        })
}

/// Mesh sources for every member of `kind`, in ascending entity order
fn gather_sources(world: &World, kind: SetKind) -> Vec<MeshSource<'_>> {
    world
        .entities_with::<CollisionMeshComponent>()
        .filter(|&entity| SetKind::of(world, entity) == Some(kind))
        .filter_map(|entity| source_of(world, entity))
        .collect()
}

impl CollisionQuery {
    /// Create an empty query engine
    pub fn new(config: QueryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Create and fully build from `world`
    pub fn from_world(world: &World, config: QueryConfig) -> Self {
        let mut query = Self::new(config);
        query.rebuild_static(world);
        query.rebuild_dynamic(world);
        query
    }

    /// Sweep solver tuning
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Static triangle set
    pub fn static_set(&self) -> &TriangleMeshSet {
        &self.static_set
    }

    /// Dynamic triangle set
    pub fn dynamic_set(&self) -> &TriangleMeshSet {
        &self.dynamic_set
    }

    fn set_mut(&mut self, kind: SetKind) -> &mut TriangleMeshSet {
        match kind {
            SetKind::Static => &mut self.static_set,
            SetKind::Dynamic => &mut self.dynamic_set,
        }
    }

    /// Both sets with the index offset applied to their triangles
    pub(crate) fn sets(&self) -> [(&TriangleMeshSet, u32); 2] {
        [
            (&self.static_set, 0),
            (&self.dynamic_set, self.static_set.triangle_count() as u32),
        ]
    }

    /// Rebuild the static set from every static mesh entity
    pub fn rebuild_static(&mut self, world: &World) {
        self.rebuild(world, SetKind::Static);
    }

    /// Rebuild the dynamic set from every dynamic mesh entity
    pub fn rebuild_dynamic(&mut self, world: &World) {
        self.rebuild(world, SetKind::Dynamic);
    }

    fn rebuild(&mut self, world: &World, kind: SetKind) {
        let sources = gather_sources(world, kind);
        self.set_mut(kind).rebuild(&sources);
    }

    /// Re-transform static entities that only moved and refit the BVH.
    /// Returns the number of BVH nodes refit.
    pub fn update_static_transforms(&mut self, world: &World, entities: &[Entity]) -> usize {
        self.update_transforms(world, SetKind::Static, entities)
    }

    /// Re-transform dynamic entities that only moved and refit the BVH.
    /// Returns the number of BVH nodes refit.
    pub fn update_dynamic_transforms(&mut self, world: &World, entities: &[Entity]) -> usize {
        self.update_transforms(world, SetKind::Dynamic, entities)
    }

    fn update_transforms(&mut self, world: &World, kind: SetKind, entities: &[Entity]) -> usize {
        let sources: Vec<MeshSource<'_>> = entities
            .iter()
            .filter_map(|&entity| {
                let source = source_of(world, entity);
                if source.is_none() {
                    log::warn!("Entity {} has no collision mesh; skipped", entity.id());
                }
                source
            })
            .collect();

        let set = self.set_mut(kind);
        let changed = set.update_transforms(&sources);
        set.refit(&changed)
    }

    /// Bring both sets up to date with `world`
    ///
    /// A set is rebuilt when its membership or any member's vertex count
    /// changed; otherwise members whose model matrix differs from the one
    /// they were last built with are updated in place.
    pub fn sync(&mut self, world: &World) -> SyncReport {
        let (static_rebuilt, static_moved) = self.sync_set(world, SetKind::Static);
        let (dynamic_rebuilt, dynamic_moved) = self.sync_set(world, SetKind::Dynamic);
        SyncReport {
            static_rebuilt,
            dynamic_rebuilt,
            static_moved,
            dynamic_moved,
        }
    }

    fn sync_set(&mut self, world: &World, kind: SetKind) -> (bool, usize) {
        let sources = gather_sources(world, kind);
        let set = self.set_mut(kind);

        if !set.same_members(&sources) {
            set.rebuild(&sources);
            return (true, 0);
        }

        let moved: Vec<MeshSource<'_>> = sources
            .into_iter()
            .filter(|source| set.slice(source.entity).is_some_and(|slice| slice.model != source.model))
            .collect();
        if !moved.is_empty() {
            let changed = set.update_transforms(&moved);
            set.refit(&changed);
        }
        (false, moved.len())
    }

    /// Counters accumulated since the last reset
    pub fn stats(&self) -> QueryStats {
        self.counters.snapshot()
    }

    /// Clear the counters
    pub fn reset_stats(&self) {
        self.counters.reset();
    }
}
