//! ECS World implementation

use super::storage::AnyStorage;
use super::{Component, ComponentStorage, Entity};
use std::any::TypeId;
use std::collections::HashMap;

/// ECS World containing all entities and components
#[derive(Default)]
pub struct World {
    next_entity_id: u32,
    alive: Vec<bool>,
    entity_count: usize,
    component_storages: HashMap<TypeId, Box<dyn AnyStorage>>,
}

impl World {
    /// Create a new world
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new entity
    pub fn create_entity(&mut self) -> Entity {
        let entity = Entity::new(self.next_entity_id);
        self.next_entity_id += 1;
        self.alive.push(true);
        self.entity_count += 1;
        entity
    }

    /// Remove an entity and all of its components. Ids are never reused.
    pub fn remove_entity(&mut self, entity: Entity) -> bool {
        match self.alive.get_mut(entity.index()) {
            Some(alive) if *alive => {
                *alive = false;
                self.entity_count -= 1;
                for storage in self.component_storages.values_mut() {
                    storage.remove_entity(entity);
                }
                true
            }
            _ => false,
        }
    }

    /// Is the entity alive
    pub fn contains(&self, entity: Entity) -> bool {
        self.alive.get(entity.index()).copied().unwrap_or(false)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entity_count
    }

    /// Add a component to an entity, replacing any previous one of that type
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) {
        if !self.contains(entity) {
            log::warn!("add_component on dead entity {}", entity.id());
            return;
        }
        self.storage_mut::<T>().insert(entity, component);
    }

    /// Remove a component from an entity
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.component_storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<ComponentStorage<T>>())
            .and_then(|s| s.remove(entity))
    }

    /// Get a component from an entity
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>().and_then(|s| s.get(entity))
    }

    /// Get a mutable component from an entity
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.component_storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<ComponentStorage<T>>())
            .and_then(|s| s.get_mut(entity))
    }

    /// Does the entity have a component of type `T`
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.get_component::<T>(entity).is_some()
    }

    /// Read-only table for a component type
    pub fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.component_storages
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref::<ComponentStorage<T>>())
    }

    fn storage_mut<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        let storage = self.component_storages.entry(TypeId::of::<T>()).or_insert_with(|| {
            let storage: Box<dyn AnyStorage> = Box::new(ComponentStorage::<T>::new());
            storage
        });
        match storage.as_any_mut().downcast_mut::<ComponentStorage<T>>() {
            Some(storage) => storage,
            // Keyed by TypeId::of::<T>(); the box always holds ComponentStorage<T>
            None => unreachable!("component storage type mismatch"),
        }
    }

    /// Entities carrying a component of type `T`, in ascending id order
    pub fn entities_with<T: Component>(&self) -> impl Iterator<Item = Entity> + '_ {
        self.storage::<T>()
            .into_iter()
            .flat_map(|storage| storage.iter())
            .map(|(id, _)| Entity::new(id))
    }

    /// Get an iterator over all live entities
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(index, _)| Entity::new(index as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(u32);
    impl Component for Health {}

    #[derive(Debug, PartialEq)]
    struct Tag;
    impl Component for Tag {}

    #[test]
    fn test_add_get_remove_component() {
        let mut world = World::new();
        let a = world.create_entity();
        let b = world.create_entity();

        world.add_component(a, Health(10));
        world.add_component(b, Tag);

        assert_eq!(world.get_component::<Health>(a), Some(&Health(10)));
        assert!(world.get_component::<Health>(b).is_none());
        assert!(world.has_component::<Tag>(b));

        if let Some(health) = world.get_component_mut::<Health>(a) {
            health.0 = 3;
        }
        assert_eq!(world.remove_component::<Health>(a), Some(Health(3)));
        assert!(!world.has_component::<Health>(a));
    }

    #[test]
    fn test_entities_with_ascending_order() {
        let mut world = World::new();
        let entities: Vec<_> = (0..5).map(|_| world.create_entity()).collect();
        world.add_component(entities[3], Tag);
        world.add_component(entities[0], Tag);
        world.add_component(entities[4], Tag);

        let found: Vec<_> = world.entities_with::<Tag>().collect();
        assert_eq!(found, vec![entities[0], entities[3], entities[4]]);
        assert_eq!(world.entities_with::<Health>().count(), 0);
    }

    #[test]
    fn test_remove_entity_drops_components() {
        let mut world = World::new();
        let a = world.create_entity();
        world.add_component(a, Health(1));
        world.add_component(a, Tag);

        assert!(world.remove_entity(a));
        assert!(!world.remove_entity(a));
        assert!(!world.contains(a));
        assert_eq!(world.entity_count(), 0);
        assert!(world.storage::<Health>().map_or(true, ComponentStorage::is_empty));

        // Dead entities cannot receive components
        world.add_component(a, Health(2));
        assert!(!world.has_component::<Health>(a));
    }
}
