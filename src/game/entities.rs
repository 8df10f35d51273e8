//! # Entity Registry
//!
//! Every creature, bustable, door and pickup in the world lives here.
//!
//! Entities are stored by id with an insertion-order list for deterministic
//! iteration and a position index that is updated on every spawn, move and
//! removal, so "what occupies this tile" never needs a scan.

use crate::{
    new_entity_id, BustableTemplate, CreatureTemplate, DelveError, DelveResult, EntityId,
    ItemStack, LootBook, MovementPattern, Position, TemplateBook, VisualState, COST_BUSTABLE,
    COST_CLOSED_DOOR, COST_CREATURE, COST_OPEN,
};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-creature state copied from a [`CreatureTemplate`] at spawn time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureState {
    pub subtype: String,
    pub attack: i32,
    pub movement: MovementPattern,
    pub diagonal: bool,
    /// Value the wait counter is reset to after each move
    pub cooldown: u32,
    /// Time advances left to skip before the next move
    pub wait: u32,
    pub friendly_fire: bool,
    pub path_strength: u8,
    pub asleep: bool,
    pub loot: Option<String>,
    /// Axis preference for greedy steps, flipped after each use
    pub naive_prefers_horizontal: bool,
    /// Axis preference when flattening diagonal path steps, flipped after each use
    pub chase_prefers_horizontal: bool,
}

impl CreatureState {
    /// Builds creature state from a resolved template.
    pub fn from_template(subtype: &str, template: &CreatureTemplate) -> Self {
        Self {
            subtype: subtype.to_string(),
            attack: template.attack,
            movement: template.movement,
            diagonal: template.diagonal,
            cooldown: template.cooldown,
            wait: 0,
            friendly_fire: template.friendly_fire,
            path_strength: template.path_strength,
            asleep: false,
            loot: template.loot.clone(),
            naive_prefers_horizontal: true,
            chase_prefers_horizontal: true,
        }
    }
}

/// A breakable object such as a pot or chest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BustableState {
    pub subtype: String,
    pub loot: Option<String>,
}

impl BustableState {
    /// Builds bustable state from a resolved template.
    pub fn from_template(subtype: &str, template: &BustableTemplate) -> Self {
        Self {
            subtype: subtype.to_string(),
            loot: template.loot.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorState {
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupState {
    pub stack: ItemStack,
}

/// Closed set of entity kinds, each carrying only its own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Creature(CreatureState),
    Bustable(BustableState),
    Door(DoorState),
    Pickup(PickupState),
}

/// Outcome of applying damage to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageResult {
    /// The entity cannot be damaged (doors, pickups, corpses)
    Immune,
    /// Still standing with the given hit points
    Survived(i32),
    /// Hit points reached zero on this hit
    Killed,
}

/// A single object in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub position: Position,
    pub hp: i32,
    pub living: bool,
    pub visible: bool,
    pub kind: EntityKind,
    pub visual: VisualState,
}

impl Entity {
    /// Creates an entity resting at `position`.
    pub fn new(position: Position, hp: i32, visible: bool, kind: EntityKind) -> Self {
        Self {
            id: new_entity_id(),
            position,
            hp,
            living: true,
            visible,
            kind,
            visual: VisualState::at_grid(position),
        }
    }

    pub fn creature(&self) -> Option<&CreatureState> {
        match &self.kind {
            EntityKind::Creature(state) => Some(state),
            _ => None,
        }
    }

    pub fn creature_mut(&mut self) -> Option<&mut CreatureState> {
        match &mut self.kind {
            EntityKind::Creature(state) => Some(state),
            _ => None,
        }
    }

    /// Whether attacks against this entity resolve.
    pub fn is_damageable(&self) -> bool {
        self.living
            && matches!(
                self.kind,
                EntityKind::Creature(_) | EntityKind::Bustable(_)
            )
    }

    /// Whether this entity is a closed door.
    pub fn is_closed_door(&self) -> bool {
        matches!(self.kind, EntityKind::Door(DoorState { closed: true }))
    }

    /// Whether this creature takes part in time advances and animation.
    ///
    /// Only visible, awake, living creatures are active.
    pub fn is_active(&self) -> bool {
        match &self.kind {
            EntityKind::Creature(state) => self.visible && self.living && !state.asleep,
            _ => false,
        }
    }

    /// Damage dealt by this entity's attacks.
    pub fn attack(&self) -> i32 {
        match &self.kind {
            EntityKind::Creature(state) => state.attack,
            _ => 0,
        }
    }

    /// Loot table rolled when this entity dies.
    pub fn loot_table(&self) -> Option<&str> {
        match &self.kind {
            EntityKind::Creature(state) => state.loot.as_deref(),
            EntityKind::Bustable(state) => state.loot.as_deref(),
            EntityKind::Door(_) | EntityKind::Pickup(_) => None,
        }
    }

    /// Pathfinding cost class contributed by this entity.
    pub fn cost_class(&self) -> u8 {
        if !self.living {
            return COST_OPEN;
        }
        match &self.kind {
            EntityKind::Creature(_) => COST_CREATURE,
            EntityKind::Bustable(_) => COST_BUSTABLE,
            EntityKind::Door(DoorState { closed: true }) => COST_CLOSED_DOOR,
            EntityKind::Door(_) | EntityKind::Pickup(_) => COST_OPEN,
        }
    }

    /// Subtracts hit points, marking the entity dead at zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{BustableState, DamageResult, Entity, EntityKind, Position};
    ///
    /// let kind = EntityKind::Bustable(BustableState { subtype: "chest".into(), loot: None });
    /// let mut chest = Entity::new(Position::new(1, 1), 3, true, kind);
    /// assert_eq!(chest.take_damage(2), DamageResult::Survived(1));
    /// assert_eq!(chest.take_damage(2), DamageResult::Killed);
    /// assert!(!chest.living);
    /// ```
    pub fn take_damage(&mut self, amount: i32) -> DamageResult {
        if !self.is_damageable() {
            return DamageResult::Immune;
        }
        self.hp -= amount;
        if self.hp <= 0 {
            self.living = false;
            DamageResult::Killed
        } else {
            DamageResult::Survived(self.hp)
        }
    }

    /// Marks the entity dead and rolls its loot table.
    ///
    /// The returned stacks are spawned as pickups by the caller.
    pub fn die(&mut self, loot: &LootBook, rng: &mut StdRng) -> Vec<ItemStack> {
        self.living = false;
        match self.loot_table() {
            Some(table) => loot.roll(table, rng),
            None => Vec::new(),
        }
    }
}

/// Owner of every live entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityRegistry {
    entities: HashMap<EntityId, Entity>,
    order: Vec<EntityId>,
    position_index: HashMap<Position, Vec<EntityId>>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Registers an entity and indexes its position.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        let position = entity.position;
        self.entities.insert(id, entity);
        self.order.push(id);
        self.position_index.entry(position).or_default().push(id);
        id
    }

    /// Spawns a creature, copying its stats out of the template book.
    pub fn spawn_creature(
        &mut self,
        templates: &TemplateBook,
        subtype: &str,
        position: Position,
        visible: bool,
    ) -> EntityId {
        let (subtype, template) = templates.creature(subtype);
        let kind = EntityKind::Creature(CreatureState::from_template(subtype, template));
        self.spawn(Entity::new(position, template.hp, visible, kind))
    }

    /// Spawns a pot, chest or other breakable.
    pub fn spawn_bustable(
        &mut self,
        templates: &TemplateBook,
        subtype: &str,
        position: Position,
        visible: bool,
    ) -> EntityId {
        let (subtype, template) = templates.bustable(subtype);
        let kind = EntityKind::Bustable(BustableState::from_template(subtype, template));
        self.spawn(Entity::new(position, template.hp, visible, kind))
    }

    pub fn spawn_door(&mut self, position: Position, closed: bool, visible: bool) -> EntityId {
        let kind = EntityKind::Door(DoorState { closed });
        self.spawn(Entity::new(position, 1, visible, kind))
    }

    pub fn spawn_pickup(&mut self, stack: ItemStack, position: Position, visible: bool) -> EntityId {
        let kind = EntityKind::Pickup(PickupState { stack });
        self.spawn(Entity::new(position, 1, visible, kind))
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Like [`EntityRegistry::get`] but reports a missing id as an error.
    pub fn require(&self, id: EntityId) -> DelveResult<&Entity> {
        self.entities.get(&id).ok_or(DelveError::UnknownEntity(id))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Ids of everything on a tile, in spawn order.
    pub fn ids_at(&self, position: Position) -> Vec<EntityId> {
        self.position_index
            .get(&position)
            .cloned()
            .unwrap_or_default()
    }

    /// Everything on a tile, in spawn order.
    pub fn entities_at(&self, position: Position) -> Vec<&Entity> {
        self.position_index
            .get(&position)
            .map(|ids| ids.iter().filter_map(|id| self.entities.get(id)).collect())
            .unwrap_or_default()
    }

    /// Whether any entity stands on a tile.
    pub fn is_occupied(&self, position: Position) -> bool {
        self.position_index
            .get(&position)
            .is_some_and(|ids| !ids.is_empty())
    }

    /// Highest cost class of the entities on a tile.
    pub fn cost_class_at(&self, position: Position) -> u8 {
        self.entities_at(position)
            .iter()
            .map(|entity| entity.cost_class())
            .max()
            .unwrap_or(COST_OPEN)
    }

    /// Relocates an entity and updates the position index in the same step.
    pub fn move_to(&mut self, id: EntityId, position: Position) -> DelveResult<()> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(DelveError::UnknownEntity(id))?;
        let old = entity.position;
        entity.position = position;
        Self::unindex(&mut self.position_index, id, old);
        self.position_index.entry(position).or_default().push(id);
        Ok(())
    }

    /// Removes an entity from the registry and the position index.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        Self::unindex(&mut self.position_index, id, entity.position);
        self.order.retain(|other| *other != id);
        Some(entity)
    }

    /// Removes everything on a tile without dropping loot. Returns how many were removed.
    pub fn clear_at(&mut self, position: Position) -> usize {
        let ids = self.ids_at(position);
        for id in &ids {
            self.remove(*id);
        }
        ids.len()
    }

    /// All entities in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    /// Ids of every creature in spawn order.
    pub fn creature_ids(&self) -> Vec<EntityId> {
        self.iter()
            .filter(|entity| matches!(entity.kind, EntityKind::Creature(_)))
            .map(|entity| entity.id)
            .collect()
    }

    /// Mutable access to every entity, in no particular order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    fn unindex(index: &mut HashMap<Position, Vec<EntityId>>, id: EntityId, position: Position) {
        if let Some(ids) = index.get_mut(&position) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                index.remove(&position);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn registry_with_goon() -> (EntityRegistry, EntityId) {
        let templates = TemplateBook::default();
        let mut registry = EntityRegistry::new();
        let id = registry.spawn_creature(&templates, "goon", Position::new(2, 2), true);
        (registry, id)
    }

    #[test]
    fn test_spawn_indexes_position() {
        let (registry, id) = registry_with_goon();
        assert_eq!(registry.ids_at(Position::new(2, 2)), vec![id]);
        assert!(registry.ids_at(Position::new(3, 2)).is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_move_updates_index() {
        let (mut registry, id) = registry_with_goon();
        registry.move_to(id, Position::new(3, 2)).unwrap();
        assert!(!registry.is_occupied(Position::new(2, 2)));
        assert_eq!(registry.ids_at(Position::new(3, 2)), vec![id]);
        assert_eq!(registry.get(id).unwrap().position, Position::new(3, 2));
    }

    #[test]
    fn test_move_unknown_entity_errors() {
        let mut registry = EntityRegistry::new();
        let id = new_entity_id();
        assert!(matches!(
            registry.move_to(id, Position::origin()),
            Err(DelveError::UnknownEntity(missing)) if missing == id
        ));
    }

    #[test]
    fn test_remove_and_clear() {
        let templates = TemplateBook::default();
        let (mut registry, id) = registry_with_goon();
        registry.spawn_bustable(&templates, "pot", Position::new(2, 2), true);
        assert_eq!(registry.entities_at(Position::new(2, 2)).len(), 2);

        assert!(registry.remove(id).is_some());
        assert_eq!(registry.entities_at(Position::new(2, 2)).len(), 1);

        assert_eq!(registry.clear_at(Position::new(2, 2)), 1);
        assert!(registry.is_empty());
        assert!(!registry.is_occupied(Position::new(2, 2)));
    }

    #[test]
    fn test_unknown_subtype_falls_back_to_goon() {
        let templates = TemplateBook::default();
        let mut registry = EntityRegistry::new();
        let id = registry.spawn_creature(&templates, "wyrm", Position::origin(), false);
        let creature = registry.get(id).unwrap().creature().unwrap();
        assert_eq!(creature.subtype, "goon");
    }

    #[test]
    fn test_cost_classes() {
        let templates = TemplateBook::default();
        let mut registry = EntityRegistry::new();
        let here = Position::new(1, 1);
        assert_eq!(registry.cost_class_at(here), COST_OPEN);

        let door = registry.spawn_door(here, true, false);
        assert_eq!(registry.cost_class_at(here), COST_CLOSED_DOOR);

        if let Some(EntityKind::Door(state)) = registry.get_mut(door).map(|e| &mut e.kind) {
            state.closed = false;
        }
        assert_eq!(registry.cost_class_at(here), COST_OPEN);

        registry.spawn_bustable(&templates, "pot", Position::new(4, 4), true);
        assert_eq!(registry.cost_class_at(Position::new(4, 4)), COST_BUSTABLE);
    }

    #[test]
    fn test_death_rolls_loot() {
        let templates = TemplateBook::default();
        let loot = LootBook::default();
        let mut rng = StdRng::seed_from_u64(8);
        let mut registry = EntityRegistry::new();
        let id = registry.spawn_creature(&templates, "goon", Position::origin(), true);

        let goon = registry.get_mut(id).unwrap();
        assert_eq!(goon.take_damage(1), DamageResult::Killed);
        let drops = goon.die(&loot, &mut rng);
        assert_eq!(drops, vec![ItemStack::new("moni", 1)]);
        assert_eq!(goon.take_damage(1), DamageResult::Immune);
    }

    #[test]
    fn test_doors_are_immune() {
        let mut registry = EntityRegistry::new();
        let door = registry.spawn_door(Position::origin(), true, true);
        let door = registry.get_mut(door).unwrap();
        assert_eq!(door.take_damage(10), DamageResult::Immune);
        assert!(door.living);
    }

    #[test]
    fn test_iteration_follows_spawn_order() {
        let templates = TemplateBook::default();
        let mut registry = EntityRegistry::new();
        let ids: Vec<EntityId> = (0..5)
            .map(|i| registry.spawn_creature(&templates, "cubeo", Position::new(i, 0), true))
            .collect();
        assert_eq!(registry.creature_ids(), ids);
    }
}
