//! State-change diffing.
//!
//! Before the tick mutates anything the orchestrator captures a
//! [`TrackedState`]: the client-visible fields of every entity rendered as
//! JSON values. After the tick a second capture is diffed against the first
//! and every differing field becomes a [`StateChange`]. Entities that appear
//! or disappear are reported once with the pseudo-field `exists`.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use frontier_types::{
    Actor, Alliance, Behemoth, ChangedEntity, Monster, ResourceNode, StateChange, Structure,
    Trade,
};
use frontier_world::WorldState;

/// Pseudo-field reporting creation (`false -> true`) or removal.
pub const EXISTS_FIELD: &str = "exists";

type Fields = BTreeMap<&'static str, Value>;

/// Tracked fields of every entity at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackedState {
    entities: BTreeMap<ChangedEntity, Fields>,
}

fn json(value: &impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn actor_fields(a: &Actor) -> Fields {
    BTreeMap::from([
        ("position", json(&a.position)),
        ("destination", json(&a.destination)),
        ("status", json(&a.status)),
        ("health", json(&a.stats.health)),
        ("max_health", json(&a.stats.max_health)),
        ("attack", json(&a.stats.attack)),
        ("defense", json(&a.stats.defense)),
        ("gold", json(&a.gold)),
        ("inventory", json(&a.inventory)),
        ("equipment", json(&a.equipment)),
        ("alliance", json(&a.alliance)),
        ("kills", json(&a.kills)),
        ("evolution_stage", json(&a.evolution_stage)),
        ("connected", json(&a.connected)),
    ])
}

fn monster_fields(m: &Monster) -> Fields {
    BTreeMap::from([
        ("position", json(&m.position)),
        ("behavior", json(&m.behavior)),
        ("health", json(&m.stats.health)),
        ("target", json(&m.target)),
    ])
}

fn resource_fields(r: &ResourceNode) -> Fields {
    BTreeMap::from([
        ("kind", json(&r.kind)),
        ("remaining", json(&r.remaining)),
        ("state", json(&r.state)),
        ("growth_complete_tick", json(&r.growth_complete_tick)),
    ])
}

fn behemoth_fields(b: &Behemoth) -> Fields {
    BTreeMap::from([
        ("position", json(&b.position)),
        ("status", json(&b.status)),
        ("health", json(&b.health)),
        ("ore", json(&b.ore)),
        ("fed", json(&b.fed)),
    ])
}

fn structure_fields(s: &Structure) -> Fields {
    BTreeMap::from([("alliance", json(&s.alliance))])
}

fn alliance_fields(a: &Alliance) -> Fields {
    BTreeMap::from([("members", json(&a.members))])
}

fn trade_fields(t: &Trade) -> Fields {
    BTreeMap::from([("status", json(&t.status))])
}

impl TrackedState {
    /// Render the tracked fields of every entity in `world`.
    pub fn capture(world: &WorldState) -> Self {
        let mut entities = BTreeMap::new();
        for (id, a) in &world.actors {
            entities.insert(ChangedEntity::Actor(*id), actor_fields(a));
        }
        for (id, m) in &world.monsters {
            entities.insert(ChangedEntity::Monster(*id), monster_fields(m));
        }
        for (id, r) in &world.resources {
            entities.insert(ChangedEntity::Resource(*id), resource_fields(r));
        }
        for (id, b) in &world.behemoths {
            entities.insert(ChangedEntity::Behemoth(*id), behemoth_fields(b));
        }
        for (id, s) in &world.structures {
            entities.insert(ChangedEntity::Structure(*id), structure_fields(s));
        }
        for (id, a) in &world.alliances {
            entities.insert(ChangedEntity::Alliance(*id), alliance_fields(a));
        }
        for (id, t) in &world.trades {
            entities.insert(ChangedEntity::Trade(*id), trade_fields(t));
        }
        Self { entities }
    }

    /// Every difference between `self` (before) and `after`, ordered by
    /// entity then field.
    pub fn diff(&self, after: &Self) -> Vec<StateChange> {
        let mut changes = Vec::new();
        for (entity, old) in &self.entities {
            match after.entities.get(entity) {
                None => changes.push(existence(*entity, true)),
                Some(new) => {
                    for (field, old_value) in old {
                        let new_value = new.get(field).unwrap_or(&Value::Null);
                        if old_value != new_value {
                            changes.push(StateChange {
                                entity: *entity,
                                field: (*field).to_owned(),
                                old: old_value.clone(),
                                new: new_value.clone(),
                            });
                        }
                    }
                }
            }
        }
        for entity in after.entities.keys() {
            if !self.entities.contains_key(entity) {
                changes.push(existence(*entity, false));
            }
        }
        changes.sort_by(|a, b| a.entity.cmp(&b.entity).then_with(|| a.field.cmp(&b.field)));
        changes
    }
}

fn existence(entity: ChangedEntity, existed: bool) -> StateChange {
    StateChange {
        entity,
        field: EXISTS_FIELD.to_owned(),
        old: Value::Bool(existed),
        new: Value::Bool(!existed),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use frontier_types::{Position, ResourceId, ResourceKind, ResourceState, Role};
    use frontier_world::WorldSettings;

    use super::*;

    fn world() -> WorldState {
        WorldState::new(1, WorldSettings::default()).unwrap()
    }

    #[test]
    fn unchanged_world_has_no_changes() {
        let mut w = world();
        w.spawn_actor("Ada", Role::Woodcutter);
        let before = TrackedState::capture(&w);
        let after = TrackedState::capture(&w);
        assert!(before.diff(&after).is_empty());
    }

    #[test]
    fn field_changes_are_reported() {
        let mut w = world();
        let id = w.spawn_actor("Ada", Role::Miner);
        let before = TrackedState::capture(&w);

        w.actors.get_mut(&id).unwrap().gold = 12;
        let changes = before.diff(&TrackedState::capture(&w));

        assert_eq!(changes.len(), 1);
        let change = changes.first().unwrap();
        assert_eq!(change.entity, ChangedEntity::Actor(id));
        assert_eq!(change.field, "gold");
        assert_eq!(change.old, Value::from(0));
        assert_eq!(change.new, Value::from(12));
    }

    #[test]
    fn creation_and_removal_use_exists() {
        let mut w = world();
        let node = ResourceNode {
            id: ResourceId::new(),
            kind: ResourceKind::Tree,
            position: Position::new(10.0, 10.0),
            remaining: 5,
            capacity: 5,
            state: ResourceState::Available,
            growth_complete_tick: None,
        };
        let id = node.id;
        let before = TrackedState::capture(&w);
        w.add_resource(node).unwrap();
        let mid = TrackedState::capture(&w);

        let created = before.diff(&mid);
        assert_eq!(created.len(), 1);
        assert_eq!(created.first().unwrap().field, EXISTS_FIELD);
        assert_eq!(created.first().unwrap().new, Value::Bool(true));

        w.remove_resource(id);
        let removed = mid.diff(&TrackedState::capture(&w));
        assert_eq!(removed.len(), 1);
        assert_eq!(removed.first().unwrap().entity, ChangedEntity::Resource(id));
        assert_eq!(removed.first().unwrap().new, Value::Bool(false));
    }
}
